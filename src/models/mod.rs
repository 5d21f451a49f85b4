pub mod apartment;
pub mod refresh_token;
pub mod user;

pub use apartment::{Apartment, ApartmentListing, ApartmentRecord, ApartmentResponse, Location, Owner};
pub use refresh_token::RefreshToken;
pub use user::{RealtorSummary, Role, User, UserResponse};
