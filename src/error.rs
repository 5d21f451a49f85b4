use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const FORBIDDEN_MESSAGE: &str = "You don't have permission.";

/// One entry of the `errors` array in an error body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub location: String,
    pub messages: Vec<String>,
}

impl FieldError {
    pub fn body(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            location: "body".to_string(),
            messages: vec![message.into()],
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Validation(Vec<FieldError>),
    Unauthorized(String),
    Forbidden,
    NotFound(String),
    Conflict(FieldError),
    Internal(String),
    Database(sqlx::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl AppError {
    pub fn duplicate_email() -> Self {
        AppError::Conflict(FieldError::body("email", "\"email\" already exists"))
    }

    /// Maps a unique violation on `users.email` to `Conflict`, anything else to `Database`.
    pub fn from_user_write(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::duplicate_email()
            }
            _ => AppError::Database(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation Error: {} field(s)", errors.len()),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Conflict(err) => write!(f, "Conflict: {}", err.field),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self {
            AppError::Validation(errors) => ("Validation Error".to_string(), Some(errors)),
            AppError::Unauthorized(msg) | AppError::NotFound(msg) => (msg, None),
            AppError::Forbidden => (FORBIDDEN_MESSAGE.to_string(), None),
            AppError::Conflict(err) => ("Validation Error".to_string(), Some(vec![err])),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                ("Internal server error".to_string(), None)
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                ("Internal server error".to_string(), None)
            }
        };

        let body = ErrorBody {
            code: status.as_u16(),
            message,
            errors,
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn conflict_carries_email_field() {
        let (status, body) = render(AppError::duplicate_email()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 409);
        assert_eq!(body["errors"][0]["field"], "email");
        assert_eq!(body["errors"][0]["location"], "body");
        assert_eq!(body["errors"][0]["messages"][0], "\"email\" already exists");
    }

    #[tokio::test]
    async fn forbidden_has_fixed_message_and_no_errors() {
        let (status, body) = render(AppError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], FORBIDDEN_MESSAGE);
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn internal_detail_never_reaches_the_body() {
        let (status, body) = render(AppError::Internal("pool exhausted at db.rs:42".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}
