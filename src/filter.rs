//! Range filtering for the apartment listing.
//!
//! Each of `size`, `price` and `rooms` may carry an inclusive lower and/or
//! upper bound. Bounds that are missing, empty or not a finite number are
//! ignored rather than rejected, so a listing request never fails because of
//! a bad filter value.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

/// Raw listing query string, e.g. `?minPrice=100&maxPrice=500`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentQuery {
    pub min_size: Option<String>,
    pub max_size: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_rooms: Option<String>,
    pub max_rooms: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn new(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            min: parse_bound(min),
            max: parse_bound(max),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApartmentFilter {
    pub size: Range,
    pub price: Range,
    pub rooms: Range,
}

impl From<&ApartmentQuery> for ApartmentFilter {
    fn from(q: &ApartmentQuery) -> Self {
        Self {
            size: Range::new(q.min_size.as_deref(), q.max_size.as_deref()),
            price: Range::new(q.min_price.as_deref(), q.max_price.as_deref()),
            rooms: Range::new(q.min_rooms.as_deref(), q.max_rooms.as_deref()),
        }
    }
}

impl ApartmentFilter {
    /// Append ` AND <col> >= $n` / ` AND <col> <= $n` for every bound present.
    /// `qb` must already end inside a `WHERE` clause.
    pub fn push_predicates(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let columns = [
            ("a.size", self.size),
            ("a.price", self.price),
            ("a.rooms", self.rooms),
        ];
        for (column, range) in columns {
            if let Some(min) = range.min {
                qb.push(" AND ").push(column).push(" >= ").push_bind(min);
            }
            if let Some(max) = range.max {
                qb.push(" AND ").push(column).push(" <= ").push_bind(max);
            }
        }
    }
}

fn parse_bound(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
