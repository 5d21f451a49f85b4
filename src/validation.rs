//! Request body validation. All problems in a body are collected and reported
//! together as `AppError::Validation`, one `FieldError` per field.

use std::sync::LazyLock;

use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use regex::Regex;

use crate::error::{AppError, FieldError};
use crate::models::Role;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const PASSWORD_MIN: usize = 6;
pub const TEXT_MAX: usize = 128;

/// Unwrap a JSON body, turning a rejection into a `AppError::Validation` on `body`.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::Validation(vec![FieldError::body("body", err.body_text())]))
}

/// Unwrap a query string, turning a rejection into a `AppError::Validation` on `query`.
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result.map(|Query(v)| v).map_err(|err| {
        AppError::Validation(vec![FieldError {
            field: "query".to_string(),
            location: "query".to_string(),
            messages: vec![err.body_text()],
        }])
    })
}

#[derive(Debug, Default)]
pub struct Errors(Vec<FieldError>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: String) {
        match self.0.iter_mut().find(|e| e.field == field) {
            Some(existing) => existing.messages.push(message),
            None => self.0.push(FieldError::body(field, message)),
        }
    }

    /// Returns the value, or records `"<field>" is required`.
    pub fn required<'a, T>(&mut self, field: &str, value: &'a Option<T>) -> Option<&'a T> {
        if value.is_none() {
            self.add(field, format!("\"{field}\" is required"));
        }
        value.as_ref()
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !EMAIL_RE.is_match(value) {
            self.add(field, format!("\"{field}\" must be a valid email"));
        }
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            if min == 1 {
                self.add(field, format!("\"{field}\" is not allowed to be empty"));
            } else {
                self.add(
                    field,
                    format!("\"{field}\" length must be at least {min} characters long"),
                );
            }
        } else if len > max {
            self.add(
                field,
                format!("\"{field}\" length must be less than or equal to {max} characters long"),
            );
        }
    }

    pub fn role(&mut self, field: &str, value: &str) -> Option<Role> {
        match value.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                self.add(
                    field,
                    format!("\"{field}\" must be one of [admin, realtor, client]"),
                );
                None
            }
        }
    }

    pub fn positive(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value <= 0.0 {
            self.add(field, format!("\"{field}\" must be a positive number"));
        }
    }

    pub fn finite(&mut self, field: &str, value: f64) {
        if !value.is_finite() {
            self.add(field, format!("\"{field}\" must be a number"));
        }
    }

    /// Checks for a positive whole number that fits in an `i32`.
    pub fn positive_integer(&mut self, field: &str, value: f64) -> Option<i32> {
        if value.fract() != 0.0 || value <= 0.0 || value > f64::from(i32::MAX) {
            self.add(field, format!("\"{field}\" must be a positive integer"));
            return None;
        }
        Some(value as i32)
    }

    /// Like `finish`, handing back the required values once everything passed.
    pub fn finish_with<T>(self, value: Option<T>) -> Result<T, AppError> {
        match value {
            Some(v) if self.0.is_empty() => Ok(v),
            _ => Err(AppError::Validation(self.0)),
        }
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}
