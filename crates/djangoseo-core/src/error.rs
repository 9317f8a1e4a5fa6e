//! Core error types for djangoseo-rs.
//!
//! [`SeoError`] covers the HTTP control signals raised by views (most
//! importantly [`SeoError::NotFound`]), persistence failures reported by
//! redirect stores, record validation failures, and startup
//! misconfiguration. It mirrors the exception hierarchy the redirect
//! middleware reacts to in Django.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error for a single record field.
///
/// # Examples
///
/// ```
/// use djangoseo_core::error::ValidationError;
///
/// let err = ValidationError::new("Ensure this value has at most 250 characters.", "max_length")
///     .with_param("field", "url_pattern");
/// assert_eq!(err.code, "max_length");
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the type of validation failure (e.g. "required", "invalid").
    pub code: String,
    /// Additional parameters providing context for the error message.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params.get("field") {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for djangoseo-rs.
///
/// Each variant maps to an HTTP status code via [`SeoError::status_code`].
#[derive(Error, Debug)]
pub enum SeoError {
    // ── HTTP errors ──────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 405 Method Not Allowed.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// HTTP 410 Gone.
    #[error("Gone")]
    Gone,

    /// HTTP 500 Internal Server Error.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── Persistence errors ───────────────────────────────────────────

    /// Raised when a query expected exactly one result but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// Raised when a query expected exactly one result but found multiple.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleObjectsReturned(String),

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A database integrity constraint was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// An operational database error (connection failure, etc.).
    #[error("Operational error: {0}")]
    OperationalError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// A record field failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The application is improperly configured.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SeoError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest`, `ValidationError` -> 400
    /// - `NotFound`, `DoesNotExist` -> 404
    /// - `MethodNotAllowed` -> 405
    /// - `Gone` -> 410
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) => 400,
            Self::NotFound(_) | Self::DoesNotExist(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::Gone => 410,
            Self::InternalServerError(_)
            | Self::MultipleObjectsReturned(_)
            | Self::DatabaseError(_)
            | Self::IntegrityError(_)
            | Self::OperationalError(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns `true` for the "not found" miss a view raises on an unknown path.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::DoesNotExist(_))
    }

    /// Returns `true` if this error reports a uniqueness or other integrity violation.
    pub const fn is_integrity_error(&self) -> bool {
        matches!(self, Self::IntegrityError(_))
    }
}

impl From<ValidationError> for SeoError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, SeoError>`.
pub type SeoResult<T> = Result<T, SeoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_simple() {
        let err = ValidationError::new("This field is required.", "required");
        assert_eq!(err.to_string(), "This field is required.");
    }

    #[test]
    fn test_validation_error_display_with_field() {
        let err = ValidationError::new("Too long.", "max_length").with_param("field", "old_path");
        assert_eq!(err.to_string(), "old_path: Too long.");
    }

    #[test]
    fn test_seo_error_status_codes() {
        assert_eq!(SeoError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(SeoError::NotFound("x".into()).status_code(), 404);
        assert_eq!(SeoError::DoesNotExist("x".into()).status_code(), 404);
        assert_eq!(SeoError::MethodNotAllowed("x".into()).status_code(), 405);
        assert_eq!(SeoError::Gone.status_code(), 410);
        assert_eq!(SeoError::DatabaseError("x".into()).status_code(), 500);
        assert_eq!(SeoError::IntegrityError("x".into()).status_code(), 500);
        assert_eq!(SeoError::ImproperlyConfigured("x".into()).status_code(), 500);
        assert_eq!(
            SeoError::ValidationError(ValidationError::new("x", "y")).status_code(),
            400
        );
    }

    #[test]
    fn test_not_found_classification() {
        assert!(SeoError::NotFound("page".into()).is_not_found());
        assert!(SeoError::DoesNotExist("row".into()).is_not_found());
        assert!(!SeoError::Gone.is_not_found());
        assert!(!SeoError::InternalServerError("boom".into()).is_not_found());
    }

    #[test]
    fn test_integrity_classification() {
        assert!(SeoError::IntegrityError("UNIQUE".into()).is_integrity_error());
        assert!(!SeoError::DatabaseError("locked".into()).is_integrity_error());
    }

    #[test]
    fn test_seo_error_display() {
        let err = SeoError::NotFound("page".into());
        assert_eq!(err.to_string(), "Not found: page");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let seo_err: SeoError = io_err.into();
        assert_eq!(seo_err.status_code(), 500);
        assert!(seo_err.to_string().contains("file missing"));
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: SeoError = ValidationError::new("bad", "invalid").into();
        assert!(matches!(err, SeoError::ValidationError(_)));
    }
}
