//! # Errors
//!
//! `ApiError` classifies what went wrong at the network boundary.
//! `AppError` is what stores and callers see; stores turn it into a
//! displayable string instead of propagating it into the view.

use thiserror::Error;

/// Transport-level failure reported by a [`crate::BlogApi`] implementation.
///
/// Every variant carries the best human-readable message available.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP 401. No automatic retry or redirect.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 5xx
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never received a response (DNS, refused, timeout).
    #[error("connection failed: {0}")]
    Connectivity(String),

    /// The body could not be decoded into the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Message suitable for an inline error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(m)
            | ApiError::Connectivity(m)
            | ApiError::InvalidResponse(m) => m.clone(),
            ApiError::Server { message, .. } | ApiError::Rejected { message, .. } => {
                message.clone()
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Server { status, .. } | ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Connectivity(_) | ApiError::InvalidResponse(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// The primary error type for client-side operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Client-side form check failed; nothing was sent.
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Network or API failure, already reduced to a displayable message.
    #[error("{0}")]
    Fetch(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The session token's expiry has passed.
    #[error("session expired")]
    AuthExpired,

    /// Viewer is not allowed to perform the action (not owner, not moderator).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (e.g., Post, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Token storage or decoding failure
    #[error("session storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized(m) => AppError::Unauthorized(m),
            other => AppError::Fetch(other.user_message()),
        }
    }
}

/// A specialized Result type for client logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_become_fetch_messages() {
        let err: AppError = ApiError::Server {
            status: 503,
            message: "maintenance".into(),
        }
        .into();
        assert_eq!(err, AppError::Fetch("maintenance".into()));
    }

    #[test]
    fn unauthorized_is_kept_distinct() {
        let err: AppError = ApiError::Unauthorized("token revoked".into()).into();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
