use domains::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    /// Not a compact JWT, or the payload is not the expected JSON.
    #[error("malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("token expiry out of range: {0}")]
    InvalidExpiry(i64),

    #[error("token file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("token file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Storage(err.to_string())
    }
}
