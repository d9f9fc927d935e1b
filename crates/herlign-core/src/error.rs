use thiserror::Error;

/// Errors raised by the pure domain helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Entering live mode without naming the admin who takes over.
    #[error("admin id required for live mode")]
    AdminRequired,

    /// A string did not name a known chat mode.
    #[error("unknown chat mode: {0}")]
    UnknownMode(String),

    /// A string did not name a known sender type.
    #[error("unknown sender type: {0}")]
    UnknownSender(String),

    #[error("File type must be one of: image/jpeg, image/png, image/webp, image/svg+xml")]
    UnsupportedMediaType,

    #[error("File size must be less than 5MB")]
    FileTooLarge,

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}
