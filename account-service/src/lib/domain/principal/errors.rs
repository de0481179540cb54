use thiserror::Error;

use crate::principal::models::Role;

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for ExternalId validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExternalIdError {
    #[error("External id must not be empty")]
    Empty,
}

/// Error for Subjects validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubjectsError {
    #[error("At least one subject is required")]
    Empty,
}

/// Error for persistence operations behind the repository port
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The store's unique index on email fired. The registry pre-check is
    /// only the fast path; this is the authoritative guard.
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("External id already registered")]
    DuplicateExternalId,

    #[error("Database error: {0}")]
    Database(String),
}

/// Error for outbound notification sends
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Invalid recipient address: {0}")]
    BadRecipient(String),

    #[error("Failed to send message: {0}")]
    SendFailed(String),
}

/// Error for enrollment roster lookups
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("Enrollment roster unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error for every auth state machine operation.
///
/// Each variant maps onto exactly one slot of the HTTP error taxonomy; the
/// translation lives at the inbound boundary, never here.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Email already owned by a principal of the given role (possibly the
    /// other one).
    #[error("Email already registered as a {role}")]
    EmailTaken { role: Role },

    /// External id already owned by a principal of the given role.
    #[error("External id already registered as a {role}")]
    ExternalIdTaken { role: Role },

    /// Login: no principal under this email. Deliberately distinct from
    /// `PasswordMismatch`; the field-specific message is a product choice.
    #[error("Email is incorrect")]
    EmailNotFound,

    /// Login: principal found, credential did not verify.
    #[error("Password is incorrect")]
    PasswordMismatch,

    /// No bearer artifact was presented where one is required.
    #[error("{0}")]
    MissingCredential(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token is invalid")]
    TokenInvalid,

    /// No principal behind a key that was expected to resolve (decoded
    /// step-up email, forgot-password email).
    #[error("Principal not found")]
    PrincipalNotFound,

    /// Wrong code, no live challenge, or the challenge expired.
    #[error("Invalid or expired OTP")]
    InvalidOtp,

    /// Resend attempted while an issued OTP is still live.
    #[error("An OTP has already been sent and has not expired yet")]
    OtpStillLive,

    /// Reset token unknown or past its expiry.
    #[error("Reset token is invalid or has expired")]
    ResetTokenInvalid,

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Enrollment roster error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // A duplicate at commit time means the race came from within the
            // same store; the registry pre-check already covered the
            // cross-role case.
            RepositoryError::DuplicateEmail | RepositoryError::DuplicateExternalId => {
                AuthError::Database(err.to_string())
            }
            RepositoryError::Database(msg) => AuthError::Database(msg),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Unknown(err.to_string())
    }
}
