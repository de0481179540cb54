use async_trait::async_trait;

use crate::principal::errors::AuthError;
use crate::principal::errors::DirectoryError;
use crate::principal::errors::NotificationError;
use crate::principal::errors::RepositoryError;
use crate::principal::models::EnrollmentCheck;
use crate::principal::models::LoginOutcome;
use crate::principal::models::Principal;
use crate::principal::models::RegisterCommand;
use crate::principal::models::Registration;
use crate::principal::models::Role;

/// Port for the auth state machine.
///
/// One method per operation of the register/login/verify/reset flows. Every
/// method is role-scoped; the same state machine drives both endpoint
/// families.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new principal.
    ///
    /// Uniqueness of email and external id is checked across BOTH stores
    /// before anything is hashed or persisted. No OTP is sent at
    /// registration time.
    ///
    /// # Errors
    /// * `EmailTaken` / `ExternalIdTaken` - identity collision, role-aware
    /// * `Database` - persistence failed (the freshly computed hash is
    ///   dropped with it; nothing was sent)
    async fn register(&self, role: Role, command: RegisterCommand)
        -> Result<Registration, AuthError>;

    /// Verify credentials and either issue a session (active principal) or
    /// start the OTP step-up (inactive principal).
    ///
    /// # Errors
    /// * `EmailNotFound` / `PasswordMismatch` - field-specific by design
    /// * `Notification` - the OTP mail could not be handed off
    async fn login(&self, role: Role, email: &str, password: &str)
        -> Result<LoginOutcome, AuthError>;

    /// Consume a live OTP challenge, activate the principal, and issue a
    /// 30-day session token.
    ///
    /// A second verify with the same code fails: the code is cleared on
    /// first use.
    ///
    /// # Errors
    /// * `TokenExpired` / `TokenInvalid` - bad step-up token
    /// * `PrincipalNotFound` - decoded email resolves to nothing
    /// * `InvalidOtp` - wrong code, no challenge, or expired challenge
    async fn verify_otp(&self, role: Role, step_up_token: &str, code: &str)
        -> Result<String, AuthError>;

    /// Issue and send a fresh OTP, replacing the expired one.
    ///
    /// Single-flight per principal: rejected while the previously committed
    /// expiry is still in the future.
    ///
    /// # Errors
    /// * `OtpStillLive` - the previous code has not expired yet
    async fn resend_otp(&self, role: Role, step_up_token: &str) -> Result<(), AuthError>;

    /// Issue a password-reset token and mail its one-time URL.
    ///
    /// Repeated calls reissue, invalidating the prior token. Does not touch
    /// `is_active`.
    ///
    /// # Errors
    /// * `PrincipalNotFound` - no principal under this email
    async fn forgot_password(&self, role: Role, email: &str) -> Result<(), AuthError>;

    /// Validate a reset token with no side effect (gates the reset form).
    ///
    /// # Errors
    /// * `ResetTokenInvalid` - unknown digest or past expiry
    async fn check_reset_token(&self, role: Role, token: &str) -> Result<(), AuthError>;

    /// Replace the password proven by possession of a live reset token and
    /// invalidate the token.
    ///
    /// # Errors
    /// * `ResetTokenInvalid` - unknown digest or past expiry
    async fn reset_password(
        &self,
        role: Role,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Which role, if any, owns this email (checked across both stores).
    async fn email_owner(&self, email: &str) -> Result<Option<Role>, AuthError>;

    /// Which role, if any, owns this external id (checked across both
    /// stores).
    async fn external_id_owner(&self, external_id: &str) -> Result<Option<Role>, AuthError>;

    /// Student registration pre-check: external id collision plus roster
    /// name match.
    async fn check_enrollment(
        &self,
        external_id: &str,
        claimed_name: Option<&str>,
    ) -> Result<EnrollmentCheck, AuthError>;
}

/// Persistence operations for the two principal stores.
///
/// Backed by one keyed collection per role. Updates are full-record
/// read-modify-write; last-write-wins on the OTP fields is acceptable.
#[async_trait]
pub trait PrincipalRepository: Send + Sync + 'static {
    /// Persist a new principal into its role's store.
    ///
    /// # Errors
    /// * `DuplicateEmail` / `DuplicateExternalId` - unique index fired
    /// * `Database` - operation failed
    async fn create(&self, principal: Principal) -> Result<Principal, RepositoryError>;

    /// Look up by email within one role's store.
    async fn find_by_email(&self, role: Role, email: &str)
        -> Result<Option<Principal>, RepositoryError>;

    /// Look up by external id within one role's store.
    async fn find_by_external_id(
        &self,
        role: Role,
        external_id: &str,
    ) -> Result<Option<Principal>, RepositoryError>;

    /// Look up by reset-token digest within one role's store. Lookups never
    /// go by plaintext.
    async fn find_by_reset_digest(
        &self,
        role: Role,
        digest: &str,
    ) -> Result<Option<Principal>, RepositoryError>;

    /// Write back a mutated principal record.
    async fn update(&self, principal: &Principal) -> Result<(), RepositoryError>;
}

/// What kind of message goes out, with its operation-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    OtpCode { code: String },
    PasswordReset { reset_url: String },
}

/// An outbound message for the notification gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub recipient_name: String,
    pub role: Role,
    pub kind: NotificationKind,
}

/// Port for the notification gateway. Delivery is awaited before the
/// operation completes, but confirmation beyond the handoff is not
/// required.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, note: Notification) -> Result<(), NotificationError>;
}

/// One row of the institution-provided enrollment roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub enrollment: String,
    pub name: String,
}

/// Port for the trusted external roster, independent of the principal
/// stores.
#[async_trait]
pub trait EnrollmentDirectory: Send + Sync + 'static {
    async fn find(&self, enrollment: &str) -> Result<Option<RosterEntry>, DirectoryError>;
}
