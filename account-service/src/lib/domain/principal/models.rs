use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::principal::errors::EmailError;
use crate::principal::errors::ExternalIdError;
use crate::principal::errors::SubjectsError;

/// The two principal variants. Students and teachers live in separate
/// stores but share one identity space: email and external id are unique
/// across the union of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }

    /// Name of the short-lived cookie carrying the step-up token.
    pub fn verify_cookie(&self) -> &'static str {
        match self {
            Role::Student => "studentVerifyToken",
            Role::Teacher => "teacherVerifyToken",
        }
    }

    /// Path segment used when building role-scoped frontend URLs.
    pub fn path_segment(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Principal aggregate entity.
///
/// One record per registered student or teacher. Created inactive at
/// registration; every login/verify/reset operation mutates it through a
/// full-record read-modify-write. Never hard-deleted.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: PrincipalId,
    pub name: String,
    pub email: EmailAddress,
    pub password_hash: String,
    pub external_id: ExternalId,
    pub details: RoleDetails,
    pub registration_date: DateTime<Utc>,
    /// Gates the OTP step-up: flips false -> true exactly once, on the
    /// first successful OTP verification. Never reverts automatically.
    pub is_active: bool,
    pub otp: Option<StoredOtp>,
    pub last_step_up_token: Option<String>,
    pub reset: Option<PasswordReset>,
}

impl Principal {
    pub fn role(&self) -> Role {
        match self.details {
            RoleDetails::Student => Role::Student,
            RoleDetails::Teacher { .. } => Role::Teacher,
        }
    }
}

/// Principal unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role-specific record data. Teachers own a non-empty subject list;
/// students carry nothing beyond the shared fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleDetails {
    Student,
    Teacher { subjects: Subjects },
}

/// A live OTP challenge. Code and expiry are one value: stored together,
/// cleared together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredOtp {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A pending password reset. Only the digest of the mailed token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
}

/// Email address type
///
/// Validates format using an RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role-scoped external identifier (enrollment number / teacher id).
/// Globally unique across both principal stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: String) -> Result<Self, ExternalIdError> {
        let id = id.trim().to_string();
        if id.is_empty() {
            return Err(ExternalIdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Non-empty subject list owned by a teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subjects(Vec<String>);

impl Subjects {
    pub fn new(subjects: Vec<String>) -> Result<Self, SubjectsError> {
        let subjects: Vec<String> = subjects
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if subjects.is_empty() {
            return Err(SubjectsError::Empty);
        }
        Ok(Self(subjects))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Command to register a new principal with validated fields.
#[derive(Debug)]
pub struct RegisterCommand {
    pub name: String,
    pub email: EmailAddress,
    pub password: String,
    pub external_id: ExternalId,
    pub details: RoleDetails,
}

/// Result of a successful registration: the stored record plus a 1-hour
/// claim token handed back as the immediate registration credential.
#[derive(Debug)]
pub struct Registration {
    pub principal: Principal,
    pub token: String,
}

/// Result of a successful credential check at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Principal already active: a 30-day session was issued directly.
    Session { token: String },
    /// Step-up required: an OTP was mailed and a 1-hour step-up token
    /// issued. Not a session.
    StepUp { token: String },
}

/// Outcome of the student enrollment pre-check against the roster and the
/// principal stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentCheck {
    /// The id is already registered as a principal of the given role.
    IdTaken { role: Role },
    /// Roster entry found and the claimed name matches it.
    Match,
    /// Roster entry found but the claimed name does not match.
    NameMismatch,
    /// No roster entry with this enrollment number.
    UnknownEnrollment,
}

/// Claims embedded in a full session token (30 days).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Claims embedded in a step-up token (1 hour). Keyed by email only:
/// proof of "password verified, OTP pending", not a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepUpClaims {
    pub email: String,
}

/// Claims embedded in the registration credential (1 hour).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationClaims {
    pub sub: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(EmailAddress::new("a@x.com".to_string()).is_ok());
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
    }

    #[test]
    fn test_external_id_rejects_blank() {
        assert!(ExternalId::new("  ".to_string()).is_err());
        assert_eq!(ExternalId::new(" S100 ".to_string()).unwrap().as_str(), "S100");
    }

    #[test]
    fn test_subjects_must_be_non_empty() {
        assert!(Subjects::new(vec![]).is_err());
        assert!(Subjects::new(vec!["  ".to_string()]).is_err());

        let subjects = Subjects::new(vec!["Maths".to_string(), " ".to_string()]).unwrap();
        assert_eq!(subjects.as_slice(), &["Maths".to_string()]);
    }

    #[test]
    fn test_role_from_details() {
        let subjects = Subjects::new(vec!["Physics".to_string()]).unwrap();
        assert_eq!(
            (RoleDetails::Teacher { subjects }),
            RoleDetails::Teacher {
                subjects: Subjects::new(vec!["Physics".to_string()]).unwrap()
            }
        );
        assert_eq!(Role::Student.verify_cookie(), "studentVerifyToken");
        assert_eq!(Role::Teacher.verify_cookie(), "teacherVerifyToken");
    }

    #[test]
    fn test_stored_otp_liveness() {
        let otp = StoredOtp {
            code: "123456".to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(60),
        };
        assert!(otp.is_live(Utc::now()));
        assert!(!otp.is_live(Utc::now() + chrono::Duration::seconds(61)));
    }
}
