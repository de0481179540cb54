use std::sync::Arc;

use async_trait::async_trait;
use auth::OtpGenerator;
use auth::PasswordHasher;
use auth::ResetTokenGenerator;
use auth::TokenService;
use chrono::Duration;
use chrono::Utc;

use crate::principal::errors::AuthError;
use crate::principal::errors::RepositoryError;
use crate::principal::models::EnrollmentCheck;
use crate::principal::models::LoginOutcome;
use crate::principal::models::PasswordReset;
use crate::principal::models::Principal;
use crate::principal::models::PrincipalId;
use crate::principal::models::RegisterCommand;
use crate::principal::models::Registration;
use crate::principal::models::RegistrationClaims;
use crate::principal::models::Role;
use crate::principal::models::SessionClaims;
use crate::principal::models::StepUpClaims;
use crate::principal::models::StoredOtp;
use crate::principal::ports::AuthServicePort;
use crate::principal::ports::EnrollmentDirectory;
use crate::principal::ports::Notification;
use crate::principal::ports::NotificationKind;
use crate::principal::ports::Notifier;
use crate::principal::ports::PrincipalRepository;
use crate::principal::registry::name_matches;
use crate::principal::registry::IdentityRegistry;

/// Fully-authenticated session lifetime, in days.
const SESSION_TTL_DAYS: i64 = 30;
/// Step-up and registration credential lifetime, in hours.
const STEP_UP_TTL_HOURS: i64 = 1;
/// Password-reset token lifetime, in hours.
const RESET_TTL_HOURS: i64 = 1;

/// The auth state machine.
///
/// Orchestrates register/login/verify-otp/resend-otp/forgot/reset per role,
/// consuming the credential hasher, token service, OTP and reset generators,
/// the identity registry, and the outbound ports. Handlers are stateless;
/// all per-principal state lives behind the repository.
pub struct AuthService<R, N, D>
where
    R: PrincipalRepository,
    N: Notifier,
    D: EnrollmentDirectory,
{
    repository: Arc<R>,
    registry: IdentityRegistry<R>,
    notifier: Arc<N>,
    directory: Arc<D>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    otp: OtpGenerator,
    reset: ResetTokenGenerator,
    reset_url_base: String,
}

impl<R, N, D> AuthService<R, N, D>
where
    R: PrincipalRepository,
    N: Notifier,
    D: EnrollmentDirectory,
{
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<N>,
        directory: Arc<D>,
        tokens: Arc<TokenService>,
        otp: OtpGenerator,
        reset_url_base: String,
    ) -> Self {
        Self {
            registry: IdentityRegistry::new(Arc::clone(&repository)),
            repository,
            notifier,
            directory,
            tokens,
            hasher: PasswordHasher::new(),
            otp,
            reset: ResetTokenGenerator::new(),
            reset_url_base,
        }
    }

    /// Argon2 is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Unknown(format!("Hashing task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, candidate: &str, digest: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let candidate = candidate.to_string();
        let digest = digest.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&candidate, &digest))
            .await
            .map_err(|e| AuthError::Unknown(format!("Verification task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    fn session_token(&self, principal: &Principal) -> Result<String, AuthError> {
        let claims = SessionClaims {
            sub: principal.id.to_string(),
            email: principal.email.as_str().to_string(),
            name: principal.name.clone(),
            role: principal.role(),
        };
        self.tokens
            .issue(&claims, Duration::days(SESSION_TTL_DAYS))
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn step_up_claims(&self, token: &str) -> Result<StepUpClaims, AuthError> {
        self.tokens.verify(token).map_err(|e| match e {
            auth::TokenError::Expired => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })
    }

    /// Look up the principal behind a live reset token, enforcing expiry.
    async fn principal_for_reset_token(
        &self,
        role: Role,
        token: &str,
    ) -> Result<Principal, AuthError> {
        let digest = self.reset.digest_of(token);
        let principal = self
            .repository
            .find_by_reset_digest(role, &digest)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::ResetTokenInvalid)?;

        match &principal.reset {
            Some(reset) if Utc::now() <= reset.expires_at => Ok(principal),
            _ => Err(AuthError::ResetTokenInvalid),
        }
    }

    async fn send_otp(&self, principal: &Principal, code: String) -> Result<(), AuthError> {
        self.notifier
            .send(Notification {
                recipient: principal.email.as_str().to_string(),
                recipient_name: principal.name.clone(),
                role: principal.role(),
                kind: NotificationKind::OtpCode { code },
            })
            .await
            .map_err(AuthError::from)
    }
}

#[async_trait]
impl<R, N, D> AuthServicePort for AuthService<R, N, D>
where
    R: PrincipalRepository,
    N: Notifier,
    D: EnrollmentDirectory,
{
    async fn register(
        &self,
        role: Role,
        command: RegisterCommand,
    ) -> Result<Registration, AuthError> {
        if let Some(owner) = self.registry.email_owner(command.email.as_str()).await? {
            return Err(AuthError::EmailTaken { role: owner });
        }
        if let Some(owner) = self
            .registry
            .external_id_owner(command.external_id.as_str())
            .await?
        {
            return Err(AuthError::ExternalIdTaken { role: owner });
        }

        let password_hash = self.hash_password(&command.password).await?;

        let principal = Principal {
            id: PrincipalId::new(),
            name: command.name,
            email: command.email,
            password_hash,
            external_id: command.external_id,
            details: command.details,
            registration_date: Utc::now(),
            is_active: false,
            otp: None,
            last_step_up_token: None,
            reset: None,
        };

        // The pre-check is advisory; the store's unique indexes close the
        // same-instant race. A duplicate here can only come from our own
        // role's store.
        let principal = self.repository.create(principal).await.map_err(|e| match e {
            RepositoryError::DuplicateEmail => AuthError::EmailTaken { role },
            RepositoryError::DuplicateExternalId => AuthError::ExternalIdTaken { role },
            other => AuthError::from(other),
        })?;

        let claims = RegistrationClaims {
            sub: principal.id.to_string(),
            email: principal.email.as_str().to_string(),
        };
        let token = self
            .tokens
            .issue(&claims, Duration::hours(STEP_UP_TTL_HOURS))
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        tracing::info!(role = %role, id = %principal.id, "Principal registered");

        Ok(Registration { principal, token })
    }

    async fn login(
        &self,
        role: Role,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let mut principal = self
            .repository
            .find_by_email(role, email)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::EmailNotFound)?;

        if !self.verify_password(password, &principal.password_hash).await? {
            return Err(AuthError::PasswordMismatch);
        }

        if principal.is_active {
            let token = self.session_token(&principal)?;
            return Ok(LoginOutcome::Session { token });
        }

        // Inactive: start the OTP step-up. Persist the challenge first;
        // only then hand the mail off. A send failure surfaces as an
        // internal error and the request fails.
        let otp = self.otp.generate();
        let claims = StepUpClaims {
            email: principal.email.as_str().to_string(),
        };
        let step_up_token = self
            .tokens
            .issue(&claims, Duration::hours(STEP_UP_TTL_HOURS))
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        principal.otp = Some(StoredOtp {
            code: otp.code.clone(),
            expires_at: otp.expires_at,
        });
        principal.last_step_up_token = Some(step_up_token.clone());
        self.repository
            .update(&principal)
            .await
            .map_err(AuthError::from)?;

        self.send_otp(&principal, otp.code).await?;

        Ok(LoginOutcome::StepUp {
            token: step_up_token,
        })
    }

    async fn verify_otp(
        &self,
        role: Role,
        step_up_token: &str,
        code: &str,
    ) -> Result<String, AuthError> {
        let claims = self.step_up_claims(step_up_token)?;

        let mut principal = self
            .repository
            .find_by_email(role, &claims.email)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::PrincipalNotFound)?;

        let now = Utc::now();
        match &principal.otp {
            Some(stored) if stored.code == code && now <= stored.expires_at => {}
            _ => return Err(AuthError::InvalidOtp),
        }

        // Consume the challenge: code cleared, activation is one-way.
        principal.otp = None;
        principal.last_step_up_token = None;
        principal.is_active = true;
        self.repository
            .update(&principal)
            .await
            .map_err(AuthError::from)?;

        tracing::info!(role = %role, id = %principal.id, "Principal activated");

        self.session_token(&principal)
    }

    async fn resend_otp(&self, role: Role, step_up_token: &str) -> Result<(), AuthError> {
        let claims = self.step_up_claims(step_up_token)?;

        let mut principal = self
            .repository
            .find_by_email(role, &claims.email)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::PrincipalNotFound)?;

        // Single-flight against the most recently committed expiry. Two
        // near-simultaneous resends can both pass; that race is tolerated.
        if let Some(stored) = &principal.otp {
            if stored.is_live(Utc::now()) {
                return Err(AuthError::OtpStillLive);
            }
        }

        let otp = self.otp.generate();
        principal.otp = Some(StoredOtp {
            code: otp.code.clone(),
            expires_at: otp.expires_at,
        });
        self.repository
            .update(&principal)
            .await
            .map_err(AuthError::from)?;

        self.send_otp(&principal, otp.code).await
    }

    async fn forgot_password(&self, role: Role, email: &str) -> Result<(), AuthError> {
        let mut principal = self
            .repository
            .find_by_email(role, email)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::PrincipalNotFound)?;

        // Reissuing replaces the stored digest, so any previously mailed
        // token dies here.
        let reset_token = self.reset.generate();
        principal.reset = Some(PasswordReset {
            token_digest: reset_token.digest,
            expires_at: Utc::now() + Duration::hours(RESET_TTL_HOURS),
        });
        self.repository
            .update(&principal)
            .await
            .map_err(AuthError::from)?;

        let reset_url = format!(
            "{}/{}/reset-password/{}",
            self.reset_url_base,
            role.path_segment(),
            reset_token.plaintext
        );

        self.notifier
            .send(Notification {
                recipient: principal.email.as_str().to_string(),
                recipient_name: principal.name.clone(),
                role,
                kind: NotificationKind::PasswordReset { reset_url },
            })
            .await
            .map_err(AuthError::from)
    }

    async fn check_reset_token(&self, role: Role, token: &str) -> Result<(), AuthError> {
        self.principal_for_reset_token(role, token).await.map(|_| ())
    }

    async fn reset_password(
        &self,
        role: Role,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let mut principal = self.principal_for_reset_token(role, token).await?;

        principal.password_hash = self.hash_password(new_password).await?;
        principal.reset = None;
        self.repository
            .update(&principal)
            .await
            .map_err(AuthError::from)?;

        tracing::info!(role = %role, id = %principal.id, "Password reset");

        Ok(())
    }

    async fn email_owner(&self, email: &str) -> Result<Option<Role>, AuthError> {
        self.registry.email_owner(email).await.map_err(AuthError::from)
    }

    async fn external_id_owner(&self, external_id: &str) -> Result<Option<Role>, AuthError> {
        self.registry
            .external_id_owner(external_id)
            .await
            .map_err(AuthError::from)
    }

    async fn check_enrollment(
        &self,
        external_id: &str,
        claimed_name: Option<&str>,
    ) -> Result<EnrollmentCheck, AuthError> {
        if let Some(owner) = self.registry.external_id_owner(external_id).await? {
            return Ok(EnrollmentCheck::IdTaken { role: owner });
        }

        let entry = match self.directory.find(external_id).await? {
            Some(entry) => entry,
            None => return Ok(EnrollmentCheck::UnknownEnrollment),
        };

        let matches = claimed_name.is_some_and(|name| name_matches(name, &entry));
        if matches {
            Ok(EnrollmentCheck::Match)
        } else {
            Ok(EnrollmentCheck::NameMismatch)
        }
    }
}
