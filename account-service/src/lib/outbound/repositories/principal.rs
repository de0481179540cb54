use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::principal::errors::RepositoryError;
use crate::principal::models::EmailAddress;
use crate::principal::models::ExternalId;
use crate::principal::models::PasswordReset;
use crate::principal::models::Principal;
use crate::principal::models::PrincipalId;
use crate::principal::models::Role;
use crate::principal::models::RoleDetails;
use crate::principal::models::StoredOtp;
use crate::principal::models::Subjects;
use crate::principal::ports::PrincipalRepository;

/// PostgreSQL adapter for the two principal stores.
///
/// One table per role. The unique indexes on `email` and `external_id` are
/// the authoritative uniqueness guard behind the registry's advisory
/// pre-check (cross-table uniqueness is application-enforced).
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn table(role: Role) -> &'static str {
    match role {
        Role::Student => "students",
        Role::Teacher => "teachers",
    }
}

const COLUMNS: &str = "id, name, email, password_hash, external_id, subjects, \
     registration_date, is_active, otp_code, otp_expires_at, \
     last_step_up_token, reset_token_digest, reset_expires_at";

fn principal_from_row(row: &PgRow, role: Role) -> Result<Principal, RepositoryError> {
    let corrupt = |what: &str| RepositoryError::Database(format!("Corrupt record: {}", what));

    let email: String = row.try_get("email").map_err(db_err)?;
    let email = EmailAddress::new(email).map_err(|_| corrupt("email"))?;

    let external_id: String = row.try_get("external_id").map_err(db_err)?;
    let external_id = ExternalId::new(external_id).map_err(|_| corrupt("external_id"))?;

    let details = match role {
        Role::Student => RoleDetails::Student,
        Role::Teacher => {
            let subjects: Vec<String> = row.try_get("subjects").map_err(db_err)?;
            let subjects = Subjects::new(subjects).map_err(|_| corrupt("subjects"))?;
            RoleDetails::Teacher { subjects }
        }
    };

    let otp_code: Option<String> = row.try_get("otp_code").map_err(db_err)?;
    let otp_expires_at: Option<DateTime<Utc>> = row.try_get("otp_expires_at").map_err(db_err)?;
    let otp = match (otp_code, otp_expires_at) {
        (Some(code), Some(expires_at)) => Some(StoredOtp { code, expires_at }),
        _ => None,
    };

    let reset_digest: Option<String> = row.try_get("reset_token_digest").map_err(db_err)?;
    let reset_expires_at: Option<DateTime<Utc>> =
        row.try_get("reset_expires_at").map_err(db_err)?;
    let reset = match (reset_digest, reset_expires_at) {
        (Some(token_digest), Some(expires_at)) => Some(PasswordReset {
            token_digest,
            expires_at,
        }),
        _ => None,
    };

    Ok(Principal {
        id: PrincipalId(row.try_get::<Uuid, _>("id").map_err(db_err)?),
        name: row.try_get("name").map_err(db_err)?,
        email,
        password_hash: row.try_get("password_hash").map_err(db_err)?,
        external_id,
        details,
        registration_date: row.try_get("registration_date").map_err(db_err)?,
        is_active: row.try_get("is_active").map_err(db_err)?,
        otp,
        last_step_up_token: row.try_get("last_step_up_token").map_err(db_err)?,
        reset,
    })
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn map_unique_violation(e: sqlx::Error) -> RepositoryError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                if constraint.contains("email") {
                    return RepositoryError::DuplicateEmail;
                }
                if constraint.contains("external_id") {
                    return RepositoryError::DuplicateExternalId;
                }
            }
        }
    }
    RepositoryError::Database(e.to_string())
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn create(&self, principal: Principal) -> Result<Principal, RepositoryError> {
        let role = principal.role();
        let subjects: Option<Vec<String>> = match &principal.details {
            RoleDetails::Student => None,
            RoleDetails::Teacher { subjects } => Some(subjects.as_slice().to_vec()),
        };

        let sql = format!(
            "INSERT INTO {} (id, name, email, password_hash, external_id, subjects, \
             registration_date, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            table(role)
        );

        sqlx::query(&sql)
            .bind(principal.id.0)
            .bind(&principal.name)
            .bind(principal.email.as_str())
            .bind(&principal.password_hash)
            .bind(principal.external_id.as_str())
            .bind(&subjects)
            .bind(principal.registration_date)
            .bind(principal.is_active)
            .execute(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        Ok(principal)
    }

    async fn find_by_email(
        &self,
        role: Role,
        email: &str,
    ) -> Result<Option<Principal>, RepositoryError> {
        let sql = format!("SELECT {} FROM {} WHERE email = $1", COLUMNS, table(role));

        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(|r| principal_from_row(&r, role)).transpose()
    }

    async fn find_by_external_id(
        &self,
        role: Role,
        external_id: &str,
    ) -> Result<Option<Principal>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE external_id = $1",
            COLUMNS,
            table(role)
        );

        let row = sqlx::query(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(|r| principal_from_row(&r, role)).transpose()
    }

    async fn find_by_reset_digest(
        &self,
        role: Role,
        digest: &str,
    ) -> Result<Option<Principal>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE reset_token_digest = $1",
            COLUMNS,
            table(role)
        );

        let row = sqlx::query(&sql)
            .bind(digest)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(|r| principal_from_row(&r, role)).transpose()
    }

    async fn update(&self, principal: &Principal) -> Result<(), RepositoryError> {
        let role = principal.role();
        let subjects: Option<Vec<String>> = match &principal.details {
            RoleDetails::Student => None,
            RoleDetails::Teacher { subjects } => Some(subjects.as_slice().to_vec()),
        };

        let (otp_code, otp_expires_at) = match &principal.otp {
            Some(otp) => (Some(otp.code.clone()), Some(otp.expires_at)),
            None => (None, None),
        };
        let (reset_digest, reset_expires_at) = match &principal.reset {
            Some(reset) => (Some(reset.token_digest.clone()), Some(reset.expires_at)),
            None => (None, None),
        };

        let sql = format!(
            "UPDATE {} SET name = $2, email = $3, password_hash = $4, external_id = $5, \
             subjects = $6, is_active = $7, otp_code = $8, otp_expires_at = $9, \
             last_step_up_token = $10, reset_token_digest = $11, reset_expires_at = $12 \
             WHERE id = $1",
            table(role)
        );

        let result = sqlx::query(&sql)
            .bind(principal.id.0)
            .bind(&principal.name)
            .bind(principal.email.as_str())
            .bind(&principal.password_hash)
            .bind(principal.external_id.as_str())
            .bind(&subjects)
            .bind(principal.is_active)
            .bind(&otp_code)
            .bind(otp_expires_at)
            .bind(&principal.last_step_up_token)
            .bind(&reset_digest)
            .bind(reset_expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Database(format!(
                "No record to update: {}",
                principal.id
            )));
        }

        Ok(())
    }
}
