use std::sync::Arc;

use crate::principal::errors::RepositoryError;
use crate::principal::ports::PrincipalRepository;
use crate::principal::ports::RosterEntry;
use crate::principal::models::Role;

/// Cross-role identity lookups over the two principal stores.
///
/// Email and external id are unique across the union of students and
/// teachers; these checks return the owning role so callers can produce
/// role-aware conflict messages. This is the fast, user-friendly rejection
/// path; the per-store unique indexes remain the authoritative guard.
pub struct IdentityRegistry<R>
where
    R: PrincipalRepository,
{
    repository: Arc<R>,
}

impl<R> IdentityRegistry<R>
where
    R: PrincipalRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Which role, if any, owns this email. Teachers are checked first,
    /// then students.
    pub async fn email_owner(&self, email: &str) -> Result<Option<Role>, RepositoryError> {
        for role in [Role::Teacher, Role::Student] {
            if self.repository.find_by_email(role, email).await?.is_some() {
                return Ok(Some(role));
            }
        }
        Ok(None)
    }

    /// Which role, if any, owns this external id.
    pub async fn external_id_owner(
        &self,
        external_id: &str,
    ) -> Result<Option<Role>, RepositoryError> {
        for role in [Role::Teacher, Role::Student] {
            if self
                .repository
                .find_by_external_id(role, external_id)
                .await?
                .is_some()
            {
                return Ok(Some(role));
            }
        }
        Ok(None)
    }
}

/// Whether a claimed name matches a roster entry's name.
///
/// Case-insensitive and whitespace-normalized. Every token of the claimed
/// name must appear among the roster name's tokens: "Asha Rao" matches
/// "Asha Kumari Rao", but "Asha Singh" does not. The containment is
/// asymmetric on purpose; a claimed name with extra tokens is rejected.
pub fn name_matches(claimed: &str, entry: &RosterEntry) -> bool {
    let roster_tokens: Vec<String> = entry
        .name
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let claimed = claimed.to_lowercase();
    let claimed_tokens: Vec<&str> = claimed.split_whitespace().collect();

    if claimed_tokens.is_empty() {
        return false;
    }

    claimed_tokens
        .iter()
        .all(|token| roster_tokens.iter().any(|stored| stored == token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> RosterEntry {
        RosterEntry {
            enrollment: "S100".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_exact_match() {
        assert!(name_matches("Asha Rao", &entry("Asha Rao")));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(name_matches("  asha   RAO ", &entry("Asha Rao")));
    }

    #[test]
    fn test_middle_name_omission_tolerated() {
        assert!(name_matches("Asha Rao", &entry("Asha Kumari Rao")));
    }

    #[test]
    fn test_unrelated_name_rejected() {
        assert!(!name_matches("Asha Singh", &entry("Asha Kumari Rao")));
    }

    #[test]
    fn test_extra_claimed_token_rejected() {
        assert!(!name_matches("Asha Kumari Rao Verma", &entry("Asha Kumari Rao")));
    }

    #[test]
    fn test_empty_claimed_name_rejected() {
        assert!(!name_matches("   ", &entry("Asha Rao")));
    }
}
