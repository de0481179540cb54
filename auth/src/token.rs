use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Error type for token operations.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    SigningFailed(String),

    #[error("Token is expired")]
    Expired,

    #[error("Token is invalid: {0}")]
    Invalid(String),
}

/// Signs and verifies bearer tokens (HS256).
///
/// The expiry is always computed server-side from the `ttl` handed to
/// [`issue`](Self::issue); callers never supply their own `exp`, and
/// [`verify`](Self::verify) rejects tokens without one. The signing key is
/// process-wide configuration, derived once at construction.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

/// Claim payload wrapper adding the server-computed timestamps.
#[derive(Serialize)]
struct SignedClaims<'a, T: Serialize> {
    exp: i64,
    iat: i64,
    #[serde(flatten)]
    claims: &'a T,
}

impl TokenService {
    /// Create a token service from a signing secret.
    ///
    /// The secret should be at least 32 bytes and come from configuration,
    /// never from code.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Sign `claims` into a token expiring `ttl` from now.
    ///
    /// # Errors
    /// * `SigningFailed` - encoding failed
    pub fn issue<T: Serialize>(&self, claims: &T, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let signed = SignedClaims {
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            claims,
        };

        encode(&Header::new(self.algorithm), &signed, &self.encoding_key)
            .map_err(|e| TokenError::SigningFailed(e.to_string()))
    }

    /// Verify a token and decode its claims.
    ///
    /// # Errors
    /// * `Expired` - `exp` is in the past
    /// * `Invalid` - signature, structure, or missing `exp`
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<T>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        email: String,
        role: String,
    }

    fn service() -> TokenService {
        TokenService::new(b"test_secret_key_at_least_32_bytes!")
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let claims = TestClaims {
            email: "a@x.com".to_string(),
            role: "student".to_string(),
        };

        let token = tokens
            .issue(&claims, Duration::hours(1))
            .expect("Failed to issue token");

        let decoded: TestClaims = tokens.verify(&token).expect("Failed to verify token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service();
        let claims = TestClaims {
            email: "a@x.com".to_string(),
            role: "student".to_string(),
        };

        // Already past its expiry when verified. jsonwebtoken applies a
        // default 60s leeway, so push the expiry well beyond it.
        let token = tokens.issue(&claims, Duration::seconds(-120)).unwrap();

        let result = tokens.verify::<TestClaims>(&token);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let tokens = service();
        let result = tokens.verify::<TestClaims>("not.a.token");
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let other = TokenService::new(b"another_secret_at_least_32_bytes!!");
        let claims = TestClaims {
            email: "a@x.com".to_string(),
            role: "teacher".to_string(),
        };

        let token = service().issue(&claims, Duration::hours(1)).unwrap();

        let result = other.verify::<TestClaims>(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }
}
