use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

/// A password-reset secret pair.
///
/// `plaintext` goes into the one-time URL mailed to the user; `digest` is
/// what gets persisted. The plaintext is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub plaintext: String,
    pub digest: String,
}

/// Generates opaque reset secrets and their stored digests.
///
/// The plaintext is 20 random bytes hex-encoded (160 bits of entropy); the
/// digest is the lowercase-hex SHA-256 of the plaintext. Lookups go by
/// digest so a leaked store never yields a usable token.
#[derive(Debug, Clone, Default)]
pub struct ResetTokenGenerator;

impl ResetTokenGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a fresh secret and its digest.
    pub fn generate(&self) -> ResetToken {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        let plaintext = hex::encode(bytes);
        let digest = self.digest_of(&plaintext);

        ResetToken { plaintext, digest }
    }

    /// Digest of an incoming candidate token, for lookup-by-digest.
    pub fn digest_of(&self, candidate: &str) -> String {
        hex::encode(Sha256::digest(candidate.as_bytes()))
    }
}
