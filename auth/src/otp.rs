use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use rand::Rng;

/// A freshly generated one-time password and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Generates 6-digit numeric one-time passwords.
///
/// Codes are drawn uniformly from `100000..=999999`. The issued
/// `expires_at` is the single source of truth for the validity window;
/// clients echo it back rather than guessing their own countdown.
/// Throttling is the caller's responsibility.
#[derive(Debug, Clone)]
pub struct OtpGenerator {
    window: Duration,
}

impl OtpGenerator {
    /// Create a generator with the given validity window.
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Generate a fresh code expiring `window` from now.
    pub fn generate(&self) -> Otp {
        let code = rand::thread_rng().gen_range(100_000..=999_999).to_string();

        Otp {
            code,
            expires_at: Utc::now() + self.window,
        }
    }
}

impl Default for OtpGenerator {
    fn default() -> Self {
        Self::new(Duration::seconds(60))
    }
}
