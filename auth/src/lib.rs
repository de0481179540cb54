//! Authentication primitives library
//!
//! Provides the credential infrastructure the account service builds on:
//! - Password hashing (Argon2id)
//! - Signed bearer tokens with server-controlled expiry
//! - Numeric one-time-password generation
//! - Password-reset secrets stored only as digests
//!
//! None of these modules perform I/O or hold mutable state; the service
//! wires them into its own flows and persistence.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest).unwrap());
//! ```
//!
//! ## Signed Tokens
//! ```
//! use auth::TokenService;
//! use chrono::Duration;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct SessionClaims { email: String }
//!
//! let tokens = TokenService::new(b"secret_key_at_least_32_bytes_long!");
//! let claims = SessionClaims { email: "a@x.com".into() };
//! let token = tokens.issue(&claims, Duration::hours(1)).unwrap();
//! let decoded: SessionClaims = tokens.verify(&token).unwrap();
//! assert_eq!(decoded.email, "a@x.com");
//! ```
//!
//! ## One-Time Passwords
//! ```
//! use auth::OtpGenerator;
//!
//! let otp = OtpGenerator::default().generate();
//! assert_eq!(otp.code.len(), 6);
//! ```

pub mod otp;
pub mod password;
pub mod reset;
pub mod token;

pub use otp::Otp;
pub use otp::OtpGenerator;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use reset::ResetToken;
pub use reset::ResetTokenGenerator;
pub use token::TokenError;
pub use token::TokenService;
