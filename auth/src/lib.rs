//! Authentication infrastructure library
//!
//! Provides the reusable, domain-free pieces of the authentication stack:
//! - Password hashing (Argon2id)
//! - Signed token encoding and decoding
//! - Short-lived alias cache for out-of-band token exchange
//! - Injectable clock for time-dependent logic
//!
//! The domain service layer defines its own lookup and repository traits and
//! composes these implementations; nothing in this crate knows about subjects
//! or records beyond their UUID identifiers.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::CredentialHasher;
//!
//! let hasher = CredentialHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest));
//! assert!(!hasher.verify("other", &digest));
//! ```
//!
//! ## Signed Tokens
//! ```
//! use auth::{TokenCodec, TokenClaims};
//! use uuid::Uuid;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let claims = TokenClaims::new(Uuid::new_v4(), 1_700_000_000_000, 0);
//! let token = codec.encode(&claims).unwrap();
//! let decoded = codec.decode(&token).unwrap();
//! assert_eq!(decoded, claims);
//! ```

pub mod alias;
pub mod clock;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use alias::AliasCache;
pub use clock::Clock;
pub use clock::FixedClock;
pub use clock::SystemClock;
pub use password::CredentialHasher;
pub use password::PasswordError;
pub use token::TokenClaims;
pub use token::TokenCodec;
pub use token::TokenCodecError;
