//! Authentication primitives library
//!
//! Provides the building blocks the auth service composes:
//! - Password hashing (Argon2id)
//! - Signed access/refresh token issuance and verification (JWT, HMAC)
//! - An injectable clock so token expiry is testable
//!
//! Storage, sessions and user lookup live in the service; this crate has no
//! I/O of its own.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("not_my_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use std::sync::Arc;
//!
//! use auth::{SystemClock, TokenCodec, TokenKind};
//! use chrono::Duration;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!", Arc::new(SystemClock));
//! let token = codec.issue("a@x.com", TokenKind::Access, Duration::minutes(30)).unwrap();
//!
//! let claims = codec.verify(&token, TokenKind::Access).unwrap();
//! assert_eq!(claims.sub, "a@x.com");
//!
//! // An access token is never accepted where a refresh token is expected.
//! assert!(codec.verify(&token, TokenKind::Refresh).is_err());
//! ```

pub mod clock;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use jwt::Claims;
pub use jwt::TokenCodec;
pub use jwt::TokenError;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
