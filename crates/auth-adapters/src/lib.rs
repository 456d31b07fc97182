//! # auth-adapters
//!
//! Implementations of the credential ports: Argon2 password hashing and,
//! behind `auth-jwt`, signed session tokens.

mod argon;
#[cfg(feature = "auth-jwt")]
mod jwt;

pub use argon::Argon2PasswordHasher;
#[cfg(feature = "auth-jwt")]
pub use jwt::JwtSessionTokens;
