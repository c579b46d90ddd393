//! Shared cryptographic helpers for PlayTube services.
//!
//! - `jwt`: RS256 session tokens carried in the `token` cookie
//! - `hash`: SHA-256 digests and one-time password generation

pub mod hash;
pub mod jwt;
