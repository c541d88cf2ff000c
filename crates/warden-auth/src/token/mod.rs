//! Signed access-token codec.
//!
//! Tokens are self-contained: three dot-separated URL-safe-base64 segments
//! (header, claim set, MAC) carrying the full [`Identity`](crate::Identity)
//! claim set. The codec is format-agnostic at the trait level; the shipped
//! implementation pins HMAC-SHA-256.

mod hs256;

pub use hs256::{Hs256Issuer, Hs256Verifier};

use crate::{AuthError, Identity};

/// Mints a signed access token from an identity.
pub trait TokenIssuer: Send + Sync {
    /// Fails with `invalid-token` when a required claim is missing, before
    /// any signing work.
    fn issue(&self, identity: &Identity) -> Result<String, AuthError>;
}

/// Validates a raw access token and reconstitutes the identity.
pub trait TokenVerifier: Send + Sync {
    /// Time-window violations map to `expired-token`; every other failure is
    /// an opaque `invalid-token`.
    fn verify(&self, raw_token: &str) -> Result<Identity, AuthError>;
}
