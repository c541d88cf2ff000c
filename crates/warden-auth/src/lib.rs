//! Authentication, authorization and session core for the warden control
//! plane.
//!
//! # Purpose
//! Centralizes the pluggable AuthN/AuthZ pipeline: credential providers, the
//! session service (login / refresh / revoke), the RBAC resolver, the signed
//! access-token codec, and the login rate limiter, together with the
//! composition root that wires them over a storage backend.
//!
//! # How it fits
//! Transport layers (HTTP, gRPC) call the session service and token verifier
//! through this crate and map [`AuthError`] kinds onto their status codes.
//! The crate holds no global state; several independent stacks can coexist in
//! one process.
//!
//! # Key invariants
//! - Access tokens are HS256 only; any other advertised algorithm is rejected
//!   before MAC work.
//! - Only a hash of the refresh token is ever persisted; comparison is
//!   constant-time.
//! - An empty effective permission set denies access: no unusable tokens.
//! - Credential failures collapse to one opaque `invalid-credentials`
//!   outcome; storage faults keep their own kinds for operator logs.

pub mod clock;
pub mod credentials;
pub mod error;
pub mod identity;
mod ids;
pub mod password;
pub mod provider;
pub mod ratelimit;
pub mod rbac;
pub mod session;
pub mod token;
pub mod wire;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AuthError;
pub use identity::Identity;
pub use provider::{AuthRequest, Authenticated, Provider};
pub use ratelimit::{login_key, RateLimitConfig, RateLimiter};
pub use rbac::{PermissionResolver, RbacResolver};
pub use session::{SessionConfig, SessionService, TokenPair};
pub use token::{Hs256Issuer, Hs256Verifier, TokenIssuer, TokenVerifier};
pub use wire::{AuthConfig, AuthStack};
