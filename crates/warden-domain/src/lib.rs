//! Domain entities shared by the warden control-plane auth core.
//!
//! # Purpose
//! Defines the persistent entity models (users, roles, credentials,
//! verifiers, sessions) and the small kind types (`AuthKind`, `Permission`)
//! that the storage contracts and the auth pipeline exchange.
//!
//! # Key invariants
//! - Entities are plain values; the store hands out isolated clones and owns
//!   the authoritative copies.
//! - A credential carries no secret material; secrets live in the paired
//!   verifier record.
//! - A session stores only the fixed-width hash of its refresh token.

mod credential;
mod kind;
mod role;
mod session;
mod user;

pub use credential::{Credential, Verifier};
pub use kind::{AuthKind, Permission};
pub use role::Role;
pub use session::{RefreshHash, Session, SessionState, REFRESH_HASH_LEN};
pub use user::User;

/// Validation errors raised by entity constructors.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("empty id")]
    EmptyId,
    #[error("empty subject")]
    EmptySubject,
    #[error("empty owner reference: {0}")]
    EmptyOwner(&'static str),
    #[error("session expiry precedes creation")]
    ExpiryBeforeCreation,
    #[error("unknown auth kind: {0}")]
    UnknownAuthKind(String),
}
