//! Persistence contracts for the warden auth core.
//!
//! # Purpose
//! Defines the typed CRUD + filtered listing operations the auth pipeline
//! calls, the stable storage error taxonomy, and cursor-based pagination.
//! Concrete backends live in submodules (`memory` ships with the crate;
//! durable backends implement the same traits out of tree).
//!
//! # Key invariants
//! - The store owns entities; every read returns an isolated clone.
//! - Listings are ordered by `(updated_at DESC, id ASC)` with an opaque
//!   base64 cursor; a malformed cursor is `invalid-argument`.
//! - Filters are backend-specific: the backend that constructed a filter is
//!   the only one that may consume it, and a mismatch is `invalid-argument`.
//! - `rotate_refresh` is the single compare-and-swap the core relies on: it
//!   must fail with `conflict` when the session was concurrently revoked or
//!   already rotated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;
use thiserror::Error;
use warden_domain::{AuthKind, Credential, RefreshHash, Role, Session, User, Verifier};

pub mod cursor;
pub mod memory;

/// Stable storage error taxonomy shared by every backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Cursor-paged listing request.
///
/// A `limit` of zero selects the backend default page size; oversized limits
/// are clamped. `cursor` must be a value previously returned in
/// [`ListResult::next_cursor`] by the same backend.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub limit: usize,
    pub cursor: Option<String>,
}

/// One page of listing results.
#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    /// Present when more results follow; feed it back via [`ListOptions`].
    pub next_cursor: Option<String>,
}

/// Backend-specific query object for users.
///
/// A filter must be constructed by the same backend that consumes it.
/// Backends downcast through `as_any`; an unrecognized concrete type is
/// `invalid-argument`.
pub trait UserFilter: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Retrieves a user by unique ID. `not-found` when absent.
    async fn get_user(&self, id: &str) -> StorageResult<User>;

    /// Retrieves a user by the stable subject handle.
    ///
    /// `invalid-argument` for an empty subject, `not-found` when absent.
    async fn get_user_by_subject(&self, subject: &str) -> StorageResult<User>;

    /// Creates or fully replaces a user.
    ///
    /// Subject uniqueness is enforced: `already-exists` when another user
    /// holds the same subject.
    async fn upsert_user(&self, user: User) -> StorageResult<()>;

    /// Lists users matching the filter, ordered `(updated_at DESC, id ASC)`.
    async fn list_users(
        &self,
        filter: Option<&dyn UserFilter>,
        opts: ListOptions,
    ) -> StorageResult<ListResult<User>>;

    /// Deletes a user by ID. `not-found` when absent.
    async fn delete_user(&self, id: &str) -> StorageResult<()>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Retrieves the single active credential for `(user_id, auth_kind)`.
    async fn get_credential_by_user_and_auth(
        &self,
        user_id: &str,
        auth_kind: AuthKind,
    ) -> StorageResult<Credential>;

    /// Creates or replaces a credential.
    ///
    /// At most one credential may exist per `(user_id, auth_kind)`;
    /// `already-exists` when a different credential holds the pair.
    async fn upsert_credential(&self, credential: Credential) -> StorageResult<()>;

    /// Deletes a credential by ID. `not-found` when absent.
    async fn delete_credential(&self, id: &str) -> StorageResult<()>;
}

#[async_trait]
pub trait VerifierStore: Send + Sync {
    /// Retrieves the verifier attached to a credential.
    async fn get_verifier_by_credential(&self, credential_id: &str) -> StorageResult<Verifier>;

    /// Creates or replaces verifier material.
    ///
    /// At most one verifier may exist per credential; `already-exists` when a
    /// different verifier is attached. Replacement is delete-then-upsert.
    async fn upsert_verifier(&self, verifier: Verifier) -> StorageResult<()>;

    /// Removes the verifier attached to a credential.
    ///
    /// Idempotent: deleting an absent verifier succeeds.
    async fn delete_verifier_by_credential(&self, credential_id: &str) -> StorageResult<()>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Batch-fetches roles; unknown IDs are silently dropped from the result.
    async fn get_roles(&self, ids: &[String]) -> StorageResult<Vec<Role>>;

    /// Creates or fully replaces a role.
    async fn upsert_role(&self, role: Role) -> StorageResult<()>;

    /// Deletes a role by ID. `not-found` when absent.
    async fn delete_role(&self, id: &str) -> StorageResult<()>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a new session. `already-exists` on ID collision.
    async fn create_session(&self, session: Session) -> StorageResult<()>;

    /// Retrieves a session by ID. `not-found` when absent.
    async fn get_session(&self, id: &str) -> StorageResult<Session>;

    /// Atomically swaps the stored refresh hash and pushes out the expiry.
    ///
    /// `presented_hash` is the compare half of the swap: when it no longer
    /// matches the stored hash, or the session is revoked, the call fails
    /// with `conflict` and the stored state is untouched. Two parallel
    /// refreshes presenting the same old token therefore cannot both
    /// succeed.
    async fn rotate_refresh(
        &self,
        id: &str,
        presented_hash: &RefreshHash,
        new_hash: &RefreshHash,
        new_expires_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Marks a session revoked as of `at`.
    ///
    /// Revoking an already-revoked session is a no-op that keeps the original
    /// revocation instant. `not-found` when the session does not exist.
    async fn revoke_session(&self, id: &str, at: DateTime<Utc>) -> StorageResult<()>;

    /// Lists a user's sessions, ordered `(updated_at DESC, id ASC)`.
    async fn list_sessions_by_user(
        &self,
        user_id: &str,
        opts: ListOptions,
    ) -> StorageResult<ListResult<Session>>;

    /// Deletes a session by ID. `not-found` when absent.
    async fn delete_session(&self, id: &str) -> StorageResult<()>;

    /// Deletes every session belonging to a user; returns the removed count.
    async fn delete_sessions_by_user(&self, user_id: &str) -> StorageResult<usize>;
}

/// Aggregate of every storage capability the auth core consumes.
pub trait Storage:
    UserStore + CredentialStore + VerifierStore + RoleStore + SessionStore
{
}

impl<T> Storage for T where
    T: UserStore + CredentialStore + VerifierStore + RoleStore + SessionStore
{
}
