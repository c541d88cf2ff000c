//! In-memory implementation of the storage contracts.
//!
//! # Purpose
//! Implements every store trait over `HashMap`s guarded by
//! `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: write locks serialize mutations, read
//!   locks allow concurrent reads.
//! - `rotate_refresh` performs its compare-and-swap under the session write
//!   lock, so two refreshes presenting the same old token cannot both win.
//!
//! # Performance characteristics
//! Secondary lookups (subject, credential owner) scan the maps. Acceptable
//! for dev workloads; durable backends should index these columns.

use crate::cursor::Cursor;
use crate::{
    CredentialStore, ListOptions, ListResult, RoleStore, SessionStore, StorageError,
    StorageResult, UserFilter, UserStore, VerifierStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use warden_domain::{AuthKind, Credential, RefreshHash, Role, Session, User, Verifier};

/// Page size applied when the caller passes `limit == 0`.
const DEFAULT_PAGE: usize = 50;
/// Hard page-size ceiling.
const MAX_PAGE: usize = 500;

/// Predicate filter for [`MemoryStore::list_users`].
///
/// Only this backend can consume it; handing it to another backend yields
/// `invalid-argument` there, and vice versa.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserFilter {
    /// Exact subject match.
    pub subject: Option<String>,
    /// Match on the disabled flag.
    pub disabled: Option<bool>,
}

impl MemoryUserFilter {
    fn matches(&self, user: &User) -> bool {
        if let Some(subject) = &self.subject {
            if &user.subject != subject {
                return false;
            }
        }
        if let Some(disabled) = self.disabled {
            if user.disabled != disabled {
                return false;
            }
        }
        true
    }
}

impl UserFilter for MemoryUserFilter {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-memory store. Cheap to clone; clones share the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    credentials: Arc<RwLock<HashMap<String, Credential>>>,
    verifiers: Arc<RwLock<HashMap<String, Verifier>>>,
    roles: Arc<RwLock<HashMap<String, Role>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Orders, pages and encodes the next cursor for a materialized result set.
///
/// Ordering is `(updated_at DESC, id ASC)`; the cursor pins the last item of
/// the previous page and the next page starts strictly after it.
fn page<T, K>(mut items: Vec<T>, opts: &ListOptions, key: K) -> StorageResult<ListResult<T>>
where
    K: Fn(&T) -> (DateTime<Utc>, String),
{
    items.sort_by(|a, b| {
        let (a_ts, a_id) = key(a);
        let (b_ts, b_id) = key(b);
        b_ts.cmp(&a_ts).then(a_id.cmp(&b_id))
    });

    if let Some(token) = &opts.cursor {
        let cursor = Cursor::decode(token)?;
        items.retain(|item| {
            let (ts, id) = key(item);
            ts < cursor.updated_at || (ts == cursor.updated_at && id > cursor.id)
        });
    }

    let limit = match opts.limit {
        0 => DEFAULT_PAGE,
        n => n.min(MAX_PAGE),
    };
    let has_more = items.len() > limit;
    items.truncate(limit);

    let next_cursor = if has_more {
        items.last().map(|item| {
            let (updated_at, id) = key(item);
            Cursor { updated_at, id }.encode()
        })
    } else {
        None
    };
    Ok(ListResult {
        items,
        next_cursor,
    })
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: &str) -> StorageResult<User> {
        if id.is_empty() {
            return Err(StorageError::InvalidArgument("empty user id".to_string()));
        }
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound("user".to_string()))
    }

    async fn get_user_by_subject(&self, subject: &str) -> StorageResult<User> {
        if subject.is_empty() {
            return Err(StorageError::InvalidArgument("empty subject".to_string()));
        }
        self.users
            .read()
            .await
            .values()
            .find(|user| user.subject == subject)
            .cloned()
            .ok_or_else(|| StorageError::NotFound("user".to_string()))
    }

    async fn upsert_user(&self, user: User) -> StorageResult<()> {
        if user.id.is_empty() {
            return Err(StorageError::InvalidArgument("empty user id".to_string()));
        }
        if user.subject.is_empty() {
            return Err(StorageError::InvalidArgument("empty subject".to_string()));
        }
        let mut users = self.users.write().await;
        // Subject is a secondary unique key.
        if users
            .values()
            .any(|existing| existing.subject == user.subject && existing.id != user.id)
        {
            return Err(StorageError::AlreadyExists("subject".to_string()));
        }
        users.insert(user.id.clone(), user);
        metrics::gauge!("warden_users_total").set(users.len() as f64);
        Ok(())
    }

    async fn list_users(
        &self,
        filter: Option<&dyn UserFilter>,
        opts: ListOptions,
    ) -> StorageResult<ListResult<User>> {
        let predicate = match filter {
            Some(filter) => {
                let Some(concrete) = filter.as_any().downcast_ref::<MemoryUserFilter>() else {
                    return Err(StorageError::InvalidArgument(
                        "foreign user filter".to_string(),
                    ));
                };
                Some(concrete.clone())
            }
            None => None,
        };
        let items: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|user| predicate.as_ref().map_or(true, |f| f.matches(user)))
            .cloned()
            .collect();
        page(items, &opts, |user| (user.updated_at, user.id.clone()))
    }

    async fn delete_user(&self, id: &str) -> StorageResult<()> {
        let mut users = self.users.write().await;
        if users.remove(id).is_none() {
            return Err(StorageError::NotFound("user".to_string()));
        }
        metrics::gauge!("warden_users_total").set(users.len() as f64);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get_credential_by_user_and_auth(
        &self,
        user_id: &str,
        auth_kind: AuthKind,
    ) -> StorageResult<Credential> {
        if user_id.is_empty() {
            return Err(StorageError::InvalidArgument("empty user id".to_string()));
        }
        self.credentials
            .read()
            .await
            .values()
            .find(|cred| cred.user_id == user_id && cred.auth_kind == auth_kind)
            .cloned()
            .ok_or_else(|| StorageError::NotFound("credential".to_string()))
    }

    async fn upsert_credential(&self, credential: Credential) -> StorageResult<()> {
        if credential.id.is_empty() {
            return Err(StorageError::InvalidArgument(
                "empty credential id".to_string(),
            ));
        }
        let mut credentials = self.credentials.write().await;
        // One active credential per (user, auth_kind).
        if credentials.values().any(|existing| {
            existing.user_id == credential.user_id
                && existing.auth_kind == credential.auth_kind
                && existing.id != credential.id
        }) {
            return Err(StorageError::AlreadyExists(
                "credential for auth kind".to_string(),
            ));
        }
        credentials.insert(credential.id.clone(), credential);
        Ok(())
    }

    async fn delete_credential(&self, id: &str) -> StorageResult<()> {
        if self.credentials.write().await.remove(id).is_none() {
            return Err(StorageError::NotFound("credential".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl VerifierStore for MemoryStore {
    async fn get_verifier_by_credential(&self, credential_id: &str) -> StorageResult<Verifier> {
        if credential_id.is_empty() {
            return Err(StorageError::InvalidArgument(
                "empty credential id".to_string(),
            ));
        }
        self.verifiers
            .read()
            .await
            .values()
            .find(|verifier| verifier.credential_id == credential_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound("verifier".to_string()))
    }

    async fn upsert_verifier(&self, verifier: Verifier) -> StorageResult<()> {
        if verifier.id.is_empty() {
            return Err(StorageError::InvalidArgument(
                "empty verifier id".to_string(),
            ));
        }
        let mut verifiers = self.verifiers.write().await;
        // One verifier per credential; replacement goes through
        // delete_verifier_by_credential first.
        if verifiers.values().any(|existing| {
            existing.credential_id == verifier.credential_id && existing.id != verifier.id
        }) {
            return Err(StorageError::AlreadyExists(
                "verifier for credential".to_string(),
            ));
        }
        verifiers.insert(verifier.id.clone(), verifier);
        Ok(())
    }

    async fn delete_verifier_by_credential(&self, credential_id: &str) -> StorageResult<()> {
        self.verifiers
            .write()
            .await
            .retain(|_, verifier| verifier.credential_id != credential_id);
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn get_roles(&self, ids: &[String]) -> StorageResult<Vec<Role>> {
        let roles = self.roles.read().await;
        Ok(ids.iter().filter_map(|id| roles.get(id).cloned()).collect())
    }

    async fn upsert_role(&self, role: Role) -> StorageResult<()> {
        if role.id.is_empty() {
            return Err(StorageError::InvalidArgument("empty role id".to_string()));
        }
        self.roles.write().await.insert(role.id.clone(), role);
        Ok(())
    }

    async fn delete_role(&self, id: &str) -> StorageResult<()> {
        if self.roles.write().await.remove(id).is_none() {
            return Err(StorageError::NotFound("role".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, session: Session) -> StorageResult<()> {
        if session.id.is_empty() {
            return Err(StorageError::InvalidArgument(
                "empty session id".to_string(),
            ));
        }
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(StorageError::AlreadyExists("session".to_string()));
        }
        sessions.insert(session.id.clone(), session);
        metrics::gauge!("warden_sessions_total").set(sessions.len() as f64);
        Ok(())
    }

    async fn get_session(&self, id: &str) -> StorageResult<Session> {
        if id.is_empty() {
            return Err(StorageError::InvalidArgument(
                "empty session id".to_string(),
            ));
        }
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound("session".to_string()))
    }

    async fn rotate_refresh(
        &self,
        id: &str,
        presented_hash: &RefreshHash,
        new_hash: &RefreshHash,
        new_expires_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound("session".to_string()))?;
        if session.revoked {
            return Err(StorageError::Conflict("session revoked".to_string()));
        }
        // Compare half of the swap: a stale presented hash means another
        // refresh already rotated this session.
        if !bool::from(session.refresh_hash.ct_eq(presented_hash)) {
            return Err(StorageError::Conflict("refresh hash stale".to_string()));
        }
        session.refresh_hash = *new_hash;
        session.expires_at = new_expires_at;
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn revoke_session(&self, id: &str, at: DateTime<Utc>) -> StorageResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound("session".to_string()))?;
        if session.revoked {
            // Repeat revocation keeps the original instant.
            return Ok(());
        }
        session.revoked = true;
        session.revoked_at = Some(at);
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn list_sessions_by_user(
        &self,
        user_id: &str,
        opts: ListOptions,
    ) -> StorageResult<ListResult<Session>> {
        if user_id.is_empty() {
            return Err(StorageError::InvalidArgument("empty user id".to_string()));
        }
        let items: Vec<Session> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect();
        page(items, &opts, |session| {
            (session.updated_at, session.id.clone())
        })
    }

    async fn delete_session(&self, id: &str) -> StorageResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_none() {
            return Err(StorageError::NotFound("session".to_string()));
        }
        metrics::gauge!("warden_sessions_total").set(sessions.len() as f64);
        Ok(())
    }

    async fn delete_sessions_by_user(&self, user_id: &str) -> StorageResult<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.user_id != user_id);
        metrics::gauge!("warden_sessions_total").set(sessions.len() as f64);
        Ok(before - sessions.len())
    }
}
