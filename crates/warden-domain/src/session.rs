use crate::{AuthKind, DomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Width of the stored refresh-token hash (SHA3-256 output).
pub const REFRESH_HASH_LEN: usize = 32;

/// Fixed-width hash of a refresh token. The raw token is never stored.
pub type RefreshHash = [u8; REFRESH_HASH_LEN];

/// Derived lifecycle state of a session.
///
/// `Revoked` is terminal: a revoked session stays revoked even past expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Revoked,
    Expired,
}

/// A long-lived authenticated context anchored to one credential.
///
/// Sessions are created by the session service, mutated only through the
/// store's `rotate_refresh` and `revoke_session` operations, and deleted by
/// administrative paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub credential_id: String,
    pub auth_kind: AuthKind,
    pub refresh_hash: RefreshHash,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        credential_id: impl Into<String>,
        auth_kind: AuthKind,
        refresh_hash: RefreshHash,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let user_id = user_id.into();
        let credential_id = credential_id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyId);
        }
        if user_id.is_empty() {
            return Err(DomainError::EmptyOwner("user"));
        }
        if credential_id.is_empty() {
            return Err(DomainError::EmptyOwner("credential"));
        }
        if expires_at < now {
            return Err(DomainError::ExpiryBeforeCreation);
        }
        Ok(Self {
            id,
            user_id,
            credential_id,
            auth_kind,
            refresh_hash,
            expires_at,
            revoked: false,
            revoked_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        if self.revoked {
            SessionState::Revoked
        } else if self.expired(now) {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }
}
