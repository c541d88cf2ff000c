use crate::{AuthKind, DomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fact that a user has configured a given auth mechanism.
///
/// Carries no secret material; the paired [`Verifier`] does. For a given
/// `(user_id, auth_kind)` pair there is at most one active credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub user_id: String,
    pub auth_kind: AuthKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        auth_kind: AuthKind,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let user_id = user_id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyId);
        }
        if user_id.is_empty() {
            return Err(DomainError::EmptyOwner("user"));
        }
        Ok(Self {
            id,
            user_id,
            auth_kind,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Mechanism-specific secret material validating a credential presentation.
///
/// For passwords the material is an adaptive-KDF hash with embedded salt and
/// cost. The bytes are opaque to everything except the module that produced
/// them. At most one verifier exists per credential; replacement is
/// delete-then-upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verifier {
    pub id: String,
    pub credential_id: String,
    pub material: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Verifier {
    pub fn new(
        id: impl Into<String>,
        credential_id: impl Into<String>,
        material: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let credential_id = credential_id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyId);
        }
        if credential_id.is_empty() {
            return Err(DomainError::EmptyOwner("credential"));
        }
        Ok(Self {
            id,
            credential_id,
            material,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_requires_owner() {
        let now = Utc::now();
        let err = Credential::new("c1", "", AuthKind::Password, now).expect_err("owner");
        assert!(matches!(err, DomainError::EmptyOwner("user")));
    }

    #[test]
    fn verifier_requires_credential() {
        let now = Utc::now();
        let err = Verifier::new("v1", "", vec![1, 2, 3], now).expect_err("owner");
        assert!(matches!(err, DomainError::EmptyOwner("credential")));
    }
}
