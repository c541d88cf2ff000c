use crate::Permission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named grouping of permissions.
///
/// Roles are flat: a role never references another role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        permissions: Vec<Permission>,
        now: DateTime<Utc>,
    ) -> Result<Self, crate::DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(crate::DomainError::EmptyId);
        }
        Ok(Self {
            id,
            name: name.into(),
            permissions,
            created_at: now,
            updated_at: now,
        })
    }
}
