use crate::{DomainError, Permission};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A principal known to the control plane (operator or service account).
///
/// The auth core reads users; creation and mutation happen on administrative
/// paths through the user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique opaque identifier.
    pub id: String,
    /// Stable login handle, unique across users (`sub` claim).
    pub subject: String,
    /// Optional display name.
    pub name: String,
    /// Optional contact email.
    pub email: String,
    /// A disabled user must never authenticate nor refresh.
    pub disabled: bool,
    /// Permissions granted directly, outside of any role.
    pub permissions: Vec<Permission>,
    /// IDs of roles whose permissions this user inherits.
    pub role_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a user with the two mandatory fields; everything else starts
    /// empty and is filled in by administrative paths.
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let subject = subject.into();
        if id.is_empty() {
            return Err(DomainError::EmptyId);
        }
        if subject.is_empty() {
            return Err(DomainError::EmptySubject);
        }
        Ok(Self {
            id,
            subject,
            name: String::new(),
            email: String::new(),
            disabled: false,
            permissions: Vec::new(),
            role_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        !permission.is_empty() && self.permissions.contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_fields() {
        let now = Utc::now();
        assert!(matches!(
            User::new("", "alice", now),
            Err(DomainError::EmptyId)
        ));
        assert!(matches!(
            User::new("u1", "", now),
            Err(DomainError::EmptySubject)
        ));
    }

    #[test]
    fn direct_permission_lookup() {
        let mut user = User::new("u1", "alice", Utc::now()).expect("user");
        user.permissions = vec![Permission::from("users:read")];
        assert!(user.has_permission(&Permission::from("users:read")));
        assert!(!user.has_permission(&Permission::from("users:edit")));
        assert!(!user.has_permission(&Permission::from("")));
    }
}
