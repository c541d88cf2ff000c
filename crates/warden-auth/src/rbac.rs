//! Effective-permission resolution.
//!
//! The resolver derives an effective permission set from stored assignments:
//! the union of a user's direct permissions and the permissions of every
//! role the user references. It performs no authentication, no token work,
//! and no policy decisions.

use crate::AuthError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use warden_domain::{Permission, User};
use warden_storage::Storage;

/// Computes the effective permission set for a user.
#[async_trait]
pub trait PermissionResolver: Send + Sync {
    /// Returns a sorted, de-duplicated permission list. An empty result is a
    /// valid outcome (the caller decides whether that denies access).
    async fn resolve_user_permissions(&self, user: &User) -> Result<Vec<Permission>, AuthError>;
}

/// Store-backed resolver over direct grants and flat role bindings.
pub struct RbacResolver {
    store: Arc<dyn Storage>,
}

impl RbacResolver {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionResolver for RbacResolver {
    /// Union of direct and role permissions, empties dropped, materialized
    /// ascending for deterministic output. Role-lookup faults propagate
    /// verbatim; they are not auth errors.
    async fn resolve_user_permissions(&self, user: &User) -> Result<Vec<Permission>, AuthError> {
        let mut set: BTreeSet<Permission> = user
            .permissions
            .iter()
            .filter(|perm| !perm.is_empty())
            .cloned()
            .collect();

        if !user.role_ids.is_empty() {
            let roles = self.store.get_roles(&user.role_ids).await?;
            for role in roles {
                for perm in role.permissions {
                    if !perm.is_empty() {
                        set.insert(perm);
                    }
                }
            }
        }

        Ok(set.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use warden_domain::Role;
    use warden_storage::memory::MemoryStore;
    use warden_storage::RoleStore;

    fn user_with(permissions: Vec<Permission>, role_ids: Vec<String>) -> User {
        let mut user = User::new("u1", "alice", Utc::now()).expect("user");
        user.permissions = permissions;
        user.role_ids = role_ids;
        user
    }

    #[tokio::test]
    async fn union_is_sorted_and_deduplicated() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store
            .upsert_role(
                Role::new(
                    "r1",
                    "viewer",
                    vec!["users:read".into(), "agents:read".into()],
                    now,
                )
                .expect("role"),
            )
            .await
            .expect("upsert");

        let resolver = RbacResolver::new(store);
        let user = user_with(
            vec!["users:read".into(), "zzz:last".into()],
            vec!["r1".to_string()],
        );
        let perms = resolver.resolve_user_permissions(&user).await.expect("resolve");

        let rendered: Vec<&str> = perms.iter().map(Permission::as_str).collect();
        assert_eq!(rendered, vec!["agents:read", "users:read", "zzz:last"]);
    }

    #[tokio::test]
    async fn no_grants_is_an_empty_list_not_an_error() {
        let resolver = RbacResolver::new(Arc::new(MemoryStore::new()));
        let user = user_with(vec![], vec![]);
        let perms = resolver.resolve_user_permissions(&user).await.expect("resolve");
        assert!(perms.is_empty());
    }

    #[tokio::test]
    async fn unknown_roles_are_dropped_silently() {
        let resolver = RbacResolver::new(Arc::new(MemoryStore::new()));
        let user = user_with(vec!["users:read".into()], vec!["r-missing".to_string()]);
        let perms = resolver.resolve_user_permissions(&user).await.expect("resolve");
        assert_eq!(perms.len(), 1);
    }

    #[tokio::test]
    async fn empty_permission_strings_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store
            .upsert_role(Role::new("r1", "odd", vec!["".into()], now).expect("role"))
            .await
            .expect("upsert");

        let resolver = RbacResolver::new(store);
        let user = user_with(vec!["".into()], vec!["r1".to_string()]);
        let perms = resolver.resolve_user_permissions(&user).await.expect("resolve");
        assert!(perms.is_empty());
    }
}
