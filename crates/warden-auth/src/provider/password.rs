//! Password authentication provider.
//!
//! Every credential-level failure on this path (unknown subject, disabled
//! user, missing credential or verifier, password mismatch, malformed
//! material) collapses to the single opaque `invalid-credentials` outcome.
//! Storage faults (unavailability, internal errors) are not auth failures
//! and propagate unchanged.

use crate::password::{verify_password, PasswordCheck};
use crate::provider::{AuthRequest, Authenticated, Provider};
use crate::AuthError;
use async_trait::async_trait;
use std::sync::Arc;
use warden_domain::AuthKind;
use warden_storage::{Storage, StorageError};

pub struct PasswordProvider {
    store: Arc<dyn Storage>,
}

impl PasswordProvider {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }
}

/// Collapses `not-found` into the opaque credential failure; everything else
/// keeps its storage kind.
fn not_found_is_invalid(err: StorageError) -> AuthError {
    match err {
        StorageError::NotFound(_) => AuthError::InvalidCredentials,
        other => AuthError::Storage(other),
    }
}

#[async_trait]
impl Provider for PasswordProvider {
    fn kind(&self) -> AuthKind {
        AuthKind::Password
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<Authenticated, AuthError> {
        let AuthRequest::Password(request) = request else {
            return Err(AuthError::WrongAuthKind);
        };
        if request.subject.is_empty() || request.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store
            .get_user_by_subject(&request.subject)
            .await
            .map_err(not_found_is_invalid)?;
        if user.disabled {
            return Err(AuthError::InvalidCredentials);
        }

        let credential = self
            .store
            .get_credential_by_user_and_auth(&user.id, AuthKind::Password)
            .await
            .map_err(not_found_is_invalid)?;

        let verifier = self
            .store
            .get_verifier_by_credential(&credential.id)
            .await
            .map_err(not_found_is_invalid)?;

        match verify_password(&verifier.material, &request.password) {
            PasswordCheck::Valid => Ok(Authenticated { user, credential }),
            PasswordCheck::Mismatch | PasswordCheck::Malformed => {
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, SystemClock};
    use crate::credentials::enroll_password;
    use crate::provider::{ApiKeyRequest, PasswordRequest};
    use chrono::{DateTime, Utc};
    use warden_domain::{Credential, RefreshHash, Role, Session, User, Verifier};
    use warden_storage::memory::MemoryStore;
    use warden_storage::{
        CredentialStore, ListOptions, ListResult, RoleStore, SessionStore, StorageResult,
        UserFilter, UserStore, VerifierStore,
    };

    const COST: u32 = 4;

    fn password_request(subject: &str, password: &str) -> AuthRequest {
        AuthRequest::Password(PasswordRequest {
            subject: subject.to_string(),
            password: password.to_string(),
        })
    }

    async fn seeded_store(subject: &str, password: &str, disabled: bool) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let clock = SystemClock;
        let mut user = User::new("user-1", subject, clock.now()).expect("user");
        user.disabled = disabled;
        store.upsert_user(user).await.expect("upsert");
        enroll_password(store.as_ref(), &clock, "cred-1", "user-1", password, COST)
            .await
            .expect("enroll");
        store
    }

    #[tokio::test]
    async fn wrong_request_variant_is_wrong_auth_kind() {
        let store = Arc::new(MemoryStore::new());
        let provider = PasswordProvider::new(store);
        let request = AuthRequest::ApiKey(ApiKeyRequest {
            subject: "alice".to_string(),
            key: "k".to_string(),
        });
        let err = provider.authenticate(&request).await.expect_err("auth");
        assert!(matches!(err, AuthError::WrongAuthKind));
    }

    #[tokio::test]
    async fn empty_fields_are_invalid_credentials() {
        let store = Arc::new(MemoryStore::new());
        let provider = PasswordProvider::new(store);
        for request in [password_request("", "pw"), password_request("alice", "")] {
            let err = provider.authenticate(&request).await.expect_err("auth");
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn unknown_subject_is_invalid_credentials() {
        let store = Arc::new(MemoryStore::new());
        let provider = PasswordProvider::new(store);
        let err = provider
            .authenticate(&password_request("nobody", "pw"))
            .await
            .expect_err("auth");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn disabled_user_is_invalid_credentials() {
        let store = seeded_store("alice", "pw", true).await;
        let provider = PasswordProvider::new(store);
        let err = provider
            .authenticate(&password_request("alice", "pw"))
            .await
            .expect_err("auth");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn missing_credential_is_invalid_credentials() {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("user-1", "alice", Utc::now()).expect("user");
        store.upsert_user(user).await.expect("upsert");

        let provider = PasswordProvider::new(store);
        let err = provider
            .authenticate(&password_request("alice", "pw"))
            .await
            .expect_err("auth");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn missing_verifier_is_invalid_credentials() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let user = User::new("user-1", "alice", now).expect("user");
        store.upsert_user(user).await.expect("upsert");
        let cred = Credential::new("cred-1", "user-1", AuthKind::Password, now).expect("cred");
        store.upsert_credential(cred).await.expect("upsert");

        let provider = PasswordProvider::new(store);
        let err = provider
            .authenticate(&password_request("alice", "pw"))
            .await
            .expect_err("auth");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn malformed_material_is_invalid_credentials() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let user = User::new("user-1", "alice", now).expect("user");
        store.upsert_user(user).await.expect("upsert");
        let cred = Credential::new("cred-1", "user-1", AuthKind::Password, now).expect("cred");
        store.upsert_credential(cred).await.expect("upsert");
        let verifier =
            Verifier::new("v1", "cred-1", b"not-a-kdf-string".to_vec(), now).expect("verifier");
        store.upsert_verifier(verifier).await.expect("upsert");

        let provider = PasswordProvider::new(store);
        let err = provider
            .authenticate(&password_request("alice", "pw"))
            .await
            .expect_err("auth");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let store = seeded_store("alice", "correct-password", false).await;
        let provider = PasswordProvider::new(store);
        let err = provider
            .authenticate(&password_request("alice", "wrong-password"))
            .await
            .expect_err("auth");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn success_returns_user_and_credential() {
        let store = seeded_store("alice", "pw", false).await;
        let provider = PasswordProvider::new(store);
        let result = provider
            .authenticate(&password_request("alice", "pw"))
            .await
            .expect("auth");
        assert_eq!(result.user.id, "user-1");
        assert_eq!(result.credential.id, "cred-1");
        assert_eq!(result.credential.auth_kind, AuthKind::Password);
    }

    /// Store wrapper whose user lookup reports the backend as down.
    struct FlakyStore {
        inner: Arc<MemoryStore>,
    }

    #[async_trait]
    impl UserStore for FlakyStore {
        async fn get_user(&self, id: &str) -> StorageResult<User> {
            self.inner.get_user(id).await
        }
        async fn get_user_by_subject(&self, _subject: &str) -> StorageResult<User> {
            Err(StorageError::Unavailable("backend down".to_string()))
        }
        async fn upsert_user(&self, user: User) -> StorageResult<()> {
            self.inner.upsert_user(user).await
        }
        async fn list_users(
            &self,
            filter: Option<&dyn UserFilter>,
            opts: ListOptions,
        ) -> StorageResult<ListResult<User>> {
            self.inner.list_users(filter, opts).await
        }
        async fn delete_user(&self, id: &str) -> StorageResult<()> {
            self.inner.delete_user(id).await
        }
    }

    #[async_trait]
    impl CredentialStore for FlakyStore {
        async fn get_credential_by_user_and_auth(
            &self,
            user_id: &str,
            auth_kind: AuthKind,
        ) -> StorageResult<Credential> {
            self.inner
                .get_credential_by_user_and_auth(user_id, auth_kind)
                .await
        }
        async fn upsert_credential(&self, credential: Credential) -> StorageResult<()> {
            self.inner.upsert_credential(credential).await
        }
        async fn delete_credential(&self, id: &str) -> StorageResult<()> {
            self.inner.delete_credential(id).await
        }
    }

    #[async_trait]
    impl VerifierStore for FlakyStore {
        async fn get_verifier_by_credential(
            &self,
            credential_id: &str,
        ) -> StorageResult<Verifier> {
            self.inner.get_verifier_by_credential(credential_id).await
        }
        async fn upsert_verifier(&self, verifier: Verifier) -> StorageResult<()> {
            self.inner.upsert_verifier(verifier).await
        }
        async fn delete_verifier_by_credential(&self, credential_id: &str) -> StorageResult<()> {
            self.inner.delete_verifier_by_credential(credential_id).await
        }
    }

    #[async_trait]
    impl RoleStore for FlakyStore {
        async fn get_roles(&self, ids: &[String]) -> StorageResult<Vec<Role>> {
            self.inner.get_roles(ids).await
        }
        async fn upsert_role(&self, role: Role) -> StorageResult<()> {
            self.inner.upsert_role(role).await
        }
        async fn delete_role(&self, id: &str) -> StorageResult<()> {
            self.inner.delete_role(id).await
        }
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn create_session(&self, session: Session) -> StorageResult<()> {
            self.inner.create_session(session).await
        }
        async fn get_session(&self, id: &str) -> StorageResult<Session> {
            self.inner.get_session(id).await
        }
        async fn rotate_refresh(
            &self,
            id: &str,
            presented_hash: &RefreshHash,
            new_hash: &RefreshHash,
            new_expires_at: DateTime<Utc>,
        ) -> StorageResult<()> {
            self.inner
                .rotate_refresh(id, presented_hash, new_hash, new_expires_at)
                .await
        }
        async fn revoke_session(&self, id: &str, at: DateTime<Utc>) -> StorageResult<()> {
            self.inner.revoke_session(id, at).await
        }
        async fn list_sessions_by_user(
            &self,
            user_id: &str,
            opts: ListOptions,
        ) -> StorageResult<ListResult<Session>> {
            self.inner.list_sessions_by_user(user_id, opts).await
        }
        async fn delete_session(&self, id: &str) -> StorageResult<()> {
            self.inner.delete_session(id).await
        }
        async fn delete_sessions_by_user(&self, user_id: &str) -> StorageResult<usize> {
            self.inner.delete_sessions_by_user(user_id).await
        }
    }

    #[tokio::test]
    async fn storage_faults_keep_their_kind() {
        let provider = PasswordProvider::new(Arc::new(FlakyStore {
            inner: Arc::new(MemoryStore::new()),
        }));
        let err = provider
            .authenticate(&password_request("alice", "pw"))
            .await
            .expect_err("auth");
        assert!(matches!(
            err,
            AuthError::Storage(StorageError::Unavailable(_))
        ));
    }
}
