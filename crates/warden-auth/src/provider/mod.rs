//! Pluggable per-mechanism authenticators.
//!
//! A provider authenticates a principal with one mechanism and nothing else:
//! no authorization, no session or token work, no entity mutation. The
//! session service routes requests to providers by auth kind.

mod password;

pub use password::PasswordProvider;

use crate::AuthError;
use async_trait::async_trait;
use warden_domain::{AuthKind, Credential, User};

/// Subject + password presentation.
#[derive(Debug, Clone)]
pub struct PasswordRequest {
    pub subject: String,
    pub password: String,
}

/// Subject + API key presentation.
#[derive(Debug, Clone)]
pub struct ApiKeyRequest {
    pub subject: String,
    pub key: String,
}

/// Mechanism-specific authentication request.
///
/// Each variant targets exactly one provider; a provider handed a variant for
/// a different mechanism rejects it with `wrong-auth-kind`.
#[derive(Debug, Clone)]
pub enum AuthRequest {
    Password(PasswordRequest),
    ApiKey(ApiKeyRequest),
}

impl AuthRequest {
    /// The mechanism this request targets.
    pub fn auth_kind(&self) -> AuthKind {
        match self {
            AuthRequest::Password(_) => AuthKind::Password,
            AuthRequest::ApiKey(_) => AuthKind::ApiKey,
        }
    }
}

/// Output of authentication (not authorization).
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub credential: Credential,
}

/// Authenticates a principal with one mechanism.
///
/// Contract:
/// - `kind()` must match [`AuthRequest::auth_kind`] for supported requests.
/// - `authenticate` must not perform authorization or token issuance.
/// - Returned entities are read-only copies; providers never mutate state.
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> AuthKind;

    async fn authenticate(&self, request: &AuthRequest) -> Result<Authenticated, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_kind_tags() {
        let pw = AuthRequest::Password(PasswordRequest {
            subject: "alice".to_string(),
            password: "pw".to_string(),
        });
        assert_eq!(pw.auth_kind(), AuthKind::Password);

        let key = AuthRequest::ApiKey(ApiKeyRequest {
            subject: "alice".to_string(),
            key: "k".to_string(),
        });
        assert_eq!(key.auth_kind(), AuthKind::ApiKey);
    }
}
