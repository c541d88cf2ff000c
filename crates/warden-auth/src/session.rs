//! Session and token business logic.
//!
//! # Purpose
//! The session service is the integrator of the auth core: it authenticates
//! a principal through a provider, enforces authorization through the RBAC
//! resolver (an empty effective permission set denies access), persists a
//! session record holding only the refresh-token hash, and issues signed
//! access tokens.
//!
//! # Key invariants
//! - The raw refresh token is returned to the caller exactly once per
//!   issuance; the store sees only its SHA3-256 hash.
//! - Refresh-token comparison is constant-time.
//! - A revoked session fails refresh with `revoked` regardless of expiry.
//! - With rotation enabled, the rotate step is the store's compare-and-swap:
//!   two parallel refreshes with the same old token cannot both succeed.

use crate::clock::Clock;
use crate::ids;
use crate::provider::{AuthRequest, PasswordRequest, Provider};
use crate::rbac::PermissionResolver;
use crate::token::TokenIssuer;
use crate::{AuthError, Identity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use warden_domain::{AuthKind, Permission, Session, User};
use warden_storage::{Storage, StorageError};

/// Access and refresh token pair returned by login and refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Session and token lifetime configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Embedded into issued access tokens and required by the verifier.
    pub issuer: String,
    /// Embedded into issued access tokens and required by the verifier.
    pub audience: String,
    /// Access-token lifetime.
    pub access_ttl: Duration,
    /// Refresh-token lifetime, applied on create and on rotation.
    pub refresh_ttl: Duration,
    /// When enabled, every refresh mints a new refresh token and persists
    /// the new hash atomically.
    pub rotate_refresh: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            issuer: "warden".to_string(),
            audience: "control-plane".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            rotate_refresh: true,
        }
    }
}

/// Login / refresh / revoke use cases over pluggable providers.
pub struct SessionService {
    store: Arc<dyn Storage>,
    issuer: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    cfg: SessionConfig,
    resolver: Arc<dyn PermissionResolver>,
    providers: HashMap<AuthKind, Arc<dyn Provider>>,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn Storage>,
        issuer: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
        cfg: SessionConfig,
        resolver: Arc<dyn PermissionResolver>,
        providers: HashMap<AuthKind, Arc<dyn Provider>>,
    ) -> Self {
        Self {
            store,
            issuer,
            clock,
            cfg,
            resolver,
            providers,
        }
    }

    fn ensure_ready(&self) -> Result<(), AuthError> {
        if self.cfg.issuer.is_empty() || self.cfg.audience.is_empty() {
            return Err(AuthError::InvalidRequest);
        }
        Ok(())
    }

    fn provider(&self, auth_kind: AuthKind) -> Result<&Arc<dyn Provider>, AuthError> {
        let provider = self
            .providers
            .get(&auth_kind)
            .ok_or(AuthError::InvalidRequest)?;
        if provider.kind() != auth_kind {
            return Err(AuthError::InvalidRequest);
        }
        Ok(provider)
    }

    async fn effective_permissions(&self, user: &User) -> Result<Vec<Permission>, AuthError> {
        // Resolver faults and an empty set are the same outcome here: the
        // service refuses to mint unusable tokens.
        match self.resolver.resolve_user_permissions(user).await {
            Ok(perms) if !perms.is_empty() => Ok(perms),
            Ok(_) | Err(_) => {
                metrics::counter!("warden_auth_denied_total").increment(1);
                tracing::debug!(user_id = %user.id, "empty effective permission set");
                Err(AuthError::Unauthorized)
            }
        }
    }

    fn build_identity(
        &self,
        user: &User,
        session_id: &str,
        permissions: Vec<Permission>,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let token_id = ids::new_id16()?;
        Ok(Identity {
            issuer: self.cfg.issuer.clone(),
            audience: vec![self.cfg.audience.clone()],
            subject: user.subject.clone(),
            user_id: user.id.clone(),
            session_id: session_id.to_string(),
            token_id,
            issued_at: now,
            not_before: now,
            expires_at: now + self.cfg.access_ttl,
            permissions,
            raw_token: None,
        })
    }

    /// Authenticates with the given mechanism, creates a session, and
    /// returns the token pair plus the identity used for issuance.
    ///
    /// Errors:
    /// - `invalid-request` for an unsupported auth kind or a provider whose
    ///   declared kind does not match its registration.
    /// - `invalid-credentials` when subject or secret is empty, and for any
    ///   credential-level failure inside the provider.
    /// - `unauthorized` when the effective permission set is empty or the
    ///   resolver fails.
    /// - Provider and storage faults propagate with their own kinds.
    pub async fn login(
        &self,
        auth_kind: AuthKind,
        subject: &str,
        secret: &str,
    ) -> Result<(TokenPair, Identity), AuthError> {
        self.ensure_ready()?;
        if subject.is_empty() || secret.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let provider = self.provider(auth_kind)?;
        let request = match auth_kind {
            AuthKind::Password => AuthRequest::Password(PasswordRequest {
                subject: subject.to_string(),
                password: secret.to_string(),
            }),
            _ => return Err(AuthError::InvalidRequest),
        };
        let authenticated = provider.authenticate(&request).await?;
        let user = authenticated.user;
        let credential = authenticated.credential;

        let permissions = self.effective_permissions(&user).await?;

        let (refresh_raw, refresh_hash) = ids::new_refresh_token()?;
        let session_id = ids::new_id16()?;
        let now = self.clock.now();
        let session = Session::new(
            &session_id,
            &user.id,
            &credential.id,
            auth_kind,
            refresh_hash,
            now + self.cfg.refresh_ttl,
            now,
        )
        .map_err(|err| AuthError::InvalidArgument(err.to_string()))?;
        self.store.create_session(session).await?;

        let identity = self.build_identity(&user, &session_id, permissions, now)?;
        let access_token = self.issuer.issue(&identity)?;
        metrics::counter!("warden_logins_total").increment(1);
        Ok((
            TokenPair {
                access_token,
                refresh_token: refresh_raw,
            },
            identity,
        ))
    }

    /// Exchanges a valid refresh token for a new access token.
    ///
    /// Validation failures on this path collapse to `invalid-refresh` so a
    /// caller cannot probe which step failed; the one exception is an
    /// explicitly revoked session, which reports `revoked`.
    pub async fn refresh(
        &self,
        session_id: &str,
        refresh_raw: &str,
    ) -> Result<(TokenPair, Identity), AuthError> {
        self.ensure_ready()?;
        if session_id.is_empty() || refresh_raw.is_empty() {
            return Err(AuthError::InvalidRefresh);
        }

        // Existence must not leak: every store outcome here reads the same.
        let session = self
            .store
            .get_session(session_id)
            .await
            .map_err(|_| AuthError::InvalidRefresh)?;

        let now = self.clock.now();
        if session.revoked {
            return Err(AuthError::Revoked);
        }
        if session.expired(now) {
            return Err(AuthError::InvalidRefresh);
        }

        let presented = ids::hash_refresh_token(refresh_raw);
        if !bool::from(presented.ct_eq(&session.refresh_hash)) {
            return Err(AuthError::InvalidRefresh);
        }

        let user = self
            .store
            .get_user(&session.user_id)
            .await
            .map_err(|_| AuthError::InvalidRefresh)?;
        if user.disabled {
            return Err(AuthError::InvalidRefresh);
        }

        let permissions = self.effective_permissions(&user).await?;

        let mut refresh_out = refresh_raw.to_string();
        if self.cfg.rotate_refresh {
            let (new_raw, new_hash) = ids::new_refresh_token()?;
            match self
                .store
                .rotate_refresh(session_id, &presented, &new_hash, now + self.cfg.refresh_ttl)
                .await
            {
                Ok(()) => refresh_out = new_raw,
                // Lost the race against a parallel refresh or revocation.
                Err(StorageError::Conflict(_)) => return Err(AuthError::InvalidRefresh),
                Err(other) => return Err(other.into()),
            }
        }

        let identity = self.build_identity(&user, session_id, permissions, now)?;
        let access_token = self.issuer.issue(&identity)?;
        Ok((
            TokenPair {
                access_token,
                refresh_token: refresh_out,
            },
            identity,
        ))
    }

    /// Marks a session revoked as of now. Revoking an unknown session is a
    /// caller bug (`invalid-request`), not a storage fault.
    pub async fn revoke(&self, session_id: &str) -> Result<(), AuthError> {
        self.ensure_ready()?;
        if session_id.is_empty() {
            return Err(AuthError::InvalidRequest);
        }
        match self.store.revoke_session(session_id, self.clock.now()).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound(_)) => Err(AuthError::InvalidRequest),
            Err(other) => Err(other.into()),
        }
    }
}
