//! Composition root for the authentication subsystem.
//!
//! Aggregates fully configured components (token issuer/verifier, session
//! service, RBAC resolver, password provider, login rate limiter) into a
//! bundle ready for use by transport layers. No business logic lives here.
//! Multiple independent stacks can coexist in one process.

use crate::clock::{Clock, SystemClock};
use crate::password::DEFAULT_PASSWORD_COST;
use crate::provider::{PasswordProvider, Provider};
use crate::ratelimit::{RateLimitConfig, RateLimiter};
use crate::rbac::RbacResolver;
use crate::session::{SessionConfig, SessionService};
use crate::token::{Hs256Issuer, Hs256Verifier, TokenVerifier};
use crate::AuthError;
use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use warden_domain::AuthKind;
use warden_storage::Storage;

/// Configuration surface of the auth stack.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Embedded in issued tokens; required by the verifier.
    pub issuer: String,
    /// Embedded in issued tokens; required by the verifier.
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub rotate_refresh: bool,
    pub max_attempts: u32,
    pub block_window: Duration,
    /// KDF cost for password enrollment.
    pub password_cost: u32,
    /// MAC key; copied by the issuer and verifier on construction.
    pub signing_secret: Vec<u8>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "warden".to_string(),
            audience: "control-plane".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            rotate_refresh: true,
            max_attempts: 5,
            block_window: Duration::from_secs(10 * 60),
            password_cost: DEFAULT_PASSWORD_COST,
            signing_secret: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Loads configuration from `WARDEN_AUTH_*` environment variables.
    ///
    /// Only the signing secret is mandatory; everything else defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        cfg.signing_secret = std::env::var("WARDEN_AUTH_SECRET")
            .context("read WARDEN_AUTH_SECRET")?
            .into_bytes();
        if let Ok(value) = std::env::var("WARDEN_AUTH_ISSUER") {
            cfg.issuer = value;
        }
        if let Ok(value) = std::env::var("WARDEN_AUTH_AUDIENCE") {
            cfg.audience = value;
        }
        if let Ok(value) = std::env::var("WARDEN_AUTH_ACCESS_TTL_SECS") {
            cfg.access_ttl =
                Duration::from_secs(value.parse().context("parse WARDEN_AUTH_ACCESS_TTL_SECS")?);
        }
        if let Ok(value) = std::env::var("WARDEN_AUTH_REFRESH_TTL_SECS") {
            cfg.refresh_ttl =
                Duration::from_secs(value.parse().context("parse WARDEN_AUTH_REFRESH_TTL_SECS")?);
        }
        if let Ok(value) = std::env::var("WARDEN_AUTH_ROTATE_REFRESH") {
            cfg.rotate_refresh = value.parse().context("parse WARDEN_AUTH_ROTATE_REFRESH")?;
        }
        if let Ok(value) = std::env::var("WARDEN_AUTH_MAX_ATTEMPTS") {
            cfg.max_attempts = value.parse().context("parse WARDEN_AUTH_MAX_ATTEMPTS")?;
        }
        if let Ok(value) = std::env::var("WARDEN_AUTH_BLOCK_WINDOW_SECS") {
            cfg.block_window =
                Duration::from_secs(value.parse().context("parse WARDEN_AUTH_BLOCK_WINDOW_SECS")?);
        }
        if let Ok(value) = std::env::var("WARDEN_AUTH_PASSWORD_COST") {
            cfg.password_cost = value.parse().context("parse WARDEN_AUTH_PASSWORD_COST")?;
        }
        Ok(cfg)
    }
}

/// Fully wired authentication stack.
pub struct AuthStack {
    /// Shared time source for issuance, verification and rate limiting.
    pub clock: Arc<dyn Clock>,
    /// Tracks failed login attempts and enforces temporary blocking.
    pub limiter: Arc<RateLimiter>,
    /// Login, refresh and revoke operations.
    pub sessions: Arc<SessionService>,
    /// Validates incoming access tokens.
    pub verifier: Arc<dyn TokenVerifier>,
}

impl std::fmt::Debug for AuthStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStack").finish_non_exhaustive()
    }
}

impl AuthStack {
    /// Wires the stack over the given storage backend with the system clock.
    pub fn new(store: Arc<dyn Storage>, cfg: AuthConfig) -> Result<Self, AuthError> {
        Self::with_clock(store, cfg, Arc::new(SystemClock))
    }

    /// Same as [`AuthStack::new`] with an injected clock, which tests use to
    /// drive expiry deterministically.
    pub fn with_clock(
        store: Arc<dyn Storage>,
        cfg: AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        if cfg.signing_secret.is_empty() || cfg.issuer.is_empty() || cfg.audience.is_empty() {
            return Err(AuthError::InvalidRequest);
        }

        let issuer = Arc::new(Hs256Issuer::new(&cfg.signing_secret));
        let verifier: Arc<dyn TokenVerifier> = Arc::new(Hs256Verifier::new(
            cfg.issuer.clone(),
            cfg.audience.clone(),
            &cfg.signing_secret,
            clock.clone(),
        ));
        let resolver = Arc::new(RbacResolver::new(store.clone()));

        let mut providers: HashMap<AuthKind, Arc<dyn Provider>> = HashMap::new();
        providers.insert(
            AuthKind::Password,
            Arc::new(PasswordProvider::new(store.clone())),
        );

        let sessions = Arc::new(SessionService::new(
            store,
            issuer,
            clock.clone(),
            SessionConfig {
                issuer: cfg.issuer.clone(),
                audience: cfg.audience.clone(),
                access_ttl: cfg.access_ttl,
                refresh_ttl: cfg.refresh_ttl,
                rotate_refresh: cfg.rotate_refresh,
            },
            resolver,
            providers,
        ));

        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_attempts: cfg.max_attempts,
            block_window: cfg.block_window,
        }));

        Ok(Self {
            clock,
            limiter,
            sessions,
            verifier,
        })
    }
}
