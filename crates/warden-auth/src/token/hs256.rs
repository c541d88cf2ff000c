//! HMAC-SHA-256 token issuer and verifier.
//!
//! # Key invariants
//! - The algorithm is pinned: a token whose header advertises anything but
//!   HS256 (notably `none`) is rejected before any MAC computation.
//! - Both ends copy the signing secret on construction; mutating the
//!   caller's buffer afterwards does not affect behavior.
//! - Time windows are checked against the injected [`Clock`], the same
//!   instance the session service stamps identities with, so expiry is
//!   deterministic under test clocks.

use crate::clock::Clock;
use crate::token::{TokenIssuer, TokenVerifier};
use crate::{AuthError, Identity};
use chrono::DateTime;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warden_domain::Permission;

const PINNED_ALG: Algorithm = Algorithm::HS256;

/// `aud` is a string or an array on the wire; both forms are accepted.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn into_vec(self) -> Vec<String> {
        match self {
            Audience::One(value) => vec![value],
            Audience::Many(values) => values,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    iss: String,
    aud: Audience,
    sub: String,
    jti: String,
    iat: i64,
    nbf: i64,
    exp: i64,
    #[serde(default)]
    uid: String,
    #[serde(default)]
    sid: String,
    #[serde(default)]
    perms: Vec<Permission>,
}

/// Issues HS256-signed access tokens.
pub struct Hs256Issuer {
    secret: Vec<u8>,
}

impl Hs256Issuer {
    /// The secret is copied; the caller keeps ownership of its buffer.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }
}

impl TokenIssuer for Hs256Issuer {
    fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        // Required-claim checks run before any signing work.
        if identity.issuer.is_empty()
            || identity.subject.is_empty()
            || identity.token_id.is_empty()
        {
            return Err(AuthError::InvalidToken);
        }
        if identity.audience.is_empty() || identity.audience.iter().any(|aud| aud.is_empty()) {
            return Err(AuthError::InvalidToken);
        }
        if identity.expires_at <= identity.issued_at
            || identity.expires_at <= identity.not_before
        {
            return Err(AuthError::InvalidToken);
        }
        if identity.permissions.iter().any(|perm| perm.is_empty()) {
            return Err(AuthError::InvalidToken);
        }

        let claims = AccessClaims {
            iss: identity.issuer.clone(),
            aud: Audience::Many(identity.audience.clone()),
            sub: identity.subject.clone(),
            jti: identity.token_id.clone(),
            iat: identity.issued_at.timestamp(),
            nbf: identity.not_before.timestamp(),
            exp: identity.expires_at.timestamp(),
            uid: identity.user_id.clone(),
            sid: identity.session_id.clone(),
            perms: identity.permissions.clone(),
        };
        encode(
            &Header::new(PINNED_ALG),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|_| AuthError::InvalidToken)
    }
}

/// Verifies HS256-signed access tokens.
pub struct Hs256Verifier {
    issuer: String,
    audience: String,
    secret: Vec<u8>,
    clock: Arc<dyn Clock>,
}

impl Hs256Verifier {
    /// The secret is copied; the caller keeps ownership of its buffer.
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        secret: &[u8],
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            secret: secret.to_vec(),
            clock,
        }
    }
}

impl TokenVerifier for Hs256Verifier {
    fn verify(&self, raw_token: &str) -> Result<Identity, AuthError> {
        if raw_token.is_empty()
            || self.issuer.is_empty()
            || self.audience.is_empty()
            || self.secret.is_empty()
        {
            return Err(AuthError::InvalidToken);
        }

        // Algorithm pin: decided from the header alone, before any MAC work.
        let header = decode_header(raw_token).map_err(|_| AuthError::InvalidToken)?;
        if header.alg != PINNED_ALG {
            return Err(AuthError::InvalidToken);
        }

        let mut validation = Validation::new(PINNED_ALG);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["iss", "aud", "exp", "nbf"]);
        // The time window is enforced below against the injected clock;
        // jsonwebtoken has no time source hook.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        let data = decode::<AccessClaims>(
            raw_token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })?;

        let claims = data.claims;
        if claims.sub.is_empty() || claims.jti.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let now = self.clock.now().timestamp();
        if now < claims.nbf || now >= claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::InvalidToken)?;
        let not_before = DateTime::from_timestamp(claims.nbf, 0).ok_or(AuthError::InvalidToken)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;

        Ok(Identity {
            issuer: claims.iss,
            audience: claims.aud.into_vec(),
            subject: claims.sub,
            user_id: claims.uid,
            session_id: claims.sid,
            token_id: claims.jti,
            issued_at,
            not_before,
            expires_at,
            permissions: claims.perms,
            raw_token: Some(raw_token.to_string()),
        })
    }
}
