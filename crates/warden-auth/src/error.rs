use thiserror::Error;
use warden_storage::StorageError;

/// Closed error taxonomy shared by every auth component.
///
/// Transports map these kinds onto status codes; clients never receive cause
/// detail for `InvalidCredentials`, `InvalidToken` or `InvalidRefresh`; the
/// three paths are indistinguishable from the outside. Storage faults keep
/// their own kind through the `Storage` variant so operators can tell
/// `unavailable` from a bad password in server logs.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Caller wiring bug, unsupported auth kind, or malformed call shape.
    #[error("invalid request")]
    InvalidRequest,
    /// A field violates a declared precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Any auth-time failure that must not enumerate its cause.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Access token malformed, wrong algorithm, bad signature, or wrong
    /// issuer/audience.
    #[error("invalid token")]
    InvalidToken,
    /// Access token time window violated.
    #[error("expired token")]
    ExpiredToken,
    /// Refresh flow failure that must not enumerate its cause.
    #[error("invalid refresh")]
    InvalidRefresh,
    /// Session explicitly revoked.
    #[error("session revoked")]
    Revoked,
    /// Authentication succeeded but RBAC denies access.
    #[error("unauthorized")]
    Unauthorized,
    /// The rate limiter blocked the key.
    #[error("rate limited")]
    RateLimited,
    /// Request and provider disagree on the authentication mechanism.
    #[error("wrong auth kind")]
    WrongAuthKind,
    /// Storage fault propagated unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// CSPRNG failure; never masked as an auth error.
    #[error("entropy source: {0}")]
    Entropy(#[source] rand::Error),
}
