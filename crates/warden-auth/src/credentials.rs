//! Administrative credential enrollment.
//!
//! Provisions the credential + verifier pair for a login mechanism. The
//! verifier swap is delete-then-upsert: the delete is idempotent, so
//! enrollment doubles as password replacement.

use crate::clock::Clock;
use crate::password::hash_password;
use crate::{ids, AuthError};
use warden_domain::{AuthKind, Credential, Verifier};
use warden_storage::Storage;

/// Creates (or re-keys) a password credential for a user.
///
/// The credential record stays stable across password changes; only the
/// verifier material is replaced.
pub async fn enroll_password(
    store: &dyn Storage,
    clock: &dyn Clock,
    credential_id: &str,
    user_id: &str,
    plaintext: &str,
    cost: u32,
) -> Result<Credential, AuthError> {
    if plaintext.is_empty() {
        return Err(AuthError::InvalidArgument("empty password".to_string()));
    }
    let now = clock.now();
    let material = hash_password(plaintext, cost)?;

    let credential = Credential::new(credential_id, user_id, AuthKind::Password, now)
        .map_err(|err| AuthError::InvalidArgument(err.to_string()))?;
    store.upsert_credential(credential.clone()).await?;

    store.delete_verifier_by_credential(credential_id).await?;
    let verifier = Verifier::new(
        ids::new_id16()?,
        credential_id,
        material.into_bytes(),
        now,
    )
    .map_err(|err| AuthError::InvalidArgument(err.to_string()))?;
    store.upsert_verifier(verifier).await?;

    Ok(credential)
}
