//! CSPRNG-backed identifier and refresh-token generation.
//!
//! Entropy failures abort the calling operation with the underlying source
//! error; they are never masked as auth errors.

use crate::AuthError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use sha3::{Digest, Sha3_256};
use warden_domain::RefreshHash;

const ID_BYTES: usize = 16;
const REFRESH_TOKEN_BYTES: usize = 32;

/// 16 random bytes as lowercase hex (32 chars). Used for session IDs and
/// token IDs (`jti`).
pub(crate) fn new_id16() -> Result<String, AuthError> {
    let mut buf = [0u8; ID_BYTES];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(AuthError::Entropy)?;
    Ok(hex::encode(buf))
}

/// Fresh refresh token: the raw URL-safe-base64 form handed to the caller
/// and the SHA3-256 hash that is the only thing the store ever sees.
pub(crate) fn new_refresh_token() -> Result<(String, RefreshHash), AuthError> {
    let mut buf = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(AuthError::Entropy)?;
    let raw = URL_SAFE_NO_PAD.encode(buf);
    let hash = hash_refresh_token(&raw);
    Ok((raw, hash))
}

/// SHA3-256 over the raw refresh-token string.
pub(crate) fn hash_refresh_token(raw: &str) -> RefreshHash {
    let mut hasher = Sha3_256::new();
    hasher.update(raw.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id16_is_32_lowercase_hex_chars() {
        let id = new_id16().expect("id");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(id, new_id16().expect("id"));
    }

    #[test]
    fn refresh_token_shape_and_hash() {
        let (raw, hash) = new_refresh_token().expect("token");
        // 32 bytes of base64 without padding is 43 chars.
        assert_eq!(raw.len(), 43);
        assert!(!raw.contains('='));
        assert_eq!(hash, hash_refresh_token(&raw));
    }

    #[test]
    fn distinct_tokens_hash_differently() {
        let (raw_a, hash_a) = new_refresh_token().expect("token");
        let (raw_b, hash_b) = new_refresh_token().expect("token");
        assert_ne!(raw_a, raw_b);
        assert_ne!(hash_a, hash_b);
    }
}
