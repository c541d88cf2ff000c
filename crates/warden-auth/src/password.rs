//! Password verifier material: adaptive-KDF hashing and verification.
//!
//! The KDF is bcrypt, deliberately a time-hard password KDF rather than a
//! plain cryptographic hash. Its output is self-describing: the `$2b$`
//! prefix pins the KDF identifier, followed by the cost parameter and the
//! salt+key block, so the material needs no side-channel metadata. The
//! bytes are opaque to every module but this one.

use crate::AuthError;

/// Default KDF cost (2^12 work units).
pub const DEFAULT_PASSWORD_COST: u32 = 12;

/// Outcome of a password check. Deliberately does not say *why* a
/// non-match happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Valid,
    Mismatch,
    Malformed,
}

/// Derives verifier material from a plaintext password.
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(plaintext, cost)
        .map_err(|err| AuthError::InvalidArgument(format!("password hash: {err}")))
}

/// Checks a plaintext password against stored verifier material.
///
/// The underlying compare runs in constant time. Hash/plaintext
/// disagreement and unparseable material both end in a non-`Valid` outcome
/// without revealing which.
pub fn verify_password(material: &[u8], plaintext: &str) -> PasswordCheck {
    let Ok(encoded) = std::str::from_utf8(material) else {
        return PasswordCheck::Malformed;
    };
    match bcrypt::verify(plaintext, encoded) {
        Ok(true) => PasswordCheck::Valid,
        Ok(false) => PasswordCheck::Mismatch,
        Err(_) => PasswordCheck::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the test suite fast; production uses the default.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_then_verify_round_trips() {
        let material = hash_password("correct horse", TEST_COST).expect("hash");
        assert_eq!(
            verify_password(material.as_bytes(), "correct horse"),
            PasswordCheck::Valid
        );
        assert_eq!(
            verify_password(material.as_bytes(), "battery staple"),
            PasswordCheck::Mismatch
        );
    }

    #[test]
    fn material_embeds_kdf_and_cost() {
        let material = hash_password("pw", TEST_COST).expect("hash");
        assert!(material.starts_with("$2"));
        assert!(material.contains("$04$"));
    }

    #[test]
    fn salts_are_random() {
        let a = hash_password("pw", TEST_COST).expect("hash");
        let b = hash_password("pw", TEST_COST).expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_material_is_malformed() {
        assert_eq!(
            verify_password(b"not-a-kdf-string", "pw"),
            PasswordCheck::Malformed
        );
        assert_eq!(verify_password(&[0xff, 0xfe], "pw"), PasswordCheck::Malformed);
    }

    #[test]
    fn out_of_range_cost_is_rejected() {
        let err = hash_password("pw", 99).expect_err("cost");
        assert!(matches!(err, AuthError::InvalidArgument(_)));
    }
}
