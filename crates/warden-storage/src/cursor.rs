//! Opaque pagination cursor codec.
//!
//! A cursor pins the `(updated_at, id)` position of the last item on the
//! previous page. It is serialized to JSON and base64-encoded so clients
//! treat it as an opaque token; any decode failure maps to
//! `invalid-argument`.

use crate::StorageError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub updated_at: DateTime<Utc>,
    pub id: String,
}

impl Cursor {
    pub fn encode(&self) -> String {
        // Serialization of a two-field struct cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self, StorageError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| StorageError::InvalidArgument("malformed cursor".to_string()))?;
        serde_json::from_slice(&raw)
            .map_err(|_| StorageError::InvalidArgument("malformed cursor".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cursor = Cursor {
            updated_at: Utc::now(),
            id: "u1".to_string(),
        };
        let decoded = Cursor::decode(&cursor.encode()).expect("decode");
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn garbage_is_invalid_argument() {
        for token in ["not-base64!!", "aGVsbG8", ""] {
            let err = Cursor::decode(token).expect_err("decode");
            assert!(matches!(err, StorageError::InvalidArgument(_)));
        }
    }
}
