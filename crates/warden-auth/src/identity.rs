use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_domain::Permission;

/// In-memory claim set: the input to token issuance and the output of token
/// verification.
///
/// Time fields share the clock basis of the issuing service. Consumers treat
/// `permissions` as a set; duplicates carry no meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub issuer: String,
    pub audience: Vec<String>,
    pub subject: String,
    pub user_id: String,
    pub session_id: String,
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub permissions: Vec<Permission>,
    /// Raw bearer token kept for diagnostics on the verification path.
    /// Scrub before handing the identity to an untrusted caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_token: Option<String>,
}

impl Identity {
    /// Membership test against the embedded permission list.
    ///
    /// An empty query is always false.
    pub fn has_permission(&self, permission: &Permission) -> bool {
        !permission.is_empty() && self.permissions.contains(permission)
    }

    /// Copy of the identity with the raw token dropped.
    pub fn scrubbed(&self) -> Identity {
        Identity {
            raw_token: None,
            ..self.clone()
        }
    }
}
