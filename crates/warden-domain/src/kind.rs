use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authentication mechanism tag carried by credentials and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    Password,
    ApiKey,
}

impl AuthKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthKind::Password => "password",
            AuthKind::ApiKey => "api_key",
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthKind {
    type Err = crate::DomainError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "password" => Ok(AuthKind::Password),
            "api_key" => Ok(AuthKind::ApiKey),
            other => Err(crate::DomainError::UnknownAuthKind(other.to_string())),
        }
    }
}

/// Opaque authorization token (e.g. `users:read`, `agents:edit`).
///
/// The core never parses hierarchy or wildcards out of a permission; two
/// permissions are related only by string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(pub String);

impl Permission {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        Permission(value.to_string())
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Permission(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_kind_round_trips_through_str() {
        for kind in [AuthKind::Password, AuthKind::ApiKey] {
            let parsed: AuthKind = kind.as_str().parse().expect("parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn unknown_auth_kind_rejected() {
        assert!("oidc".parse::<AuthKind>().is_err());
    }

    #[test]
    fn permissions_order_by_string() {
        let mut perms = vec![
            Permission::from("users:read"),
            Permission::from("agents:edit"),
        ];
        perms.sort();
        assert_eq!(perms[0].as_str(), "agents:edit");
    }
}
