use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{self, StorefrontResult};

/// Role attached to a principal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Customer,
    Other(String),
}

impl Role {
    /// Role names are matched exactly; any other spelling is `Other`
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Role::Admin,
            "customer" => Role::Customer,
            _ => Role::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
            Role::Other(raw) => raw,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Customer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::parse(&raw))
    }
}

/// The authenticated user, derived from the session token on every read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |exp| exp <= Utc::now())
    }
}

/// Whether a stored token value counts as a session at all. Blank values
/// are treated as logged out everywhere.
pub fn is_present(raw: &str) -> bool {
    !raw.trim().is_empty()
}

/// Claims carried in the token payload segment
#[derive(Debug, Deserialize)]
struct Claims {
    sub: serde_json::Value,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode the payload of a `header.payload.signature` token.
///
/// The signature is not checked here; the backend verifies it on every
/// request. Expiry is checked against the local clock.
pub fn decode_principal(token: &str) -> StorefrontResult<Principal> {
    let token = token.trim();
    if token.is_empty() {
        return Err(error::auth_token_invalid("token is empty"));
    }

    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(error::auth_token_invalid("expected three dot-separated segments")),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| error::auth_token_invalid(format!("payload is not base64url: {}", e)))?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| error::auth_token_invalid(format!("payload is not valid claims: {}", e)))?;

    let id = match claims.sub {
        serde_json::Value::String(s) if !s.is_empty() => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => return Err(error::auth_token_invalid("missing subject")),
    };

    let expires_at = match claims.exp {
        Some(exp) => Some(
            Utc.timestamp_opt(exp, 0)
                .single()
                .ok_or_else(|| error::auth_token_invalid("expiry out of range"))?,
        ),
        None => None,
    };

    let principal = Principal {
        id,
        email: claims.email,
        name: claims.name,
        role: claims.role.unwrap_or_default(),
        expires_at,
    };

    if principal.is_expired() {
        return Err(error::auth_token_invalid("token has expired"));
    }
    Ok(principal)
}

/// Build an unsigned token with the given claims. Used by tests and the demo.
pub fn encode_unsigned(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.unsigned", header, payload)
}
