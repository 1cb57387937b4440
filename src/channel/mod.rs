//! Channel records and the rules shared by every channel operation.
//!
//! # Data Flow
//! ```text
//! POST /api/create | /api/update (loose JSON)
//!     → validation.rs (required fields, coercion)
//!     → registry.rs (reserved ids, uniqueness, authorization)
//!     → RecordStore (atomic insert / compare-and-swap)
//! ```
//!
//! # Design Decisions
//! - Records keep the on-disk field names of the deployed JSON documents
//! - Secrets are stored as given; every comparison goes through
//!   [`credentials_match`] so it can be swapped for a hashed check later
//! - Reserved ids are compared case-insensitively, stored ids are not

pub mod password;
pub mod registry;
pub mod validation;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use subtle::ConstantTimeEq;

pub use password::generate_password;
pub use registry::{ChannelRegistry, Created};
pub use validation::{normalize_channel_form, ChannelForm};

/// Channel ids that collide with system routes.
pub const RESERVED_IDS: [&str; 5] = ["api", "admin", "register", "login", "static"];

/// Returns true if `channel_id` equals a reserved word, ignoring case.
pub fn is_reserved(channel_id: &str) -> bool {
    let lowered = channel_id.to_lowercase();
    RESERVED_IDS.iter().any(|reserved| *reserved == lowered)
}

/// Compare a stored secret against a supplied one.
///
/// Used for both the administrative password and the access key.
pub fn credentials_match(stored: &str, supplied: &str) -> bool {
    stored.as_bytes().ct_eq(supplied.as_bytes()).into()
}

/// Target port as submitted: the registration form sends a string, API
/// clients often send a number. Both render the same way in a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Port {
    Number(u64),
    Text(String),
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Number(n) => write!(f, "{}", n),
            Port::Text(s) => f.write_str(s),
        }
    }
}

impl From<u16> for Port {
    fn from(port: u16) -> Self {
        Port::Number(port as u64)
    }
}

impl From<&str> for Port {
    fn from(port: &str) -> Self {
        Port::Text(port.to_string())
    }
}

/// Read a scalar as text. Hand-edited documents hold numeric passwords and
/// hosts; `null` reads as empty.
fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string, found {}",
            other
        ))),
    }
}

/// Read a flag with form truthiness: `false`, `0`, `""` and `null` are off.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// The persisted unit, keyed by channel id in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Administrative credential required to update the record.
    #[serde(deserialize_with = "scalar_text")]
    pub password: String,

    /// Redirect with `https` instead of `http`.
    #[serde(default, deserialize_with = "truthy")]
    pub https: bool,

    /// Target hostname or IP. Older documents call this `ip`.
    #[serde(alias = "ip", deserialize_with = "scalar_text")]
    pub host: String,

    pub port: Port,

    /// Optional access password gating the redirect. Empty means public.
    #[serde(rename = "accessKey", default, deserialize_with = "scalar_text")]
    pub access_key: String,
}

impl ChannelRecord {
    /// True when redirects require a valid access proof.
    pub fn is_gated(&self) -> bool {
        !self.access_key.is_empty()
    }

    pub fn scheme(&self) -> &'static str {
        if self.https {
            "https"
        } else {
            "http"
        }
    }
}
