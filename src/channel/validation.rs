//! Request payload validation.
//!
//! # Responsibilities
//! - Report every missing required field, in declaration order
//! - Reject present-but-mistyped fields
//! - Coerce optional fields (`https`, `accessKey`) to their defaults
//!
//! # Design Decisions
//! - Operates on `serde_json::Value` so that a missing field and a wrongly
//!   typed field produce field-level messages instead of serde errors
//! - "Missing" follows form semantics: absent, `null`, `false`, `0` and `""`
//!   all count as not supplied

use serde_json::Value;

use crate::channel::{ChannelRecord, Port};
use crate::error::ChannelError;

/// Required fields of a create or update payload.
pub const CHANNEL_FIELDS: [&str; 4] = ["channel_id", "password", "host", "port"];

/// A normalized create/update payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelForm {
    pub channel_id: String,
    pub password: String,
    pub host: String,
    pub port: Port,
    pub https: bool,
    pub access_key: String,
}

impl ChannelForm {
    /// Split the form into its store key and the record to persist.
    pub fn into_record(self) -> (String, ChannelRecord) {
        let record = ChannelRecord {
            password: self.password,
            https: self.https,
            host: self.host,
            port: self.port,
            access_key: self.access_key,
        };
        (self.channel_id, record)
    }
}

/// Whether a JSON value counts as supplied.
fn is_supplied(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Names from `required` that are not supplied in `input`, order preserved.
///
/// A non-object input is missing every field.
pub fn missing_fields<'a>(input: &Value, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|field| !is_supplied(input.get(field)))
        .collect()
}

/// Fails with the standard message when any of `required` is missing.
pub fn require_fields(input: &Value, required: &[&str]) -> Result<(), ChannelError> {
    let missing = missing_fields(input, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChannelError::InvalidRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn port_from(value: &Value) -> Option<Port> {
    match value {
        Value::String(s) => Some(Port::Text(s.clone())),
        Value::Number(n) => Some(match n.as_u64() {
            Some(port) => Port::Number(port),
            None => Port::Text(n.to_string()),
        }),
        _ => None,
    }
}

/// Validate and normalize a create/update payload.
pub fn normalize_channel_form(input: &Value) -> Result<ChannelForm, ChannelError> {
    require_fields(input, &CHANNEL_FIELDS)?;

    let text = |field: &str| input.get(field).and_then(Value::as_str).map(str::to_owned);
    let channel_id = text("channel_id");
    let password = text("password");
    let host = text("host");
    let port = input.get("port").and_then(port_from);

    let mut invalid = Vec::new();
    if channel_id.is_none() {
        invalid.push("channel_id");
    }
    if password.is_none() {
        invalid.push("password");
    }
    if host.is_none() {
        invalid.push("host");
    }
    if port.is_none() {
        invalid.push("port");
    }

    match (channel_id, password, host, port) {
        (Some(channel_id), Some(password), Some(host), Some(port)) => Ok(ChannelForm {
            channel_id,
            password,
            host,
            port,
            https: input.get("https").and_then(Value::as_bool).unwrap_or(false),
            access_key: text("accessKey").unwrap_or_default(),
        }),
        _ => Err(ChannelError::InvalidRequest(format!(
            "Invalid fields: {}",
            invalid.join(", ")
        ))),
    }
}
