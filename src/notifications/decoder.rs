//! Push payload decoding.
//!
//! The provider wraps application data in a generic `custom` field that is
//! itself JSON-encoded, so the redirect URI sits one encoding level deeper:
//!
//! ```text
//! {"custom": "{\"u\": \"igniteGym://exercise/42\"}"}
//! ```

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// A notification as delivered by the push provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub raw_payload: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

impl RawNotification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, raw_payload: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            raw_payload,
            received_at: Utc::now(),
        }
    }
}

/// What the banner renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedNotification {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

impl DecodedNotification {
    /// Degraded form used when the payload cannot be decoded.
    pub fn title_only(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            redirect_uri: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed notification envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Malformed custom payload: {0}")]
    MalformedCustom(String),
}

/// Decode a raw notification into its title and optional redirect.
///
/// A missing or empty `u` is not an error: the notification simply has no
/// redirect.
pub fn decode(raw: &RawNotification) -> Result<DecodedNotification, DecodeError> {
    let text = std::str::from_utf8(&raw.raw_payload)
        .map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))?;
    let envelope: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))?;

    let custom = match envelope.get("custom") {
        None | Some(Value::Null) => {
            return Err(DecodeError::MalformedEnvelope(
                "missing `custom` field".to_string(),
            ))
        }
        Some(custom) => custom,
    };

    // Normally a JSON string; an embedded object goes through its serialized form
    let custom_text = match custom {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    };
    let inner: Value = serde_json::from_str(&custom_text)
        .map_err(|e| DecodeError::MalformedCustom(e.to_string()))?;

    let redirect_uri = inner
        .get("u")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    Ok(DecodedNotification {
        title: raw.title.clone(),
        redirect_uri,
    })
}
