//! Wire types for the booking backend.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Login credentials as sent to `POST /login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    #[serde(rename = "email")]
    pub identifier: String,
    #[serde(rename = "password")]
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// An event as listed by `GET /events`.
///
/// Field names match the backend exactly. Everything except the id may be
/// missing and is defaulted at display time. Fields of an unexpected type are
/// decoded leniently so one odd record never fails the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "ID", default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "Description", default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(rename = "DateTime", default, deserialize_with = "lenient_text")]
    pub date_time: Option<String>,
    #[serde(rename = "Location", default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
}

/// Successful `POST /login` response body.
#[derive(Debug, Deserialize)]
pub(super) struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// Scalars become text, `null` and compound values become `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}
