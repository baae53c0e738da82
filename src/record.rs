use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::models::CUSTOM_DATA_METADATA;

/// Keys that never land in an account's custom data
pub const RESERVED_FIELDS: &[&str] = &["id", "password", "givenName", "surname", "middleName", "email"];

/// Errors that can occur while reading a record from caller input
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
}

/// Flat, caller-facing view of an account.
///
/// Keys other than the modeled ones are kept in `extra` and end up in the account's
/// custom data on write. `password` is accepted on input and never serialized back out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create record from caller input; the input must be a JSON object
    pub fn from_json(json: Value) -> Result<Self, RecordError> {
        match json {
            Value::Object(_) => {
                serde_json::from_value(json).map_err(|e| RecordError::InvalidJson(e.to_string()))
            }
            _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Non-empty id, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Lower-cased email used for lookups
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(normalize_email)
            .filter(|email| !email.is_empty())
    }

    /// Free-form attributes destined for custom data, reserved keys excluded.
    /// Top-level extras win over entries of an explicit `customData` object.
    pub fn custom_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        let explicit = self.custom_data.iter().flat_map(|data| data.iter());
        for (key, value) in explicit.chain(self.extra.iter()) {
            if !RESERVED_FIELDS.contains(&key.as_str()) && !CUSTOM_DATA_METADATA.contains(&key.as_str()) {
                fields.insert(key.clone(), value.clone());
            }
        }
        fields
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
