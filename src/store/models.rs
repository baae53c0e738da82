use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::filter::Expansion;

/// Keys the remote store manages on every custom data resource
pub const CUSTOM_DATA_METADATA: &[&str] = &["href", "createdAt", "modifiedAt"];

/// Link to a nested collection or resource: `{ "href": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub href: String,
}

/// Top-level scope that owns every account operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub href: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub accounts: ResourceRef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    #[default]
    Enabled,
    Disabled,
    Unverified,
}

/// Schemaless attribute bag attached to an account.
///
/// The store only returns the full bag when the caller asks for it to be expanded;
/// otherwise the account carries `custom_data: None`. An expanded bag with no
/// fields is still `Some`, so "empty" and "not requested" stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomData {
    pub href: Option<String>,
    pub fields: Map<String, Value>,
}

impl CustomData {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: Some(href.into()), fields: Map::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for CustomData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = self.fields.clone();
        if let Some(href) = &self.href {
            map.insert("href".to_string(), Value::String(href.clone()));
        }
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CustomData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let href = match fields.remove("href") {
            Some(Value::String(href)) => Some(href),
            _ => None,
        };
        for key in CUSTOM_DATA_METADATA {
            fields.remove(*key);
        }
        Ok(Self { href, fields })
    }
}

/// Account resource as the remote store returns it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default)]
    pub status: AccountStatus,
    /// Write-only; set locally before a save, never returned by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn custom_data_href(&self) -> String {
        self.custom_data
            .as_ref()
            .and_then(|c| c.href.clone())
            .unwrap_or_else(|| format!("{}/customData", self.href))
    }

    /// Custom data bag, created empty if the account was fetched without it
    pub fn custom_data_mut(&mut self) -> &mut CustomData {
        let href = self.custom_data_href();
        self.custom_data.get_or_insert_with(|| CustomData::new(href))
    }

    /// True when the custom data carries anything beyond its own href
    pub fn has_custom_fields(&self) -> bool {
        self.custom_data.as_ref().map(|c| !c.is_empty()).unwrap_or(false)
    }
}

/// Payload for account creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_data: Map<String, Value>,
}

/// Equality search against the application's account collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountQuery {
    pub filters: BTreeMap<String, String>,
    pub expand_custom_data: bool,
}

impl AccountQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn expanded(mut self) -> Self {
        self.expand_custom_data = true;
        self
    }

    /// Query-string parameters for one page of results
    pub fn to_params(&self, offset: usize, limit: usize) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.push(("offset".to_string(), offset.to_string()));
        params.push(("limit".to_string(), limit.to_string()));
        if self.expand_custom_data {
            params.push(("expand".to_string(), Expansion::CustomData.as_str().to_string()));
        }
        params
    }
}

/// One page of a remote collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub size: usize,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Credentials presented for a login attempt
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub login: String,
    pub password: String,
}
