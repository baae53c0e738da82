use serde::{Deserialize, Deserializer, Serialize};

/// Fields the remote store can match on. Conditions on anything else are dropped.
pub const SEARCHABLE_FIELDS: &[&str] = &["givenName", "middleName", "surname", "username", "email"];

/// Query descriptor as a caller supplies it: `{ where, include, limit }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl FilterData {
    pub fn matching(where_clause: serde_json::Value) -> Self {
        Self { where_clause: Some(where_clause), ..Default::default() }
    }
}

/// `include` may be a single name or a list of names
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(name)) => vec![name],
        Some(OneOrMany::Many(names)) => names,
        None => vec![],
    })
}

/// Nested resources that can be materialized alongside an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    CustomData,
}

impl Expansion {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "customData" => Some(Expansion::CustomData),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Expansion::CustomData => "customData",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterWhereInfo {
    pub field: String,
    pub value: String,
}
