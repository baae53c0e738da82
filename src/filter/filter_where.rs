use serde_json::Value;
use tracing::debug;

use super::error::FilterError;
use super::types::{FilterWhereInfo, SEARCHABLE_FIELDS};
use crate::store::AccountQuery;

/// Translates a `where` object into the remote store's equality search.
///
/// Only string-valued equality on [`SEARCHABLE_FIELDS`] survives. Operator objects
/// (`{"gt": ..}`), non-string values and composite keys (`and`, `or`, `$and`, ...) are
/// dropped, so a query using them matches more accounts than the caller asked for.
pub struct FilterWhere {
    conditions: Vec<FilterWhereInfo>,
    dropped: Vec<String>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self { conditions: vec![], dropped: vec![] }
    }

    pub fn generate(where_data: &Value) -> Result<AccountQuery, FilterError> {
        let mut filter_where = Self::new();
        filter_where.parse_where_data(where_data)?;
        Ok(filter_where.into_query())
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    /// Keys that were present but could not be expressed remotely
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    pub fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        Self::validate(where_data)?;
        let Value::Object(obj) = where_data else {
            return Ok(());
        };

        for (key, value) in obj {
            match value {
                Value::String(s) if SEARCHABLE_FIELDS.contains(&key.as_str()) => {
                    let value = if key == "email" { s.trim().to_lowercase() } else { s.clone() };
                    self.conditions.push(FilterWhereInfo { field: key.clone(), value });
                }
                _ => {
                    debug!("Dropping unsupported where condition on '{}'", key);
                    self.dropped.push(key.clone());
                }
            }
        }
        Ok(())
    }

    fn into_query(self) -> AccountQuery {
        self.conditions
            .into_iter()
            .fold(AccountQuery::new(), |query, c| query.with_filter(c.field, c.value))
    }
}

impl Default for FilterWhere {
    fn default() -> Self {
        Self::new()
    }
}

/// Equality query for the allow-listed string conditions in `where_data`
pub fn build_remote_filter(where_data: &Value) -> Result<AccountQuery, FilterError> {
    FilterWhere::generate(where_data)
}
