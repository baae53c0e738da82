use serde_json::Value;
use tracing::debug;

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::{Expansion, FilterData};
use crate::store::AccountQuery;

pub struct Filter {
    where_data: Option<Value>,
    expansions: Vec<Expansion>,
    limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self {
            where_data: None,
            expansions: vec![],
            limit: None,
        }
    }

    pub fn from_data(data: FilterData) -> Result<Self, FilterError> {
        let mut filter = Self::new();
        filter.assign(data)?;
        Ok(filter)
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        self.include(&data.include);
        if let Some(limit) = data.limit { self.limit(limit)?; }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn include(&mut self, names: &[String]) -> &mut Self {
        for name in names {
            match Expansion::parse(name) {
                Some(expansion) if !self.expansions.contains(&expansion) => self.expansions.push(expansion),
                Some(_) => {}
                None => debug!("Ignoring unknown include '{}'", name),
            }
        }
        self
    }

    pub fn limit(&mut self, limit: i64) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        self.limit = Some(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(self)
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    pub fn expands(&self, expansion: Expansion) -> bool {
        self.expansions.contains(&expansion)
    }

    /// Search used to list records: conditions plus requested expansions
    pub fn to_query(&self) -> Result<AccountQuery, FilterError> {
        let mut query = self.to_count_query()?;
        query.expand_custom_data = self.expands(Expansion::CustomData);
        Ok(query)
    }

    /// Search used when only the size of the result set matters
    pub fn to_count_query(&self) -> Result<AccountQuery, FilterError> {
        match self.where_data {
            Some(ref where_data) => FilterWhere::generate(where_data),
            None => Ok(AccountQuery::new()),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}
