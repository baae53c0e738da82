//! Conversion between account hrefs and the short ids handed to callers.

use url::Url;

use crate::error::ConnectorError;

/// Rebuild an account href from its id
pub fn record_to_remote_id(base_url: &str, id: &str) -> Result<String, ConnectorError> {
    let id = validate_id(id)?;
    Ok(format!("{}/accounts/{}", base_url.trim_end_matches('/'), id))
}

/// An id must name a single path segment under the accounts collection
pub fn validate_id(id: &str) -> Result<&str, ConnectorError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ConnectorError::validation("id must not be empty"));
    }
    if id == "." || id == ".." || id.contains(['/', '?', '#', '%']) {
        return Err(ConnectorError::validation(format!("invalid account id '{}'", id)));
    }
    Ok(id)
}

/// Last path segment of an href
pub fn locator_to_id(href: &str) -> Result<String, ConnectorError> {
    let url = Url::parse(href).map_err(|e| ConnectorError::MalformedLocator(format!("{}: {}", href, e)))?;
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| ConnectorError::MalformedLocator(format!("{}: no path segments", href)))
}
