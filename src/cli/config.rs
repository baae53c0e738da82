use anyhow::Context;
use std::path::Path;

use crate::config::ConnectorConfig;

/// Effective configuration: file (when given), then `CONNECTOR_*` environment overrides
pub fn load(path: Option<&Path>, debug: bool) -> anyhow::Result<ConnectorConfig> {
    let base = match path {
        Some(path) => ConnectorConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConnectorConfig::default(),
    };

    let mut config = base.with_env_overrides();
    config.debug |= debug;
    Ok(config)
}
