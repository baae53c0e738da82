pub mod account;
pub mod auth;
pub mod config;

use crate::config::ConnectorConfig;
use crate::connector::AccountConnector;

pub(crate) fn connector(config: ConnectorConfig) -> anyhow::Result<AccountConnector> {
    Ok(AccountConnector::initialize(config)?)
}
