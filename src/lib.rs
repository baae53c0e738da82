pub mod cli;
pub mod config;
pub mod connection;
pub mod connector;
pub mod error;
pub mod filter;
pub mod locator;
pub mod record;
pub mod store;
pub mod translate;

pub use config::{ConfigError, ConnectorConfig};
pub use connection::{ConnectionHandle, ConnectionManager};
pub use connector::AccountConnector;
pub use error::ConnectorError;
pub use filter::FilterData;
pub use record::Record;
