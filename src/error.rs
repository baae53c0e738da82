// Connector Error Types
use thiserror::Error;

use crate::config::ConfigError;
use crate::filter::FilterError;
use crate::record::RecordError;
use crate::store::StoreError;

/// Errors surfaced by every connector verb
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// First connect failed: bad credentials or unresolvable application
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller input the connector cannot act on
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Remote server error ({status}): {message}")]
    RemoteServer { status: u16, message: String },

    #[error("Remote request rejected ({status}): {message}")]
    RemoteClient { status: u16, message: String },

    #[error("Malformed locator: {0}")]
    MalformedLocator(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ConnectorError {
    pub fn validation(message: impl Into<String>) -> Self {
        ConnectorError::Validation(message.into())
    }

    /// 5xx from the remote store, or no answer at all
    pub fn is_server_error(&self) -> bool {
        matches!(self, ConnectorError::RemoteServer { .. } | ConnectorError::Transport(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConnectorError::NotFound(_))
    }

    /// HTTP status behind the error, when one is known
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ConnectorError::NotFound(_) => Some(404),
            ConnectorError::Validation(_) => Some(400),
            ConnectorError::RemoteServer { status, .. } | ConnectorError::RemoteClient { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Stable code for machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::Connection(_) => "CONNECTION_ERROR",
            ConnectorError::NotFound(_) => "NOT_FOUND",
            ConnectorError::Validation(_) => "VALIDATION_ERROR",
            ConnectorError::RemoteServer { .. } => "REMOTE_SERVER_ERROR",
            ConnectorError::RemoteClient { .. } => "REMOTE_CLIENT_ERROR",
            ConnectorError::MalformedLocator(_) => "MALFORMED_LOCATOR",
            ConnectorError::Transport(_) => "TRANSPORT_ERROR",
            ConnectorError::Filter(_) => "INVALID_FILTER",
            ConnectorError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<StoreError> for ConnectorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ConnectorError::NotFound(msg),
            StoreError::Client { status, message } => ConnectorError::RemoteClient { status, message },
            StoreError::Server { status, message } => ConnectorError::RemoteServer { status, message },
            StoreError::Transport(msg) => ConnectorError::Transport(msg),
            StoreError::Decode(msg) => {
                tracing::warn!("Undecodable response from remote store: {}", msg);
                ConnectorError::Transport(msg)
            }
            StoreError::InvalidConfig(msg) => ConnectorError::Connection(msg),
        }
    }
}

impl From<RecordError> for ConnectorError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::InvalidJson(msg) => ConnectorError::Validation(msg),
        }
    }
}
