use thiserror::Error;

/// Failures reported by an [`AccountStore`](super::AccountStore) implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("Remote server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unable to decode response: {0}")]
    Decode(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => StoreError::NotFound(message),
            500..=599 => StoreError::Server { status, message },
            _ => StoreError::Client { status, message },
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            StoreError::NotFound(_) => Some(404),
            StoreError::Client { status, .. } | StoreError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            StoreError::from_status(status.as_u16(), err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        assert!(matches!(StoreError::from_status(404, "gone"), StoreError::NotFound(_)));
        assert!(matches!(StoreError::from_status(409, "dup"), StoreError::Client { status: 409, .. }));
        assert!(matches!(StoreError::from_status(503, "down"), StoreError::Server { status: 503, .. }));
    }

    #[test]
    fn status_code_round_trips() {
        assert_eq!(StoreError::from_status(400, "bad").status_code(), Some(400));
        assert_eq!(StoreError::Transport("reset".into()).status_code(), None);
    }
}
