use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::ConnectorConfig;
use crate::error::ConnectorError;
use crate::store::{AccountStore, Application, HttpAccountStore};

/// Store client paired with the application scope it operates in
pub struct ConnectionHandle {
    store: Arc<dyn AccountStore>,
    application: Application,
}

impl ConnectionHandle {
    pub fn store(&self) -> &dyn AccountStore {
        self.store.as_ref()
    }

    pub fn application(&self) -> &Application {
        &self.application
    }
}

/// Lazily resolves the application scope, at most once per manager.
///
/// Concurrent first callers share a single initialization. A failed attempt leaves
/// nothing cached, so the next `connect` tries again exactly once.
pub struct ConnectionManager {
    config: Arc<ConnectorConfig>,
    injected: Option<Arc<dyn AccountStore>>,
    handle: OnceCell<Arc<ConnectionHandle>>,
}

impl ConnectionManager {
    /// Manager that builds an HTTP store from the configured credentials on first connect
    pub fn new(config: Arc<ConnectorConfig>) -> Self {
        Self { config, injected: None, handle: OnceCell::new() }
    }

    /// Manager over an already-built store
    pub fn with_store(config: Arc<ConnectorConfig>, store: Arc<dyn AccountStore>) -> Self {
        Self { config, injected: Some(store), handle: OnceCell::new() }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }

    pub async fn connect(&self) -> Result<Arc<ConnectionHandle>, ConnectorError> {
        self.handle.get_or_try_init(|| self.establish()).await.cloned()
    }

    async fn establish(&self) -> Result<Arc<ConnectionHandle>, ConnectorError> {
        let store: Arc<dyn AccountStore> = match &self.injected {
            Some(store) => store.clone(),
            None => {
                let store = HttpAccountStore::new(&self.config)
                    .map_err(|e| ConnectorError::Connection(e.to_string()))?;
                Arc::new(store)
            }
        };

        let href = self.config.application_href.as_str();
        if href.trim().is_empty() {
            return Err(ConnectorError::Connection("applicationHref is not configured".to_string()));
        }

        let application = store.get_application(href).await.map_err(|e| {
            warn!("Unable to resolve application {}: {}", href, e);
            ConnectorError::Connection(format!("unable to resolve application {}: {}", href, e))
        })?;

        info!("Connected to application '{}' ({})", application.name, application.href);
        Ok(Arc::new(ConnectionHandle { store, application }))
    }
}
