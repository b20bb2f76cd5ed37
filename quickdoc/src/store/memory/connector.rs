use crate::common::{MEMORY_BACKEND_NAME, MEMORY_DEFAULT_URL, MEMORY_URL_SCHEME};
use crate::errors::{ErrorKind, QuickDocError, QuickDocResult};
use crate::store::memory::{InMemoryBackend, InMemoryConfig, MemoryCollections};
use crate::store::{BackendConnector, DocumentBackend};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Opens [InMemoryBackend] connections for `memory://` urls.
///
/// The connector plays the part of the server: every url names one set of
/// collections, and each `connect` opens a fresh connection (with its own
/// connection state) onto that set. Clones of a connector share the urls.
#[derive(Clone, Default)]
pub struct InMemoryConnector {
    config: InMemoryConfig,
    servers: Arc<DashMap<String, MemoryCollections>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        InMemoryConnector::default()
    }

    pub fn with_config(config: InMemoryConfig) -> Self {
        InMemoryConnector {
            config,
            servers: Arc::new(DashMap::new()),
        }
    }

    /// Opens a connection and returns the concrete backend, so tests can drive
    /// its connection hooks. The backend stays `Connecting` until its
    /// `handshake` runs.
    pub fn open(&self, url: &str) -> QuickDocResult<InMemoryBackend> {
        if !url.starts_with(MEMORY_URL_SCHEME) || url.len() == MEMORY_URL_SCHEME.len() {
            let message = format!(
                "Unsupported url '{}', expected {}<name>",
                url, MEMORY_URL_SCHEME
            );
            log::error!("{}", message);
            return Err(QuickDocError::new(&message, ErrorKind::BackendError));
        }

        let collections = self
            .servers
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(DashMap::new()))
            .clone();
        log::debug!("Opening in-memory connection '{}'", url);
        Ok(InMemoryBackend::open(url, self.config.clone(), collections))
    }
}

#[async_trait]
impl BackendConnector for InMemoryConnector {
    fn name(&self) -> &str {
        MEMORY_BACKEND_NAME
    }

    fn default_url(&self) -> String {
        MEMORY_DEFAULT_URL.to_string()
    }

    async fn connect(&self, url: &str) -> QuickDocResult<DocumentBackend> {
        let backend = self.open(url)?;
        Ok(DocumentBackend::new(backend))
    }
}
