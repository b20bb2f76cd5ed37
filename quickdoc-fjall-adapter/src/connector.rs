use crate::backend::{to_backend_error, FjallBackend, FJALL_BACKEND_NAME};
use crate::config::FjallConfig;
use async_trait::async_trait;
use dashmap::DashMap;
use fjall::Keyspace;
use quickdoc::errors::{ErrorKind, QuickDocError, QuickDocResult};
use quickdoc::store::{BackendConnector, DocumentBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Url prefix accepted by [FjallConnector]; a bare path works as well.
pub const FJALL_URL_SCHEME: &str = "fjall://";

const DEFAULT_PATH: &str = "quickdoc-data";

/// Opens [FjallBackend] connections.
///
/// A url is a directory, optionally prefixed with `fjall://`. The keyspace
/// of a directory is opened once and shared by every connection this
/// connector (and its clones) opens to it.
///
/// ```rust,ignore
/// let db = Database::builder()
///     .connector(FjallConnector::new())
///     .url("fjall:///var/lib/app/kv")
///     .open()
///     .await?;
/// ```
#[derive(Clone, Default)]
pub struct FjallConnector {
    config: FjallConfig,
    keyspaces: Arc<DashMap<PathBuf, Keyspace>>,
}

impl FjallConnector {
    pub fn new() -> FjallConnector {
        FjallConnector::default()
    }

    pub fn with_config(config: FjallConfig) -> FjallConnector {
        FjallConnector {
            config,
            keyspaces: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &FjallConfig {
        &self.config
    }

    /// Opens a connection and returns the concrete backend, still
    /// `Connecting` until its `handshake` runs. Opening a new keyspace blocks
    /// on disk I/O.
    pub fn open(&self, url: &str) -> QuickDocResult<FjallBackend> {
        let path = parse_url(url)?;
        let keyspace = match self.keyspaces.get(&path) {
            Some(keyspace) => keyspace.clone(),
            None => {
                let keyspace = Keyspace::open(self.config.keyspace_config(&path))
                    .map_err(to_backend_error)?;
                log::debug!("Opened fjall keyspace at {}", path.display());
                self.keyspaces
                    .entry(path.clone())
                    .or_insert(keyspace)
                    .clone()
            }
        };
        Ok(FjallBackend::new(url, keyspace, self.config.clone()))
    }
}

#[async_trait]
impl BackendConnector for FjallConnector {
    fn name(&self) -> &str {
        FJALL_BACKEND_NAME
    }

    fn default_url(&self) -> String {
        format!("{}{}", FJALL_URL_SCHEME, DEFAULT_PATH)
    }

    async fn connect(&self, url: &str) -> QuickDocResult<DocumentBackend> {
        let connector = self.clone();
        let target = url.to_string();
        let backend = tokio::task::spawn_blocking(move || connector.open(&target))
            .await
            .map_err(|e| {
                let message = format!("Opening fjall connection '{}' failed: {}", url, e);
                log::error!("{}", message);
                QuickDocError::new(&message, ErrorKind::BackendError)
            })??;
        Ok(DocumentBackend::new(backend))
    }
}

fn parse_url(url: &str) -> QuickDocResult<PathBuf> {
    let path = url.strip_prefix(FJALL_URL_SCHEME).unwrap_or(url);
    if path.trim().is_empty() || path.contains("://") {
        let message = format!(
            "Unsupported url '{}', expected a directory or {}<directory>",
            url, FJALL_URL_SCHEME
        );
        log::error!("{}", message);
        return Err(QuickDocError::new(&message, ErrorKind::BackendError));
    }
    Ok(Path::new(path).to_path_buf())
}
