use crate::common::Clock;
use crate::database::Database;
use crate::database_config::DatabaseConfig;
use crate::errors::{QuickDocError, QuickDocResult};
use crate::expiration::CleanupStrategy;
use crate::store::{BackendConnector, ConnectionEventListener, Connector, DocumentBackend};
use std::sync::Arc;

/// Builder for [Database].
///
/// The first invalid setting is remembered and reported by [open](DatabaseBuilder::open);
/// later settings are ignored once an error has been captured.
///
/// ```rust,ignore
/// let db = Database::builder()
///     .url("memory://sessions")
///     .collection_name("sessions")
///     .cleanup_strategy(CleanupStrategy::Manual)
///     .open()
///     .await?;
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    error: Option<QuickDocError>,
    config: DatabaseConfig,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        DatabaseBuilder {
            error: None,
            config: DatabaseConfig::new(),
        }
    }

    fn apply(mut self, f: impl FnOnce(&DatabaseConfig) -> QuickDocResult<()>) -> Self {
        if self.error.is_none() {
            if let Err(e) = f(&self.config) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn url(self, url: &str) -> Self {
        self.apply(|config| config.set_url(url))
    }

    pub fn collection_name(self, name: &str) -> Self {
        self.apply(|config| config.set_collection_name(name))
    }

    pub fn child_collection_name(self, name: &str) -> Self {
        self.apply(|config| config.set_child_collection_name(name))
    }

    pub fn share_connection_from_parent(self, share: bool) -> Self {
        self.apply(|config| config.set_share_connection_from_parent(share))
    }

    pub fn cleanup_strategy(self, strategy: CleanupStrategy) -> Self {
        self.apply(|config| config.set_cleanup_strategy(strategy))
    }

    pub fn clock<C: Clock + 'static>(self, clock: C) -> Self {
        self.apply(|config| config.set_clock(Arc::new(clock)))
    }

    pub fn connector<C: BackendConnector + 'static>(self, connector: C) -> Self {
        self.apply(|config| config.set_connector(Connector::new(connector)))
    }

    /// Uses an already opened connection instead of connecting at open.
    ///
    /// The database takes ownership: closing it closes `backend`.
    pub fn backend(self, backend: DocumentBackend) -> Self {
        self.apply(|config| config.set_backend(backend))
    }

    pub fn add_connection_listener(self, listener: ConnectionEventListener) -> Self {
        self.apply(|config| config.add_connection_listener(listener))
    }

    /// Connects and returns the database, or the first error captured while
    /// building.
    pub async fn open(self) -> QuickDocResult<Database> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Database::open(self.config).await
    }
}
