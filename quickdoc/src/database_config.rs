//! Configuration of a [Database](crate::Database).

use crate::common::{
    atomic, system_clock, Atomic, Clock, ReadExecutor, WriteExecutor, DEFAULT_CHILD_COLLECTION,
    DEFAULT_COLLECTION,
};
use crate::errors::{ErrorKind, QuickDocError, QuickDocResult};
use crate::expiration::CleanupStrategy;
use crate::store::memory::InMemoryConnector;
use crate::store::{ConnectionEventListener, Connector, DocumentBackend};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Settings a [Database](crate::Database) is opened with.
///
/// Cloning shares the settings. Every setter fails with
/// [ErrorKind::InvalidOperation] once the configuration is frozen, which
/// happens when a database is opened from it.
///
/// | setting | default |
/// |---------|---------|
/// | `connector` | [InMemoryConnector] |
/// | `url` | the connector's default url |
/// | `collection_name` | `"JSON"` |
/// | `child_collection_name` | `"JSON_CHILD"` |
/// | `share_connection_from_parent` | `true` |
/// | `cleanup_strategy` | [CleanupStrategy::OnRead] |
/// | `clock` | [SystemClock](crate::common::SystemClock) |
#[derive(Clone)]
pub struct DatabaseConfig {
    inner: Arc<DatabaseConfigInner>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseConfig {
    pub fn new() -> Self {
        DatabaseConfig {
            inner: Arc::new(DatabaseConfigInner::new()),
        }
    }

    pub fn connector(&self) -> Connector {
        self.inner.settings.read_with(|s| s.connector.clone())
    }

    pub fn set_connector(&self, connector: Connector) -> QuickDocResult<()> {
        self.inner.update(|s| s.connector = connector)
    }

    /// A connection opened outside of the database, adopted as-is at open.
    pub fn backend(&self) -> Option<DocumentBackend> {
        self.inner.settings.read_with(|s| s.backend.clone())
    }

    pub fn set_backend(&self, backend: DocumentBackend) -> QuickDocResult<()> {
        self.inner.update(|s| s.backend = Some(backend))
    }

    pub fn url(&self) -> Option<String> {
        self.inner.settings.read_with(|s| s.url.clone())
    }

    pub fn set_url(&self, url: &str) -> QuickDocResult<()> {
        if url.trim().is_empty() {
            log::error!("Connection url cannot be empty");
            return Err(QuickDocError::new(
                "Connection url cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        let url = url.to_string();
        self.inner.update(|s| s.url = Some(url))
    }

    pub fn collection_name(&self) -> String {
        self.inner.settings.read_with(|s| s.collection_name.clone())
    }

    pub fn set_collection_name(&self, name: &str) -> QuickDocResult<()> {
        validate_collection_name(name)?;
        let name = name.to_string();
        self.inner.update(|s| s.collection_name = name)
    }

    /// Collection used by children sharing this database's connection when
    /// no collection name is given.
    pub fn child_collection_name(&self) -> String {
        self.inner
            .settings
            .read_with(|s| s.child_collection_name.clone())
    }

    pub fn set_child_collection_name(&self, name: &str) -> QuickDocResult<()> {
        validate_collection_name(name)?;
        let name = name.to_string();
        self.inner.update(|s| s.child_collection_name = name)
    }

    pub fn share_connection_from_parent(&self) -> bool {
        self.inner
            .settings
            .read_with(|s| s.share_connection_from_parent)
    }

    pub fn set_share_connection_from_parent(&self, share: bool) -> QuickDocResult<()> {
        self.inner.update(|s| s.share_connection_from_parent = share)
    }

    pub fn cleanup_strategy(&self) -> CleanupStrategy {
        self.inner.settings.read_with(|s| s.cleanup_strategy)
    }

    pub fn set_cleanup_strategy(&self, strategy: CleanupStrategy) -> QuickDocResult<()> {
        self.inner.update(|s| s.cleanup_strategy = strategy)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.inner.settings.read_with(|s| s.clock.clone())
    }

    pub fn set_clock(&self, clock: Arc<dyn Clock>) -> QuickDocResult<()> {
        self.inner.update(|s| s.clock = clock)
    }

    pub fn connection_listeners(&self) -> Vec<ConnectionEventListener> {
        self.inner
            .settings
            .read_with(|s| s.connection_listeners.clone())
    }

    pub fn add_connection_listener(&self, listener: ConnectionEventListener) -> QuickDocResult<()> {
        self.inner
            .update(|s| s.connection_listeners.push(listener))
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::Acquire)
    }

    pub(crate) fn freeze(&self) {
        self.inner.frozen.store(true, Ordering::Release);
    }

    /// Configuration for a child database: same connector, clock and cleanup
    /// strategy, bound to `collection_name`, with its own url if given.
    ///
    /// Listeners and adopted backends are not inherited.
    pub(crate) fn derive_child(&self, collection_name: &str, url: Option<&str>) -> DatabaseConfig {
        let child = self.inner.settings.read_with(|s| Settings {
            connector: s.connector.clone(),
            backend: None,
            url: url.map(str::to_string).or_else(|| s.url.clone()),
            collection_name: collection_name.to_string(),
            child_collection_name: s.child_collection_name.clone(),
            share_connection_from_parent: s.share_connection_from_parent,
            cleanup_strategy: s.cleanup_strategy,
            clock: s.clock.clone(),
            connection_listeners: Vec::new(),
        });
        DatabaseConfig {
            inner: Arc::new(DatabaseConfigInner {
                frozen: AtomicBool::new(false),
                settings: atomic(child),
            }),
        }
    }
}

impl Debug for DatabaseConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.inner.settings.read_with(|s| {
            f.debug_struct("DatabaseConfig")
                .field("connector", &s.connector.name())
                .field("url", &s.url)
                .field("collection_name", &s.collection_name)
                .field("child_collection_name", &s.child_collection_name)
                .field("share_connection_from_parent", &s.share_connection_from_parent)
                .field("cleanup_strategy", &s.cleanup_strategy)
                .field("clock", &s.clock)
                .field("connection_listeners", &s.connection_listeners.len())
                .finish()
        })
    }
}

fn validate_collection_name(name: &str) -> QuickDocResult<()> {
    if name.trim().is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(QuickDocError::new(
            "Collection name cannot be empty",
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}

struct Settings {
    connector: Connector,
    backend: Option<DocumentBackend>,
    url: Option<String>,
    collection_name: String,
    child_collection_name: String,
    share_connection_from_parent: bool,
    cleanup_strategy: CleanupStrategy,
    clock: Arc<dyn Clock>,
    connection_listeners: Vec<ConnectionEventListener>,
}

struct DatabaseConfigInner {
    frozen: AtomicBool,
    settings: Atomic<Settings>,
}

impl DatabaseConfigInner {
    fn new() -> Self {
        DatabaseConfigInner {
            frozen: AtomicBool::new(false),
            settings: atomic(Settings {
                connector: Connector::new(InMemoryConnector::new()),
                backend: None,
                url: None,
                collection_name: DEFAULT_COLLECTION.to_string(),
                child_collection_name: DEFAULT_CHILD_COLLECTION.to_string(),
                share_connection_from_parent: true,
                cleanup_strategy: CleanupStrategy::default(),
                clock: system_clock(),
                connection_listeners: Vec::new(),
            }),
        }
    }

    fn update(&self, f: impl FnOnce(&mut Settings)) -> QuickDocResult<()> {
        if self.frozen.load(Ordering::Acquire) {
            log::error!("Configuration cannot be changed after the database is opened");
            return Err(QuickDocError::new(
                "Configuration cannot be changed after the database is opened",
                ErrorKind::InvalidOperation,
            ));
        }
        self.settings.write_with(f);
        Ok(())
    }
}
