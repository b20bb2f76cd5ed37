use crate::collection::Record;
use crate::errors::QuickDocResult;
use crate::store::{BackendStats, ConnectionMonitor, ConnectionState, RecordFilter};
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

/// Contract every document store must fulfil to back a [Database](crate::Database).
///
/// A provider is one open connection. It stores [Record]s grouped by
/// collection name and treats them as opaque: expiration is decided by the
/// database layer, so `list_all`, `count_all` and `find_one` may return
/// records whose `expire_at` has passed.
///
/// # Implementations
/// - `InMemoryBackend`: process-local storage for tests and ephemeral use
/// - `FjallBackend`: persistent storage in the `quickdoc-fjall-adapter` crate
///
/// # Errors
/// Transport and storage failures surface as
/// [ErrorKind::BackendError](crate::errors::ErrorKind::BackendError). A failed
/// `upsert` must leave the previously stored record untouched.
#[async_trait]
pub trait DocumentBackendProvider: Send + Sync {
    /// Short backend name, e.g. `"in-memory"`.
    fn name(&self) -> &str;

    fn version(&self) -> String;

    /// The address this connection was opened with.
    fn url(&self) -> &str;

    /// State machine of this connection.
    fn connection(&self) -> ConnectionMonitor;

    /// Moves a connection opened by a [BackendConnector](crate::store::BackendConnector)
    /// from `Connecting` to `Connected`. Listeners subscribed before the call
    /// see that transition. No effect on a connection past `Connecting`.
    async fn handshake(&self) -> QuickDocResult<()> {
        let monitor = self.connection();
        if monitor.state() == ConnectionState::Connecting {
            monitor.mark_connected();
        }
        Ok(())
    }

    async fn find_one(&self, collection: &str, id: &str) -> QuickDocResult<Option<Record>>;

    /// Inserts or replaces the record stored under `id`.
    async fn upsert(&self, collection: &str, id: &str, record: Record) -> QuickDocResult<()>;

    /// Deletes the record stored under `id`; `false` if there was none.
    async fn delete_one(&self, collection: &str, id: &str) -> QuickDocResult<bool>;

    /// Deletes every record matching `filter` and returns how many were removed.
    async fn delete_many(&self, collection: &str, filter: RecordFilter) -> QuickDocResult<u64>;

    /// Returns every stored record of the collection in a stable order.
    async fn list_all(&self, collection: &str) -> QuickDocResult<Vec<Record>>;

    async fn count_all(&self, collection: &str) -> QuickDocResult<u64>;

    /// Measures one round trip to the store.
    async fn ping(&self) -> QuickDocResult<Duration>;

    async fn stats(&self, collection: &str) -> QuickDocResult<BackendStats>;

    /// Closes the connection; the monitor ends in `Disconnected`.
    async fn close(&self) -> QuickDocResult<()>;
}

/// Cloneable handle to an open backend connection.
///
/// Cloning shares the connection. Databases over the same `DocumentBackend`
/// share its [ConnectionMonitor] as well.
///
/// ```text
/// let backend = DocumentBackend::new(InMemoryBackend::new("memory://local"));
/// backend.upsert("JSON", "user", record).await?;
/// let found = backend.find_one("JSON", "user").await?;
/// ```
#[derive(Clone)]
pub struct DocumentBackend {
    inner: Arc<dyn DocumentBackendProvider>,
}

impl DocumentBackend {
    pub fn new<T: DocumentBackendProvider + 'static>(inner: T) -> Self {
        DocumentBackend {
            inner: Arc::new(inner),
        }
    }

    /// Whether both handles refer to the same connection.
    pub fn same_connection(&self, other: &DocumentBackend) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Deref for DocumentBackend {
    type Target = Arc<dyn DocumentBackendProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for DocumentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBackend")
            .field("name", &self.inner.name())
            .field("url", &self.inner.url())
            .field("state", &self.inner.connection().state())
            .finish()
    }
}
