use crate::collection::Record;
use crate::common::MEMORY_BACKEND_NAME;
use crate::errors::{ErrorKind, QuickDocError, QuickDocResult};
use crate::store::memory::InMemoryConfig;
use crate::store::{
    BackendStats, ConnectionMonitor, ConnectionState, DocumentBackendProvider, RecordFilter,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Records of every collection living at one in-memory url.
pub(crate) type MemoryCollections = Arc<DashMap<String, DashMap<String, Record>>>;

/// A process-local [DocumentBackendProvider].
///
/// Stands in for a remote document store: every call may wait for a simulated
/// round trip, and the connection can be knocked over and brought back with
/// [disconnect](Self::disconnect), [fail](Self::fail) and
/// [reconnect](Self::reconnect).
///
/// Connections opened by the same
/// [InMemoryConnector](crate::store::memory::InMemoryConnector) for the same
/// url see the same records.
///
/// ```text
/// let backend = InMemoryBackend::new("memory://local");
/// let db = Database::builder().backend(DocumentBackend::new(backend.clone())).open().await?;
/// backend.fail("network unreachable");
/// assert!(db.get("k").await.is_err());
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    inner: Arc<InMemoryBackendInner>,
}

impl InMemoryBackend {
    /// Creates a connected backend with its own private storage.
    pub fn new(url: &str) -> Self {
        InMemoryBackend::with_config(url, InMemoryConfig::default())
    }

    pub fn with_config(url: &str, config: InMemoryConfig) -> Self {
        let backend = InMemoryBackend::open(url, config, Arc::new(DashMap::new()));
        backend.inner.monitor.mark_connected();
        backend
    }

    /// Opens a backend still in `Connecting`; `handshake` completes it.
    pub(crate) fn open(url: &str, config: InMemoryConfig, collections: MemoryCollections) -> Self {
        let monitor = ConnectionMonitor::new(url);
        InMemoryBackend {
            inner: Arc::new(InMemoryBackendInner {
                url: url.to_string(),
                config,
                closed: AtomicBool::new(false),
                failing_writes: AtomicBool::new(false),
                monitor,
                collections,
            }),
        }
    }

    /// Simulates the peer dropping the connection.
    pub fn disconnect(&self) {
        self.inner.monitor.mark_disconnected();
    }

    /// Simulates a transport fault.
    pub fn fail(&self, reason: &str) {
        self.inner.monitor.mark_error(reason);
    }

    /// Re-establishes a dropped or faulted connection. No effect once closed.
    pub fn reconnect(&self) {
        if !self.inner.closed.load(Ordering::Acquire) {
            self.inner.monitor.mark_connected();
        }
    }

    /// Makes every following write fail with a backend error, without
    /// touching the stored records, until switched off again.
    pub fn fail_writes(&self, failing: bool) {
        self.inner.failing_writes.store(failing, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl DocumentBackendProvider for InMemoryBackend {
    fn name(&self) -> &str {
        MEMORY_BACKEND_NAME
    }

    fn version(&self) -> String {
        format!("InMemory/{}", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self) -> &str {
        &self.inner.url
    }

    fn connection(&self) -> ConnectionMonitor {
        self.inner.monitor.clone()
    }

    async fn handshake(&self) -> QuickDocResult<()> {
        if let Some(latency) = self.inner.config.simulated_latency() {
            tokio::time::sleep(latency).await;
        }

        if self.inner.closed.load(Ordering::Acquire) {
            log::error!("In-memory connection '{}' closed during handshake", self.inner.url);
            return Err(QuickDocError::new(
                &format!("In-memory connection '{}' is closed", self.inner.url),
                ErrorKind::BackendError,
            ));
        }

        if self.inner.monitor.state() == ConnectionState::Connecting {
            self.inner.monitor.mark_connected();
        }
        Ok(())
    }

    async fn find_one(&self, collection: &str, id: &str) -> QuickDocResult<Option<Record>> {
        self.inner.round_trip().await?;
        Ok(self
            .inner
            .collections
            .get(collection)
            .and_then(|records| records.get(id).map(|record| record.value().clone())))
    }

    async fn upsert(&self, collection: &str, id: &str, record: Record) -> QuickDocResult<()> {
        self.inner.round_trip().await?;
        self.inner.check_writable()?;
        self.inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), record);
        Ok(())
    }

    async fn delete_one(&self, collection: &str, id: &str) -> QuickDocResult<bool> {
        self.inner.round_trip().await?;
        self.inner.check_writable()?;
        Ok(self
            .inner
            .collections
            .get(collection)
            .map(|records| records.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn delete_many(&self, collection: &str, filter: RecordFilter) -> QuickDocResult<u64> {
        self.inner.round_trip().await?;
        self.inner.check_writable()?;
        let Some(records) = self.inner.collections.get(collection) else {
            return Ok(0);
        };

        let before = records.len();
        records.retain(|_, record| !filter.matches(record));
        Ok((before - records.len()) as u64)
    }

    async fn list_all(&self, collection: &str) -> QuickDocResult<Vec<Record>> {
        self.inner.round_trip().await?;
        let mut records: Vec<Record> = self
            .inner
            .collections
            .get(collection)
            .map(|records| records.iter().map(|entry| entry.value().clone()).collect())
            .unwrap_or_default();
        // DashMap iteration order is arbitrary
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn count_all(&self, collection: &str) -> QuickDocResult<u64> {
        self.inner.round_trip().await?;
        Ok(self
            .inner
            .collections
            .get(collection)
            .map(|records| records.len() as u64)
            .unwrap_or(0))
    }

    async fn ping(&self) -> QuickDocResult<Duration> {
        let started = Instant::now();
        self.inner.round_trip().await?;
        Ok(started.elapsed())
    }

    async fn stats(&self, collection: &str) -> QuickDocResult<BackendStats> {
        let record_count = self.count_all(collection).await?;
        Ok(BackendStats {
            backend: MEMORY_BACKEND_NAME.to_string(),
            collection: collection.to_string(),
            record_count,
            size_bytes: None,
        })
    }

    async fn close(&self) -> QuickDocResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        log::debug!("Closing in-memory connection '{}'", self.inner.url);
        self.inner.monitor.close()
    }
}

struct InMemoryBackendInner {
    url: String,
    config: InMemoryConfig,
    closed: AtomicBool,
    failing_writes: AtomicBool,
    monitor: ConnectionMonitor,
    collections: MemoryCollections,
}

impl InMemoryBackendInner {
    async fn round_trip(&self) -> QuickDocResult<()> {
        if let Some(latency) = self.config.simulated_latency() {
            tokio::time::sleep(latency).await;
        }

        if self.closed.load(Ordering::Acquire) {
            log::error!("In-memory connection '{}' is closed", self.url);
            return Err(QuickDocError::new(
                &format!("In-memory connection '{}' is closed", self.url),
                ErrorKind::BackendError,
            ));
        }

        if !self.monitor.is_connected() {
            let message = format!(
                "In-memory connection '{}' is {}",
                self.url,
                self.monitor.state()
            );
            log::error!("{}", message);
            return Err(QuickDocError::new(&message, ErrorKind::BackendError));
        }
        Ok(())
    }

    fn check_writable(&self) -> QuickDocResult<()> {
        if self.failing_writes.load(Ordering::Acquire) {
            log::error!("Write rejected by in-memory connection '{}'", self.url);
            return Err(QuickDocError::new(
                &format!("Write rejected by in-memory connection '{}'", self.url),
                ErrorKind::BackendError,
            ));
        }
        Ok(())
    }
}
