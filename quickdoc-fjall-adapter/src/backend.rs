use crate::codec::{decode_record, encode_record};
use crate::config::FjallConfig;
use crate::version::fjall_version;
use async_trait::async_trait;
use dashmap::DashMap;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use quickdoc::errors::{ErrorKind, QuickDocError, QuickDocResult};
use quickdoc::store::{BackendStats, ConnectionMonitor, DocumentBackendProvider, RecordFilter};
use quickdoc::Record;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub(crate) const FJALL_BACKEND_NAME: &str = "fjall";

/// A [DocumentBackendProvider] persisting records in a fjall keyspace.
///
/// Each collection lives in its own partition; records are keyed by id and
/// stored bincode-encoded. fjall calls block, so every one of them runs on
/// tokio's blocking pool through [FjallBackend::exec_blocking].
///
/// Connections to the same path opened by one
/// [FjallConnector](crate::FjallConnector) share the keyspace but each has its
/// own connection state. Closing a connection persists the keyspace (unless
/// disabled in [FjallConfig]) without closing it for the other connections.
#[derive(Clone)]
pub struct FjallBackend {
    inner: Arc<FjallBackendInner>,
}

impl FjallBackend {
    /// Creates a backend in `Connecting`; `handshake` completes it.
    pub(crate) fn new(url: &str, keyspace: Keyspace, config: FjallConfig) -> FjallBackend {
        FjallBackend {
            inner: Arc::new(FjallBackendInner {
                url: url.to_string(),
                keyspace,
                config,
                partitions: DashMap::new(),
                closed: AtomicBool::new(false),
                monitor: ConnectionMonitor::new(url),
            }),
        }
    }

    /// Syncs every pending write of the keyspace to disk.
    pub async fn commit(&self) -> QuickDocResult<()> {
        self.exec_blocking(|inner| {
            inner.ensure_usable()?;
            inner.persist()
        })
        .await
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Executes a blocking fjall operation using [tokio::task::spawn_blocking].
    async fn exec_blocking<F, T>(&self, f: F) -> QuickDocResult<T>
    where
        F: FnOnce(&FjallBackendInner) -> QuickDocResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| {
                let message = format!("Fjall task on '{}' failed: {}", self.inner.url, e);
                log::error!("{}", message);
                QuickDocError::new(&message, ErrorKind::BackendError)
            })?
    }
}

#[async_trait]
impl DocumentBackendProvider for FjallBackend {
    fn name(&self) -> &str {
        FJALL_BACKEND_NAME
    }

    fn version(&self) -> String {
        let version = fjall_version().unwrap_or_else(|e| {
            log::warn!("Could not determine fjall version: {}", e);
            "unknown".to_string()
        });
        format!("Fjall/{}", version)
    }

    fn url(&self) -> &str {
        &self.inner.url
    }

    fn connection(&self) -> ConnectionMonitor {
        self.inner.monitor.clone()
    }

    async fn find_one(&self, collection: &str, id: &str) -> QuickDocResult<Option<Record>> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.exec_blocking(move |inner| inner.find_one(&collection, &id))
            .await
    }

    async fn upsert(&self, collection: &str, id: &str, record: Record) -> QuickDocResult<()> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.exec_blocking(move |inner| inner.upsert(&collection, &id, &record))
            .await
    }

    async fn delete_one(&self, collection: &str, id: &str) -> QuickDocResult<bool> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.exec_blocking(move |inner| inner.delete_one(&collection, &id))
            .await
    }

    async fn delete_many(&self, collection: &str, filter: RecordFilter) -> QuickDocResult<u64> {
        let collection = collection.to_string();
        self.exec_blocking(move |inner| inner.delete_many(&collection, &filter))
            .await
    }

    async fn list_all(&self, collection: &str) -> QuickDocResult<Vec<Record>> {
        let collection = collection.to_string();
        self.exec_blocking(move |inner| inner.list_all(&collection))
            .await
    }

    async fn count_all(&self, collection: &str) -> QuickDocResult<u64> {
        let collection = collection.to_string();
        self.exec_blocking(move |inner| inner.count_all(&collection))
            .await
    }

    async fn ping(&self) -> QuickDocResult<Duration> {
        let start = Instant::now();
        self.exec_blocking(|inner| {
            inner.ensure_usable()?;
            let _ = inner.keyspace.partition_count();
            Ok(())
        })
        .await?;
        Ok(start.elapsed())
    }

    async fn stats(&self, collection: &str) -> QuickDocResult<BackendStats> {
        let collection = collection.to_string();
        self.exec_blocking(move |inner| {
            inner.ensure_usable()?;
            let partition = inner.partition(&collection)?;
            let record_count = partition.len().map_err(to_backend_error)? as u64;
            Ok(BackendStats {
                backend: FJALL_BACKEND_NAME.to_string(),
                collection,
                record_count,
                size_bytes: Some(partition.disk_space()),
            })
        })
        .await
    }

    async fn close(&self) -> QuickDocResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let persisted = if self.inner.config.commit_before_close() {
            self.exec_blocking(|inner| inner.persist()).await
        } else {
            Ok(())
        };
        self.inner.partitions.clear();
        self.inner.monitor.close()?;
        log::debug!("Closed fjall connection '{}'", self.inner.url);
        persisted
    }
}

struct FjallBackendInner {
    url: String,
    keyspace: Keyspace,
    config: FjallConfig,
    partitions: DashMap<String, PartitionHandle>,
    closed: AtomicBool,
    monitor: ConnectionMonitor,
}

impl FjallBackendInner {
    fn ensure_usable(&self) -> QuickDocResult<()> {
        if self.closed.load(Ordering::Acquire) {
            let message = format!("Fjall connection '{}' is closed", self.url);
            log::error!("{}", message);
            return Err(QuickDocError::new(&message, ErrorKind::BackendError));
        }
        if !self.monitor.is_connected() {
            let message = format!(
                "Fjall connection '{}' is {}",
                self.url,
                self.monitor.state()
            );
            log::error!("{}", message);
            return Err(QuickDocError::new(&message, ErrorKind::BackendError));
        }
        Ok(())
    }

    fn find_one(&self, collection: &str, id: &str) -> QuickDocResult<Option<Record>> {
        self.ensure_usable()?;
        let partition = self.partition(collection)?;
        match partition.get(id).map_err(to_backend_error)? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    fn upsert(&self, collection: &str, id: &str, record: &Record) -> QuickDocResult<()> {
        self.ensure_usable()?;
        let bytes = encode_record(record)?;
        let partition = self.partition(collection)?;
        partition.insert(id, bytes).map_err(to_backend_error)?;
        self.sync_if_configured()
    }

    fn delete_one(&self, collection: &str, id: &str) -> QuickDocResult<bool> {
        self.ensure_usable()?;
        let partition = self.partition(collection)?;
        if !partition.contains_key(id).map_err(to_backend_error)? {
            return Ok(false);
        }
        partition.remove(id).map_err(to_backend_error)?;
        self.sync_if_configured()?;
        Ok(true)
    }

    fn delete_many(&self, collection: &str, filter: &RecordFilter) -> QuickDocResult<u64> {
        self.ensure_usable()?;
        let partition = self.partition(collection)?;

        let mut doomed = Vec::new();
        for entry in partition.iter() {
            let (key, value) = entry.map_err(to_backend_error)?;
            if *filter == RecordFilter::All || filter.matches(&decode_record(&value)?) {
                doomed.push(key);
            }
        }

        let removed = doomed.len() as u64;
        for key in doomed {
            partition.remove(key).map_err(to_backend_error)?;
        }
        if removed > 0 {
            self.sync_if_configured()?;
        }
        Ok(removed)
    }

    fn list_all(&self, collection: &str) -> QuickDocResult<Vec<Record>> {
        self.ensure_usable()?;
        let partition = self.partition(collection)?;

        let mut records = Vec::new();
        for entry in partition.iter() {
            let (_, value) = entry.map_err(to_backend_error)?;
            records.push(decode_record(&value)?);
        }
        Ok(records)
    }

    fn count_all(&self, collection: &str) -> QuickDocResult<u64> {
        self.ensure_usable()?;
        let partition = self.partition(collection)?;
        let count = partition.len().map_err(to_backend_error)?;
        Ok(count as u64)
    }

    fn partition(&self, collection: &str) -> QuickDocResult<PartitionHandle> {
        if let Some(partition) = self.partitions.get(collection) {
            return Ok(partition.clone());
        }

        let name = partition_name(collection)?;
        let partition = self
            .keyspace
            .open_partition(&name, self.config.partition_config())
            .map_err(to_backend_error)?;
        self.partitions
            .insert(collection.to_string(), partition.clone());
        Ok(partition)
    }

    fn persist(&self) -> QuickDocResult<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(to_backend_error)
    }

    fn sync_if_configured(&self) -> QuickDocResult<()> {
        if self.config.sync_on_write() {
            self.persist()?;
        }
        Ok(())
    }
}

/// Maps a collection name onto the characters fjall accepts in partition
/// names. Allowed characters pass through; anything else, and `#` itself,
/// becomes `#` followed by the hex of each of its bytes.
pub(crate) fn partition_name(collection: &str) -> QuickDocResult<String> {
    let mut name = String::with_capacity(collection.len());
    for c in collection.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '$' {
            name.push(c);
        } else {
            let mut buffer = [0u8; 4];
            for byte in c.encode_utf8(&mut buffer).bytes() {
                name.push_str(&format!("#{:02x}", byte));
            }
        }
    }

    if name.is_empty() || name.len() > u8::MAX as usize {
        let message = format!("Collection name '{}' cannot be stored in fjall", collection);
        log::error!("{}", message);
        return Err(QuickDocError::new(&message, ErrorKind::BackendError));
    }
    Ok(name)
}

pub(crate) fn to_backend_error(error: impl Error) -> QuickDocError {
    log::error!("Fjall error: {}", error);
    QuickDocError::new(&error.to_string(), ErrorKind::BackendError)
}
