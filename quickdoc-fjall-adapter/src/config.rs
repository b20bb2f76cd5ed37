use fjall::{CompressionType, Config, PartitionCreateOptions};
use quickdoc::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI8, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Tuning of the fjall keyspaces and partitions opened by a
/// [FjallConnector](crate::FjallConnector).
///
/// Cloning shares the settings. Settings are read when a keyspace or a
/// partition is opened, so changes only affect connections opened later.
///
/// Defaults:
/// - block cache: 64 MB
/// - write buffer: 128 MB, journal: 512 MB
/// - bloom filter: 10 bits per key
/// - compression: LZ4
/// - journal fsync left to fjall, no sync after each write
/// - keyspace persisted when a connection closes
#[derive(Clone)]
pub struct FjallConfig {
    inner: Arc<FjallConfigInner>,
}

impl Default for FjallConfig {
    fn default() -> Self {
        FjallConfig::new()
    }
}

impl FjallConfig {
    pub fn new() -> FjallConfig {
        FjallConfig {
            inner: Arc::new(FjallConfigInner::new()),
        }
    }

    pub(crate) fn keyspace_config(&self, path: &Path) -> Config {
        let mut config = Config::new(path)
            .manual_journal_persist(self.manual_journal_persist())
            .cache_size(self.block_cache_capacity())
            .max_journaling_size(self.max_journaling_size())
            .max_write_buffer_size(self.max_write_buffer_size());

        if self.fsync_frequency() > 0 {
            config = config.fsync_ms(Some(self.fsync_frequency()));
        }
        config
    }

    pub(crate) fn partition_config(&self) -> PartitionCreateOptions {
        let bloom_filter_bits = match self.bloom_filter_bits() {
            bits if bits < 0 => None,
            bits => Some(bits as u8),
        };

        PartitionCreateOptions::default()
            .bloom_filter_bits(bloom_filter_bits)
            .compression(self.compression_type())
            .max_memtable_size(self.max_memtable_size())
            .block_size(self.block_size())
    }

    pub fn manual_journal_persist(&self) -> bool {
        self.inner.manual_journal_persist.load(Ordering::Relaxed)
    }

    pub fn set_manual_journal_persist(&self, value: bool) {
        self.inner
            .manual_journal_persist
            .store(value, Ordering::Relaxed);
    }

    pub fn block_cache_capacity(&self) -> u64 {
        self.inner.block_cache_capacity.load(Ordering::Relaxed)
    }

    pub fn set_block_cache_capacity(&self, bytes: u64) {
        self.inner.block_cache_capacity.store(bytes, Ordering::Relaxed);
    }

    pub fn max_journaling_size(&self) -> u64 {
        self.inner.max_journaling_size.load(Ordering::Relaxed)
    }

    pub fn set_max_journaling_size(&self, bytes: u64) {
        self.inner.max_journaling_size.store(bytes, Ordering::Relaxed);
    }

    pub fn max_write_buffer_size(&self) -> u64 {
        self.inner.max_write_buffer_size.load(Ordering::Relaxed)
    }

    pub fn set_max_write_buffer_size(&self, bytes: u64) {
        self.inner.max_write_buffer_size.store(bytes, Ordering::Relaxed);
    }

    /// Journal fsync interval in milliseconds; 0 leaves it to fjall.
    pub fn fsync_frequency(&self) -> u16 {
        self.inner.fsync_frequency.load(Ordering::Relaxed)
    }

    pub fn set_fsync_frequency(&self, millis: u16) {
        self.inner.fsync_frequency.store(millis, Ordering::Relaxed);
    }

    /// Bloom filter bits per key; negative disables the filter.
    pub fn bloom_filter_bits(&self) -> i8 {
        self.inner.bloom_filter_bits.load(Ordering::Relaxed)
    }

    pub fn set_bloom_filter_bits(&self, bits: i8) {
        self.inner.bloom_filter_bits.store(bits, Ordering::Relaxed);
    }

    pub fn compression_type(&self) -> CompressionType {
        self.inner.compression_type.read_with(|c| *c)
    }

    pub fn set_compression_type(&self, compression: CompressionType) {
        self.inner.compression_type.write_with(|c| *c = compression);
    }

    pub fn max_memtable_size(&self) -> u32 {
        self.inner.max_memtable_size.load(Ordering::Relaxed)
    }

    pub fn set_max_memtable_size(&self, bytes: u32) {
        self.inner.max_memtable_size.store(bytes, Ordering::Relaxed);
    }

    pub fn block_size(&self) -> u32 {
        self.inner.block_size.load(Ordering::Relaxed)
    }

    pub fn set_block_size(&self, bytes: u32) {
        self.inner.block_size.store(bytes, Ordering::Relaxed);
    }

    /// Whether every write is synced to disk before it returns.
    pub fn sync_on_write(&self) -> bool {
        self.inner.sync_on_write.load(Ordering::Relaxed)
    }

    pub fn set_sync_on_write(&self, value: bool) {
        self.inner.sync_on_write.store(value, Ordering::Relaxed);
    }

    /// Whether closing a connection persists the keyspace.
    pub fn commit_before_close(&self) -> bool {
        self.inner.commit_before_close.load(Ordering::Relaxed)
    }

    pub fn set_commit_before_close(&self, value: bool) {
        self.inner.commit_before_close.store(value, Ordering::Relaxed);
    }
}

impl Debug for FjallConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FjallConfig")
            .field("manual_journal_persist", &self.manual_journal_persist())
            .field("block_cache_capacity", &self.block_cache_capacity())
            .field("max_journaling_size", &self.max_journaling_size())
            .field("max_write_buffer_size", &self.max_write_buffer_size())
            .field("fsync_frequency", &self.fsync_frequency())
            .field("bloom_filter_bits", &self.bloom_filter_bits())
            .field("max_memtable_size", &self.max_memtable_size())
            .field("block_size", &self.block_size())
            .field("sync_on_write", &self.sync_on_write())
            .field("commit_before_close", &self.commit_before_close())
            .finish()
    }
}

struct FjallConfigInner {
    manual_journal_persist: AtomicBool,
    block_cache_capacity: AtomicU64,
    max_journaling_size: AtomicU64,
    max_write_buffer_size: AtomicU64,
    fsync_frequency: AtomicU16,
    bloom_filter_bits: AtomicI8,
    compression_type: Atomic<CompressionType>,
    max_memtable_size: AtomicU32,
    block_size: AtomicU32,
    sync_on_write: AtomicBool,
    commit_before_close: AtomicBool,
}

impl FjallConfigInner {
    const DEFAULT_BLOCK_CACHE_MB: u64 = 64;
    const DEFAULT_WRITE_BUFFER_MB: u64 = 128;
    const DEFAULT_MAX_JOURNALING_MB: u64 = 512;
    const DEFAULT_MEMTABLE_MB: u32 = 16;

    fn new() -> FjallConfigInner {
        FjallConfigInner {
            manual_journal_persist: AtomicBool::new(false),
            block_cache_capacity: AtomicU64::new(Self::DEFAULT_BLOCK_CACHE_MB * 1_024 * 1_024),
            max_journaling_size: AtomicU64::new(Self::DEFAULT_MAX_JOURNALING_MB * 1_024 * 1_024),
            max_write_buffer_size: AtomicU64::new(Self::DEFAULT_WRITE_BUFFER_MB * 1_024 * 1_024),
            fsync_frequency: AtomicU16::new(0),
            bloom_filter_bits: AtomicI8::new(10),
            compression_type: atomic(CompressionType::Lz4),
            max_memtable_size: AtomicU32::new(Self::DEFAULT_MEMTABLE_MB * 1_024 * 1_024),
            block_size: AtomicU32::new(4 * 1_024),
            sync_on_write: AtomicBool::new(false),
            commit_before_close: AtomicBool::new(true),
        }
    }
}
