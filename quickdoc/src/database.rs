use crate::codec::{extract, inject, remove, RemoveOutcome};
use crate::collection::{AllOptions, Record, RecordEntry};
use crate::common::{Clock, SubscriberRef, Value};
use crate::database_builder::DatabaseBuilder;
use crate::database_config::DatabaseConfig;
use crate::errors::{ErrorKind, QuickDocError, QuickDocResult};
use crate::expiration::{CleanupStrategy, ExpirationPolicy};
use crate::hierarchy;
use crate::key::{resolve, resolve_path};
use crate::metadata::DatabaseMetadata;
use crate::store::{
    BackendStats, ConnectionEventListener, ConnectionState, Connector, DocumentBackend,
    RecordFilter,
};
use chrono::{DateTime, Utc};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// A key-value view over one collection of a document backend.
///
/// Keys are dotted paths: the first segment names a record, the remaining
/// segments walk into that record's data. `"user.address.city"` reads and
/// writes the `city` field of the `address` document stored in record `user`.
///
/// Records written with a TTL expire softly: once their stamp has passed,
/// every read treats them as absent, and depending on the
/// [CleanupStrategy] they are deleted as reads run into them.
///
/// `Database` is a cheap handle; clones share the same connection, collection
/// and state.
///
/// # Concurrency
///
/// Each operation suspends only while waiting for the backend. Compound
/// operations ([push](Self::push), [pull](Self::pull), [add](Self::add),
/// [subtract](Self::subtract) and [set](Self::set) on a nested path) read the
/// record, modify it locally and write it back. Two of them racing on the same
/// record are not coordinated: the last write wins and the other update is
/// lost.
///
/// # Examples
///
/// ```rust,ignore
/// use quickdoc::Database;
///
/// let db = Database::builder().url("memory://app").open().await?;
///
/// db.set("user.name", "Ada").await?;
/// db.set_with_ttl("session", "token", 60).await?;
/// db.add("user.visits", 1).await?;
///
/// assert_eq!(db.get("user.name").await?, Some("Ada".into()));
/// db.close().await?;
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Starts building a database.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Opens a database from `config`, freezing it.
    pub(crate) async fn open(config: DatabaseConfig) -> QuickDocResult<Database> {
        let backend = match config.backend() {
            Some(backend) => backend,
            None => {
                let connector = config.connector();
                let url = config.url().unwrap_or_else(|| connector.default_url());
                connector.connect(&url).await?
            }
        };

        let monitor = backend.connection();
        for listener in config.connection_listeners() {
            monitor.subscribe(listener)?;
        }
        // after subscribing, so listeners see Connecting -> Connected
        backend.handshake().await?;

        config.freeze();
        log::debug!(
            "Opened database on '{}' for collection '{}'",
            backend.url(),
            config.collection_name()
        );
        Ok(Database::attach(config, backend, true, None))
    }

    /// Binds a database to an already open connection.
    pub(crate) fn attach(
        config: DatabaseConfig,
        backend: DocumentBackend,
        owns_connection: bool,
        parent: Option<&Database>,
    ) -> Database {
        config.freeze();
        Database {
            inner: Arc::new(DatabaseInner {
                collection: config.collection_name(),
                url: backend.url().to_string(),
                policy: ExpirationPolicy::new(config.cleanup_strategy()),
                clock: config.clock(),
                connector: config.connector(),
                parent: parent.map(|parent| Arc::downgrade(&parent.inner)),
                detached: AtomicBool::new(false),
                owns_connection,
                backend,
                config,
            }),
        }
    }

    /// Returns the value stored at `key`, or `None` if nothing visible lives there.
    ///
    /// Expired records read as absent. A stored `Null` is returned as
    /// `Some(Value::Null)`.
    ///
    /// # Errors
    /// - [ErrorKind::NotReady] if the connection is not connected or the database is closed
    /// - [ErrorKind::InvalidKey] if `key` is malformed
    /// - [ErrorKind::BackendError] if the backend fails
    pub async fn get(&self, key: &str) -> QuickDocResult<Option<Value>> {
        self.ensure_ready()?;
        let key = resolve(key)?;
        let now = self.now();

        let record = self.load(key.master(), now, true).await?;
        Ok(record.and_then(|record| extract(&record.data, key.path()).cloned()))
    }

    /// Same as [get](Self::get).
    pub async fn fetch(&self, key: &str) -> QuickDocResult<Option<Value>> {
        self.get(key).await
    }

    /// Whether a non-null value is visible at `key`.
    pub async fn has(&self, key: &str) -> QuickDocResult<bool> {
        Ok(self
            .get(key)
            .await?
            .is_some_and(|value| !value.is_null()))
    }

    /// Stores `value` at `key` and returns the full data of the master record.
    ///
    /// Missing intermediate documents are created; siblings along the path are
    /// kept. An expired master record is replaced by a fresh one. Any
    /// expiration stamp of the record is cleared.
    ///
    /// ```rust,ignore
    /// db.set("a.b", 1).await?;
    /// assert_eq!(db.get("a").await?, Some(Value::Document(doc!{ b: 1 })));
    /// ```
    pub async fn set<V: Into<Value>>(&self, key: &str, value: V) -> QuickDocResult<Value> {
        self.write(key, value.into(), None).await
    }

    /// Like [set](Self::set), but the master record expires `ttl_seconds`
    /// from now. A TTL of zero or less stores the value without expiration.
    ///
    /// The TTL applies to the whole master record, not just the written path.
    pub async fn set_with_ttl<V: Into<Value>>(
        &self,
        key: &str,
        value: V,
        ttl_seconds: i64,
    ) -> QuickDocResult<Value> {
        self.write(key, value.into(), Some(ttl_seconds)).await
    }

    async fn write(&self, key: &str, value: Value, ttl_seconds: Option<i64>) -> QuickDocResult<Value> {
        self.ensure_ready()?;
        let key = resolve(key)?;
        let now = self.now();

        let mut record = self
            .load(key.master(), now, false)
            .await?
            .unwrap_or_else(|| Record::new(key.master(), now));
        inject(&mut record.data, key.path(), value);
        record.expire_at = self.inner.policy.stamp_for(now, ttl_seconds);
        self.persist(record, now).await
    }

    /// Deletes the value at `key`.
    ///
    /// For a bare key the whole record is deleted and the backend's answer is
    /// returned: `true` even if the record had already expired, `false` if it
    /// never existed. For a nested key the leaf is removed from a visible
    /// record, leaving the (possibly empty) record in place; the result tells
    /// whether anything was removed.
    pub async fn delete(&self, key: &str) -> QuickDocResult<bool> {
        self.ensure_ready()?;
        let key = resolve(key)?;

        if !key.has_path() {
            return self
                .inner
                .backend
                .delete_one(&self.inner.collection, key.master())
                .await;
        }

        let now = self.now();
        let Some(mut record) = self.load(key.master(), now, true).await? else {
            return Ok(false);
        };

        match remove(&mut record.data, key.path()) {
            RemoveOutcome::Removed(_) => {
                self.persist(record, now).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Deletes every record of the collection. Always returns `true`.
    pub async fn delete_all(&self) -> QuickDocResult<bool> {
        self.ensure_ready()?;
        let removed = self
            .inner
            .backend
            .delete_many(&self.inner.collection, RecordFilter::All)
            .await?;
        log::debug!("Deleted {} records from '{}'", removed, self.inner.collection);
        Ok(true)
    }

    /// Number of visible records in the collection.
    pub async fn count(&self) -> QuickDocResult<u64> {
        self.ensure_ready()?;
        let now = self.now();
        let records = self.visible_records(now).await?;
        Ok(records.len() as u64)
    }

    /// Returns the visible records of the collection, shaped by `options`.
    ///
    /// Records are filtered first, with indices counting visible records in
    /// retrieval order, then sorted, then limited.
    ///
    /// ```rust,ignore
    /// let top = db.all(order_by("score", SortOrder::Descending).limit(3)).await?;
    /// ```
    pub async fn all(&self, options: AllOptions) -> QuickDocResult<Vec<RecordEntry>> {
        self.ensure_ready()?;
        let sort_path = options.sort_by.as_deref().map(resolve_path).transpose()?;
        let now = self.now();

        let mut records: Vec<Record> = self
            .visible_records(now)
            .await?
            .into_iter()
            .enumerate()
            .filter(|(index, record)| options.accepts(&record.data, *index))
            .map(|(_, record)| record)
            .collect();

        if let Some(path) = sort_path {
            records.sort_by(|a, b| {
                let left = extract(&a.data, &path);
                let right = extract(&b.data, &path);
                options.sort_order.apply(left.cmp(&right))
            });
        }

        if options.limit > 0 {
            records.truncate(options.limit);
        }

        Ok(records.into_iter().map(Record::into_entry).collect())
    }

    /// Appends `value` to the array at `key` and returns the full master value.
    ///
    /// A missing or null value starts a new array; any other non-array value
    /// becomes the first element. An array argument is appended element by
    /// element.
    pub async fn push<V: Into<Value>>(&self, key: &str, value: V) -> QuickDocResult<Value> {
        self.ensure_ready()?;
        let key = resolve(key)?;
        let now = self.now();
        let mut record = self.load_or_new(key.master(), now).await?;

        let mut items = match extract(&record.data, key.path()) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        };
        match value.into() {
            Value::Array(values) => items.extend(values),
            value => items.push(value),
        }

        inject(&mut record.data, key.path(), Value::Array(items));
        self.persist(record, now).await
    }

    /// Removes `value` from the array at `key`.
    ///
    /// If `value` is an array, each of its elements is removed. Only the first
    /// match of each target goes, unless `multiple` is set. Returns `None`
    /// without writing when there is no array at `key`, otherwise the full
    /// master value.
    pub async fn pull<V: Into<Value>>(
        &self,
        key: &str,
        value: V,
        multiple: bool,
    ) -> QuickDocResult<Option<Value>> {
        self.ensure_ready()?;
        let key = resolve(key)?;
        let now = self.now();

        let Some(mut record) = self.load(key.master(), now, true).await? else {
            return Ok(None);
        };
        let Some(mut items) = extract(&record.data, key.path())
            .and_then(Value::as_array)
            .cloned()
        else {
            return Ok(None);
        };

        let targets = match value.into() {
            Value::Array(targets) => targets,
            target => vec![target],
        };
        if multiple {
            items.retain(|item| !targets.contains(item));
        } else {
            for target in &targets {
                if let Some(position) = items.iter().position(|item| item == target) {
                    items.remove(position);
                }
            }
        }

        inject(&mut record.data, key.path(), Value::Array(items));
        self.persist(record, now).await.map(Some)
    }

    /// Adds `amount` to the number at `key` and returns the full master value.
    ///
    /// A missing or null value counts as zero. Two integers stay integers;
    /// any decimal makes the result decimal.
    ///
    /// # Errors
    /// [ErrorKind::TypeMismatch] if the stored value or `amount` is not a
    /// number, or if integer arithmetic overflows.
    pub async fn add<V: Into<Value>>(&self, key: &str, amount: V) -> QuickDocResult<Value> {
        self.apply_arithmetic(key, amount.into(), Arithmetic::Add).await
    }

    /// Subtracts `amount` from the number at `key`. See [add](Self::add).
    pub async fn subtract<V: Into<Value>>(&self, key: &str, amount: V) -> QuickDocResult<Value> {
        self.apply_arithmetic(key, amount.into(), Arithmetic::Subtract).await
    }

    async fn apply_arithmetic(
        &self,
        key: &str,
        amount: Value,
        operation: Arithmetic,
    ) -> QuickDocResult<Value> {
        self.ensure_ready()?;
        let key = resolve(key)?;
        if !amount.is_number() {
            let message = format!(
                "Cannot {} a {} value at '{}'",
                operation,
                amount.type_name(),
                key
            );
            log::error!("{}", message);
            return Err(QuickDocError::new(&message, ErrorKind::TypeMismatch));
        }

        let now = self.now();
        let mut record = self.load_or_new(key.master(), now).await?;
        let current = match extract(&record.data, key.path()) {
            None | Some(Value::Null) => Value::I64(0),
            Some(value) => value.clone(),
        };

        let result = operation.apply(&current, &amount).ok_or_else(|| {
            let message = format!(
                "Cannot {} {} to {} value at '{}'",
                operation,
                amount,
                current.type_name(),
                key
            );
            log::error!("{}", message);
            QuickDocError::new(&message, ErrorKind::TypeMismatch)
        })?;

        inject(&mut record.data, key.path(), result);
        self.persist(record, now).await
    }

    /// Deletes every expired record of the collection and returns how many
    /// were removed. Does nothing when expiration is disabled.
    pub async fn purge_expired(&self) -> QuickDocResult<u64> {
        self.ensure_ready()?;
        if self.inner.policy.strategy() == CleanupStrategy::Disabled {
            return Ok(0);
        }

        let now = self.now();
        let removed = self
            .inner
            .backend
            .delete_many(&self.inner.collection, RecordFilter::ExpiredAt(now))
            .await?;
        log::debug!(
            "Purged {} expired records from '{}'",
            removed,
            self.inner.collection
        );
        Ok(removed)
    }

    /// Remaining lifetime of the record addressed by `key`.
    ///
    /// `None` if the record is not visible or never expires. Only the master
    /// segment of `key` matters.
    pub async fn ttl(&self, key: &str) -> QuickDocResult<Option<Duration>> {
        self.ensure_ready()?;
        let key = resolve(key)?;
        let now = self.now();

        let record = self.load(key.master(), now, true).await?;
        Ok(record
            .and_then(|record| self.inner.policy.remaining(&record, now))
            .and_then(|remaining| remaining.to_std().ok()))
    }

    /// Creates a database over another collection.
    ///
    /// With neither a `url` nor `share_connection_from_parent` disabled, the
    /// child reuses this database's connection and defaults to the
    /// configured child collection name (`"JSON_CHILD"`), suffixed with
    /// `_CHILD` while it equals this database's collection. Otherwise it opens
    /// its own connection through the same connector, to `url` or to this
    /// database's url, and defaults to `"JSON"`.
    ///
    /// The child keeps a weak reference to this database, see [parent](Self::parent).
    pub async fn instantiate_child(
        &self,
        collection_name: Option<&str>,
        url: Option<&str>,
    ) -> QuickDocResult<Database> {
        if self.inner.detached.load(Ordering::Acquire) {
            return Err(self.closed_error());
        }
        hierarchy::instantiate_child(self, collection_name, url).await
    }

    /// Round-trip time to the backend.
    pub async fn ping(&self) -> QuickDocResult<Duration> {
        self.ensure_open()?;
        self.inner.backend.ping().await
    }

    /// Backend statistics for this database's collection.
    pub async fn stats(&self) -> QuickDocResult<BackendStats> {
        self.ensure_open()?;
        self.inner.backend.stats(&self.inner.collection).await
    }

    pub fn metadata(&self) -> DatabaseMetadata {
        DatabaseMetadata {
            backend: self.inner.backend.name().to_string(),
            backend_version: self.inner.backend.version(),
            url: self.inner.url.clone(),
            collection_name: self.inner.collection.clone(),
            is_child: self.is_child(),
            owns_connection: self.inner.owns_connection,
            connection_state: self.connection_state(),
            cleanup_strategy: self.inner.policy.strategy(),
            quickdoc_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Registers a listener for state transitions of this database's connection.
    ///
    /// Databases sharing a connection share its listeners.
    pub fn subscribe(&self, listener: ConnectionEventListener) -> QuickDocResult<SubscriberRef> {
        self.inner.backend.connection().subscribe(listener)
    }

    pub fn unsubscribe(&self, subscriber: &SubscriberRef) -> QuickDocResult<()> {
        self.inner.backend.connection().unsubscribe(subscriber)
    }

    /// Closes the database.
    ///
    /// A database that owns its connection closes it, which moves the
    /// connection to [ConnectionState::Disconnected] and drops its listeners.
    /// A child borrowing its parent's connection only detaches. Every
    /// operation on a closed database fails with [ErrorKind::NotReady].
    /// Closing twice is a no-op.
    pub async fn close(&self) -> QuickDocResult<()> {
        if self.inner.detached.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        if self.inner.owns_connection {
            log::debug!("Closing connection '{}'", self.inner.url);
            self.inner.backend.close().await?;
        } else {
            log::debug!(
                "Detached collection '{}' from shared connection '{}'",
                self.inner.collection,
                self.inner.url
            );
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.detached.load(Ordering::Acquire)
    }

    /// The database this one was instantiated from, while it is still alive.
    pub fn parent(&self) -> Option<Database> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Database { inner })
    }

    pub fn is_child(&self) -> bool {
        self.inner.parent.is_some()
    }

    pub fn collection_name(&self) -> &str {
        &self.inner.collection
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.backend.connection().state()
    }

    /// Whether closing this database closes its connection.
    pub fn owns_connection(&self) -> bool {
        self.inner.owns_connection
    }

    pub fn config(&self) -> DatabaseConfig {
        self.inner.config.clone()
    }

    pub(crate) fn backend(&self) -> &DocumentBackend {
        &self.inner.backend
    }

    pub(crate) fn connector(&self) -> &Connector {
        &self.inner.connector
    }

    fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    fn closed_error(&self) -> QuickDocError {
        let message = format!("Database on collection '{}' is closed", self.inner.collection);
        log::error!("{}", message);
        QuickDocError::new(&message, ErrorKind::NotReady)
    }

    fn ensure_open(&self) -> QuickDocResult<()> {
        if self.inner.detached.load(Ordering::Acquire) {
            return Err(self.closed_error());
        }
        Ok(())
    }

    fn ensure_ready(&self) -> QuickDocResult<()> {
        self.ensure_open()?;
        self.inner.backend.connection().ensure_ready()
    }

    /// Fetches the master record, hiding it when expired at `now`.
    ///
    /// With `purge` set and an on-read cleanup strategy, the expired record is
    /// deleted as well; a failed purge is only logged.
    async fn load(&self, master: &str, now: DateTime<Utc>, purge: bool) -> QuickDocResult<Option<Record>> {
        let record = self
            .inner
            .backend
            .find_one(&self.inner.collection, master)
            .await?;

        match record {
            Some(record) if self.inner.policy.is_expired(&record, now) => {
                if purge && self.inner.policy.purges_on_read() {
                    if let Err(e) = self
                        .inner
                        .backend
                        .delete_one(&self.inner.collection, master)
                        .await
                    {
                        log::warn!("Failed to purge expired record '{}': {}", master, e);
                    }
                }
                Ok(None)
            }
            record => Ok(record),
        }
    }

    /// The visible master record, or a fresh one if there is none.
    async fn load_or_new(&self, master: &str, now: DateTime<Utc>) -> QuickDocResult<Record> {
        Ok(self
            .load(master, now, false)
            .await?
            .unwrap_or_else(|| Record::new(master, now)))
    }

    async fn persist(&self, mut record: Record, now: DateTime<Utc>) -> QuickDocResult<Value> {
        record.touch(now);
        let id = record.id.clone();
        let data = record.data.clone();
        self.inner
            .backend
            .upsert(&self.inner.collection, &id, record)
            .await?;
        Ok(data)
    }

    async fn visible_records(&self, now: DateTime<Utc>) -> QuickDocResult<Vec<Record>> {
        let records = self.inner.backend.list_all(&self.inner.collection).await?;
        let (expired, visible): (Vec<Record>, Vec<Record>) = records
            .into_iter()
            .partition(|record| self.inner.policy.is_expired(record, now));

        if !expired.is_empty() && self.inner.policy.purges_on_read() {
            if let Err(e) = self
                .inner
                .backend
                .delete_many(&self.inner.collection, RecordFilter::ExpiredAt(now))
                .await
            {
                log::warn!(
                    "Failed to purge {} expired records from '{}': {}",
                    expired.len(),
                    self.inner.collection,
                    e
                );
            }
        }
        Ok(visible)
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("url", &self.inner.url)
            .field("collection", &self.inner.collection)
            .field("is_child", &self.is_child())
            .field("owns_connection", &self.inner.owns_connection)
            .field("closed", &self.is_closed())
            .finish()
    }
}

struct DatabaseInner {
    config: DatabaseConfig,
    collection: String,
    url: String,
    backend: DocumentBackend,
    connector: Connector,
    owns_connection: bool,
    detached: AtomicBool,
    parent: Option<Weak<DatabaseInner>>,
    policy: ExpirationPolicy,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, Copy)]
enum Arithmetic {
    Add,
    Subtract,
}

impl Arithmetic {
    /// `None` when either side is not a number or integer arithmetic overflows.
    fn apply(&self, current: &Value, amount: &Value) -> Option<Value> {
        match (current, amount) {
            (Value::I64(a), Value::I64(b)) => match self {
                Arithmetic::Add => a.checked_add(*b),
                Arithmetic::Subtract => a.checked_sub(*b),
            }
            .map(Value::I64),
            _ => {
                let a = current.as_number()?;
                let b = amount.as_number()?;
                Some(Value::F64(match self {
                    Arithmetic::Add => a + b,
                    Arithmetic::Subtract => a - b,
                }))
            }
        }
    }
}

impl std::fmt::Display for Arithmetic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Arithmetic::Add => write!(f, "add"),
            Arithmetic::Subtract => write!(f, "subtract"),
        }
    }
}
