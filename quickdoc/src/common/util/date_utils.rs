use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use chrono::{DateTime, Duration, Utc};
use std::fmt::Debug;
use std::sync::Arc;

/// Source of "now" for expiration decisions.
///
/// A [Database](crate::Database) samples its clock exactly once per logical
/// operation, so every expiration check inside that operation agrees.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep one handle and hand
/// another to the database configuration.
///
/// ```rust,ignore
/// let clock = ManualClock::starting_now();
/// let db = Database::builder().clock(clock.clone()).open().await?;
/// db.set_with_ttl("session", "abc", 1).await?;
/// clock.advance_secs(2);
/// assert!(db.get("session").await?.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Atomic<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock { now: atomic(start) }
    }

    pub fn starting_now() -> Self {
        ManualClock::new(Utc::now())
    }

    pub fn advance(&self, by: Duration) {
        self.now.write_with(|now| *now += by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn advance_millis(&self, millis: i64) {
        self.advance(Duration::milliseconds(millis));
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.now.write_with(|now| *now = instant);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.read_with(|now| *now)
    }
}

pub(crate) fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}
