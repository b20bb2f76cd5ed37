//! Soft expiration of records.
//!
//! A TTL is turned into an absolute `expire_at` stamp when a record is written.
//! Reads compare that stamp against "now" and treat expired records as absent,
//! whether or not the backend has reaped them yet.

use crate::collection::Record;
use chrono::{DateTime, Duration, Utc};

/// What happens to expired records a read runs into.
///
/// # Variants
/// - `OnRead`: expired records are hidden and deleted as they are encountered (the default)
/// - `Manual`: expired records are hidden but only deleted by
///   [Database::purge_expired](crate::Database::purge_expired)
/// - `Disabled`: stamps are still written, but records never count as expired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupStrategy {
    #[default]
    OnRead,
    Manual,
    Disabled,
}

/// Expiration decisions for one database.
///
/// Every method takes `now` explicitly; a database samples its clock once per
/// operation and passes the same instant to every call made on its behalf.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpirationPolicy {
    strategy: CleanupStrategy,
}

impl ExpirationPolicy {
    pub fn new(strategy: CleanupStrategy) -> Self {
        ExpirationPolicy { strategy }
    }

    pub fn strategy(&self) -> CleanupStrategy {
        self.strategy
    }

    /// Computes the `expire_at` stamp for a write carrying `ttl_seconds`.
    ///
    /// No stamp when the TTL is absent or not positive.
    pub fn stamp_for(&self, now: DateTime<Utc>, ttl_seconds: Option<i64>) -> Option<DateTime<Utc>> {
        stamp_for(now, ttl_seconds)
    }

    /// True iff the record carries a stamp at or before `now`, and expiration is enabled.
    pub fn is_expired(&self, record: &Record, now: DateTime<Utc>) -> bool {
        match self.strategy {
            CleanupStrategy::Disabled => false,
            _ => is_expired(record, now),
        }
    }

    /// Whether a read should delete the expired record it just found.
    pub fn purges_on_read(&self) -> bool {
        self.strategy == CleanupStrategy::OnRead
    }

    /// Remaining lifetime of a record that is still visible at `now`.
    ///
    /// `None` when expiration is disabled, since such records never expire.
    pub fn remaining(&self, record: &Record, now: DateTime<Utc>) -> Option<Duration> {
        if self.strategy == CleanupStrategy::Disabled {
            return None;
        }
        match record.expire_at {
            Some(expire_at) if !self.is_expired(record, now) => {
                Some((expire_at - now).max(Duration::zero()))
            }
            _ => None,
        }
    }
}

/// `now + ttl_seconds`, or `None` when `ttl_seconds` is absent, not positive
/// or too large to represent.
pub fn stamp_for(now: DateTime<Utc>, ttl_seconds: Option<i64>) -> Option<DateTime<Utc>> {
    let ttl = ttl_seconds.filter(|ttl| *ttl > 0)?;
    let ttl = Duration::try_seconds(ttl)?;
    now.checked_add_signed(ttl)
}

/// True iff `record.expire_at` is present and `<= now`.
pub fn is_expired(record: &Record, now: DateTime<Utc>) -> bool {
    record.expire_at.is_some_and(|expire_at| expire_at <= now)
}
