use crate::collection::Record;
use crate::expiration::is_expired;
use chrono::{DateTime, Utc};

/// Selects the records removed by a bulk delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    /// Every record of the collection.
    All,
    /// Records whose `expire_at` is at or before the given instant.
    ExpiredAt(DateTime<Utc>),
}

impl RecordFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::ExpiredAt(now) => is_expired(record, *now),
        }
    }
}
