use crate::common::Value;
use chrono::{DateTime, Utc};

/// The unit of storage: one master key and its payload.
///
/// Every key handed to a [Database](crate::Database) maps to exactly one
/// `Record`, addressed by the key's first segment. Nested segments live inside
/// `data` and never produce records of their own.
///
/// Backends persist records verbatim; the expiration fields are interpreted by
/// the database layer, so a backend may hand back a record whose `expire_at`
/// is already in the past.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    pub id: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expire_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Creates a record first written at `now`, with a `Null` payload and no expiry.
    pub fn new(id: &str, now: DateTime<Utc>) -> Self {
        Record {
            id: id.to_string(),
            data: Value::Null,
            created_at: now,
            updated_at: now,
            expire_at: None,
        }
    }

    /// Marks the record as modified at `now`.
    ///
    /// `updated_at` never moves behind `created_at`, even when the clock is
    /// set backwards between two writes.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    pub fn into_entry(self) -> RecordEntry {
        RecordEntry {
            id: self.id,
            data: self.data,
        }
    }
}

/// A visible record as returned by [Database::all](crate::Database::all).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEntry {
    pub id: String,
    pub data: Value,
}
