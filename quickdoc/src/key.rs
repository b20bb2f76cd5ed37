//! Splitting dotted keys into a master key and a nested path.
//!
//! `"user.address.city"` names the record `user` and, inside its data, the
//! path `address` then `city`. A bare `"user"` names the record's whole data.

use crate::common::KEY_SEPARATOR;
use crate::errors::{ErrorKind, QuickDocError, QuickDocResult};
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// Path segments below the master key. Most keys nest only a few levels deep.
pub type KeyPath = SmallVec<[String; 4]>;

/// A key split into the record it addresses and the path inside that record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    master: String,
    path: KeyPath,
}

impl ResolvedKey {
    /// The record id.
    pub fn master(&self) -> &str {
        &self.master
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Whether the key addresses something inside the record rather than the whole of it.
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }
}

impl Display for ResolvedKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.master)?;
        for segment in &self.path {
            write!(f, "{}{}", KEY_SEPARATOR, segment)?;
        }
        Ok(())
    }
}

/// Resolves a dotted key.
///
/// Fails with [ErrorKind::InvalidKey] when the key is empty or any of its
/// segments is empty (`".a"`, `"a..b"`, `"a."`).
///
/// ```rust,ignore
/// let key = resolve("a.b.c")?;
/// assert_eq!(key.master(), "a");
/// assert_eq!(key.path(), ["b", "c"]);
/// ```
pub fn resolve(key: &str) -> QuickDocResult<ResolvedKey> {
    if key.is_empty() {
        log::error!("Key cannot be empty");
        return Err(QuickDocError::new("Key cannot be empty", ErrorKind::InvalidKey));
    }

    let mut segments = split_segments(key)?.into_iter();
    // split_segments never yields an empty list for a non-empty key
    let master = segments.next().unwrap_or_default();
    Ok(ResolvedKey {
        master,
        path: segments.collect(),
    })
}

/// Resolves a dotted field path relative to a record's data, as used for sorting.
pub fn resolve_path(field: &str) -> QuickDocResult<KeyPath> {
    if field.is_empty() {
        log::error!("Field path cannot be empty");
        return Err(QuickDocError::new(
            "Field path cannot be empty",
            ErrorKind::InvalidKey,
        ));
    }
    split_segments(field)
}

fn split_segments(key: &str) -> QuickDocResult<KeyPath> {
    let mut segments = KeyPath::new();
    for segment in key.split(KEY_SEPARATOR) {
        if segment.is_empty() {
            let message = format!("Key '{}' contains an empty segment", key);
            log::error!("{}", message);
            return Err(QuickDocError::new(&message, ErrorKind::InvalidKey));
        }
        segments.push(segment.to_string());
    }
    Ok(segments)
}
