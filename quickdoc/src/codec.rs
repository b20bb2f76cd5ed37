//! Reading, writing and removing nested paths inside a record's data.
//!
//! A path segment selects a field of a [Document], or an element of an array
//! when the segment is a decimal index. Walking never fails: a missing step
//! reads as absent, and a write creates whatever containers it needs.

use crate::collection::Document;
use crate::common::Value;

/// Result of [remove].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    /// The path was empty: the caller must delete the whole record.
    WholeRecord,
    /// The leaf existed and was removed; carries the removed value.
    Removed(Value),
    /// Nothing lived at the path, `data` is unchanged.
    Absent,
}

impl RemoveOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, RemoveOutcome::Removed(_))
    }
}

fn array_index(segment: &str) -> Option<usize> {
    // "01" or "+1" are field names, not indices
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Returns the value at `path` inside `data`, or `None` if any step is missing.
///
/// An empty path returns `data` itself.
pub fn extract<'a>(data: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(data, |current, segment| match current {
        Value::Document(doc) => doc.get(segment),
        Value::Array(items) => array_index(segment).and_then(|idx| items.get(idx)),
        _ => None,
    })
}

/// Writes `value` at `path` inside `data`.
///
/// An empty path replaces `data`. Missing or non-container intermediates are
/// replaced by empty documents; siblings along the way are left untouched. An
/// index segment on an existing array overwrites that element, or extends the
/// array with `Null`s so the element lands at exactly that index.
pub fn inject(data: &mut Value, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *data = value;
        return;
    };

    if let Value::Array(items) = data {
        if let Some(idx) = array_index(head) {
            if idx >= items.len() {
                items.resize(idx + 1, Value::Null);
            }
            inject(&mut items[idx], rest, value);
            return;
        }
    }

    if !data.is_document() {
        *data = Value::Document(Document::new());
    }

    if let Value::Document(doc) = data {
        if !doc.contains_key(head) {
            doc.put(head.as_str(), Value::Null);
        }
        if let Some(child) = doc.get_mut(head) {
            inject(child, rest, value);
        }
    }
}

/// Removes the leaf at `path` inside `data`.
///
/// An empty path yields [RemoveOutcome::WholeRecord] and leaves `data` alone.
/// Removing an array element shifts the elements after it.
pub fn remove(data: &mut Value, path: &[String]) -> RemoveOutcome {
    let Some((leaf, parents)) = path.split_last() else {
        return RemoveOutcome::WholeRecord;
    };

    let parent = parents.iter().try_fold(data, |current, segment| match current {
        Value::Document(doc) => doc.get_mut(segment),
        Value::Array(items) => array_index(segment).and_then(|idx| items.get_mut(idx)),
        _ => None,
    });

    let removed = match parent {
        Some(Value::Document(doc)) => doc.remove(leaf),
        Some(Value::Array(items)) => match array_index(leaf) {
            Some(idx) if idx < items.len() => Some(items.remove(idx)),
            _ => None,
        },
        _ => None,
    };

    match removed {
        Some(value) => RemoveOutcome::Removed(value),
        None => RemoveOutcome::Absent,
    }
}
