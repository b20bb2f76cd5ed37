use crate::common::{SortOrder, Value};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Predicate applied to each visible record's data and its position among
/// the visible records.
pub type RecordPredicate = Arc<dyn Fn(&Value, usize) -> bool + Send + Sync>;

/// Options for [Database::all](crate::Database::all).
///
/// Expired records are dropped first. The remaining records are then
/// filtered, sorted and finally limited, in that order.
///
/// # Examples
///
/// ```rust,ignore
/// use quickdoc::collection::AllOptions;
/// use quickdoc::common::SortOrder;
///
/// let options = AllOptions::new()
///     .filter(|data, _| data.as_document().is_some())
///     .sort_by("stats.score")
///     .sort_order(SortOrder::Descending)
///     .limit(10);
///
/// let options = order_by("score", SortOrder::Ascending);
/// let options = limit_to(5);
/// ```
#[derive(Clone, Default)]
pub struct AllOptions {
    pub(crate) filter: Option<RecordPredicate>,
    pub(crate) sort_by: Option<String>,
    pub(crate) sort_order: SortOrder,
    pub(crate) limit: usize,
}

/// Creates `AllOptions` sorting by a dotted field of each record's data.
pub fn order_by(field: &str, sort_order: SortOrder) -> AllOptions {
    AllOptions::new().sort_by(field).sort_order(sort_order)
}

/// Creates `AllOptions` returning at most `limit` records. Zero means no limit.
pub fn limit_to(limit: usize) -> AllOptions {
    AllOptions::new().limit(limit)
}

/// Creates `AllOptions` keeping only the records accepted by `predicate`.
pub fn filter_by<F>(predicate: F) -> AllOptions
where
    F: Fn(&Value, usize) -> bool + Send + Sync + 'static,
{
    AllOptions::new().filter(predicate)
}

impl AllOptions {
    pub fn new() -> Self {
        AllOptions::default()
    }

    /// Keeps a record only if `predicate(data, index)` is true.
    ///
    /// `index` counts visible records in the order the backend returned them,
    /// starting at zero, and is assigned before any sorting.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value, usize) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(predicate));
        self
    }

    /// Sorts by the value found at the dotted `field` inside each record's data.
    ///
    /// Records lacking the field sort before every record that has it. Ties
    /// keep their retrieval order.
    pub fn sort_by(mut self, field: &str) -> Self {
        self.sort_by = Some(field.to_string());
        self
    }

    pub fn sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub(crate) fn accepts(&self, data: &Value, index: usize) -> bool {
        match &self.filter {
            Some(predicate) => predicate(data, index),
            None => true,
        }
    }
}

impl Debug for AllOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllOptions")
            .field("filter", &self.filter.is_some())
            .field("sort_by", &self.sort_by)
            .field("sort_order", &self.sort_order)
            .field("limit", &self.limit)
            .finish()
    }
}
