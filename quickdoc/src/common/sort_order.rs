use std::cmp::Ordering;

/// Specifies the direction for sorting records returned by
/// [Database::all](crate::Database::all).
///
/// # Variants
/// - `Ascending`: Sort from smallest to largest value (the default)
/// - `Descending`: Sort from largest to smallest value
///
/// # Usage
/// ```text
/// let options = AllOptions::new().sort_by("score").sort_order(SortOrder::Descending);
/// let entries = db.all(options).await?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    #[default]
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

impl SortOrder {
    /// Orients an ascending comparison result according to this order.
    #[inline]
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}
