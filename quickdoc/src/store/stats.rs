use std::fmt::{Display, Formatter};

/// Storage figures for one collection as reported by its backend.
///
/// `record_count` includes records that are expired but not yet purged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackendStats {
    pub backend: String,
    pub collection: String,
    pub record_count: u64,
    /// Approximate encoded size, when the backend can tell.
    pub size_bytes: Option<u64>,
}

impl Display for BackendStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}: {} records",
            self.backend, self.collection, self.record_count
        )?;
        if let Some(size) = self.size_bytes {
            write!(f, ", {} bytes", size)?;
        }
        Ok(())
    }
}
