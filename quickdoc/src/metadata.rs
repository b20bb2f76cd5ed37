use crate::collection::Document;
use crate::expiration::CleanupStrategy;
use crate::store::ConnectionState;

/// Descriptive information about an open [Database](crate::Database).
#[derive(Debug, Clone)]
pub struct DatabaseMetadata {
    pub backend: String,
    pub backend_version: String,
    pub url: String,
    pub collection_name: String,
    pub is_child: bool,
    /// Whether closing the database closes its connection.
    pub owns_connection: bool,
    pub connection_state: ConnectionState,
    pub cleanup_strategy: CleanupStrategy,
    pub quickdoc_version: String,
}

impl DatabaseMetadata {
    /// Flattens the metadata into a [Document], e.g. for logging or storing it.
    pub fn get_info(&self) -> Document {
        let mut document = Document::new();
        document.put("backend", self.backend.as_str());
        document.put("backend_version", self.backend_version.as_str());
        document.put("url", self.url.as_str());
        document.put("collection_name", self.collection_name.as_str());
        document.put("is_child", self.is_child);
        document.put("owns_connection", self.owns_connection);
        document.put("connection_state", self.connection_state.to_string());
        document.put("cleanup_strategy", format!("{:?}", self.cleanup_strategy));
        document.put("quickdoc_version", self.quickdoc_version.as_str());
        document
    }
}
