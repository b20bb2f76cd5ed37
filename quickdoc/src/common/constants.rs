// key constants
pub const KEY_SEPARATOR: char = '.';

// collection constants
pub const DEFAULT_COLLECTION: &str = "JSON";
pub const DEFAULT_CHILD_COLLECTION: &str = "JSON_CHILD";

// event constants
pub const CONNECTION_EVENT: &str = "quickdoc_connection_event";

// in-memory backend constants
pub const MEMORY_URL_SCHEME: &str = "memory://";
pub const MEMORY_BACKEND_NAME: &str = "in-memory";
pub const MEMORY_DEFAULT_URL: &str = "memory://default";
