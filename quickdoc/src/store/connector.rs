use crate::errors::QuickDocResult;
use crate::store::DocumentBackend;
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

/// Opens backend connections from a url.
///
/// A [Database](crate::Database) keeps the connector it was opened with, so a
/// child that needs its own connection is opened by the same kind of backend
/// as its parent.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    fn name(&self) -> &str;

    /// Url used when the builder was not given one.
    fn default_url(&self) -> String;

    /// Opens a new connection. The returned backend is still `Connecting`;
    /// [DocumentBackendProvider::handshake](crate::store::DocumentBackendProvider::handshake)
    /// completes it once listeners are subscribed.
    async fn connect(&self, url: &str) -> QuickDocResult<DocumentBackend>;
}

/// Cloneable handle to a [BackendConnector].
#[derive(Clone)]
pub struct Connector {
    inner: Arc<dyn BackendConnector>,
}

impl Connector {
    pub fn new<T: BackendConnector + 'static>(inner: T) -> Self {
        Connector {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for Connector {
    type Target = Arc<dyn BackendConnector>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("name", &self.inner.name())
            .finish()
    }
}
