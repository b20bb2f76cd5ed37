use std::time::Duration;

/// Settings for in-memory connections.
///
/// ```text
/// // every backend call waits 5ms before touching the data, like a remote round trip
/// let connector = InMemoryConnector::with_config(InMemoryConfig::new().latency(Duration::from_millis(5)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfig {
    latency: Option<Duration>,
}

impl InMemoryConfig {
    pub fn new() -> Self {
        InMemoryConfig::default()
    }

    /// Simulated round-trip time applied to every backend call.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency).filter(|l| !l.is_zero());
        self
    }

    pub fn simulated_latency(&self) -> Option<Duration> {
        self.latency
    }
}
