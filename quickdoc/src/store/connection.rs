use crate::common::{atomic, Atomic, QuickDocEventBus, ReadExecutor, SubscriberRef, WriteExecutor};
use crate::errors::{ErrorKind, QuickDocError, QuickDocResult};
use anyhow::Error;
use basu::error::BasuError;
use basu::event::Event;
use basu::Handle;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// State of a backend connection.
///
/// ```text
/// Connecting --handshake--> Connected --close--> Disconnected
///      \                        |                     |
///       \-------fault-------> Error <-----fault-------/
/// ```
///
/// Data operations are only served in `Connected`. A connection in `Error` or
/// `Disconnected` becomes usable again once it transitions back to `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Error => write!(f, "error"),
        }
    }
}

/// A state transition delivered to connection listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEventInfo {
    previous: ConnectionState,
    current: ConnectionState,
    reason: Option<String>,
}

impl ConnectionEventInfo {
    pub fn new(previous: ConnectionState, current: ConnectionState, reason: Option<String>) -> Self {
        ConnectionEventInfo {
            previous,
            current,
            reason,
        }
    }

    pub fn previous(&self) -> ConnectionState {
        self.previous
    }

    pub fn current(&self) -> ConnectionState {
        self.current
    }

    /// Transport error message for transitions into [ConnectionState::Error].
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// Closures that react to connection transitions.
pub trait ConnectionEventCallback:
    Send + Sync + Fn(ConnectionEventInfo) -> QuickDocResult<()>
{
}

impl<F> ConnectionEventCallback for F where
    F: Send + Sync + Fn(ConnectionEventInfo) -> QuickDocResult<()>
{
}

/// A registered reaction to connection transitions.
///
/// ```ignore
/// let listener = ConnectionEventListener::new(|info| {
///     if info.current() == ConnectionState::Error {
///         log::warn!("backend lost: {:?}", info.reason());
///     }
///     Ok(())
/// });
/// db.subscribe(listener)?;
/// ```
#[derive(Clone)]
pub struct ConnectionEventListener {
    on_event: Arc<dyn ConnectionEventCallback>,
}

impl ConnectionEventListener {
    pub fn new(on_event: impl ConnectionEventCallback + 'static) -> Self {
        ConnectionEventListener {
            on_event: Arc::new(on_event),
        }
    }
}

impl Handle<ConnectionEventInfo> for ConnectionEventListener {
    fn handle(&self, event: &Event<ConnectionEventInfo>) -> Result<(), BasuError> {
        match (self.on_event)(event.data.clone()) {
            Ok(_) => Ok(()),
            Err(e) => Err(BasuError::HandlerError(Error::from(e))),
        }
    }
}

impl Debug for ConnectionEventListener {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionEventListener").finish()
    }
}

/// The state machine of one backend connection, plus its subscribers.
///
/// Every connection owns exactly one monitor; databases sharing a connection
/// share its monitor by cloning it.
#[derive(Clone)]
pub struct ConnectionMonitor {
    inner: Arc<ConnectionMonitorInner>,
}

struct ConnectionMonitorInner {
    name: String,
    state: Atomic<ConnectionState>,
    event_bus: QuickDocEventBus<ConnectionEventInfo, ConnectionEventListener>,
}

impl ConnectionMonitor {
    /// Creates a monitor in [ConnectionState::Connecting].
    pub fn new(name: &str) -> Self {
        ConnectionMonitor {
            inner: Arc::new(ConnectionMonitorInner {
                name: name.to_string(),
                state: atomic(ConnectionState::Connecting),
                event_bus: QuickDocEventBus::new(),
            }),
        }
    }

    /// The name of the connection, typically its url.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.read_with(|state| *state)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Fails with [ErrorKind::NotReady] unless the connection is connected.
    pub fn ensure_ready(&self) -> QuickDocResult<()> {
        let state = self.state();
        if state == ConnectionState::Connected {
            return Ok(());
        }

        let message = format!("Connection '{}' is not ready, current state: {}", self.name(), state);
        log::error!("{}", message);
        Err(QuickDocError::new(&message, ErrorKind::NotReady))
    }

    pub fn mark_connected(&self) {
        self.transition(ConnectionState::Connected, None);
    }

    pub fn mark_disconnected(&self) {
        self.transition(ConnectionState::Disconnected, None);
    }

    pub fn mark_error(&self, reason: &str) {
        self.transition(ConnectionState::Error, Some(reason.to_string()));
    }

    /// Moves to `next` and notifies subscribers, unless already there.
    ///
    /// Listener failures are logged and do not undo the transition.
    pub fn transition(&self, next: ConnectionState, reason: Option<String>) {
        let previous = self.inner.state.write_with(|state| {
            let previous = *state;
            *state = next;
            previous
        });

        if previous == next {
            return;
        }

        log::debug!("Connection '{}' moved from {} to {}", self.name(), previous, next);
        let info = ConnectionEventInfo::new(previous, next, reason);
        if let Err(e) = self.inner.event_bus.publish(info) {
            log::warn!("Failed to deliver connection event for '{}': {}", self.name(), e);
        }
    }

    pub fn subscribe(&self, listener: ConnectionEventListener) -> QuickDocResult<SubscriberRef> {
        self.inner.event_bus.register(listener)
    }

    pub fn unsubscribe(&self, subscriber: &SubscriberRef) -> QuickDocResult<()> {
        self.inner.event_bus.deregister(subscriber)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.event_bus.listener_count()
    }

    /// Moves to [ConnectionState::Disconnected] and drops every subscriber.
    pub fn close(&self) -> QuickDocResult<()> {
        self.mark_disconnected();
        self.inner.event_bus.close()
    }
}

impl Debug for ConnectionMonitor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionMonitor")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}
