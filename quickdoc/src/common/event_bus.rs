use crate::common::CONNECTION_EVENT;
use crate::errors::{ErrorKind, QuickDocError, QuickDocResult};
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Fan-out of connection events to registered listeners.
///
/// One bus exists per backend connection; it is owned by that connection's
/// [ConnectionMonitor](crate::store::ConnectionMonitor) and is closed together
/// with it. Delivery is synchronous: `publish` returns after every listener ran.
///
/// ```ignore
/// let bus: QuickDocEventBus<ConnectionEventInfo, ConnectionEventListener> = QuickDocEventBus::new();
/// let subscriber = bus.register(listener)?;
/// bus.publish(info)?;
/// bus.deregister(subscriber)?;
/// ```
#[derive(Clone)]
pub struct QuickDocEventBus<E, L> {
    inner: Arc<EventBusInner<E, L>>,
}

impl<E, L> Default for QuickDocEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, L> QuickDocEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    pub fn new() -> Self {
        QuickDocEventBus {
            inner: Arc::new(EventBusInner::new()),
        }
    }

    pub fn register(&self, listener: L) -> QuickDocResult<SubscriberRef> {
        self.inner.register(listener)
    }

    pub fn deregister(&self, subscriber: &SubscriberRef) -> QuickDocResult<()> {
        self.inner.deregister(subscriber)
    }

    pub fn publish(&self, event: E) -> QuickDocResult<()> {
        self.inner.publish(event)
    }

    /// Drops every registered listener.
    pub fn close(&self) -> QuickDocResult<()> {
        self.inner.close()
    }

    pub fn has_listeners(&self) -> bool {
        self.inner.listener_count() > 0
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listener_count()
    }
}

/// Handle returned by a subscription, used to unsubscribe later.
#[derive(Debug, Clone)]
pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub(crate) fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

struct EventBusInner<E, L> {
    event_bus: EventBus<E>,
    phantom_data: PhantomData<L>,
}

impl<E, L> EventBusInner<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn new() -> Self {
        EventBusInner {
            event_bus: EventBus::new(),
            phantom_data: PhantomData,
        }
    }

    fn register(&self, listener: L) -> QuickDocResult<SubscriberRef> {
        self.event_bus
            .subscribe(CONNECTION_EVENT, Box::new(listener))
            .map(SubscriberRef::new)
            .map_err(Self::to_quickdoc_error)
    }

    #[inline]
    fn deregister(&self, subscriber: &SubscriberRef) -> QuickDocResult<()> {
        self.event_bus
            .unsubscribe(CONNECTION_EVENT, &subscriber.inner)
            .map_err(Self::to_quickdoc_error)
    }

    #[inline]
    fn publish(&self, event: E) -> QuickDocResult<()> {
        // nobody listening, skip wrapping the event
        if self.listener_count() == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        self.event_bus
            .publish(CONNECTION_EVENT, &basu_event)
            .map_err(Self::to_quickdoc_error)
    }

    #[inline]
    fn close(&self) -> QuickDocResult<()> {
        self.event_bus.clear().map_err(Self::to_quickdoc_error)
    }

    fn listener_count(&self) -> usize {
        match self.event_bus.get_handler_count(CONNECTION_EVENT) {
            Ok(count) => count,
            Err(BasuError::EventTypeNotFOUND) => 0,
            Err(e) => {
                log::warn!("Failed to count connection listeners: {}", e);
                0
            }
        }
    }

    fn to_quickdoc_error(e: BasuError) -> QuickDocError {
        let error = match e {
            BasuError::EventTypeNotFOUND => QuickDocError::new(
                "Event bus error: no listener is registered for connection events",
                ErrorKind::EventError,
            ),
            BasuError::MutexPoisoned => QuickDocError::new(
                "Event bus error: internal mutex poisoned",
                ErrorKind::EventError,
            ),
            BasuError::HandlerError(e) => {
                let message = e
                    .source()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| e.to_string());
                QuickDocError::new(
                    &format!("Connection listener failed: {}", message),
                    ErrorKind::EventError,
                )
            }
        };
        log::error!("{}", error);
        error
    }
}
