use parking_lot::Mutex;
use quickdoc::errors::ErrorKind;
use quickdoc::store::memory::{InMemoryBackend, InMemoryConnector};
use quickdoc::store::{ConnectionEventInfo, ConnectionEventListener, ConnectionState, DocumentBackend};
use quickdoc::Database;
use quickdoc_int_test::test_util::wait_for;
use std::sync::Arc;

type Received = Arc<Mutex<Vec<ConnectionEventInfo>>>;

fn recording_listener() -> (ConnectionEventListener, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let listener = ConnectionEventListener::new(move |info| {
        sink.lock().push(info);
        Ok(())
    });
    (listener, received)
}

async fn open_on(backend: &InMemoryBackend, listener: ConnectionEventListener) -> Database {
    Database::builder()
        .backend(DocumentBackend::new(backend.clone()))
        .add_connection_listener(listener)
        .open()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_listener_sees_transitions() {
    let backend = InMemoryBackend::new("memory://events");
    let (listener, received) = recording_listener();
    let db = open_on(&backend, listener).await;

    backend.fail("connection reset by peer");
    wait_for(1_000, || received.lock().len() == 1);
    {
        let events = received.lock();
        assert_eq!(events[0].previous(), ConnectionState::Connected);
        assert_eq!(events[0].current(), ConnectionState::Error);
        assert_eq!(events[0].reason(), Some("connection reset by peer"));
    }
    assert_eq!(db.connection_state(), ConnectionState::Error);

    backend.reconnect();
    wait_for(1_000, || received.lock().len() == 2);
    assert_eq!(received.lock()[1].current(), ConnectionState::Connected);

    db.close().await.unwrap();
    wait_for(1_000, || received.lock().len() == 3);
    assert_eq!(received.lock()[2].current(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_listener_sees_initial_connect() {
    let (listener, received) = recording_listener();
    let db = Database::builder()
        .connector(InMemoryConnector::new())
        .url("memory://handshake")
        .add_connection_listener(listener)
        .open()
        .await
        .unwrap();

    wait_for(1_000, || received.lock().len() == 1);
    {
        let events = received.lock();
        assert_eq!(events[0].previous(), ConnectionState::Connecting);
        assert_eq!(events[0].current(), ConnectionState::Connected);
    }
    assert_eq!(db.connection_state(), ConnectionState::Connected);

    // an adopted backend is already connected, so nothing is replayed
    let backend = InMemoryBackend::new("memory://adopted-events");
    let (adopted_listener, adopted_received) = recording_listener();
    let adopted = open_on(&backend, adopted_listener).await;
    assert!(adopted_received.lock().is_empty());

    adopted.close().await.unwrap();
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_operations_need_a_connection() {
    let backend = InMemoryBackend::new("memory://gate");
    let (listener, _) = recording_listener();
    let db = open_on(&backend, listener).await;
    db.set("k", 1).await.unwrap();

    backend.disconnect();
    assert_eq!(db.get("k").await.unwrap_err().kind(), &ErrorKind::NotReady);
    assert_eq!(db.set("k", 2).await.unwrap_err().kind(), &ErrorKind::NotReady);
    assert_eq!(db.add("k", 1).await.unwrap_err().kind(), &ErrorKind::NotReady);
    assert_eq!(db.count().await.unwrap_err().kind(), &ErrorKind::NotReady);

    backend.fail("timeout");
    assert_eq!(db.delete("k").await.unwrap_err().kind(), &ErrorKind::NotReady);

    // usable again once the connection is back, with nothing queued meanwhile
    backend.reconnect();
    assert_eq!(db.get("k").await.unwrap(), Some(1.into()));
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_failed_write_keeps_previous_state() {
    let backend = InMemoryBackend::new("memory://writes");
    let (listener, _) = recording_listener();
    let db = open_on(&backend, listener).await;
    db.set("user.name", "Ada").await.unwrap();

    backend.fail_writes(true);
    let err = db.set("user.name", "Grace").await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::BackendError);
    let err = db.push("user.tags", "x").await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::BackendError);

    backend.fail_writes(false);
    assert_eq!(db.get("user.name").await.unwrap(), Some("Ada".into()));
    assert_eq!(db.get("user.tags").await.unwrap(), None);
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_subscribe_and_unsubscribe() {
    let backend = InMemoryBackend::new("memory://subscribers");
    let (first, first_received) = recording_listener();
    let db = open_on(&backend, first).await;

    let (second, second_received) = recording_listener();
    let subscriber = db.subscribe(second).unwrap();

    backend.disconnect();
    wait_for(1_000, || {
        first_received.lock().len() == 1 && second_received.lock().len() == 1
    });

    db.unsubscribe(&subscriber).unwrap();
    backend.reconnect();
    wait_for(1_000, || first_received.lock().len() == 2);
    assert_eq!(second_received.lock().len(), 1);

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_failing_listener_does_not_break_transitions() {
    let backend = InMemoryBackend::new("memory://faulty-listener");
    let failing = ConnectionEventListener::new(|_| {
        Err(quickdoc::QuickDocError::new(
            "listener exploded",
            ErrorKind::EventError,
        ))
    });
    let db = open_on(&backend, failing).await;

    backend.disconnect();
    assert_eq!(db.connection_state(), ConnectionState::Disconnected);
    backend.reconnect();
    assert_eq!(db.connection_state(), ConnectionState::Connected);
    db.set("k", 1).await.unwrap();
    db.close().await.unwrap();
}
