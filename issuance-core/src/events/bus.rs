use std::future::Future;

use rst_common::with_logging::log::{debug, warn};
use rst_common::with_tokio::tokio;
use rst_common::with_tokio::tokio::sync::broadcast::{self, error::RecvError};
use rst_common::with_tokio::tokio::task::JoinHandle;

use super::types::{Event, EventType};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// `EventBus` delivers records state change notifications to the registered listeners
///
/// Each agent instance owns its own bus. The bus is cheap to clone, all clones publish to
/// and subscribe from the same underlying channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// `emit` publishes an event to all current listeners and returns how many of them
    /// will receive it. Emitting without any listener is not an error
    pub fn emit(&self, event: Event) -> usize {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("no listener for event: {}", event_type);
                0
            }
        }
    }

    /// `subscribe` gives a raw receiver of all subsequent events, used by callers that need
    /// to await a specific event rather than reacting to every one of them
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn listeners(&self) -> usize {
        self.sender.receiver_count()
    }

    /// `on` registers a handler invoked for every subsequent event of the given type
    ///
    /// The subscription is taken before this method returns, so any event emitted after it is
    /// observed. The handler runs on a spawned task, its invocations are sequential, one per
    /// event. The listener lives as long as the returned [`ListenerHandle`].
    ///
    /// Must be called from within a tokio runtime
    pub fn on<THandler, TFuture>(&self, event_type: EventType, handler: THandler) -> ListenerHandle
    where
        THandler: Fn(Event) -> TFuture + Send + Sync + 'static,
        TFuture: Future<Output = ()> + Send + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if event.event_type() != event_type {
                            continue;
                        }

                        handler(event).await
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("listener for {} lagged, skipped {} events", event_type, skipped)
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        ListenerHandle { event_type, task }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// `ListenerHandle` scopes the lifetime of a registered listener, dropping it stops the
/// event delivery
#[derive(Debug)]
pub struct ListenerHandle {
    event_type: EventType,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn abort(&self) {
        self.task.abort()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use rst_common::with_tokio::tokio::sync::mpsc;
    use rst_common::with_tokio::tokio::time::timeout;

    use crate::connection::types::{DidExchangeRole, DidExchangeState};
    use crate::connection::ConnectionRecord;
    use crate::credential::types::{CredentialProtocolVersion, CredentialState};
    use crate::credential::CredentialExchangeRecord;

    fn connection_event(state: DidExchangeState) -> Event {
        let record = ConnectionRecord::new(DidExchangeRole::Responder, state);
        Event::connection_state_changed(record, None)
    }

    fn credential_event(state: CredentialState) -> Event {
        let record = CredentialExchangeRecord::new(
            "connection-id".to_string().into(),
            "thread-id".to_string(),
            state,
            CredentialProtocolVersion::V2,
        );
        Event::credential_state_changed(record, None)
    }

    #[tokio::test]
    async fn test_emit_without_listeners() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(connection_event(DidExchangeState::Completed)), 0)
    }

    #[tokio::test]
    async fn test_on_filter_by_event_type() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _handle = bus.on(EventType::ConnectionStateChanged, move |event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event);
            }
        });

        bus.emit(credential_event(CredentialState::OfferReceived));
        bus.emit(connection_event(DidExchangeState::RequestReceived));
        bus.emit(connection_event(DidExchangeState::Completed));

        let first = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        let second = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();

        let states: Vec<DidExchangeState> = vec![first, second]
            .into_iter()
            .map(|event| match event {
                Event::ConnectionStateChanged(payload) => payload.connection_record.get_state(),
                Event::CredentialStateChanged(_) => panic!("unexpected credential event"),
            })
            .collect();

        assert_eq!(
            states,
            vec![DidExchangeState::RequestReceived, DidExchangeState::Completed]
        )
    }

    #[tokio::test]
    async fn test_dropped_handle_stops_delivery() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

        let handle = bus.on(EventType::CredentialStateChanged, move |event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event);
            }
        });

        assert_eq!(handle.event_type(), EventType::CredentialStateChanged);
        drop(handle);

        bus.emit(credential_event(CredentialState::OfferReceived));

        // the aborted task drops the handler and its sender, closing the channel
        let received = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert!(received.is_none())
    }
}
