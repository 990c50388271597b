use std::sync::{Arc, Mutex};
use std::time::Duration;

use rst_common::with_logging::log::{debug, info};
use rst_common::with_tokio::tokio;
use rst_common::with_tokio::tokio::sync::oneshot;

use crate::events::{Event, EventBus, EventType, ListenerHandle};
use crate::oob::types::OutOfBandID;

use super::types::{ConnectionError, ConnectionID, DidExchangeState};
use super::ConnectionRecord;

/// `ConnectionListener` observes connection state changes and triggers a continuation once a
/// connection spawned from its invitation reaches [`DidExchangeState::Completed`]
///
/// The continuation is guarded, it fires at most once even if the completed event is
/// delivered more than once
#[derive(Debug, Clone)]
pub struct ConnectionListener {
    invitation_id: OutOfBandID,
}

impl ConnectionListener {
    pub fn new(invitation_id: OutOfBandID) -> Self {
        Self { invitation_id }
    }

    pub fn get_invitation_id(&self) -> &OutOfBandID {
        &self.invitation_id
    }

    /// `is_completed_for` checks both the correlation id and the terminal state
    pub fn is_completed_for(&self, record: &ConnectionRecord) -> bool {
        match record.get_out_of_band_id() {
            Some(out_of_band_id) if out_of_band_id == &self.invitation_id => {
                record.get_state() == DidExchangeState::Completed
            }
            _ => false,
        }
    }

    /// `register` attaches the listener to the given bus. The `continuation` receives the
    /// completed connection's id
    pub fn register<TContinuation>(
        self,
        bus: &EventBus,
        continuation: TContinuation,
    ) -> ListenerHandle
    where
        TContinuation: FnOnce(ConnectionID) + Send + 'static,
    {
        let listener = Arc::new(self);
        let slot = Arc::new(Mutex::new(Some(continuation)));

        bus.on(EventType::ConnectionStateChanged, move |event| {
            let listener = listener.clone();
            let slot = slot.clone();

            async move {
                let Event::ConnectionStateChanged(payload) = event else {
                    return;
                };

                let record = payload.connection_record;
                if !listener.is_completed_for(&record) {
                    debug!(
                        "connection event ignored: {} ({:?})",
                        record.get_id().as_str(),
                        record.get_state()
                    );
                    return;
                }

                let continuation = match slot.lock() {
                    Ok(mut guard) => guard.take(),
                    Err(_) => None,
                };

                match continuation {
                    Some(continuation) => {
                        info!(
                            "connection for out-of-band id {} completed",
                            listener.invitation_id.as_str()
                        );
                        continuation(record.get_id())
                    }
                    None => debug!(
                        "duplicate completed event for connection {} ignored",
                        record.get_id().as_str()
                    ),
                }
            }
        })
    }

    /// `wait` registers the listener and awaits the completed connection, up to `duration`
    pub async fn wait(
        self,
        bus: &EventBus,
        duration: Duration,
    ) -> Result<ConnectionID, ConnectionError> {
        let (sender, receiver) = oneshot::channel();
        let _handle = self.register(bus, move |connection_id| {
            let _ = sender.send(connection_id);
        });

        match tokio::time::timeout(duration, receiver).await {
            Ok(Ok(connection_id)) => Ok(connection_id),
            Ok(Err(_)) => Err(ConnectionError::ListenerClosed),
            Err(_) => Err(ConnectionError::Timeout(format!("{:?}", duration))),
        }
    }
}
