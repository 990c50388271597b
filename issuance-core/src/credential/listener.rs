use std::sync::Arc;

use rst_common::with_logging::log::{debug, error, info};

use crate::agent::types::AgentError;
use crate::events::{Event, EventBus, EventType, ListenerHandle};

use super::types::{AcceptOfferParams, CredentialAPI, CredentialState};
use super::{AcceptPolicy, CredentialExchangeRecord};

/// `CredentialListener` reacts to received credential offers by accepting them, as long as
/// its [`AcceptPolicy`] allows it
///
/// No filtering by connection is performed here, it's up to the policy
pub struct CredentialListener<TPolicy>
where
    TPolicy: AcceptPolicy,
{
    policy: Arc<TPolicy>,
}

impl<TPolicy> CredentialListener<TPolicy>
where
    TPolicy: AcceptPolicy + 'static,
{
    pub fn new(policy: Arc<TPolicy>) -> Self {
        Self { policy }
    }

    /// `handle` accepts the given record if it's an offer allowed by the policy, it returns
    /// whether the offer has been accepted
    pub async fn handle<TCredential>(
        &self,
        credentials: &TCredential,
        record: &CredentialExchangeRecord,
    ) -> Result<bool, AgentError>
    where
        TCredential: CredentialAPI,
    {
        if record.get_state() != CredentialState::OfferReceived {
            return Ok(false);
        }

        if !self.policy.should_accept(record) {
            debug!("credential offer {} declined by policy", record.get_id().as_str());
            return Ok(false);
        }

        info!("received a credential offer: {}", record.get_id().as_str());
        credentials
            .accept_offer(AcceptOfferParams::new(record.get_id()))
            .await?;

        Ok(true)
    }

    /// `register` attaches the listener to the holder's bus
    ///
    /// Since the handler runs off the caller's stack, an accept failure can't be propagated,
    /// it's logged instead
    pub fn register<TCredential>(self, bus: &EventBus, credentials: TCredential) -> ListenerHandle
    where
        TCredential: CredentialAPI,
    {
        let listener = Arc::new(self);
        let credentials = Arc::new(credentials);

        bus.on(EventType::CredentialStateChanged, move |event| {
            let listener = listener.clone();
            let credentials = credentials.clone();

            async move {
                let Event::CredentialStateChanged(payload) = event else {
                    return;
                };

                let record = payload.credential_record;
                if let Err(err) = listener.handle(credentials.as_ref(), &record).await {
                    error!(
                        "failed to accept credential offer {}: {}",
                        record.get_id().as_str(),
                        err
                    )
                }
            }
        })
    }
}
