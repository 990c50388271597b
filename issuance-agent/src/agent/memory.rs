use std::sync::Arc;

use prople_issuance_core::agent::types::{AgentBuilder, AgentError};
use prople_issuance_core::events::EventBus;

use super::connections::ConnectionModule;
use super::context::AgentContext;
use super::credentials::CredentialModule;
use super::ledger::LedgerModule;
use super::oob::OutOfBandModule;

/// `MemoryAgent` is a handle to a running agent, cloning it gives another handle to the same
/// agent
#[derive(Clone)]
pub struct MemoryAgent {
    ctx: Arc<AgentContext>,
}

impl MemoryAgent {
    pub(crate) fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }

    pub fn get_did(&self) -> &String {
        &self.ctx.did
    }

    pub fn get_verkey(&self) -> &String {
        &self.ctx.verkey
    }

    pub fn get_endpoint(&self) -> &str {
        self.ctx.endpoint()
    }

    pub fn get_wallet_id(&self) -> &String {
        &self.ctx.wallet_id
    }

    pub fn connections(&self) -> ConnectionModule {
        ConnectionModule::new(self.ctx.clone())
    }

    /// `shutdown` closes the agent's inboxes, peers can't reach it anymore
    pub fn shutdown(&self) -> Result<(), AgentError> {
        for endpoint in self.ctx.endpoints.iter() {
            self.ctx.transport.unregister(endpoint)?;
        }

        Ok(())
    }
}

impl AgentBuilder for MemoryAgent {
    type OutOfBandImplementer = OutOfBandModule;
    type LedgerImplementer = LedgerModule;
    type CredentialImplementer = CredentialModule;

    fn label(&self) -> String {
        self.ctx.label.clone()
    }

    fn oob(&self) -> Self::OutOfBandImplementer {
        OutOfBandModule::new(self.ctx.clone())
    }

    fn ledger(&self) -> Self::LedgerImplementer {
        LedgerModule::new(self.ctx.did.clone(), self.ctx.ledger.clone())
    }

    fn credentials(&self) -> Self::CredentialImplementer {
        CredentialModule::new(self.ctx.clone())
    }

    fn events(&self) -> EventBus {
        self.ctx.events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use rst_common::with_tokio::tokio;

    use prople_issuance_core::connection::types::ConnectionID;
    use prople_issuance_core::credential::types::{
        AcceptOfferParams, CredentialAPI, CredentialFormats, CredentialPreviewAttribute,
        CredentialProtocolVersion, CredentialState, OfferCredentialParams,
    };
    use prople_issuance_core::credential::{AlwaysAccept, TrustedIssuers};
    use prople_issuance_core::events::Event;
    use prople_issuance_core::issuance::types::{IssuanceError, IssuanceParams, IssuanceState};
    use prople_issuance_core::issuance::Orchestrator;

    use crate::agent::testing::{connect, publish, wait_for, Network};

    fn is_credential(event: &Event, state: CredentialState) -> bool {
        match event {
            Event::CredentialStateChanged(payload) => payload.credential_record.get_state() == state,
            _ => false,
        }
    }

    fn credential_of(event: Event) -> prople_issuance_core::credential::CredentialExchangeRecord {
        match event {
            Event::CredentialStateChanged(payload) => payload.credential_record,
            _ => unreachable!(),
        }
    }

    fn offer_params(connection_id: ConnectionID, definition_id: String) -> OfferCredentialParams {
        OfferCredentialParams {
            protocol_version: CredentialProtocolVersion::V2,
            connection_id,
            credential_formats: CredentialFormats::indy(
                definition_id,
                vec![
                    CredentialPreviewAttribute::new("name", "Jane Doe"),
                    CredentialPreviewAttribute::new("age", "23"),
                ],
            ),
            comment: None,
        }
    }

    fn fast_params() -> IssuanceParams {
        IssuanceParams {
            connection_timeout: Duration::from_secs(2),
            completion_timeout: Duration::from_secs(2),
            ..IssuanceParams::default()
        }
    }

    #[tokio::test]
    async fn test_manual_credential_exchange() {
        let network = Network::new();
        let issuer = network.issuer("never");
        let holder = network.holder("never");

        let (issuer_connection, _) = connect(&issuer, &holder).await;
        let definition = publish(&issuer).await;

        let mut issuer_events = issuer.events().subscribe();
        let mut holder_events = holder.events().subscribe();

        let offered = issuer
            .credentials()
            .offer_credential(offer_params(issuer_connection, definition.id.clone()))
            .await;
        assert!(offered.is_ok());

        let offer = credential_of(
            wait_for(&mut holder_events, |event| {
                is_credential(event, CredentialState::OfferReceived)
            })
            .await,
        );
        assert_eq!(offer.get_credential_definition_id(), Some(&definition.id));
        assert_eq!(offer.get_protocol_version(), CredentialProtocolVersion::V2);

        let accepted = holder
            .credentials()
            .accept_offer(AcceptOfferParams::new(offer.get_id()))
            .await;
        assert!(accepted.is_ok());

        let request = credential_of(
            wait_for(&mut issuer_events, |event| {
                is_credential(event, CredentialState::RequestReceived)
            })
            .await,
        );
        assert_eq!(request.get_thread_id(), offer.get_thread_id());

        let issued = issuer.credentials().accept_request(&request.get_id()).await;
        assert_eq!(issued.unwrap().get_state(), CredentialState::CredentialIssued);

        let _ = wait_for(&mut holder_events, |event| {
            is_credential(event, CredentialState::CredentialReceived)
        })
        .await;

        let stored = holder.credentials().accept_credential(&offer.get_id()).await;
        assert_eq!(stored.unwrap().get_state(), CredentialState::Done);

        let _ = wait_for(&mut issuer_events, |event| {
            is_credential(event, CredentialState::Done)
        })
        .await;

        let holder_record = holder.credentials().get_by_id(offer.get_id()).await.unwrap();
        assert_eq!(holder_record.get_state(), CredentialState::Done);
        assert_eq!(holder_record.get_credential_attributes().len(), 2)
    }

    #[tokio::test]
    async fn test_offer_validation() {
        let network = Network::new();
        let issuer = network.issuer("never");
        let holder = network.holder("never");

        let (issuer_connection, _) = connect(&issuer, &holder).await;
        let definition = publish(&issuer).await;

        let mut params = offer_params(issuer_connection.clone(), definition.id.clone());
        params.credential_formats.indy.attributes.pop();
        let offered = issuer.credentials().offer_credential(params).await;
        assert!(matches!(offered, Err(AgentError::InvalidCredentialFormat(_))));

        let params = offer_params(issuer_connection, "unknown:3:CL:1:default".to_string());
        let offered = issuer.credentials().offer_credential(params).await;
        assert!(matches!(offered, Err(AgentError::RecordNotFound(_))));

        let params = offer_params(ConnectionID::generate(), definition.id);
        let offered = issuer.credentials().offer_credential(params).await;
        assert!(matches!(offered, Err(AgentError::RecordNotFound(_))));

        assert!(issuer.credentials().find_all().await.is_empty())
    }

    #[tokio::test]
    async fn test_duplicate_accept_offer() {
        let network = Network::new();
        let issuer = network.issuer("never");
        let holder = network.holder("never");

        let (issuer_connection, _) = connect(&issuer, &holder).await;
        let definition = publish(&issuer).await;

        let mut holder_events = holder.events().subscribe();
        issuer
            .credentials()
            .offer_credential(offer_params(issuer_connection, definition.id))
            .await
            .unwrap();

        let offer = credential_of(
            wait_for(&mut holder_events, |event| {
                is_credential(event, CredentialState::OfferReceived)
            })
            .await,
        );

        let first = holder
            .credentials()
            .accept_offer(AcceptOfferParams::new(offer.get_id()))
            .await;
        assert!(first.is_ok());

        let second = holder
            .credentials()
            .accept_offer(AcceptOfferParams::new(offer.get_id()))
            .await;
        assert!(matches!(second, Err(AgentError::InvalidState(_))))
    }

    #[tokio::test]
    async fn test_auto_accept_always() {
        let network = Network::new();
        let issuer = network.issuer("content-approved");
        let holder = network.holder("always");

        let (issuer_connection, _) = connect(&issuer, &holder).await;
        let definition = publish(&issuer).await;

        let mut issuer_events = issuer.events().subscribe();
        issuer
            .credentials()
            .offer_credential(offer_params(issuer_connection, definition.id))
            .await
            .unwrap();

        let done = credential_of(
            wait_for(&mut issuer_events, |event| {
                is_credential(event, CredentialState::Done)
            })
            .await,
        );
        assert_eq!(done.get_credential_attributes()[0].value, "Jane Doe")
    }

    #[tokio::test]
    async fn test_orchestrated_issuance() {
        let network = Network::new();
        let issuer = network.issuer("content-approved");
        let holder = network.holder("content-approved");

        let mut orchestrator =
            Orchestrator::new(issuer.clone(), holder.clone(), AlwaysAccept, fast_params());

        let outcome = orchestrator.run().await.unwrap();
        assert_eq!(outcome.state, IssuanceState::CredentialIssued);
        assert_eq!(
            outcome.schema_id,
            Some(format!("{}:2:Identity:6.0", issuer.get_did()))
        );

        let completed = orchestrator
            .await_completion(Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(completed.get_state(), CredentialState::Done);

        let held = holder.credentials().find_all().await;
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].get_state(), CredentialState::Done);
        assert_eq!(
            held[0].get_credential_definition_id(),
            outcome.credential_definition_id.as_ref()
        )
    }

    #[tokio::test]
    async fn test_orchestrated_with_auto_accepting_holder() {
        let network = Network::new();
        let issuer = network.issuer("content-approved");
        let holder = network.holder("always");

        let mut orchestrator =
            Orchestrator::new(issuer, holder.clone(), AlwaysAccept, fast_params());
        assert!(orchestrator.run().await.is_ok());

        let completed = orchestrator.await_completion(Duration::from_secs(2)).await;
        assert_eq!(completed.unwrap().get_state(), CredentialState::Done);
        assert_eq!(holder.credentials().find_all().await.len(), 1)
    }

    #[tokio::test]
    async fn test_orchestrated_untrusted_issuer() {
        let network = Network::new();
        let issuer = network.issuer("content-approved");
        let holder = network.holder("content-approved");

        let policy = TrustedIssuers::new(vec![holder.get_did().clone()]);
        let mut orchestrator = Orchestrator::new(issuer, holder.clone(), policy, fast_params());
        assert!(orchestrator.run().await.is_ok());

        let completed = orchestrator
            .await_completion(Duration::from_millis(200))
            .await;
        assert!(matches!(completed, Err(IssuanceError::CompletionTimeout(_))));

        let held = holder.credentials().find_all().await;
        assert_eq!(held[0].get_state(), CredentialState::OfferReceived)
    }
}
