use std::sync::Arc;

use rst_common::with_logging::log::info;

use prople_issuance_core::events::EventBus;

use crate::common::helpers;
use crate::common::types::CommonError;
use crate::config::Agent;
use crate::network::Transport;

use super::context::AgentContext;
use super::inbound;
use super::ledger::MemoryLedger;
use super::memory::MemoryAgent;
use super::store::Store;
use super::types::{did_from_seed, verkey_from_seed};

/// `Builder` starts an agent from its configuration
pub struct Builder {
    cfg: Agent,
    ledger: MemoryLedger,
    transport: Transport,
}

impl Builder {
    pub fn new(cfg: Agent, ledger: MemoryLedger, transport: Transport) -> Self {
        Self {
            cfg,
            ledger,
            transport,
        }
    }

    /// `build` validates the configuration, opens the agent's inboxes and starts its inbound
    /// loops. Must be called from within a tokio runtime
    pub fn build(&self) -> Result<MemoryAgent, CommonError> {
        helpers::validate(self.cfg.to_owned())?;

        let seed = self.cfg.get_public_did_seed();
        let endpoints = self.cfg.get_endpoints();
        let (wallet_id, _) = self.cfg.get_wallet().get();

        let mut inboxes = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints.iter() {
            match self.transport.register(endpoint) {
                Ok(inbox) => inboxes.push(inbox),
                Err(err) => {
                    for registered in endpoints.iter().take(inboxes.len()) {
                        let _ = self.transport.unregister(registered);
                    }

                    return Err(CommonError::AgentError(err.to_string()));
                }
            }
        }

        let ctx = Arc::new(AgentContext {
            label: self.cfg.get_label(),
            wallet_id,
            did: did_from_seed(&seed),
            verkey: verkey_from_seed(&seed),
            endpoints,
            auto_accept_connections: self.cfg.get_auto_accept_connections(),
            auto_accept_credentials: self.cfg.get_auto_accept_credentials(),
            store: Store::default(),
            transport: self.transport.clone(),
            ledger: self.ledger.clone(),
            events: EventBus::new(),
        });

        for inbox in inboxes {
            inbound::spawn(ctx.clone(), inbox);
        }

        info!(
            "agent started: {}, did: {}, endpoint: {}, ledger: {}",
            ctx.label,
            ctx.did,
            ctx.endpoint(),
            ctx.ledger.get_id()
        );

        Ok(MemoryAgent::new(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::with_tokio::tokio;

    use prople_issuance_core::agent::types::{AgentBuilder, AgentError};
    use prople_issuance_core::connection::types::{DidExchangeRole, DidExchangeState};
    use prople_issuance_core::events::Event;
    use prople_issuance_core::oob::types::OutOfBandAPI;

    use crate::agent::testing::{
        agent_config, connect, is_connection, wait_for, Network, HOLDER_SEED, ISSUER_SEED,
    };

    #[tokio::test]
    async fn test_build_invalid_config() {
        let network = Network::new();
        let cfg = agent_config("issuer", "too-short", true, "always");

        let agent = Builder::new(cfg, network.ledger.clone(), network.transport.clone()).build();
        assert!(matches!(agent, Err(CommonError::ValidationError(_))))
    }

    #[tokio::test]
    async fn test_build_duplicate_endpoint() {
        let network = Network::new();
        let issuer = network.issuer("always");
        assert_eq!(issuer.get_did(), "MDAwMDAwMDBJc3N1ZXIwMQ");
        assert_eq!(issuer.get_endpoint(), "memory://issuer");
        assert_eq!(issuer.get_wallet_id(), "issuer-wallet");

        let cfg = agent_config("issuer", ISSUER_SEED, true, "always");
        let duplicate = Builder::new(cfg, network.ledger.clone(), network.transport.clone()).build();
        assert!(matches!(duplicate, Err(CommonError::AgentError(_))))
    }

    #[tokio::test]
    async fn test_connection_handshake() {
        let network = Network::new();
        let issuer = network.issuer("content-approved");
        let holder = network.holder("content-approved");

        let (issuer_connection, holder_connection) = connect(&issuer, &holder).await;

        let issuer_record = issuer.connections().get_by_id(&issuer_connection).await.unwrap();
        assert_eq!(issuer_record.get_role(), DidExchangeRole::Responder);
        assert_eq!(issuer_record.get_state(), DidExchangeState::Completed);
        assert_eq!(issuer_record.get_their_label(), Some(&"holder".to_string()));
        assert_eq!(
            issuer_record.get_their_endpoint(),
            Some(&"memory://holder".to_string())
        );

        let holder_record = holder.connections().get_by_id(&holder_connection).await.unwrap();
        assert_eq!(holder_record.get_role(), DidExchangeRole::Requester);
        assert_eq!(holder_record.get_state(), DidExchangeState::Completed);
        assert_eq!(holder_record.get_their_label(), Some(&"issuer".to_string()));
        assert_eq!(holder_record.get_thread_id(), issuer_record.get_thread_id())
    }

    #[tokio::test]
    async fn test_manual_connection_accept() {
        let network = Network::new();
        let issuer = network.start(agent_config("issuer", ISSUER_SEED, false, "never"));
        let holder = network.start(agent_config("holder", HOLDER_SEED, true, "never"));

        let mut issuer_events = issuer.events().subscribe();
        let invitation = issuer.oob().create_invitation().await.unwrap();
        let url = invitation
            .get_invitation()
            .to_url("https://example.org")
            .unwrap();

        let handle = holder.oob().receive_invitation_from_url(url).await.unwrap();
        let requested = handle.connection_record.unwrap();
        assert_eq!(requested.get_state(), DidExchangeState::RequestSent);
        assert_eq!(requested.get_out_of_band_id(), Some(&handle.out_of_band_record.get_id()));

        let received = wait_for(&mut issuer_events, |event| {
            is_connection(event, DidExchangeState::RequestReceived)
        })
        .await;

        let record = match received {
            Event::ConnectionStateChanged(payload) => payload.connection_record,
            _ => unreachable!(),
        };
        assert_eq!(record.get_out_of_band_id(), Some(&invitation.get_id()));

        let accepted = issuer.connections().accept_request(&record.get_id()).await;
        assert_eq!(accepted.unwrap().get_state(), DidExchangeState::ResponseSent);

        let _ = wait_for(&mut issuer_events, |event| {
            is_connection(event, DidExchangeState::Completed)
        })
        .await;

        let again = issuer.connections().accept_request(&record.get_id()).await;
        assert!(matches!(again, Err(AgentError::InvalidState(_))))
    }

    #[tokio::test]
    async fn test_invalid_invitation_url() {
        let network = Network::new();
        let holder = network.holder("always");

        let handle = holder
            .oob()
            .receive_invitation_from_url("https://example.org?foo=bar".to_string())
            .await;
        assert!(matches!(handle, Err(AgentError::InvalidInvitation(_))))
    }

    #[tokio::test]
    async fn test_unreachable_inviter() {
        let network = Network::new();
        let issuer = network.issuer("always");
        let holder = network.holder("always");

        let invitation = issuer.oob().create_invitation().await.unwrap();
        let url = invitation
            .get_invitation()
            .to_url("https://example.org")
            .unwrap();

        issuer.shutdown().unwrap();

        let handle = holder.oob().receive_invitation_from_url(url).await;
        assert!(matches!(handle, Err(AgentError::TransportError(_))));

        let connections = holder.connections().find_all().await;
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].get_state(), DidExchangeState::Abandoned)
    }

    #[tokio::test]
    async fn test_shutdown_twice() {
        let network = Network::new();
        let issuer = network.issuer("always");

        assert!(issuer.shutdown().is_ok());
        assert!(issuer.shutdown().is_ok());

        let rebuilt = Builder::new(
            agent_config("issuer", ISSUER_SEED, true, "always"),
            network.ledger.clone(),
            network.transport.clone(),
        )
        .build();
        assert!(rebuilt.is_ok())
    }
}
