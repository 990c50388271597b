use std::time::Duration;

use rst_common::with_tokio::tokio;
use rst_common::with_tokio::tokio::sync::broadcast::Receiver;

use prople_issuance_core::agent::types::AgentBuilder;
use prople_issuance_core::connection::types::{ConnectionID, DidExchangeState};
use prople_issuance_core::events::Event;
use prople_issuance_core::ledger::types::{
    CredentialDefinition, CredentialDefinitionTemplate, LedgerAPI, SchemaTemplate,
};
use prople_issuance_core::oob::types::OutOfBandAPI;

use crate::config::Agent;
use crate::network::Transport;

use super::{Builder, MemoryAgent, MemoryLedger};

pub(crate) const ISSUER_SEED: &str = "000000000000000000000000Issuer01";
pub(crate) const HOLDER_SEED: &str = "000000000000000000000000Holder01";

pub(crate) fn agent_config(
    label: &str,
    seed: &str,
    auto_accept_connections: bool,
    auto_accept_credentials: &str,
) -> Agent {
    let raw = format!(
        r#"
label = "{label}"
public_did_seed = "{seed}"
endpoints = ["memory://{label}"]
auto_accept_connections = {auto_accept_connections}
auto_accept_credentials = "{auto_accept_credentials}"

[wallet]
id = "{label}-wallet"
key = "{label}-wallet-key"
"#
    );

    toml::from_str(&raw).unwrap()
}

pub(crate) struct Network {
    pub(crate) ledger: MemoryLedger,
    pub(crate) transport: Transport,
}

impl Network {
    pub(crate) fn new() -> Self {
        Self {
            ledger: MemoryLedger::new("test-ledger".to_string(), false),
            transport: Transport::new(),
        }
    }

    pub(crate) fn start(&self, cfg: Agent) -> MemoryAgent {
        Builder::new(cfg, self.ledger.clone(), self.transport.clone())
            .build()
            .unwrap()
    }

    pub(crate) fn issuer(&self, auto_accept_credentials: &str) -> MemoryAgent {
        self.start(agent_config(
            "issuer",
            ISSUER_SEED,
            true,
            auto_accept_credentials,
        ))
    }

    pub(crate) fn holder(&self, auto_accept_credentials: &str) -> MemoryAgent {
        self.start(agent_config(
            "holder",
            HOLDER_SEED,
            true,
            auto_accept_credentials,
        ))
    }
}

pub(crate) async fn wait_for<F>(receiver: &mut Receiver<Event>, predicate: F) -> Event
where
    F: Fn(&Event) -> bool,
{
    let waiting = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = receiver.recv().await.unwrap();
            if predicate(&event) {
                return event;
            }
        }
    });

    waiting.await.unwrap()
}

pub(crate) fn is_connection(event: &Event, state: DidExchangeState) -> bool {
    match event {
        Event::ConnectionStateChanged(payload) => payload.connection_record.get_state() == state,
        _ => false,
    }
}

/// connects both agents through a fresh invitation, returning the issuer and holder side
/// connection ids
pub(crate) async fn connect(
    issuer: &MemoryAgent,
    holder: &MemoryAgent,
) -> (ConnectionID, ConnectionID) {
    let mut issuer_events = issuer.events().subscribe();
    let mut holder_events = holder.events().subscribe();

    let invitation = issuer.oob().create_invitation().await.unwrap();
    let url = invitation
        .get_invitation()
        .to_url("https://example.org")
        .unwrap();

    let handle = holder.oob().receive_invitation_from_url(url).await.unwrap();
    let holder_connection = handle.connection_record.unwrap().get_id();

    let completed = wait_for(&mut issuer_events, |event| {
        is_connection(event, DidExchangeState::Completed)
    })
    .await;

    let issuer_connection = match completed {
        Event::ConnectionStateChanged(payload) => payload.connection_record.get_id(),
        _ => unreachable!(),
    };

    let _ = wait_for(&mut holder_events, |event| {
        is_connection(event, DidExchangeState::Completed)
    })
    .await;

    (issuer_connection, holder_connection)
}

pub(crate) async fn publish(issuer: &MemoryAgent) -> CredentialDefinition {
    let schema = issuer
        .ledger()
        .register_schema(SchemaTemplate::new(
            "Identity",
            "6.0",
            vec!["name".to_string(), "age".to_string()],
        ))
        .await
        .unwrap();

    issuer
        .ledger()
        .register_credential_definition(CredentialDefinitionTemplate::new(schema, false, "default"))
        .await
        .unwrap()
}
