use rst_common::standard::uuid::Uuid;

use prople_issuance_core::agent::types::AgentError;
use prople_issuance_core::events::EventBus;

use crate::network::{Envelope, Message, Transport};

use super::ledger::MemoryLedger;
use super::store::Store;
use super::types::AutoAcceptCredential;

/// `AgentContext` is the state shared by all modules of the same agent
pub(crate) struct AgentContext {
    pub(crate) label: String,
    pub(crate) wallet_id: String,
    pub(crate) did: String,
    pub(crate) verkey: String,
    pub(crate) endpoints: Vec<String>,
    pub(crate) auto_accept_connections: bool,
    pub(crate) auto_accept_credentials: AutoAcceptCredential,
    pub(crate) store: Store,
    pub(crate) transport: Transport,
    pub(crate) ledger: MemoryLedger,
    pub(crate) events: EventBus,
}

impl AgentContext {
    /// the endpoint advertised to peers, always the first configured one
    pub(crate) fn endpoint(&self) -> &str {
        self.endpoints.first().map(|e| e.as_str()).unwrap_or_default()
    }

    pub(crate) fn send(
        &self,
        to: &str,
        thread_id: &str,
        connection_thread_id: &str,
        message: Message,
    ) -> Result<(), AgentError> {
        let envelope = Envelope {
            thread_id: thread_id.to_string(),
            connection_thread_id: connection_thread_id.to_string(),
            sender_endpoint: self.endpoint().to_string(),
            message,
        };

        self.transport.send(to, envelope)
    }
}

pub(crate) fn generate_thread_id() -> String {
    Uuid::new_v4().to_string()
}
