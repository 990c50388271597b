//! `network` is an in-process transport, each agent endpoint owns an inbox fed by the others
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use prople_issuance_core::agent::types::AgentError;
use prople_issuance_core::credential::types::{
    CredentialPreviewAttribute, CredentialProtocolVersion,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", tag = "@type", rename_all = "kebab-case")]
pub enum Message {
    DidExchangeRequest {
        invitation_id: String,
        label: String,
    },
    DidExchangeResponse {
        label: String,
    },
    DidExchangeComplete,
    CredentialOffer {
        protocol_version: CredentialProtocolVersion,
        credential_definition_id: String,
        attributes: Vec<CredentialPreviewAttribute>,
        comment: Option<String>,
    },
    CredentialRequest,
    CredentialIssue {
        credential_definition_id: String,
        attributes: Vec<CredentialPreviewAttribute>,
    },
    CredentialAck,
}

/// `Envelope` wraps a [`Message`] with its routing data
///
/// The `connection_thread_id` is the DID exchange thread shared by both sides of a connection,
/// the `thread_id` identifies the protocol instance the message belongs to. Both are the same
/// for the DID exchange messages
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct Envelope {
    pub thread_id: String,
    pub connection_thread_id: String,
    pub sender_endpoint: String,
    pub message: Message,
}

/// `Transport` routes envelopes to the inbox registered for their endpoint
#[derive(Clone, Debug, Default)]
pub struct Transport {
    inboxes: Arc<RwLock<HashMap<String, UnboundedSender<Envelope>>>>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `register` opens the inbox of the given endpoint, an endpoint can only be owned once
    pub fn register(&self, endpoint: &str) -> Result<UnboundedReceiver<Envelope>, AgentError> {
        let mut inboxes = self
            .inboxes
            .write()
            .map_err(|err| AgentError::TransportError(err.to_string()))?;

        if inboxes.contains_key(endpoint) {
            return Err(AgentError::TransportError(format!(
                "endpoint already registered: {}",
                endpoint
            )));
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        inboxes.insert(endpoint.to_string(), sender);
        Ok(receiver)
    }

    /// `unregister` closes the endpoint's inbox, ending its owner's inbound loop
    pub fn unregister(&self, endpoint: &str) -> Result<(), AgentError> {
        let mut inboxes = self
            .inboxes
            .write()
            .map_err(|err| AgentError::TransportError(err.to_string()))?;

        let _ = inboxes.remove(endpoint);
        Ok(())
    }

    pub fn send(&self, endpoint: &str, envelope: Envelope) -> Result<(), AgentError> {
        let inboxes = self
            .inboxes
            .read()
            .map_err(|err| AgentError::TransportError(err.to_string()))?;

        let inbox = inboxes.get(endpoint).ok_or_else(|| {
            AgentError::TransportError(format!("unreachable endpoint: {}", endpoint))
        })?;

        debug!("sending message to {}: {:?}", endpoint, envelope.message);
        inbox
            .send(envelope)
            .map_err(|err| AgentError::TransportError(err.to_string()))
    }
}
