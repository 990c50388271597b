use std::sync::Arc;

use rst_common::with_logging::log::{debug, warn};
use rst_common::with_tokio::tokio;
use rst_common::with_tokio::tokio::sync::mpsc::UnboundedReceiver;

use prople_issuance_core::agent::types::AgentError;

use crate::network::{Envelope, Message};

use super::connections::ConnectionModule;
use super::context::AgentContext;
use super::credentials::CredentialModule;

/// `spawn` runs the agent's inbound loop, messages are processed one at a time in their
/// arrival order. The loop ends once the inbox is closed
pub(crate) fn spawn(ctx: Arc<AgentContext>, mut inbox: UnboundedReceiver<Envelope>) {
    let _ = tokio::spawn(async move {
        while let Some(envelope) = inbox.recv().await {
            if let Err(err) = dispatch(ctx.clone(), envelope).await {
                warn!("[{}] inbound message dropped: {}", ctx.label, err)
            }
        }

        debug!("[{}] inbox closed", ctx.label)
    });
}

async fn dispatch(ctx: Arc<AgentContext>, envelope: Envelope) -> Result<(), AgentError> {
    let connections = ConnectionModule::new(ctx.clone());
    let credentials = CredentialModule::new(ctx);

    let Envelope {
        thread_id,
        connection_thread_id,
        sender_endpoint,
        message,
    } = envelope;

    match message {
        Message::DidExchangeRequest {
            invitation_id,
            label,
        } => {
            connections
                .process_request(sender_endpoint, thread_id, invitation_id, label)
                .await
        }
        Message::DidExchangeResponse { .. } => connections.process_response(thread_id).await,
        Message::DidExchangeComplete => connections.process_complete(thread_id).await,
        Message::CredentialOffer {
            protocol_version,
            credential_definition_id,
            attributes,
            ..
        } => {
            credentials
                .process_offer(
                    thread_id,
                    connection_thread_id,
                    protocol_version,
                    credential_definition_id,
                    attributes,
                )
                .await
        }
        Message::CredentialRequest => credentials.process_request(thread_id).await,
        Message::CredentialIssue {
            credential_definition_id,
            ..
        } => {
            credentials
                .process_issue(thread_id, credential_definition_id)
                .await
        }
        Message::CredentialAck => credentials.process_ack(thread_id).await,
    }
}
