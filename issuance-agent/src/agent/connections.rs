use std::sync::Arc;

use rst_common::with_logging::log::{debug, info};

use prople_issuance_core::agent::types::AgentError;
use prople_issuance_core::connection::types::{ConnectionID, DidExchangeRole, DidExchangeState};
use prople_issuance_core::connection::ConnectionRecord;
use prople_issuance_core::events::Event;
use prople_issuance_core::oob::types::OutOfBandState;
use prople_issuance_core::oob::OutOfBandRecord;

use crate::network::Message;

use super::context::{generate_thread_id, AgentContext};

/// `ConnectionModule` runs the DID exchange protocol
///
/// ```text
/// Requester                               Responder
/// invitation-received
/// request-sent       --- request  --->    request-received
/// response-received  <--- response ---   response-sent
/// completed          --- complete --->    completed
/// ```
///
/// The responder answers a request on its own only when its connections are auto accepted,
/// otherwise [`ConnectionModule::accept_request`] must be called
#[derive(Clone)]
pub struct ConnectionModule {
    ctx: Arc<AgentContext>,
}

impl ConnectionModule {
    pub(crate) fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }

    pub async fn get_by_id(&self, id: &ConnectionID) -> Result<ConnectionRecord, AgentError> {
        self.ctx.store.get_connection(id).await
    }

    pub async fn find_all(&self) -> Vec<ConnectionRecord> {
        self.ctx.store.list_connections().await
    }

    /// `accept_request` answers a received connection request
    pub async fn accept_request(&self, id: &ConnectionID) -> Result<ConnectionRecord, AgentError> {
        let record = self.ctx.store.get_connection(id).await?;
        if record.get_role() != DidExchangeRole::Responder {
            return Err(AgentError::InvalidState(format!(
                "connection {} is not a responder",
                id.as_str()
            )));
        }

        let (endpoint, thread_id) = Self::routing(&record)?;
        let record = self
            .transition(
                id,
                Some(DidExchangeState::RequestReceived),
                DidExchangeState::ResponseSent,
            )
            .await?;

        let sent = self.ctx.send(
            &endpoint,
            &thread_id,
            &thread_id,
            Message::DidExchangeResponse {
                label: self.ctx.label.clone(),
            },
        );

        if let Err(err) = sent {
            let _ = self.abandon(id).await;
            return Err(err);
        }

        Ok(record)
    }

    /// `request` starts the protocol as the requester, for a received invitation
    pub(crate) async fn request(
        &self,
        out_of_band: &OutOfBandRecord,
    ) -> Result<ConnectionRecord, AgentError> {
        let invitation = out_of_band.get_invitation();
        let service = invitation.get_services().first().ok_or_else(|| {
            AgentError::InvalidInvitation("invitation doesn't contain any service".to_string())
        })?;

        let endpoint = service.get_service_endpoint().clone();
        let thread_id = generate_thread_id();

        let record = ConnectionRecord::new(
            DidExchangeRole::Requester,
            DidExchangeState::InvitationReceived,
        )
        .with_out_of_band_id(out_of_band.get_id())
        .with_their_label(invitation.get_label().clone())
        .with_their_endpoint(endpoint.clone())
        .with_thread_id(thread_id.clone());

        let id = record.get_id();
        self.ctx.store.save_connection(record.clone()).await;
        self.ctx.events.emit(Event::connection_state_changed(record, None));

        let record = self
            .transition(
                &id,
                Some(DidExchangeState::InvitationReceived),
                DidExchangeState::RequestSent,
            )
            .await?;

        let sent = self.ctx.send(
            &endpoint,
            &thread_id,
            &thread_id,
            Message::DidExchangeRequest {
                invitation_id: invitation.get_id().clone(),
                label: self.ctx.label.clone(),
            },
        );

        if let Err(err) = sent {
            let _ = self.abandon(&id).await;
            return Err(err);
        }

        Ok(record)
    }

    pub(crate) async fn process_request(
        &self,
        sender_endpoint: String,
        thread_id: String,
        invitation_id: String,
        label: String,
    ) -> Result<(), AgentError> {
        let out_of_band = self
            .ctx
            .store
            .find_out_of_band_by_invitation(&invitation_id)
            .await?;

        let record = ConnectionRecord::new(
            DidExchangeRole::Responder,
            DidExchangeState::RequestReceived,
        )
        .with_out_of_band_id(out_of_band.get_id())
        .with_their_label(label)
        .with_their_endpoint(sender_endpoint)
        .with_thread_id(thread_id);

        let id = record.get_id();
        info!(
            "[{}] connection request received: {}",
            self.ctx.label,
            id.as_str()
        );

        self.ctx.store.save_connection(record.clone()).await;
        self.ctx.events.emit(Event::connection_state_changed(record, None));

        if self.ctx.auto_accept_connections {
            let _ = self.accept_request(&id).await?;
        }

        Ok(())
    }

    pub(crate) async fn process_response(&self, thread_id: String) -> Result<(), AgentError> {
        let record = self.ctx.store.find_connection_by_thread(&thread_id).await?;
        let id = record.get_id();
        let (endpoint, _) = Self::routing(&record)?;

        let _ = self
            .transition(
                &id,
                Some(DidExchangeState::RequestSent),
                DidExchangeState::ResponseReceived,
            )
            .await?;

        let record = self
            .transition(
                &id,
                Some(DidExchangeState::ResponseReceived),
                DidExchangeState::Completed,
            )
            .await?;

        self.close_invitation(&record).await?;
        self.ctx.send(
            &endpoint,
            &thread_id,
            &thread_id,
            Message::DidExchangeComplete,
        )
    }

    pub(crate) async fn process_complete(&self, thread_id: String) -> Result<(), AgentError> {
        let record = self.ctx.store.find_connection_by_thread(&thread_id).await?;
        let record = self
            .transition(
                &record.get_id(),
                Some(DidExchangeState::ResponseSent),
                DidExchangeState::Completed,
            )
            .await?;

        info!(
            "[{}] connection completed: {}",
            self.ctx.label,
            record.get_id().as_str()
        );

        self.close_invitation(&record).await
    }

    async fn close_invitation(&self, record: &ConnectionRecord) -> Result<(), AgentError> {
        match record.get_out_of_band_id() {
            Some(id) => {
                let _ = self
                    .ctx
                    .store
                    .update_out_of_band_state(id, OutOfBandState::Done)
                    .await?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn abandon(&self, id: &ConnectionID) -> Result<ConnectionRecord, AgentError> {
        self.transition(id, None, DidExchangeState::Abandoned).await
    }

    async fn transition(
        &self,
        id: &ConnectionID,
        expected: Option<DidExchangeState>,
        state: DidExchangeState,
    ) -> Result<ConnectionRecord, AgentError> {
        let (record, previous) = self
            .ctx
            .store
            .update_connection_state(id, expected, state)
            .await?;

        debug!(
            "[{}] connection {}: {:?} -> {:?}",
            self.ctx.label,
            id.as_str(),
            previous,
            state
        );

        self.ctx.events.emit(Event::connection_state_changed(
            record.clone(),
            Some(previous),
        ));

        Ok(record)
    }

    fn routing(record: &ConnectionRecord) -> Result<(String, String), AgentError> {
        let endpoint = record.get_their_endpoint().cloned().ok_or_else(|| {
            AgentError::InvalidState(format!(
                "connection {} has no endpoint",
                record.get_id().as_str()
            ))
        })?;

        let thread_id = record.get_thread_id().cloned().ok_or_else(|| {
            AgentError::InvalidState(format!(
                "connection {} has no thread",
                record.get_id().as_str()
            ))
        })?;

        Ok((endpoint, thread_id))
    }
}
