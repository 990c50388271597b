use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::info;

use prople_issuance_core::agent::types::AgentError;
use prople_issuance_core::oob::types::{
    ConnectionHandle, OutOfBandAPI, OutOfBandRole, OutOfBandState,
};
use prople_issuance_core::oob::{OutOfBandInvitation, OutOfBandRecord, OutOfBandService};

use super::connections::ConnectionModule;
use super::context::AgentContext;

#[derive(Clone)]
pub struct OutOfBandModule {
    ctx: Arc<AgentContext>,
}

impl OutOfBandModule {
    pub(crate) fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl OutOfBandAPI for OutOfBandModule {
    async fn create_invitation(&self) -> Result<OutOfBandRecord, AgentError> {
        let services = self
            .ctx
            .endpoints
            .iter()
            .map(|endpoint| OutOfBandService::new(vec![self.ctx.verkey.clone()], endpoint.clone()))
            .collect();

        let invitation = OutOfBandInvitation::new(self.ctx.label.clone(), services);
        let record = OutOfBandRecord::new(
            OutOfBandRole::Sender,
            OutOfBandState::AwaitResponse,
            invitation,
        );

        info!(
            "[{}] invitation created: {}",
            self.ctx.label,
            record.get_id().as_str()
        );

        self.ctx.store.save_out_of_band(record.clone()).await;
        Ok(record)
    }

    async fn receive_invitation_from_url(
        &self,
        url: String,
    ) -> Result<ConnectionHandle, AgentError> {
        let invitation = OutOfBandInvitation::from_url(&url)
            .map_err(|err| AgentError::InvalidInvitation(err.to_string()))?;

        if invitation.get_services().is_empty() {
            return Err(AgentError::InvalidInvitation(
                "invitation doesn't contain any service".to_string(),
            ));
        }

        let record = OutOfBandRecord::new(
            OutOfBandRole::Receiver,
            OutOfBandState::PrepareResponse,
            invitation,
        );

        info!(
            "[{}] invitation received from {}",
            self.ctx.label,
            record.get_invitation().get_label()
        );

        self.ctx.store.save_out_of_band(record.clone()).await;

        if record.get_invitation().get_handshake_protocols().is_empty() {
            return Ok(ConnectionHandle {
                out_of_band_record: record,
                connection_record: None,
            });
        }

        let connection = ConnectionModule::new(self.ctx.clone())
            .request(&record)
            .await?;

        Ok(ConnectionHandle {
            out_of_band_record: record,
            connection_record: Some(connection),
        })
    }
}
