use std::collections::BTreeSet;
use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, info};

use prople_issuance_core::agent::types::AgentError;
use prople_issuance_core::connection::ConnectionRecord;
use prople_issuance_core::credential::types::{
    AcceptOfferParams, CredentialAPI, CredentialPreviewAttribute, CredentialProtocolVersion,
    CredentialRecordID, CredentialState, OfferCredentialParams,
};
use prople_issuance_core::credential::CredentialExchangeRecord;
use prople_issuance_core::events::Event;

use crate::network::Message;

use super::context::{generate_thread_id, AgentContext};

/// `CredentialModule` runs the issue credential protocol
///
/// ```text
/// Issuer                                  Holder
/// offer-sent          --- offer   --->    offer-received
/// request-received    <--- request ---    request-sent
/// credential-issued   --- issue   --->    credential-received
/// done                <--- ack     ---    done
/// ```
#[derive(Clone)]
pub struct CredentialModule {
    ctx: Arc<AgentContext>,
}

impl CredentialModule {
    pub(crate) fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }

    pub async fn find_all(&self) -> Vec<CredentialExchangeRecord> {
        self.ctx.store.list_credentials().await
    }

    /// `accept_request` used by the issuer to issue the credential of a received request
    pub async fn accept_request(
        &self,
        id: &CredentialRecordID,
    ) -> Result<CredentialExchangeRecord, AgentError> {
        let record = self.ctx.store.get_credential(id).await?;
        let connection = self.connection_of(&record).await?;

        let credential_definition_id = record
            .get_credential_definition_id()
            .cloned()
            .ok_or_else(|| {
                AgentError::InvalidCredentialFormat(format!(
                    "credential {} has no credential definition",
                    id.as_str()
                ))
            })?;

        let record = self
            .transition(
                id,
                Some(CredentialState::RequestReceived),
                CredentialState::CredentialIssued,
            )
            .await?;

        self.send_or_abandon(
            &record,
            &connection,
            Message::CredentialIssue {
                credential_definition_id,
                attributes: record.get_credential_attributes().clone(),
            },
        )
        .await?;

        Ok(record)
    }

    /// `accept_credential` used by the holder to store a received credential and to acknowledge
    /// it to the issuer
    pub async fn accept_credential(
        &self,
        id: &CredentialRecordID,
    ) -> Result<CredentialExchangeRecord, AgentError> {
        let record = self.ctx.store.get_credential(id).await?;
        let connection = self.connection_of(&record).await?;

        let record = self
            .transition(
                id,
                Some(CredentialState::CredentialReceived),
                CredentialState::Done,
            )
            .await?;

        info!(
            "[{}] credential stored: {}",
            self.ctx.label,
            record.get_id().as_str()
        );

        let (endpoint, connection_thread_id) = Self::routing(&connection)?;
        self.ctx.send(
            &endpoint,
            record.get_thread_id(),
            &connection_thread_id,
            Message::CredentialAck,
        )?;

        Ok(record)
    }

    pub(crate) async fn process_offer(
        &self,
        thread_id: String,
        connection_thread_id: String,
        protocol_version: CredentialProtocolVersion,
        credential_definition_id: String,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Result<(), AgentError> {
        let connection = self
            .ctx
            .store
            .find_connection_by_thread(&connection_thread_id)
            .await?;

        if !connection.is_ready() {
            return Err(AgentError::InvalidState(format!(
                "offer received through an incomplete connection: {}",
                connection.get_id().as_str()
            )));
        }

        let record = CredentialExchangeRecord::new(
            connection.get_id(),
            thread_id,
            CredentialState::OfferReceived,
            protocol_version,
        )
        .with_credential_definition_id(credential_definition_id)
        .with_credential_attributes(attributes);

        let id = record.get_id();
        info!(
            "[{}] credential offer received: {}",
            self.ctx.label,
            id.as_str()
        );

        self.ctx.store.save_credential(record.clone()).await;
        self.ctx.events.emit(Event::credential_state_changed(record, None));

        if self.ctx.auto_accept_credentials.accepts_offer() {
            self.accept_offer(AcceptOfferParams::new(id)).await?;
        }

        Ok(())
    }

    pub(crate) async fn process_request(&self, thread_id: String) -> Result<(), AgentError> {
        let record = self.ctx.store.find_credential_by_thread(&thread_id).await?;
        let id = record.get_id();

        let _ = self
            .transition(
                &id,
                Some(CredentialState::OfferSent),
                CredentialState::RequestReceived,
            )
            .await?;

        if self.ctx.auto_accept_credentials.accepts_request() {
            let _ = self.accept_request(&id).await?;
        }

        Ok(())
    }

    pub(crate) async fn process_issue(
        &self,
        thread_id: String,
        credential_definition_id: String,
    ) -> Result<(), AgentError> {
        let record = self.ctx.store.find_credential_by_thread(&thread_id).await?;
        let id = record.get_id();

        if record.get_credential_definition_id() != Some(&credential_definition_id) {
            return Err(AgentError::InvalidCredentialFormat(format!(
                "issued credential doesn't match the offered definition: {}",
                credential_definition_id
            )));
        }

        let _ = self
            .transition(
                &id,
                Some(CredentialState::RequestSent),
                CredentialState::CredentialReceived,
            )
            .await?;

        if self.ctx.auto_accept_credentials.accepts_credential() {
            let _ = self.accept_credential(&id).await?;
        }

        Ok(())
    }

    pub(crate) async fn process_ack(&self, thread_id: String) -> Result<(), AgentError> {
        let record = self.ctx.store.find_credential_by_thread(&thread_id).await?;
        let record = self
            .transition(
                &record.get_id(),
                Some(CredentialState::CredentialIssued),
                CredentialState::Done,
            )
            .await?;

        info!(
            "[{}] credential exchange done: {}",
            self.ctx.label,
            record.get_id().as_str()
        );

        Ok(())
    }

    /// the offered attribute names must be exactly the ones of the definition's schema
    async fn validate_offer(&self, params: &OfferCredentialParams) -> Result<(), AgentError> {
        let indy = &params.credential_formats.indy;
        let definition = self
            .ctx
            .ledger
            .read_credential_definition(&indy.credential_definition_id)
            .await?;

        let schema = self.ctx.ledger.read_schema(&definition.schema_id).await?;

        let offered: BTreeSet<&String> = indy.attributes.iter().map(|attr| &attr.name).collect();
        let expected: BTreeSet<&String> = schema.attr_names.iter().collect();

        if offered != expected || offered.len() != indy.attributes.len() {
            return Err(AgentError::InvalidCredentialFormat(format!(
                "offered attributes don't match schema {}",
                schema.id
            )));
        }

        Ok(())
    }

    async fn connection_of(
        &self,
        record: &CredentialExchangeRecord,
    ) -> Result<ConnectionRecord, AgentError> {
        self.ctx.store.get_connection(record.get_connection_id()).await
    }

    async fn send_or_abandon(
        &self,
        record: &CredentialExchangeRecord,
        connection: &ConnectionRecord,
        message: Message,
    ) -> Result<(), AgentError> {
        let (endpoint, connection_thread_id) = Self::routing(connection)?;
        let sent = self.ctx.send(
            &endpoint,
            record.get_thread_id(),
            &connection_thread_id,
            message,
        );

        if let Err(err) = sent {
            let _ = self
                .transition(&record.get_id(), None, CredentialState::Abandoned)
                .await;
            return Err(err);
        }

        Ok(())
    }

    async fn transition(
        &self,
        id: &CredentialRecordID,
        expected: Option<CredentialState>,
        state: CredentialState,
    ) -> Result<CredentialExchangeRecord, AgentError> {
        let (record, previous) = self
            .ctx
            .store
            .update_credential_state(id, expected, state)
            .await?;

        debug!(
            "[{}] credential {}: {:?} -> {:?}",
            self.ctx.label,
            id.as_str(),
            previous,
            state
        );

        self.ctx.events.emit(Event::credential_state_changed(
            record.clone(),
            Some(previous),
        ));

        Ok(record)
    }

    fn routing(connection: &ConnectionRecord) -> Result<(String, String), AgentError> {
        match (connection.get_their_endpoint(), connection.get_thread_id()) {
            (Some(endpoint), Some(thread_id)) => Ok((endpoint.clone(), thread_id.clone())),
            _ => Err(AgentError::InvalidState(format!(
                "connection {} can't be routed",
                connection.get_id().as_str()
            ))),
        }
    }
}

#[async_trait]
impl CredentialAPI for CredentialModule {
    async fn offer_credential(&self, params: OfferCredentialParams) -> Result<(), AgentError> {
        let connection = self.ctx.store.get_connection(&params.connection_id).await?;
        if !connection.is_ready() {
            return Err(AgentError::InvalidState(format!(
                "connection {} is not completed",
                connection.get_id().as_str()
            )));
        }

        self.validate_offer(&params).await?;

        let indy = params.credential_formats.indy;
        let record = CredentialExchangeRecord::new(
            connection.get_id(),
            generate_thread_id(),
            CredentialState::OfferSent,
            params.protocol_version,
        )
        .with_credential_definition_id(indy.credential_definition_id.clone())
        .with_credential_attributes(indy.attributes.clone());

        info!(
            "[{}] offering credential {} through {}",
            self.ctx.label,
            record.get_id().as_str(),
            connection.get_id().as_str()
        );

        self.ctx.store.save_credential(record.clone()).await;
        self.ctx
            .events
            .emit(Event::credential_state_changed(record.clone(), None));

        self.send_or_abandon(
            &record,
            &connection,
            Message::CredentialOffer {
                protocol_version: params.protocol_version,
                credential_definition_id: indy.credential_definition_id,
                attributes: indy.attributes,
                comment: params.comment,
            },
        )
        .await
    }

    async fn accept_offer(&self, params: AcceptOfferParams) -> Result<(), AgentError> {
        let id = params.credential_record_id;
        let record = self.ctx.store.get_credential(&id).await?;
        let connection = self.connection_of(&record).await?;

        let record = self
            .transition(
                &id,
                Some(CredentialState::OfferReceived),
                CredentialState::RequestSent,
            )
            .await?;

        self.send_or_abandon(&record, &connection, Message::CredentialRequest)
            .await
    }

    async fn get_by_id(
        &self,
        id: CredentialRecordID,
    ) -> Result<CredentialExchangeRecord, AgentError> {
        self.ctx.store.get_credential(&id).await
    }
}
