use std::sync::Arc;
use std::time::Duration;

use rst_common::with_logging::log::{debug, info, warn};
use rst_common::with_tokio::tokio;
use rst_common::with_tokio::tokio::sync::{oneshot, watch};

use crate::agent::types::AgentBuilder;
use crate::connection::types::ConnectionID;
use crate::connection::ConnectionListener;
use crate::credential::types::{
    CredentialAPI, CredentialFormats, CredentialState, OfferCredentialParams,
};
use crate::credential::{AcceptPolicy, CredentialExchangeRecord, CredentialListener};
use crate::events::{Event, EventType, ListenerHandle};
use crate::ledger::types::{
    CredentialDefinition, CredentialDefinitionTemplate, LedgerAPI, Schema,
};
use crate::oob::types::OutOfBandAPI;
use crate::oob::OutOfBandRecord;

use super::types::{IssuanceError, IssuanceOutcome, IssuanceParams, IssuanceState};

#[derive(Default)]
struct Progress {
    out_of_band_record: Option<OutOfBandRecord>,
    invitation_url: Option<String>,
    pending_connection: Option<oneshot::Receiver<ConnectionID>>,
    connection_id: Option<ConnectionID>,
    schema: Option<Schema>,
    credential_definition: Option<CredentialDefinition>,
    settled: Option<watch::Receiver<Option<CredentialExchangeRecord>>>,
    completed: Option<CredentialExchangeRecord>,
}

/// `Orchestrator` walks an `Issuer` and a `Holder` from no relationship at all up to an
/// offered and accepted credential
///
/// ```text
/// Idle -> InvitationCreated -> AwaitingConnection -> Connected
///      -> SchemaRegistered -> CredentialDefinitionRegistered -> CredentialIssued
/// ```
///
/// Each step is exposed as its own method so the flow can be driven manually, or at once
/// through [`Orchestrator::run`]. Once a step fails the orchestrator stays at the state where
/// it failed and refuses any further step.
pub struct Orchestrator<TIssuer, THolder, TPolicy>
where
    TIssuer: AgentBuilder,
    THolder: AgentBuilder,
    TPolicy: AcceptPolicy + 'static,
{
    issuer: TIssuer,
    holder: THolder,
    policy: Arc<TPolicy>,
    params: IssuanceParams,
    state: watch::Sender<IssuanceState>,
    progress: Progress,
    listeners: Vec<ListenerHandle>,
    listening_offers: bool,
    failed: bool,
}

impl<TIssuer, THolder, TPolicy> Orchestrator<TIssuer, THolder, TPolicy>
where
    TIssuer: AgentBuilder,
    THolder: AgentBuilder,
    TPolicy: AcceptPolicy + 'static,
{
    pub fn new(issuer: TIssuer, holder: THolder, policy: TPolicy, params: IssuanceParams) -> Self {
        let (state, _) = watch::channel(IssuanceState::Idle);

        Self {
            issuer,
            holder,
            policy: Arc::new(policy),
            params,
            state,
            progress: Progress::default(),
            listeners: Vec::new(),
            listening_offers: false,
            failed: false,
        }
    }

    pub fn get_state(&self) -> IssuanceState {
        *self.state.borrow()
    }

    /// `watch_state` gives a receiver notified on every state transition
    pub fn watch_state(&self) -> watch::Receiver<IssuanceState> {
        self.state.subscribe()
    }

    pub fn get_params(&self) -> &IssuanceParams {
        &self.params
    }

    pub fn get_out_of_band_record(&self) -> Option<&OutOfBandRecord> {
        self.progress.out_of_band_record.as_ref()
    }

    pub fn get_invitation_url(&self) -> Option<&String> {
        self.progress.invitation_url.as_ref()
    }

    pub fn get_connection_id(&self) -> Option<&ConnectionID> {
        self.progress.connection_id.as_ref()
    }

    pub fn get_schema(&self) -> Option<&Schema> {
        self.progress.schema.as_ref()
    }

    pub fn get_credential_definition(&self) -> Option<&CredentialDefinition> {
        self.progress.credential_definition.as_ref()
    }

    pub fn outcome(&self) -> IssuanceOutcome {
        IssuanceOutcome {
            state: self.get_state(),
            invitation_url: self.progress.invitation_url.clone(),
            out_of_band_id: self
                .progress
                .out_of_band_record
                .as_ref()
                .map(|record| record.get_id()),
            connection_id: self.progress.connection_id.clone(),
            schema_id: self.progress.schema.as_ref().map(|schema| schema.id.clone()),
            credential_definition_id: self
                .progress
                .credential_definition
                .as_ref()
                .map(|definition| definition.id.clone()),
            credential_record_id: self
                .progress
                .completed
                .as_ref()
                .map(|record| record.get_id()),
            credential_state: self
                .progress
                .completed
                .as_ref()
                .map(|record| record.get_state()),
        }
    }

    /// `setup_credential_listener` registers the holder's [`CredentialListener`], driven by the
    /// orchestrator's accept policy. Calling it more than once is a no-op
    pub fn setup_credential_listener(&mut self) {
        if self.listening_offers {
            return;
        }

        let handle = CredentialListener::new(self.policy.clone())
            .register(&self.holder.events(), self.holder.credentials());

        self.listeners.push(handle);
        self.listening_offers = true;
    }

    pub async fn create_invitation(&mut self) -> Result<String, IssuanceError> {
        self.guard(IssuanceState::Idle, IssuanceState::InvitationCreated)?;

        let result = self.invite().await;
        self.track(result)
    }

    /// `receive_invitation` registers the connection listener on the issuer's bus, scoped to
    /// the created invitation, and only then hands the invitation URL to the holder
    pub async fn receive_invitation(&mut self) -> Result<(), IssuanceError> {
        self.guard(
            IssuanceState::InvitationCreated,
            IssuanceState::AwaitingConnection,
        )?;

        let result = self.connect().await;
        self.track(result)
    }

    pub async fn await_connection(&mut self) -> Result<ConnectionID, IssuanceError> {
        self.guard(IssuanceState::AwaitingConnection, IssuanceState::Connected)?;

        let result = self.wait_connection().await;
        self.track(result)
    }

    pub async fn register_schema(&mut self) -> Result<Schema, IssuanceError> {
        self.guard(IssuanceState::Connected, IssuanceState::SchemaRegistered)?;

        let result = self.publish_schema().await;
        self.track(result)
    }

    pub async fn register_credential_definition(
        &mut self,
    ) -> Result<CredentialDefinition, IssuanceError> {
        self.guard(
            IssuanceState::SchemaRegistered,
            IssuanceState::CredentialDefinitionRegistered,
        )?;

        let result = self.publish_credential_definition().await;
        self.track(result)
    }

    pub async fn issue_credential(&mut self) -> Result<(), IssuanceError> {
        self.guard(
            IssuanceState::CredentialDefinitionRegistered,
            IssuanceState::CredentialIssued,
        )?;

        let result = self.offer().await;
        self.track(result)
    }

    /// `run` executes the whole flow, it's only allowed from [`IssuanceState::Idle`]
    pub async fn run(&mut self) -> Result<IssuanceOutcome, IssuanceError> {
        self.guard(IssuanceState::Idle, IssuanceState::InvitationCreated)?;

        self.setup_credential_listener();
        self.create_invitation().await?;
        self.receive_invitation().await?;
        self.await_connection().await?;
        self.register_schema().await?;
        self.register_credential_definition().await?;
        self.issue_credential().await?;

        Ok(self.outcome())
    }

    /// `await_completion` waits until the issuer side credential exchange on the flow's
    /// connection reaches [`CredentialState::Done`]
    pub async fn await_completion(
        &mut self,
        duration: Duration,
    ) -> Result<CredentialExchangeRecord, IssuanceError> {
        if self.get_state() != IssuanceState::CredentialIssued {
            return Err(IssuanceError::NotIssued);
        }

        if let Some(record) = &self.progress.completed {
            return Ok(record.clone());
        }

        let receiver = self
            .progress
            .settled
            .as_mut()
            .ok_or(IssuanceError::NotIssued)?;

        let settled = {
            let observed = tokio::time::timeout(duration, receiver.wait_for(Option::is_some)).await;
            match observed {
                Ok(Ok(record)) => record.clone(),
                Ok(Err(_)) => return Err(IssuanceError::ListenerClosed),
                Err(_) => return Err(IssuanceError::CompletionTimeout(format!("{:?}", duration))),
            }
        };

        let record = settled.ok_or(IssuanceError::ListenerClosed)?;
        if record.get_state() != CredentialState::Done {
            return Err(IssuanceError::CredentialRejected(
                record.get_id().as_str().to_string(),
            ));
        }

        info!(
            "credential exchange completed: {}",
            record.get_id().as_str()
        );

        self.progress.completed = Some(record.clone());
        Ok(record)
    }

    fn guard(&self, from: IssuanceState, to: IssuanceState) -> Result<(), IssuanceError> {
        let current = self.get_state();
        if self.failed {
            return Err(IssuanceError::Aborted(current));
        }

        if current != from {
            return Err(IssuanceError::InvalidStateTransition { from: current, to });
        }

        Ok(())
    }

    fn advance(&self, to: IssuanceState) {
        let from = self.state.send_replace(to);
        debug!("issuance state changed: {} -> {}", from, to)
    }

    fn track<T>(&mut self, result: Result<T, IssuanceError>) -> Result<T, IssuanceError> {
        if let Err(err) = &result {
            warn!("issuance failed at {}: {}", self.get_state(), err);
            self.failed = true;
        }

        result
    }

    async fn invite(&mut self) -> Result<String, IssuanceError> {
        info!("creating the invitation");

        let record = self.issuer.oob().create_invitation().await?;
        let url = record
            .get_invitation()
            .to_url(&self.params.invitation_domain)?;

        self.progress.out_of_band_record = Some(record);
        self.progress.invitation_url = Some(url.clone());
        self.advance(IssuanceState::InvitationCreated);

        Ok(url)
    }

    async fn connect(&mut self) -> Result<(), IssuanceError> {
        let out_of_band_id = self
            .progress
            .out_of_band_record
            .as_ref()
            .map(|record| record.get_id())
            .ok_or(IssuanceError::MissingInvitation)?;

        let url = self
            .progress
            .invitation_url
            .clone()
            .ok_or(IssuanceError::MissingInvitation)?;

        let (sender, receiver) = oneshot::channel();
        let handle = ConnectionListener::new(out_of_band_id).register(
            &self.issuer.events(),
            move |connection_id| {
                let _ = sender.send(connection_id);
            },
        );

        self.listeners.push(handle);
        self.progress.pending_connection = Some(receiver);

        info!("holder is receiving the invitation");
        let _ = self
            .holder
            .oob()
            .receive_invitation_from_url(url)
            .await?;

        self.advance(IssuanceState::AwaitingConnection);
        Ok(())
    }

    async fn wait_connection(&mut self) -> Result<ConnectionID, IssuanceError> {
        let receiver = self
            .progress
            .pending_connection
            .take()
            .ok_or(IssuanceError::ListenerClosed)?;

        let duration = self.params.connection_timeout;
        let connection_id = match tokio::time::timeout(duration, receiver).await {
            Ok(Ok(connection_id)) => connection_id,
            Ok(Err(_)) => return Err(IssuanceError::ListenerClosed),
            Err(_) => return Err(IssuanceError::ConnectionTimeout(format!("{:?}", duration))),
        };

        info!("connected: {}", connection_id.as_str());
        self.progress.connection_id = Some(connection_id.clone());
        self.advance(IssuanceState::Connected);

        Ok(connection_id)
    }

    async fn publish_schema(&mut self) -> Result<Schema, IssuanceError> {
        info!("registering the schema");

        let schema = self
            .issuer
            .ledger()
            .register_schema(self.params.schema.clone())
            .await?;

        info!("schema registered: {}", schema.id);
        self.progress.schema = Some(schema.clone());
        self.advance(IssuanceState::SchemaRegistered);

        Ok(schema)
    }

    async fn publish_credential_definition(
        &mut self,
    ) -> Result<CredentialDefinition, IssuanceError> {
        let schema = self
            .progress
            .schema
            .clone()
            .filter(|schema| !schema.id.is_empty())
            .ok_or(IssuanceError::MissingSchema)?;

        info!("registering the credential definition");

        let template = CredentialDefinitionTemplate::new(
            schema,
            self.params.credential_definition.support_revocation,
            &self.params.credential_definition.tag,
        );

        let definition = self
            .issuer
            .ledger()
            .register_credential_definition(template)
            .await?;

        info!("credential definition registered: {}", definition.id);
        self.progress.credential_definition = Some(definition.clone());
        self.advance(IssuanceState::CredentialDefinitionRegistered);

        Ok(definition)
    }

    async fn offer(&mut self) -> Result<(), IssuanceError> {
        let connection_id = self
            .progress
            .connection_id
            .clone()
            .ok_or(IssuanceError::MissingConnection)?;

        let definition_id = self
            .progress
            .credential_definition
            .as_ref()
            .map(|definition| definition.id.clone())
            .ok_or(IssuanceError::MissingCredentialDefinition)?;

        // registered before the offer, the exchange may settle before the offer call returns
        let (settle, settled) = watch::channel(None);
        let watched = connection_id.clone();
        let handle = self.issuer.events().on(
            EventType::CredentialStateChanged,
            move |event| {
                if let Event::CredentialStateChanged(payload) = event {
                    let record = payload.credential_record;
                    if record.get_connection_id() == &watched {
                        let state = record.get_state();
                        if state.is_terminal() {
                            settle.send_if_modified(|current| {
                                if current.is_some() {
                                    return false;
                                }

                                *current = Some(record);
                                true
                            });
                        } else {
                            debug!("credential exchange progressed: {:?}", state);
                        }
                    }
                }

                async {}
            },
        );

        self.listeners.push(handle);
        self.progress.settled = Some(settled);

        info!("offering the credential through {}", connection_id.as_str());

        let params = OfferCredentialParams {
            protocol_version: self.params.protocol_version,
            connection_id,
            credential_formats: CredentialFormats::indy(
                definition_id,
                self.params.attributes.clone(),
            ),
            comment: self.params.comment.clone(),
        };

        self.issuer.credentials().offer_credential(params).await?;
        self.advance(IssuanceState::CredentialIssued);

        Ok(())
    }
}
