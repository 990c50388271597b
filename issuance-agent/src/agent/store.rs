use std::collections::HashMap;
use std::sync::Arc;

use rst_common::with_tokio::tokio::sync::RwLock;

use prople_issuance_core::agent::types::AgentError;
use prople_issuance_core::connection::types::{ConnectionID, DidExchangeState};
use prople_issuance_core::connection::ConnectionRecord;
use prople_issuance_core::credential::types::{CredentialRecordID, CredentialState};
use prople_issuance_core::credential::CredentialExchangeRecord;
use prople_issuance_core::oob::types::{OutOfBandID, OutOfBandRole, OutOfBandState};
use prople_issuance_core::oob::OutOfBandRecord;

#[derive(Default)]
struct Records {
    out_of_band: HashMap<OutOfBandID, OutOfBandRecord>,
    connections: HashMap<ConnectionID, ConnectionRecord>,
    credentials: HashMap<CredentialRecordID, CredentialExchangeRecord>,
}

/// `Store` keeps an agent's records in memory
///
/// State updates are conditional: when an expected state is given, the update is rejected with
/// [`AgentError::InvalidState`] unless the record is still in that state
#[derive(Clone, Default)]
pub(crate) struct Store {
    records: Arc<RwLock<Records>>,
}

impl Store {
    pub(crate) async fn save_out_of_band(&self, record: OutOfBandRecord) {
        let mut records = self.records.write().await;
        records.out_of_band.insert(record.get_id(), record);
    }

    /// finds the record of an invitation created by this agent
    pub(crate) async fn find_out_of_band_by_invitation(
        &self,
        invitation_id: &str,
    ) -> Result<OutOfBandRecord, AgentError> {
        let records = self.records.read().await;
        records
            .out_of_band
            .values()
            .find(|record| {
                record.get_role() == OutOfBandRole::Sender
                    && record.get_invitation().get_id() == invitation_id
            })
            .cloned()
            .ok_or_else(|| AgentError::RecordNotFound(format!("invitation: {}", invitation_id)))
    }

    pub(crate) async fn update_out_of_band_state(
        &self,
        id: &OutOfBandID,
        state: OutOfBandState,
    ) -> Result<OutOfBandRecord, AgentError> {
        let mut records = self.records.write().await;
        let record = records
            .out_of_band
            .get_mut(id)
            .ok_or_else(|| AgentError::RecordNotFound(format!("out-of-band: {}", id.as_str())))?;

        record.update_state(state);
        Ok(record.clone())
    }

    pub(crate) async fn save_connection(&self, record: ConnectionRecord) {
        let mut records = self.records.write().await;
        records.connections.insert(record.get_id(), record);
    }

    pub(crate) async fn get_connection(
        &self,
        id: &ConnectionID,
    ) -> Result<ConnectionRecord, AgentError> {
        let records = self.records.read().await;
        records
            .connections
            .get(id)
            .cloned()
            .ok_or_else(|| AgentError::RecordNotFound(format!("connection: {}", id.as_str())))
    }

    pub(crate) async fn find_connection_by_thread(
        &self,
        thread_id: &str,
    ) -> Result<ConnectionRecord, AgentError> {
        let records = self.records.read().await;
        records
            .connections
            .values()
            .find(|record| record.get_thread_id().map(|id| id.as_str()) == Some(thread_id))
            .cloned()
            .ok_or_else(|| {
                AgentError::RecordNotFound(format!("connection thread: {}", thread_id))
            })
    }

    pub(crate) async fn list_connections(&self) -> Vec<ConnectionRecord> {
        let records = self.records.read().await;
        records.connections.values().cloned().collect()
    }

    /// returns the updated record and its previous state
    pub(crate) async fn update_connection_state(
        &self,
        id: &ConnectionID,
        expected: Option<DidExchangeState>,
        state: DidExchangeState,
    ) -> Result<(ConnectionRecord, DidExchangeState), AgentError> {
        let mut records = self.records.write().await;
        let record = records
            .connections
            .get_mut(id)
            .ok_or_else(|| AgentError::RecordNotFound(format!("connection: {}", id.as_str())))?;

        if let Some(expected) = expected {
            if record.get_state() != expected {
                return Err(AgentError::InvalidState(format!(
                    "connection {} is {:?}, expected {:?}",
                    id.as_str(),
                    record.get_state(),
                    expected
                )));
            }
        }

        let previous = record.update_state(state);
        Ok((record.clone(), previous))
    }

    pub(crate) async fn save_credential(&self, record: CredentialExchangeRecord) {
        let mut records = self.records.write().await;
        records.credentials.insert(record.get_id(), record);
    }

    pub(crate) async fn get_credential(
        &self,
        id: &CredentialRecordID,
    ) -> Result<CredentialExchangeRecord, AgentError> {
        let records = self.records.read().await;
        records
            .credentials
            .get(id)
            .cloned()
            .ok_or_else(|| AgentError::RecordNotFound(format!("credential: {}", id.as_str())))
    }

    pub(crate) async fn find_credential_by_thread(
        &self,
        thread_id: &str,
    ) -> Result<CredentialExchangeRecord, AgentError> {
        let records = self.records.read().await;
        records
            .credentials
            .values()
            .find(|record| record.get_thread_id() == thread_id)
            .cloned()
            .ok_or_else(|| {
                AgentError::RecordNotFound(format!("credential thread: {}", thread_id))
            })
    }

    pub(crate) async fn list_credentials(&self) -> Vec<CredentialExchangeRecord> {
        let records = self.records.read().await;
        records.credentials.values().cloned().collect()
    }

    /// returns the updated record and its previous state
    pub(crate) async fn update_credential_state(
        &self,
        id: &CredentialRecordID,
        expected: Option<CredentialState>,
        state: CredentialState,
    ) -> Result<(CredentialExchangeRecord, CredentialState), AgentError> {
        let mut records = self.records.write().await;
        let record = records
            .credentials
            .get_mut(id)
            .ok_or_else(|| AgentError::RecordNotFound(format!("credential: {}", id.as_str())))?;

        if let Some(expected) = expected {
            if record.get_state() != expected {
                return Err(AgentError::InvalidState(format!(
                    "credential {} is {:?}, expected {:?}",
                    id.as_str(),
                    record.get_state(),
                    expected
                )));
            }
        }

        let previous = record.update_state(state);
        Ok((record.clone(), previous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::with_tokio::tokio;

    use prople_issuance_core::connection::types::DidExchangeRole;
    use prople_issuance_core::credential::types::CredentialProtocolVersion;
    use prople_issuance_core::oob::{OutOfBandInvitation, OutOfBandService};

    #[tokio::test]
    async fn test_find_out_of_band_by_invitation() {
        let store = Store::default();
        let invitation = OutOfBandInvitation::new(
            "issuer".to_string(),
            vec![OutOfBandService::new(
                vec!["verkey".to_string()],
                "memory://issuer".to_string(),
            )],
        );
        let invitation_id = invitation.get_id().clone();

        let received = OutOfBandRecord::new(
            OutOfBandRole::Receiver,
            OutOfBandState::PrepareResponse,
            invitation.clone(),
        );
        store.save_out_of_band(received).await;

        let found = store.find_out_of_band_by_invitation(&invitation_id).await;
        assert!(matches!(found, Err(AgentError::RecordNotFound(_))));

        let created = OutOfBandRecord::new(
            OutOfBandRole::Sender,
            OutOfBandState::AwaitResponse,
            invitation,
        );
        let created_id = created.get_id();
        store.save_out_of_band(created).await;

        let found = store.find_out_of_band_by_invitation(&invitation_id).await;
        assert_eq!(found.unwrap().get_id(), created_id)
    }

    #[tokio::test]
    async fn test_conditional_connection_update() {
        let store = Store::default();
        let record = ConnectionRecord::new(DidExchangeRole::Responder, DidExchangeState::RequestReceived)
            .with_thread_id("thread-id".to_string());
        let id = record.get_id();
        store.save_connection(record).await;

        let updated = store
            .update_connection_state(
                &id,
                Some(DidExchangeState::RequestReceived),
                DidExchangeState::ResponseSent,
            )
            .await;
        assert!(updated.is_ok());

        let (record, previous) = updated.unwrap();
        assert_eq!(record.get_state(), DidExchangeState::ResponseSent);
        assert_eq!(previous, DidExchangeState::RequestReceived);

        let rejected = store
            .update_connection_state(
                &id,
                Some(DidExchangeState::RequestReceived),
                DidExchangeState::ResponseSent,
            )
            .await;
        assert!(matches!(rejected, Err(AgentError::InvalidState(_))));

        let found = store.find_connection_by_thread("thread-id").await;
        assert_eq!(found.unwrap().get_id(), id)
    }

    #[tokio::test]
    async fn test_credential_not_found() {
        let store = Store::default();
        let record = CredentialExchangeRecord::new(
            ConnectionID::generate(),
            "thread-id".to_string(),
            CredentialState::OfferReceived,
            CredentialProtocolVersion::V2,
        );
        store.save_credential(record).await;

        let missing = store
            .update_credential_state(
                &CredentialRecordID::generate(),
                None,
                CredentialState::RequestSent,
            )
            .await;
        assert!(matches!(missing, Err(AgentError::RecordNotFound(_))));

        let found = store.find_credential_by_thread("thread-id").await;
        assert!(found.is_ok());
        assert_eq!(store.list_credentials().await.len(), 1)
    }
}
