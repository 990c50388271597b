use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::connection::types::ConnectionID;

use super::types::{
    CredentialPreviewAttribute, CredentialProtocolVersion, CredentialRecordID, CredentialState,
};

/// `CredentialExchangeRecord` represents one in-progress credential exchange from one
/// agent's perspective. Both sides of the same exchange share the `thread_id`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct CredentialExchangeRecord {
    id: CredentialRecordID,
    state: CredentialState,

    #[serde(rename = "connectionId")]
    connection_id: ConnectionID,

    #[serde(rename = "threadId")]
    thread_id: String,

    #[serde(rename = "protocolVersion")]
    protocol_version: CredentialProtocolVersion,

    #[serde(rename = "credentialDefinitionId")]
    credential_definition_id: Option<String>,

    #[serde(rename = "credentialAttributes")]
    credential_attributes: Vec<CredentialPreviewAttribute>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    updated_at: DateTime<Utc>,
}

impl CredentialExchangeRecord {
    pub fn new(
        connection_id: ConnectionID,
        thread_id: String,
        state: CredentialState,
        protocol_version: CredentialProtocolVersion,
    ) -> Self {
        Self {
            id: CredentialRecordID::generate(),
            state,
            connection_id,
            thread_id,
            protocol_version,
            credential_definition_id: None,
            credential_attributes: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_credential_definition_id(mut self, credential_definition_id: String) -> Self {
        self.credential_definition_id = Some(credential_definition_id);
        self
    }

    pub fn with_credential_attributes(
        mut self,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Self {
        self.credential_attributes = attributes;
        self
    }

    /// Updates the exchange state and refreshes the updated timestamp, returning the
    /// previous state
    pub fn update_state(&mut self, state: CredentialState) -> CredentialState {
        let previous = self.state;
        self.state = state;
        self.updated_at = Utc::now();
        previous
    }

    pub fn get_id(&self) -> CredentialRecordID {
        self.id.clone()
    }

    pub fn get_state(&self) -> CredentialState {
        self.state
    }

    pub fn get_connection_id(&self) -> &ConnectionID {
        &self.connection_id
    }

    pub fn get_thread_id(&self) -> &String {
        &self.thread_id
    }

    pub fn get_protocol_version(&self) -> CredentialProtocolVersion {
        self.protocol_version
    }

    pub fn get_credential_definition_id(&self) -> Option<&String> {
        self.credential_definition_id.as_ref()
    }

    pub fn get_credential_attributes(&self) -> &Vec<CredentialPreviewAttribute> {
        &self.credential_attributes
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl ToJSON for CredentialExchangeRecord {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}
