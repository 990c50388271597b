use derive_more::{AsRef, From, Into};
use the_newtype::Newtype;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::uuid::Uuid;

use crate::agent::types::AgentError;
use crate::connection::types::ConnectionID;

use super::CredentialExchangeRecord;

/// Unique identifier of a [`CredentialExchangeRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Newtype, From, Into, AsRef)]
#[serde(crate = "self::serde")]
pub struct CredentialRecordID(String);

impl CredentialRecordID {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum CredentialState {
    ProposalSent,
    ProposalReceived,
    OfferSent,
    OfferReceived,
    Declined,
    RequestSent,
    RequestReceived,
    CredentialIssued,
    CredentialReceived,
    Done,
    Abandoned,
}

impl CredentialState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CredentialState::Done | CredentialState::Declined | CredentialState::Abandoned
        )
    }
}

/// The issue credential protocol version tag attached to an offer
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde", rename_all = "lowercase")]
pub enum CredentialProtocolVersion {
    V1,
    V2,
}

/// `CredentialPreviewAttribute` is a name/value pair of the offered credential
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct CredentialPreviewAttribute {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    pub value: String,
}

impl CredentialPreviewAttribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            mime_type: None,
            value: value.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct IndyCredentialFormat {
    pub credential_definition_id: String,
    pub attributes: Vec<CredentialPreviewAttribute>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct CredentialFormats {
    pub indy: IndyCredentialFormat,
}

impl CredentialFormats {
    pub fn indy(
        credential_definition_id: String,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Self {
        Self {
            indy: IndyCredentialFormat {
                credential_definition_id,
                attributes,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct OfferCredentialParams {
    pub protocol_version: CredentialProtocolVersion,
    pub connection_id: ConnectionID,
    pub credential_formats: CredentialFormats,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct AcceptOfferParams {
    pub credential_record_id: CredentialRecordID,
}

impl AcceptOfferParams {
    pub fn new(credential_record_id: CredentialRecordID) -> Self {
        Self {
            credential_record_id,
        }
    }
}

/// `CredentialAPI` is the agent module used to exchange credentials
#[async_trait]
pub trait CredentialAPI: Clone + Send + Sync + 'static {
    /// `offer_credential` sends a credential offer over an established connection
    ///
    /// This call is fire-and-forget relative to the issuance flow, the exchange completion
    /// must be observed through the agent's events
    async fn offer_credential(&self, params: OfferCredentialParams) -> Result<(), AgentError>;

    /// `accept_offer` used by the `Holder` to accept a received offer
    async fn accept_offer(&self, params: AcceptOfferParams) -> Result<(), AgentError>;

    async fn get_by_id(
        &self,
        id: CredentialRecordID,
    ) -> Result<CredentialExchangeRecord, AgentError>;
}
