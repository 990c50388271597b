use std::fmt;
use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::with_errors::thiserror::{self, Error};

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::agent::types::AgentError;
use crate::connection::types::ConnectionID;
use crate::credential::types::{
    CredentialPreviewAttribute, CredentialProtocolVersion, CredentialRecordID, CredentialState,
};
use crate::ledger::types::SchemaTemplate;
use crate::oob::types::{OutOfBandError, OutOfBandID};

pub const DEFAULT_INVITATION_DOMAIN: &str = "https://example.org";
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CREDENTIAL_DEFINITION_TAG: &str = "default";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum IssuanceState {
    Idle,
    InvitationCreated,
    AwaitingConnection,
    Connected,
    SchemaRegistered,
    CredentialDefinitionRegistered,
    CredentialIssued,
}

impl fmt::Display for IssuanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssuanceState::Idle => write!(f, "idle"),
            IssuanceState::InvitationCreated => write!(f, "invitation-created"),
            IssuanceState::AwaitingConnection => write!(f, "awaiting-connection"),
            IssuanceState::Connected => write!(f, "connected"),
            IssuanceState::SchemaRegistered => write!(f, "schema-registered"),
            IssuanceState::CredentialDefinitionRegistered => {
                write!(f, "credential-definition-registered")
            }
            IssuanceState::CredentialIssued => write!(f, "credential-issued"),
        }
    }
}

/// `IssuanceError` is a base error types for the issuance flow
///
/// Except for [`IssuanceError::InvalidStateTransition`] and [`IssuanceError::Aborted`], any of
/// these errors terminates the flow
#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum IssuanceError {
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: IssuanceState,
        to: IssuanceState,
    },

    #[error("issuance aborted at {0}")]
    Aborted(IssuanceState),

    #[error("agent error: {0}")]
    AgentError(#[from] AgentError),

    #[error("invitation error: {0}")]
    InvitationError(#[from] OutOfBandError),

    #[error("timeout: no completed connection after {0}")]
    ConnectionTimeout(String),

    #[error("timeout: credential exchange not completed after {0}")]
    CompletionTimeout(String),

    #[error("listener closed")]
    ListenerClosed,

    #[error("missing invitation")]
    MissingInvitation,

    #[error("missing registered schema")]
    MissingSchema,

    #[error("missing connection")]
    MissingConnection,

    #[error("missing registered credential definition")]
    MissingCredentialDefinition,

    #[error("credential not issued yet")]
    NotIssued,

    #[error("credential rejected: {0}")]
    CredentialRejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CredentialDefinitionParams {
    pub support_revocation: bool,
    pub tag: String,
}

impl Default for CredentialDefinitionParams {
    fn default() -> Self {
        Self {
            support_revocation: false,
            tag: DEFAULT_CREDENTIAL_DEFINITION_TAG.to_string(),
        }
    }
}

/// `IssuanceParams` carries everything the flow needs besides the agents themselves
///
/// The default values describe an `Identity` credential with `name` and `age` attributes
#[derive(Debug, Clone, PartialEq)]
pub struct IssuanceParams {
    pub invitation_domain: String,
    pub connection_timeout: Duration,
    pub completion_timeout: Duration,
    pub protocol_version: CredentialProtocolVersion,
    pub schema: SchemaTemplate,
    pub credential_definition: CredentialDefinitionParams,
    pub attributes: Vec<CredentialPreviewAttribute>,
    pub comment: Option<String>,
}

impl Default for IssuanceParams {
    fn default() -> Self {
        Self {
            invitation_domain: DEFAULT_INVITATION_DOMAIN.to_string(),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            protocol_version: CredentialProtocolVersion::V2,
            schema: SchemaTemplate::new(
                "Identity",
                "6.0",
                vec!["name".to_string(), "age".to_string()],
            ),
            credential_definition: CredentialDefinitionParams::default(),
            attributes: vec![
                CredentialPreviewAttribute::new("name", "Jane Doe"),
                CredentialPreviewAttribute::new("age", "23"),
            ],
            comment: None,
        }
    }
}

/// `IssuanceOutcome` is a snapshot of the flow, the ids gathered along its steps
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct IssuanceOutcome {
    pub state: IssuanceState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_of_band_id: Option<OutOfBandID>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionID>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_definition_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_record_id: Option<CredentialRecordID>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_state: Option<CredentialState>,
}

impl ToJSON for IssuanceOutcome {
    fn to_json(&self) -> Result<String, BaseError> {
        serde_json::to_string(self).map_err(|err| BaseError::ToJSONError(err.to_string()))
    }
}
