use derive_more::{AsRef, From, Into};
use the_newtype::Newtype;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::uuid::Uuid;
use rst_common::with_errors::thiserror::{self, Error};

use crate::agent::types::AgentError;
use crate::connection::ConnectionRecord;

use super::OutOfBandRecord;

pub const INVITATION_TYPE: &str = "https://didcomm.org/out-of-band/1.1/invitation";
pub const HANDSHAKE_PROTOCOL_DIDEXCHANGE: &str = "https://didcomm.org/didexchange/1.0";
pub const HANDSHAKE_PROTOCOL_CONNECTIONS: &str = "https://didcomm.org/connections/1.0";
pub const ACCEPT_DIDCOMM_AIP1: &str = "didcomm/aip1";
pub const ACCEPT_DIDCOMM_AIP2: &str = "didcomm/aip2;env=rfc19";
pub const SERVICE_TYPE_DIDCOMM: &str = "did-communication";

pub const QUERY_PARAM_OOB: &str = "oob";
pub const QUERY_PARAM_LEGACY: &str = "c_i";

#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum OutOfBandError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("url doesn't contain any invitation")]
    MissingInvitation,

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("json error: {0}")]
    JSONError(String),
}

/// Unique identifier of an [`OutOfBandRecord`]
///
/// This is the correlation id carried by any connection spawned from the invitation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Newtype, From, Into, AsRef)]
#[serde(crate = "self::serde")]
pub struct OutOfBandID(String);

impl OutOfBandID {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum OutOfBandRole {
    Sender,
    Receiver,
}

/// OutOfBandState represent the invitation's states from each side
///
/// The `Sender` keeps its record at [`OutOfBandState::AwaitResponse`] until a connection
/// spawned from it is completed, the `Receiver` starts at [`OutOfBandState::PrepareResponse`]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum OutOfBandState {
    AwaitResponse,
    PrepareResponse,
    Done,
}

/// ConnectionHandle is the output of receiving an invitation
///
/// The `connection_record` is empty when the invitation doesn't request any handshake protocol
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub out_of_band_record: OutOfBandRecord,
    pub connection_record: Option<ConnectionRecord>,
}

/// `OutOfBandAPI` is the agent module used to create and to receive invitations
#[async_trait]
pub trait OutOfBandAPI: Clone + Send + Sync + 'static {
    /// `create_invitation` used by the inviter to generate a new invitation, saved as an
    /// [`OutOfBandRecord`] with the [`OutOfBandRole::Sender`] role
    async fn create_invitation(&self) -> Result<OutOfBandRecord, AgentError>;

    /// `receive_invitation_from_url` used by the invitee to parse an invitation URL and
    /// starting the connection protocol with the inviter
    async fn receive_invitation_from_url(&self, url: String)
        -> Result<ConnectionHandle, AgentError>;
}
