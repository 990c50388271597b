use derive_more::{AsRef, From, Into};
use the_newtype::Newtype;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::uuid::Uuid;
use rst_common::with_errors::thiserror::{self, Error};

/// ConnectionError is a base error types for the `Connection` domain
#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum ConnectionError {
    #[error("timeout: no completed connection after {0}")]
    Timeout(String),

    #[error("listener closed before the connection completed")]
    ListenerClosed,

    #[error("unknown error: {0}")]
    UnknownError(String),
}

/// Unique identifier of a [`super::ConnectionRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Newtype, From, Into, AsRef)]
#[serde(crate = "self::serde")]
pub struct ConnectionID(String);

impl ConnectionID {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// DidExchangeState represent connection's states between two peers
///
/// Both [`DidExchangeState::Completed`] and [`DidExchangeState::Abandoned`] are terminal
/// states, a connection is only usable by other protocols once it is completed
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum DidExchangeState {
    Start,
    InvitationSent,
    InvitationReceived,
    RequestSent,
    RequestReceived,
    ResponseSent,
    ResponseReceived,
    Abandoned,
    Completed,
}

impl DidExchangeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DidExchangeState::Completed | DidExchangeState::Abandoned)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum DidExchangeRole {
    Requester,
    Responder,
}
