use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::credential::types::CredentialAPI;
use crate::events::EventBus;
use crate::ledger::types::LedgerAPI;
use crate::oob::types::OutOfBandAPI;

/// `AgentError` is a base error types for any calls made to an agent runtime
///
/// Any external call (invitation creation, ledger registration, credential offer or acceptance)
/// may fail, and the failure must be surfaced to the caller as is, without any retry
#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum AgentError {
    #[error("transport error: {0}")]
    TransportError(String),

    #[error("ledger error: {0}")]
    LedgerError(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid invitation: {0}")]
    InvalidInvitation(String),

    #[error("invalid credential format: {0}")]
    InvalidCredentialFormat(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("unknown error: {0}")]
    UnknownError(String),
}

/// `AgentBuilder` is the main entrypoint to an agent instance
///
/// It groups agent capabilities by modules, each of them exposed through its own trait
/// implementation:
///
/// - `oob`, used to create and receive out-of-band invitations
/// - `ledger`, used to register schemas and credential definitions
/// - `credentials`, used to offer and accept credentials
/// - `events`, the agent's own [`EventBus`]
///
/// Each agent instance owns its own event bus, two agents never share the same bus
pub trait AgentBuilder: Clone + Send + Sync + 'static {
    type OutOfBandImplementer: OutOfBandAPI;
    type LedgerImplementer: LedgerAPI;
    type CredentialImplementer: CredentialAPI;

    fn label(&self) -> String;
    fn oob(&self) -> Self::OutOfBandImplementer;
    fn ledger(&self) -> Self::LedgerImplementer;
    fn credentials(&self) -> Self::CredentialImplementer;
    fn events(&self) -> EventBus;
}
