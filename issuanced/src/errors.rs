use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DaemonError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("agent error: {0}")]
    AgentError(String),

    #[error("issuance error: {0}")]
    IssuanceError(String),

    #[error("output error: {0}")]
    OutputError(String),
}
