//! `prople-issuance-agent` provides an in-memory agent runtime for the issuance flow, with
//! its TOML configuration
//!
//! ```text
//! [issuer]  [holder]       agents, each with its own wallet, DID, endpoints and auto-accept policies
//! [ledger]                 the ledger shared by both agents
//! [issuance]               the credential to issue and the flow's timeouts
//! ```
pub mod agent;
pub mod common;
pub mod config;
pub mod network;

pub use agent::{Builder as RuntimeBuilder, MemoryAgent, MemoryLedger};
pub use config::Parser as ConfigManager;
