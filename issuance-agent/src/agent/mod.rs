//! `agent` is an in-memory agent runtime implementing the `prople-issuance-core` contracts
//!
//! There is no wallet, no cryptography and no network here. Records live in memory, ledger
//! objects are written to a [`MemoryLedger`] shared by all agents, and peers exchange
//! messages through an in-process [`crate::network::Transport`]
mod builder;
pub use builder::Builder;

mod connections;
pub use connections::ConnectionModule;

mod context;

mod credentials;
pub use credentials::CredentialModule;

mod inbound;

mod ledger;
pub use ledger::{LedgerModule, MemoryLedger};

mod memory;
pub use memory::MemoryAgent;

mod oob;
pub use oob::OutOfBandModule;

mod store;

pub mod types;

#[cfg(test)]
pub(crate) mod testing;
