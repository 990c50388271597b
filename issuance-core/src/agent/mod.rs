//! `agent` defines the contract of an agent instance, which is an opaque handle of a party
//! (`Issuer` or `Holder`) able to send and receive protocol messages and to emit lifecycle events.
//!
//! The agent runtime lives outside of this crate, this module only describes what the
//! issuance flow requires from it.
pub mod types;
