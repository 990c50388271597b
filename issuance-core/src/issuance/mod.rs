//! `issuance` sequences the whole credential issuance flow between an `Issuer` and a `Holder`
//!
//! The [`Orchestrator`] is an explicit state machine, each of its steps is only allowed from a
//! single state, and a failed step terminates the flow
mod orchestrator;
pub use orchestrator::Orchestrator;

pub mod types;
