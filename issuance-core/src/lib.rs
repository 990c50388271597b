//! `prople-issuance-core` is an abstraction of the event-driven credential issuance flow
//! between two agents, an `Issuer` and a `Holder`.
//!
//! The agents themselves (wallet, ledger client, DIDComm transport) are treated as external
//! collaborators. This crate only defines the contracts they must satisfy, through the traits
//! exposed by [`agent`], [`oob`], [`ledger`] and [`credential`], and the coordination logic
//! built on top of those contracts:
//!
//! - [`events`], a per-agent event bus used to observe records lifecycle
//! - [`connection`], the connection records and the listener waiting for a completed connection
//! - [`credential`], the credential exchange records and the listener accepting offers
//! - [`issuance`], the orchestrator sequencing the whole issuance flow
//!
//! ---
//!
//! The flow itself is:
//!
//! ```text
//! Issuer creates invitation
//! ├── Holder receives the invitation by its URL
//! ├── Issuer observes a completed connection for the invitation
//! ├── Issuer registers a schema, then a credential definition
//! ├── Issuer offers a credential through the connection
//! └── Holder observes the offer and accepts it
//! ```
pub mod agent;
pub mod connection;
pub mod credential;
pub mod events;
pub mod issuance;
pub mod ledger;
pub mod oob;
