//! `ledger` provides the contract used by the `Issuer` to publish the objects a credential
//! depends on: a [`types::Schema`] and a [`types::CredentialDefinition`] built on top of it
pub mod types;
