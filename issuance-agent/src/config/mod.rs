mod agent;
pub use agent::{Agent, Wallet};

mod ledger;
pub use ledger::Ledger;

mod issuance;
pub use issuance::{
    Attribute, CredentialDefinition, Issuance, Policy, PolicyKind, Schema,
};

mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
