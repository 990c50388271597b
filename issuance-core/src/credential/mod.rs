//! # Credential Module
//!
//! The `credential` module maintains the credential exchange records, a multi-step protocol
//! culminating in one party issuing a verifiable credential to another, and the listener used
//! by a `Holder` to react to incoming offers.
//!
//! ```text
//! Issuer offers a credential                  (issuer: offer-sent)
//! ├── Holder receives the offer               (holder: offer-received)
//! ├── Holder accepts the offer                (holder: request-sent)
//! ├── Issuer receives the request             (issuer: request-received)
//! ├── Issuer issues the credential            (issuer: credential-issued)
//! ├── Holder receives the credential          (holder: credential-received)
//! ├── Holder acknowledges it                  (holder: done)
//! └── Issuer receives the acknowledgement     (issuer: done)
//! ```
//!
//! Whether an offer is accepted is a policy decision, expressed through [`AcceptPolicy`],
//! so stricter policies can be substituted without changing how the listener is wired.
mod record;
pub use record::CredentialExchangeRecord;

mod listener;
pub use listener::CredentialListener;

mod policy;
pub use policy::{AcceptPolicy, AlwaysAccept, NeverAccept, Predicate, TrustedIssuers};

pub mod types;
