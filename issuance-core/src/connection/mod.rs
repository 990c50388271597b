//! # Connection Module
//!
//! The `connection` module maintains the connection records, an established and addressable
//! relationship between two agents, and the listener used to wait until a connection
//! spawned from an invitation has been completed.
//!
//! ## Connection Workflow
//!
//! Connections are established through the DID exchange protocol, driven by the agent runtime:
//!
//! ```text
//! Holder receives the issuer's invitation
//! ├── Holder sends a request                  (holder: request-sent)
//! ├── Issuer receives the request             (issuer: request-received)
//! ├── Issuer sends its response               (issuer: response-sent)
//! ├── Holder receives the response            (holder: response-received)
//! ├── Holder sends the completion             (holder: completed)
//! └── Issuer receives the completion          (issuer: completed)
//! ```
//!
//! Each transition is published to the agent's own event bus as a
//! `ConnectionStateChanged` event. The orchestrator never mutates a connection record,
//! it only observes them.
//!
//! ## Correlation
//!
//! Multiple invitations may be in flight sharing one event bus. A [`ConnectionListener`]
//! is scoped to one invitation and ignores any event whose `out_of_band_id` doesn't belong
//! to its invitation.
mod record;
pub use record::ConnectionRecord;

mod listener;
pub use listener::ConnectionListener;

pub mod types;
