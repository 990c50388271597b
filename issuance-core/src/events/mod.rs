//! `events` provides the per-agent event bus, used to deliver records state changes to
//! the registered listeners
//!
//! Events are delivered asynchronously, off the caller's stack. For one listener, the events
//! of the same record are delivered following the order of the underlying state transitions,
//! but there is no ordering guarantee across distinct records.
mod bus;
pub use bus::{EventBus, ListenerHandle, DEFAULT_EVENT_CAPACITY};

pub mod types;
pub use types::{Event, EventType};
