//! `oob` maintains the out-of-band invitations, a serializable token that enables one party
//! to initiate a connection with another
//!
//! An invitation is produced once by the inviter, it's immutable after its creation and
//! shared through its URL form, `{domain}?oob={base64url(json)}`
mod invitation;
pub use invitation::{OutOfBandInvitation, OutOfBandService};

mod record;
pub use record::OutOfBandRecord;

pub mod types;
