use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;

use rst_common::standard::serde::{self, Deserialize, Serialize};

/// `AutoAcceptCredential` controls which credential exchange steps the runtime takes on its own
///
/// - `Always`, every step including the offer acceptance
/// - `ContentApproved`, every step except the offer acceptance, which is left to the holder's
///   listener
/// - `Never`, every step must be taken manually
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum AutoAcceptCredential {
    Always,
    ContentApproved,
    Never,
}

impl AutoAcceptCredential {
    pub fn accepts_offer(&self) -> bool {
        matches!(self, AutoAcceptCredential::Always)
    }

    pub fn accepts_request(&self) -> bool {
        !matches!(self, AutoAcceptCredential::Never)
    }

    pub fn accepts_credential(&self) -> bool {
        !matches!(self, AutoAcceptCredential::Never)
    }
}

/// `did_from_seed` derives an unqualified DID from the trailing 16 bytes of the seed
pub fn did_from_seed(seed: &str) -> String {
    let bytes = seed.as_bytes();
    let start = bytes.len().saturating_sub(16);
    URL_SAFE_NO_PAD.encode(&bytes[start..])
}

pub fn verkey_from_seed(seed: &str) -> String {
    STANDARD_NO_PAD.encode(seed.as_bytes())
}
