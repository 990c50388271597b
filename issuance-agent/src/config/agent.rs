use rst_common::standard::serde::{self, Deserialize};

use crate::agent::types::AutoAcceptCredential;
use crate::common::types::{CommonError, ToValidate};

pub const PUBLIC_DID_SEED_LENGTH: usize = 32;

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Wallet {
    pub(super) id: String,
    pub(super) key: String,
}

impl Wallet {
    pub fn get(&self) -> (String, String) {
        (self.id.to_owned(), self.key.to_owned())
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            id: "".to_string(),
            key: "".to_string(),
        }
    }
}

impl ToValidate for Wallet {
    fn validate(&self) -> Result<(), CommonError> {
        if self.id.is_empty() {
            return Err(CommonError::ValidationError(
                "config: wallet:id is missing".to_string(),
            ));
        }

        if self.key.is_empty() {
            return Err(CommonError::ValidationError(
                "config: wallet:key is missing".to_string(),
            ));
        }

        Ok(())
    }
}

/// `Agent` is the configuration of a single agent instance, either the issuer or the holder
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Agent {
    pub(super) label: String,
    pub(super) wallet: Wallet,
    pub(super) public_did_seed: String,
    pub(super) endpoints: Vec<String>,
    pub(super) auto_accept_connections: bool,
    pub(super) auto_accept_credentials: AutoAcceptCredential,
}

impl Agent {
    pub fn get_label(&self) -> String {
        self.label.to_owned()
    }

    pub fn get_wallet(&self) -> Wallet {
        self.wallet.to_owned()
    }

    pub fn get_public_did_seed(&self) -> String {
        self.public_did_seed.to_owned()
    }

    pub fn get_endpoints(&self) -> Vec<String> {
        self.endpoints.to_owned()
    }

    pub fn get_auto_accept_connections(&self) -> bool {
        self.auto_accept_connections
    }

    pub fn get_auto_accept_credentials(&self) -> AutoAcceptCredential {
        self.auto_accept_credentials
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            label: "".to_string(),
            wallet: Wallet::default(),
            public_did_seed: "".to_string(),
            endpoints: Vec::new(),
            auto_accept_connections: true,
            auto_accept_credentials: AutoAcceptCredential::ContentApproved,
        }
    }
}

impl ToValidate for Agent {
    fn validate(&self) -> Result<(), CommonError> {
        if self.label.is_empty() {
            return Err(CommonError::ValidationError(
                "config: agent:label is missing".to_string(),
            ));
        }

        _ = self.wallet.validate()?;

        if self.public_did_seed.len() != PUBLIC_DID_SEED_LENGTH {
            return Err(CommonError::ValidationError(format!(
                "config: agent:public_did_seed must be {} characters",
                PUBLIC_DID_SEED_LENGTH
            )));
        }

        if self.endpoints.is_empty() || self.endpoints.iter().any(|endpoint| endpoint.is_empty()) {
            return Err(CommonError::ValidationError(
                "config: agent:endpoints is missing".to_string(),
            ));
        }

        Ok(())
    }
}
