use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Ledger {
    pub(super) id: String,
    pub(super) is_production: bool,
}

impl Ledger {
    pub fn get(&self) -> (String, bool) {
        (self.id.to_owned(), self.is_production)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            id: "memory-ledger".to_string(),
            is_production: false,
        }
    }
}

impl ToValidate for Ledger {
    fn validate(&self) -> Result<(), CommonError> {
        if self.id.is_empty() {
            return Err(CommonError::ValidationError(
                "config: ledger:id is missing".to_string(),
            ));
        }

        Ok(())
    }
}
