use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

use super::{Agent, Issuance, Ledger};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Config {
    pub(super) issuer: Agent,
    pub(super) holder: Agent,
    pub(super) ledger: Ledger,
    pub(super) issuance: Issuance,
}

impl Config {
    pub fn issuer(&self) -> &Agent {
        &self.issuer
    }

    pub fn holder(&self) -> &Agent {
        &self.holder
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn issuance(&self) -> &Issuance {
        &self.issuance
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            issuer: Agent::default(),
            holder: Agent::default(),
            ledger: Ledger::default(),
            issuance: Issuance::default(),
        }
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        _ = self.issuer.validate()?;
        _ = self.holder.validate()?;
        _ = self.ledger.validate()?;
        _ = self.issuance.validate()?;

        let shared = self
            .issuer
            .endpoints
            .iter()
            .any(|endpoint| self.holder.endpoints.contains(endpoint));

        if shared {
            return Err(CommonError::ValidationError(
                "config: issuer and holder can't share an endpoint".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers;
    use crate::common::types::CommonError;

    #[test]
    fn test_validation_failed() {
        let cfg = Config::default();
        let validation = helpers::validate(cfg);
        assert!(validation.is_err());
        assert!(matches!(
            validation.unwrap_err(),
            CommonError::ValidationError(_)
        ))
    }

    #[test]
    fn test_shared_endpoint() {
        let mut cfg = Config::default();
        for agent in [&mut cfg.issuer, &mut cfg.holder] {
            agent.label = "agent".to_string();
            agent.wallet.id = "wallet".to_string();
            agent.wallet.key = "key".to_string();
            agent.public_did_seed = "00000000000000000000000000Agent1".to_string();
            agent.endpoints = vec!["memory://agent".to_string()];
        }

        let validation = helpers::validate(cfg);
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("can't share an endpoint"))
    }
}
