use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use super::types::{OutOfBandID, OutOfBandRole, OutOfBandState};
use super::OutOfBandInvitation;

/// `OutOfBandRecord` is the agent's own record of an invitation, either created or received
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct OutOfBandRecord {
    id: OutOfBandID,
    role: OutOfBandRole,
    state: OutOfBandState,

    #[serde(rename = "outOfBandInvitation")]
    invitation: OutOfBandInvitation,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    updated_at: DateTime<Utc>,
}

impl OutOfBandRecord {
    pub fn new(role: OutOfBandRole, state: OutOfBandState, invitation: OutOfBandInvitation) -> Self {
        Self {
            id: OutOfBandID::generate(),
            role,
            state,
            invitation,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn update_state(&mut self, state: OutOfBandState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    pub fn get_id(&self) -> OutOfBandID {
        self.id.clone()
    }

    pub fn get_role(&self) -> OutOfBandRole {
        self.role
    }

    pub fn get_state(&self) -> OutOfBandState {
        self.state
    }

    pub fn get_invitation(&self) -> &OutOfBandInvitation {
        &self.invitation
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl ToJSON for OutOfBandRecord {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}
