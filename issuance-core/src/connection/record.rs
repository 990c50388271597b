use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::oob::types::OutOfBandID;

use super::types::{ConnectionID, DidExchangeRole, DidExchangeState};

/// `ConnectionRecord` identifies a peer relationship from one agent's perspective
///
/// The record is created by the agent runtime when an invitation is received, or when a
/// connection request comes in, and its state is updated by the runtime as the protocol
/// messages arrive.
///
/// The `thread_id` is shared by both sides of the same connection, while each side has
/// its own record `id`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct ConnectionRecord {
    id: ConnectionID,
    state: DidExchangeState,
    role: DidExchangeRole,

    #[serde(rename = "outOfBandId")]
    out_of_band_id: Option<OutOfBandID>,

    #[serde(rename = "theirLabel")]
    their_label: Option<String>,

    #[serde(rename = "theirEndpoint")]
    their_endpoint: Option<String>,

    #[serde(rename = "threadId")]
    thread_id: Option<String>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    updated_at: DateTime<Utc>,
}

impl ConnectionRecord {
    pub fn new(role: DidExchangeRole, state: DidExchangeState) -> Self {
        Self {
            id: ConnectionID::generate(),
            state,
            role,
            out_of_band_id: None,
            their_label: None,
            their_endpoint: None,
            thread_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_out_of_band_id(mut self, out_of_band_id: OutOfBandID) -> Self {
        self.out_of_band_id = Some(out_of_band_id);
        self
    }

    pub fn with_their_label(mut self, label: String) -> Self {
        self.their_label = Some(label);
        self
    }

    pub fn with_their_endpoint(mut self, endpoint: String) -> Self {
        self.their_endpoint = Some(endpoint);
        self
    }

    pub fn with_thread_id(mut self, thread_id: String) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Updates the connection state and refreshes the updated timestamp, returning the
    /// previous state
    pub fn update_state(&mut self, state: DidExchangeState) -> DidExchangeState {
        let previous = self.state;
        self.state = state;
        self.updated_at = Utc::now();
        previous
    }

    pub fn is_ready(&self) -> bool {
        self.state == DidExchangeState::Completed
    }

    pub fn get_id(&self) -> ConnectionID {
        self.id.clone()
    }

    pub fn get_state(&self) -> DidExchangeState {
        self.state
    }

    pub fn get_role(&self) -> DidExchangeRole {
        self.role
    }

    pub fn get_out_of_band_id(&self) -> Option<&OutOfBandID> {
        self.out_of_band_id.as_ref()
    }

    pub fn get_their_label(&self) -> Option<&String> {
        self.their_label.as_ref()
    }

    pub fn get_their_endpoint(&self) -> Option<&String> {
        self.their_endpoint.as_ref()
    }

    pub fn get_thread_id(&self) -> Option<&String> {
        self.thread_id.as_ref()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl ToJSON for ConnectionRecord {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_state() {
        let mut record = ConnectionRecord::new(DidExchangeRole::Requester, DidExchangeState::RequestSent)
            .with_out_of_band_id(OutOfBandID::from("oob-id".to_string()))
            .with_thread_id("thread-id".to_string());

        assert!(!record.is_ready());

        let previous = record.update_state(DidExchangeState::Completed);
        assert_eq!(previous, DidExchangeState::RequestSent);
        assert!(record.is_ready());
        assert_eq!(record.get_thread_id(), Some(&"thread-id".to_string()));
        assert_eq!(
            record.get_out_of_band_id(),
            Some(&OutOfBandID::from("oob-id".to_string()))
        )
    }

    #[test]
    fn test_to_json() {
        let record = ConnectionRecord::new(DidExchangeRole::Responder, DidExchangeState::RequestReceived)
            .with_out_of_band_id(OutOfBandID::from("oob-id".to_string()));

        let json = record.to_json();
        assert!(!json.is_err());

        let json = json.unwrap();
        assert!(json.contains("\"outOfBandId\":\"oob-id\""));
        assert!(json.contains("\"state\":\"request-received\""))
    }
}
