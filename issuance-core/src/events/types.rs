use std::fmt;

use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::connection::types::DidExchangeState;
use crate::connection::ConnectionRecord;
use crate::credential::types::CredentialState;
use crate::credential::CredentialExchangeRecord;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(crate = "self::serde")]
pub enum EventType {
    ConnectionStateChanged,
    CredentialStateChanged,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::ConnectionStateChanged => write!(f, "ConnectionStateChanged"),
            EventType::CredentialStateChanged => write!(f, "CredentialStateChanged"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct ConnectionStateChangedPayload {
    pub connection_record: ConnectionRecord,
    pub previous_state: Option<DidExchangeState>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct CredentialStateChangedPayload {
    pub credential_record: CredentialExchangeRecord,
    pub previous_state: Option<CredentialState>,
}

/// `Event` is a tagged notification, `{ type, payload }`, where the payload carries the
/// changed record including its new state
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(crate = "self::serde", tag = "type", content = "payload")]
pub enum Event {
    ConnectionStateChanged(ConnectionStateChangedPayload),
    CredentialStateChanged(CredentialStateChangedPayload),
}

impl Event {
    pub fn connection_state_changed(
        connection_record: ConnectionRecord,
        previous_state: Option<DidExchangeState>,
    ) -> Self {
        Event::ConnectionStateChanged(ConnectionStateChangedPayload {
            connection_record,
            previous_state,
        })
    }

    pub fn credential_state_changed(
        credential_record: CredentialExchangeRecord,
        previous_state: Option<CredentialState>,
    ) -> Self {
        Event::CredentialStateChanged(CredentialStateChangedPayload {
            credential_record,
            previous_state,
        })
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Event::ConnectionStateChanged(_) => EventType::ConnectionStateChanged,
            Event::CredentialStateChanged(_) => EventType::CredentialStateChanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json;

    use crate::connection::types::DidExchangeRole;

    #[test]
    fn test_event_tagged_json() {
        let record = ConnectionRecord::new(DidExchangeRole::Responder, DidExchangeState::Completed);
        let event = Event::connection_state_changed(record, Some(DidExchangeState::ResponseSent));
        assert_eq!(event.event_type(), EventType::ConnectionStateChanged);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"ConnectionStateChanged\""));
        assert!(json.contains("\"previousState\":\"response-sent\""));
        assert!(json.contains("\"connectionRecord\""))
    }
}
