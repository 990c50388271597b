use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use url::Url;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::standard::uuid::Uuid;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use super::types::{
    OutOfBandError, ACCEPT_DIDCOMM_AIP1, ACCEPT_DIDCOMM_AIP2, HANDSHAKE_PROTOCOL_CONNECTIONS,
    HANDSHAKE_PROTOCOL_DIDEXCHANGE, INVITATION_TYPE, QUERY_PARAM_LEGACY, QUERY_PARAM_OOB,
    SERVICE_TYPE_DIDCOMM,
};

/// `OutOfBandService` is an inline DIDComm service, telling the invitee where and to whom
/// it should send its connection request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct OutOfBandService {
    id: String,

    #[serde(rename = "type")]
    service_type: String,

    recipient_keys: Vec<String>,
    service_endpoint: String,
}

impl OutOfBandService {
    pub fn new(recipient_keys: Vec<String>, service_endpoint: String) -> Self {
        Self {
            id: String::from("#inline"),
            service_type: SERVICE_TYPE_DIDCOMM.to_string(),
            recipient_keys,
            service_endpoint,
        }
    }

    pub fn get_recipient_keys(&self) -> &Vec<String> {
        &self.recipient_keys
    }

    pub fn get_service_endpoint(&self) -> &String {
        &self.service_endpoint
    }
}

/// `OutOfBandInvitation` is the invitation message itself, it will never be mutated once
/// it has been created
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct OutOfBandInvitation {
    #[serde(rename = "@type")]
    message_type: String,

    #[serde(rename = "@id")]
    id: String,

    label: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    accept: Vec<String>,

    #[serde(default)]
    handshake_protocols: Vec<String>,

    services: Vec<OutOfBandService>,
}

/// Invitation format used before the out-of-band protocol, still shared through the `c_i`
/// query parameter by older agents
#[derive(Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
struct LegacyInvitation {
    #[serde(rename = "@id")]
    id: String,
    label: String,

    #[serde(default)]
    recipient_keys: Vec<String>,
    service_endpoint: String,
}

impl From<LegacyInvitation> for OutOfBandInvitation {
    fn from(legacy: LegacyInvitation) -> Self {
        Self {
            message_type: INVITATION_TYPE.to_string(),
            id: legacy.id,
            label: legacy.label,
            accept: vec![ACCEPT_DIDCOMM_AIP1.to_string()],
            handshake_protocols: vec![HANDSHAKE_PROTOCOL_CONNECTIONS.to_string()],
            services: vec![OutOfBandService::new(
                legacy.recipient_keys,
                legacy.service_endpoint,
            )],
        }
    }
}

impl OutOfBandInvitation {
    pub fn new(label: String, services: Vec<OutOfBandService>) -> Self {
        Self {
            message_type: INVITATION_TYPE.to_string(),
            id: Uuid::new_v4().to_string(),
            label,
            accept: vec![
                ACCEPT_DIDCOMM_AIP1.to_string(),
                ACCEPT_DIDCOMM_AIP2.to_string(),
            ],
            handshake_protocols: vec![HANDSHAKE_PROTOCOL_DIDEXCHANGE.to_string()],
            services,
        }
    }

    pub fn get_id(&self) -> &String {
        &self.id
    }

    pub fn get_label(&self) -> &String {
        &self.label
    }

    pub fn get_handshake_protocols(&self) -> &Vec<String> {
        &self.handshake_protocols
    }

    pub fn get_services(&self) -> &Vec<OutOfBandService> {
        &self.services
    }

    /// `to_url` projects the invitation into its URL form, `{domain}?oob={base64url(json)}`
    ///
    /// The `domain` is kept as given, it is only parsed to be validated. A domain already
    /// carrying a query gets the `oob` parameter appended to it.
    pub fn to_url(&self, domain: &str) -> Result<String, OutOfBandError> {
        let parsed =
            Url::parse(domain).map_err(|err| OutOfBandError::InvalidUrl(err.to_string()))?;

        if parsed.fragment().is_some() {
            return Err(OutOfBandError::InvalidUrl(format!(
                "fragment not allowed in invitation domain: {}",
                domain
            )));
        }

        let json =
            serde_json::to_vec(self).map_err(|err| OutOfBandError::JSONError(err.to_string()))?;

        let separator = match parsed.query() {
            Some(query) if !query.is_empty() => "&",
            Some(_) => "",
            None => "?",
        };

        Ok(format!(
            "{}{}{}={}",
            domain,
            separator,
            QUERY_PARAM_OOB,
            URL_SAFE_NO_PAD.encode(json)
        ))
    }

    /// `from_url` parses an invitation URL, both the `oob` and the legacy `c_i` query
    /// parameters are supported
    pub fn from_url(invitation_url: &str) -> Result<Self, OutOfBandError> {
        let url = Url::parse(invitation_url)
            .map_err(|err| OutOfBandError::InvalidUrl(err.to_string()))?;

        let oob = url
            .query_pairs()
            .find(|(key, _)| key == QUERY_PARAM_OOB)
            .map(|(_, value)| value.into_owned());

        if let Some(encoded) = oob {
            let decoded = decode(&encoded)?;
            return serde_json::from_slice(&decoded)
                .map_err(|err| OutOfBandError::JSONError(err.to_string()));
        }

        let legacy = url
            .query_pairs()
            .find(|(key, _)| key == QUERY_PARAM_LEGACY)
            .map(|(_, value)| value.into_owned())
            .ok_or(OutOfBandError::MissingInvitation)?;

        let decoded = decode(&legacy)?;
        let invitation: LegacyInvitation = serde_json::from_slice(&decoded)
            .map_err(|err| OutOfBandError::JSONError(err.to_string()))?;

        Ok(invitation.into())
    }
}

// query values may come with or without padding, and older agents use the standard alphabet
fn decode(value: &str) -> Result<Vec<u8>, OutOfBandError> {
    let trimmed = value.trim_end_matches('=');
    URL_SAFE_NO_PAD.decode(trimmed).or_else(|_| {
        STANDARD_NO_PAD
            .decode(trimmed.replace(' ', "+"))
            .map_err(|err| OutOfBandError::DecodeError(err.to_string()))
    })
}

impl ToJSON for OutOfBandInvitation {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}
