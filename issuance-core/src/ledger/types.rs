use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::agent::types::AgentError;

pub const CREDENTIAL_DEFINITION_TYPE_CL: &str = "CL";
pub const LEDGER_OBJECT_VERSION: &str = "1.0";

/// `SchemaTemplate` is the input used to register a new [`Schema`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct SchemaTemplate {
    pub attributes: Vec<String>,
    pub name: String,
    pub version: String,
}

impl SchemaTemplate {
    pub fn new(name: &str, version: &str, attributes: Vec<String>) -> Self {
        Self {
            attributes,
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

/// `Schema` is a registered ledger object, its id formatted as `{did}:2:{name}:{version}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct Schema {
    pub id: String,
    pub name: String,
    pub version: String,
    pub attr_names: Vec<String>,
    pub seq_no: u64,
    pub ver: String,
}

impl ToJSON for Schema {
    fn to_json(&self) -> Result<String, BaseError> {
        serde_json::to_string(self).map_err(|err| BaseError::ToJSONError(err.to_string()))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct CredentialDefinitionTemplate {
    pub schema: Schema,
    pub support_revocation: bool,
    pub tag: String,
}

impl CredentialDefinitionTemplate {
    pub fn new(schema: Schema, support_revocation: bool, tag: &str) -> Self {
        Self {
            schema,
            support_revocation,
            tag: tag.to_string(),
        }
    }
}

/// `CredentialDefinition` is a registered ledger object, its id formatted as
/// `{did}:3:CL:{schema_seq_no}:{tag}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct CredentialDefinition {
    pub id: String,
    pub schema_id: String,

    #[serde(rename = "type")]
    pub definition_type: String,

    pub tag: String,
    pub support_revocation: bool,
    pub ver: String,
}

impl ToJSON for CredentialDefinition {
    fn to_json(&self) -> Result<String, BaseError> {
        serde_json::to_string(self).map_err(|err| BaseError::ToJSONError(err.to_string()))
    }
}

/// `LedgerAPI` is the agent module used to register and resolve ledger objects
///
/// Registration failures must be surfaced as [`AgentError::LedgerError`]
#[async_trait]
pub trait LedgerAPI: Clone + Send + Sync + 'static {
    async fn register_schema(&self, template: SchemaTemplate) -> Result<Schema, AgentError>;
    async fn get_schema(&self, id: String) -> Result<Schema, AgentError>;

    async fn register_credential_definition(
        &self,
        template: CredentialDefinitionTemplate,
    ) -> Result<CredentialDefinition, AgentError>;

    async fn get_credential_definition(
        &self,
        id: String,
    ) -> Result<CredentialDefinition, AgentError>;
}
