use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::info;
use rst_common::with_tokio::tokio::sync::RwLock;

use prople_issuance_core::agent::types::AgentError;
use prople_issuance_core::ledger::types::{
    CredentialDefinition, CredentialDefinitionTemplate, LedgerAPI, Schema, SchemaTemplate,
    CREDENTIAL_DEFINITION_TYPE_CL, LEDGER_OBJECT_VERSION,
};

#[derive(Debug, Default)]
struct LedgerState {
    schemas: HashMap<String, Schema>,
    credential_definitions: HashMap<String, CredentialDefinition>,
    seq_no: u64,
}

/// `MemoryLedger` is a ledger shared by every agent built on top of it
///
/// Each write is given the next transaction sequence number
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    id: String,
    is_production: bool,
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryLedger {
    pub fn new(id: String, is_production: bool) -> Self {
        Self {
            id,
            is_production,
            state: Arc::new(RwLock::new(LedgerState::default())),
        }
    }

    pub fn get_id(&self) -> &String {
        &self.id
    }

    pub fn is_production(&self) -> bool {
        self.is_production
    }

    pub async fn write_schema(
        &self,
        did: &str,
        template: SchemaTemplate,
    ) -> Result<Schema, AgentError> {
        if template.name.is_empty() || template.version.is_empty() {
            return Err(AgentError::ValidationError(
                "schema name and version are required".to_string(),
            ));
        }

        let attributes: BTreeSet<&String> = template.attributes.iter().collect();
        if attributes.is_empty() || attributes.len() != template.attributes.len() {
            return Err(AgentError::ValidationError(
                "schema attributes must be unique and not empty".to_string(),
            ));
        }

        let id = format!("{}:2:{}:{}", did, template.name, template.version);

        let mut state = self.state.write().await;
        if state.schemas.contains_key(&id) {
            return Err(AgentError::LedgerError(format!("schema already exists: {}", id)));
        }

        state.seq_no += 1;
        let schema = Schema {
            id: id.clone(),
            name: template.name,
            version: template.version,
            attr_names: template.attributes,
            seq_no: state.seq_no,
            ver: LEDGER_OBJECT_VERSION.to_string(),
        };

        state.schemas.insert(id, schema.clone());
        info!("[{}] schema written: {}", self.id, schema.id);
        Ok(schema)
    }

    pub async fn write_credential_definition(
        &self,
        did: &str,
        template: CredentialDefinitionTemplate,
    ) -> Result<CredentialDefinition, AgentError> {
        if template.tag.is_empty() {
            return Err(AgentError::ValidationError(
                "credential definition tag is required".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        let schema = state.schemas.get(&template.schema.id).cloned().ok_or_else(|| {
            AgentError::LedgerError(format!("schema not found: {}", template.schema.id))
        })?;

        let id = format!("{}:3:CL:{}:{}", did, schema.seq_no, template.tag);
        if state.credential_definitions.contains_key(&id) {
            return Err(AgentError::LedgerError(format!(
                "credential definition already exists: {}",
                id
            )));
        }

        state.seq_no += 1;
        let definition = CredentialDefinition {
            id: id.clone(),
            schema_id: schema.id,
            definition_type: CREDENTIAL_DEFINITION_TYPE_CL.to_string(),
            tag: template.tag,
            support_revocation: template.support_revocation,
            ver: LEDGER_OBJECT_VERSION.to_string(),
        };

        state.credential_definitions.insert(id, definition.clone());
        info!("[{}] credential definition written: {}", self.id, definition.id);
        Ok(definition)
    }

    pub async fn read_schema(&self, id: &str) -> Result<Schema, AgentError> {
        let state = self.state.read().await;
        state
            .schemas
            .get(id)
            .cloned()
            .ok_or_else(|| AgentError::RecordNotFound(format!("schema: {}", id)))
    }

    pub async fn read_credential_definition(
        &self,
        id: &str,
    ) -> Result<CredentialDefinition, AgentError> {
        let state = self.state.read().await;
        state
            .credential_definitions
            .get(id)
            .cloned()
            .ok_or_else(|| AgentError::RecordNotFound(format!("credential definition: {}", id)))
    }
}

/// `LedgerModule` writes to the [`MemoryLedger`] on behalf of an agent's public DID
#[derive(Clone)]
pub struct LedgerModule {
    did: String,
    ledger: MemoryLedger,
}

impl LedgerModule {
    pub fn new(did: String, ledger: MemoryLedger) -> Self {
        Self { did, ledger }
    }
}

#[async_trait]
impl LedgerAPI for LedgerModule {
    async fn register_schema(&self, template: SchemaTemplate) -> Result<Schema, AgentError> {
        self.ledger.write_schema(&self.did, template).await
    }

    async fn get_schema(&self, id: String) -> Result<Schema, AgentError> {
        self.ledger.read_schema(&id).await
    }

    async fn register_credential_definition(
        &self,
        template: CredentialDefinitionTemplate,
    ) -> Result<CredentialDefinition, AgentError> {
        self.ledger
            .write_credential_definition(&self.did, template)
            .await
    }

    async fn get_credential_definition(
        &self,
        id: String,
    ) -> Result<CredentialDefinition, AgentError> {
        self.ledger.read_credential_definition(&id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::with_tokio::tokio;

    const DID: &str = "MDAwMDAwMDBJc3N1ZXIwMQ";

    fn identity_template() -> SchemaTemplate {
        SchemaTemplate::new("Identity", "6.0", vec!["name".to_string(), "age".to_string()])
    }

    #[tokio::test]
    async fn test_register_schema_and_definition() {
        let module = LedgerModule::new(DID.to_string(), MemoryLedger::new("test".to_string(), false));

        let schema = module.register_schema(identity_template()).await.unwrap();
        assert_eq!(schema.id, format!("{}:2:Identity:6.0", DID));
        assert_eq!(schema.seq_no, 1);
        assert_eq!(schema.attr_names, vec!["name", "age"]);

        let definition = module
            .register_credential_definition(CredentialDefinitionTemplate::new(
                schema.clone(),
                false,
                "default",
            ))
            .await
            .unwrap();
        assert_eq!(definition.id, format!("{}:3:CL:1:default", DID));
        assert_eq!(definition.schema_id, schema.id);
        assert_eq!(definition.definition_type, "CL");

        let resolved = module.get_credential_definition(definition.id.clone()).await;
        assert_eq!(resolved, Ok(definition));

        let resolved = module.get_schema(schema.id.clone()).await;
        assert_eq!(resolved, Ok(schema))
    }

    #[test]
    fn test_ledger_identity() {
        let ledger = MemoryLedger::new("bcovrin-test".to_string(), false);
        assert_eq!(ledger.get_id(), "bcovrin-test");
        assert!(!ledger.is_production());

        let shared = ledger.clone();
        assert!(!shared.is_production());
        assert!(MemoryLedger::new("sovrin".to_string(), true).is_production())
    }

    #[tokio::test]
    async fn test_duplicate_schema() {
        let module = LedgerModule::new(DID.to_string(), MemoryLedger::new("test".to_string(), false));

        assert!(module.register_schema(identity_template()).await.is_ok());
        let duplicate = module.register_schema(identity_template()).await;
        assert!(matches!(duplicate, Err(AgentError::LedgerError(_))))
    }

    #[tokio::test]
    async fn test_invalid_schema_template() {
        let module = LedgerModule::new(DID.to_string(), MemoryLedger::new("test".to_string(), false));

        let template = SchemaTemplate::new("Identity", "6.0", vec!["name".to_string(), "name".to_string()]);
        let schema = module.register_schema(template).await;
        assert!(matches!(schema, Err(AgentError::ValidationError(_))))
    }

    #[tokio::test]
    async fn test_definition_unknown_schema() {
        let module = LedgerModule::new(DID.to_string(), MemoryLedger::new("test".to_string(), false));

        let unknown = Schema {
            id: format!("{}:2:Unknown:1.0", DID),
            name: "Unknown".to_string(),
            version: "1.0".to_string(),
            attr_names: vec!["name".to_string()],
            seq_no: 10,
            ver: LEDGER_OBJECT_VERSION.to_string(),
        };

        let definition = module
            .register_credential_definition(CredentialDefinitionTemplate::new(unknown, false, "default"))
            .await;
        assert!(matches!(definition, Err(AgentError::LedgerError(_))))
    }

    #[tokio::test]
    async fn test_shared_between_agents() {
        let ledger = MemoryLedger::new("test".to_string(), false);
        let issuer = LedgerModule::new(DID.to_string(), ledger.clone());
        let holder = LedgerModule::new("MDAwMDAwMDBIb2xkZXIwMQ".to_string(), ledger);

        let schema = issuer.register_schema(identity_template()).await.unwrap();
        let resolved = holder.get_schema(schema.id.clone()).await;
        assert_eq!(resolved, Ok(schema))
    }
}
