use std::collections::BTreeSet;
use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};

use prople_issuance_core::credential::types::{
    CredentialPreviewAttribute, CredentialProtocolVersion,
};
use prople_issuance_core::credential::{AcceptPolicy, AlwaysAccept, NeverAccept, TrustedIssuers};
use prople_issuance_core::issuance::types::{
    CredentialDefinitionParams, IssuanceParams, DEFAULT_COMPLETION_TIMEOUT,
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_CREDENTIAL_DEFINITION_TAG, DEFAULT_INVITATION_DOMAIN,
};
use prople_issuance_core::ledger::types::SchemaTemplate;

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Schema {
    pub(super) name: String,
    pub(super) version: String,
    pub(super) attributes: Vec<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            name: "Identity".to_string(),
            version: "6.0".to_string(),
            attributes: vec!["name".to_string(), "age".to_string()],
        }
    }
}

impl ToValidate for Schema {
    fn validate(&self) -> Result<(), CommonError> {
        if self.name.is_empty() || self.version.is_empty() {
            return Err(CommonError::ValidationError(
                "config: schema:name and schema:version are required".to_string(),
            ));
        }

        if self.attributes.is_empty() {
            return Err(CommonError::ValidationError(
                "config: schema:attributes is missing".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct CredentialDefinition {
    pub(super) support_revocation: bool,
    pub(super) tag: String,
}

impl Default for CredentialDefinition {
    fn default() -> Self {
        Self {
            support_revocation: false,
            tag: DEFAULT_CREDENTIAL_DEFINITION_TAG.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Attribute {
    pub(super) name: String,
    pub(super) value: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum PolicyKind {
    Always,
    Never,
    TrustedIssuers,
}

/// `Policy` selects how the holder decides on a received credential offer
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Policy {
    pub(super) kind: PolicyKind,

    #[serde(default)]
    pub(super) trusted_issuers: Vec<String>,
}

impl Policy {
    pub fn get_kind(&self) -> PolicyKind {
        self.kind
    }

    pub fn build(&self) -> Box<dyn AcceptPolicy> {
        match self.kind {
            PolicyKind::Always => Box::new(AlwaysAccept),
            PolicyKind::Never => Box::new(NeverAccept),
            PolicyKind::TrustedIssuers => {
                Box::new(TrustedIssuers::new(self.trusted_issuers.to_owned()))
            }
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            kind: PolicyKind::Always,
            trusted_issuers: Vec::new(),
        }
    }
}

impl ToValidate for Policy {
    fn validate(&self) -> Result<(), CommonError> {
        if self.kind == PolicyKind::TrustedIssuers && self.trusted_issuers.is_empty() {
            return Err(CommonError::ValidationError(
                "config: accept_policy:trusted_issuers is missing".to_string(),
            ));
        }

        Ok(())
    }
}

/// `Issuance` describes the credential to issue and the flow's limits, timeouts are in seconds
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Issuance {
    pub(super) invitation_domain: String,
    pub(super) connection_timeout: u64,
    pub(super) completion_timeout: u64,
    pub(super) protocol_version: CredentialProtocolVersion,
    pub(super) schema: Schema,
    pub(super) credential_definition: CredentialDefinition,
    pub(super) attributes: Vec<Attribute>,
    pub(super) accept_policy: Policy,

    #[serde(default)]
    pub(super) comment: Option<String>,
}

impl Issuance {
    pub fn get_accept_policy(&self) -> Policy {
        self.accept_policy.to_owned()
    }

    pub fn get_completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout)
    }

    pub fn to_params(&self) -> IssuanceParams {
        IssuanceParams {
            invitation_domain: self.invitation_domain.to_owned(),
            connection_timeout: Duration::from_secs(self.connection_timeout),
            completion_timeout: Duration::from_secs(self.completion_timeout),
            protocol_version: self.protocol_version,
            schema: SchemaTemplate::new(
                &self.schema.name,
                &self.schema.version,
                self.schema.attributes.to_owned(),
            ),
            credential_definition: CredentialDefinitionParams {
                support_revocation: self.credential_definition.support_revocation,
                tag: self.credential_definition.tag.to_owned(),
            },
            attributes: self
                .attributes
                .iter()
                .map(|attr| CredentialPreviewAttribute::new(&attr.name, &attr.value))
                .collect(),
            comment: self.comment.to_owned(),
        }
    }
}

impl Default for Issuance {
    fn default() -> Self {
        Self {
            invitation_domain: DEFAULT_INVITATION_DOMAIN.to_string(),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT.as_secs(),
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT.as_secs(),
            protocol_version: CredentialProtocolVersion::V2,
            schema: Schema::default(),
            credential_definition: CredentialDefinition::default(),
            attributes: vec![
                Attribute {
                    name: "name".to_string(),
                    value: "Jane Doe".to_string(),
                },
                Attribute {
                    name: "age".to_string(),
                    value: "23".to_string(),
                },
            ],
            accept_policy: Policy::default(),
            comment: None,
        }
    }
}

impl ToValidate for Issuance {
    fn validate(&self) -> Result<(), CommonError> {
        if !self.invitation_domain.starts_with("http://")
            && !self.invitation_domain.starts_with("https://")
        {
            return Err(CommonError::ValidationError(
                "config: issuance:invitation_domain must be an http(s) url".to_string(),
            ));
        }

        if self.connection_timeout == 0 || self.completion_timeout == 0 {
            return Err(CommonError::ValidationError(
                "config: issuance timeouts must be greater than zero".to_string(),
            ));
        }

        _ = self.schema.validate()?;

        if self.credential_definition.tag.is_empty() {
            return Err(CommonError::ValidationError(
                "config: credential_definition:tag is missing".to_string(),
            ));
        }

        let offered: BTreeSet<&String> = self.attributes.iter().map(|attr| &attr.name).collect();
        let expected: BTreeSet<&String> = self.schema.attributes.iter().collect();
        if offered != expected || offered.len() != self.attributes.len() {
            return Err(CommonError::ValidationError(
                "config: issuance:attributes must match schema:attributes".to_string(),
            ));
        }

        _ = self.accept_policy.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::path::PathBuf;

    use rstdev_config::format::use_toml;
    use rstdev_config::parser::from_file;
    use rstdev_config::{types::ConfigError, Builder};
    use table_test::table_test;

    use crate::common::helpers;

    #[test]
    fn test_parse_issuance_config() -> Result<(), ConfigError> {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("src/config/fixtures");

        let toml_file = format!("{}/config_issuance.toml", path.display());
        let config_toml = {
            let config_builder: Result<Issuance, ConfigError> =
                Builder::new(from_file(toml_file)).fetch()?.parse(use_toml);

            config_builder
        };

        assert!(!config_toml.is_err());

        let config_issuance = config_toml.unwrap();
        assert!(helpers::validate(config_issuance.clone()).is_ok());
        assert_eq!(config_issuance.accept_policy.kind, PolicyKind::TrustedIssuers);

        let params = config_issuance.to_params();
        assert_eq!(params.invitation_domain, "https://example.org");
        assert_eq!(params.connection_timeout, Duration::from_secs(10));
        assert_eq!(params.protocol_version, CredentialProtocolVersion::V1);
        assert_eq!(params.schema.name, "Identity");
        assert_eq!(params.schema.attributes, vec!["name", "age"]);
        assert_eq!(params.credential_definition.tag, "default");
        assert_eq!(
            params.attributes,
            vec![
                CredentialPreviewAttribute::new("name", "Jane Doe"),
                CredentialPreviewAttribute::new("age", "23"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_default_matches_default_params() {
        let issuance = Issuance::default();
        assert!(helpers::validate(issuance.clone()).is_ok());
        assert_eq!(issuance.to_params(), IssuanceParams::default())
    }

    #[test]
    fn test_policy_kind_from_toml() {
        let table = vec![
            ("kind = \"always\"", PolicyKind::Always),
            ("kind = \"never\"", PolicyKind::Never),
            (
                "kind = \"trusted-issuers\"\ntrusted_issuers = [\"did\"]",
                PolicyKind::TrustedIssuers,
            ),
        ];

        for (validator, input, expected) in table_test!(table) {
            let policy: Policy = toml::from_str(input).unwrap();

            validator
                .given(input)
                .when("parsed")
                .then(&format!("{:?}", expected))
                .assert_eq(expected, policy.get_kind());
        }
    }

    #[test]
    fn test_issuance_validation_failed() {
        let mut issuance = Issuance::default();
        issuance.invitation_domain = "example.org".to_string();
        let validation = helpers::validate(issuance.clone());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("issuance:invitation_domain"));

        let mut issuance = Issuance::default();
        issuance.attributes.pop();
        let validation = helpers::validate(issuance.clone());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("must match schema:attributes"));

        let mut issuance = Issuance::default();
        issuance.accept_policy.kind = PolicyKind::TrustedIssuers;
        let validation = helpers::validate(issuance);
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("accept_policy:trusted_issuers"))
    }
}
