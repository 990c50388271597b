use rstdev_config::format::use_toml;
use rstdev_config::parser::from_file;
use rstdev_config::Builder;

use crate::common::helpers;
use crate::common::types::CommonError;

use super::Config;

/// `Parser` loads the TOML config file, the returned [`Config`] is already validated
pub struct Parser {
    conf_file: String,
}

impl Parser {
    pub fn new(conf_file: String) -> Self {
        Self { conf_file }
    }

    pub fn parse(&self) -> Result<Config, CommonError> {
        let config: Config = Builder::new(from_file(self.conf_file.to_owned()))
            .fetch()
            .and_then(|builder| builder.parse(use_toml))
            .map_err(|err| CommonError::ConfigError(format!("{}: {:?}", self.conf_file, err)))?;

        helpers::validate(config.clone())?;
        Ok(config)
    }
}
