// ABOUTME: CLI configuration assembled from the environment
// ABOUTME: Covers platform credentials, the template tag override and template locations

use std::path::PathBuf;
use thiserror::Error;
use tplcheck_config::{constants, non_empty_var, var_or};
use tplcheck_sandbox::{E2BConfig, ProviderError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{} is not set. Export it or add it to .env", constants::E2B_API_KEY)]
    MissingApiKey,
    #[error("Invalid platform configuration: {0}")]
    Platform(#[from] ProviderError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub e2b: E2BConfig,
    pub template_tag: Option<String>,
    pub source_tag: String,
    pub templates_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if non_empty_var(constants::E2B_API_KEY).is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Config {
            e2b: E2BConfig::from_env()?,
            template_tag: non_empty_var(constants::E2B_TEMPLATE_TAG),
            source_tag: var_or(constants::E2B_SOURCE_TAG, constants::DEFAULT_SOURCE_TAG),
            templates_dir: PathBuf::from(var_or(
                constants::TPLCHECK_TEMPLATES_DIR,
                constants::DEFAULT_TEMPLATES_DIR,
            )),
        })
    }
}
