//! # Configuration module
//!
//! This module provide utilities and helpers to interact with the configuration

use std::{convert::TryFrom, env, path::PathBuf};

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Constants

pub const ENVIRONMENT_PREFIX: &str = "HELM_VAULT";

pub const DEFAULT_MOUNT: &str = "core";
pub const DEFAULT_SECRET_TYPE: &str = "kv-v2";
pub const DEFAULT_REFRESH_AFTER: &str = "5m";
pub const DEFAULT_MANAGED_BY: &str = "vault";

// -----------------------------------------------------------------------------
// Descriptor structure

/// settings used to build the common-secrets descriptor when it does not
/// exist yet
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Descriptor {
    #[serde(rename = "mount")]
    pub mount: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "refresh_after")]
    pub refresh_after: String,
    #[serde(rename = "hmac_secret_data")]
    pub hmac_secret_data: bool,
    #[serde(rename = "create_destination")]
    pub create_destination: bool,
    #[serde(rename = "managed_by")]
    pub managed_by: String,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self {
            mount: DEFAULT_MOUNT.to_owned(),
            kind: DEFAULT_SECRET_TYPE.to_owned(),
            refresh_after: DEFAULT_REFRESH_AFTER.to_owned(),
            hmac_secret_data: true,
            create_destination: true,
            managed_by: DEFAULT_MANAGED_BY.to_owned(),
        }
    }
}

// -----------------------------------------------------------------------------
// ConfigurationError enum

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("failed to load file '{0:?}', {1}")]
    File(PathBuf, ConfigError),
    #[error("failed to load configuration, {0}")]
    Cast(ConfigError),
    #[error("failed to set default for key '{0}', {1}")]
    Default(String, ConfigError),
}

// -----------------------------------------------------------------------------
// Configuration structures

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct Configuration {
    #[serde(rename = "descriptor")]
    pub descriptor: Descriptor,
}

impl TryFrom<PathBuf> for Configuration {
    type Error = ConfigurationError;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        let config = Self::builder()?
            .add_source(File::from(path.to_owned()).required(true))
            .build()
            .map_err(|err| ConfigurationError::File(path, err))?;

        config.try_deserialize().map_err(ConfigurationError::Cast)
    }
}

impl Configuration {
    /// returns a builder holding defaults and the environment source, files
    /// added afterwards take precedence over both
    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigurationError> {
        let defaults: [(&str, config::Value); 6] = [
            ("descriptor.mount", DEFAULT_MOUNT.into()),
            ("descriptor.type", DEFAULT_SECRET_TYPE.into()),
            ("descriptor.refresh_after", DEFAULT_REFRESH_AFTER.into()),
            ("descriptor.hmac_secret_data", true.into()),
            ("descriptor.create_destination", true.into()),
            ("descriptor.managed_by", DEFAULT_MANAGED_BY.into()),
        ];

        let mut builder = Config::builder();
        for (key, value) in defaults {
            builder = builder
                .set_default(key, value)
                .map_err(|err| ConfigurationError::Default(key.into(), err))?;
        }

        Ok(builder.add_source(
            Environment::with_prefix(ENVIRONMENT_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        ))
    }

    pub fn try_default() -> Result<Self, ConfigurationError> {
        let mut paths = vec![
            PathBuf::from(format!("/usr/share/{}/config", env!("CARGO_PKG_NAME"))),
            PathBuf::from(format!("/etc/{}/config", env!("CARGO_PKG_NAME"))),
        ];

        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(format!(
                "{}/.config/{}/config",
                home,
                env!("CARGO_PKG_NAME")
            )));
        }

        paths.push(PathBuf::from("config"));

        let mut builder = Self::builder()?;
        for path in &paths {
            builder = builder.add_source(File::from(path.to_owned()).required(false));
        }

        builder
            .build()
            .map_err(ConfigurationError::Cast)?
            .try_deserialize()
            .map_err(ConfigurationError::Cast)
    }
}
