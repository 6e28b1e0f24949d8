//! # Values module
//!
//! This module provides the chart values structures and helpers to read them
//! from and write them back to the filesystem

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Error enumeration

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read values file '{0:?}', {1}")]
    Read(PathBuf, io::Error),
    #[error("failed to decode values file '{0:?}', {1}")]
    Decode(PathBuf, serde_yaml::Error),
    #[error("failed to encode values, {0}")]
    Encode(serde_yaml::Error),
    #[error("failed to write values file '{0:?}', {1}")]
    Write(PathBuf, io::Error),
}

// -----------------------------------------------------------------------------
// Env structure

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
pub struct Env {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "value")]
    pub value: String,
}

// -----------------------------------------------------------------------------
// Deployment structure

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
pub struct Deployment {
    #[serde(rename = "containerPort")]
    pub container_port: u16,
    #[serde(rename = "envs")]
    pub envs: Vec<Env>,
    /// keys the deployment needs which are not yet backed by the common secret
    #[serde(rename = "secrets")]
    pub secrets: Vec<String>,
    /// keys the deployment needs which are backed by the common secret
    #[serde(rename = "commonSecrets")]
    pub common_secrets: Vec<String>,
}

// -----------------------------------------------------------------------------
// Toggle structure

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
pub struct Toggle {
    #[serde(rename = "enabled")]
    pub enabled: bool,
}

// -----------------------------------------------------------------------------
// Image structure

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
pub struct Image {
    #[serde(rename = "repository")]
    pub repository: String,
    #[serde(rename = "tag")]
    pub tag: String,
    #[serde(rename = "pullPolicy")]
    pub pull_policy: String,
}

// -----------------------------------------------------------------------------
// Values structure

/// chart values of a deployment, keys which are not listed here are dropped
/// when the file is written back
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
pub struct Values {
    #[serde(rename = "deployment")]
    pub deployment: Deployment,
    #[serde(rename = "vaultSecrets")]
    pub vault_secrets: Toggle,
    #[serde(rename = "image")]
    pub image: Image,
    #[serde(rename = "namespace")]
    pub namespace: String,
    #[serde(rename = "ingress")]
    pub ingress: Toggle,
    #[serde(rename = "livenessProbe")]
    pub liveness_probe: Toggle,
    #[serde(rename = "readinessProbe")]
    pub readiness_probe: Toggle,
}

impl Values {
    /// returns if the injection of vault secrets is enabled for the deployment
    pub fn vault_enabled(&self) -> bool {
        self.vault_secrets.enabled
    }
}

// -----------------------------------------------------------------------------
// Helpers functions

/// read and decode the values file at the given path
pub fn read(path: &Path) -> Result<Values, Error> {
    let content = fs::read_to_string(path).map_err(|err| Error::Read(path.to_owned(), err))?;

    serde_yaml::from_str(&content).map_err(|err| Error::Decode(path.to_owned(), err))
}

/// encode and write the values to the given path, replacing the whole file
pub fn write(path: &Path, values: &Values) -> Result<(), Error> {
    let content = serde_yaml::to_string(values).map_err(Error::Encode)?;

    fs::write(path, content).map_err(|err| Error::Write(path.to_owned(), err))
}
