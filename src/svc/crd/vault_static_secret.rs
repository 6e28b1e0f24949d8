//! # VaultStaticSecret custom resource
//!
//! This module provide the vault static secret custom resource, owned by the
//! vault secrets operator, and helpers to build and patch the common-secrets
//! instance

use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    path::Path,
};

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::svc::cfg;

// -----------------------------------------------------------------------------
// Constants

pub const COMMON_SECRETS_NAME: &str = "common-secrets";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const DEPLOYMENT_KIND: &str = "Deployment";
pub const ROLLOUT_RESTART_TARGETS_PATH: &str = "/spec/rolloutRestartTargets";

// -----------------------------------------------------------------------------
// Environment enum

/// environment tag used as first segment of the secret path in vault
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Environment {
    Dev,
    Qa,
    Uat,
    Prod,
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Dev => write!(f, "dev"),
            Self::Qa => write!(f, "qa"),
            Self::Uat => write!(f, "uat"),
            Self::Prod => write!(f, "prod"),
        }
    }
}

impl From<&Path> for Environment {
    /// infers the environment from well-known substrings of the values file
    /// path, checked in order, falling back to dev
    fn from(path: &Path) -> Self {
        let path = path.to_string_lossy();
        let contains = |needles: &[&str]| needles.iter().any(|n| path.contains(n));

        if contains(&["dev", "integration"]) {
            Self::Dev
        } else if contains(&["qa"]) {
            Self::Qa
        } else if contains(&["uat", "staging"]) {
            Self::Uat
        } else if contains(&["prod", "production"]) {
            Self::Prod
        } else {
            Self::Dev
        }
    }
}

// -----------------------------------------------------------------------------
// RolloutRestartTarget structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct RolloutRestartTarget {
    #[serde(rename = "kind")]
    pub kind: String,
    #[serde(rename = "name")]
    pub name: String,
}

impl RolloutRestartTarget {
    pub fn deployment(name: &str) -> Self {
        Self {
            kind: DEPLOYMENT_KIND.to_owned(),
            name: name.to_owned(),
        }
    }
}

// -----------------------------------------------------------------------------
// Destination structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct Destination {
    #[serde(rename = "create", default)]
    pub create: bool,
    #[serde(rename = "name")]
    pub name: String,
}

// -----------------------------------------------------------------------------
// Spec structure

#[derive(CustomResource, JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[kube(group = "secrets.hashicorp.com")]
#[kube(version = "v1beta1")]
#[kube(kind = "VaultStaticSecret")]
#[kube(singular = "vaultstaticsecret")]
#[kube(plural = "vaultstaticsecrets")]
#[kube(namespaced)]
#[kube(derive = "PartialEq")]
pub struct Spec {
    #[serde(rename = "mount")]
    pub mount: String,
    #[serde(rename = "path")]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "refreshAfter", default)]
    pub refresh_after: String,
    #[serde(rename = "destination", default)]
    pub destination: Destination,
    #[serde(rename = "hmacSecretData", default)]
    pub hmac_secret_data: bool,
    #[serde(rename = "rolloutRestartTargets", default)]
    pub rollout_restart_targets: Vec<RolloutRestartTarget>,
}

// -----------------------------------------------------------------------------
// Helpers functions

/// returns the vault path of the common secrets for the given environment
pub fn path(environment: Environment) -> String {
    format!("{}/{}", environment, COMMON_SECRETS_NAME)
}

/// returns a new common-secrets descriptor for the namespace, the vault path
/// is derived from the location of the values file
pub fn new(namespace: &str, values: &Path, config: &cfg::Descriptor) -> VaultStaticSecret {
    let mut obj = VaultStaticSecret::new(
        COMMON_SECRETS_NAME,
        Spec {
            mount: config.mount.to_owned(),
            path: path(Environment::from(values)),
            kind: config.kind.to_owned(),
            refresh_after: config.refresh_after.to_owned(),
            destination: Destination {
                create: config.create_destination,
                name: COMMON_SECRETS_NAME.to_owned(),
            },
            hmac_secret_data: config.hmac_secret_data,
            rollout_restart_targets: vec![],
        },
    );

    obj.metadata.namespace = Some(namespace.to_owned());
    obj.metadata.labels = Some(BTreeMap::from([(
        MANAGED_BY_LABEL.to_owned(),
        config.managed_by.to_owned(),
    )]));

    obj
}

/// returns a json patch replacing the whole rollout restart targets list
pub fn rollout_restart_targets_patch(
    targets: &[RolloutRestartTarget],
) -> Result<json_patch::Patch, serde_json::Error> {
    serde_json::from_value(serde_json::json!([{
        "op": "add",
        "path": ROLLOUT_RESTART_TARGETS_PATH,
        "value": targets,
    }]))
}
