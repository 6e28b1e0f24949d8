//! # Secret module
//!
//! This module provide helpers to inspect the secret materialized by the vault
//! secrets operator from the common-secrets descriptor

use k8s_openapi::api::core::v1::Secret;
use kube::Client;

use crate::svc::{crd::vault_static_secret::COMMON_SECRETS_NAME, k8s::resource};

// -----------------------------------------------------------------------------
// Constants

/// bookkeeping key written by the vault secrets operator alongside the values
pub const RAW_KEY: &str = "_raw";

// -----------------------------------------------------------------------------
// Helpers functions

/// removes the bookkeeping key from the secret
pub fn strip(mut secret: Secret) -> Secret {
    if let Some(data) = secret.data.as_mut() {
        data.remove(RAW_KEY);
    }

    secret
}

/// returns the keys held by the secret, bookkeeping key excluded
pub fn keys(secret: &Secret) -> Vec<String> {
    secret
        .data
        .iter()
        .flat_map(|data| data.keys())
        .filter(|key| *key != RAW_KEY)
        .cloned()
        .collect()
}

/// retrieve the common secrets of the namespace without its bookkeeping key
pub async fn get(client: Client, namespace: &str) -> Result<Option<Secret>, kube::Error> {
    Ok(resource::get::<Secret>(client, namespace, COMMON_SECRETS_NAME)
        .await?
        .map(strip))
}
