//! # Get module
//!
//! This module provides the command printing the common-secrets descriptor of
//! a namespace

use std::sync::Arc;

use tracing::{debug, error};

use crate::svc::{
    crd::vault_static_secret::{VaultStaticSecret, COMMON_SECRETS_NAME},
    k8s::{CommonSecretApi, Context},
};

// -----------------------------------------------------------------------------
// GetError enum

#[derive(thiserror::Error, Debug)]
pub enum GetError {
    #[error("failed to serialize vault static secret, {0}")]
    Serialize(serde_yaml::Error),
}

// -----------------------------------------------------------------------------
// Helpers functions

/// returns the descriptor as a yaml document, server side managed fields
/// are omitted
pub fn render(obj: &VaultStaticSecret) -> Result<String, GetError> {
    let mut obj = obj.to_owned();
    obj.metadata.managed_fields = None;

    Ok(format!(
        "---\n{}",
        serde_yaml::to_string(&obj).map_err(GetError::Serialize)?
    ))
}

// -----------------------------------------------------------------------------
// get function

/// prints the descriptor of the namespace if any and returns it, failures to
/// retrieve it are handled as if the descriptor is missing
pub async fn get<C>(ctx: Arc<Context<C>>) -> Result<Option<VaultStaticSecret>, GetError>
where
    C: CommonSecretApi,
{
    debug!(namespace = &ctx.namespace, "retrieve vault static secret");

    let obj = match ctx.client.get_static_secret(&ctx.namespace).await {
        Ok(obj) => obj,
        Err(err) => {
            if ctx.debug {
                error!(
                    namespace = &ctx.namespace,
                    name = COMMON_SECRETS_NAME,
                    error = err.to_string(),
                    "could not retrieve vault static secret",
                );
            }

            return Ok(None);
        }
    };

    match &obj {
        Some(obj) => print!("{}", render(obj)?),
        None if ctx.debug => error!(
            namespace = &ctx.namespace,
            name = COMMON_SECRETS_NAME,
            "vault static secret does not exist",
        ),
        None => {}
    }

    Ok(obj)
}
