//! # Delete module
//!
//! This module provides the command deleting the common-secrets descriptor of
//! a namespace

use std::sync::Arc;

use tracing::debug;

use crate::svc::{
    crd::vault_static_secret::COMMON_SECRETS_NAME,
    k8s::{CommonSecretApi, Context},
};

// -----------------------------------------------------------------------------
// DeleteError enum

#[derive(thiserror::Error, Debug)]
pub enum DeleteError {
    #[error("failed to delete vault static secret '{0}' in namespace '{1}', {2}")]
    Delete(String, String, kube::Error),
}

// -----------------------------------------------------------------------------
// delete function

pub async fn delete<C>(ctx: Arc<Context<C>>) -> Result<(), DeleteError>
where
    C: CommonSecretApi,
{
    debug!(namespace = &ctx.namespace, "delete vault static secret");

    ctx.client
        .delete_static_secret(&ctx.namespace)
        .await
        .map_err(|err| {
            DeleteError::Delete(COMMON_SECRETS_NAME.into(), ctx.namespace.to_owned(), err)
        })?;

    println!("Successfully deleted {}", COMMON_SECRETS_NAME);
    Ok(())
}
