//! # Kubernetes module
//!
//! This module provide the execution context and the kubernetes requests made
//! on the common-secrets descriptor and its materialized secret

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;

use crate::svc::{
    cfg::Configuration,
    crd::vault_static_secret::{VaultStaticSecret, COMMON_SECRETS_NAME},
};

pub mod client;
#[cfg(test)]
pub mod fake;
pub mod resource;
pub mod secret;

// -----------------------------------------------------------------------------
// Context structure

/// contains the client to interact with kubernetes and the settings of the
/// current invocation
#[derive(Clone)]
pub struct Context<C> {
    pub client: C,
    pub namespace: String,
    pub debug: bool,
    pub config: Arc<Configuration>,
}

impl<C> Context<C> {
    pub fn new(client: C, namespace: String, debug: bool, config: Arc<Configuration>) -> Self {
        Self {
            client,
            namespace,
            debug,
            config,
        }
    }
}

// -----------------------------------------------------------------------------
// CommonSecretApi trait

/// provides the requests made on the common-secrets descriptor and secret of a
/// namespace, a missing resource is returned as [`None`]
#[async_trait]
pub trait CommonSecretApi: Send + Sync + 'static {
    /// retrieve the common-secrets descriptor
    async fn get_static_secret(
        &self,
        namespace: &str,
    ) -> Result<Option<VaultStaticSecret>, kube::Error>;

    /// create the given descriptor
    async fn create_static_secret(
        &self,
        obj: &VaultStaticSecret,
    ) -> Result<VaultStaticSecret, kube::Error>;

    /// apply the json patch on the common-secrets descriptor
    async fn patch_static_secret(
        &self,
        namespace: &str,
        patch: json_patch::Patch,
    ) -> Result<VaultStaticSecret, kube::Error>;

    /// delete the common-secrets descriptor
    async fn delete_static_secret(&self, namespace: &str) -> Result<(), kube::Error>;

    /// retrieve the common-secrets secret without its bookkeeping key
    async fn get_secret(&self, namespace: &str) -> Result<Option<Secret>, kube::Error>;
}

#[async_trait]
impl CommonSecretApi for kube::Client {
    async fn get_static_secret(
        &self,
        namespace: &str,
    ) -> Result<Option<VaultStaticSecret>, kube::Error> {
        resource::get(self.to_owned(), namespace, COMMON_SECRETS_NAME).await
    }

    async fn create_static_secret(
        &self,
        obj: &VaultStaticSecret,
    ) -> Result<VaultStaticSecret, kube::Error> {
        resource::create(self.to_owned(), obj).await
    }

    async fn patch_static_secret(
        &self,
        namespace: &str,
        patch: json_patch::Patch,
    ) -> Result<VaultStaticSecret, kube::Error> {
        resource::patch(self.to_owned(), namespace, COMMON_SECRETS_NAME, patch).await
    }

    async fn delete_static_secret(&self, namespace: &str) -> Result<(), kube::Error> {
        resource::delete::<VaultStaticSecret>(self.to_owned(), namespace, COMMON_SECRETS_NAME)
            .await
    }

    async fn get_secret(&self, namespace: &str) -> Result<Option<Secret>, kube::Error> {
        secret::get(self.to_owned(), namespace).await
    }
}
