//! # Client module
//!
//! This module provide an helper to create a kubernetes client

use std::{convert::TryFrom, path::PathBuf};

use kube::{
    config::{KubeConfigOptions, Kubeconfig, KubeconfigError},
    Config,
};
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read kubernetes configuration file, {0}")]
    Kubeconfig(KubeconfigError),
    #[error("failed to create kubernetes client, {0}")]
    CreateClient(kube::Error),
}

/// returns a new kubernetes client from the given path if defined, otherwise
/// from the in-cluster environment, then from the `KUBECONFIG` environment
/// variable or the default `~/.kube/config` location
pub async fn try_new(path: Option<PathBuf>) -> Result<kube::Client, Error> {
    let config = match path {
        Some(path) => from_kubeconfig(Kubeconfig::read_from(path).map_err(Error::Kubeconfig)?).await?,
        None => match Config::incluster() {
            Ok(config) => config,
            Err(err) => {
                debug!(
                    error = err.to_string(),
                    "could not load in-cluster configuration, fallback on kubeconfig"
                );

                from_kubeconfig(Kubeconfig::read().map_err(Error::Kubeconfig)?).await?
            }
        },
    };

    kube::Client::try_from(config).map_err(Error::CreateClient)
}

async fn from_kubeconfig(kubeconfig: Kubeconfig) -> Result<Config, Error> {
    let opts = KubeConfigOptions::default();

    Config::from_custom_kubeconfig(kubeconfig, &opts)
        .await
        .map_err(Error::Kubeconfig)
}
