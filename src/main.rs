//! # Helm vault
//!
//! A helm plugin that keeps the common-secrets vault static secret of a
//! namespace in sync with the secrets declared in chart values

use std::{convert::TryFrom, sync::Arc};

use clap::Parser;
use tracing::{debug, error};

use crate::{
    cmd::{Args, Executor},
    svc::{
        cfg::Configuration,
        k8s::{client, Context},
    },
};

pub mod cmd;
pub mod logging;
pub mod svc;

// -----------------------------------------------------------------------------
// Error enumeration

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to interact with command line interface, {0}")]
    Command(cmd::Error),
    #[error("failed to initialize logging system, {0}")]
    Logging(logging::Error),
    #[error("failed to load configuration, {0}")]
    Configuration(svc::cfg::ConfigurationError),
    #[error("failed to create kubernetes client, {0}")]
    Client(client::Error),
}

impl From<cmd::Error> for Error {
    fn from(err: cmd::Error) -> Self {
        Self::Command(err)
    }
}

impl From<logging::Error> for Error {
    fn from(err: logging::Error) -> Self {
        Self::Logging(err)
    }
}

impl From<svc::cfg::ConfigurationError> for Error {
    fn from(err: svc::cfg::ConfigurationError) -> Self {
        Self::Configuration(err)
    }
}

impl From<client::Error> for Error {
    fn from(err: client::Error) -> Self {
        Self::Client(err)
    }
}

// -----------------------------------------------------------------------------
// main entrypoint

async fn run(args: Args) -> Result<(), Error> {
    let config = Arc::new(match &args.config {
        Some(path) => Configuration::try_from(path.to_owned())?,
        None => Configuration::try_default()?,
    });

    debug!(
        namespace = &args.namespace,
        debug = args.debug,
        "execute {} command",
        args.command.name(),
    );

    let kube_client = client::try_new(args.kubeconfig.to_owned()).await?;
    let ctx = Arc::new(Context::new(
        kube_client,
        args.namespace.to_owned(),
        args.debug,
        config,
    ));

    Ok(args.command.execute(ctx).await?)
}

#[tokio::main]
pub(crate) async fn main() -> Result<(), Error> {
    let args = Args::parse();
    logging::initialize(args.log_verbosity())?;

    if let Err(err) = run(args).await {
        error!(
            error = err.to_string(),
            "could not execute {} properly",
            env!("CARGO_PKG_NAME"),
        );

        return Err(err);
    }

    Ok(())
}
