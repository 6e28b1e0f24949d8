//! # Command module
//!
//! This module provide command line interface structures and helpers
use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use clap::{builder::FalseyValueParser, ArgAction, Parser, Subcommand};

use crate::svc::k8s::{CommonSecretApi, Context};

pub mod delete;
pub mod get;
pub mod upgrade;

// -----------------------------------------------------------------------------
// Executor trait

#[async_trait]
pub trait Executor<C>
where
    C: CommonSecretApi,
{
    type Error;

    async fn execute(&self, ctx: Arc<Context<C>>) -> Result<(), Self::Error>;
}

// -----------------------------------------------------------------------------
// Error enum

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to execute command '{0}', {1}")]
    Execution(String, Arc<Error>),
    #[error("failed to get common secrets, {0}")]
    Get(get::GetError),
    #[error("failed to upgrade common secrets, {0}")]
    Upgrade(upgrade::UpgradeError),
    #[error("failed to delete common secrets, {0}")]
    Delete(delete::DeleteError),
}

// -----------------------------------------------------------------------------
// Command enum

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Print the common-secrets VaultStaticSecret of the namespace
    #[clap(name = "get", aliases = &["get-common"])]
    Get,
    /// Reconcile the common-secrets VaultStaticSecret with a values file
    #[clap(name = "upgrade", aliases = &["upgrade-common"])]
    Upgrade(upgrade::Upgrade),
    /// Delete the common-secrets VaultStaticSecret of the namespace
    #[clap(name = "delete", aliases = &["delete-common"])]
    Delete,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Upgrade(_) => "upgrade",
            Self::Delete => "delete",
        }
    }
}

#[async_trait]
impl<C> Executor<C> for Command
where
    C: CommonSecretApi,
{
    type Error = Error;

    async fn execute(&self, ctx: Arc<Context<C>>) -> Result<(), Self::Error> {
        let result = match self {
            Self::Get => get::get(ctx).await.map(|_| ()).map_err(Error::Get),
            Self::Upgrade(upgrade) => upgrade.execute(ctx).await.map_err(Error::Upgrade),
            Self::Delete => delete::delete(ctx).await.map_err(Error::Delete),
        };

        result.map_err(|err| Error::Execution(self.name().into(), Arc::new(err)))
    }
}

// -----------------------------------------------------------------------------
// Args struct

#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Args {
    /// Increase log verbosity
    #[clap(short = 'v', global = true, action = ArgAction::Count)]
    pub verbosity: u8,
    /// Namespace of the common-secrets
    #[clap(
        short = 'n',
        long = "namespace",
        global = true,
        env = "HELM_NAMESPACE",
        default_value = "default"
    )]
    pub namespace: String,
    /// Debug mode
    #[clap(
        short = 'd',
        long = "debug",
        global = true,
        env = "HELM_DEBUG",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub debug: bool,
    /// Specify location of kubeconfig
    #[clap(short = 'k', long = "kubeconfig", global = true)]
    pub kubeconfig: Option<PathBuf>,
    /// Specify location of configuration
    #[clap(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

impl Args {
    /// returns the verbosity used to initialize logging, warnings are always
    /// displayed and debug mode displays at least debug messages
    pub fn log_verbosity(&self) -> usize {
        let verbosity = self.verbosity as usize + 1;
        if self.debug {
            verbosity.max(3)
        } else {
            verbosity
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[test]
    fn parse_upgrade() {
        let args = Args::try_parse_from([
            "vault", "upgrade", "svc-a", "-n", "bff", "-f", "values-qa.yaml",
        ])
        .unwrap();

        assert_eq!(args.namespace, "bff");
        match args.command {
            Command::Upgrade(upgrade) => {
                assert_eq!(upgrade.deployment, "svc-a");
                assert_eq!(upgrade.file, PathBuf::from("values-qa.yaml"));
            }
            cmd => panic!("unexpected command {:?}", cmd),
        }
    }

    #[test]
    fn parse_aliases() {
        let args = Args::try_parse_from(["vault", "get-common"]).unwrap();
        assert!(matches!(args.command, Command::Get));

        let args = Args::try_parse_from(["vault", "delete-common", "-d"]).unwrap();
        assert!(matches!(args.command, Command::Delete));
        assert!(args.debug);

        let args =
            Args::try_parse_from(["vault", "upgrade-common", "svc-a", "--file", "v.yaml"]).unwrap();
        assert!(matches!(args.command, Command::Upgrade(_)));
    }

    #[test]
    fn upgrade_requires_file_and_deployment() {
        assert!(Args::try_parse_from(["vault", "upgrade", "svc-a"]).is_err());
        assert!(Args::try_parse_from(["vault", "upgrade", "-f", "values.yaml"]).is_err());
    }

    #[test]
    fn upgrade_accepts_a_single_deployment() {
        assert!(Args::try_parse_from(["vault", "upgrade", "a", "b", "-f", "values.yaml"]).is_err());
    }

    #[test]
    fn debug_raises_log_verbosity() {
        let args = Args::try_parse_from(["vault", "get", "--debug"]).unwrap();
        assert_eq!(args.log_verbosity(), 3);

        let args = Args::try_parse_from(["vault", "get", "-vvvv"]).unwrap();
        assert_eq!(args.log_verbosity(), 5);
    }

    #[test]
    fn helm_environment_overrides() {
        // every mutation of the process environment stays in this test
        env::set_var("HELM_NAMESPACE", "from-env");
        env::set_var("HELM_DEBUG", "false");

        let args = Args::try_parse_from(["vault", "get"]).unwrap();
        assert_eq!(args.namespace, "from-env");
        assert!(!args.debug);

        let args = Args::try_parse_from(["vault", "get", "-n", "flag"]).unwrap();
        assert_eq!(args.namespace, "flag");

        env::set_var("HELM_DEBUG", "0");
        assert!(!Args::try_parse_from(["vault", "get"]).unwrap().debug);

        env::set_var("HELM_DEBUG", "true");
        let args = Args::try_parse_from(["vault", "upgrade", "svc-a", "-f", "v.yaml"]).unwrap();
        assert!(args.debug);
        assert_eq!(args.log_verbosity(), 3);

        env::remove_var("HELM_NAMESPACE");
        env::remove_var("HELM_DEBUG");
    }
}
