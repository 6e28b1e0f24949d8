//! # Upgrade module
//!
//! This module provides the command reconciling the common-secrets descriptor
//! of a namespace with the values file of a deployment

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use clap::Args;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    cmd::Executor,
    svc::{
        crd::vault_static_secret::{self, VaultStaticSecret, COMMON_SECRETS_NAME},
        k8s::{secret, CommonSecretApi, Context},
        reconciler::{self, Reconciliation},
        values,
    },
};

// -----------------------------------------------------------------------------
// UpgradeError enum

#[derive(thiserror::Error, Debug)]
pub enum UpgradeError {
    #[error("failed to handle values file, {0}")]
    Values(values::Error),
    #[error("failed to create vault static secret '{0}', {1}")]
    Create(String, kube::Error),
    #[error("failed to encode rollout restart targets patch, {0}")]
    Encode(serde_json::Error),
}

impl From<values::Error> for UpgradeError {
    fn from(err: values::Error) -> Self {
        Self::Values(err)
    }
}

// -----------------------------------------------------------------------------
// Upgrade structure

#[derive(Args, Clone, Debug)]
pub struct Upgrade {
    /// Name of the deployment to reconcile
    #[clap(name = "deployment")]
    pub deployment: String,
    /// File with chart values
    #[clap(short = 'f', long = "file")]
    pub file: PathBuf,
}

#[async_trait]
impl<C> Executor<C> for Upgrade
where
    C: CommonSecretApi,
{
    type Error = UpgradeError;

    async fn execute(&self, ctx: Arc<Context<C>>) -> Result<(), Self::Error> {
        upgrade(ctx, &self.deployment, &self.file).await.map(|_| ())
    }
}

// -----------------------------------------------------------------------------
// Helpers functions

fn dump<T>(title: &str, obj: &T)
where
    T: Serialize,
{
    match serde_yaml::to_string(obj) {
        Ok(yaml) => debug!("{}\n---\n{}", title, yaml),
        Err(err) => debug!(error = err.to_string(), "could not serialize {}", title),
    }
}

/// returns the common-secrets descriptor of the namespace, it is created if
/// it could not be retrieved
async fn get_or_create<C>(
    ctx: &Context<C>,
    file: &Path,
) -> Result<VaultStaticSecret, UpgradeError>
where
    C: CommonSecretApi,
{
    match ctx.client.get_static_secret(&ctx.namespace).await {
        Ok(Some(obj)) => return Ok(obj),
        Ok(None) => {
            info!(namespace = &ctx.namespace, "vault static secret does not exist, create it");
        }
        Err(err) => {
            debug!(
                namespace = &ctx.namespace,
                error = err.to_string(),
                "could not retrieve vault static secret, create it",
            );
        }
    }

    let obj = vault_static_secret::new(&ctx.namespace, file, &ctx.config.descriptor);
    let obj = ctx
        .client
        .create_static_secret(&obj)
        .await
        .map_err(|err| UpgradeError::Create(COMMON_SECRETS_NAME.into(), err))?;

    println!("Successfully created {}", COMMON_SECRETS_NAME);
    Ok(obj)
}

/// returns the keys of the common-secrets secret of the namespace, a missing
/// or unreadable secret has no keys
async fn remote_keys<C>(ctx: &Context<C>) -> Vec<String>
where
    C: CommonSecretApi,
{
    match ctx.client.get_secret(&ctx.namespace).await {
        Ok(Some(secret)) => {
            if ctx.debug {
                dump("Get secret common-secrets", &secret);
            }

            secret::keys(&secret)
        }
        Ok(None) => {
            debug!(namespace = &ctx.namespace, "secret does not exist yet");
            vec![]
        }
        Err(err) => {
            warn!(
                namespace = &ctx.namespace,
                name = COMMON_SECRETS_NAME,
                error = err.to_string(),
                "could not retrieve secret, consider it as empty",
            );
            vec![]
        }
    }
}

// -----------------------------------------------------------------------------
// upgrade function

/// reconciles the values file of the deployment with the common secrets of
/// the namespace and patches the rollout restart targets of the descriptor.
///
/// Returns [`None`] if vault secrets are disabled in the values file, in which
/// case no request is made on kubernetes.
pub async fn upgrade<C>(
    ctx: Arc<Context<C>>,
    deployment: &str,
    file: &Path,
) -> Result<Option<Reconciliation>, UpgradeError>
where
    C: CommonSecretApi,
{
    debug!(
        namespace = &ctx.namespace,
        deployment = deployment,
        file = file.display().to_string(),
        "upgrade common secrets",
    );

    let values = values::read(file)?;
    if ctx.debug {
        dump(&format!("file {}", file.display()), &values);
    }

    if !values.vault_enabled() {
        println!("VaultSecrets is disabled in {}", file.display());
        return Ok(None);
    }

    let obj = get_or_create(&ctx, file).await?;
    if ctx.debug {
        dump("Get vaultStaticSecret common-secrets", &obj);
    }

    let keys = remote_keys(&ctx).await;
    let reconciliation = reconciler::upsert(
        file,
        values,
        &keys,
        &obj.spec.rollout_restart_targets,
        deployment,
    )?;

    if ctx.debug {
        dump("RolloutRestartTarget", &reconciliation.targets);
    }

    let patch = vault_static_secret::rollout_restart_targets_patch(&reconciliation.targets)
        .map_err(UpgradeError::Encode)?;

    match ctx.client.patch_static_secret(&ctx.namespace, patch).await {
        Ok(_) => println!("Successfully patched {}", COMMON_SECRETS_NAME),
        Err(err) => error!(
            namespace = &ctx.namespace,
            name = COMMON_SECRETS_NAME,
            error = err.to_string(),
            "could not patch rollout restart targets of vault static secret",
        ),
    }

    Ok(Some(reconciliation))
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, fs};

    use k8s_openapi::{api::core::v1::Secret, ByteString};

    use super::*;
    use crate::svc::{
        cfg::Descriptor,
        crd::vault_static_secret::{Environment, RolloutRestartTarget},
        k8s::fake::FakeCluster,
    };

    const VALUES: &str = r#"
deployment:
  containerPort: 8080
  secrets:
    - db-pass
    - api-key
vaultSecrets:
  enabled: true
namespace: bff
"#;

    fn context(client: FakeCluster) -> Arc<Context<FakeCluster>> {
        Arc::new(Context::new(client, "bff".into(), true, Arc::default()))
    }

    fn values_file(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("values.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    fn descriptor(targets: Vec<RolloutRestartTarget>) -> VaultStaticSecret {
        let mut obj =
            vault_static_secret::new("bff", Path::new("values-dev.yaml"), &Descriptor::default());
        obj.spec.rollout_restart_targets = targets;
        obj
    }

    fn secret(keys: &[&str]) -> Secret {
        Secret {
            data: Some(
                keys.iter()
                    .map(|k| (k.to_string(), ByteString(b"value".to_vec())))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn disabled_values_make_no_request() {
        let dir = tempfile::tempdir().unwrap();
        let file = values_file(dir.path(), "vaultSecrets:\n  enabled: false\n");
        let ctx = context(FakeCluster::default());

        let result = upgrade(ctx.to_owned(), "svc-a", &file).await.unwrap();

        assert!(result.is_none());
        assert!(ctx.client.calls().is_empty());
        assert_eq!(fs::read_to_string(&file).unwrap(), "vaultSecrets:\n  enabled: false\n");
    }

    #[tokio::test]
    async fn missing_descriptor_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let file = values_file(dir.path(), VALUES);
        let ctx = context(FakeCluster::default());

        upgrade(ctx.to_owned(), "svc-a", &file).await.unwrap();

        assert_eq!(
            ctx.client.calls(),
            vec![
                "get_static_secret",
                "create_static_secret",
                "get_secret",
                "patch_static_secret",
            ]
        );

        let obj = ctx.client.static_secret().unwrap();
        assert_eq!(
            obj.spec.path,
            vault_static_secret::path(Environment::from(file.as_path()))
        );
        assert!(obj.spec.path.ends_with("/common-secrets"));
        assert_eq!(obj.metadata.namespace.as_deref(), Some("bff"));
    }

    #[tokio::test]
    async fn unreadable_descriptor_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let file = values_file(dir.path(), VALUES);
        let ctx = context(FakeCluster {
            fail_get_static_secret: true,
            ..Default::default()
        });

        upgrade(ctx.to_owned(), "svc-a", &file).await.unwrap();

        assert!(ctx.client.calls().contains(&"create_static_secret"));
    }

    #[tokio::test]
    async fn creation_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = values_file(dir.path(), VALUES);
        let ctx = context(FakeCluster {
            fail_create: true,
            ..Default::default()
        });

        let result = upgrade(ctx.to_owned(), "svc-a", &file).await;

        assert!(matches!(result, Err(UpgradeError::Create(_, _))));
        assert!(!ctx.client.calls().contains(&"patch_static_secret"));
        assert_eq!(fs::read_to_string(&file).unwrap(), VALUES);
    }

    #[tokio::test]
    async fn backed_secret_registers_deployment() {
        let dir = tempfile::tempdir().unwrap();
        let file = values_file(dir.path(), VALUES);
        let ctx = context(FakeCluster::with(
            Some(descriptor(vec![])),
            Some(secret(&["_raw", "db-pass"])),
        ));

        let reconciliation = upgrade(ctx.to_owned(), "svc-a", &file)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reconciliation.secrets, vec!["api-key"]);
        assert_eq!(reconciliation.common_secrets, vec!["db-pass"]);
        assert_eq!(
            ctx.client.static_secret().unwrap().spec.rollout_restart_targets,
            vec![RolloutRestartTarget::deployment("svc-a")]
        );

        let written = values::read(&file).unwrap();
        assert_eq!(written.deployment.secrets, vec!["api-key"]);
        assert_eq!(written.deployment.common_secrets, vec!["db-pass"]);
    }

    #[tokio::test]
    async fn missing_secret_keeps_targets_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = values_file(dir.path(), VALUES);
        let ctx = context(FakeCluster::with(Some(descriptor(vec![])), None));

        let reconciliation = upgrade(ctx.to_owned(), "svc-a", &file)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reconciliation.secrets, vec!["db-pass", "api-key"]);
        assert!(reconciliation.common_secrets.is_empty());
        assert!(ctx
            .client
            .static_secret()
            .unwrap()
            .spec
            .rollout_restart_targets
            .is_empty());
    }

    #[tokio::test]
    async fn unreadable_secret_is_considered_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = values_file(dir.path(), VALUES);
        let ctx = context(FakeCluster {
            fail_get_secret: true,
            ..FakeCluster::with(Some(descriptor(vec![])), Some(secret(&["db-pass"])))
        });

        let reconciliation = upgrade(ctx, "svc-a", &file).await.unwrap().unwrap();

        assert!(!reconciliation.registered);
        assert!(reconciliation.common_secrets.is_empty());
    }

    #[tokio::test]
    async fn registered_deployment_is_kept_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = values_file(dir.path(), VALUES);
        let targets = vec![RolloutRestartTarget::deployment("svc-a")];
        let ctx = context(FakeCluster::with(
            Some(descriptor(targets.to_owned())),
            Some(secret(&["db-pass", "api-key"])),
        ));

        upgrade(ctx.to_owned(), "svc-a", &file).await.unwrap();
        upgrade(ctx.to_owned(), "svc-a", &file).await.unwrap();

        assert_eq!(
            ctx.client.static_secret().unwrap().spec.rollout_restart_targets,
            targets
        );
    }

    #[tokio::test]
    async fn patch_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = values_file(dir.path(), VALUES);
        let ctx = context(FakeCluster {
            fail_patch: true,
            ..FakeCluster::with(Some(descriptor(vec![])), Some(secret(&["db-pass"])))
        });

        let reconciliation = upgrade(ctx.to_owned(), "svc-a", &file).await.unwrap();

        assert!(reconciliation.unwrap().registered);
        assert!(ctx.client.calls().contains(&"patch_static_secret"));
        assert!(ctx
            .client
            .static_secret()
            .unwrap()
            .spec
            .rollout_restart_targets
            .is_empty());
    }

    #[tokio::test]
    async fn unreadable_values_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(FakeCluster::default());

        let result = upgrade(ctx.to_owned(), "svc-a", &dir.path().join("absent.yaml")).await;

        assert!(matches!(result, Err(UpgradeError::Values(_))));
        assert!(ctx.client.calls().is_empty());
    }
}
