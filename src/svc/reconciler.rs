//! # Reconciler module
//!
//! This module computes which secrets declared by a deployment are backed by
//! the common secret, whether the deployment has to be restarted when the
//! common secret changes, and writes the outcome back to the values file.

use std::path::Path;

use tracing::{debug, info};

use crate::svc::{
    crd::vault_static_secret::RolloutRestartTarget,
    set,
    values::{self, Values},
};

// -----------------------------------------------------------------------------
// Reconciliation structure

#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Reconciliation {
    /// declared keys which are not backed by the common secret
    pub secrets: Vec<String>,
    /// declared keys which are backed by the common secret
    pub common_secrets: Vec<String>,
    /// rollout restart targets to set on the descriptor
    pub targets: Vec<RolloutRestartTarget>,
    /// whether the deployment has been appended to the targets
    pub registered: bool,
}

impl Reconciliation {
    /// set the declared keys of the values according to the reconciliation
    pub fn apply(&self, values: &mut Values) {
        values.deployment.secrets = self.secrets.to_owned();
        values.deployment.common_secrets = self.common_secrets.to_owned();
    }
}

// -----------------------------------------------------------------------------
// Helpers functions

/// splits the declared keys between the ones backed by the remote secret and
/// the others, then appends the deployment to the rollout restart targets if
/// it is not one yet and at least one of its keys is backed.
///
/// Existing targets are returned with their own kind, they are not rewritten
/// to `Deployment`.
pub fn reconcile(
    remote_keys: &[String],
    targets: &[RolloutRestartTarget],
    declared: &[String],
    deployment: &str,
) -> Reconciliation {
    let names: Vec<String> = targets.iter().map(|t| t.name.to_owned()).collect();

    let secrets = set::difference(declared, remote_keys);
    let common_secrets = set::intersection(declared, remote_keys);
    let unregistered = set::difference(&[deployment.to_owned()], &names);

    let mut targets = targets.to_vec();
    let registered = !unregistered.is_empty() && !common_secrets.is_empty();
    if registered {
        targets.push(RolloutRestartTarget::deployment(deployment));
    }

    debug!(
        deployment = deployment,
        secrets = ?secrets,
        common_secrets = ?common_secrets,
        registered = registered,
        "reconciled declared secrets against common secrets",
    );

    Reconciliation {
        secrets,
        common_secrets,
        targets,
        registered,
    }
}

/// reconciles the values against the remote keys and targets, then writes
/// the updated values back to the given path
pub fn upsert(
    path: &Path,
    mut values: Values,
    remote_keys: &[String],
    targets: &[RolloutRestartTarget],
    deployment: &str,
) -> Result<Reconciliation, values::Error> {
    let reconciliation = reconcile(
        remote_keys,
        targets,
        &values.deployment.secrets,
        deployment,
    );

    reconciliation.apply(&mut values);
    values::write(path, &values)?;

    info!(path = path.display().to_string(), "updated values file");
    println!("Successfully updated {}", path.display());

    Ok(reconciliation)
}
