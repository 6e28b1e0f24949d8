//! # Resource module
//!
//! This module provide helpers on namespaced kubernetes [`Resource`]

use std::fmt::Debug;

use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{DeleteParams, Patch, PatchParams, PostParams},
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

// -----------------------------------------------------------------------------
// Helpers functions

/// returns the namespace and name of the kubernetes resource, an unset
/// namespace is returned as empty
pub fn namespaced_name<T>(obj: &T) -> (String, String)
where
    T: ResourceExt,
{
    (obj.namespace().unwrap_or_default(), obj.name_any())
}

/// returns if the error is a kubernetes api error with the not found code
pub fn not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 404)
}

fn kind<T>() -> String
where
    T: Resource,
    <T as Resource>::DynamicType: Default,
{
    T::kind(&Default::default()).to_string()
}

/// retrieve the resource, a missing resource is returned as [`None`]
pub async fn get<T>(client: Client, namespace: &str, name: &str) -> Result<Option<T>, kube::Error>
where
    T: Resource<Scope = NamespaceResourceScope> + DeserializeOwned + Clone + Debug,
    <T as Resource>::DynamicType: Default,
{
    let api: Api<T> = Api::namespaced(client, namespace);

    debug!(
        kind = kind::<T>().as_str(),
        namespace = namespace,
        name = name,
        "execute a request to retrieve resource",
    );

    match api.get(name).await {
        Ok(obj) => Ok(Some(obj)),
        Err(err) if not_found(&err) => Ok(None),
        Err(err) => Err(err),
    }
}

/// create the given resource in its own namespace
pub async fn create<T>(client: Client, obj: &T) -> Result<T, kube::Error>
where
    T: Resource<Scope = NamespaceResourceScope> + DeserializeOwned + Serialize + Clone + Debug,
    <T as Resource>::DynamicType: Default,
{
    let (namespace, name) = namespaced_name(obj);
    let api: Api<T> = Api::namespaced(client, &namespace);

    debug!(
        kind = kind::<T>().as_str(),
        namespace = &namespace,
        name = &name,
        "execute a request to create resource",
    );

    api.create(&PostParams::default(), obj).await
}

/// make a patch request on the resource using the given patch
pub async fn patch<T>(
    client: Client,
    namespace: &str,
    name: &str,
    patch: json_patch::Patch,
) -> Result<T, kube::Error>
where
    T: Resource<Scope = NamespaceResourceScope> + DeserializeOwned + Serialize + Clone + Debug,
    <T as Resource>::DynamicType: Default,
{
    debug!(
        kind = kind::<T>().as_str(),
        namespace = namespace,
        name = name,
        patch = serde_json::to_string(&patch).unwrap_or_default(),
        "execute patch request on resource",
    );

    Api::namespaced(client, namespace)
        .patch(name, &PatchParams::default(), &Patch::Json::<T>(patch))
        .await
}

/// delete the resource
pub async fn delete<T>(client: Client, namespace: &str, name: &str) -> Result<(), kube::Error>
where
    T: Resource<Scope = NamespaceResourceScope> + DeserializeOwned + Clone + Debug,
    <T as Resource>::DynamicType: Default,
{
    let api: Api<T> = Api::namespaced(client, namespace);

    debug!(
        kind = kind::<T>().as_str(),
        namespace = namespace,
        name = name,
        "execute a request to delete resource",
    );

    api.delete(name, &DeleteParams::default()).await.map(|_| ())
}
