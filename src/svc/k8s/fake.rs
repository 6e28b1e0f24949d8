//! # Fake module
//!
//! In-memory [`CommonSecretApi`] recording the requests it receives

use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::error::ErrorResponse;

use crate::svc::{crd::vault_static_secret::VaultStaticSecret, k8s::CommonSecretApi};

pub fn api_error(code: u16) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".into(),
        message: format!("request failed with code {}", code),
        reason: "Fake".into(),
        code,
    })
}

#[derive(Default)]
pub struct FakeCluster {
    pub static_secret: Mutex<Option<VaultStaticSecret>>,
    pub secret: Mutex<Option<Secret>>,
    pub calls: Mutex<Vec<&'static str>>,
    pub fail_get_static_secret: bool,
    pub fail_create: bool,
    pub fail_patch: bool,
    pub fail_delete: bool,
    pub fail_get_secret: bool,
}

impl FakeCluster {
    pub fn with(static_secret: Option<VaultStaticSecret>, secret: Option<Secret>) -> Self {
        Self {
            static_secret: Mutex::new(static_secret),
            secret: Mutex::new(secret),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().to_owned()
    }

    pub fn static_secret(&self) -> Option<VaultStaticSecret> {
        self.static_secret.lock().unwrap().to_owned()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CommonSecretApi for FakeCluster {
    async fn get_static_secret(
        &self,
        _namespace: &str,
    ) -> Result<Option<VaultStaticSecret>, kube::Error> {
        self.record("get_static_secret");
        if self.fail_get_static_secret {
            return Err(api_error(500));
        }

        Ok(self.static_secret())
    }

    async fn create_static_secret(
        &self,
        obj: &VaultStaticSecret,
    ) -> Result<VaultStaticSecret, kube::Error> {
        self.record("create_static_secret");
        if self.fail_create {
            return Err(api_error(409));
        }

        *self.static_secret.lock().unwrap() = Some(obj.to_owned());
        Ok(obj.to_owned())
    }

    async fn patch_static_secret(
        &self,
        _namespace: &str,
        patch: json_patch::Patch,
    ) -> Result<VaultStaticSecret, kube::Error> {
        self.record("patch_static_secret");
        if self.fail_patch {
            return Err(api_error(422));
        }

        let mut guard = self.static_secret.lock().unwrap();
        let obj = guard.as_ref().ok_or_else(|| api_error(404))?;

        let mut value = serde_json::to_value(obj).unwrap();
        json_patch::patch(&mut value, &patch.0).unwrap();
        let patched: VaultStaticSecret = serde_json::from_value(value).unwrap();

        *guard = Some(patched.to_owned());
        Ok(patched)
    }

    async fn delete_static_secret(&self, _namespace: &str) -> Result<(), kube::Error> {
        self.record("delete_static_secret");
        if self.fail_delete {
            return Err(api_error(403));
        }

        match self.static_secret.lock().unwrap().take() {
            Some(_) => Ok(()),
            None => Err(api_error(404)),
        }
    }

    async fn get_secret(&self, _namespace: &str) -> Result<Option<Secret>, kube::Error> {
        self.record("get_secret");
        if self.fail_get_secret {
            return Err(api_error(403));
        }

        Ok(self.secret.lock().unwrap().to_owned())
    }
}
