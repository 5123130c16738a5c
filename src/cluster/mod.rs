//! Cluster handle and the read-only queries the assertion layer needs.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
#[cfg(test)]
use mockall::automock;
use tempfile::NamedTempFile;
use tracing::info;

use crate::crd::application::Application;
use crate::error::{Error, Result};
use crate::helpers::require_non_empty;

mod kubectl;
mod wait;

pub use kubectl::{run_kubectl, run_kubectl_and_get_output, KubectlOptions};
pub use wait::{deployment_available, wait_until_deployment_available};

/// Read access to a running cluster.  Abstracted so the assertion layer can
/// be tested against canned objects.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    /// API server `gitVersion`; doubles as a connectivity check.
    async fn server_version(&self) -> Result<String>;

    async fn get_namespace(&self, name: &str) -> Result<Namespace>;

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment>;

    async fn list_nodes(&self) -> Result<Vec<Node>>;

    async fn get_application(&self, namespace: &str, name: &str) -> Result<Application>;
}

/// Connection to the cluster under test, built from the kubeconfig that
/// Terraform emits.  Also keeps that kubeconfig on disk for `kubectl`; the
/// file is removed when the handle is dropped.
pub struct ClusterHandle {
    client: Client,
    kubeconfig_file: NamedTempFile,
}

impl ClusterHandle {
    pub async fn from_kubeconfig(kubeconfig: &str) -> Result<Self> {
        require_non_empty(kubeconfig, "kubeconfig")?;

        let parsed = Kubeconfig::from_yaml(kubeconfig)?;
        let config = Config::from_custom_kubeconfig(parsed, &KubeConfigOptions::default()).await?;
        let client = Client::try_from(config)?;

        let mut kubeconfig_file = tempfile::Builder::new()
            .prefix("kubeconfig-")
            .suffix(".yaml")
            .tempfile()?;
        kubeconfig_file.write_all(kubeconfig.as_bytes())?;
        kubeconfig_file.flush()?;

        info!(path = %kubeconfig_file.path().display(), "wrote kubeconfig");
        Ok(Self {
            client,
            kubeconfig_file,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn kubeconfig_path(&self) -> &Path {
        self.kubeconfig_file.path()
    }

    /// `kubectl` options pointing at this cluster's kubeconfig.
    pub fn kubectl_options(&self, namespace: &str) -> KubectlOptions {
        KubectlOptions::new(
            None,
            Some(self.kubeconfig_path().to_path_buf()),
            Some(namespace.to_string()),
        )
    }
}

#[async_trait]
impl ClusterQuery for ClusterHandle {
    async fn server_version(&self) -> Result<String> {
        Ok(self.client.apiserver_version().await?.git_version)
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        api.get_opt(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("namespace {name}")))
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("deployment {namespace}/{name}")))
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_application(&self, namespace: &str, name: &str) -> Result<Application> {
        let api: Api<Application> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("application {namespace}/{name}")))
    }
}
