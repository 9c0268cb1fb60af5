use anyhow::Result;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Namespace;
use kube::{api::ListParams, Api, Client, ResourceExt};
use std::future::Future;
use tracing::debug;

use crate::error::BoxError;
use crate::types::Config;

/// Lists the Deployments of one namespace.
pub trait DeploymentSource {
    fn list_deployments(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Vec<Deployment>, BoxError>> + Send;
}

pub struct KubeDeploymentSource {
    client: Client,
}

impl KubeDeploymentSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl DeploymentSource for KubeDeploymentSource {
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, BoxError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }
}

/// Resolve the namespaces to scan: the include list when one is configured, otherwise
/// every namespace in the cluster minus the exclude list.
pub async fn resolve_namespaces(client: &Client, cfg: &Config) -> Result<Vec<String>> {
    if !cfg.namespaces.is_empty() {
        return Ok(cfg.namespaces.clone());
    }
    let api: Api<Namespace> = Api::all(client.clone());
    let all: Vec<String> = api
        .list(&ListParams::default())
        .await?
        .items
        .iter()
        .map(|ns| ns.name_any())
        .collect();
    debug!("cluster has {} namespaces", all.len());
    Ok(select_namespaces(all, &cfg.namespaces, &cfg.exclude_namespaces))
}

pub fn select_namespaces(all: Vec<String>, include: &[String], exclude: &[String]) -> Vec<String> {
    if !include.is_empty() {
        return include.to_vec();
    }
    all.into_iter().filter(|ns| !exclude.contains(ns)).collect()
}
