use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Namespace;
use kube::Api;
use kube::api::ListParams;

use super::ApiSession;
use crate::context::CallContext;

/// Session backed by a real API server
#[derive(Clone)]
pub struct KubeSession {
    client: kube::Client,
}

impl KubeSession {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ApiSession for KubeSession {
    async fn ping(&self, _ctx: &CallContext) -> Result<usize, kube::Error> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        // We only need to verify the connection, not fetch every namespace
        let list = namespaces.list(&ListParams::default().limit(1)).await?;
        Ok(list.items.len())
    }

    async fn server_version(&self, _ctx: &CallContext) -> Result<String, kube::Error> {
        let info = self.client.apiserver_version().await?;
        Ok(info.git_version)
    }

    async fn list_deployments(
        &self,
        _ctx: &CallContext,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<Deployment>, kube::Error> {
        let deployments: Api<Deployment> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        Ok(deployments.list(params).await?.items)
    }
}
