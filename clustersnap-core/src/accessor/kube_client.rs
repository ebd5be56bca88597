//! Accessor backed by a live API server connection.

use super::{GroupVersionResource, ResourceAccessor};
use crate::{
    Result,
    context::GatherContext,
    error::{GatherError, redact_url},
};
use async_trait::async_trait;
use kube::{
    Api, Client, Config,
    api::{DynamicObject, ListParams},
};

/// [`ResourceAccessor`] issuing requests through a `kube::Client`.
///
/// All kinds are addressed dynamically by group/version/resource, so custom
/// resources need no compiled schema.
#[derive(Clone)]
pub struct KubeAccessor {
    client: Client,
}

impl std::fmt::Debug for KubeAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeAccessor").finish_non_exhaustive()
    }
}

impl KubeAccessor {
    /// Wraps an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from a ready-to-use configuration.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns [`GatherError::Client`] when the client stack cannot be built
    /// (for example an unusable TLS or auth configuration).
    pub fn try_from_config(config: &Config) -> Result<Self> {
        let cluster = redact_url(&config.cluster_url.to_string());
        let client = Client::try_from(config.clone())
            .map_err(|e| GatherError::client_failed(format!("client for {cluster}"), e))?;
        tracing::debug!("Created API client for {}", cluster);
        Ok(Self::new(client))
    }

    fn api(&self, gvr: &GroupVersionResource, namespace: Option<&str>) -> Api<DynamicObject> {
        let resource = gvr.api_resource();
        match namespace {
            Some(namespace) => Api::namespaced_with(self.client.clone(), namespace, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        }
    }
}

#[async_trait]
impl ResourceAccessor for KubeAccessor {
    async fn get(
        &self,
        ctx: &GatherContext,
        gvr: &GroupVersionResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        let api = self.api(gvr, namespace);
        let description = gvr.describe(namespace, Some(name));
        ctx.run(&description, async {
            api.get(name)
                .await
                .map_err(|e| GatherError::from_kube(&description, e))
        })
        .await
    }

    async fn list(
        &self,
        ctx: &GatherContext,
        gvr: &GroupVersionResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        let api = self.api(gvr, namespace);
        let description = gvr.describe(namespace, None);
        ctx.run(&description, async {
            api.list(&ListParams::default())
                .await
                .map(|list| list.items)
                .map_err(|e| GatherError::from_kube(&description, e))
        })
        .await
    }
}
