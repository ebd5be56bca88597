//! Cluster-wide proxy configuration, with endpoints anonymized.
//!
//! Location in archive: `config/proxy`

use super::{CLUSTER_OBJECT_NAME, GatherUnit, classify};
use crate::{
    accessor::{ResourceAccessor, get_typed},
    anonymize::anonymize_proxy,
    context::GatherContext,
    models::Proxy,
    record::{GatherResult, Record},
};
use async_trait::async_trait;

/// Collects the `Proxy` object named `cluster`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterProxy;

#[async_trait]
impl GatherUnit for ClusterProxy {
    fn id(&self) -> &'static str {
        "clusterconfig/proxy"
    }

    async fn gather_with(
        &self,
        ctx: &GatherContext,
        accessor: &dyn ResourceAccessor,
    ) -> GatherResult {
        gather_cluster_proxy(ctx, accessor).await
    }
}

/// Fetches the cluster `Proxy` and masks proxy URLs and the no-proxy list.
pub async fn gather_cluster_proxy(
    ctx: &GatherContext,
    accessor: &dyn ResourceAccessor,
) -> GatherResult {
    let fetched = get_typed::<Proxy>(accessor, ctx, CLUSTER_OBJECT_NAME).await;
    classify(fetched, |proxy| {
        vec![Record::json("config/proxy", anonymize_proxy(proxy))]
    })
}
