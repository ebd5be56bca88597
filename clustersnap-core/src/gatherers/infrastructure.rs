//! Cluster infrastructure, with endpoints and names anonymized.
//!
//! Location in archive: `config/infrastructure`

use super::{CLUSTER_OBJECT_NAME, GatherUnit, classify};
use crate::{
    accessor::{ResourceAccessor, get_typed},
    anonymize::anonymize_infrastructure,
    context::GatherContext,
    models::Infrastructure,
    record::{GatherResult, Record},
};
use async_trait::async_trait;

/// Collects the `Infrastructure` object named `cluster`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterInfrastructure;

#[async_trait]
impl GatherUnit for ClusterInfrastructure {
    fn id(&self) -> &'static str {
        "clusterconfig/infrastructure"
    }

    async fn gather_with(
        &self,
        ctx: &GatherContext,
        accessor: &dyn ResourceAccessor,
    ) -> GatherResult {
        gather_cluster_infrastructure(ctx, accessor).await
    }
}

/// Fetches the cluster `Infrastructure` and masks its URLs and names.
pub async fn gather_cluster_infrastructure(
    ctx: &GatherContext,
    accessor: &dyn ResourceAccessor,
) -> GatherResult {
    let fetched = get_typed::<Infrastructure>(accessor, ctx, CLUSTER_OBJECT_NAME).await;
    classify(fetched, |infrastructure| {
        vec![Record::json(
            "config/infrastructure",
            anonymize_infrastructure(infrastructure),
        )]
    })
}
