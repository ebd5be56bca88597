//! Cluster authentication configuration.
//!
//! Location in archive: `config/authentication`

use super::{CLUSTER_OBJECT_NAME, GatherUnit, classify};
use crate::{
    accessor::{ResourceAccessor, get_typed},
    context::GatherContext,
    models::Authentication,
    record::{GatherResult, Record},
};
use async_trait::async_trait;

/// Collects the `Authentication` object named `cluster`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterAuthentication;

#[async_trait]
impl GatherUnit for ClusterAuthentication {
    fn id(&self) -> &'static str {
        "clusterconfig/authentication"
    }

    async fn gather_with(
        &self,
        ctx: &GatherContext,
        accessor: &dyn ResourceAccessor,
    ) -> GatherResult {
        gather_cluster_authentication(ctx, accessor).await
    }
}

/// Fetches the cluster `Authentication`; it has no sensitive fields.
pub async fn gather_cluster_authentication(
    ctx: &GatherContext,
    accessor: &dyn ResourceAccessor,
) -> GatherResult {
    let fetched = get_typed::<Authentication>(accessor, ctx, CLUSTER_OBJECT_NAME).await;
    classify(fetched, |authentication| {
        vec![Record::json("config/authentication", authentication)]
    })
}
