//! MachineConfigPools from the machine config operator.
//!
//! Location in archive: `config/machineconfigpools/<name>`

use super::{GatherUnit, classify};
use crate::{
    accessor::{GroupVersionResource, ResourceAccessor},
    context::GatherContext,
    record::{GatherResult, Record},
};
use async_trait::async_trait;
use kube::ResourceExt;

/// Coordinates of `machineconfigpools.v1.machineconfiguration.openshift.io`.
pub static MACHINE_CONFIG_POOLS: std::sync::LazyLock<GroupVersionResource> =
    std::sync::LazyLock::new(|| {
        GroupVersionResource::new("machineconfiguration.openshift.io", "v1", "machineconfigpools")
    });

/// Collects every MachineConfigPool as its own record.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineConfigPools;

#[async_trait]
impl GatherUnit for MachineConfigPools {
    fn id(&self) -> &'static str {
        "clusterconfig/machine_config_pools"
    }

    async fn gather_with(
        &self,
        ctx: &GatherContext,
        accessor: &dyn ResourceAccessor,
    ) -> GatherResult {
        gather_machine_config_pools(ctx, accessor).await
    }
}

/// Lists MachineConfigPools.
pub async fn gather_machine_config_pools(
    ctx: &GatherContext,
    accessor: &dyn ResourceAccessor,
) -> GatherResult {
    let fetched = accessor.list(ctx, &MACHINE_CONFIG_POOLS, None).await;
    classify(fetched, |pools| {
        pools
            .into_iter()
            .map(|pool| Record::json(format!("config/machineconfigpools/{}", pool.name_any()), pool))
            .collect()
    })
}
