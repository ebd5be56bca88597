//! ContainerRuntimeConfigs from the machine config operator.
//!
//! Location in archive: `config/containerruntimeconfigs/<name>`

use super::{GatherUnit, classify};
use crate::{
    accessor::{GroupVersionResource, ResourceAccessor},
    context::GatherContext,
    record::{GatherResult, Record},
};
use async_trait::async_trait;
use kube::ResourceExt;

/// Coordinates of `containerruntimeconfigs.v1.machineconfiguration.openshift.io`.
pub static CONTAINER_RUNTIME_CONFIGS: std::sync::LazyLock<GroupVersionResource> =
    std::sync::LazyLock::new(|| {
        GroupVersionResource::new(
            "machineconfiguration.openshift.io",
            "v1",
            "containerruntimeconfigs",
        )
    });

/// Collects every ContainerRuntimeConfig as its own record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerRuntimeConfigs;

#[async_trait]
impl GatherUnit for ContainerRuntimeConfigs {
    fn id(&self) -> &'static str {
        "clusterconfig/container_runtime_configs"
    }

    async fn gather_with(
        &self,
        ctx: &GatherContext,
        accessor: &dyn ResourceAccessor,
    ) -> GatherResult {
        gather_container_runtime_configs(ctx, accessor).await
    }
}

/// Lists ContainerRuntimeConfigs.
pub async fn gather_container_runtime_configs(
    ctx: &GatherContext,
    accessor: &dyn ResourceAccessor,
) -> GatherResult {
    let fetched = accessor.list(ctx, &CONTAINER_RUNTIME_CONFIGS, None).await;
    classify(fetched, |configs| {
        configs
            .into_iter()
            .map(|config| {
                Record::json(
                    format!("config/containerruntimeconfigs/{}", config.name_any()),
                    config,
                )
            })
            .collect()
    })
}
