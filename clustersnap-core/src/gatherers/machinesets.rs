//! Machine API MachineSets, read without a compiled schema.
//!
//! Location in archive: `machinesets/<namespace>/<name>`, or
//! `machinesets/<name>` for objects without a namespace.

use super::{GatherUnit, classify};
use crate::{
    accessor::{GroupVersionResource, ResourceAccessor},
    context::GatherContext,
    record::{GatherResult, Record},
};
use async_trait::async_trait;
use kube::ResourceExt;
use kube::core::DynamicObject;

/// Coordinates of `machinesets.v1beta1.machine.openshift.io`.
pub static MACHINE_SETS: std::sync::LazyLock<GroupVersionResource> =
    std::sync::LazyLock::new(|| {
        GroupVersionResource::new("machine.openshift.io", "v1beta1", "machinesets")
    });

/// Collects every MachineSet as its own record.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineSets;

#[async_trait]
impl GatherUnit for MachineSets {
    fn id(&self) -> &'static str {
        "clusterconfig/machinesets"
    }

    async fn gather_with(
        &self,
        ctx: &GatherContext,
        accessor: &dyn ResourceAccessor,
    ) -> GatherResult {
        gather_machine_sets(ctx, accessor).await
    }
}

fn record_name(machine_set: &DynamicObject) -> String {
    match machine_set.namespace().filter(|ns| !ns.is_empty()) {
        Some(namespace) => format!("machinesets/{}/{}", namespace, machine_set.name_any()),
        None => format!("machinesets/{}", machine_set.name_any()),
    }
}

/// Lists MachineSets across all namespaces.
pub async fn gather_machine_sets(
    ctx: &GatherContext,
    accessor: &dyn ResourceAccessor,
) -> GatherResult {
    let fetched = accessor.list(ctx, &MACHINE_SETS, None).await;
    classify(fetched, |machine_sets| {
        machine_sets
            .into_iter()
            .map(|machine_set| Record::json(record_name(&machine_set), machine_set))
            .collect()
    })
}
