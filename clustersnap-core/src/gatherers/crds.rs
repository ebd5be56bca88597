//! Selected CustomResourceDefinitions.
//!
//! Location in archive: `config/crd/<name>`

use super::GatherUnit;
use crate::{
    accessor::{ResourceAccessor, get_typed},
    context::GatherContext,
    record::{GatherResult, Record},
};
use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::ResourceExt;

/// CRDs collected when present, in collection order.
pub const CRD_ALLOW_LIST: &[&str] = &[
    "volumesnapshots.snapshot.storage.k8s.io",
    "volumesnapshotcontents.snapshot.storage.k8s.io",
];

/// Collects the CRDs named in [`CRD_ALLOW_LIST`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomResourceDefinitions;

#[async_trait]
impl GatherUnit for CustomResourceDefinitions {
    fn id(&self) -> &'static str {
        "clusterconfig/crds"
    }

    async fn gather_with(
        &self,
        ctx: &GatherContext,
        accessor: &dyn ResourceAccessor,
    ) -> GatherResult {
        gather_crds(ctx, accessor, CRD_ALLOW_LIST).await
    }
}

/// Fetches each named CRD in order.
///
/// Missing CRDs are logged and skipped. Any other error aborts the unit and
/// discards records collected so far.
pub async fn gather_crds(
    ctx: &GatherContext,
    accessor: &dyn ResourceAccessor,
    names: &[&str],
) -> GatherResult {
    let mut records = Vec::new();
    for &crd_name in names {
        let crd = match get_typed::<CustomResourceDefinition>(accessor, ctx, crd_name).await {
            Ok(crd) => crd,
            Err(e) if e.is_not_found() => {
                tracing::debug!("Cannot find CRD: {}", crd_name);
                continue;
            }
            Err(e) => return GatherResult::from_error(e),
        };
        records.push(Record::json(format!("config/crd/{}", crd.name_any()), crd));
    }
    GatherResult::from_records(records)
}
