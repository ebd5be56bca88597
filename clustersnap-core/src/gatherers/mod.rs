//! Gatherer units for cluster configuration.
//!
//! Each unit fetches one resource kind, classifies the outcome, anonymizes
//! what it fetched and names the resulting records. All units share the same
//! shape:
//!
//! 1. acquire an accessor from the [`Gatherer`] (failure is returned at once)
//! 2. `get` a singleton named `cluster`, or `list` a collection
//! 3. not-found yields an empty result, any other error yields that error
//! 4. anonymize, name, and wrap each item into a [`Record`]
//!
//! The body of every unit is a free function taking a context and a
//! `&dyn ResourceAccessor`, so it can be exercised against
//! [`FakeAccessor`](crate::accessor::FakeAccessor).

use crate::{
    Result,
    accessor::{KubeAccessor, ResourceAccessor},
    context::GatherContext,
    error::redact_url,
    record::{GatherResult, Record},
};
use async_trait::async_trait;
use std::sync::Arc;

mod authentication;
mod container_runtime_configs;
mod crds;
mod infrastructure;
mod machine_config_pools;
mod machinesets;
mod netnamespaces;
mod proxy;

pub use authentication::{ClusterAuthentication, gather_cluster_authentication};
pub use container_runtime_configs::{
    CONTAINER_RUNTIME_CONFIGS, ContainerRuntimeConfigs, gather_container_runtime_configs,
};
pub use crds::{CRD_ALLOW_LIST, CustomResourceDefinitions, gather_crds};
pub use infrastructure::{ClusterInfrastructure, gather_cluster_infrastructure};
pub use machine_config_pools::{
    MACHINE_CONFIG_POOLS, MachineConfigPools, gather_machine_config_pools,
};
pub use machinesets::{MACHINE_SETS, MachineSets, gather_machine_sets};
pub use netnamespaces::{NetNamespaceSummary, NetNamespaces, gather_netnamespaces};
pub use proxy::{ClusterProxy, gather_cluster_proxy};

/// Name of the singleton cluster-scoped configuration objects.
pub const CLUSTER_OBJECT_NAME: &str = "cluster";

/// Where gatherers get their remote access from.
#[derive(Clone)]
enum AccessorSource {
    /// Build a fresh client per unit from this configuration
    Config(Box<kube::Config>),
    /// Reuse one accessor for every unit
    Shared(Arc<dyn ResourceAccessor>),
}

/// Per-run state handed to every gatherer unit.
///
/// Holds the remote API configuration and the cancellable context of the
/// run. Units never share anything else.
#[derive(Clone)]
pub struct Gatherer {
    source: AccessorSource,
    ctx: GatherContext,
}

impl std::fmt::Debug for Gatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            AccessorSource::Config(config) => redact_url(&config.cluster_url.to_string()),
            AccessorSource::Shared(_) => "<shared accessor>".to_string(),
        };
        f.debug_struct("Gatherer")
            .field("source", &source)
            .field("ctx", &self.ctx)
            .finish()
    }
}

impl Gatherer {
    /// Creates a gatherer that builds its API clients from `config`.
    pub fn new(config: kube::Config, ctx: GatherContext) -> Self {
        Self {
            source: AccessorSource::Config(Box::new(config)),
            ctx,
        }
    }

    /// Creates a gatherer that hands the same accessor to every unit.
    pub fn with_accessor(accessor: Arc<dyn ResourceAccessor>, ctx: GatherContext) -> Self {
        Self {
            source: AccessorSource::Shared(accessor),
            ctx,
        }
    }

    /// The context every remote call of this gatherer is bounded by.
    pub fn context(&self) -> &GatherContext {
        &self.ctx
    }

    /// Returns a copy of this gatherer scoped to `ctx`.
    #[must_use]
    pub fn scoped(&self, ctx: GatherContext) -> Self {
        Self {
            source: self.source.clone(),
            ctx,
        }
    }

    /// Acquires an accessor for one unit.
    ///
    /// # Errors
    /// Returns a client construction error when a fresh client cannot be built.
    pub fn accessor(&self) -> Result<Arc<dyn ResourceAccessor>> {
        match &self.source {
            AccessorSource::Config(config) => {
                Ok(Arc::new(KubeAccessor::try_from_config(config)?))
            }
            AccessorSource::Shared(accessor) => Ok(Arc::clone(accessor)),
        }
    }
}

/// One self-contained collection routine.
///
/// # Object Safety
/// This trait is object-safe; the registry is a `Vec<Box<dyn GatherUnit>>`.
#[async_trait]
pub trait GatherUnit: Send + Sync {
    /// Stable identifier, e.g. `clusterconfig/authentication`.
    fn id(&self) -> &'static str;

    /// Runs the unit against an already acquired accessor.
    async fn gather_with(
        &self,
        ctx: &GatherContext,
        accessor: &dyn ResourceAccessor,
    ) -> GatherResult;

    /// Acquires an accessor from `gatherer` and runs the unit.
    ///
    /// Accessor acquisition failure is returned as the unit's only error.
    async fn gather(&self, gatherer: &Gatherer) -> GatherResult {
        match gatherer.accessor() {
            Ok(accessor) => self.gather_with(gatherer.context(), accessor.as_ref()).await,
            Err(e) => GatherResult::from_error(e),
        }
    }
}

/// Every unit this crate ships, in registry order.
pub fn default_units() -> Vec<Box<dyn GatherUnit>> {
    vec![
        Box::new(ClusterAuthentication),
        Box::new(ClusterInfrastructure),
        Box::new(ClusterProxy),
        Box::new(NetNamespaces),
        Box::new(CustomResourceDefinitions),
        Box::new(MachineSets),
        Box::new(ContainerRuntimeConfigs),
        Box::new(MachineConfigPools),
    ]
}

/// Turns a fetch outcome into a unit result.
///
/// Absence is an empty success; any other error is the unit's only error.
fn classify<T>(fetched: Result<T>, into_records: impl FnOnce(T) -> Vec<Record>) -> GatherResult {
    match fetched {
        Ok(value) => GatherResult::from_records(into_records(value)),
        Err(e) if e.is_not_found() => GatherResult::empty(),
        Err(e) => GatherResult::from_error(e),
    }
}
