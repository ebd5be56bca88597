//! Resource access for gatherers.
//!
//! Every gatherer reaches the cluster through the [`ResourceAccessor`] trait,
//! which issues exactly one `get` or `list` per call against a resource kind
//! addressed by its [`GroupVersionResource`]. Documents come back as schema-less
//! [`DynamicObject`] values; kinds with a compiled shape implement
//! [`TypedResource`] and are decoded with [`get_typed`] / [`list_typed`].
//!
//! # Error classification
//! An absent object (or absent resource kind) is reported as
//! [`GatherError::NotFound`](crate::error::GatherError::NotFound). Gatherers
//! treat that as "nothing to collect". All other failures are hard errors for
//! the calling gatherer only. No retries happen at this layer.
//!
//! # Module Structure
//! - `kube_client`: accessor backed by a live `kube::Client`
//! - `fake`: in-memory accessor for tests

use crate::{Result, context::GatherContext, error::GatherError};
use async_trait::async_trait;
use kube::core::{ApiResource, DynamicObject};
use serde::de::DeserializeOwned;

mod fake;
mod kube_client;

pub use fake::{FakeAccessor, FakeFailure};
pub use kube_client::KubeAccessor;

/// Coordinates of a resource kind on the API server.
///
/// The core API group is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    /// Creates coordinates from group, version and plural resource name.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// Renders the `apiVersion` string (`v1` or `group/version`).
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Builds the client-side resource description used for URL construction.
    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: String::new(),
            plural: self.resource.clone(),
        }
    }

    /// Describes one object of this kind for logs and error messages.
    pub fn describe(&self, namespace: Option<&str>, name: Option<&str>) -> String {
        let mut description = self.to_string();
        if let Some(namespace) = namespace {
            description.push_str(&format!(" in namespace {namespace}"));
        }
        if let Some(name) = name {
            description.push_str(&format!(" named {name}"));
        }
        description
    }
}

impl std::fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}.{}", self.resource, self.version)
        } else {
            write!(f, "{}.{}.{}", self.resource, self.version, self.group)
        }
    }
}

/// Read-only access to cluster resources.
///
/// # Object Safety
/// This trait is object-safe; gatherers take `&dyn ResourceAccessor`.
#[async_trait]
pub trait ResourceAccessor: Send + Sync {
    /// Fetches a single object by name.
    ///
    /// # Errors
    /// Returns `NotFound` when the object or its kind does not exist, and a
    /// hard error for any other failure, including cancellation of `ctx`.
    async fn get(
        &self,
        ctx: &GatherContext,
        gvr: &GroupVersionResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject>;

    /// Lists every object of a kind, optionally restricted to a namespace.
    ///
    /// # Errors
    /// Same classification as [`ResourceAccessor::get`].
    async fn list(
        &self,
        ctx: &GatherContext,
        gvr: &GroupVersionResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>>;
}

/// A resource kind with a compiled shape.
pub trait TypedResource: DeserializeOwned + Send {
    /// Kind name, used in error messages.
    const KIND: &'static str;

    /// Coordinates of the kind on the API server.
    fn gvr() -> GroupVersionResource;
}

/// Decodes a schema-less document into a typed shape.
pub fn decode<T: TypedResource>(object: DynamicObject) -> Result<T> {
    let value = serde_json::to_value(&object)
        .map_err(|e| GatherError::decode_failed(format!("{} document", T::KIND), e))?;
    serde_json::from_value(value)
        .map_err(|e| GatherError::decode_failed(format!("{} document", T::KIND), e))
}

/// Fetches a cluster-scoped typed object by name.
pub async fn get_typed<T: TypedResource>(
    accessor: &dyn ResourceAccessor,
    ctx: &GatherContext,
    name: &str,
) -> Result<T> {
    let object = accessor.get(ctx, &T::gvr(), None, name).await?;
    decode(object)
}

/// Lists every object of a cluster-scoped typed kind.
pub async fn list_typed<T: TypedResource>(
    accessor: &dyn ResourceAccessor,
    ctx: &GatherContext,
) -> Result<Vec<T>> {
    accessor
        .list(ctx, &T::gvr(), None)
        .await?
        .into_iter()
        .map(decode::<T>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_core_group() {
        let gvr = GroupVersionResource::new("", "v1", "namespaces");
        assert_eq!(gvr.api_version(), "v1");
        assert_eq!(gvr.to_string(), "namespaces.v1");
    }

    #[test]
    fn test_api_version_named_group() {
        let gvr = GroupVersionResource::new("machine.openshift.io", "v1beta1", "machinesets");
        assert_eq!(gvr.api_version(), "machine.openshift.io/v1beta1");
        assert_eq!(gvr.to_string(), "machinesets.v1beta1.machine.openshift.io");

        let resource = gvr.api_resource();
        assert_eq!(resource.plural, "machinesets");
        assert_eq!(resource.group, "machine.openshift.io");
    }

    #[test]
    fn test_describe() {
        let gvr = GroupVersionResource::new("config.openshift.io", "v1", "proxies");
        assert_eq!(
            gvr.describe(None, Some("cluster")),
            "proxies.v1.config.openshift.io named cluster"
        );
        assert_eq!(
            gvr.describe(Some("openshift-machine-api"), None),
            "proxies.v1.config.openshift.io in namespace openshift-machine-api"
        );
    }
}
