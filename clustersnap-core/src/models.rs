//! Typed shapes for the cluster configuration kinds that gatherers decode.
//!
//! The OpenShift configuration kinds have no compiled schema in
//! `k8s-openapi`, so only the fields the pipeline touches are modelled.
//! Everything else is carried through flattened maps or raw JSON values so
//! that non-redacted data survives serialization unchanged.

use crate::accessor::{GroupVersionResource, TypedResource};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const CONFIG_GROUP: &str = "config.openshift.io";
const NETWORK_GROUP: &str = "network.openshift.io";

/// Cluster-wide authentication configuration (`authentications.config.openshift.io`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub spec: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub status: Value,
}

impl TypedResource for Authentication {
    const KIND: &'static str = "Authentication";

    fn gvr() -> GroupVersionResource {
        GroupVersionResource::new(CONFIG_GROUP, "v1", "authentications")
    }
}

/// Cluster infrastructure description (`infrastructures.config.openshift.io`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Infrastructure {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub spec: Value,
    #[serde(default)]
    pub status: InfrastructureStatus,
}

/// Observed infrastructure state; the named fields are the sensitive ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub infrastructure_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub etcd_discovery_domain: String,
    #[serde(rename = "apiServerURL", default, skip_serializing_if = "String::is_empty")]
    pub api_server_url: String,
    #[serde(
        rename = "apiServerInternalURI",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub api_server_internal_url: String,
    /// Platform, topology and any other status fields
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl TypedResource for Infrastructure {
    const KIND: &'static str = "Infrastructure";

    fn gvr() -> GroupVersionResource {
        GroupVersionResource::new(CONFIG_GROUP, "v1", "infrastructures")
    }
}

/// Cluster-wide egress proxy configuration (`proxies.config.openshift.io`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proxy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ProxySettings,
    #[serde(default)]
    pub status: ProxySettings,
}

/// Proxy endpoints, shared by the desired and observed halves of [`Proxy`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySettings {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub http_proxy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub https_proxy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub no_proxy: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl TypedResource for Proxy {
    const KIND: &'static str = "Proxy";

    fn gvr() -> GroupVersionResource {
        GroupVersionResource::new(CONFIG_GROUP, "v1", "proxies")
    }
}

/// SDN network namespace (`netnamespaces.network.openshift.io`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetNamespace {
    #[serde(rename = "apiVersion", default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub netname: String,
    #[serde(default)]
    pub netid: u32,
    #[serde(rename = "egressIPs", default)]
    pub egress_ips: Vec<String>,
}

impl TypedResource for NetNamespace {
    const KIND: &'static str = "NetNamespace";

    fn gvr() -> GroupVersionResource {
        GroupVersionResource::new(NETWORK_GROUP, "v1", "netnamespaces")
    }
}

impl TypedResource for CustomResourceDefinition {
    const KIND: &'static str = "CustomResourceDefinition";

    fn gvr() -> GroupVersionResource {
        GroupVersionResource::new("apiextensions.k8s.io", "v1", "customresourcedefinitions")
    }
}
