//! SDN network namespaces, summarized into one record.
//!
//! Location in archive: `config/netnamespaces`

use super::{GatherUnit, classify};
use crate::{
    accessor::{ResourceAccessor, list_typed},
    context::GatherContext,
    models::NetNamespace,
    record::{GatherResult, Record},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The archived view of one `NetNamespace`.
///
/// Names, egress IPs and network IDs are not masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetNamespaceSummary {
    pub name: String,
    #[serde(rename = "egressIPs")]
    pub egress_ips: Vec<String>,
    #[serde(rename = "netID")]
    pub net_id: u32,
}

impl From<NetNamespace> for NetNamespaceSummary {
    fn from(namespace: NetNamespace) -> Self {
        Self {
            name: namespace.metadata.name.unwrap_or_default(),
            egress_ips: namespace.egress_ips,
            net_id: namespace.netid,
        }
    }
}

/// Collects every `NetNamespace` into a single array record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetNamespaces;

#[async_trait]
impl GatherUnit for NetNamespaces {
    fn id(&self) -> &'static str {
        "clusterconfig/netnamespaces"
    }

    async fn gather_with(
        &self,
        ctx: &GatherContext,
        accessor: &dyn ResourceAccessor,
    ) -> GatherResult {
        gather_netnamespaces(ctx, accessor).await
    }
}

/// Lists `NetNamespace` objects and emits one summary record.
///
/// An empty list produces no record.
pub async fn gather_netnamespaces(
    ctx: &GatherContext,
    accessor: &dyn ResourceAccessor,
) -> GatherResult {
    let fetched = list_typed::<NetNamespace>(accessor, ctx).await;
    classify(fetched, |namespaces| {
        if namespaces.is_empty() {
            return Vec::new();
        }
        let summaries: Vec<NetNamespaceSummary> =
            namespaces.into_iter().map(NetNamespaceSummary::from).collect();
        vec![Record::json("config/netnamespaces", summaries)]
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::accessor::{FakeAccessor, FakeFailure, TypedResource};
    use serde_json::json;

    fn netnamespace(name: &str, netid: u32, egress: &[&str]) -> serde_json::Value {
        json!({
            "apiVersion": "network.openshift.io/v1",
            "kind": "NetNamespace",
            "metadata": {"name": name},
            "netname": name,
            "netid": netid,
            "egressIPs": egress
        })
    }

    #[tokio::test]
    async fn test_netnamespaces_summary() {
        let fake = FakeAccessor::new()
            .with_json(&NetNamespace::gvr(), netnamespace("default", 0, &[]))
            .with_json(
                &NetNamespace::gvr(),
                netnamespace("openshift-ingress", 4_211_101, &["10.0.12.4", "10.0.12.5"]),
            );

        let result = gather_netnamespaces(&GatherContext::new(), &fake).await;
        assert!(result.errors.is_empty());
        assert_eq!(result.record_names(), vec!["config/netnamespaces"]);

        let entry = result.records[0].to_entry(&GatherContext::new()).unwrap();
        let summaries: Vec<NetNamespaceSummary> = serde_json::from_slice(&entry.bytes).unwrap();
        assert_eq!(
            summaries,
            vec![
                NetNamespaceSummary {
                    name: "default".to_string(),
                    egress_ips: vec![],
                    net_id: 0,
                },
                NetNamespaceSummary {
                    name: "openshift-ingress".to_string(),
                    egress_ips: vec!["10.0.12.4".to_string(), "10.0.12.5".to_string()],
                    net_id: 4_211_101,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_list_produces_nothing() {
        let result = gather_netnamespaces(&GatherContext::new(), &FakeAccessor::new()).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_missing_kind_is_not_an_error() {
        let fake =
            FakeAccessor::new().with_kind_failure(&NetNamespace::gvr(), FakeFailure::NotFound);
        let result = gather_netnamespaces(&GatherContext::new(), &fake).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_is_reported() {
        let fake = FakeAccessor::new().with_json(
            &NetNamespace::gvr(),
            json!({
                "apiVersion": "network.openshift.io/v1",
                "kind": "NetNamespace",
                "metadata": {"name": "broken"},
                "netid": "not-a-number"
            }),
        );

        let result = gather_netnamespaces(&GatherContext::new(), &fake).await;
        assert!(result.records.is_empty());
        assert!(matches!(
            result.errors.as_slice(),
            [crate::error::GatherError::Decode { .. }]
        ));
    }
}
