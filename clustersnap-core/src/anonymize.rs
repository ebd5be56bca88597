//! Deterministic masking of sensitive fields before serialization.
//!
//! Every function here is pure: it takes the fetched value by ownership and
//! returns the masked copy. Gatherers call them exactly once, before a value
//! is wrapped into a [`Record`](crate::record::Record). Identity fields
//! (`metadata.name`, `metadata.namespace`) are never touched, so record names
//! derived from them stay stable.

use crate::models::{Infrastructure, Proxy, ProxySettings};
use regex::Regex;
use std::sync::OnceLock;

/// Matches every character that is not URL structure.
#[allow(clippy::expect_used)]
fn url_content_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^.\-/:]").expect("Invalid URL masking pattern"))
}

/// Masks a URL-like string.
///
/// Every character except `.`, `-`, `/` and `:` becomes `x`, which keeps the
/// shape of the value (scheme, label count, port length) without any of its
/// content.
///
/// # Example
///
/// ```rust
/// use clustersnap_core::anonymize::anonymize_url;
///
/// let masked = anonymize_url("https://api.example.com:6443");
/// assert_eq!(masked, "xxxxx://xxx.xxxxxxx.xxx:xxxx");
/// ```
pub fn anonymize_url(value: &str) -> String {
    url_content_pattern().replace_all(value, "x").into_owned()
}

/// Masks API endpoints, the etcd discovery domain and the infrastructure name.
pub fn anonymize_infrastructure(mut infrastructure: Infrastructure) -> Infrastructure {
    let status = &mut infrastructure.status;
    status.api_server_url = anonymize_url(&status.api_server_url);
    status.etcd_discovery_domain = anonymize_url(&status.etcd_discovery_domain);
    status.infrastructure_name = anonymize_url(&status.infrastructure_name);
    status.api_server_internal_url = anonymize_url(&status.api_server_internal_url);
    infrastructure
}

/// Masks proxy endpoints and the no-proxy list in both spec and status.
pub fn anonymize_proxy(mut proxy: Proxy) -> Proxy {
    mask_proxy_settings(&mut proxy.spec);
    mask_proxy_settings(&mut proxy.status);
    proxy
}

fn mask_proxy_settings(settings: &mut ProxySettings) {
    settings.http_proxy = anonymize_url(&settings.http_proxy);
    settings.https_proxy = anonymize_url(&settings.https_proxy);
    settings.no_proxy = anonymize_url(&settings.no_proxy);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::InfrastructureStatus;
    use kube::core::ObjectMeta;
    use proptest::prelude::*;

    fn infrastructure() -> Infrastructure {
        Infrastructure {
            api_version: "config.openshift.io/v1".to_string(),
            kind: "Infrastructure".to_string(),
            metadata: ObjectMeta {
                name: Some("cluster".to_string()),
                ..Default::default()
            },
            spec: serde_json::Value::Null,
            status: InfrastructureStatus {
                infrastructure_name: "prod-7xk2p".to_string(),
                etcd_discovery_domain: "example.com".to_string(),
                api_server_url: "https://api.example.com:6443".to_string(),
                api_server_internal_url: "https://api-int.example.com:6443".to_string(),
                other: serde_json::Map::new(),
            },
        }
    }

    #[test]
    fn test_anonymize_url_keeps_structure() {
        assert_eq!(anonymize_url("https://api.example.com:6443"), "xxxxx://xxx.xxxxxxx.xxx:xxxx");
        assert_eq!(anonymize_url("api-int.example.com"), "xxx-xxx.xxxxxxx.xxx");
        assert_eq!(anonymize_url(""), "");
    }

    #[test]
    fn test_anonymize_infrastructure_masks_all_sensitive_fields() {
        let masked = anonymize_infrastructure(infrastructure());
        let serialized = serde_json::to_string(&masked).unwrap();

        assert!(!serialized.contains("example.com"));
        assert!(!serialized.contains("prod-7xk2p"));
        assert_eq!(masked.status.infrastructure_name, "xxxx-xxxxx");
        assert_eq!(masked.metadata.name.as_deref(), Some("cluster"));
    }

    #[test]
    fn test_anonymize_proxy_masks_spec_and_status() {
        let mut proxy = Proxy::default();
        proxy.spec.http_proxy = "http://user:pw@proxy.corp.internal:3128".to_string();
        proxy.status.no_proxy = ".cluster.local,10.0.0.0/16,corp.internal".to_string();

        let masked = anonymize_proxy(proxy);

        assert!(!masked.spec.http_proxy.contains("corp"));
        assert!(!masked.spec.http_proxy.contains("pw"));
        assert!(!masked.status.no_proxy.contains("corp"));
        assert!(masked.spec.https_proxy.is_empty());
    }

    proptest! {
        #[test]
        fn prop_anonymize_url_preserves_length_and_hides_content(value in "[a-zA-Z0-9.:/-]{0,64}") {
            let masked = anonymize_url(&value);
            prop_assert_eq!(masked.chars().count(), value.chars().count());
            prop_assert!(masked.chars().all(|c| matches!(c, 'x' | '.' | '-' | '/' | ':')));
        }

        #[test]
        fn prop_anonymize_url_is_deterministic(value in ".{0,64}") {
            prop_assert_eq!(anonymize_url(&value), anonymize_url(&value));
        }
    }
}
