//! Expands an `Ingress` into one entry per load-balanced virtual host.

use gslb_federator_core::IngressHostMeta;
use gslb_federator_k8s_api::{Ingress, Labels, ResourceExt};

/// Builds one [`IngressHostMeta`] per host that the ingress controller has assigned both a
/// hostname and an IP address.
///
/// Each host carries the deduplicated paths of every rule naming it, defaulting to `/`, and is
/// TLS-enabled only if it appears in the ingress's TLS host list.
pub fn ingress_host_metas(ingress: &Ingress, cluster: &str) -> Vec<IngressHostMeta> {
    let namespace = ingress.namespace().unwrap_or_default();
    let name = ingress.name_any();
    let labels = Labels::from(ingress.metadata.labels.clone());
    let tls_hosts = tls_hosts(ingress);

    host_ips(ingress)
        .into_iter()
        .map(|(hostname, ip_addr)| IngressHostMeta {
            cluster: cluster.to_string(),
            namespace: namespace.clone(),
            ingress_name: name.clone(),
            labels: labels.clone(),
            paths: host_paths(ingress, &hostname),
            tls: tls_hosts.iter().any(|h| *h == hostname),
            hostname,
            ip_addr,
        })
        .collect()
}

/// Lists `(hostname, ip)` pairs from the load-balancer status, first occurrence wins.
fn host_ips(ingress: &Ingress) -> Vec<(String, String)> {
    let lb_ingresses = ingress
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_deref())
        .unwrap_or_default();

    let mut hosts = Vec::<(String, String)>::new();
    for lb in lb_ingresses {
        let (Some(hostname), Some(ip)) = (lb.hostname.as_deref(), lb.ip.as_deref()) else {
            continue;
        };
        if hostname.is_empty() || ip.is_empty() {
            continue;
        }
        if hosts.iter().any(|(h, _)| h == hostname) {
            continue;
        }
        hosts.push((hostname.to_string(), ip.to_string()));
    }
    hosts
}

fn host_paths(ingress: &Ingress, hostname: &str) -> Vec<String> {
    let rules = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_deref())
        .unwrap_or_default();

    let mut paths = Vec::<String>::new();
    for rule in rules {
        if rule.host.as_deref() != Some(hostname) {
            continue;
        }
        let rule_paths = rule
            .http
            .as_ref()
            .map(|http| http.paths.as_slice())
            .unwrap_or_default();
        for path in rule_paths {
            let path = path.path.as_deref().unwrap_or("/");
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }
    }

    if paths.is_empty() {
        paths.push("/".to_string());
    }
    paths
}

fn tls_hosts(ingress: &Ingress) -> Vec<String> {
    ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.tls.as_deref())
        .unwrap_or_default()
        .iter()
        .flat_map(|tls| tls.hosts.iter().flatten().cloned())
        .collect()
}
