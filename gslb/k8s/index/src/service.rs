use gslb_federator_core::ServiceMeta;
use gslb_federator_k8s_api::{Labels, ResourceExt, Service};

const LOAD_BALANCER: &str = "LoadBalancer";

/// Builds the federation metadata for a `LoadBalancer` service.
///
/// Returns `None` for other service types, and for load balancers that have not yet been assigned
/// both a hostname and an address. The first load-balancer ingress providing both is used.
pub fn service_meta(svc: &Service, cluster: &str) -> Option<ServiceMeta> {
    let type_ = svc.spec.as_ref().and_then(|spec| spec.type_.as_deref());
    if type_ != Some(LOAD_BALANCER) {
        return None;
    }

    let (hostname, ip_addr) = svc
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_deref())
        .unwrap_or_default()
        .iter()
        .find_map(|lb| match (lb.hostname.as_deref(), lb.ip.as_deref()) {
            (Some(hostname), Some(ip)) if !hostname.is_empty() && !ip.is_empty() => {
                Some((hostname.to_string(), ip.to_string()))
            }
            _ => None,
        })?;

    Some(ServiceMeta {
        cluster: cluster.to_string(),
        namespace: svc.namespace().unwrap_or_default(),
        name: svc.name_any(),
        hostname,
        ip_addr,
        labels: Labels::from(svc.metadata.labels.clone()),
    })
}
