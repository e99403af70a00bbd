use gslb_federator_core::{Passthrough, RouteMeta};
use gslb_federator_k8s_api::{Labels, ResourceExt, Route};

/// Builds the federation metadata for a route.
///
/// Returns `None` until a router has admitted the route and published its address. Passthrough
/// routes carry no paths and are health-checked on the default HTTPS port.
pub fn route_meta(route: &Route, cluster: &str) -> Option<RouteMeta> {
    let ip_addr = route.ip_addr()?.to_string();
    if route.spec.host.is_empty() {
        return None;
    }

    let (paths, passthrough) = if route.is_passthrough() {
        (Vec::new(), Some(Passthrough::default()))
    } else {
        let path = match route.spec.path.as_deref() {
            Some(path) if !path.is_empty() => path,
            _ => "/",
        };
        (vec![path.to_string()], None)
    };

    Some(RouteMeta {
        cluster: cluster.to_string(),
        namespace: route.namespace().unwrap_or_default(),
        name: route.name_any(),
        hostname: route.spec.host.clone(),
        ip_addr,
        labels: Labels::from(route.metadata.labels.clone()),
        paths,
        tls: route.spec.tls.is_some(),
        passthrough,
    })
}
