use super::*;
use gslb_federator_core::{IngressHostMeta, Passthrough, RouteMeta, ServiceMeta};
use gslb_federator_k8s_api::Labels;
use pretty_assertions::assert_eq;

#[test]
fn ingress_expands_per_addressed_host() {
    let ing = mk_ingress(
        "default",
        "web",
        app_labels(),
        &[
            ("a.example.com", &["/foo", "/bar"]),
            ("a.example.com", &["/bar", "/baz"]),
            ("b.example.com", &[]),
            ("c.example.com", &["/"]),
        ],
        &["a.example.com"],
        &[
            ("a.example.com", "10.0.0.1"),
            ("b.example.com", "10.0.0.2"),
            ("a.example.com", "10.0.0.3"),
        ],
    );

    let metas = ingress::ingress_host_metas(&ing, CLUSTER1);
    assert_eq!(
        metas,
        vec![
            IngressHostMeta {
                cluster: CLUSTER1.to_string(),
                namespace: "default".to_string(),
                ingress_name: "web".to_string(),
                hostname: "a.example.com".to_string(),
                ip_addr: "10.0.0.1".to_string(),
                labels: Labels::from(app_labels()),
                paths: vec!["/foo".to_string(), "/bar".to_string(), "/baz".to_string()],
                tls: true,
            },
            IngressHostMeta {
                cluster: CLUSTER1.to_string(),
                namespace: "default".to_string(),
                ingress_name: "web".to_string(),
                hostname: "b.example.com".to_string(),
                ip_addr: "10.0.0.2".to_string(),
                labels: Labels::from(app_labels()),
                paths: vec!["/".to_string()],
                tls: false,
            },
        ]
    );
}

#[test]
fn ingress_without_status_has_no_hosts() {
    let mut ing = mk_ingress(
        "default",
        "web",
        None,
        &[("a.example.com", &["/"])],
        &[],
        &[],
    );
    assert!(ingress::ingress_host_metas(&ing, CLUSTER1).is_empty());

    ing.status = None;
    assert!(ingress::ingress_host_metas(&ing, CLUSTER1).is_empty());
}

#[test]
fn routes() {
    let edge = mk_route(
        "default",
        "shop",
        app_labels(),
        "shop.example.com",
        Some("/cart"),
        Some("edge"),
        Some("10.1.0.1"),
    );
    assert_eq!(
        route::route_meta(&edge, CLUSTER2),
        Some(RouteMeta {
            cluster: CLUSTER2.to_string(),
            namespace: "default".to_string(),
            name: "shop".to_string(),
            hostname: "shop.example.com".to_string(),
            ip_addr: "10.1.0.1".to_string(),
            labels: Labels::from(app_labels()),
            paths: vec!["/cart".to_string()],
            tls: true,
            passthrough: None,
        })
    );

    let plain = mk_route(
        "default",
        "shop",
        None,
        "shop.example.com",
        None,
        None,
        Some("10.1.0.1"),
    );
    let meta = route::route_meta(&plain, CLUSTER2).expect("route must be admitted");
    assert_eq!(meta.paths, vec!["/".to_string()]);
    assert!(!meta.tls);

    let passthrough = mk_route(
        "default",
        "db",
        None,
        "db.example.com",
        Some("/ignored"),
        Some("passthrough"),
        Some("10.1.0.2"),
    );
    let meta = route::route_meta(&passthrough, CLUSTER2).expect("route must be admitted");
    assert!(meta.paths.is_empty());
    assert_eq!(meta.passthrough, Some(Passthrough::default()));
    assert_eq!(
        meta.passthrough.map(|p| (p.port, p.protocol)),
        Some((443, "TCP".to_string()))
    );

    let pending = mk_route(
        "default",
        "new",
        None,
        "new.example.com",
        None,
        None,
        None,
    );
    assert_eq!(route::route_meta(&pending, CLUSTER2), None);
}

#[test]
fn services() {
    let lb = mk_service(
        "default",
        "api",
        app_labels(),
        "LoadBalancer",
        Some(("api.example.com", "10.2.0.1")),
    );
    assert_eq!(
        service::service_meta(&lb, CLUSTER1),
        Some(ServiceMeta {
            cluster: CLUSTER1.to_string(),
            namespace: "default".to_string(),
            name: "api".to_string(),
            hostname: "api.example.com".to_string(),
            ip_addr: "10.2.0.1".to_string(),
            labels: Labels::from(app_labels()),
        })
    );

    let cluster_ip = mk_service(
        "default",
        "api",
        app_labels(),
        "ClusterIP",
        Some(("api.example.com", "10.2.0.1")),
    );
    assert_eq!(service::service_meta(&cluster_ip, CLUSTER1), None);

    let unassigned = mk_service("default", "api", app_labels(), "LoadBalancer", None);
    assert_eq!(service::service_meta(&unassigned, CLUSTER1), None);
}
