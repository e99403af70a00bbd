use super::*;
use futures::stream;
use gslb_federator_core::ObjectKind;
use gslb_federator_k8s_api::watcher;
use kubert::index::IndexNamespacedResource;
use pretty_assertions::assert_eq;

fn app_gdp(name: &str, split: &[(&str, u32)]) -> GlobalDeploymentPolicy {
    mk_gdp(name, Some(("app", "gslb")), None, &[CLUSTER1], split)
}

fn web_ingress(ns: &str) -> Ingress {
    mk_ingress(
        ns,
        "web",
        app_labels(),
        &[("web.example.com", &["/"])],
        &["web.example.com"],
        &[("web.example.com", "10.0.0.1")],
    )
}

#[test]
fn policy_added_after_objects_federates_them() {
    let mut h = Harness::new();
    let member = MemberIndex::shared(CLUSTER1, h.ctx.clone());
    member.write().apply(web_ingress("default"));
    assert_eq!(h.ingestion_keys(), Vec::<String>::new());

    let policies = PolicyIndex::shared(POLICY_NS, h.ctx.clone());
    policies.write().apply(app_gdp("global-gdp", &[]));
    assert!(h.ctx.gdp.is("global-gdp", POLICY_NS));
    assert_eq!(h.pump(), vec!["admin/web.example.com"]);
}

#[test]
fn first_policy_is_authoritative() {
    let h = Harness::new();
    let policies = PolicyIndex::shared(POLICY_NS, h.ctx.clone());

    policies.write().apply(app_gdp("global-gdp", &[]));
    policies
        .write()
        .apply(mk_gdp("other-gdp", None, None, &[CLUSTER2], &[]));

    assert!(h.ctx.gdp.is("global-gdp", POLICY_NS));
    assert_eq!(h.ctx.filter.applicable_clusters(), vec![CLUSTER1.to_string()]);

    // Deleting the ignored policy changes nothing.
    IndexNamespacedResource::<GlobalDeploymentPolicy>::delete(
        &mut *policies.write(),
        POLICY_NS.to_string(),
        "other-gdp".to_string(),
    );
    assert!(h.ctx.gdp.is("global-gdp", POLICY_NS));
}

#[test]
fn policies_outside_policy_namespace_are_ignored() {
    let h = Harness::new();
    let policies = PolicyIndex::shared(POLICY_NS, h.ctx.clone());

    let mut gdp = app_gdp("global-gdp", &[]);
    gdp.metadata.namespace = Some("default".to_string());
    policies.write().apply(gdp);

    assert!(h.ctx.gdp.is_empty());
    assert_eq!(h.ctx.filter.checksum(), 0);
}

#[test]
fn deleting_policy_withdraws_everything() {
    let mut h = Harness::new();
    let policies = PolicyIndex::shared(POLICY_NS, h.ctx.clone());
    policies.write().apply(app_gdp("global-gdp", &[]));
    let member = MemberIndex::shared(CLUSTER1, h.ctx.clone());
    member.write().apply(web_ingress("default"));
    assert_eq!(h.pump(), vec!["admin/web.example.com"]);

    IndexNamespacedResource::<GlobalDeploymentPolicy>::delete(
        &mut *policies.write(),
        POLICY_NS.to_string(),
        "global-gdp".to_string(),
    );
    assert!(h.ctx.gdp.is_empty());
    assert_eq!(h.pump(), vec!["admin/web.example.com"]);
    assert!(h.ctx.host_maps.get(ObjectKind::Ingress).is_empty());
    assert_eq!(h.ctx.stores.ingress.len(), 1);
}

#[test]
fn traffic_weight_change_reannounces() {
    let mut h = Harness::new();
    let policies = PolicyIndex::shared(POLICY_NS, h.ctx.clone());
    policies.write().apply(app_gdp("global-gdp", &[(CLUSTER1, 8)]));
    let member = MemberIndex::shared(CLUSTER1, h.ctx.clone());
    member.write().apply(web_ingress("default"));
    h.pump();

    // An equivalent update is ignored.
    policies.write().apply(app_gdp("global-gdp", &[(CLUSTER1, 8)]));
    assert_eq!(h.ingestion_keys(), Vec::<String>::new());
    assert_eq!(h.graph_keys(), Vec::<String>::new());

    policies.write().apply(app_gdp("global-gdp", &[(CLUSTER1, 5)]));
    assert_eq!(h.ingestion_keys(), Vec::<String>::new());
    assert_eq!(h.graph_keys(), vec!["admin/web.example.com"]);
    assert_eq!(
        members_for_host(&h.ctx, "web.example.com")
            .into_iter()
            .map(|m| m.weight)
            .collect::<Vec<_>>(),
        vec![Some(5)]
    );
}

#[test]
fn cluster_removed_from_policy_is_withdrawn() {
    let mut h = Harness::new();
    let policies = PolicyIndex::shared(POLICY_NS, h.ctx.clone());
    policies.write().apply(app_gdp("global-gdp", &[]));
    let member = MemberIndex::shared(CLUSTER1, h.ctx.clone());
    member.write().apply(web_ingress("default"));
    h.pump();

    policies
        .write()
        .apply(mk_gdp("global-gdp", Some(("app", "gslb")), None, &[CLUSTER2], &[]));
    assert_eq!(h.pump(), vec!["admin/web.example.com"]);
    assert!(members_for_host(&h.ctx, "web.example.com").is_empty());
}

#[test]
fn namespace_selection() {
    let mut h = Harness::new();

    // Namespaces observed before the policy are selected when it arrives.
    namespace::apply_namespace(
        &h.ctx,
        CLUSTER1,
        mk_namespace("default", labels(&[("gslb", "enabled")])),
    );
    let policies = PolicyIndex::shared(POLICY_NS, h.ctx.clone());
    policies.write().apply(mk_gdp(
        "global-gdp",
        None,
        Some(("gslb", "enabled")),
        &[CLUSTER1],
        &[],
    ));
    assert_eq!(h.ctx.filter.selected_namespaces(CLUSTER1), vec!["default"]);

    let member = MemberIndex::shared(CLUSTER1, h.ctx.clone());
    member.write().apply(web_ingress("default"));
    member.write().apply(web_ingress("shop"));
    assert_eq!(h.pump(), vec!["admin/web.example.com"]);

    // Labelling a namespace selects it and federates its objects.
    namespace::apply_namespace(&h.ctx, CLUSTER1, mk_namespace("shop", None));
    assert_eq!(h.ingestion_keys(), Vec::<String>::new());
    namespace::apply_namespace(
        &h.ctx,
        CLUSTER1,
        mk_namespace("shop", labels(&[("gslb", "enabled")])),
    );
    assert_eq!(
        h.ctx.filter.selected_namespaces(CLUSTER1),
        vec!["default", "shop"]
    );
    assert_eq!(h.pump(), vec!["admin/web.example.com"]);
    assert_eq!(members_for_host(&h.ctx, "web.example.com").len(), 2);
}

#[tokio::test]
async fn namespace_watch_resyncs() {
    let h = Harness::new();
    h.ctx.filter.add_to_filter(&mk_gdp(
        "global-gdp",
        None,
        Some(("gslb", "enabled")),
        &[CLUSTER1],
        &[],
    ));
    namespace::apply_namespace(&h.ctx, CLUSTER1, mk_namespace("stale", None));

    let events = stream::iter(vec![
        watcher::Event::Init,
        watcher::Event::InitApply(mk_namespace(
            "default",
            labels(&[("gslb", "enabled")]),
        )),
        watcher::Event::InitApply(mk_namespace("kube-system", None)),
        watcher::Event::InitDone,
        watcher::Event::Delete(mk_namespace("kube-system", None)),
    ]);
    namespace::index_namespaces(CLUSTER1.to_string(), h.ctx.clone(), events).await;

    assert_eq!(h.ctx.namespaces.names(CLUSTER1), vec!["default".to_string()]);
    assert_eq!(h.ctx.filter.selected_namespaces(CLUSTER1), vec!["default"]);
    assert_eq!(h.ctx.namespaces.apply_to_filter(&h.ctx.filter), 1);
}
