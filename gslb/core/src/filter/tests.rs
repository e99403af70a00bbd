use super::*;
use gslb_federator_k8s_api::{
    policy::{GlobalDeploymentPolicySpec, MatchRules},
    ObjectMeta,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const CLUSTER1: &str = "cluster1";
const CLUSTER2: &str = "cluster2";

fn mk_gdp(
    app: Option<(&'static str, &'static str)>,
    ns: Option<(&'static str, &'static str)>,
    clusters: &[&str],
    split: &[(&str, u32)],
) -> GlobalDeploymentPolicy {
    GlobalDeploymentPolicy {
        metadata: ObjectMeta {
            name: Some("global-gdp".to_string()),
            namespace: Some("gslb-system".to_string()),
            ..Default::default()
        },
        spec: GlobalDeploymentPolicySpec {
            match_rules: MatchRules {
                app_selector: app.into_iter().collect(),
                namespace_selector: ns.into_iter().collect(),
            },
            match_clusters: clusters.iter().map(|c| c.to_string()).collect(),
            traffic_split: split
                .iter()
                .map(|(cluster, weight)| TrafficSplit {
                    cluster: cluster.to_string(),
                    weight: *weight,
                })
                .collect(),
        },
    }
}

fn app_labels() -> Labels {
    Labels::from_iter(Some(("app", "gslb")))
}

#[rstest]
#[case::cluster_not_selected(
    None,
    "cluster3",
    "default",
    app_labels(),
    FilterDecision::Rejected(RejectReason::ClusterNotSelected)
)]
#[case::no_selector(
    None,
    CLUSTER1,
    "default",
    app_labels(),
    FilterDecision::Rejected(RejectReason::NoSelector)
)]
#[case::app_selector_match(
    Some(("app", "gslb")),
    CLUSTER1,
    "default",
    app_labels(),
    FilterDecision::Accepted(AcceptReason::AppSelector)
)]
#[case::app_selector_mismatch(
    Some(("app", "gslb")),
    CLUSTER2,
    "default",
    Labels::from_iter(Some(("app", "other"))),
    FilterDecision::Rejected(RejectReason::AppSelector)
)]
fn app_only_decisions(
    #[case] app: Option<(&'static str, &'static str)>,
    #[case] cluster: &str,
    #[case] namespace: &str,
    #[case] labels: Labels,
    #[case] expected: FilterDecision,
) {
    let filter = GlobalFilter::default();
    filter.add_to_filter(&mk_gdp(app, None, &[CLUSTER1, CLUSTER2], &[]));

    let decision = filter.apply_filter(cluster, namespace, &labels);
    assert_eq!(decision, expected);
    // The decision is a pure function of its inputs.
    assert_eq!(filter.apply_filter(cluster, namespace, &labels), decision);
}

#[rstest]
#[case::no_namespaces_in_cluster(
    None,
    CLUSTER2,
    "default",
    FilterDecision::Rejected(RejectReason::NamespaceSelector)
)]
#[case::namespace_not_selected(
    None,
    CLUSTER1,
    "other",
    FilterDecision::Rejected(RejectReason::NamespaceNotSelected)
)]
#[case::namespace_selected(
    None,
    CLUSTER1,
    "default",
    FilterDecision::Accepted(AcceptReason::NamespaceSelector)
)]
#[case::namespace_and_app(
    Some(("app", "gslb")),
    CLUSTER1,
    "default",
    FilterDecision::Accepted(AcceptReason::NamespaceAndAppSelector)
)]
#[case::namespace_but_not_app(
    Some(("app", "other")),
    CLUSTER1,
    "default",
    FilterDecision::Rejected(RejectReason::AppSelector)
)]
fn namespace_decisions(
    #[case] app: Option<(&'static str, &'static str)>,
    #[case] cluster: &str,
    #[case] namespace: &str,
    #[case] expected: FilterDecision,
) {
    let filter = GlobalFilter::default();
    filter.add_to_filter(&mk_gdp(
        app,
        Some(("gslb", "enabled")),
        &[CLUSTER1, CLUSTER2],
        &[],
    ));
    filter.add_ns_to_ns_filter(CLUSTER1, "default").unwrap();

    assert_eq!(filter.apply_filter(cluster, namespace, &app_labels()), expected);
}

#[test]
fn empty_filter_rejects_everything() {
    let filter = GlobalFilter::default();
    assert_eq!(
        filter.apply_filter(CLUSTER1, "default", &app_labels()),
        FilterDecision::Rejected(RejectReason::ClusterNotSelected)
    );
    assert_eq!(filter.checksum(), 0);
}

#[test]
fn multi_label_selector_is_absent() {
    let mut gdp = mk_gdp(None, None, &[CLUSTER1], &[]);
    gdp.spec.match_rules.app_selector = [("app", "gslb"), ("tier", "web")].into_iter().collect();

    let filter = GlobalFilter::default();
    filter.add_to_filter(&gdp);
    assert_eq!(filter.app_filter_label(), Err(Error::NoAppFilter));
    assert_eq!(
        filter.apply_filter(CLUSTER1, "default", &app_labels()),
        FilterDecision::Rejected(RejectReason::NoSelector)
    );
}

#[test]
fn checksum_is_order_independent() {
    let a = GlobalFilter::default();
    a.add_to_filter(&mk_gdp(
        Some(("app", "gslb")),
        Some(("gslb", "enabled")),
        &[CLUSTER1, CLUSTER2],
        &[(CLUSTER1, 8), (CLUSTER2, 2)],
    ));

    let b = GlobalFilter::default();
    b.add_to_filter(&mk_gdp(
        Some(("app", "gslb")),
        Some(("gslb", "enabled")),
        &[CLUSTER2, CLUSTER1],
        &[(CLUSTER2, 2), (CLUSTER1, 8)],
    ));

    assert_ne!(a.checksum(), 0);
    assert_eq!(a.checksum(), b.checksum());
}

#[test]
fn namespace_selection_does_not_change_checksum() {
    let filter = GlobalFilter::default();
    filter.add_to_filter(&mk_gdp(None, Some(("gslb", "enabled")), &[CLUSTER1], &[]));
    let before = filter.checksum();
    let ns_before = filter.ns_filter_checksum();

    filter.add_ns_to_ns_filter(CLUSTER1, "default").unwrap();
    assert_eq!(filter.checksum(), before);
    assert_eq!(filter.ns_filter_checksum(), ns_before);
}

#[test]
fn add_ns_is_set_like() {
    let filter = GlobalFilter::default();
    filter.add_to_filter(&mk_gdp(None, Some(("gslb", "enabled")), &[CLUSTER1], &[]));

    filter.add_ns_to_ns_filter(CLUSTER1, "default").unwrap();
    filter.add_ns_to_ns_filter(CLUSTER1, "shop").unwrap();
    filter.add_ns_to_ns_filter(CLUSTER1, "default").unwrap();
    assert_eq!(filter.selected_namespaces(CLUSTER1), vec!["default", "shop"]);
    assert_eq!(filter.selected_namespaces(CLUSTER2), Vec::<String>::new());
    assert_eq!(
        filter.ns_filter_label(),
        Ok(Label {
            key: "gslb".to_string(),
            value: "enabled".to_string()
        })
    );
}

#[test]
fn add_ns_requires_namespace_filter() {
    let filter = GlobalFilter::default();
    filter.add_to_filter(&mk_gdp(Some(("app", "gslb")), None, &[CLUSTER1], &[]));
    assert_eq!(
        filter.add_ns_to_ns_filter(CLUSTER1, "default"),
        Err(Error::NoNamespaceFilter)
    );
}

#[test]
fn traffic_weights() {
    let filter = GlobalFilter::default();
    filter.add_to_filter(&mk_gdp(
        Some(("app", "gslb")),
        None,
        &[CLUSTER1, CLUSTER2],
        &[(CLUSTER1, 8)],
    ));
    assert_eq!(filter.get_traffic_weight("default", CLUSTER1), Ok(8));
    assert_eq!(
        filter.get_traffic_weight("default", CLUSTER2),
        Err(Error::NoTrafficWeight(CLUSTER2.to_string()))
    );
}

#[test]
fn update_with_equivalent_policy_is_noop() {
    let old = mk_gdp(
        Some(("app", "gslb")),
        None,
        &[CLUSTER1, CLUSTER2],
        &[(CLUSTER1, 8), (CLUSTER2, 2)],
    );
    let new = mk_gdp(
        Some(("app", "gslb")),
        None,
        &[CLUSTER2, CLUSTER1],
        &[(CLUSTER2, 2), (CLUSTER1, 8)],
    );

    let filter = GlobalFilter::default();
    filter.add_to_filter(&old);
    assert_eq!(filter.update_global_filter(&old, &new), (false, false));
}

#[test]
fn moving_selector_label_is_a_change() {
    let app = mk_gdp(Some(("gslb", "enabled")), None, &[CLUSTER1], &[]);
    let ns = mk_gdp(None, Some(("gslb", "enabled")), &[CLUSTER1], &[]);

    let filter = GlobalFilter::default();
    filter.add_to_filter(&app);
    assert_eq!(filter.update_global_filter(&app, &ns), (true, false));
    assert_eq!(filter.app_filter_label(), Err(Error::NoAppFilter));
    assert_eq!(
        filter.ns_filter_label(),
        Ok(Label {
            key: "gslb".to_string(),
            value: "enabled".to_string()
        })
    );
}

#[test]
fn traffic_split_fields_are_delimited() {
    let a = GlobalFilter::default();
    a.add_to_filter(&mk_gdp(None, None, &[], &[("c1", 12)]));
    let b = GlobalFilter::default();
    b.add_to_filter(&mk_gdp(None, None, &[], &[("c11", 2)]));
    assert_ne!(a.checksum(), b.checksum());

    // A cluster that is both selected and weighted is not confused with either role.
    let selected = GlobalFilter::default();
    selected.add_to_filter(&mk_gdp(None, None, &["c1"], &[]));
    let split = GlobalFilter::default();
    split.add_to_filter(&mk_gdp(None, None, &[], &[("c1", 0)]));
    assert_ne!(selected.checksum(), split.checksum());
}

#[test]
fn update_membership_change() {
    let old = mk_gdp(Some(("app", "gslb")), None, &[CLUSTER1], &[(CLUSTER1, 8)]);
    let new = mk_gdp(
        Some(("app", "gslb")),
        None,
        &[CLUSTER1, CLUSTER2],
        &[(CLUSTER1, 8)],
    );

    let filter = GlobalFilter::default();
    filter.add_to_filter(&old);
    assert!(!filter.is_cluster_allowed(CLUSTER2));

    assert_eq!(filter.update_global_filter(&old, &new), (true, false));
    assert!(filter.is_cluster_allowed(CLUSTER2));
    assert_eq!(
        filter.applicable_clusters(),
        vec![CLUSTER1.to_string(), CLUSTER2.to_string()]
    );
}

#[test]
fn update_weight_change() {
    let old = mk_gdp(Some(("app", "gslb")), None, &[CLUSTER1], &[(CLUSTER1, 8)]);
    let new = mk_gdp(Some(("app", "gslb")), None, &[CLUSTER1], &[(CLUSTER1, 5)]);

    let filter = GlobalFilter::default();
    filter.add_to_filter(&old);
    assert_eq!(filter.update_global_filter(&old, &new), (true, true));
    assert_eq!(
        filter.traffic_split(),
        vec![ClusterTraffic {
            cluster: CLUSTER1.to_string(),
            weight: 5
        }]
    );
}

#[test]
fn traffic_weight_changes() {
    let base = mk_gdp(None, None, &[], &[(CLUSTER1, 8), (CLUSTER2, 2)]);

    let reordered = mk_gdp(None, None, &[], &[(CLUSTER2, 2), (CLUSTER1, 8)]);
    assert!(!is_traffic_weight_changed(&reordered, &base));

    let removed = mk_gdp(None, None, &[], &[(CLUSTER1, 8)]);
    assert!(is_traffic_weight_changed(&removed, &base));

    let replaced = mk_gdp(None, None, &[], &[(CLUSTER1, 8), ("cluster3", 2)]);
    assert!(is_traffic_weight_changed(&replaced, &base));

    let reweighted = mk_gdp(None, None, &[], &[(CLUSTER1, 8), (CLUSTER2, 3)]);
    assert!(is_traffic_weight_changed(&reweighted, &base));
}

#[test]
fn delete_resets_filter() {
    let gdp = mk_gdp(
        Some(("app", "gslb")),
        Some(("gslb", "enabled")),
        &[CLUSTER1],
        &[(CLUSTER1, 8)],
    );
    let filter = GlobalFilter::default();
    filter.add_to_filter(&gdp);
    filter.delete_from_global_filter(&gdp);

    assert_eq!(filter.checksum(), 0);
    assert!(filter.traffic_split().is_empty());
    assert!(filter.applicable_clusters().is_empty());
    assert_eq!(filter.app_filter_label(), Err(Error::NoAppFilter));
    assert_eq!(filter.ns_filter_label(), Err(Error::NoNamespaceFilter));
}
