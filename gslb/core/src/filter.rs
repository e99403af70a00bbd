//! The global federation filter.
//!
//! A single [`GlobalFilter`] exists per process. It is built from the authoritative
//! `GlobalDeploymentPolicy` and mutated in place whenever that policy changes. Its checksum lets
//! policy updates that change nothing be ignored, and distinguishes membership changes (which
//! require every tracked object to be re-evaluated) from traffic-weight changes (which only require
//! weights to be re-announced downstream).

use crate::{checksum, Error, Result};
use ahash::AHashMap as HashMap;
use gslb_federator_k8s_api::{
    labels::LabelSelector, policy::TrafficSplit, GlobalDeploymentPolicy, Labels,
};
use parking_lot::RwLock;
use std::fmt;

#[cfg(test)]
mod tests;

#[derive(Debug, Default)]
pub struct GlobalFilter {
    state: RwLock<FilterState>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label {
    pub key: String,
    pub value: String,
}

/// Selects namespaces, per member cluster, by label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceFilter {
    pub label: Label,

    /// Namespaces selected in each cluster, in the order they were selected. Populated as
    /// namespaces matching `label` are observed.
    pub selected: HashMap<String, Vec<String>>,

    /// Accounts only for the label, so that namespace selections do not register as a policy
    /// change.
    pub checksum: u32,
}

/// The weight of traffic routed to a member cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterTraffic {
    pub cluster: String,
    pub weight: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct FilterState {
    app_filter: Option<Label>,
    ns_filter: Option<NamespaceFilter>,
    /// Never a wildcard: a cluster absent from this list is always rejected.
    applicable_clusters: Vec<String>,
    traffic_split: Vec<ClusterTraffic>,
    checksum: u32,
}

/// The outcome of evaluating the filter for an object.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterDecision {
    Accepted(AcceptReason),
    Rejected(RejectReason),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AcceptReason {
    NamespaceSelector,
    NamespaceAndAppSelector,
    AppSelector,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    ClusterNotSelected,
    /// No namespace has been selected in the object's cluster.
    NamespaceSelector,
    NamespaceNotSelected,
    AppSelector,
    NoSelector,
}

/// Indicates whether the traffic split differs between two versions of a policy.
///
/// The split has changed if the number of members differs, if a member of the old split is
/// missing from the new one, or if a member's weight differs. Ordering is irrelevant.
pub fn is_traffic_weight_changed(
    new: &GlobalDeploymentPolicy,
    old: &GlobalDeploymentPolicy,
) -> bool {
    traffic_split_changed(new.traffic_split(), old.traffic_split())
}

fn traffic_split_changed(new: &[TrafficSplit], old: &[TrafficSplit]) -> bool {
    if new.len() != old.len() {
        return true;
    }
    old.iter().any(|o| {
        match new.iter().find(|n| n.cluster == o.cluster) {
            Some(n) => n.weight != o.weight,
            None => true,
        }
    })
}

// === impl GlobalFilter ===

impl GlobalFilter {
    /// Decides whether an object with the given cluster, namespace, and labels is federated.
    ///
    /// The decision depends only on these inputs and the current filter state.
    pub fn apply_filter(&self, cluster: &str, namespace: &str, labels: &Labels) -> FilterDecision {
        self.state.read().decide(cluster, namespace, labels)
    }

    /// Rebuilds the filter from a policy document.
    pub fn add_to_filter(&self, gdp: &GlobalDeploymentPolicy) {
        let state = FilterState::from_policy(gdp);
        *self.state.write() = state;
        tracing::info!(
            namespace = gdp.metadata.namespace.as_deref().unwrap_or_default(),
            name = gdp.metadata.name.as_deref().unwrap_or_default(),
            "Added global filter"
        );
    }

    /// Replaces the filter with one built from `new` if the policy changed.
    ///
    /// Returns whether the filter was updated and, if so, whether the traffic split changed between
    /// `old` and `new`.
    pub fn update_global_filter(
        &self,
        old: &GlobalDeploymentPolicy,
        new: &GlobalDeploymentPolicy,
    ) -> (bool, bool) {
        let candidate = FilterState::from_policy(new);
        let name = new.metadata.name.as_deref().unwrap_or_default();

        let mut state = self.state.write();
        tracing::debug!(old = state.checksum, new = candidate.checksum, %name, "Comparing checksums");
        if state.checksum == candidate.checksum {
            return (false, false);
        }
        *state = candidate;
        drop(state);

        let traffic_changed = is_traffic_weight_changed(new, old);
        tracing::info!(%name, traffic_changed, "Global filter changed");
        (true, traffic_changed)
    }

    /// Resets the filter to its empty state, rejecting everything.
    pub fn delete_from_global_filter(&self, gdp: &GlobalDeploymentPolicy) {
        *self.state.write() = FilterState::default();
        tracing::info!(
            name = gdp.metadata.name.as_deref().unwrap_or_default(),
            "Deleted global filter"
        );
    }

    /// Selects a namespace in a cluster. Fails if no namespace filter is configured.
    pub fn add_ns_to_ns_filter(&self, cluster: &str, namespace: &str) -> Result<()> {
        let mut state = self.state.write();
        let ns_filter = state.ns_filter.as_mut().ok_or(Error::NoNamespaceFilter)?;
        let selected = ns_filter.selected.entry(cluster.to_string()).or_default();
        if !selected.iter().any(|ns| ns == namespace) {
            selected.push(namespace.to_string());
        }
        Ok(())
    }

    pub fn get_traffic_weight(&self, namespace: &str, cluster: &str) -> Result<u32> {
        let state = self.state.read();
        match state.traffic_split.iter().find(|ct| ct.cluster == cluster) {
            Some(ct) => Ok(ct.weight),
            None => {
                tracing::debug!(%namespace, %cluster, "No weight available for cluster");
                Err(Error::NoTrafficWeight(cluster.to_string()))
            }
        }
    }

    pub fn is_cluster_allowed(&self, cluster: &str) -> bool {
        self.state
            .read()
            .applicable_clusters
            .iter()
            .any(|c| c == cluster)
    }

    pub fn ns_filter_label(&self) -> Result<Label> {
        self.state
            .read()
            .ns_filter
            .as_ref()
            .map(|f| f.label.clone())
            .ok_or(Error::NoNamespaceFilter)
    }

    pub fn app_filter_label(&self) -> Result<Label> {
        self.state
            .read()
            .app_filter
            .clone()
            .ok_or(Error::NoAppFilter)
    }

    pub fn ns_filter_checksum(&self) -> Option<u32> {
        self.state.read().ns_filter.as_ref().map(|f| f.checksum)
    }

    pub fn selected_namespaces(&self, cluster: &str) -> Vec<String> {
        self.state
            .read()
            .ns_filter
            .as_ref()
            .and_then(|f| f.selected.get(cluster).cloned())
            .unwrap_or_default()
    }

    pub fn checksum(&self) -> u32 {
        self.state.read().checksum
    }

    pub fn traffic_split(&self) -> Vec<ClusterTraffic> {
        self.state.read().traffic_split.clone()
    }

    pub fn applicable_clusters(&self) -> Vec<String> {
        self.state.read().applicable_clusters.clone()
    }
}

// === impl FilterState ===

impl FilterState {
    fn from_policy(gdp: &GlobalDeploymentPolicy) -> Self {
        let rules = &gdp.spec.match_rules;
        let mut state = Self {
            app_filter: Label::from_selector(&rules.app_selector),
            ns_filter: Label::from_selector(&rules.namespace_selector).map(NamespaceFilter::new),
            applicable_clusters: gdp.spec.match_clusters.clone(),
            traffic_split: gdp
                .spec
                .traffic_split
                .iter()
                .map(|ts| ClusterTraffic {
                    cluster: ts.cluster.clone(),
                    weight: ts.weight,
                })
                .collect(),
            checksum: 0,
        };
        state.checksum = state.compute_checksum();
        state
    }

    fn compute_checksum(&self) -> u32 {
        // Every field is tagged so that moving a value between fields changes the sum.
        let mut cksum = 0u32;
        if let Some(app) = &self.app_filter {
            cksum = cksum.wrapping_add(app.checksum("app"));
        }
        if let Some(ns) = &self.ns_filter {
            cksum = cksum.wrapping_add(ns.checksum);
        }
        for cluster in &self.applicable_clusters {
            cksum = cksum.wrapping_add(checksum::hash(&format!("cluster:{cluster}")));
        }
        for ct in &self.traffic_split {
            cksum = cksum.wrapping_add(checksum::hash(&format!(
                "split:{}={}",
                ct.cluster, ct.weight
            )));
        }
        cksum
    }

    fn decide(&self, cluster: &str, namespace: &str, labels: &Labels) -> FilterDecision {
        use FilterDecision::*;

        if !self.applicable_clusters.iter().any(|c| c == cluster) {
            return Rejected(RejectReason::ClusterNotSelected);
        }

        if let Some(ns_filter) = &self.ns_filter {
            let selected = match ns_filter.selected.get(cluster) {
                Some(selected) => selected,
                None => return Rejected(RejectReason::NamespaceSelector),
            };
            if !selected.iter().any(|ns| ns == namespace) {
                return Rejected(RejectReason::NamespaceNotSelected);
            }
            return match &self.app_filter {
                None => Accepted(AcceptReason::NamespaceSelector),
                Some(app) if app.matches(labels) => Accepted(AcceptReason::NamespaceAndAppSelector),
                Some(_) => Rejected(RejectReason::AppSelector),
            };
        }

        match &self.app_filter {
            None => Rejected(RejectReason::NoSelector),
            Some(app) if app.matches(labels) => Accepted(AcceptReason::AppSelector),
            Some(_) => Rejected(RejectReason::AppSelector),
        }
    }
}

// === impl Label ===

impl Label {
    /// Only a selector with exactly one label produces a filter label.
    fn from_selector(selector: &LabelSelector) -> Option<Self> {
        selector.single_label().map(|(key, value)| Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        labels.contains(&self.key, &self.value)
    }

    fn checksum(&self, field: &str) -> u32 {
        checksum::hash(&format!("{field}:{}={}", self.key, self.value))
    }
}

// === impl NamespaceFilter ===

impl NamespaceFilter {
    fn new(label: Label) -> Self {
        let checksum = label.checksum("ns");
        Self {
            label,
            selected: HashMap::default(),
            checksum,
        }
    }
}

// === impl FilterDecision ===

impl FilterDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted(reason) => write!(f, "accepted because of {}", reason),
            Self::Rejected(reason) => write!(f, "rejected because {}", reason),
        }
    }
}

impl fmt::Display for AcceptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamespaceSelector => "namespaceSelector".fmt(f),
            Self::NamespaceAndAppSelector => "namespaceSelector and appSelector".fmt(f),
            Self::AppSelector => "appSelector".fmt(f),
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClusterNotSelected => "cluster is not selected".fmt(f),
            Self::NamespaceSelector => "no namespace is selected in this cluster".fmt(f),
            Self::NamespaceNotSelected => "namespace is not selected".fmt(f),
            Self::AppSelector => "of appSelector".fmt(f),
            Self::NoSelector => "no selector is configured".fmt(f),
        }
    }
}
