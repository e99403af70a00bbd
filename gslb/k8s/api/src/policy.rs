use super::labels::LabelSelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Describes which objects, from which member clusters, are federated into the global
/// load-balancing view and how traffic is split between the clusters.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "gslb.federator.io",
    version = "v1alpha1",
    kind = "GlobalDeploymentPolicy",
    shortname = "gdp",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDeploymentPolicySpec {
    #[serde(default)]
    pub match_rules: MatchRules,

    /// Member clusters the rules apply to. Objects from any other cluster are never federated.
    #[serde(default)]
    pub match_clusters: Vec<String>,

    #[serde(default)]
    pub traffic_split: Vec<TrafficSplit>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchRules {
    #[serde(default)]
    pub app_selector: LabelSelector,

    #[serde(default)]
    pub namespace_selector: LabelSelector,
}

/// The relative weight of traffic routed to a single member cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct TrafficSplit {
    pub cluster: String,
    pub weight: u32,
}

impl GlobalDeploymentPolicy {
    pub fn traffic_split(&self) -> &[TrafficSplit] {
        &self.spec.traffic_split
    }
}
