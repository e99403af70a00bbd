use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An OpenShift route, trimmed to the fields needed to federate it.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "route.openshift.io",
    version = "v1",
    kind = "Route",
    status = "RouteStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    #[serde(default)]
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub to: RouteTargetReference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteTargetReference {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    /// One of `edge`, `passthrough` or `reencrypt`.
    #[serde(default)]
    pub termination: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatus {
    #[serde(default)]
    pub ingress: Vec<RouteIngress>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteIngress {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub router_name: String,
    #[serde(default)]
    pub conditions: Vec<RouteIngressCondition>,
}

/// The router that admitted a route publishes the route's virtual IP in the condition message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct RouteIngressCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub const TERMINATION_PASSTHROUGH: &str = "passthrough";
const CONDITION_ADMITTED: &str = "Admitted";

impl Route {
    /// Indicates whether the route terminates TLS at the backend.
    pub fn is_passthrough(&self) -> bool {
        self.spec
            .tls
            .as_ref()
            .map(|tls| tls.termination == TERMINATION_PASSTHROUGH)
            .unwrap_or(false)
    }

    /// Returns the virtual IP published for the route's host by an admitting router.
    pub fn ip_addr(&self) -> Option<&str> {
        let status = self.status.as_ref()?;
        status
            .ingress
            .iter()
            .filter(|ingress| ingress.host == self.spec.host)
            .flat_map(|ingress| ingress.conditions.iter())
            .find(|cond| cond.type_ == CONDITION_ADMITTED && cond.status == "True")
            .and_then(|cond| cond.message.as_deref())
            .filter(|ip| !ip.is_empty())
    }
}
