//! Object metadata for federated endpoints.
//!
//! Every endpoint-bearing object discovered in a member cluster, whatever its native
//! representation, is reduced to an [`ObjectMeta`] that resolves to exactly one
//! `(cluster, namespace, name, hostname)` tuple.

use crate::{checksum, Error, FederationKey, GlobalFilter, HostMaps, Result};
use gslb_federator_k8s_api::Labels;
use std::fmt;

/// The default port used to health-check passthrough routes.
pub const DEFAULT_HTTPS_HEALTH_MONITOR_PORT: u16 = 443;

pub const PROTOCOL_TCP: &str = "TCP";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Ingress,
    Route,
    Service,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectMeta {
    IngressHost(IngressHostMeta),
    Route(RouteMeta),
    Service(ServiceMeta),
}

/// A single virtual host of an ingress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngressHostMeta {
    pub cluster: String,
    pub namespace: String,
    pub ingress_name: String,
    pub hostname: String,
    pub ip_addr: String,
    pub labels: Labels,
    /// Deduplicated paths of all rules for this host, in discovery order.
    pub paths: Vec<String>,
    pub tls: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub cluster: String,
    pub namespace: String,
    pub name: String,
    pub hostname: String,
    pub ip_addr: String,
    pub labels: Labels,
    /// Empty for passthrough routes, which are not path-addressable.
    pub paths: Vec<String>,
    pub tls: bool,
    pub passthrough: Option<Passthrough>,
}

/// The health-check target of a passthrough route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Passthrough {
    pub port: u16,
    pub protocol: String,
}

/// A load-balancer service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceMeta {
    pub cluster: String,
    pub namespace: String,
    pub name: String,
    pub hostname: String,
    pub ip_addr: String,
    pub labels: Labels,
}

// === impl ObjectKind ===

impl ObjectKind {
    pub const ALL: [Self; 3] = [Self::Ingress, Self::Route, Self::Service];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingress => "Ingress",
            Self::Route => "Route",
            Self::Service => "LBSvc",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl std::str::FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidKey(s.to_string()))
    }
}

// === impl Passthrough ===

impl Default for Passthrough {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTPS_HEALTH_MONITOR_PORT,
            protocol: PROTOCOL_TCP.to_string(),
        }
    }
}

// === impl ObjectMeta ===

impl ObjectMeta {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::IngressHost(_) => ObjectKind::Ingress,
            Self::Route(_) => ObjectKind::Route,
            Self::Service(_) => ObjectKind::Service,
        }
    }

    /// The name the object is indexed under within its namespace.
    ///
    /// Ingress hosts are named `ingress/hostname`.
    pub fn name(&self) -> String {
        match self {
            Self::IngressHost(ing) => format!("{}/{}", ing.ingress_name, ing.hostname),
            Self::Route(route) => route.name.clone(),
            Self::Service(svc) => svc.name.clone(),
        }
    }

    /// The name of the native object this was derived from.
    pub fn source_name(&self) -> &str {
        match self {
            Self::IngressHost(ing) => &ing.ingress_name,
            Self::Route(route) => &route.name,
            Self::Service(svc) => &svc.name,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            Self::IngressHost(ing) => &ing.namespace,
            Self::Route(route) => &route.namespace,
            Self::Service(svc) => &svc.namespace,
        }
    }

    pub fn cluster(&self) -> &str {
        match self {
            Self::IngressHost(ing) => &ing.cluster,
            Self::Route(route) => &route.cluster,
            Self::Service(svc) => &svc.cluster,
        }
    }

    pub fn hostname(&self) -> &str {
        match self {
            Self::IngressHost(ing) => &ing.hostname,
            Self::Route(route) => &route.hostname,
            Self::Service(svc) => &svc.hostname,
        }
    }

    pub fn ip_addr(&self) -> &str {
        match self {
            Self::IngressHost(ing) => &ing.ip_addr,
            Self::Route(route) => &route.ip_addr,
            Self::Service(svc) => &svc.ip_addr,
        }
    }

    pub fn labels(&self) -> &Labels {
        match self {
            Self::IngressHost(ing) => &ing.labels,
            Self::Route(route) => &route.labels,
            Self::Service(svc) => &svc.labels,
        }
    }

    pub fn paths(&self) -> Result<&[String]> {
        let paths = match self {
            Self::IngressHost(ing) => &ing.paths,
            Self::Route(route) => &route.paths,
            Self::Service(_) => return Err(self.empty_paths()),
        };
        if paths.is_empty() {
            return Err(self.empty_paths());
        }
        Ok(paths)
    }

    pub fn tls(&self) -> bool {
        match self {
            Self::IngressHost(ing) => ing.tls,
            Self::Route(route) => route.tls,
            Self::Service(_) => false,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Route(RouteMeta { passthrough: Some(_), .. }))
    }

    pub fn port(&self) -> Result<u16> {
        self.passthrough("port").map(|p| p.port)
    }

    pub fn protocol(&self) -> Result<&str> {
        self.passthrough("protocol").map(|p| p.protocol.as_str())
    }

    fn passthrough(&self, op: &'static str) -> Result<&Passthrough> {
        match self {
            Self::Route(RouteMeta {
                passthrough: Some(passthrough),
                ..
            }) => Ok(passthrough),
            _ => Err(Error::Unsupported {
                kind: self.kind(),
                op,
            }),
        }
    }

    fn empty_paths(&self) -> Error {
        Error::EmptyPaths {
            kind: self.kind(),
            name: self.name(),
        }
    }

    pub fn federation_key(&self) -> FederationKey {
        FederationKey {
            cluster: self.cluster().to_string(),
            namespace: self.namespace().to_string(),
            kind: self.kind(),
            name: self.source_name().to_string(),
            hostname: match self {
                Self::IngressHost(ing) => Some(ing.hostname.clone()),
                _ => None,
            },
        }
    }

    /// Summarizes the object's federated state so that updates which change nothing relevant can
    /// be skipped.
    pub fn checksum(&self) -> u32 {
        let labels = self
            .labels()
            .iter()
            .fold(0u32, |acc, (k, v)| {
                acc.wrapping_add(checksum::hash(&format!("{k}={v}")))
            });
        let paths = match self {
            Self::IngressHost(ing) => checksum::paths(&ing.paths),
            Self::Route(route) => checksum::paths(&route.paths),
            Self::Service(_) => 0,
        };
        let tls = if self.tls() { checksum::hash("tls") } else { 0 };
        labels
            .wrapping_add(checksum::sum([
                self.cluster(),
                self.namespace(),
                self.source_name(),
                self.hostname(),
                self.ip_addr(),
            ]))
            .wrapping_add(paths)
            .wrapping_add(tls)
    }

    /// Evaluates the global filter for this object, logging the reason for the decision.
    pub fn apply_filter(&self, filter: &GlobalFilter) -> bool {
        let decision = filter.apply_filter(self.cluster(), self.namespace(), self.labels());
        if decision.is_accepted() {
            tracing::debug!(
                kind = %self.kind(),
                cluster = %self.cluster(),
                namespace = %self.namespace(),
                name = %self.name(),
                %decision,
                "Applied global filter"
            );
        } else {
            tracing::info!(
                kind = %self.kind(),
                cluster = %self.cluster(),
                namespace = %self.namespace(),
                name = %self.name(),
                %decision,
                "Applied global filter"
            );
        }
        decision.is_accepted()
    }

    pub fn remember(&self, maps: &HostMaps, key: &str) {
        maps.get(self.kind())
            .remember(key, self.ip_addr(), self.hostname());
    }

    pub fn recall(&self, maps: &HostMaps, key: &str) -> String {
        maps.get(self.kind()).recall(key)
    }

    pub fn forget(&self, maps: &HostMaps, key: &str) {
        maps.get(self.kind()).forget(key)
    }
}
