//! Federation indexes for member-cluster resources.
//!
//! One [`MemberIndex`] exists per member cluster, fed by watches on that cluster's ingresses,
//! routes, and load-balancer services. Each observed object is reduced to one or more
//! [`ObjectMeta`](gslb_federator_core::ObjectMeta) entries, recorded in the shared stores, and
//! evaluated against the global filter. Objects whose federation state may have changed are
//! published onto the object-ingestion queue, and the graph stage in [`nodes`] turns them into
//! global-service keys for the downstream layer.
//!
//! ```text
//! [ Namespace ] -> [ NamespaceStore ] -> [ GlobalFilter ] <- [ GlobalDeploymentPolicy ]
//!                                              |
//! [ Ingress | Route | Service ] -> [ MemberIndex ] -> ingestion queue -> [ nodes ] -> graph queue
//! ```
//!
//! The filter, stores, host memory, and queues are owned by a single [`Context`] built at startup
//! and shared by every index and worker.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod ingress;
mod member;
pub mod metrics;
pub mod namespace;
pub mod nodes;
mod policy;
pub mod reconcile;
pub mod route;
pub mod service;


pub use self::{
    member::{MemberIndex, SharedMemberIndex},
    metrics::IndexMetrics,
    namespace::NamespaceStore,
    nodes::{members_for_host, sync_from_ingestion_layer, Member},
    policy::{PolicyIndex, SharedPolicyIndex},
};
use gslb_federator_core::{GdpObj, GlobalFilter, HostMaps, Stores, WorkQueues};
use std::sync::Arc;

pub type SharedContext = Arc<Context>;

/// Holds all federation state shared between the indexes and the processing stages.
#[derive(Debug)]
pub struct Context {
    /// The tenant that owns every global service produced by this process.
    pub tenant: String,

    pub filter: GlobalFilter,

    /// Identifies the authoritative policy.
    pub gdp: GdpObj,

    pub stores: Stores,

    /// Remembers the hostname announced for each federated key, so that it may be withdrawn
    /// after the object disappears.
    pub host_maps: HostMaps,

    pub queues: WorkQueues,

    pub namespaces: NamespaceStore,

    pub metrics: IndexMetrics,
}

// === impl Context ===

impl Context {
    pub fn new(
        tenant: impl Into<String>,
        queues: WorkQueues,
        metrics: IndexMetrics,
    ) -> SharedContext {
        Arc::new(Self {
            tenant: tenant.into(),
            filter: GlobalFilter::default(),
            gdp: GdpObj::default(),
            stores: Stores::default(),
            host_maps: HostMaps::default(),
            queues,
            namespaces: NamespaceStore::default(),
            metrics,
        })
    }

    /// The graph-queue key of the global service for `hostname`.
    pub fn gs_key(&self, hostname: &str) -> String {
        format!("{}/{}", self.tenant, hostname)
    }
}
