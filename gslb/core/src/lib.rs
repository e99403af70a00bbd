//! GSLB federation core
//!
//! Member clusters are watched independently; each ingress host, route, and load-balancer service
//! they expose is reduced to an [`ObjectMeta`]. The federation core decides which of these objects
//! participate in the global load-balancing view and tracks them across processing stages:
//!
//! - The [`GlobalFilter`] holds the current federation policy (cluster, namespace, and application
//!   selection plus traffic weights) and a checksum used to detect policy changes.
//! - A [`ClusterStore`] per object kind indexes every observed object by cluster, namespace, and
//!   name.
//! - A [`HostMap`] per object kind remembers the hostname an accepted object advertised, so that a
//!   deletion can still be resolved to the global service it must be withdrawn from.
//! - [`WorkQueues`] connect the processing stages. Work items are keys only; a worker always
//!   re-reads current state from the stores and the filter, so every step is idempotent under
//!   at-least-once delivery.
//!
//! ```text
//! [ watch ] -> [ ObjectMeta ] -> [ GlobalFilter ] -> [ ClusterStore / HostMap ]
//!     -> (ingestion) -> [ graph ] -> (graph) -> [ rest ] -> (retry) -> [ graph ] ...
//! ```

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod checksum;
mod error;
pub mod filter;
mod gdp;
pub mod host_map;
mod key;
pub mod object;
pub mod queue;
pub mod retry;
pub mod store;

pub use self::{
    error::{Error, Result},
    filter::{ClusterTraffic, FilterDecision, GlobalFilter, Label},
    gdp::{GdpObj, PolicyRef},
    host_map::{HostEntry, HostMap, HostMaps},
    key::{split_namespace_name, FederationKey},
    object::{IngressHostMeta, ObjectKind, ObjectMeta, Passthrough, RouteMeta, ServiceMeta},
    queue::{QueueConfig, QueueError, QueueName, WorkQueue, WorkQueues},
    store::{ClusterStore, Stores},
};
