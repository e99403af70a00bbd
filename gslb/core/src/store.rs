//! Indexes every object currently observed in the member clusters.
//!
//! Absence from a store means the object is not currently observed; presence means the entry is
//! the last observed state. Readers receive owned snapshots so that no store lock is held while
//! the filter or host memory is consulted.

use crate::{ObjectKind, ObjectMeta};
use ahash::AHashMap as HashMap;
use parking_lot::RwLock;

type NameIndex = HashMap<String, ObjectMeta>;
type NamespaceIndex = HashMap<String, NameIndex>;

/// A `cluster -> namespace -> name -> object` index for a single object kind.
#[derive(Debug, Default)]
pub struct ClusterStore {
    clusters: RwLock<HashMap<String, NamespaceIndex>>,
}

/// Holds a [`ClusterStore`] for each object kind.
#[derive(Debug, Default)]
pub struct Stores {
    pub ingress: ClusterStore,
    pub route: ClusterStore,
    pub service: ClusterStore,
}

/// Deletes an object from a store that may not exist yet. Deleting from a missing store is a
/// no-op.
pub fn delete_from_store(
    store: Option<&ClusterStore>,
    cluster: &str,
    namespace: &str,
    name: &str,
) -> Option<ObjectMeta> {
    store?.delete_cluster_ns_obj(cluster, namespace, name)
}

// === impl ClusterStore ===

impl ClusterStore {
    /// Inserts or overwrites an object, returning the previously stored state.
    pub fn add_or_update(
        &self,
        meta: ObjectMeta,
        cluster: &str,
        namespace: &str,
        name: &str,
    ) -> Option<ObjectMeta> {
        self.clusters
            .write()
            .entry(cluster.to_string())
            .or_default()
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), meta)
    }

    /// Removes an object, returning its last state. Removing an unknown object is a no-op.
    pub fn delete_cluster_ns_obj(
        &self,
        cluster: &str,
        namespace: &str,
        name: &str,
    ) -> Option<ObjectMeta> {
        let mut clusters = self.clusters.write();
        let namespaces = clusters.get_mut(cluster)?;
        let names = namespaces.get_mut(namespace)?;
        let removed = names.remove(name);

        if names.is_empty() {
            namespaces.remove(namespace);
        }
        if namespaces.is_empty() {
            clusters.remove(cluster);
        }
        removed
    }

    pub fn get(&self, cluster: &str, namespace: &str, name: &str) -> Option<ObjectMeta> {
        self.clusters
            .read()
            .get(cluster)?
            .get(namespace)?
            .get(name)
            .cloned()
    }

    pub fn namespace_objects(&self, cluster: &str, namespace: &str) -> Vec<ObjectMeta> {
        self.clusters
            .read()
            .get(cluster)
            .and_then(|namespaces| namespaces.get(namespace))
            .map(|names| names.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn cluster_objects(&self, cluster: &str) -> Vec<ObjectMeta> {
        self.clusters
            .read()
            .get(cluster)
            .map(|namespaces| {
                namespaces
                    .values()
                    .flat_map(|names| names.values().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn all_objects(&self) -> Vec<ObjectMeta> {
        self.clusters
            .read()
            .values()
            .flat_map(|namespaces| namespaces.values())
            .flat_map(|names| names.values().cloned())
            .collect()
    }

    /// Returns every object, in any cluster, that advertises `hostname`.
    pub fn objects_for_hostname(&self, hostname: &str) -> Vec<ObjectMeta> {
        self.clusters
            .read()
            .values()
            .flat_map(|namespaces| namespaces.values())
            .flat_map(|names| names.values())
            .filter(|meta| meta.hostname() == hostname)
            .cloned()
            .collect()
    }

    /// Lists the names in a namespace that start with `prefix`.
    pub fn names_with_prefix(&self, cluster: &str, namespace: &str, prefix: &str) -> Vec<String> {
        self.clusters
            .read()
            .get(cluster)
            .and_then(|namespaces| namespaces.get(namespace))
            .map(|names| {
                names
                    .keys()
                    .filter(|name| name.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.clusters
            .read()
            .values()
            .flat_map(|namespaces| namespaces.values())
            .map(|names| names.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.read().is_empty()
    }
}

// === impl Stores ===

impl Stores {
    pub fn get(&self, kind: ObjectKind) -> &ClusterStore {
        match kind {
            ObjectKind::Ingress => &self.ingress,
            ObjectKind::Route => &self.route,
            ObjectKind::Service => &self.service,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectKind, &ClusterStore)> {
        ObjectKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}
