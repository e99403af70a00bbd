//! Tracks member-cluster namespaces so that the namespace selector can be (re-)applied.

use crate::{reconcile, SharedContext};
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use futures::prelude::*;
use gslb_federator_core::GlobalFilter;
use gslb_federator_k8s_api::{watcher, Labels, Namespace, ResourceExt};
use parking_lot::RwLock;

/// Holds the labels of every namespace in every member cluster.
#[derive(Debug, Default)]
pub struct NamespaceStore {
    clusters: RwLock<HashMap<String, HashMap<String, Labels>>>,
}

// === impl NamespaceStore ===

impl NamespaceStore {
    pub fn apply(&self, cluster: &str, namespace: &str, labels: Labels) {
        self.clusters
            .write()
            .entry(cluster.to_string())
            .or_default()
            .insert(namespace.to_string(), labels);
    }

    pub fn delete(&self, cluster: &str, namespace: &str) {
        let mut clusters = self.clusters.write();
        if let Some(namespaces) = clusters.get_mut(cluster) {
            namespaces.remove(namespace);
            if namespaces.is_empty() {
                clusters.remove(cluster);
            }
        }
    }

    pub fn names(&self, cluster: &str) -> Vec<String> {
        self.clusters
            .read()
            .get(cluster)
            .map(|namespaces| namespaces.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Selects every known namespace whose labels match the filter's namespace selector.
    ///
    /// Returns the number of namespaces selected. Does nothing if the filter has no namespace
    /// selector.
    pub fn apply_to_filter(&self, filter: &GlobalFilter) -> usize {
        let Ok(label) = filter.ns_filter_label() else {
            return 0;
        };

        // Snapshot the matches so that the filter is not locked while the store is.
        let matches = self
            .clusters
            .read()
            .iter()
            .flat_map(|(cluster, namespaces)| {
                namespaces
                    .iter()
                    .filter(|(_, labels)| label.matches(labels))
                    .map(move |(ns, _)| (cluster.clone(), ns.clone()))
            })
            .collect::<Vec<_>>();

        let mut selected = 0;
        for (cluster, namespace) in matches {
            match filter.add_ns_to_ns_filter(&cluster, &namespace) {
                Ok(()) => selected += 1,
                Err(error) => {
                    tracing::warn!(%cluster, %namespace, %error, "Failed to select namespace");
                }
            }
        }
        tracing::debug!(selected, "Applied namespaces to filter");
        selected
    }
}

/// Processes a member cluster's namespace watch until the stream ends.
pub async fn index_namespaces(
    cluster: String,
    ctx: SharedContext,
    events: impl Stream<Item = watcher::Event<Namespace>>,
) {
    tokio::pin!(events);
    let mut initial = None::<HashSet<String>>;
    while let Some(event) = events.next().await {
        match event {
            watcher::Event::Apply(ns) => apply_namespace(&ctx, &cluster, ns),
            watcher::Event::Delete(ns) => delete_namespace(&ctx, &cluster, &ns.name_any()),
            watcher::Event::Init => initial = Some(HashSet::default()),
            watcher::Event::InitApply(ns) => {
                if let Some(initial) = initial.as_mut() {
                    initial.insert(ns.name_any());
                }
                apply_namespace(&ctx, &cluster, ns);
            }
            watcher::Event::InitDone => {
                // Namespaces that vanished while the watch was restarting.
                let seen = initial.take().unwrap_or_default();
                for name in ctx.namespaces.names(&cluster) {
                    if !seen.contains(&name) {
                        delete_namespace(&ctx, &cluster, &name);
                    }
                }
            }
        }
    }
    tracing::debug!(%cluster, "Namespace watch ended");
}

/// Records a namespace and, if it newly matches the namespace selector, selects it and
/// re-evaluates its objects.
pub fn apply_namespace(ctx: &SharedContext, cluster: &str, ns: Namespace) {
    let name = ns.name_any();
    let labels = Labels::from(ns.metadata.labels);
    ctx.namespaces.apply(cluster, &name, labels.clone());

    let Ok(label) = ctx.filter.ns_filter_label() else {
        return;
    };
    if !label.matches(&labels) {
        return;
    }
    if ctx
        .filter
        .selected_namespaces(cluster)
        .iter()
        .any(|ns| *ns == name)
    {
        return;
    }

    match ctx.filter.add_ns_to_ns_filter(cluster, &name) {
        Ok(()) => {
            tracing::info!(%cluster, namespace = %name, "Selected namespace");
            reconcile::reevaluate_namespace(ctx, cluster, &name);
        }
        Err(error) => tracing::warn!(%cluster, namespace = %name, %error, "Failed to select namespace"),
    }
}

/// Forgets a namespace's labels. A namespace that was selected stays selected until the policy
/// changes; its objects are removed by their own watches.
pub fn delete_namespace(ctx: &SharedContext, cluster: &str, name: &str) {
    tracing::debug!(%cluster, namespace = %name, "Deleted namespace");
    ctx.namespaces.delete(cluster, name);
}
