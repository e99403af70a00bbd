use crate::{ingress, route, service, SharedContext};
use gslb_federator_core::{ObjectKind, ObjectMeta, QueueName};
use gslb_federator_k8s_api::{Ingress, ResourceExt, Route, Service};
use parking_lot::RwLock;
use std::sync::Arc;

pub type SharedMemberIndex = Arc<RwLock<MemberIndex>>;

/// Indexes the federatable objects of a single member cluster.
///
/// Every native object is reduced to zero or more [`ObjectMeta`] entries keyed by the name the
/// store indexes them under: `ingress/hostname` for ingress hosts, the object name otherwise.
#[derive(Debug)]
pub struct MemberIndex {
    cluster: String,
    ctx: SharedContext,
}

// === impl MemberIndex ===

impl MemberIndex {
    pub fn shared(cluster: impl Into<String>, ctx: SharedContext) -> SharedMemberIndex {
        Arc::new(RwLock::new(Self {
            cluster: cluster.into(),
            ctx,
        }))
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Replaces every entry derived from the native object `source` with `metas`.
    ///
    /// Entries that are no longer produced, such as an ingress host that lost its address, are
    /// deleted. An empty `metas` deletes the object entirely.
    fn apply_metas(&self, kind: ObjectKind, namespace: &str, source: &str, metas: Vec<ObjectMeta>) {
        let store = self.ctx.stores.get(kind);
        let existing = match kind {
            ObjectKind::Ingress => {
                store.names_with_prefix(&self.cluster, namespace, &format!("{source}/"))
            }
            ObjectKind::Route | ObjectKind::Service => store
                .get(&self.cluster, namespace, source)
                .map(|_| vec![source.to_string()])
                .unwrap_or_default(),
        };
        for name in existing {
            if !metas.iter().any(|meta| meta.name() == name) {
                self.delete_object(kind, namespace, &name);
            }
        }

        for meta in metas {
            self.apply_meta(meta);
        }
    }

    fn apply_meta(&self, meta: ObjectMeta) {
        let kind = meta.kind();
        let namespace = meta.namespace().to_string();
        let name = meta.name();
        let key = meta.federation_key().to_string();
        let checksum = meta.checksum();

        let accepted = meta.apply_filter(&self.ctx.filter);
        self.ctx.metrics.evaluated(kind, &self.cluster, accepted);

        let prev = self
            .ctx
            .stores
            .get(kind)
            .add_or_update(meta, &self.cluster, &namespace, &name);
        let remembered = !self.ctx.host_maps.get(kind).recall(&key).is_empty();

        let changed = prev.as_ref().map_or(true, |prev| prev.checksum() != checksum);
        if !changed && accepted == remembered {
            tracing::trace!(%key, "No changes");
            return;
        }
        if prev.is_none() && !accepted && !remembered {
            tracing::debug!(%key, "Not federated");
            return;
        }

        tracing::debug!(%key, accepted, remembered, changed, "Publishing object");
        self.publish(&key);
    }

    fn delete_object(&self, kind: ObjectKind, namespace: &str, name: &str) {
        let Some(removed) =
            self.ctx
                .stores
                .get(kind)
                .delete_cluster_ns_obj(&self.cluster, namespace, name)
        else {
            return;
        };
        self.ctx.metrics.deleted(kind, &self.cluster);

        let key = removed.federation_key().to_string();
        tracing::debug!(%key, "Deleted object");
        self.publish(&key);
    }

    fn publish(&self, key: &str) {
        if let Err(error) = self.ctx.queues.publish(QueueName::ObjectIngestion, key) {
            tracing::error!(cluster = %self.cluster, %key, %error, "Failed to publish key");
        }
    }
}

impl kubert::index::IndexNamespacedResource<Ingress> for MemberIndex {
    fn apply(&mut self, ingress: Ingress) {
        let namespace = ingress.namespace().unwrap_or_default();
        let name = ingress.name_any();
        let metas = ingress::ingress_host_metas(&ingress, &self.cluster)
            .into_iter()
            .map(ObjectMeta::IngressHost)
            .collect::<Vec<_>>();
        if metas.is_empty() {
            tracing::debug!(cluster = %self.cluster, %namespace, %name, "Ingress has no addressed hosts");
        }
        self.apply_metas(ObjectKind::Ingress, &namespace, &name, metas);
    }

    fn delete(&mut self, namespace: String, name: String) {
        self.apply_metas(ObjectKind::Ingress, &namespace, &name, Vec::new());
    }
}

impl kubert::index::IndexNamespacedResource<Route> for MemberIndex {
    fn apply(&mut self, route: Route) {
        let namespace = route.namespace().unwrap_or_default();
        let name = route.name_any();
        let metas = route::route_meta(&route, &self.cluster)
            .map(ObjectMeta::Route)
            .into_iter()
            .collect();
        self.apply_metas(ObjectKind::Route, &namespace, &name, metas);
    }

    fn delete(&mut self, namespace: String, name: String) {
        self.apply_metas(ObjectKind::Route, &namespace, &name, Vec::new());
    }
}

impl kubert::index::IndexNamespacedResource<Service> for MemberIndex {
    fn apply(&mut self, svc: Service) {
        let namespace = svc.namespace().unwrap_or_default();
        let name = svc.name_any();
        let metas = service::service_meta(&svc, &self.cluster)
            .map(ObjectMeta::Service)
            .into_iter()
            .collect();
        self.apply_metas(ObjectKind::Service, &namespace, &name, metas);
    }

    fn delete(&mut self, namespace: String, name: String) {
        self.apply_metas(ObjectKind::Service, &namespace, &name, Vec::new());
    }
}
