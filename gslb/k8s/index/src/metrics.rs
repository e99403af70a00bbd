use gslb_federator_core::ObjectKind;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

/// Counts the objects evaluated by the member indexes.
#[derive(Clone, Debug, Default)]
pub struct IndexMetrics {
    objects: Family<ObjectLabels, Counter>,
    deletes: Family<DeleteLabels, Counter>,
    filter_updates: Counter,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ObjectLabels {
    kind: &'static str,
    cluster: String,
    decision: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct DeleteLabels {
    kind: &'static str,
    cluster: String,
}

// === impl IndexMetrics ===

impl IndexMetrics {
    pub fn register(prom: &mut Registry) -> Self {
        let objects = Family::default();
        prom.register(
            "objects",
            "Count of member-cluster objects evaluated against the global filter",
            objects.clone(),
        );

        let deletes = Family::default();
        prom.register(
            "object_deletes",
            "Count of member-cluster objects removed from the stores",
            deletes.clone(),
        );

        let filter_updates = Counter::default();
        prom.register(
            "filter_updates",
            "Count of global filter changes",
            filter_updates.clone(),
        );

        Self {
            objects,
            deletes,
            filter_updates,
        }
    }

    pub(crate) fn evaluated(&self, kind: ObjectKind, cluster: &str, accepted: bool) {
        self.objects
            .get_or_create(&ObjectLabels {
                kind: kind.as_str(),
                cluster: cluster.to_string(),
                decision: if accepted { "accepted" } else { "rejected" },
            })
            .inc();
    }

    pub(crate) fn deleted(&self, kind: ObjectKind, cluster: &str) {
        self.deletes
            .get_or_create(&DeleteLabels {
                kind: kind.as_str(),
                cluster: cluster.to_string(),
            })
            .inc();
    }

    pub(crate) fn filter_updated(&self) {
        self.filter_updates.inc();
    }
}
