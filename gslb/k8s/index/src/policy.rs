use crate::{reconcile, SharedContext};
use gslb_federator_k8s_api::{GlobalDeploymentPolicy, ResourceExt};
use parking_lot::RwLock;
use std::sync::Arc;

pub type SharedPolicyIndex = Arc<RwLock<PolicyIndex>>;

/// Indexes `GlobalDeploymentPolicy` resources in the policy namespace.
///
/// Only one policy is authoritative at a time: the first one observed. Other policies are ignored
/// until the authoritative policy is deleted.
#[derive(Debug)]
pub struct PolicyIndex {
    namespace: String,
    ctx: SharedContext,

    /// The last observed version of the authoritative policy.
    current: Option<GlobalDeploymentPolicy>,
}

// === impl PolicyIndex ===

impl PolicyIndex {
    pub fn shared(namespace: impl Into<String>, ctx: SharedContext) -> SharedPolicyIndex {
        Arc::new(RwLock::new(Self {
            namespace: namespace.into(),
            ctx,
            current: None,
        }))
    }

    fn add(&mut self, gdp: GlobalDeploymentPolicy) {
        let name = gdp.name_any();
        self.ctx.gdp.set(name.clone(), self.namespace.clone());
        self.ctx.filter.add_to_filter(&gdp);
        self.ctx.metrics.filter_updated();
        self.current = Some(gdp);

        let selected = self.ctx.namespaces.apply_to_filter(&self.ctx.filter);
        tracing::info!(%name, selected, "Policy is authoritative");
        reconcile::reevaluate_all(&self.ctx);
    }

    fn update(&mut self, old: GlobalDeploymentPolicy, new: GlobalDeploymentPolicy) {
        let (updated, traffic_changed) = self.ctx.filter.update_global_filter(&old, &new);
        self.current = Some(new);
        if !updated {
            tracing::debug!("Policy unchanged");
            return;
        }
        self.ctx.metrics.filter_updated();

        // Namespace selections are rebuilt along with the filter.
        self.ctx.namespaces.apply_to_filter(&self.ctx.filter);
        reconcile::reevaluate_all(&self.ctx);
        if traffic_changed {
            reconcile::reannounce_accepted(&self.ctx);
        }
    }
}

impl kubert::index::IndexNamespacedResource<GlobalDeploymentPolicy> for PolicyIndex {
    fn apply(&mut self, gdp: GlobalDeploymentPolicy) {
        let namespace = gdp.namespace().unwrap_or_default();
        let name = gdp.name_any();
        if namespace != self.namespace {
            tracing::debug!(%namespace, %name, "Ignoring policy outside the policy namespace");
            return;
        }

        match self.current.take() {
            None => self.add(gdp),
            Some(old) if old.name_any() == name => self.update(old, gdp),
            Some(old) => {
                tracing::warn!(
                    %name,
                    authoritative = %old.name_any(),
                    "Ignoring duplicate policy"
                );
                self.current = Some(old);
            }
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if !self.ctx.gdp.is(&name, &namespace) {
            return;
        }
        let Some(gdp) = self.current.take() else {
            return;
        };

        self.ctx.filter.delete_from_global_filter(&gdp);
        self.ctx.gdp.clear();
        self.ctx.metrics.filter_updated();
        tracing::info!(%name, "Authoritative policy deleted");
        reconcile::reevaluate_all(&self.ctx);
    }
}
