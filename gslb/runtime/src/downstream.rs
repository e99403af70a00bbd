use crate::index::{self, SharedContext};

/// Receives the global services produced by the graph stage.
///
/// A global service is identified by its tenant and hostname. Implementations look up its current
/// membership and push it to the load-balancing layer. An error causes the key to be retried.
#[async_trait::async_trait]
pub trait Downstream: Send + Sync + 'static {
    async fn sync(&self, tenant: &str, name: &str) -> anyhow::Result<()>;
}

/// Logs each global service's membership instead of pushing it anywhere.
#[derive(Clone, Debug)]
pub struct LogDownstream {
    ctx: SharedContext,
}

// === impl LogDownstream ===

impl LogDownstream {
    pub fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Downstream for LogDownstream {
    async fn sync(&self, tenant: &str, name: &str) -> anyhow::Result<()> {
        let members = index::members_for_host(&self.ctx, name);
        if members.is_empty() {
            tracing::info!(%tenant, %name, "Global service has no members");
            return Ok(());
        }

        for member in &members {
            tracing::info!(
                %tenant,
                %name,
                cluster = %member.meta.cluster(),
                namespace = %member.meta.namespace(),
                kind = %member.meta.kind(),
                object = %member.meta.name(),
                ip = %member.meta.ip_addr(),
                weight = ?member.weight,
                "Global service member"
            );
        }
        tracing::info!(%tenant, %name, members = members.len(), "Synced global service");
        Ok(())
    }
}
