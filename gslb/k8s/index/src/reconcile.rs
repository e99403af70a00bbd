//! Re-evaluates stored objects after the global filter changes.

use crate::SharedContext;
use gslb_federator_core::{ObjectMeta, QueueName};
use std::collections::BTreeSet;

/// Publishes the key of every stored object whose accept state no longer matches what was
/// announced.
///
/// Returns the number of keys published.
pub fn reevaluate_all(ctx: &SharedContext) -> usize {
    let objects = ctx
        .stores
        .iter()
        .flat_map(|(_, store)| store.all_objects())
        .collect::<Vec<_>>();
    let published = reevaluate(ctx, objects);
    tracing::info!(published, "Re-evaluated all objects");
    published
}

/// Re-evaluates the objects of a single namespace, typically after it was selected.
pub fn reevaluate_namespace(ctx: &SharedContext, cluster: &str, namespace: &str) -> usize {
    let objects = ctx
        .stores
        .iter()
        .flat_map(|(_, store)| store.namespace_objects(cluster, namespace))
        .collect::<Vec<_>>();
    let published = reevaluate(ctx, objects);
    tracing::debug!(%cluster, %namespace, published, "Re-evaluated namespace");
    published
}

fn reevaluate(ctx: &SharedContext, objects: Vec<ObjectMeta>) -> usize {
    let mut published = 0;
    for meta in objects {
        let key = meta.federation_key().to_string();
        let accepted = meta.apply_filter(&ctx.filter);
        let remembered = !meta.recall(&ctx.host_maps, &key).is_empty();
        if accepted == remembered {
            continue;
        }
        match ctx.queues.publish(QueueName::ObjectIngestion, &key) {
            Ok(()) => published += 1,
            Err(error) => tracing::error!(%key, %error, "Failed to publish key"),
        }
    }
    published
}

/// Re-announces every global service that has an accepted member, so that traffic weights are
/// pushed downstream.
///
/// Returns the number of global services published.
pub fn reannounce_accepted(ctx: &SharedContext) -> usize {
    let hostnames = ctx
        .stores
        .iter()
        .flat_map(|(_, store)| store.all_objects())
        .filter(|meta| meta.apply_filter(&ctx.filter))
        .map(|meta| meta.hostname().to_string())
        .collect::<BTreeSet<_>>();

    let mut published = 0;
    for hostname in hostnames {
        let key = ctx.gs_key(&hostname);
        match ctx.queues.publish(QueueName::Graph, &key) {
            Ok(()) => published += 1,
            Err(error) => tracing::error!(%key, %error, "Failed to publish key"),
        }
    }
    tracing::info!(published, "Re-announced global services");
    published
}
