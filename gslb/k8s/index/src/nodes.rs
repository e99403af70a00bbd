//! The graph stage: turns federation keys into global-service keys.
//!
//! A global service is named `tenant/hostname` and aggregates every accepted object, across all
//! member clusters, that advertises that hostname. This stage only decides which global services
//! need recomputing; [`members_for_host`] provides their current membership.

use crate::SharedContext;
use anyhow::Result;
use gslb_federator_core::{FederationKey, ObjectMeta, QueueName};

/// A member of a global service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub meta: ObjectMeta,

    /// The cluster's traffic weight, if the policy assigns one.
    pub weight: Option<u32>,
}

/// Processes a federation key published by a member index.
///
/// If the object exists and is accepted it is remembered and its global service is published. If
/// it was accepted under a different hostname, the old global service is published too.
/// Otherwise, a remembered object is forgotten and its former global service is published so
/// that the object is withdrawn. Malformed keys are dropped.
pub fn sync_from_ingestion_layer(key: &str, ctx: &SharedContext) -> Result<()> {
    let fkey = match key.parse::<FederationKey>() {
        Ok(fkey) => fkey,
        Err(error) => {
            tracing::warn!(%key, %error, "Dropping malformed key");
            return Ok(());
        }
    };

    let host_map = ctx.host_maps.get(fkey.kind);
    let previous = host_map.recall(key);
    let current = ctx
        .stores
        .get(fkey.kind)
        .get(&fkey.cluster, &fkey.namespace, &fkey.object_name())
        .filter(|meta| meta.apply_filter(&ctx.filter));

    match current {
        Some(meta) => {
            meta.remember(&ctx.host_maps, key);
            if !previous.is_empty() && previous != meta.hostname() {
                tracing::info!(%key, from = %previous, to = %meta.hostname(), "Object changed hostname");
                publish_gs(ctx, &previous)?;
            }
            publish_gs(ctx, meta.hostname())
        }
        None if previous.is_empty() => {
            tracing::debug!(%key, "Object is not federated");
            Ok(())
        }
        None => {
            tracing::info!(%key, hostname = %previous, "Withdrawing object");
            host_map.forget(key);
            publish_gs(ctx, &previous)
        }
    }
}

fn publish_gs(ctx: &SharedContext, hostname: &str) -> Result<()> {
    let key = ctx.gs_key(hostname);
    tracing::debug!(%key, "Publishing global service");
    ctx.queues.publish(QueueName::Graph, key)?;
    Ok(())
}

/// Lists the accepted objects that advertise `hostname`, with their clusters' traffic weights.
///
/// Members are ordered by cluster, namespace, and name.
pub fn members_for_host(ctx: &SharedContext, hostname: &str) -> Vec<Member> {
    let mut members = ctx
        .stores
        .iter()
        .flat_map(|(_, store)| store.objects_for_hostname(hostname))
        .filter(|meta| meta.apply_filter(&ctx.filter))
        .map(|meta| Member {
            weight: ctx
                .filter
                .get_traffic_weight(meta.namespace(), meta.cluster())
                .ok(),
            meta,
        })
        .collect::<Vec<_>>();
    members.sort_by(|a, b| {
        (a.meta.cluster(), a.meta.namespace(), a.meta.name())
            .cmp(&(b.meta.cluster(), b.meta.namespace(), b.meta.name()))
    });
    members
}
