//! Worker pools draining the processing queues.
//!
//! Each queue shard is drained by exactly one task, so all work for a key is handled sequentially
//! and in publication order. Workers exit when the runtime begins shutting down; keys still queued
//! at that point are abandoned.

use crate::{
    core::{
        queue::Receiver,
        retry::{publish_to_retry_layer, sync_from_retry_layer},
        split_namespace_name, QueueName,
    },
    index::{self, SharedContext},
    Downstream,
};
use anyhow::Result;
use prometheus_client::{metrics::counter::Counter, registry::Registry};
use std::sync::Arc;
use tracing::{info_span, Instrument};

#[derive(Clone, Debug, Default)]
pub(crate) struct WorkerMetrics {
    retries: Counter,
}

// === impl WorkerMetrics ===

impl WorkerMetrics {
    pub(crate) fn register(prom: &mut Registry) -> Self {
        let retries = Counter::default();
        prom.register(
            "retries",
            "Count of global services queued for another downstream sync",
            retries.clone(),
        );
        Self { retries }
    }
}

/// Spawns a task for every shard of every queue.
pub(crate) fn spawn<D: Downstream>(
    ctx: SharedContext,
    downstream: Arc<D>,
    metrics: WorkerMetrics,
    drain: drain::Watch,
) -> Result<()> {
    let ingestion = ctx.queues.get(QueueName::ObjectIngestion).take_receivers()?;
    for (worker, rx) in ingestion.into_iter().enumerate() {
        tokio::spawn(
            ingestion_worker(ctx.clone(), rx, drain.clone())
                .instrument(info_span!("ingestion", worker)),
        );
    }

    let graph = ctx.queues.get(QueueName::Graph).take_receivers()?;
    for (worker, rx) in graph.into_iter().enumerate() {
        tokio::spawn(
            graph_worker(
                ctx.clone(),
                downstream.clone(),
                metrics.clone(),
                rx,
                drain.clone(),
            )
            .instrument(info_span!("graph", worker)),
        );
    }

    let retry = ctx.queues.get(QueueName::Retry).take_receivers()?;
    for (worker, rx) in retry.into_iter().enumerate() {
        tokio::spawn(
            retry_worker(ctx.clone(), rx, drain.clone()).instrument(info_span!("retry", worker)),
        );
    }

    tracing::info!(
        ingestion = ctx.queues.get(QueueName::ObjectIngestion).num_workers(),
        graph = ctx.queues.get(QueueName::Graph).num_workers(),
        retry = ctx.queues.get(QueueName::Retry).num_workers(),
        "Started workers"
    );
    Ok(())
}

async fn ingestion_worker(ctx: SharedContext, mut rx: Receiver, drain: drain::Watch) {
    let shutdown = drain.signaled();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            key = rx.recv() => {
                let Some(key) = key else { break };
                if let Err(error) = index::sync_from_ingestion_layer(&key, &ctx) {
                    tracing::error!(%key, %error, "Failed to process key");
                }
            }
        }
    }
    tracing::debug!("Stopped");
}

async fn graph_worker<D: Downstream>(
    ctx: SharedContext,
    downstream: Arc<D>,
    metrics: WorkerMetrics,
    mut rx: Receiver,
    drain: drain::Watch,
) {
    let shutdown = drain.signaled();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            key = rx.recv() => {
                let Some(key) = key else { break };
                let (tenant, name) = split_namespace_name(&key);
                if let Err(error) = downstream.sync(tenant, name).await {
                    tracing::warn!(%key, %error, "Failed to sync global service");
                    metrics.retries.inc();
                    // Failures are logged by the retry layer.
                    publish_to_retry_layer(&key, &ctx.queues).ok();
                }
            }
        }
    }
    tracing::debug!("Stopped");
}

async fn retry_worker(ctx: SharedContext, mut rx: Receiver, drain: drain::Watch) {
    let shutdown = drain.signaled();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            key = rx.recv() => {
                let Some(key) = key else { break };
                // Failures are logged by the retry layer.
                sync_from_retry_layer(&key, &ctx.queues).ok();
            }
        }
    }
    tracing::debug!("Stopped");
}
