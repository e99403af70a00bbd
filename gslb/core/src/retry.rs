//! The retry layer.
//!
//! A failed downstream push re-injects its `tenant/name` key into the retry queue; the retry layer
//! hands the key, unchanged, back to the graph queue for another full pass. Keys carry no payload,
//! so the re-processing stage always works from current state. There is no attempt limit: a key is
//! retried until it succeeds or the underlying object disappears.

use crate::{split_namespace_name, QueueError, QueueName, WorkQueues};

/// Records a failed downstream push for another attempt.
pub fn publish_to_retry_layer(key: &str, queues: &WorkQueues) -> Result<(), QueueError> {
    queues.publish(QueueName::Retry, key).inspect_err(|error| {
        tracing::error!(%key, %error, "Failed to publish key to retry layer");
    })
}

/// Re-publishes a retried key onto the graph queue.
///
/// Publication failures are returned, not retried.
pub fn sync_from_retry_layer(key: &str, queues: &WorkQueues) -> Result<(), QueueError> {
    tracing::debug!(%key, "Retrieved the key in retry layer");
    let (tenant, name) = split_namespace_name(key);

    queues.publish(QueueName::Graph, key).inspect_err(|error| {
        tracing::error!(%tenant, %name, %error, "Failed to re-publish key to graph layer");
    })?;
    tracing::debug!(%tenant, %name, "Re-published key to graph layer");
    Ok(())
}
