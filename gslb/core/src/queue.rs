//! Named work queues connecting the processing stages.
//!
//! A queue carries keys only, never object snapshots. Each queue is sharded across a fixed number
//! of workers; a key always hashes to the same shard, so a single worker observes all work for a
//! given key in publication order. A key re-published after a failure is appended, not
//! prioritized.

use crate::checksum;
use parking_lot::Mutex;
use std::fmt;
use tokio::sync::mpsc;

/// The queues shared between stages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueueName {
    /// Federation keys of objects whose state changed in a member cluster.
    ObjectIngestion,
    /// `tenant/name` keys of global services to be pushed downstream.
    Graph,
    /// `tenant/name` keys whose downstream push failed.
    Retry,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueueConfig {
    pub ingestion_workers: usize,
    pub graph_workers: usize,
    pub retry_workers: usize,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("{0} queue is closed")]
    Closed(QueueName),

    #[error("{0} queue receivers were already taken")]
    Taken(QueueName),
}

pub type Receiver = mpsc::UnboundedReceiver<String>;

#[derive(Debug)]
pub struct WorkQueue {
    name: QueueName,
    shards: Vec<mpsc::UnboundedSender<String>>,
    receivers: Mutex<Option<Vec<Receiver>>>,
}

/// The registry of all queues, built once at startup and shared by every stage.
#[derive(Debug)]
pub struct WorkQueues {
    ingestion: WorkQueue,
    graph: WorkQueue,
    retry: WorkQueue,
}

// === impl QueueName ===

impl QueueName {
    pub const ALL: [Self; 3] = [Self::ObjectIngestion, Self::Graph, Self::Retry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectIngestion => "object-ingestion-layer",
            Self::Graph => "graph-layer",
            Self::Retry => "retry-layer",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

// === impl QueueConfig ===

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ingestion_workers: 8,
            graph_workers: 8,
            retry_workers: 4,
        }
    }
}

// === impl WorkQueue ===

impl WorkQueue {
    pub fn new(name: QueueName, workers: usize) -> Self {
        let (shards, receivers): (Vec<_>, Vec<_>) = (0..workers.max(1))
            .map(|_| mpsc::unbounded_channel())
            .unzip();
        Self {
            name,
            shards,
            receivers: Mutex::new(Some(receivers)),
        }
    }

    pub fn name(&self) -> QueueName {
        self.name
    }

    pub fn num_workers(&self) -> usize {
        self.shards.len()
    }

    /// The shard, and therefore the worker, that processes `key`.
    pub fn shard(&self, key: &str) -> usize {
        checksum::hash(key) as usize % self.shards.len()
    }

    pub fn publish(&self, key: impl Into<String>) -> Result<(), QueueError> {
        let key = key.into();
        let shard = self.shard(&key);
        tracing::trace!(queue = %self.name, %key, shard, "Publishing");
        self.shards[shard]
            .send(key)
            .map_err(|_| QueueError::Closed(self.name))
    }

    /// Hands the shard receivers to the worker pool. May only be called once.
    pub fn take_receivers(&self) -> Result<Vec<Receiver>, QueueError> {
        self.receivers
            .lock()
            .take()
            .ok_or(QueueError::Taken(self.name))
    }
}

// === impl WorkQueues ===

impl WorkQueues {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            ingestion: WorkQueue::new(QueueName::ObjectIngestion, config.ingestion_workers),
            graph: WorkQueue::new(QueueName::Graph, config.graph_workers),
            retry: WorkQueue::new(QueueName::Retry, config.retry_workers),
        }
    }

    pub fn get(&self, name: QueueName) -> &WorkQueue {
        match name {
            QueueName::ObjectIngestion => &self.ingestion,
            QueueName::Graph => &self.graph,
            QueueName::Retry => &self.retry,
        }
    }

    pub fn publish(&self, name: QueueName, key: impl Into<String>) -> Result<(), QueueError> {
        self.get(name).publish(key)
    }
}

impl Default for WorkQueues {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}
