//! Remembers the last hostname/IP advertised by each accepted object.
//!
//! Entries outlive the object they describe: when a delete event arrives the object is already gone
//! from the cluster store, and this memory is the only way to resolve which global service it must
//! be withdrawn from.

use crate::ObjectKind;
use ahash::AHashMap as HashMap;
use parking_lot::Mutex;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostEntry {
    pub ip: String,
    pub hostname: String,
}

/// Maps federation keys to the host last advertised under that key.
#[derive(Debug, Default)]
pub struct HostMap {
    entries: Mutex<HashMap<String, HostEntry>>,
}

/// Holds an independent [`HostMap`] for each object kind.
#[derive(Debug, Default)]
pub struct HostMaps {
    ingress: HostMap,
    route: HostMap,
    service: HostMap,
}

// === impl HostMap ===

impl HostMap {
    pub fn remember(&self, key: &str, ip: &str, hostname: &str) {
        self.entries.lock().insert(
            key.to_string(),
            HostEntry {
                ip: ip.to_string(),
                hostname: hostname.to_string(),
            },
        );
    }

    /// Returns the remembered hostname, or an empty string if the key was never remembered.
    pub fn recall(&self, key: &str) -> String {
        self.entries
            .lock()
            .get(key)
            .map(|entry| entry.hostname.clone())
            .unwrap_or_default()
    }

    pub fn entry(&self, key: &str) -> Option<HostEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub fn forget(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// === impl HostMaps ===

impl HostMaps {
    pub fn get(&self, kind: ObjectKind) -> &HostMap {
        match kind {
            ObjectKind::Ingress => &self.ingress,
            ObjectKind::Route => &self.route,
            ObjectKind::Service => &self.service,
        }
    }
}
