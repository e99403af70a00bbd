use crate::{Error, ObjectKind};
use std::fmt;

/// Identifies an object within a member cluster across processing stages.
///
/// Rendered as `cluster/namespace/kind/name[/hostname]`. Only ingress hosts carry a hostname, since
/// a single ingress expands into one object per virtual host.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FederationKey {
    pub cluster: String,
    pub namespace: String,
    pub kind: ObjectKind,
    pub name: String,
    pub hostname: Option<String>,
}

/// Splits a `namespace/name` key. A key without a separator has an empty namespace.
pub fn split_namespace_name(key: &str) -> (&str, &str) {
    match key.split_once('/') {
        Some((namespace, name)) => (namespace, name),
        None => ("", key),
    }
}

// === impl FederationKey ===

impl FederationKey {
    /// The name under which the object is indexed in its cluster store.
    pub fn object_name(&self) -> String {
        match &self.hostname {
            Some(hostname) => format!("{}/{}", self.name, hostname),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for FederationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.cluster, self.namespace, self.kind, self.name
        )?;
        if let Some(hostname) = &self.hostname {
            write!(f, "/{}", hostname)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for FederationKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidKey(s.to_string());
        let parts = s.split('/').collect::<Vec<_>>();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }
        match parts.as_slice() {
            [cluster, namespace, kind, name] => Ok(Self {
                cluster: cluster.to_string(),
                namespace: namespace.to_string(),
                kind: kind.parse().map_err(|_| invalid())?,
                name: name.to_string(),
                hostname: None,
            }),
            [cluster, namespace, kind, name, hostname] => Ok(Self {
                cluster: cluster.to_string(),
                namespace: namespace.to_string(),
                kind: kind.parse().map_err(|_| invalid())?,
                name: name.to_string(),
                hostname: Some(hostname.to_string()),
            }),
            _ => Err(invalid()),
        }
    }
}
