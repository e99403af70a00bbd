use parking_lot::RwLock;

/// Identifies the policy object that is authoritative for the federation filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyRef {
    pub name: String,
    pub namespace: String,
}

/// Holds a reference to the authoritative policy, so that additional or malformed policy objects
/// can be recognized and ignored.
#[derive(Debug, Default)]
pub struct GdpObj(RwLock<Option<PolicyRef>>);

impl GdpObj {
    pub fn set(&self, name: impl Into<String>, namespace: impl Into<String>) {
        *self.0.write() = Some(PolicyRef {
            name: name.into(),
            namespace: namespace.into(),
        });
    }

    pub fn get(&self) -> Option<PolicyRef> {
        self.0.read().clone()
    }

    pub fn clear(&self) {
        *self.0.write() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_none()
    }

    /// Indicates whether the named object is the authoritative policy.
    pub fn is(&self, name: &str, namespace: &str) -> bool {
        matches!(&*self.0.read(), Some(r) if r.name == name && r.namespace == namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let gdp = GdpObj::default();
        assert!(gdp.is_empty());
        assert_eq!(gdp.get(), None);

        gdp.set("global-gdp", "gslb-system");
        assert!(!gdp.is_empty());
        assert!(gdp.is("global-gdp", "gslb-system"));
        assert!(!gdp.is("other-gdp", "gslb-system"));
        assert_eq!(
            gdp.get(),
            Some(PolicyRef {
                name: "global-gdp".to_string(),
                namespace: "gslb-system".to_string(),
            })
        );

        gdp.clear();
        assert!(gdp.is_empty());
    }
}
