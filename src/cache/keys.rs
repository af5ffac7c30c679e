//! Namespaced cache keys.

use std::fmt;

/// A flag code qualified by the cache namespace, rendered as `namespace:code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedKey(String);

impl NamespacedKey {
    pub fn new(namespace: &str, code: &str) -> Self {
        Self(format!("{namespace}:{code}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when this key lives under `namespace`.
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.0
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

impl fmt::Display for NamespacedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
