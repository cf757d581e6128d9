use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::utils::{eq_ignore_case, fold_case};

/// A CIM element name (class, property, method, qualifier...).
///
/// Comparison and hashing are case-insensitive; the original spelling is preserved.
#[derive(Debug, Clone, Eq, Serialize)]
#[serde(transparent)]
pub struct CimName(String);

impl CimName {
    /// Returns `None` unless `name` is a legal CIM identifier.
    pub fn new(name: &str) -> Option<Self> {
        if Self::is_legal(name) {
            Some(CimName(name.to_owned()))
        } else {
            None
        }
    }

    /// First character alphabetic or `_`, remaining characters alphanumeric or `_`.
    pub fn is_legal(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_alphanumeric() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl PartialEq for CimName {
    fn eq(&self, other: &Self) -> bool {
        eq_ignore_case(&self.0, &other.0)
    }
}

impl PartialEq<str> for CimName {
    fn eq(&self, other: &str) -> bool {
        eq_ignore_case(&self.0, other)
    }
}

impl PartialEq<&str> for CimName {
    fn eq(&self, other: &&str) -> bool {
        eq_ignore_case(&self.0, other)
    }
}

impl Hash for CimName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fold_case(&self.0).hash(state)
    }
}

impl fmt::Display for CimName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A CIM namespace such as `root/cimv2`.
#[derive(Debug, Clone, Eq, Serialize)]
#[serde(transparent)]
pub struct CimNamespaceName(String);

impl CimNamespaceName {
    /// Every `/` separated component must be a legal name; a leading `/` is dropped.
    pub fn new(namespace: &str) -> Option<Self> {
        let namespace = namespace.strip_prefix('/').unwrap_or(namespace);
        if namespace.is_empty() || !namespace.split('/').all(CimName::is_legal) {
            return None;
        }
        Some(CimNamespaceName(namespace.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl PartialEq for CimNamespaceName {
    fn eq(&self, other: &Self) -> bool {
        eq_ignore_case(&self.0, &other.0)
    }
}

impl Hash for CimNamespaceName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fold_case(&self.0).hash(state)
    }
}

impl fmt::Display for CimNamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_names() {
        assert!(CimName::is_legal("CIM_ComputerSystem"));
        assert!(CimName::is_legal("_private1"));
        assert!(CimName::is_legal("Größe"));
        assert!(!CimName::is_legal("1abc"));
        assert!(!CimName::is_legal("has space"));
        assert!(!CimName::is_legal(""));
    }

    #[test]
    fn test_names_compare_case_insensitively() {
        let a = CimName::new("CIM_Foo").unwrap();
        let b = CimName::new("cim_foo").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "CIM_Foo");
    }

    #[test]
    fn test_namespace_components() {
        let ns = CimNamespaceName::new("/root/cimv2").unwrap();
        assert_eq!(ns.as_str(), "root/cimv2");
        assert_eq!(ns.components().collect::<Vec<_>>(), vec!["root", "cimv2"]);
        assert_eq!(ns, CimNamespaceName::new("ROOT/CIMV2").unwrap());
        assert!(CimNamespaceName::new("root//cimv2").is_none());
        assert!(CimNamespaceName::new("").is_none());
    }
}
