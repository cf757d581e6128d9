use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::value::{parse_boolean, parse_signed, parse_unsigned};
use crate::model::{CimName, CimNamespaceName};
use crate::utils::eq_ignore_case;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid object path `{path}`: {reason}")]
pub struct ObjectPathParseError {
    pub path: String,
    pub reason: &'static str,
}

/// The `VALUETYPE` of a key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeyBindingType {
    Boolean,
    String,
    Numeric,
    Reference,
}

impl KeyBindingType {
    pub fn from_value_type(value_type: &str) -> Option<Self> {
        match value_type {
            "boolean" => Some(KeyBindingType::Boolean),
            "string" => Some(KeyBindingType::String),
            "numeric" => Some(KeyBindingType::Numeric),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyBinding {
    pub name: CimName,
    pub value: String,
    pub ty: KeyBindingType,
}

impl KeyBinding {
    pub fn new(name: CimName, value: impl Into<String>, ty: KeyBindingType) -> Self {
        KeyBinding {
            name,
            value: value.into(),
            ty,
        }
    }

    /// Value equality under the rules of the binding type.
    ///
    /// Numeric keys compare by value (`07` equals `7`), boolean keys ignore case and reference
    /// keys compare the referenced paths structurally.
    pub fn value_matches(&self, other: &KeyBinding) -> bool {
        if self.ty != other.ty {
            return false;
        }

        match self.ty {
            KeyBindingType::String => self.value == other.value,
            KeyBindingType::Boolean => eq_ignore_case(self.value.trim(), other.value.trim()),
            KeyBindingType::Numeric => numeric_eq(&self.value, &other.value),
            KeyBindingType::Reference => {
                match (
                    self.value.parse::<CimObjectPath>(),
                    other.value.parse::<CimObjectPath>(),
                ) {
                    (Ok(a), Ok(b)) => a.identical(&b),
                    _ => self.value == other.value,
                }
            }
        }
    }
}

impl PartialEq for KeyBinding {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value_matches(other)
    }
}

fn numeric_eq(a: &str, b: &str) -> bool {
    if let (Some(a), Some(b)) = (parse_unsigned(a), parse_unsigned(b)) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (parse_signed(a), parse_signed(b)) {
        return a == b;
    }
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// A reference to a class or an instance: optional host and namespace, class name and keys.
#[derive(Debug, Clone, Serialize)]
pub struct CimObjectPath {
    pub host: Option<String>,
    pub namespace: Option<CimNamespaceName>,
    pub class_name: CimName,
    pub key_bindings: Vec<KeyBinding>,
}

impl CimObjectPath {
    pub fn class_path(namespace: Option<CimNamespaceName>, class_name: CimName) -> Self {
        CimObjectPath {
            host: None,
            namespace,
            class_name,
            key_bindings: Vec::new(),
        }
    }

    pub fn is_instance_path(&self) -> bool {
        !self.key_bindings.is_empty()
    }

    /// Structural identity: same namespace, class name and key-binding set.
    ///
    /// Key bindings are compared as a set, their order is irrelevant. The host is ignored.
    pub fn identical(&self, other: &CimObjectPath) -> bool {
        if self.namespace != other.namespace || self.class_name != other.class_name {
            return false;
        }
        if self.key_bindings.len() != other.key_bindings.len() {
            return false;
        }

        // Each binding must consume a distinct counterpart, so a repeated key cannot stand in
        // for a missing one.
        let mut matched = vec![false; other.key_bindings.len()];
        self.key_bindings.iter().all(|kb| {
            let found = other
                .key_bindings
                .iter()
                .enumerate()
                .position(|(i, other_kb)| !matched[i] && kb == other_kb);
            match found {
                Some(i) => {
                    matched[i] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl PartialEq for CimObjectPath {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

fn invalid(path: &str, reason: &'static str) -> ObjectPathParseError {
    ObjectPathParseError {
        path: path.to_owned(),
        reason,
    }
}

impl FromStr for CimObjectPath {
    type Err = ObjectPathParseError;

    /// Parses `[//host/][namespace:]ClassName[.key=value[,key=value]*]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();

        let mut host = None;
        if let Some(after) = rest.strip_prefix("//") {
            let slash = after.find('/').ok_or_else(|| invalid(s, "host without namespace"))?;
            host = Some(after[..slash].to_owned());
            rest = &after[slash + 1..];
        }

        // Namespaces and class names never contain `.` or `"`, so the namespace separator is
        // the first `:` before either of them.
        let limit = rest.find(['.', '"']).unwrap_or(rest.len());
        let namespace = match rest[..limit].find(':') {
            Some(colon) => {
                let ns = CimNamespaceName::new(&rest[..colon])
                    .ok_or_else(|| invalid(s, "illegal namespace name"))?;
                rest = &rest[colon + 1..];
                Some(ns)
            }
            None => None,
        };

        let (class_part, keys_part) = match rest.find('.') {
            Some(dot) => (&rest[..dot], Some(&rest[dot + 1..])),
            None => (rest, None),
        };
        let class_name = CimName::new(class_part).ok_or_else(|| invalid(s, "illegal class name"))?;

        let key_bindings = match keys_part {
            Some(keys) => parse_key_bindings(s, keys)?,
            None => Vec::new(),
        };

        Ok(CimObjectPath {
            host,
            namespace,
            class_name,
            key_bindings,
        })
    }
}

fn parse_key_bindings(path: &str, mut input: &str) -> Result<Vec<KeyBinding>, ObjectPathParseError> {
    let mut bindings = Vec::new();

    loop {
        let eq = input.find('=').ok_or_else(|| invalid(path, "key binding without `=`"))?;
        let name = CimName::new(&input[..eq]).ok_or_else(|| invalid(path, "illegal key name"))?;
        input = &input[eq + 1..];

        let (value, ty, consumed) = if let Some(quoted) = input.strip_prefix('"') {
            let (value, len) = read_quoted(quoted).ok_or_else(|| invalid(path, "unterminated string"))?;
            let ty = if looks_like_reference(&value) {
                KeyBindingType::Reference
            } else {
                KeyBindingType::String
            };
            (value, ty, len + 1)
        } else {
            let end = input.find(',').unwrap_or(input.len());
            let raw = &input[..end];
            let ty = if parse_boolean(raw).is_some() {
                KeyBindingType::Boolean
            } else if parse_signed(raw).is_some()
                || parse_unsigned(raw).is_some()
                || raw.parse::<f64>().is_ok()
            {
                KeyBindingType::Numeric
            } else {
                return Err(invalid(path, "unquoted key value is neither boolean nor numeric"));
            };
            (raw.to_owned(), ty, end)
        };

        if bindings.iter().any(|kb: &KeyBinding| kb.name == name) {
            return Err(invalid(path, "duplicate key name"));
        }
        bindings.push(KeyBinding::new(name, value, ty));
        input = &input[consumed..];

        match input.strip_prefix(',') {
            Some(next) => input = next,
            None if input.is_empty() => break,
            None => return Err(invalid(path, "expected `,` between key bindings")),
        }
    }

    Ok(bindings)
}

/// Reads up to the closing quote, resolving `\"` and `\\`. Returns the value and the number of
/// bytes consumed including the closing quote.
fn read_quoted(input: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next()?;
                value.push(escaped);
            }
            '"' => return Some((value, i + 1)),
            _ => value.push(c),
        }
    }
    None
}

fn looks_like_reference(value: &str) -> bool {
    value.contains('=')
        && value
            .parse::<CimObjectPath>()
            .is_ok_and(|p| p.is_instance_path())
}

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for c in value.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

impl fmt::Display for CimObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.host {
            write!(f, "//{host}/")?;
        }
        if let Some(ns) = &self.namespace {
            write!(f, "{ns}:")?;
        }
        write!(f, "{}", self.class_name)?;

        for (i, kb) in self.key_bindings.iter().enumerate() {
            f.write_str(if i == 0 { "." } else { "," })?;
            write!(f, "{}=", kb.name)?;
            match kb.ty {
                KeyBindingType::String | KeyBindingType::Reference => {
                    f.write_str("\"")?;
                    write_escaped(f, &kb.value)?;
                    f.write_str("\"")?;
                }
                KeyBindingType::Boolean | KeyBindingType::Numeric => f.write_str(&kb.value)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_class_path() {
        let path: CimObjectPath = "root/cimv2:CIM_Foo".parse().unwrap();
        assert_eq!(path.namespace.unwrap().as_str(), "root/cimv2");
        assert_eq!(path.class_name.as_str(), "CIM_Foo");
        assert!(path.key_bindings.is_empty());
    }

    #[test]
    fn test_parse_instance_path() {
        let path: CimObjectPath =
            r#"//myhost/root/cimv2:CIM_Foo.Name="a\"b",Id=42,Enabled=TRUE"#.parse().unwrap();
        assert_eq!(path.host.as_deref(), Some("myhost"));
        assert_eq!(path.key_bindings.len(), 3);
        assert_eq!(path.key_bindings[0].value, "a\"b");
        assert_eq!(path.key_bindings[0].ty, KeyBindingType::String);
        assert_eq!(path.key_bindings[1].ty, KeyBindingType::Numeric);
        assert_eq!(path.key_bindings[2].ty, KeyBindingType::Boolean);
    }

    #[test]
    fn test_display_roundtrip() {
        let text = r#"root/cimv2:CIM_Foo.Name="x\\y",Id=7"#;
        let path: CimObjectPath = text.parse().unwrap();
        assert_eq!(path.to_string(), text);
    }

    #[test]
    fn test_reference_key() {
        let path: CimObjectPath =
            r#"root/cimv2:CIM_Assoc.Ref="root/cimv2:CIM_Foo.Id=1""#.parse().unwrap();
        assert_eq!(path.key_bindings[0].ty, KeyBindingType::Reference);
    }

    #[test]
    fn test_identity_is_order_independent() {
        let a: CimObjectPath = r#"root/cimv2:CIM_Foo.A="1",B=2"#.parse().unwrap();
        let b: CimObjectPath = r#"ROOT/CIMV2:cim_foo.b=02,a="1""#.parse().unwrap();
        assert!(a.identical(&b));

        let c: CimObjectPath = r#"root/cimv2:CIM_Foo.A="2",B=2"#.parse().unwrap();
        assert!(!a.identical(&c));
    }

    #[test]
    fn test_repeated_key_does_not_cover_a_missing_one() {
        let mut repeated: CimObjectPath = r#"root/cimv2:CIM_Foo.A="x""#.parse().unwrap();
        let again = repeated.key_bindings[0].clone();
        repeated.key_bindings.push(again);

        let full: CimObjectPath = r#"root/cimv2:CIM_Foo.A="x",B=2"#.parse().unwrap();
        assert_eq!(repeated.key_bindings.len(), full.key_bindings.len());
        assert!(!repeated.identical(&full));
        assert!(!full.identical(&repeated));
    }

    #[test]
    fn test_duplicate_key_name_is_rejected() {
        let err = r#"root/cimv2:CIM_Foo.A="x",a="y""#
            .parse::<CimObjectPath>()
            .unwrap_err();
        assert_eq!(err.reason, "duplicate key name");
    }

    #[test]
    fn test_invalid_paths() {
        assert!("root/cimv2:".parse::<CimObjectPath>().is_err());
        assert!(r#"root/cimv2:CIM_Foo.A="open"#.parse::<CimObjectPath>().is_err());
        assert!("root/cimv2:CIM_Foo.A=bare".parse::<CimObjectPath>().is_err());
    }
}
