use serde::Serialize;
use std::fmt;

use crate::model::{CimClass, CimInstance, CimObjectPath};

/// The CIM intrinsic data types, as spelled in the `TYPE` / `PARAMTYPE` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CimType {
    Boolean,
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Uint32,
    Sint32,
    Uint64,
    Sint64,
    Real32,
    Real64,
    Char16,
    String,
    DateTime,
    Reference,
}

impl CimType {
    /// Parse a DSP0201 type name. Type names are case-sensitive on the wire.
    pub fn from_xml_name(name: &str) -> Option<Self> {
        let ty = match name {
            "boolean" => CimType::Boolean,
            "uint8" => CimType::Uint8,
            "sint8" => CimType::Sint8,
            "uint16" => CimType::Uint16,
            "sint16" => CimType::Sint16,
            "uint32" => CimType::Uint32,
            "sint32" => CimType::Sint32,
            "uint64" => CimType::Uint64,
            "sint64" => CimType::Sint64,
            "real32" => CimType::Real32,
            "real64" => CimType::Real64,
            "char16" => CimType::Char16,
            "string" => CimType::String,
            "datetime" => CimType::DateTime,
            "reference" => CimType::Reference,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_xml_name(self) -> &'static str {
        match self {
            CimType::Boolean => "boolean",
            CimType::Uint8 => "uint8",
            CimType::Sint8 => "sint8",
            CimType::Uint16 => "uint16",
            CimType::Sint16 => "sint16",
            CimType::Uint32 => "uint32",
            CimType::Sint32 => "sint32",
            CimType::Uint64 => "uint64",
            CimType::Sint64 => "sint64",
            CimType::Real32 => "real32",
            CimType::Real64 => "real64",
            CimType::Char16 => "char16",
            CimType::String => "string",
            CimType::DateTime => "datetime",
            CimType::Reference => "reference",
        }
    }

    /// Check that `text` is a legal value of this type, returning a description of the problem.
    pub fn validate(self, text: &str) -> Result<(), String> {
        let ok = match self {
            CimType::Boolean => parse_boolean(text).is_some(),
            CimType::Uint8 => parse_unsigned(text).is_some_and(|v| v <= u64::from(u8::MAX)),
            CimType::Uint16 => parse_unsigned(text).is_some_and(|v| v <= u64::from(u16::MAX)),
            CimType::Uint32 => parse_unsigned(text).is_some_and(|v| v <= u64::from(u32::MAX)),
            CimType::Uint64 => parse_unsigned(text).is_some(),
            CimType::Sint8 => parse_signed(text)
                .is_some_and(|v| (i64::from(i8::MIN)..=i64::from(i8::MAX)).contains(&v)),
            CimType::Sint16 => parse_signed(text)
                .is_some_and(|v| (i64::from(i16::MIN)..=i64::from(i16::MAX)).contains(&v)),
            CimType::Sint32 => parse_signed(text)
                .is_some_and(|v| (i64::from(i32::MIN)..=i64::from(i32::MAX)).contains(&v)),
            CimType::Sint64 => parse_signed(text).is_some(),
            CimType::Real32 | CimType::Real64 => text.trim().parse::<f64>().is_ok(),
            CimType::Char16 => text.chars().count() == 1,
            CimType::DateTime => is_datetime(text),
            CimType::String | CimType::Reference => true,
        };

        if ok {
            Ok(())
        } else {
            Err(format!(
                "Malformed {} value \"{}\"",
                self.as_xml_name(),
                text
            ))
        }
    }
}

impl fmt::Display for CimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_xml_name())
    }
}

/// `TRUE` / `FALSE`, case-insensitive, surrounding whitespace ignored.
pub fn parse_boolean(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Decimal or `0x` prefixed hexadecimal unsigned integer, optional leading `+`.
pub fn parse_unsigned(text: &str) -> Option<u64> {
    let text = text.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        return u64::from_str_radix(hex, 16).ok();
    }
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

pub fn parse_signed(text: &str) -> Option<i64> {
    let text = text.trim();
    match text.strip_prefix('-') {
        Some(rest) => {
            let magnitude = parse_unsigned(rest)?;
            if magnitude == 1 << 63 {
                Some(i64::MIN)
            } else {
                i64::try_from(magnitude).ok().map(|v| -v)
            }
        }
        None => parse_unsigned(text).and_then(|v| i64::try_from(v).ok()),
    }
}

/// `yyyymmddhhmmss.mmmmmmsutc` timestamps or `ddddddddhhmmss.mmmmmm:000` intervals.
fn is_datetime(text: &str) -> bool {
    let b = text.as_bytes();
    if b.len() != 25 || b[14] != b'.' {
        return false;
    }
    let digits_or_wildcard = |range: std::ops::Range<usize>| {
        b[range].iter().all(|c| c.is_ascii_digit() || *c == b'*')
    };
    if !digits_or_wildcard(0..14) || !digits_or_wildcard(15..21) {
        return false;
    }
    match b[21] {
        b'+' | b'-' => b[22..25].iter().all(u8::is_ascii_digit),
        b':' => &b[22..25] == b"000",
        _ => false,
    }
}

/// A CIM value as carried by `VALUE`, `VALUE.ARRAY`, `VALUE.REFERENCE` and friends.
///
/// Scalar values keep their wire text once validated against their declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CimValue {
    Scalar { ty: CimType, value: String },
    /// `None` entries come from `VALUE.NULL` array members.
    Array { ty: CimType, values: Vec<Option<String>> },
    Reference { path: CimObjectPath },
    ReferenceArray { paths: Vec<Option<CimObjectPath>> },
    Instance { instance: Box<CimInstance> },
    Class { class: Box<CimClass> },
}

impl CimValue {
    pub fn string(value: impl Into<String>) -> Self {
        CimValue::Scalar {
            ty: CimType::String,
            value: value.into(),
        }
    }

    pub fn cim_type(&self) -> Option<CimType> {
        match self {
            CimValue::Scalar { ty, .. } | CimValue::Array { ty, .. } => Some(*ty),
            CimValue::Reference { .. } | CimValue::ReferenceArray { .. } => {
                Some(CimType::Reference)
            }
            CimValue::Instance { .. } | CimValue::Class { .. } => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, CimValue::Array { .. } | CimValue::ReferenceArray { .. })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CimValue::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }
}
