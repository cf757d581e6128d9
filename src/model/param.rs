use serde::Serialize;

use crate::model::{CimName, CimType, CimValue};

/// One `PARAMVALUE` of an extrinsic method call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimParamValue {
    pub name: String,
    /// The declared `PARAMTYPE`, if any.
    pub param_type: Option<CimType>,
    pub embedded_object: Option<String>,
    /// `None` when the element was empty or carried no value child.
    pub value: Option<CimValue>,
}

/// A `PropertyList` parameter.
///
/// A null list means "all properties". `from_request` records that the list was supplied by an
/// explicit `PropertyList` element, which the response writer echoes back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CimPropertyList {
    names: Option<Vec<CimName>>,
    from_request: bool,
}

impl CimPropertyList {
    pub fn null() -> Self {
        CimPropertyList::default()
    }

    pub fn new(names: Vec<CimName>, from_request: bool) -> Self {
        CimPropertyList {
            names: Some(names),
            from_request,
        }
    }

    pub fn is_null(&self) -> bool {
        self.names.is_none()
    }

    pub fn names(&self) -> Option<&[CimName]> {
        self.names.as_deref()
    }

    pub fn from_request(&self) -> bool {
        self.from_request
    }
}

/// An optional `uint32` argument where "absent" and `0` mean different things.
///
/// For `OperationTimeout`, null lets the server choose its own default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Uint32Arg(Option<u32>);

impl Uint32Arg {
    pub const NULL: Uint32Arg = Uint32Arg(None);

    pub fn new(value: u32) -> Self {
        Uint32Arg(Some(value))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn value(&self) -> Option<u32> {
        self.0
    }
}

impl From<Option<u32>> for Uint32Arg {
    fn from(value: Option<u32>) -> Self {
        Uint32Arg(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_zero_differ() {
        assert_ne!(Uint32Arg::NULL, Uint32Arg::new(0));
        assert!(Uint32Arg::default().is_null());
        assert_eq!(Uint32Arg::new(0).value(), Some(0));
    }

    #[test]
    fn test_property_list() {
        assert!(CimPropertyList::null().is_null());
        let list = CimPropertyList::new(vec![CimName::new("Name").unwrap()], true);
        assert!(!list.is_null());
        assert!(list.from_request());
        assert_eq!(list.names().unwrap().len(), 1);
    }
}
