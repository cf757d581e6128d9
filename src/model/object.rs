use bitflags::bitflags;
use serde::Serialize;

use crate::model::{CimName, CimObjectPath, CimType, CimValue};

bitflags! {
    /// Qualifier flavors (`OVERRIDABLE`, `TOSUBCLASS`, `TOINSTANCE`, `TRANSLATABLE`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct CimFlavor: u8 {
        const OVERRIDABLE = 0x01;
        const TOSUBCLASS = 0x02;
        const TOINSTANCE = 0x04;
        const TRANSLATABLE = 0x08;
    }
}

impl CimFlavor {
    /// The DSP0201 defaults: overridable, propagated to subclasses, not to instances.
    pub fn dsp0201_default() -> Self {
        CimFlavor::OVERRIDABLE | CimFlavor::TOSUBCLASS
    }
}

bitflags! {
    /// Scopes of a qualifier declaration (`SCOPE` element attributes).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct CimScope: u16 {
        const CLASS = 0x0001;
        const ASSOCIATION = 0x0002;
        const INDICATION = 0x0004;
        const PROPERTY = 0x0008;
        const REFERENCE = 0x0010;
        const METHOD = 0x0020;
        const PARAMETER = 0x0040;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimQualifier {
    pub name: CimName,
    pub ty: CimType,
    pub value: Option<CimValue>,
    pub flavor: CimFlavor,
    pub propagated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimQualifierDecl {
    pub name: CimName,
    pub ty: CimType,
    pub is_array: bool,
    pub array_size: Option<u32>,
    pub scope: CimScope,
    pub flavor: CimFlavor,
    pub value: Option<CimValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimProperty {
    pub name: CimName,
    pub ty: CimType,
    pub is_array: bool,
    pub array_size: Option<u32>,
    /// Only set for `PROPERTY.REFERENCE`.
    pub reference_class: Option<CimName>,
    pub class_origin: Option<CimName>,
    pub propagated: bool,
    pub embedded_object: Option<String>,
    pub qualifiers: Vec<CimQualifier>,
    pub value: Option<CimValue>,
}

impl CimProperty {
    pub fn new(name: CimName, ty: CimType) -> Self {
        CimProperty {
            name,
            ty,
            is_array: false,
            array_size: None,
            reference_class: None,
            class_origin: None,
            propagated: false,
            embedded_object: None,
            qualifiers: Vec::new(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimParameter {
    pub name: CimName,
    pub ty: CimType,
    pub is_array: bool,
    pub array_size: Option<u32>,
    pub reference_class: Option<CimName>,
    pub qualifiers: Vec<CimQualifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimMethod {
    pub name: CimName,
    /// `None` when the method declares no `TYPE` (void).
    pub return_type: Option<CimType>,
    pub class_origin: Option<CimName>,
    pub propagated: bool,
    pub qualifiers: Vec<CimQualifier>,
    pub parameters: Vec<CimParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimInstance {
    pub class_name: CimName,
    /// Set for `VALUE.NAMEDINSTANCE`, where the instance name travels next to the instance.
    pub path: Option<CimObjectPath>,
    pub qualifiers: Vec<CimQualifier>,
    pub properties: Vec<CimProperty>,
}

impl CimInstance {
    pub fn new(class_name: CimName) -> Self {
        CimInstance {
            class_name,
            path: None,
            qualifiers: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&CimProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimClass {
    pub name: CimName,
    pub super_class: Option<CimName>,
    pub qualifiers: Vec<CimQualifier>,
    pub properties: Vec<CimProperty>,
    pub methods: Vec<CimMethod>,
}
