//! The slice of the CIM object model that a request can carry.

mod name;
mod object;
mod object_path;
mod param;
mod value;

pub use self::name::{CimName, CimNamespaceName};
pub use self::object::{
    CimClass, CimFlavor, CimInstance, CimMethod, CimParameter, CimProperty, CimQualifier,
    CimQualifierDecl, CimScope,
};
pub use self::object_path::{CimObjectPath, KeyBinding, KeyBindingType, ObjectPathParseError};
pub use self::param::{CimParamValue, CimPropertyList, Uint32Arg};
pub use self::value::{CimType, CimValue, parse_boolean, parse_signed, parse_unsigned};
