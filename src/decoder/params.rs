//! Declarative `IPARAMVALUE` decoding.
//!
//! Each operation describes its parameters as a static slice of [`ParamSpec`]. One generic loop
//! reads the parameters of a call against that slice, keeping the "already seen" state in a map
//! that lives only for the duration of the call.

use hashbrown::HashMap as FastMap;
use log::trace;

use crate::err::{CimException, Result};
use crate::internal_err;
use crate::model::{
    CimClass, CimInstance, CimName, CimObjectPath, CimPropertyList, CimQualifierDecl, CimType,
    CimValue, Uint32Arg, parse_boolean, parse_unsigned,
};
use crate::utils::eq_ignore_case;
use crate::xml::XmlParser;
use crate::xml::reader::{
    expect_end_tag, get_any_value, get_class_element, get_class_name_element,
    get_instance_element, get_instance_name_element, get_iparam_value_tag,
    get_named_instance_element, get_object_name_element, get_qualifier_decl_element,
    get_value_array_element, get_value_element,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamKind {
    Boolean,
    /// `<VALUE>` text. Nullable strings accept `<IPARAMVALUE/>`.
    String { nullable: bool },
    ClassName { nullable: bool },
    InstanceName,
    /// `CLASSNAME` or `INSTANCENAME`.
    ObjectName,
    /// `tagged` lists remember that they came from an explicit `PropertyList` element.
    PropertyList { tagged: bool },
    Uint32,
    /// Absent and null both decode to [`Uint32Arg::NULL`].
    NullableUint32,
    Instance,
    NamedInstance,
    Class,
    QualifierDecl,
    /// Any value element, or null.
    Value,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        ParamSpec {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        ParamSpec {
            name,
            kind,
            required: false,
        }
    }

    pub fn claims(&self, name: &str) -> bool {
        eq_ignore_case(self.name, name)
    }
}

/// How a missing required parameter is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequiredCheck {
    /// Name the missing parameter.
    Named,
    /// One message for all of them.
    Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParamValue {
    Boolean(bool),
    String(Option<String>),
    ClassName(Option<CimName>),
    ObjectPath(CimObjectPath),
    PropertyList(CimPropertyList),
    Uint32(Uint32Arg),
    Instance(Box<CimInstance>),
    Class(Box<CimClass>),
    QualifierDecl(Box<CimQualifierDecl>),
    Value(Option<CimValue>),
}

/// The decoded parameters of one call, keyed by their schema name.
#[derive(Debug, Default)]
pub(crate) struct ParamSet {
    values: FastMap<&'static str, ParamValue, ahash::RandomState>,
}

/// Read every `IPARAMVALUE` up to the closing `IMETHODCALL`.
pub(crate) fn read_params(
    p: &mut XmlParser<'_>,
    params: &'static [ParamSpec],
    required_check: RequiredCheck,
) -> Result<ParamSet> {
    let mut set = ParamSet::default();

    while let Some((name, empty)) = get_iparam_value_tag(p)? {
        let spec = params
            .iter()
            .find(|spec| spec.claims(&name))
            .ok_or_else(|| CimException::unrecognized_parameter(&name))?;

        let value = read_value(p, spec, empty)?;
        if !empty {
            expect_end_tag(p, "IPARAMVALUE")?;
        }

        // Only after the end tag: a malformed element outranks a duplicate.
        if set.values.contains_key(spec.name) {
            return Err(CimException::duplicate_parameter(spec.name).into());
        }
        trace!("IPARAMVALUE {} = {:?}", spec.name, value);
        set.values.insert(spec.name, value);
    }

    if let Some(missing) = params
        .iter()
        .find(|spec| spec.required && !set.values.contains_key(spec.name))
    {
        return Err(match required_check {
            RequiredCheck::Named => CimException::required_parameter_missing(missing.name),
            RequiredCheck::Generic => CimException::required_parameters_missing(),
        }
        .into());
    }

    Ok(set)
}

fn non_null<T>(spec: &ParamSpec, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| CimException::null_value(spec.name).into())
}

fn read_value(p: &mut XmlParser<'_>, spec: &ParamSpec, empty: bool) -> Result<ParamValue> {
    let value = match spec.kind {
        ParamKind::Boolean => {
            let text = non_null(spec, read_text(p, empty)?)?;
            let value = parse_boolean(&text).ok_or_else(|| {
                CimException::invalid_parameter(format!(
                    "Invalid boolean value \"{text}\" for IPARAMVALUE \"{}\"",
                    spec.name
                ))
            })?;
            ParamValue::Boolean(value)
        }
        ParamKind::String { nullable } => {
            let text = read_text(p, empty)?;
            if text.is_none() && !nullable {
                return Err(CimException::null_value(spec.name).into());
            }
            ParamValue::String(text)
        }
        ParamKind::ClassName { nullable } => {
            let name = if empty { None } else { get_class_name_element(p)? };
            if name.is_none() && !nullable {
                return Err(CimException::null_value(spec.name).into());
            }
            ParamValue::ClassName(name)
        }
        ParamKind::InstanceName => {
            let path = if empty { None } else { get_instance_name_element(p)? };
            ParamValue::ObjectPath(non_null(spec, path)?)
        }
        ParamKind::ObjectName => {
            if empty {
                return Err(CimException::null_value(spec.name).into());
            }
            ParamValue::ObjectPath(get_object_name_element(p)?)
        }
        ParamKind::PropertyList { tagged } => ParamValue::PropertyList(read_property_list(p, spec, empty, tagged)?),
        ParamKind::Uint32 => {
            let text = non_null(spec, read_text(p, empty)?)?;
            ParamValue::Uint32(Uint32Arg::new(parse_uint32(spec, &text)?))
        }
        ParamKind::NullableUint32 => match read_text(p, empty)? {
            Some(text) => ParamValue::Uint32(Uint32Arg::new(parse_uint32(spec, &text)?)),
            None => ParamValue::Uint32(Uint32Arg::NULL),
        },
        ParamKind::Instance => {
            let instance = if empty { None } else { get_instance_element(p)? };
            ParamValue::Instance(Box::new(non_null(spec, instance)?))
        }
        ParamKind::NamedInstance => {
            let instance = if empty { None } else { get_named_instance_element(p)? };
            ParamValue::Instance(Box::new(non_null(spec, instance)?))
        }
        ParamKind::Class => {
            let class = if empty { None } else { get_class_element(p)? };
            ParamValue::Class(Box::new(non_null(spec, class)?))
        }
        ParamKind::QualifierDecl => {
            let decl = if empty { None } else { get_qualifier_decl_element(p)? };
            ParamValue::QualifierDecl(Box::new(non_null(spec, decl)?))
        }
        ParamKind::Value => {
            let value = if empty {
                None
            } else {
                get_any_value(p, CimType::String)?
            };
            ParamValue::Value(value)
        }
    };
    Ok(value)
}

/// `<VALUE>` content of a non-empty `IPARAMVALUE`; `None` when there is no `VALUE` child.
fn read_text(p: &mut XmlParser<'_>, empty: bool) -> Result<Option<String>> {
    if empty {
        return Ok(None);
    }
    Ok(get_value_element(p, CimType::String)?)
}

fn parse_uint32(spec: &ParamSpec, text: &str) -> Result<u32> {
    parse_unsigned(text)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            CimException::invalid_parameter(format!(
                "Invalid uint32 value \"{text}\" for IPARAMVALUE \"{}\"",
                spec.name
            ))
            .into()
        })
}

fn read_property_list(
    p: &mut XmlParser<'_>,
    spec: &ParamSpec,
    empty: bool,
    tagged: bool,
) -> Result<CimPropertyList> {
    let values = if empty {
        None
    } else {
        get_value_array_element(p, CimType::String)?
    };
    let Some(values) = values else {
        return Ok(CimPropertyList::null());
    };

    let mut names = Vec::with_capacity(values.len());
    for value in values {
        let value = value.ok_or_else(|| {
            CimException::invalid_parameter(format!(
                "Null entry in IPARAMVALUE \"{}\"",
                spec.name
            ))
        })?;
        let name = CimName::new(value.trim()).ok_or_else(|| {
            CimException::invalid_parameter(format!(
                "Illegal property name \"{value}\" in IPARAMVALUE \"{}\"",
                spec.name
            ))
        })?;
        names.push(name);
    }
    Ok(CimPropertyList::new(names, tagged))
}

fn mismatch(name: &str, expected: &str) -> crate::err::DecodeFault {
    internal_err!("parameter {} does not hold a {} value", name, expected)
}

impl ParamSet {
    fn take(&mut self, name: &'static str) -> Option<ParamValue> {
        self.values.remove(name)
    }

    pub fn boolean(&mut self, name: &'static str, default: bool) -> Result<bool> {
        match self.take(name) {
            None => Ok(default),
            Some(ParamValue::Boolean(value)) => Ok(value),
            Some(_) => Err(mismatch(name, "boolean")),
        }
    }

    pub fn string(&mut self, name: &'static str) -> Result<Option<String>> {
        match self.take(name) {
            None => Ok(None),
            Some(ParamValue::String(value)) => Ok(value),
            Some(_) => Err(mismatch(name, "string")),
        }
    }

    pub fn required_string(&mut self, name: &'static str) -> Result<String> {
        self.string(name)?
            .ok_or_else(|| CimException::required_parameter_missing(name).into())
    }

    /// A string parameter that must hold a legal CIM name.
    pub fn required_name(&mut self, name: &'static str) -> Result<CimName> {
        let text = self.required_string(name)?;
        CimName::new(text.trim()).ok_or_else(|| {
            CimException::invalid_parameter(format!(
                "Illegal name \"{text}\" for IPARAMVALUE \"{name}\""
            ))
            .into()
        })
    }

    pub fn class_name(&mut self, name: &'static str) -> Result<Option<CimName>> {
        match self.take(name) {
            None => Ok(None),
            Some(ParamValue::ClassName(value)) => Ok(value),
            Some(_) => Err(mismatch(name, "class name")),
        }
    }

    pub fn required_class_name(&mut self, name: &'static str) -> Result<CimName> {
        self.class_name(name)?
            .ok_or_else(|| CimException::required_parameter_missing(name).into())
    }

    pub fn object_path(&mut self, name: &'static str) -> Result<CimObjectPath> {
        match self.take(name) {
            None => Err(CimException::required_parameter_missing(name).into()),
            Some(ParamValue::ObjectPath(path)) => Ok(path),
            Some(_) => Err(mismatch(name, "object path")),
        }
    }

    pub fn property_list(&mut self, name: &'static str) -> Result<CimPropertyList> {
        match self.take(name) {
            None => Ok(CimPropertyList::null()),
            Some(ParamValue::PropertyList(list)) => Ok(list),
            Some(_) => Err(mismatch(name, "property list")),
        }
    }

    pub fn uint32(&mut self, name: &'static str, default: u32) -> Result<u32> {
        Ok(self.nullable_uint32(name)?.value().unwrap_or(default))
    }

    pub fn nullable_uint32(&mut self, name: &'static str) -> Result<Uint32Arg> {
        match self.take(name) {
            None => Ok(Uint32Arg::NULL),
            Some(ParamValue::Uint32(value)) => Ok(value),
            Some(_) => Err(mismatch(name, "uint32")),
        }
    }

    pub fn instance(&mut self, name: &'static str) -> Result<CimInstance> {
        match self.take(name) {
            None => Err(CimException::required_parameter_missing(name).into()),
            Some(ParamValue::Instance(instance)) => Ok(*instance),
            Some(_) => Err(mismatch(name, "instance")),
        }
    }

    pub fn class(&mut self, name: &'static str) -> Result<CimClass> {
        match self.take(name) {
            None => Err(CimException::required_parameter_missing(name).into()),
            Some(ParamValue::Class(class)) => Ok(*class),
            Some(_) => Err(mismatch(name, "class")),
        }
    }

    pub fn qualifier_decl(&mut self, name: &'static str) -> Result<CimQualifierDecl> {
        match self.take(name) {
            None => Err(CimException::required_parameter_missing(name).into()),
            Some(ParamValue::QualifierDecl(decl)) => Ok(*decl),
            Some(_) => Err(mismatch(name, "qualifier declaration")),
        }
    }

    pub fn value(&mut self, name: &'static str) -> Result<Option<CimValue>> {
        match self.take(name) {
            None => Ok(None),
            Some(ParamValue::Value(value)) => Ok(value),
            Some(_) => Err(mismatch(name, "value")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::{DecodeFault, XmlError};
    use crate::status::CimStatusCode;
    use pretty_assertions::assert_eq;

    static PARAMS: [ParamSpec; 4] = [
        ParamSpec::required("ClassName", ParamKind::ClassName { nullable: false }),
        ParamSpec::optional("LocalOnly", ParamKind::Boolean),
        ParamSpec::optional("OperationTimeout", ParamKind::NullableUint32),
        ParamSpec::optional("PropertyList", ParamKind::PropertyList { tagged: true }),
    ];

    fn read(body: &str, check: RequiredCheck) -> Result<ParamSet> {
        let xml = format!("<IMETHODCALL NAME=\"X\">{body}</IMETHODCALL>");
        let mut p = XmlParser::new(&xml, 1000);
        crate::xml::reader::expect_start_tag(&mut p, "IMETHODCALL").unwrap();
        let set = read_params(&mut p, &PARAMS, check)?;
        expect_end_tag(&mut p, "IMETHODCALL")?;
        Ok(set)
    }

    fn cim_error(result: Result<ParamSet>) -> CimException {
        match result {
            Err(DecodeFault::Cim(e)) => e,
            other => panic!("expected a CIM exception, got {other:?}"),
        }
    }

    #[test]
    fn test_reads_typed_values() {
        let mut set = read(
            r#"<IPARAMVALUE NAME="classname"><CLASSNAME NAME="CIM_Foo"/></IPARAMVALUE>
               <IPARAMVALUE NAME="LocalOnly"><VALUE>FALSE</VALUE></IPARAMVALUE>
               <IPARAMVALUE NAME="PropertyList"><VALUE.ARRAY><VALUE>Name</VALUE></VALUE.ARRAY></IPARAMVALUE>"#,
            RequiredCheck::Named,
        )
        .unwrap();

        assert_eq!(set.required_class_name("ClassName").unwrap().as_str(), "CIM_Foo");
        assert!(!set.boolean("LocalOnly", true).unwrap());
        assert!(set.nullable_uint32("OperationTimeout").unwrap().is_null());
        let list = set.property_list("PropertyList").unwrap();
        assert!(list.from_request());
        assert_eq!(list.names().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_parameter() {
        let err = cim_error(read(
            r#"<IPARAMVALUE NAME="Bogus"><VALUE>1</VALUE></IPARAMVALUE>"#,
            RequiredCheck::Named,
        ));
        assert_eq!(err.code, CimStatusCode::NotSupported);
        assert!(err.message.contains("Bogus"));
    }

    #[test]
    fn test_duplicate_after_end_tag() {
        let dup = r#"<IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="A"/></IPARAMVALUE>
                     <IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="B"/></IPARAMVALUE>"#;
        let err = cim_error(read(dup, RequiredCheck::Named));
        assert_eq!(err.code, CimStatusCode::InvalidParameter);
        assert!(err.message.contains("Duplicate"));

        // Second occurrence lacks its end tag: the XML error wins.
        let broken = r#"<IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="A"/></IPARAMVALUE>
                        <IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="B"/>"#;
        match read(broken, RequiredCheck::Named) {
            Err(DecodeFault::Xml(XmlError::Validation { .. } | XmlError::NotWellFormed { .. })) => {}
            other => panic!("expected an XML error, got {other:?}"),
        }
    }

    #[test]
    fn test_required_missing() {
        let err = cim_error(read("", RequiredCheck::Named));
        assert_eq!(err.message, "Required parameter missing: ClassName");

        let err = cim_error(read("", RequiredCheck::Generic));
        assert_eq!(err.message, "Required parameter missing");
    }

    #[test]
    fn test_null_values() {
        let err = cim_error(read(r#"<IPARAMVALUE NAME="ClassName"/>"#, RequiredCheck::Named));
        assert!(err.message.contains("null value"));

        let err = cim_error(read(
            r#"<IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="A"/></IPARAMVALUE><IPARAMVALUE NAME="LocalOnly"/>"#,
            RequiredCheck::Named,
        ));
        assert!(err.message.contains("LocalOnly"));
    }

    #[test]
    fn test_timeout_zero_differs_from_absent() {
        let mut set = read(
            r#"<IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="A"/></IPARAMVALUE>
               <IPARAMVALUE NAME="OperationTimeout"><VALUE>0</VALUE></IPARAMVALUE>"#,
            RequiredCheck::Named,
        )
        .unwrap();
        assert_eq!(set.nullable_uint32("OperationTimeout").unwrap(), Uint32Arg::new(0));
    }

    #[test]
    fn test_bad_numbers() {
        for text in ["-1", "abc", "4294967296"] {
            let body = format!(
                r#"<IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="A"/></IPARAMVALUE><IPARAMVALUE NAME="OperationTimeout"><VALUE>{text}</VALUE></IPARAMVALUE>"#
            );
            let err = cim_error(read(&body, RequiredCheck::Named));
            assert_eq!(err.code, CimStatusCode::InvalidParameter);
        }
    }
}
