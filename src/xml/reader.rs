//! Readers for the CIM-XML (DSP0201) request grammar.
//!
//! Every `get_*` function tests for its element and returns `Ok(None)` (with the cursor left
//! untouched) when the next entry is something else; `expect_*` variants turn that into a
//! validation error.

use crate::err::{XmlError, XmlResult};
use crate::model::{
    CimClass, CimFlavor, CimInstance, CimMethod, CimName, CimNamespaceName, CimObjectPath,
    CimParamValue, CimParameter, CimProperty, CimQualifier, CimQualifierDecl, CimScope, CimType,
    CimValue, KeyBinding, KeyBindingType, parse_boolean, parse_unsigned,
};
use crate::xml::parser::{XmlEntry, XmlEntryKind, XmlParser};

fn validation(line: usize, message: impl Into<String>) -> XmlError {
    XmlError::validation(line, message)
}

pub(crate) fn test_xml_declaration(p: &mut XmlParser<'_>) -> XmlResult<bool> {
    match p.next()? {
        Some(entry) if entry.kind == XmlEntryKind::XmlDeclaration => Ok(true),
        Some(entry) => {
            p.put_back(entry);
            Ok(false)
        }
        None => Ok(false),
    }
}

pub(crate) fn test_start_tag(p: &mut XmlParser<'_>, tag: &str) -> XmlResult<Option<XmlEntry>> {
    match p.next()? {
        Some(entry) if entry.kind == XmlEntryKind::StartTag && entry.text == tag => Ok(Some(entry)),
        Some(entry) => {
            p.put_back(entry);
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Like [`test_start_tag`], also accepting `<TAG/>`. The flag is true for the empty form.
pub(crate) fn test_start_tag_or_empty_tag(
    p: &mut XmlParser<'_>,
    tag: &str,
) -> XmlResult<Option<(XmlEntry, bool)>> {
    match p.next()? {
        Some(entry) if entry.is_start_of(tag) => {
            let empty = entry.kind == XmlEntryKind::EmptyTag;
            Ok(Some((entry, empty)))
        }
        Some(entry) => {
            p.put_back(entry);
            Ok(None)
        }
        None => Ok(None),
    }
}

pub(crate) fn expect_start_tag(p: &mut XmlParser<'_>, tag: &str) -> XmlResult<XmlEntry> {
    test_start_tag(p, tag)?
        .ok_or_else(|| validation(p.line(), format!("Expected open of {tag} element")))
}

pub(crate) fn test_end_tag(p: &mut XmlParser<'_>, tag: &str) -> XmlResult<bool> {
    match p.next()? {
        Some(entry) if entry.kind == XmlEntryKind::EndTag && entry.text == tag => Ok(true),
        Some(entry) => {
            p.put_back(entry);
            Ok(false)
        }
        None => Ok(false),
    }
}

pub(crate) fn expect_end_tag(p: &mut XmlParser<'_>, tag: &str) -> XmlResult<()> {
    if test_end_tag(p, tag)? {
        Ok(())
    } else {
        Err(validation(p.line(), format!("Expected close of {tag} element")))
    }
}

pub(crate) fn test_content(p: &mut XmlParser<'_>) -> XmlResult<Option<String>> {
    match p.next()? {
        Some(entry) if entry.kind == XmlEntryKind::Content => Ok(Some(entry.text)),
        Some(entry) => {
            p.put_back(entry);
            Ok(None)
        }
        None => Ok(None),
    }
}

// Attribute helpers.

fn required_attribute<'e>(entry: &'e XmlEntry, element: &str, attr: &str) -> XmlResult<&'e str> {
    entry
        .attribute(attr)
        .ok_or_else(|| validation(entry.line, format!("Missing {element}.{attr} attribute")))
}

pub(crate) fn get_cim_name_attribute(
    entry: &XmlEntry,
    element: &str,
    attr: &str,
) -> XmlResult<CimName> {
    let value = required_attribute(entry, element, attr)?;
    CimName::new(value).ok_or_else(|| {
        validation(
            entry.line,
            format!("Illegal value for {element}.{attr} attribute: \"{value}\""),
        )
    })
}

fn get_optional_cim_name_attribute(
    entry: &XmlEntry,
    element: &str,
    attr: &str,
) -> XmlResult<Option<CimName>> {
    match entry.attribute(attr) {
        Some(_) => get_cim_name_attribute(entry, element, attr).map(Some),
        None => Ok(None),
    }
}

fn get_cim_type_attribute(entry: &XmlEntry, element: &str, attr: &str) -> XmlResult<Option<CimType>> {
    match entry.attribute(attr) {
        None => Ok(None),
        Some(value) => CimType::from_xml_name(value).map(Some).ok_or_else(|| {
            validation(
                entry.line,
                format!("Illegal value for {element}.{attr} attribute: \"{value}\""),
            )
        }),
    }
}

fn get_required_cim_type_attribute(entry: &XmlEntry, element: &str) -> XmlResult<CimType> {
    get_cim_type_attribute(entry, element, "TYPE")?
        .ok_or_else(|| validation(entry.line, format!("Missing {element}.TYPE attribute")))
}

fn get_boolean_attribute(entry: &XmlEntry, element: &str, attr: &str, default: bool) -> XmlResult<bool> {
    match entry.attribute(attr) {
        None => Ok(default),
        Some(value) => parse_boolean(value).ok_or_else(|| {
            validation(
                entry.line,
                format!("Invalid {element}.{attr} attribute value: \"{value}\""),
            )
        }),
    }
}

fn get_uint32_attribute(entry: &XmlEntry, element: &str, attr: &str) -> XmlResult<Option<u32>> {
    match entry.attribute(attr) {
        None => Ok(None),
        Some(value) => parse_unsigned(value)
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| {
                validation(
                    entry.line,
                    format!("Illegal value for {element}.{attr} attribute: \"{value}\""),
                )
            }),
    }
}

fn get_flavor(entry: &XmlEntry, element: &str) -> XmlResult<CimFlavor> {
    let mut flavor = CimFlavor::empty();
    flavor.set(
        CimFlavor::OVERRIDABLE,
        get_boolean_attribute(entry, element, "OVERRIDABLE", true)?,
    );
    flavor.set(
        CimFlavor::TOSUBCLASS,
        get_boolean_attribute(entry, element, "TOSUBCLASS", true)?,
    );
    flavor.set(
        CimFlavor::TOINSTANCE,
        get_boolean_attribute(entry, element, "TOINSTANCE", false)?,
    );
    flavor.set(
        CimFlavor::TRANSLATABLE,
        get_boolean_attribute(entry, element, "TRANSLATABLE", false)?,
    );
    Ok(flavor)
}

fn get_embedded_object_attribute(entry: &XmlEntry, element: &str) -> XmlResult<Option<String>> {
    let value = entry
        .attribute("EmbeddedObject")
        .or_else(|| entry.attribute("EMBEDDEDOBJECT"));
    match value {
        None => Ok(None),
        Some(v @ ("object" | "instance")) => Ok(Some(v.to_owned())),
        Some(v) => Err(validation(
            entry.line,
            format!("Illegal value for {element}.EmbeddedObject attribute: \"{v}\""),
        )),
    }
}

// Message envelope.

/// `<CIM CIMVERSION=".." DTDVERSION="..">`, returns both version strings.
pub(crate) fn get_cim_start_tag(p: &mut XmlParser<'_>) -> XmlResult<(String, String)> {
    let entry = expect_start_tag(p, "CIM")?;
    let cim_version = required_attribute(&entry, "CIM", "CIMVERSION")?.to_owned();
    let dtd_version = required_attribute(&entry, "CIM", "DTDVERSION")?.to_owned();
    Ok((cim_version, dtd_version))
}

/// `<MESSAGE ID=".." PROTOCOLVERSION="..">`, returns the id and the protocol version.
pub(crate) fn get_message_start_tag(p: &mut XmlParser<'_>) -> XmlResult<(String, String)> {
    let entry = expect_start_tag(p, "MESSAGE")?;
    let id = required_attribute(&entry, "MESSAGE", "ID")?.to_owned();
    let protocol_version = required_attribute(&entry, "MESSAGE", "PROTOCOLVERSION")?.to_owned();
    Ok((id, protocol_version))
}

pub(crate) fn get_imethod_call_start_tag(p: &mut XmlParser<'_>) -> XmlResult<Option<String>> {
    match test_start_tag(p, "IMETHODCALL")? {
        Some(entry) => Ok(Some(get_cim_name_attribute(&entry, "IMETHODCALL", "NAME")?.into_string())),
        None => Ok(None),
    }
}

pub(crate) fn get_emethod_call_start_tag(p: &mut XmlParser<'_>) -> XmlResult<Option<String>> {
    match test_start_tag(p, "METHODCALL")? {
        Some(entry) => Ok(Some(get_cim_name_attribute(&entry, "METHODCALL", "NAME")?.into_string())),
        None => Ok(None),
    }
}

/// `<IPARAMVALUE NAME="..">`, returns the name and whether the tag was self-closing.
pub(crate) fn get_iparam_value_tag(p: &mut XmlParser<'_>) -> XmlResult<Option<(String, bool)>> {
    match test_start_tag_or_empty_tag(p, "IPARAMVALUE")? {
        Some((entry, empty)) => {
            let name = required_attribute(&entry, "IPARAMVALUE", "NAME")?.to_owned();
            Ok(Some((name, empty)))
        }
        None => Ok(None),
    }
}

// Paths.

pub(crate) fn get_local_namespace_path(p: &mut XmlParser<'_>) -> XmlResult<Option<CimNamespaceName>> {
    let Some(start) = test_start_tag(p, "LOCALNAMESPACEPATH")? else {
        return Ok(None);
    };

    let mut components = Vec::new();
    while let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "NAMESPACE")? {
        components.push(required_attribute(&entry, "NAMESPACE", "NAME")?.to_owned());
        if !empty {
            expect_end_tag(p, "NAMESPACE")?;
        }
    }

    if components.is_empty() {
        return Err(validation(
            start.line,
            "Expected one or more NAMESPACE elements within LOCALNAMESPACEPATH element",
        ));
    }
    expect_end_tag(p, "LOCALNAMESPACEPATH")?;

    let joined = components.join("/");
    CimNamespaceName::new(&joined)
        .map(Some)
        .ok_or_else(|| validation(start.line, format!("Illegal namespace name \"{joined}\"")))
}

fn expect_local_namespace_path(p: &mut XmlParser<'_>) -> XmlResult<CimNamespaceName> {
    get_local_namespace_path(p)?
        .ok_or_else(|| validation(p.line(), "Expected LOCALNAMESPACEPATH element"))
}

fn get_namespace_path(p: &mut XmlParser<'_>) -> XmlResult<Option<(String, CimNamespaceName)>> {
    if test_start_tag(p, "NAMESPACEPATH")?.is_none() {
        return Ok(None);
    }

    expect_start_tag(p, "HOST")?;
    let host = test_content(p)?
        .ok_or_else(|| validation(p.line(), "Expected content of HOST element"))?;
    expect_end_tag(p, "HOST")?;

    let namespace = expect_local_namespace_path(p)?;
    expect_end_tag(p, "NAMESPACEPATH")?;
    Ok(Some((host, namespace)))
}

pub(crate) fn get_class_name_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimName>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "CLASSNAME")? else {
        return Ok(None);
    };
    let name = get_cim_name_attribute(&entry, "CLASSNAME", "NAME")?;
    if !empty {
        expect_end_tag(p, "CLASSNAME")?;
    }
    Ok(Some(name))
}

fn expect_class_name_element(p: &mut XmlParser<'_>) -> XmlResult<CimName> {
    get_class_name_element(p)?.ok_or_else(|| validation(p.line(), "Expected CLASSNAME element"))
}

fn get_key_value_element(p: &mut XmlParser<'_>) -> XmlResult<Option<(String, KeyBindingType)>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "KEYVALUE")? else {
        return Ok(None);
    };

    let ty = match entry.attribute("VALUETYPE") {
        None => KeyBindingType::String,
        Some(value_type) => KeyBindingType::from_value_type(value_type).ok_or_else(|| {
            validation(
                entry.line,
                format!("Illegal value for KEYVALUE.VALUETYPE attribute: \"{value_type}\""),
            )
        })?,
    };

    let value = if empty {
        String::new()
    } else {
        let value = test_content(p)?.unwrap_or_default();
        expect_end_tag(p, "KEYVALUE")?;
        value
    };

    let well_typed = match ty {
        KeyBindingType::Boolean => CimType::Boolean.validate(&value).is_ok(),
        KeyBindingType::Numeric => {
            CimType::Sint64.validate(&value).is_ok()
                || CimType::Uint64.validate(&value).is_ok()
                || CimType::Real64.validate(&value).is_ok()
        }
        KeyBindingType::String | KeyBindingType::Reference => true,
    };
    if !well_typed {
        return Err(validation(
            entry.line,
            format!("Illegal KEYVALUE value \"{value}\""),
        ));
    }

    Ok(Some((value, ty)))
}

fn get_key_binding_element(p: &mut XmlParser<'_>) -> XmlResult<Option<KeyBinding>> {
    let Some(entry) = test_start_tag(p, "KEYBINDING")? else {
        return Ok(None);
    };
    let name = get_cim_name_attribute(&entry, "KEYBINDING", "NAME")?;

    let binding = if let Some((value, ty)) = get_key_value_element(p)? {
        KeyBinding::new(name, value, ty)
    } else if let Some(path) = get_value_reference_element(p)? {
        KeyBinding::new(name, path.to_string(), KeyBindingType::Reference)
    } else {
        return Err(validation(
            p.line(),
            "Expected KEYVALUE or VALUE.REFERENCE element",
        ));
    };

    expect_end_tag(p, "KEYBINDING")?;
    Ok(Some(binding))
}

pub(crate) fn get_instance_name_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimObjectPath>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "INSTANCENAME")? else {
        return Ok(None);
    };
    let class_name = get_cim_name_attribute(&entry, "INSTANCENAME", "CLASSNAME")?;

    let mut key_bindings = Vec::new();
    if !empty {
        while let Some(binding) = get_key_binding_element(p)? {
            if key_bindings.iter().any(|kb: &KeyBinding| kb.name == binding.name) {
                return Err(validation(
                    p.line(),
                    format!("Duplicate KEYBINDING \"{}\"", binding.name),
                ));
            }
            key_bindings.push(binding);
        }
        if key_bindings.is_empty() && test_start_tag_or_empty_tag(p, "KEYVALUE")?.is_some() {
            return Err(validation(
                entry.line,
                "Unnamed KEYVALUE within INSTANCENAME is not supported",
            ));
        }
        expect_end_tag(p, "INSTANCENAME")?;
    }

    Ok(Some(CimObjectPath {
        host: None,
        namespace: None,
        class_name,
        key_bindings,
    }))
}

fn expect_instance_name_element(p: &mut XmlParser<'_>) -> XmlResult<CimObjectPath> {
    get_instance_name_element(p)?.ok_or_else(|| validation(p.line(), "Expected INSTANCENAME element"))
}

fn get_class_path_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimObjectPath>> {
    if test_start_tag(p, "CLASSPATH")?.is_none() {
        return Ok(None);
    }
    let (host, namespace) =
        get_namespace_path(p)?.ok_or_else(|| validation(p.line(), "Expected NAMESPACEPATH element"))?;
    let class_name = expect_class_name_element(p)?;
    expect_end_tag(p, "CLASSPATH")?;

    let mut path = CimObjectPath::class_path(Some(namespace), class_name);
    path.host = Some(host);
    Ok(Some(path))
}

pub(crate) fn get_local_class_path_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimObjectPath>> {
    if test_start_tag(p, "LOCALCLASSPATH")?.is_none() {
        return Ok(None);
    }
    let namespace = expect_local_namespace_path(p)?;
    let class_name = expect_class_name_element(p)?;
    expect_end_tag(p, "LOCALCLASSPATH")?;
    Ok(Some(CimObjectPath::class_path(Some(namespace), class_name)))
}

fn get_instance_path_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimObjectPath>> {
    if test_start_tag(p, "INSTANCEPATH")?.is_none() {
        return Ok(None);
    }
    let (host, namespace) =
        get_namespace_path(p)?.ok_or_else(|| validation(p.line(), "Expected NAMESPACEPATH element"))?;
    let mut path = expect_instance_name_element(p)?;
    expect_end_tag(p, "INSTANCEPATH")?;

    path.host = Some(host);
    path.namespace = Some(namespace);
    Ok(Some(path))
}

pub(crate) fn get_local_instance_path_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimObjectPath>> {
    if test_start_tag(p, "LOCALINSTANCEPATH")?.is_none() {
        return Ok(None);
    }
    let namespace = expect_local_namespace_path(p)?;
    let mut path = expect_instance_name_element(p)?;
    expect_end_tag(p, "LOCALINSTANCEPATH")?;

    path.namespace = Some(namespace);
    Ok(Some(path))
}

pub(crate) fn get_value_reference_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimObjectPath>> {
    let Some(start) = test_start_tag(p, "VALUE.REFERENCE")? else {
        return Ok(None);
    };

    let path = if let Some(path) = get_class_path_element(p)? {
        path
    } else if let Some(path) = get_local_class_path_element(p)? {
        path
    } else if let Some(class_name) = get_class_name_element(p)? {
        CimObjectPath::class_path(None, class_name)
    } else if let Some(path) = get_instance_path_element(p)? {
        path
    } else if let Some(path) = get_local_instance_path_element(p)? {
        path
    } else if let Some(path) = get_instance_name_element(p)? {
        path
    } else {
        return Err(validation(
            start.line,
            "Expected one of the following start tags: CLASSPATH, LOCALCLASSPATH, CLASSNAME, \
             INSTANCEPATH, LOCALINSTANCEPATH, INSTANCENAME",
        ));
    };

    expect_end_tag(p, "VALUE.REFERENCE")?;
    Ok(Some(path))
}

/// `CLASSNAME` or `INSTANCENAME`, as used by the `ObjectName` parameter.
pub(crate) fn get_object_name_element(p: &mut XmlParser<'_>) -> XmlResult<CimObjectPath> {
    if let Some(class_name) = get_class_name_element(p)? {
        return Ok(CimObjectPath::class_path(None, class_name));
    }
    get_instance_name_element(p)?
        .ok_or_else(|| validation(p.line(), "Expected CLASSNAME or INSTANCENAME element"))
}

// Values.

/// `<VALUE>` content checked against `ty`. `<VALUE/>` is the empty string.
pub(crate) fn get_value_element(p: &mut XmlParser<'_>, ty: CimType) -> XmlResult<Option<String>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "VALUE")? else {
        return Ok(None);
    };

    let text = if empty {
        String::new()
    } else {
        let text = test_content(p)?.unwrap_or_default();
        expect_end_tag(p, "VALUE")?;
        text
    };

    ty.validate(&text)
        .map_err(|message| validation(entry.line, message))?;
    Ok(Some(text))
}

fn test_value_null(p: &mut XmlParser<'_>) -> XmlResult<bool> {
    match test_start_tag_or_empty_tag(p, "VALUE.NULL")? {
        Some((_, empty)) => {
            if !empty {
                expect_end_tag(p, "VALUE.NULL")?;
            }
            Ok(true)
        }
        None => Ok(false),
    }
}

pub(crate) fn get_value_array_element(
    p: &mut XmlParser<'_>,
    ty: CimType,
) -> XmlResult<Option<Vec<Option<String>>>> {
    let Some((_, empty)) = test_start_tag_or_empty_tag(p, "VALUE.ARRAY")? else {
        return Ok(None);
    };

    let mut values = Vec::new();
    if !empty {
        loop {
            if let Some(value) = get_value_element(p, ty)? {
                values.push(Some(value));
            } else if test_value_null(p)? {
                values.push(None);
            } else {
                break;
            }
        }
        expect_end_tag(p, "VALUE.ARRAY")?;
    }
    Ok(Some(values))
}

fn get_value_ref_array_element(p: &mut XmlParser<'_>) -> XmlResult<Option<Vec<Option<CimObjectPath>>>> {
    let Some((_, empty)) = test_start_tag_or_empty_tag(p, "VALUE.REFARRAY")? else {
        return Ok(None);
    };

    let mut paths = Vec::new();
    if !empty {
        loop {
            if let Some(path) = get_value_reference_element(p)? {
                paths.push(Some(path));
            } else if test_value_null(p)? {
                paths.push(None);
            } else {
                break;
            }
        }
        expect_end_tag(p, "VALUE.REFARRAY")?;
    }
    Ok(Some(paths))
}

/// Any of `VALUE`, `VALUE.ARRAY`, `VALUE.REFERENCE`, `VALUE.REFARRAY`.
pub(crate) fn get_any_value(p: &mut XmlParser<'_>, ty: CimType) -> XmlResult<Option<CimValue>> {
    if let Some(value) = get_value_element(p, ty)? {
        return Ok(Some(CimValue::Scalar { ty, value }));
    }
    if let Some(values) = get_value_array_element(p, ty)? {
        return Ok(Some(CimValue::Array { ty, values }));
    }
    if let Some(path) = get_value_reference_element(p)? {
        return Ok(Some(CimValue::Reference { path }));
    }
    if let Some(paths) = get_value_ref_array_element(p)? {
        return Ok(Some(CimValue::ReferenceArray { paths }));
    }
    Ok(None)
}

// Qualifiers, properties, methods.

fn get_qualifier_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimQualifier>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "QUALIFIER")? else {
        return Ok(None);
    };

    let name = get_cim_name_attribute(&entry, "QUALIFIER", "NAME")?;
    let ty = get_required_cim_type_attribute(&entry, "QUALIFIER")?;
    let propagated = get_boolean_attribute(&entry, "QUALIFIER", "PROPAGATED", false)?;
    let flavor = get_flavor(&entry, "QUALIFIER")?;

    let value = if empty {
        None
    } else {
        let value = get_any_value(p, ty)?;
        expect_end_tag(p, "QUALIFIER")?;
        value
    };

    Ok(Some(CimQualifier {
        name,
        ty,
        value,
        flavor,
        propagated,
    }))
}

fn get_qualifier_elements(p: &mut XmlParser<'_>) -> XmlResult<Vec<CimQualifier>> {
    let mut qualifiers = Vec::new();
    while let Some(qualifier) = get_qualifier_element(p)? {
        qualifiers.push(qualifier);
    }
    Ok(qualifiers)
}

fn property_common(entry: &XmlEntry, element: &str, ty: CimType) -> XmlResult<CimProperty> {
    let mut property = CimProperty::new(get_cim_name_attribute(entry, element, "NAME")?, ty);
    property.class_origin = get_optional_cim_name_attribute(entry, element, "CLASSORIGIN")?;
    property.propagated = get_boolean_attribute(entry, element, "PROPAGATED", false)?;
    Ok(property)
}

fn get_property_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimProperty>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "PROPERTY")? else {
        return Ok(None);
    };

    let ty = get_required_cim_type_attribute(&entry, "PROPERTY")?;
    let mut property = property_common(&entry, "PROPERTY", ty)?;
    property.embedded_object = get_embedded_object_attribute(&entry, "PROPERTY")?;

    if !empty {
        property.qualifiers = get_qualifier_elements(p)?;
        property.value = get_value_element(p, ty)?.map(|value| CimValue::Scalar { ty, value });
        expect_end_tag(p, "PROPERTY")?;
    }
    Ok(Some(property))
}

fn get_property_array_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimProperty>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "PROPERTY.ARRAY")? else {
        return Ok(None);
    };

    let ty = get_required_cim_type_attribute(&entry, "PROPERTY.ARRAY")?;
    let mut property = property_common(&entry, "PROPERTY.ARRAY", ty)?;
    property.is_array = true;
    property.array_size = get_uint32_attribute(&entry, "PROPERTY.ARRAY", "ARRAYSIZE")?;
    property.embedded_object = get_embedded_object_attribute(&entry, "PROPERTY.ARRAY")?;

    if !empty {
        property.qualifiers = get_qualifier_elements(p)?;
        property.value =
            get_value_array_element(p, ty)?.map(|values| CimValue::Array { ty, values });
        expect_end_tag(p, "PROPERTY.ARRAY")?;
    }
    Ok(Some(property))
}

fn get_property_reference_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimProperty>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "PROPERTY.REFERENCE")? else {
        return Ok(None);
    };

    let mut property = property_common(&entry, "PROPERTY.REFERENCE", CimType::Reference)?;
    property.reference_class =
        get_optional_cim_name_attribute(&entry, "PROPERTY.REFERENCE", "REFERENCECLASS")?;

    if !empty {
        property.qualifiers = get_qualifier_elements(p)?;
        property.value = get_value_reference_element(p)?.map(|path| CimValue::Reference { path });
        expect_end_tag(p, "PROPERTY.REFERENCE")?;
    }
    Ok(Some(property))
}

fn get_property_elements(p: &mut XmlParser<'_>) -> XmlResult<Vec<CimProperty>> {
    let mut properties = Vec::new();
    loop {
        if let Some(property) = get_property_element(p)? {
            properties.push(property);
        } else if let Some(property) = get_property_array_element(p)? {
            properties.push(property);
        } else if let Some(property) = get_property_reference_element(p)? {
            properties.push(property);
        } else {
            return Ok(properties);
        }
    }
}

fn get_parameter_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimParameter>> {
    const PARAMETER_TAGS: [&str; 4] = [
        "PARAMETER",
        "PARAMETER.REFERENCE",
        "PARAMETER.ARRAY",
        "PARAMETER.REFARRAY",
    ];

    for tag in PARAMETER_TAGS {
        let Some((entry, empty)) = test_start_tag_or_empty_tag(p, tag)? else {
            continue;
        };

        let is_reference = tag.ends_with("REFERENCE") || tag.ends_with("REFARRAY");
        let is_array = tag.ends_with("ARRAY");
        let ty = if is_reference {
            CimType::Reference
        } else {
            get_required_cim_type_attribute(&entry, tag)?
        };

        let mut parameter = CimParameter {
            name: get_cim_name_attribute(&entry, tag, "NAME")?,
            ty,
            is_array,
            array_size: if is_array {
                get_uint32_attribute(&entry, tag, "ARRAYSIZE")?
            } else {
                None
            },
            reference_class: if is_reference {
                get_optional_cim_name_attribute(&entry, tag, "REFERENCECLASS")?
            } else {
                None
            },
            qualifiers: Vec::new(),
        };

        if !empty {
            parameter.qualifiers = get_qualifier_elements(p)?;
            expect_end_tag(p, tag)?;
        }
        return Ok(Some(parameter));
    }

    Ok(None)
}

fn get_method_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimMethod>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "METHOD")? else {
        return Ok(None);
    };

    let mut method = CimMethod {
        name: get_cim_name_attribute(&entry, "METHOD", "NAME")?,
        return_type: get_cim_type_attribute(&entry, "METHOD", "TYPE")?,
        class_origin: get_optional_cim_name_attribute(&entry, "METHOD", "CLASSORIGIN")?,
        propagated: get_boolean_attribute(&entry, "METHOD", "PROPAGATED", false)?,
        qualifiers: Vec::new(),
        parameters: Vec::new(),
    };

    if !empty {
        method.qualifiers = get_qualifier_elements(p)?;
        while let Some(parameter) = get_parameter_element(p)? {
            method.parameters.push(parameter);
        }
        expect_end_tag(p, "METHOD")?;
    }
    Ok(Some(method))
}

// Objects.

pub(crate) fn get_instance_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimInstance>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "INSTANCE")? else {
        return Ok(None);
    };

    let mut instance = CimInstance::new(get_cim_name_attribute(&entry, "INSTANCE", "CLASSNAME")?);
    if !empty {
        instance.qualifiers = get_qualifier_elements(p)?;
        instance.properties = get_property_elements(p)?;
        expect_end_tag(p, "INSTANCE")?;
    }
    Ok(Some(instance))
}

pub(crate) fn get_named_instance_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimInstance>> {
    let Some(start) = test_start_tag(p, "VALUE.NAMEDINSTANCE")? else {
        return Ok(None);
    };

    let path = expect_instance_name_element(p)?;
    let mut instance = get_instance_element(p)?
        .ok_or_else(|| validation(start.line, "Expected INSTANCE element"))?;
    expect_end_tag(p, "VALUE.NAMEDINSTANCE")?;

    instance.path = Some(path);
    Ok(Some(instance))
}

pub(crate) fn get_class_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimClass>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "CLASS")? else {
        return Ok(None);
    };

    let mut class = CimClass {
        name: get_cim_name_attribute(&entry, "CLASS", "NAME")?,
        super_class: get_optional_cim_name_attribute(&entry, "CLASS", "SUPERCLASS")?,
        qualifiers: Vec::new(),
        properties: Vec::new(),
        methods: Vec::new(),
    };

    if !empty {
        class.qualifiers = get_qualifier_elements(p)?;
        class.properties = get_property_elements(p)?;
        while let Some(method) = get_method_element(p)? {
            class.methods.push(method);
        }
        expect_end_tag(p, "CLASS")?;
    }
    Ok(Some(class))
}

fn get_scope_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimScope>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "SCOPE")? else {
        return Ok(None);
    };

    const SCOPES: [(&str, CimScope); 7] = [
        ("CLASS", CimScope::CLASS),
        ("ASSOCIATION", CimScope::ASSOCIATION),
        ("REFERENCE", CimScope::REFERENCE),
        ("PROPERTY", CimScope::PROPERTY),
        ("METHOD", CimScope::METHOD),
        ("PARAMETER", CimScope::PARAMETER),
        ("INDICATION", CimScope::INDICATION),
    ];

    let mut scope = CimScope::empty();
    for (attr, flag) in SCOPES {
        scope.set(flag, get_boolean_attribute(&entry, "SCOPE", attr, false)?);
    }
    if !empty {
        expect_end_tag(p, "SCOPE")?;
    }
    Ok(Some(scope))
}

pub(crate) fn get_qualifier_decl_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimQualifierDecl>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "QUALIFIER.DECLARATION")? else {
        return Ok(None);
    };

    const ELEMENT: &str = "QUALIFIER.DECLARATION";
    let ty = get_required_cim_type_attribute(&entry, ELEMENT)?;
    let mut decl = CimQualifierDecl {
        name: get_cim_name_attribute(&entry, ELEMENT, "NAME")?,
        ty,
        is_array: get_boolean_attribute(&entry, ELEMENT, "ISARRAY", false)?,
        array_size: get_uint32_attribute(&entry, ELEMENT, "ARRAYSIZE")?,
        scope: CimScope::empty(),
        flavor: get_flavor(&entry, ELEMENT)?,
        value: None,
    };

    if !empty {
        if let Some(scope) = get_scope_element(p)? {
            decl.scope = scope;
        }
        decl.value = if decl.is_array {
            get_value_array_element(p, ty)?.map(|values| CimValue::Array { ty, values })
        } else {
            get_value_element(p, ty)?.map(|value| CimValue::Scalar { ty, value })
        };
        expect_end_tag(p, ELEMENT)?;
    }
    Ok(Some(decl))
}

/// One `PARAMVALUE` of an extrinsic call.
pub(crate) fn get_param_value_element(p: &mut XmlParser<'_>) -> XmlResult<Option<CimParamValue>> {
    let Some((entry, empty)) = test_start_tag_or_empty_tag(p, "PARAMVALUE")? else {
        return Ok(None);
    };

    let name = required_attribute(&entry, "PARAMVALUE", "NAME")?.to_owned();
    let param_type = get_cim_type_attribute(&entry, "PARAMVALUE", "PARAMTYPE")?;
    let embedded_object = get_embedded_object_attribute(&entry, "PARAMVALUE")?;

    let value = if empty {
        None
    } else {
        let ty = param_type.unwrap_or(CimType::String);
        let value = if let Some(value) = get_any_value(p, ty)? {
            Some(value)
        } else if let Some(class_name) = get_class_name_element(p)? {
            Some(CimValue::Reference {
                path: CimObjectPath::class_path(None, class_name),
            })
        } else if let Some(path) = get_instance_name_element(p)? {
            Some(CimValue::Reference { path })
        } else if let Some(class) = get_class_element(p)? {
            Some(CimValue::Class {
                class: Box::new(class),
            })
        } else if let Some(instance) = get_instance_element(p)? {
            Some(CimValue::Instance {
                instance: Box::new(instance),
            })
        } else {
            get_named_instance_element(p)?.map(|instance| CimValue::Instance {
                instance: Box::new(instance),
            })
        };
        expect_end_tag(p, "PARAMVALUE")?;
        value
    };

    Ok(Some(CimParamValue {
        name,
        param_type,
        embedded_object,
        value,
    }))
}
