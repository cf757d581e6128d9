//! Parameter schemas and record builders for every supported operation.

use hashbrown::HashMap as FastMap;
use std::sync::LazyLock;

use crate::decoder::params::{ParamKind, ParamSet, ParamSpec, RequiredCheck, read_params};
use crate::err::Result;
use crate::model::CimParamValue;
use crate::request::*;
use crate::utils::fold_case;
use crate::xml::XmlParser;
use crate::xml::reader::get_param_value_element;

type BuildFn = fn(&mut ParamSet) -> Result<Operation>;

/// One intrinsic operation: the parameters it accepts and how to turn them into a record.
pub(crate) struct OperationSchema {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    pub required_check: RequiredCheck,
    build: BuildFn,
}

impl OperationSchema {
    const fn new(name: &'static str, params: &'static [ParamSpec], build: BuildFn) -> Self {
        OperationSchema {
            name,
            params,
            required_check: RequiredCheck::Named,
            build,
        }
    }

    const fn generic_required_check(mut self) -> Self {
        self.required_check = RequiredCheck::Generic;
        self
    }

    /// Read the `IPARAMVALUE`s of a call and build its record.
    pub fn decode(&self, p: &mut XmlParser<'_>) -> Result<Operation> {
        let mut params = read_params(p, self.params, self.required_check)?;
        (self.build)(&mut params)
    }
}

const CLASS_NAME: ParamSpec =
    ParamSpec::required("ClassName", ParamKind::ClassName { nullable: false });
const ROOT_CLASS_NAME: ParamSpec =
    ParamSpec::optional("ClassName", ParamKind::ClassName { nullable: true });
const INSTANCE_NAME: ParamSpec = ParamSpec::required("InstanceName", ParamKind::InstanceName);
const OBJECT_NAME: ParamSpec = ParamSpec::required("ObjectName", ParamKind::ObjectName);
const LOCAL_ONLY: ParamSpec = ParamSpec::optional("LocalOnly", ParamKind::Boolean);
const DEEP_INHERITANCE: ParamSpec = ParamSpec::optional("DeepInheritance", ParamKind::Boolean);
const INCLUDE_QUALIFIERS: ParamSpec = ParamSpec::optional("IncludeQualifiers", ParamKind::Boolean);
const INCLUDE_CLASS_ORIGIN: ParamSpec =
    ParamSpec::optional("IncludeClassOrigin", ParamKind::Boolean);
const PROPERTY_LIST: ParamSpec =
    ParamSpec::optional("PropertyList", ParamKind::PropertyList { tagged: true });
const BARE_PROPERTY_LIST: ParamSpec =
    ParamSpec::optional("PropertyList", ParamKind::PropertyList { tagged: false });
const ASSOC_CLASS: ParamSpec =
    ParamSpec::optional("AssocClass", ParamKind::ClassName { nullable: true });
const RESULT_CLASS: ParamSpec =
    ParamSpec::optional("ResultClass", ParamKind::ClassName { nullable: true });
const ROLE: ParamSpec = ParamSpec::optional("Role", ParamKind::String { nullable: true });
const RESULT_ROLE: ParamSpec =
    ParamSpec::optional("ResultRole", ParamKind::String { nullable: true });

const FILTER_QUERY_LANGUAGE: ParamSpec =
    ParamSpec::optional("FilterQueryLanguage", ParamKind::String { nullable: true });
const FILTER_QUERY: ParamSpec =
    ParamSpec::optional("FilterQuery", ParamKind::String { nullable: true });
const OPERATION_TIMEOUT: ParamSpec =
    ParamSpec::optional("OperationTimeout", ParamKind::NullableUint32);
const CONTINUE_ON_ERROR: ParamSpec = ParamSpec::optional("ContinueOnError", ParamKind::Boolean);
const MAX_OBJECT_COUNT: ParamSpec = ParamSpec::optional("MaxObjectCount", ParamKind::Uint32);
const ENUMERATION_CONTEXT: ParamSpec =
    ParamSpec::required("EnumerationContext", ParamKind::String { nullable: false });

static INTRINSIC_OPERATIONS: &[OperationSchema] = &[
    OperationSchema::new(
        "GetClass",
        &[CLASS_NAME, LOCAL_ONLY, INCLUDE_QUALIFIERS, INCLUDE_CLASS_ORIGIN, BARE_PROPERTY_LIST],
        get_class,
    ),
    OperationSchema::new(
        "GetInstance",
        &[INSTANCE_NAME, LOCAL_ONLY, INCLUDE_QUALIFIERS, INCLUDE_CLASS_ORIGIN, PROPERTY_LIST],
        get_instance,
    ),
    OperationSchema::new("DeleteClass", &[CLASS_NAME], delete_class),
    OperationSchema::new("DeleteInstance", &[INSTANCE_NAME], delete_instance),
    OperationSchema::new(
        "CreateClass",
        &[ParamSpec::required("NewClass", ParamKind::Class)],
        create_class,
    ),
    OperationSchema::new(
        "CreateInstance",
        &[ParamSpec::required("NewInstance", ParamKind::Instance)],
        create_instance,
    ),
    OperationSchema::new(
        "ModifyClass",
        &[ParamSpec::required("ModifiedClass", ParamKind::Class)],
        modify_class,
    ),
    OperationSchema::new(
        "ModifyInstance",
        &[
            ParamSpec::required("ModifiedInstance", ParamKind::NamedInstance),
            INCLUDE_QUALIFIERS,
            BARE_PROPERTY_LIST,
        ],
        modify_instance,
    ),
    OperationSchema::new(
        "EnumerateClasses",
        &[ROOT_CLASS_NAME, DEEP_INHERITANCE, LOCAL_ONLY, INCLUDE_QUALIFIERS, INCLUDE_CLASS_ORIGIN],
        enumerate_classes,
    ),
    OperationSchema::new(
        "EnumerateClassNames",
        &[ROOT_CLASS_NAME, DEEP_INHERITANCE],
        enumerate_class_names,
    ),
    OperationSchema::new(
        "EnumerateInstances",
        &[
            CLASS_NAME,
            DEEP_INHERITANCE,
            LOCAL_ONLY,
            INCLUDE_QUALIFIERS,
            INCLUDE_CLASS_ORIGIN,
            PROPERTY_LIST,
        ],
        enumerate_instances,
    ),
    OperationSchema::new("EnumerateInstanceNames", &[CLASS_NAME], enumerate_instance_names),
    OperationSchema::new(
        "ExecQuery",
        &[
            ParamSpec::required("QueryLanguage", ParamKind::String { nullable: false }),
            ParamSpec::required("Query", ParamKind::String { nullable: false }),
        ],
        exec_query,
    )
    .generic_required_check(),
    OperationSchema::new(
        "Associators",
        &[
            OBJECT_NAME,
            ASSOC_CLASS,
            RESULT_CLASS,
            ROLE,
            RESULT_ROLE,
            INCLUDE_QUALIFIERS,
            INCLUDE_CLASS_ORIGIN,
            PROPERTY_LIST,
        ],
        associators,
    ),
    OperationSchema::new(
        "AssociatorNames",
        &[OBJECT_NAME, ASSOC_CLASS, RESULT_CLASS, ROLE, RESULT_ROLE],
        associator_names,
    ),
    OperationSchema::new(
        "References",
        &[
            OBJECT_NAME,
            RESULT_CLASS,
            ROLE,
            INCLUDE_QUALIFIERS,
            INCLUDE_CLASS_ORIGIN,
            PROPERTY_LIST,
        ],
        references,
    ),
    OperationSchema::new(
        "ReferenceNames",
        &[OBJECT_NAME, RESULT_CLASS, ROLE],
        reference_names,
    ),
    OperationSchema::new(
        "GetProperty",
        &[
            INSTANCE_NAME,
            ParamSpec::required("PropertyName", ParamKind::String { nullable: false }),
        ],
        get_property,
    ),
    OperationSchema::new(
        "SetProperty",
        &[
            INSTANCE_NAME,
            ParamSpec::required("PropertyName", ParamKind::String { nullable: false }),
            ParamSpec::optional("NewValue", ParamKind::Value),
        ],
        set_property,
    ),
    OperationSchema::new(
        "GetQualifier",
        &[ParamSpec::required("QualifierName", ParamKind::String { nullable: false })],
        get_qualifier,
    ),
    OperationSchema::new(
        "SetQualifier",
        &[ParamSpec::required("QualifierDeclaration", ParamKind::QualifierDecl)],
        set_qualifier,
    )
    .generic_required_check(),
    OperationSchema::new(
        "DeleteQualifier",
        &[ParamSpec::required("QualifierName", ParamKind::String { nullable: false })],
        delete_qualifier,
    ),
    OperationSchema::new("EnumerateQualifiers", &[], enumerate_qualifiers),
    OperationSchema::new(
        "OpenEnumerateInstances",
        &[
            CLASS_NAME,
            DEEP_INHERITANCE,
            INCLUDE_CLASS_ORIGIN,
            PROPERTY_LIST,
            FILTER_QUERY_LANGUAGE,
            FILTER_QUERY,
            OPERATION_TIMEOUT,
            CONTINUE_ON_ERROR,
            MAX_OBJECT_COUNT,
        ],
        open_enumerate_instances,
    ),
    OperationSchema::new(
        "OpenEnumerateInstancePaths",
        &[
            CLASS_NAME,
            FILTER_QUERY_LANGUAGE,
            FILTER_QUERY,
            OPERATION_TIMEOUT,
            CONTINUE_ON_ERROR,
            MAX_OBJECT_COUNT,
        ],
        open_enumerate_instance_paths,
    ),
    OperationSchema::new(
        "OpenReferenceInstances",
        &[
            INSTANCE_NAME,
            RESULT_CLASS,
            ROLE,
            INCLUDE_CLASS_ORIGIN,
            PROPERTY_LIST,
            FILTER_QUERY_LANGUAGE,
            FILTER_QUERY,
            OPERATION_TIMEOUT,
            CONTINUE_ON_ERROR,
            MAX_OBJECT_COUNT,
        ],
        open_reference_instances,
    ),
    OperationSchema::new(
        "OpenReferenceInstancePaths",
        &[
            INSTANCE_NAME,
            RESULT_CLASS,
            ROLE,
            FILTER_QUERY_LANGUAGE,
            FILTER_QUERY,
            OPERATION_TIMEOUT,
            CONTINUE_ON_ERROR,
            MAX_OBJECT_COUNT,
        ],
        open_reference_instance_paths,
    ),
    OperationSchema::new(
        "OpenAssociatorInstances",
        &[
            INSTANCE_NAME,
            ASSOC_CLASS,
            RESULT_CLASS,
            ROLE,
            RESULT_ROLE,
            INCLUDE_CLASS_ORIGIN,
            PROPERTY_LIST,
            FILTER_QUERY_LANGUAGE,
            FILTER_QUERY,
            OPERATION_TIMEOUT,
            CONTINUE_ON_ERROR,
            MAX_OBJECT_COUNT,
        ],
        open_associator_instances,
    ),
    OperationSchema::new(
        "OpenAssociatorInstancePaths",
        &[
            INSTANCE_NAME,
            ASSOC_CLASS,
            RESULT_CLASS,
            ROLE,
            RESULT_ROLE,
            FILTER_QUERY_LANGUAGE,
            FILTER_QUERY,
            OPERATION_TIMEOUT,
            CONTINUE_ON_ERROR,
            MAX_OBJECT_COUNT,
        ],
        open_associator_instance_paths,
    ),
    OperationSchema::new(
        "PullInstancesWithPath",
        &PULL_PARAMS,
        pull_instances_with_path,
    ),
    OperationSchema::new("PullInstancePaths", &PULL_PARAMS, pull_instance_paths),
    OperationSchema::new("PullInstances", &PULL_PARAMS, pull_instances),
    OperationSchema::new("CloseEnumeration", &[ENUMERATION_CONTEXT], close_enumeration),
    OperationSchema::new("EnumerationCount", &[ENUMERATION_CONTEXT], enumeration_count),
    OperationSchema::new(
        "OpenQueryInstances",
        &[
            ParamSpec::required("FilterQueryLanguage", ParamKind::String { nullable: false }),
            ParamSpec::required("FilterQuery", ParamKind::String { nullable: false }),
            ParamSpec::optional("ReturnQueryResultClass", ParamKind::Boolean),
            OPERATION_TIMEOUT,
            CONTINUE_ON_ERROR,
            MAX_OBJECT_COUNT,
        ],
        open_query_instances,
    ),
];

const PULL_PARAMS: [ParamSpec; 2] = [
    ENUMERATION_CONTEXT,
    ParamSpec::required("MaxObjectCount", ParamKind::Uint32),
];

static DISPATCH: LazyLock<FastMap<String, &'static OperationSchema, ahash::RandomState>> =
    LazyLock::new(|| {
        INTRINSIC_OPERATIONS
            .iter()
            .map(|schema| (schema.name.to_ascii_lowercase(), schema))
            .collect()
    });

/// Case-insensitive lookup of an intrinsic method.
pub(crate) fn lookup_intrinsic(name: &str) -> Option<&'static OperationSchema> {
    DISPATCH.get(&*fold_case(name)).copied()
}

#[cfg(test)]
pub(crate) fn intrinsic_operations() -> &'static [OperationSchema] {
    INTRINSIC_OPERATIONS
}

/// The in-parameters of an extrinsic call, in wire order.
pub(crate) fn decode_invoke_method(p: &mut XmlParser<'_>) -> Result<Vec<CimParamValue>> {
    let mut params = Vec::new();
    while let Some(param) = get_param_value_element(p)? {
        params.push(param);
    }
    Ok(params)
}

fn get_class(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::GetClass(GetClassRequest {
        class_name: s.required_class_name("ClassName")?,
        local_only: s.boolean("LocalOnly", true)?,
        include_qualifiers: s.boolean("IncludeQualifiers", true)?,
        include_class_origin: s.boolean("IncludeClassOrigin", false)?,
        property_list: s.property_list("PropertyList")?,
    }))
}

fn get_instance(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::GetInstance(GetInstanceRequest {
        instance_name: s.object_path("InstanceName")?,
        local_only: s.boolean("LocalOnly", true)?,
        include_qualifiers: s.boolean("IncludeQualifiers", false)?,
        include_class_origin: s.boolean("IncludeClassOrigin", false)?,
        property_list: s.property_list("PropertyList")?,
    }))
}

fn delete_class(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::DeleteClass(DeleteClassRequest {
        class_name: s.required_class_name("ClassName")?,
    }))
}

fn delete_instance(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::DeleteInstance(DeleteInstanceRequest {
        instance_name: s.object_path("InstanceName")?,
    }))
}

fn create_class(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::CreateClass(CreateClassRequest {
        new_class: s.class("NewClass")?,
    }))
}

fn create_instance(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::CreateInstance(CreateInstanceRequest {
        new_instance: s.instance("NewInstance")?,
    }))
}

fn modify_class(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::ModifyClass(ModifyClassRequest {
        modified_class: s.class("ModifiedClass")?,
    }))
}

fn modify_instance(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::ModifyInstance(ModifyInstanceRequest {
        modified_instance: s.instance("ModifiedInstance")?,
        include_qualifiers: s.boolean("IncludeQualifiers", true)?,
        property_list: s.property_list("PropertyList")?,
    }))
}

fn enumerate_classes(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::EnumerateClasses(EnumerateClassesRequest {
        class_name: s.class_name("ClassName")?,
        deep_inheritance: s.boolean("DeepInheritance", false)?,
        local_only: s.boolean("LocalOnly", true)?,
        include_qualifiers: s.boolean("IncludeQualifiers", true)?,
        include_class_origin: s.boolean("IncludeClassOrigin", false)?,
    }))
}

fn enumerate_class_names(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::EnumerateClassNames(EnumerateClassNamesRequest {
        class_name: s.class_name("ClassName")?,
        deep_inheritance: s.boolean("DeepInheritance", false)?,
    }))
}

fn enumerate_instances(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::EnumerateInstances(EnumerateInstancesRequest {
        class_name: s.required_class_name("ClassName")?,
        deep_inheritance: s.boolean("DeepInheritance", true)?,
        // Accepted and recorded, but DSP0200 deprecates it for instances.
        local_only: s.boolean("LocalOnly", true)?,
        include_qualifiers: s.boolean("IncludeQualifiers", false)?,
        include_class_origin: s.boolean("IncludeClassOrigin", false)?,
        property_list: s.property_list("PropertyList")?,
    }))
}

fn enumerate_instance_names(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::EnumerateInstanceNames(EnumerateInstanceNamesRequest {
        class_name: s.required_class_name("ClassName")?,
    }))
}

fn exec_query(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::ExecQuery(ExecQueryRequest {
        query_language: s.required_string("QueryLanguage")?,
        query: s.required_string("Query")?,
    }))
}

fn associators(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::Associators(AssociatorsRequest {
        object_name: s.object_path("ObjectName")?,
        assoc_class: s.class_name("AssocClass")?,
        result_class: s.class_name("ResultClass")?,
        role: s.string("Role")?.unwrap_or_default(),
        result_role: s.string("ResultRole")?.unwrap_or_default(),
        include_qualifiers: s.boolean("IncludeQualifiers", false)?,
        include_class_origin: s.boolean("IncludeClassOrigin", false)?,
        property_list: s.property_list("PropertyList")?,
    }))
}

fn associator_names(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::AssociatorNames(AssociatorNamesRequest {
        object_name: s.object_path("ObjectName")?,
        assoc_class: s.class_name("AssocClass")?,
        result_class: s.class_name("ResultClass")?,
        role: s.string("Role")?.unwrap_or_default(),
        result_role: s.string("ResultRole")?.unwrap_or_default(),
    }))
}

fn references(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::References(ReferencesRequest {
        object_name: s.object_path("ObjectName")?,
        result_class: s.class_name("ResultClass")?,
        role: s.string("Role")?.unwrap_or_default(),
        include_qualifiers: s.boolean("IncludeQualifiers", false)?,
        include_class_origin: s.boolean("IncludeClassOrigin", false)?,
        property_list: s.property_list("PropertyList")?,
    }))
}

fn reference_names(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::ReferenceNames(ReferenceNamesRequest {
        object_name: s.object_path("ObjectName")?,
        result_class: s.class_name("ResultClass")?,
        role: s.string("Role")?.unwrap_or_default(),
    }))
}

fn get_property(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::GetProperty(GetPropertyRequest {
        instance_name: s.object_path("InstanceName")?,
        property_name: s.required_name("PropertyName")?,
    }))
}

fn set_property(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::SetProperty(SetPropertyRequest {
        instance_name: s.object_path("InstanceName")?,
        property_name: s.required_name("PropertyName")?,
        new_value: s.value("NewValue")?,
    }))
}

fn get_qualifier(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::GetQualifier(QualifierNameRequest {
        qualifier_name: s.required_name("QualifierName")?,
    }))
}

fn set_qualifier(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::SetQualifier(SetQualifierRequest {
        qualifier_declaration: s.qualifier_decl("QualifierDeclaration")?,
    }))
}

fn delete_qualifier(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::DeleteQualifier(QualifierNameRequest {
        qualifier_name: s.required_name("QualifierName")?,
    }))
}

fn enumerate_qualifiers(_: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::EnumerateQualifiers)
}

fn open_options(s: &mut ParamSet) -> Result<OpenOptions> {
    Ok(OpenOptions {
        filter_query_language: s.string("FilterQueryLanguage")?,
        filter_query: s.string("FilterQuery")?,
        operation_timeout: s.nullable_uint32("OperationTimeout")?,
        continue_on_error: s.boolean("ContinueOnError", false)?,
        max_object_count: s.uint32("MaxObjectCount", 0)?,
    })
}

fn open_enumerate_instances(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::OpenEnumerateInstances(OpenEnumerateInstancesRequest {
        class_name: s.required_class_name("ClassName")?,
        deep_inheritance: s.boolean("DeepInheritance", true)?,
        include_class_origin: s.boolean("IncludeClassOrigin", false)?,
        property_list: s.property_list("PropertyList")?,
        options: open_options(s)?,
    }))
}

fn open_enumerate_instance_paths(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::OpenEnumerateInstancePaths(OpenEnumerateInstancePathsRequest {
        class_name: s.required_class_name("ClassName")?,
        options: open_options(s)?,
    }))
}

fn open_reference_instances(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::OpenReferenceInstances(OpenReferenceInstancesRequest {
        instance_name: s.object_path("InstanceName")?,
        result_class: s.class_name("ResultClass")?,
        role: s.string("Role")?.unwrap_or_default(),
        include_class_origin: s.boolean("IncludeClassOrigin", false)?,
        property_list: s.property_list("PropertyList")?,
        options: open_options(s)?,
    }))
}

fn open_reference_instance_paths(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::OpenReferenceInstancePaths(OpenReferenceInstancePathsRequest {
        instance_name: s.object_path("InstanceName")?,
        result_class: s.class_name("ResultClass")?,
        role: s.string("Role")?.unwrap_or_default(),
        options: open_options(s)?,
    }))
}

fn open_associator_instances(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::OpenAssociatorInstances(OpenAssociatorInstancesRequest {
        instance_name: s.object_path("InstanceName")?,
        assoc_class: s.class_name("AssocClass")?,
        result_class: s.class_name("ResultClass")?,
        role: s.string("Role")?.unwrap_or_default(),
        result_role: s.string("ResultRole")?.unwrap_or_default(),
        include_class_origin: s.boolean("IncludeClassOrigin", false)?,
        property_list: s.property_list("PropertyList")?,
        options: open_options(s)?,
    }))
}

fn open_associator_instance_paths(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::OpenAssociatorInstancePaths(OpenAssociatorInstancePathsRequest {
        instance_name: s.object_path("InstanceName")?,
        assoc_class: s.class_name("AssocClass")?,
        result_class: s.class_name("ResultClass")?,
        role: s.string("Role")?.unwrap_or_default(),
        result_role: s.string("ResultRole")?.unwrap_or_default(),
        options: open_options(s)?,
    }))
}

fn pull_request(s: &mut ParamSet) -> Result<PullRequest> {
    Ok(PullRequest {
        enumeration_context: s.required_string("EnumerationContext")?,
        max_object_count: s.uint32("MaxObjectCount", 0)?,
    })
}

fn pull_instances_with_path(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::PullInstancesWithPath(pull_request(s)?))
}

fn pull_instance_paths(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::PullInstancePaths(pull_request(s)?))
}

fn pull_instances(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::PullInstances(pull_request(s)?))
}

fn enumeration_context(s: &mut ParamSet) -> Result<EnumerationContextRequest> {
    Ok(EnumerationContextRequest {
        enumeration_context: s.required_string("EnumerationContext")?,
    })
}

fn close_enumeration(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::CloseEnumeration(enumeration_context(s)?))
}

fn enumeration_count(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::EnumerationCount(enumeration_context(s)?))
}

fn open_query_instances(s: &mut ParamSet) -> Result<Operation> {
    Ok(Operation::OpenQueryInstances(OpenQueryInstancesRequest {
        filter_query_language: s.required_string("FilterQueryLanguage")?,
        filter_query: s.required_string("FilterQuery")?,
        return_query_result_class: s.boolean("ReturnQueryResultClass", false)?,
        operation_timeout: s.nullable_uint32("OperationTimeout")?,
        continue_on_error: s.boolean("ContinueOnError", false)?,
        max_object_count: s.uint32("MaxObjectCount", 0)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::DecodeFault;
    use crate::status::CimStatusCode;
    use crate::xml::reader::{expect_end_tag, expect_start_tag};

    fn sample(kind: ParamKind) -> &'static str {
        match kind {
            ParamKind::Boolean => "<VALUE>true</VALUE>",
            ParamKind::String { .. } => "<VALUE>Name</VALUE>",
            ParamKind::ClassName { .. } | ParamKind::ObjectName => r#"<CLASSNAME NAME="CIM_Foo"/>"#,
            ParamKind::InstanceName => {
                r#"<INSTANCENAME CLASSNAME="CIM_Foo"><KEYBINDING NAME="Id"><KEYVALUE VALUETYPE="numeric">1</KEYVALUE></KEYBINDING></INSTANCENAME>"#
            }
            ParamKind::PropertyList { .. } => "<VALUE.ARRAY><VALUE>Name</VALUE></VALUE.ARRAY>",
            ParamKind::Uint32 | ParamKind::NullableUint32 => "<VALUE>5</VALUE>",
            ParamKind::Instance => r#"<INSTANCE CLASSNAME="CIM_Foo"/>"#,
            ParamKind::NamedInstance => {
                r#"<VALUE.NAMEDINSTANCE><INSTANCENAME CLASSNAME="CIM_Foo"/><INSTANCE CLASSNAME="CIM_Foo"/></VALUE.NAMEDINSTANCE>"#
            }
            ParamKind::Class => r#"<CLASS NAME="CIM_Foo"/>"#,
            ParamKind::QualifierDecl => r#"<QUALIFIER.DECLARATION NAME="Key" TYPE="boolean"/>"#,
            ParamKind::Value => "<VALUE>v</VALUE>",
        }
    }

    fn decode(schema: &OperationSchema, specs: &[&ParamSpec]) -> Result<Operation> {
        let mut xml = format!("<IMETHODCALL NAME=\"{}\">", schema.name);
        for spec in specs {
            xml.push_str(&format!(
                "<IPARAMVALUE NAME=\"{}\">{}</IPARAMVALUE>",
                spec.name,
                sample(spec.kind)
            ));
        }
        xml.push_str("</IMETHODCALL>");

        let mut p = XmlParser::new(&xml, 10_000);
        expect_start_tag(&mut p, "IMETHODCALL").unwrap();
        let op = schema.decode(&mut p)?;
        expect_end_tag(&mut p, "IMETHODCALL").unwrap();
        Ok(op)
    }

    #[test]
    fn test_every_schema_is_dispatchable() {
        assert_eq!(intrinsic_operations().len(), 35);
        for schema in intrinsic_operations() {
            let found = lookup_intrinsic(&schema.name.to_uppercase()).unwrap();
            assert_eq!(found.name, schema.name);
        }
        assert!(lookup_intrinsic("NoSuchMethod").is_none());
    }

    #[test]
    fn test_required_only_succeeds() {
        crate::ensure_env_logger_initialized();
        for schema in intrinsic_operations() {
            let required: Vec<&ParamSpec> = schema.params.iter().filter(|p| p.required).collect();
            let op = decode(schema, &required)
                .unwrap_or_else(|e| panic!("{} failed with {e}", schema.name));
            assert_eq!(op.name(), schema.name);
        }
    }

    #[test]
    fn test_all_params_succeed() {
        for schema in intrinsic_operations() {
            let all: Vec<&ParamSpec> = schema.params.iter().collect();
            let op = decode(schema, &all).unwrap_or_else(|e| panic!("{} failed with {e}", schema.name));
            assert_eq!(op.name(), schema.name);
        }
    }

    #[test]
    fn test_each_missing_required_param_is_reported() {
        for schema in intrinsic_operations() {
            for missing in schema.params.iter().filter(|p| p.required) {
                let present: Vec<&ParamSpec> = schema
                    .params
                    .iter()
                    .filter(|p| p.required && p.name != missing.name)
                    .collect();
                let err = match decode(schema, &present) {
                    Err(DecodeFault::Cim(e)) => e,
                    other => panic!("{}: expected CIM error, got {other:?}", schema.name),
                };
                assert_eq!(err.code, CimStatusCode::InvalidParameter);
                match schema.required_check {
                    RequiredCheck::Named => assert_eq!(
                        err.message,
                        format!("Required parameter missing: {}", missing.name)
                    ),
                    RequiredCheck::Generic => assert_eq!(err.message, "Required parameter missing"),
                }
            }
        }
    }

    #[test]
    fn test_generic_required_check_is_limited_to_legacy_operations() {
        let generic: Vec<&str> = intrinsic_operations()
            .iter()
            .filter(|s| s.required_check == RequiredCheck::Generic)
            .map(|s| s.name)
            .collect();
        assert_eq!(generic, vec!["ExecQuery", "SetQualifier"]);
    }

    #[test]
    fn test_open_defaults() {
        let schema = lookup_intrinsic("OpenEnumerateInstances").unwrap();
        let op = decode(schema, &[&CLASS_NAME]).unwrap();
        let Operation::OpenEnumerateInstances(req) = op else {
            panic!("wrong operation");
        };
        assert!(req.deep_inheritance);
        assert!(req.options.operation_timeout.is_null());
        assert_eq!(req.options.max_object_count, 0);
        assert!(!req.options.continue_on_error);
        assert!(req.property_list.is_null());
    }
}
