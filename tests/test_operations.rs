mod fixtures;

use fixtures::*;

use cimxml::model::{CimType, CimValue, KeyBindingType};
use cimxml::request::Operation;
use cimxml::HttpStatus;
use pretty_assertions::assert_eq;

fn decode(method: &str, params: &str) -> Operation {
    Harness::new()
        .send_raw(&intrinsic_request(method, params))
        .request()
        .operation
}

fn fault(method: &str, params: &str) -> String {
    let response = Harness::new()
        .send_raw(&intrinsic_request(method, params))
        .response();
    assert_eq!(response.status, HttpStatus::OK, "{}", response.body_text());
    response.body_text()
}

const INSTANCE_NAME: &str = r#"<INSTANCENAME CLASSNAME="CIM_Disk"><KEYBINDING NAME="DeviceID"><KEYVALUE VALUETYPE="string">sda</KEYVALUE></KEYBINDING><KEYBINDING NAME="Slot"><KEYVALUE VALUETYPE="numeric">3</KEYVALUE></KEYBINDING></INSTANCENAME>"#;

#[test]
fn test_enumerate_class_names_without_class_name() {
    let Operation::EnumerateClassNames(request) = decode("EnumerateClassNames", "") else {
        panic!("expected EnumerateClassNames");
    };
    assert_eq!(request.class_name, None);
    assert!(!request.deep_inheritance);
}

#[test]
fn test_enumerate_classes_with_null_class_name() {
    let params = format!(
        r#"<IPARAMVALUE NAME="ClassName"/>{}"#,
        iparam("DeepInheritance", &value("TRUE"))
    );
    let Operation::EnumerateClasses(request) = decode("EnumerateClasses", &params) else {
        panic!("expected EnumerateClasses");
    };
    assert_eq!(request.class_name, None);
    assert!(request.deep_inheritance);
    assert!(request.local_only);
    assert!(request.include_qualifiers);
}

#[test]
fn test_pull_without_max_object_count() {
    let body = fault(
        "PullInstances",
        &iparam("EnumerationContext", &value("ctx-1")),
    );
    assert!(body.contains(r#"CODE="4""#), "{body}");
    assert!(
        body.contains("Required parameter missing: MaxObjectCount"),
        "{body}"
    );
}

#[test]
fn test_pull_instances_with_path() {
    let params = format!(
        "{}{}",
        iparam("EnumerationContext", &value("ctx-1")),
        iparam("MaxObjectCount", &value("100"))
    );
    let Operation::PullInstancesWithPath(request) = decode("PullInstancesWithPath", &params) else {
        panic!("expected PullInstancesWithPath");
    };
    assert_eq!(request.enumeration_context, "ctx-1");
    assert_eq!(request.max_object_count, 100);
}

#[test]
fn test_operation_timeout_zero_differs_from_absent() {
    let class = iparam("ClassName", &class_name("CIM_Disk"));

    let Operation::OpenEnumerateInstances(absent) = decode("OpenEnumerateInstances", &class) else {
        panic!("expected OpenEnumerateInstances");
    };
    let with_zero = format!("{class}{}", iparam("OperationTimeout", &value("0")));
    let Operation::OpenEnumerateInstances(zero) = decode("OpenEnumerateInstances", &with_zero) else {
        panic!("expected OpenEnumerateInstances");
    };

    assert!(absent.options.operation_timeout.is_null());
    assert!(!zero.options.operation_timeout.is_null());
    assert_eq!(zero.options.operation_timeout.value(), Some(0));
    assert_ne!(absent.options.operation_timeout, zero.options.operation_timeout);
}

#[test]
fn test_open_enumerate_instances_options() {
    let params = [
        iparam("ClassName", &class_name("CIM_Disk")),
        iparam("FilterQueryLanguage", &value("DMTF:FQL")),
        iparam("FilterQuery", &value("Slot = 3")),
        iparam("OperationTimeout", &value("30")),
        iparam("ContinueOnError", &value("false")),
        iparam("MaxObjectCount", &value("25")),
        r#"<IPARAMVALUE NAME="PropertyList"><VALUE.ARRAY><VALUE>DeviceID</VALUE></VALUE.ARRAY></IPARAMVALUE>"#.to_owned(),
    ]
    .concat();
    let Operation::OpenEnumerateInstances(request) = decode("OpenEnumerateInstances", &params) else {
        panic!("expected OpenEnumerateInstances");
    };
    assert_eq!(request.class_name.as_str(), "CIM_Disk");
    assert!(request.deep_inheritance);
    assert_eq!(request.options.filter_query_language.as_deref(), Some("DMTF:FQL"));
    assert_eq!(request.options.filter_query.as_deref(), Some("Slot = 3"));
    assert_eq!(request.options.operation_timeout.value(), Some(30));
    assert_eq!(request.options.max_object_count, 25);
    let names: Vec<&str> = request
        .property_list
        .names()
        .unwrap()
        .iter()
        .map(|n| n.as_str())
        .collect();
    assert_eq!(names, vec!["DeviceID"]);
}

#[test]
fn test_negative_and_overflowing_counts_are_rejected() {
    for count in ["-1", "4294967296", "ten"] {
        let params = format!(
            "{}{}",
            iparam("EnumerationContext", &value("ctx")),
            iparam("MaxObjectCount", &value(count))
        );
        let body = fault("PullInstancePaths", &params);
        assert!(body.contains(r#"CODE="4""#), "{count}: {body}");
    }
}

#[test]
fn test_exec_query_uses_the_generic_missing_error() {
    let body = fault("ExecQuery", &iparam("QueryLanguage", &value("WQL")));
    assert!(body.contains(r#"CODE="4""#));
    assert!(body.contains(r#"DESCRIPTION="Required parameter missing""#), "{body}");

    let params = format!(
        "{}{}",
        iparam("QueryLanguage", &value("WQL")),
        iparam("Query", &value("SELECT * FROM CIM_Disk"))
    );
    let Operation::ExecQuery(request) = decode("ExecQuery", &params) else {
        panic!("expected ExecQuery");
    };
    assert_eq!(request.query_language, "WQL");
    assert_eq!(request.query, "SELECT * FROM CIM_Disk");
}

#[test]
fn test_unknown_parameter_is_not_supported() {
    let params = format!(
        "{}{}",
        iparam("ClassName", &class_name("CIM_Disk")),
        iparam("Flavour", &value("vanilla"))
    );
    let body = fault("GetClass", &params);
    assert!(body.contains(r#"CODE="7""#), "{body}");
}

#[test]
fn test_parameter_names_are_case_insensitive() {
    let params = format!(
        "{}{}",
        iparam("classname", &class_name("CIM_Disk")),
        iparam("LOCALONLY", &value("false"))
    );
    let Operation::GetClass(request) = decode("GetClass", &params) else {
        panic!("expected GetClass");
    };
    assert_eq!(request.class_name.as_str(), "CIM_Disk");
    assert!(!request.local_only);
}

#[test]
fn test_null_required_class_name() {
    let body = fault("GetClass", r#"<IPARAMVALUE NAME="ClassName"/>"#);
    assert!(body.contains(r#"CODE="4""#));
    assert!(body.contains("null value"), "{body}");
}

#[test]
fn test_get_instance() {
    let params = format!(
        "{}{}",
        iparam("InstanceName", INSTANCE_NAME),
        r#"<IPARAMVALUE NAME="PropertyList"><VALUE.ARRAY/></IPARAMVALUE>"#
    );
    let Operation::GetInstance(request) = decode("GetInstance", &params) else {
        panic!("expected GetInstance");
    };
    let path = request.instance_name;
    assert_eq!(path.class_name.as_str(), "CIM_Disk");
    assert_eq!(path.key_bindings.len(), 2);
    assert_eq!(path.key_bindings[0].value, "sda");
    assert_eq!(path.key_bindings[1].ty, KeyBindingType::Numeric);
    assert!(request.local_only);
    assert!(!request.include_qualifiers);
    assert_eq!(request.property_list.names().map(|n| n.len()), Some(0));
    assert!(request.property_list.from_request());
}

#[test]
fn test_get_class_property_list_is_not_tagged() {
    let params = format!(
        "{}{}",
        iparam("ClassName", &class_name("CIM_Disk")),
        r#"<IPARAMVALUE NAME="PropertyList"><VALUE.ARRAY><VALUE>Slot</VALUE></VALUE.ARRAY></IPARAMVALUE>"#
    );
    let Operation::GetClass(request) = decode("GetClass", &params) else {
        panic!("expected GetClass");
    };
    assert!(!request.property_list.is_null());
    assert!(!request.property_list.from_request());
}

#[test]
fn test_enumerate_instances_defaults() {
    let params = iparam("ClassName", &class_name("CIM_Disk"));
    let Operation::EnumerateInstances(request) = decode("EnumerateInstances", &params) else {
        panic!("expected EnumerateInstances");
    };
    assert!(request.deep_inheritance);
    assert!(request.local_only);
    assert!(!request.include_qualifiers);
    assert!(!request.include_class_origin);
    assert!(request.property_list.is_null());
}

#[test]
fn test_associators() {
    let params = format!(
        "{}{}{}",
        iparam("ObjectName", INSTANCE_NAME),
        iparam("AssocClass", &class_name("CIM_SystemDevice")),
        iparam("ResultRole", &value("GroupComponent"))
    );
    let Operation::Associators(request) = decode("Associators", &params) else {
        panic!("expected Associators");
    };
    assert!(request.object_name.is_instance_path());
    assert_eq!(
        request.assoc_class.as_ref().map(|c| c.as_str()),
        Some("CIM_SystemDevice")
    );
    assert_eq!(request.result_class, None);
    assert_eq!(request.role, "");
    assert_eq!(request.result_role, "GroupComponent");
}

#[test]
fn test_reference_names_on_a_class() {
    let params = iparam("ObjectName", &class_name("CIM_Disk"));
    let Operation::ReferenceNames(request) = decode("ReferenceNames", &params) else {
        panic!("expected ReferenceNames");
    };
    assert!(!request.object_name.is_instance_path());
    assert_eq!(request.object_name.class_name.as_str(), "CIM_Disk");
}

#[test]
fn test_create_instance() {
    let instance = concat!(
        r#"<INSTANCE CLASSNAME="CIM_Disk">"#,
        r#"<PROPERTY NAME="DeviceID" TYPE="string"><VALUE>sdb</VALUE></PROPERTY>"#,
        r#"<PROPERTY.ARRAY NAME="Capabilities" TYPE="uint16"><VALUE.ARRAY><VALUE>2</VALUE><VALUE>3</VALUE></VALUE.ARRAY></PROPERTY.ARRAY>"#,
        "</INSTANCE>"
    );
    let Operation::CreateInstance(request) = decode("CreateInstance", &iparam("NewInstance", instance))
    else {
        panic!("expected CreateInstance");
    };
    let instance = request.new_instance;
    assert_eq!(instance.class_name.as_str(), "CIM_Disk");
    let device_id = instance.property("DeviceID").unwrap();
    assert_eq!(
        device_id.value,
        Some(CimValue::Scalar {
            ty: CimType::String,
            value: "sdb".to_owned()
        })
    );
    assert!(instance.property("Capabilities").unwrap().value.as_ref().unwrap().is_array());
}

#[test]
fn test_bad_property_value_is_a_validation_error() {
    let instance = r#"<INSTANCE CLASSNAME="CIM_Disk"><PROPERTY NAME="Slot" TYPE="uint8"><VALUE>300</VALUE></PROPERTY></INSTANCE>"#;
    let response = Harness::new()
        .send_raw(&intrinsic_request("CreateInstance", &iparam("NewInstance", instance)))
        .response();
    assert_eq!(response.status, HttpStatus::BAD_REQUEST);
    assert_eq!(response.header("CIMError"), Some("request-not-valid"));
}

#[test]
fn test_modify_instance() {
    let named = format!(
        r#"<VALUE.NAMEDINSTANCE>{INSTANCE_NAME}<INSTANCE CLASSNAME="CIM_Disk"><PROPERTY NAME="Label" TYPE="string"><VALUE>data</VALUE></PROPERTY></INSTANCE></VALUE.NAMEDINSTANCE>"#
    );
    let Operation::ModifyInstance(request) = decode("ModifyInstance", &iparam("ModifiedInstance", &named))
    else {
        panic!("expected ModifyInstance");
    };
    let path = request.modified_instance.path.as_ref().unwrap();
    assert_eq!(path.key_bindings.len(), 2);
    assert!(request.include_qualifiers);
    assert!(request.property_list.is_null());
}

#[test]
fn test_create_class_and_qualifiers() {
    let class = concat!(
        r#"<CLASS NAME="CIM_Widget" SUPERCLASS="CIM_ManagedElement">"#,
        r#"<QUALIFIER NAME="Description" TYPE="string"><VALUE>A widget</VALUE></QUALIFIER>"#,
        r#"<PROPERTY NAME="Id" TYPE="uint32"><QUALIFIER NAME="Key" TYPE="boolean"><VALUE>true</VALUE></QUALIFIER></PROPERTY>"#,
        r#"<METHOD NAME="Spin" TYPE="uint32"><PARAMETER NAME="Speed" TYPE="uint16"/></METHOD>"#,
        "</CLASS>"
    );
    let Operation::CreateClass(request) = decode("CreateClass", &iparam("NewClass", class)) else {
        panic!("expected CreateClass");
    };
    assert_eq!(request.new_class.name.as_str(), "CIM_Widget");
    assert_eq!(
        request.new_class.super_class.as_ref().map(|c| c.as_str()),
        Some("CIM_ManagedElement")
    );
    assert_eq!(request.new_class.properties.len(), 1);
    assert_eq!(request.new_class.methods.len(), 1);

    let decl = r#"<QUALIFIER.DECLARATION NAME="Volatile" TYPE="boolean" TOSUBCLASS="false"><SCOPE PROPERTY="true"/><VALUE>false</VALUE></QUALIFIER.DECLARATION>"#;
    let Operation::SetQualifier(request) = decode("SetQualifier", &iparam("QualifierDeclaration", decl))
    else {
        panic!("expected SetQualifier");
    };
    assert_eq!(request.qualifier_declaration.name.as_str(), "Volatile");

    let Operation::DeleteQualifier(request) = decode("DeleteQualifier", &iparam("QualifierName", &value("Volatile")))
    else {
        panic!("expected DeleteQualifier");
    };
    assert_eq!(request.qualifier_name.as_str(), "Volatile");
}

#[test]
fn test_get_and_set_property() {
    let params = format!(
        "{}{}",
        iparam("InstanceName", INSTANCE_NAME),
        iparam("PropertyName", &value("Label"))
    );
    let Operation::GetProperty(request) = decode("GetProperty", &params) else {
        panic!("expected GetProperty");
    };
    assert_eq!(request.property_name.as_str(), "Label");

    let Operation::SetProperty(request) = decode("SetProperty", &params) else {
        panic!("expected SetProperty");
    };
    assert_eq!(request.new_value, None);

    let with_value = format!("{params}{}", iparam("NewValue", &value("scratch")));
    let Operation::SetProperty(request) = decode("SetProperty", &with_value) else {
        panic!("expected SetProperty");
    };
    assert_eq!(
        request.new_value.as_ref().and_then(|v| v.as_str()),
        Some("scratch")
    );
}

#[test]
fn test_open_query_instances() {
    let params = format!(
        "{}{}{}",
        iparam("FilterQueryLanguage", &value("DMTF:CQL")),
        iparam("FilterQuery", &value("SELECT * FROM CIM_Disk")),
        iparam("ReturnQueryResultClass", &value("true"))
    );
    let Operation::OpenQueryInstances(request) = decode("OpenQueryInstances", &params) else {
        panic!("expected OpenQueryInstances");
    };
    assert!(request.return_query_result_class);
    assert!(request.operation_timeout.is_null());
    assert_eq!(request.max_object_count, 0);
    assert!(!request.continue_on_error);
}

#[test]
fn test_close_enumeration_and_count() {
    let context = iparam("EnumerationContext", &value("ctx-9"));
    assert!(matches!(
        decode("CloseEnumeration", &context),
        Operation::CloseEnumeration(ref r) if r.enumeration_context == "ctx-9"
    ));
    assert!(matches!(
        decode("EnumerationCount", &context),
        Operation::EnumerationCount(_)
    ));

    let body = fault("CloseEnumeration", "");
    assert!(body.contains("Required parameter missing: EnumerationContext"), "{body}");
}

#[test]
fn test_method_names_dispatch_case_insensitively() {
    let raw = post(
        &operation_headers("enumeratequalifiers", "root/cimv2"),
        &intrinsic_body("enumeratequalifiers", ""),
    );
    let request = Harness::new().send_raw(&raw).request();
    assert_eq!(request.operation, Operation::EnumerateQualifiers);
}
