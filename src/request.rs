//! Typed request records, one per CIM operation.
//!
//! A record is built once, after every parameter of the call has been validated, and is then
//! handed to the output queue as is.

use serde::Serialize;

use crate::http::{HttpMethod, LanguageTag};
use crate::model::{
    CimClass, CimInstance, CimName, CimNamespaceName, CimObjectPath, CimParamValue,
    CimPropertyList, CimQualifierDecl, CimValue, Uint32Arg,
};

/// Routing and identity data common to every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestHeader {
    pub message_id: String,
    pub namespace: CimNamespaceName,
    /// Queue the request is delivered to.
    pub queue_id: u32,
    /// Transport queue the response must go back to.
    pub return_queue_id: u32,
    pub user_name: String,
    pub auth_type: String,
    pub user_role: String,
    pub remote_address: String,
    pub http_method: HttpMethod,
    pub accept_languages: Vec<LanguageTag>,
    pub content_languages: Vec<String>,
    /// The client asked for binary encoded responses.
    pub binary_response: bool,
    pub close_connection: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimRequest {
    pub header: RequestHeader,
    pub operation: Operation,
}

impl CimRequest {
    pub fn operation_name(&self) -> &'static str {
        self.operation.name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetClassRequest {
    pub class_name: CimName,
    pub local_only: bool,
    pub include_qualifiers: bool,
    pub include_class_origin: bool,
    pub property_list: CimPropertyList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetInstanceRequest {
    pub instance_name: CimObjectPath,
    pub local_only: bool,
    pub include_qualifiers: bool,
    pub include_class_origin: bool,
    pub property_list: CimPropertyList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteClassRequest {
    pub class_name: CimName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteInstanceRequest {
    pub instance_name: CimObjectPath,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateClassRequest {
    pub new_class: CimClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateInstanceRequest {
    pub new_instance: CimInstance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifyClassRequest {
    pub modified_class: CimClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifyInstanceRequest {
    /// Carries its instance name in `path`.
    pub modified_instance: CimInstance,
    pub include_qualifiers: bool,
    pub property_list: CimPropertyList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumerateClassesRequest {
    /// `None` enumerates from the namespace root.
    pub class_name: Option<CimName>,
    pub deep_inheritance: bool,
    pub local_only: bool,
    pub include_qualifiers: bool,
    pub include_class_origin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumerateClassNamesRequest {
    /// `None` enumerates from the namespace root.
    pub class_name: Option<CimName>,
    pub deep_inheritance: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumerateInstancesRequest {
    pub class_name: CimName,
    pub deep_inheritance: bool,
    pub local_only: bool,
    pub include_qualifiers: bool,
    pub include_class_origin: bool,
    pub property_list: CimPropertyList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumerateInstanceNamesRequest {
    pub class_name: CimName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecQueryRequest {
    pub query_language: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociatorsRequest {
    pub object_name: CimObjectPath,
    pub assoc_class: Option<CimName>,
    pub result_class: Option<CimName>,
    pub role: String,
    pub result_role: String,
    pub include_qualifiers: bool,
    pub include_class_origin: bool,
    pub property_list: CimPropertyList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociatorNamesRequest {
    pub object_name: CimObjectPath,
    pub assoc_class: Option<CimName>,
    pub result_class: Option<CimName>,
    pub role: String,
    pub result_role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferencesRequest {
    pub object_name: CimObjectPath,
    pub result_class: Option<CimName>,
    pub role: String,
    pub include_qualifiers: bool,
    pub include_class_origin: bool,
    pub property_list: CimPropertyList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceNamesRequest {
    pub object_name: CimObjectPath,
    pub result_class: Option<CimName>,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetPropertyRequest {
    pub instance_name: CimObjectPath,
    pub property_name: CimName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetPropertyRequest {
    pub instance_name: CimObjectPath,
    pub property_name: CimName,
    /// `None` sets the property to null.
    pub new_value: Option<CimValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifierNameRequest {
    pub qualifier_name: CimName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetQualifierRequest {
    pub qualifier_declaration: CimQualifierDecl,
}

/// Parameters shared by every `Open*` operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenOptions {
    pub filter_query_language: Option<String>,
    pub filter_query: Option<String>,
    /// Null lets the server pick its own timeout.
    pub operation_timeout: Uint32Arg,
    pub continue_on_error: bool,
    pub max_object_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenEnumerateInstancesRequest {
    pub class_name: CimName,
    pub deep_inheritance: bool,
    pub include_class_origin: bool,
    pub property_list: CimPropertyList,
    pub options: OpenOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenEnumerateInstancePathsRequest {
    pub class_name: CimName,
    pub options: OpenOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenReferenceInstancesRequest {
    pub instance_name: CimObjectPath,
    pub result_class: Option<CimName>,
    pub role: String,
    pub include_class_origin: bool,
    pub property_list: CimPropertyList,
    pub options: OpenOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenReferenceInstancePathsRequest {
    pub instance_name: CimObjectPath,
    pub result_class: Option<CimName>,
    pub role: String,
    pub options: OpenOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAssociatorInstancesRequest {
    pub instance_name: CimObjectPath,
    pub assoc_class: Option<CimName>,
    pub result_class: Option<CimName>,
    pub role: String,
    pub result_role: String,
    pub include_class_origin: bool,
    pub property_list: CimPropertyList,
    pub options: OpenOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAssociatorInstancePathsRequest {
    pub instance_name: CimObjectPath,
    pub assoc_class: Option<CimName>,
    pub result_class: Option<CimName>,
    pub role: String,
    pub result_role: String,
    pub options: OpenOptions,
}

/// `PullInstancesWithPath`, `PullInstancePaths` and `PullInstances`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequest {
    pub enumeration_context: String,
    pub max_object_count: u32,
}

/// `CloseEnumeration` and `EnumerationCount`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumerationContextRequest {
    pub enumeration_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenQueryInstancesRequest {
    pub filter_query_language: String,
    pub filter_query: String,
    pub return_query_result_class: bool,
    pub operation_timeout: Uint32Arg,
    pub continue_on_error: bool,
    pub max_object_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvokeMethodRequest {
    pub object_path: CimObjectPath,
    pub method_name: String,
    /// In wire order.
    pub in_parameters: Vec<CimParamValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation")]
pub enum Operation {
    GetClass(GetClassRequest),
    GetInstance(GetInstanceRequest),
    DeleteClass(DeleteClassRequest),
    DeleteInstance(DeleteInstanceRequest),
    CreateClass(CreateClassRequest),
    CreateInstance(CreateInstanceRequest),
    ModifyClass(ModifyClassRequest),
    ModifyInstance(ModifyInstanceRequest),
    EnumerateClasses(EnumerateClassesRequest),
    EnumerateClassNames(EnumerateClassNamesRequest),
    EnumerateInstances(EnumerateInstancesRequest),
    EnumerateInstanceNames(EnumerateInstanceNamesRequest),
    ExecQuery(ExecQueryRequest),
    Associators(AssociatorsRequest),
    AssociatorNames(AssociatorNamesRequest),
    References(ReferencesRequest),
    ReferenceNames(ReferenceNamesRequest),
    GetProperty(GetPropertyRequest),
    SetProperty(SetPropertyRequest),
    GetQualifier(QualifierNameRequest),
    SetQualifier(SetQualifierRequest),
    DeleteQualifier(QualifierNameRequest),
    EnumerateQualifiers,
    OpenEnumerateInstances(OpenEnumerateInstancesRequest),
    OpenEnumerateInstancePaths(OpenEnumerateInstancePathsRequest),
    OpenReferenceInstances(OpenReferenceInstancesRequest),
    OpenReferenceInstancePaths(OpenReferenceInstancePathsRequest),
    OpenAssociatorInstances(OpenAssociatorInstancesRequest),
    OpenAssociatorInstancePaths(OpenAssociatorInstancePathsRequest),
    PullInstancesWithPath(PullRequest),
    PullInstancePaths(PullRequest),
    PullInstances(PullRequest),
    CloseEnumeration(EnumerationContextRequest),
    EnumerationCount(EnumerationContextRequest),
    OpenQueryInstances(OpenQueryInstancesRequest),
    InvokeMethod(InvokeMethodRequest),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetClass(_) => "GetClass",
            Operation::GetInstance(_) => "GetInstance",
            Operation::DeleteClass(_) => "DeleteClass",
            Operation::DeleteInstance(_) => "DeleteInstance",
            Operation::CreateClass(_) => "CreateClass",
            Operation::CreateInstance(_) => "CreateInstance",
            Operation::ModifyClass(_) => "ModifyClass",
            Operation::ModifyInstance(_) => "ModifyInstance",
            Operation::EnumerateClasses(_) => "EnumerateClasses",
            Operation::EnumerateClassNames(_) => "EnumerateClassNames",
            Operation::EnumerateInstances(_) => "EnumerateInstances",
            Operation::EnumerateInstanceNames(_) => "EnumerateInstanceNames",
            Operation::ExecQuery(_) => "ExecQuery",
            Operation::Associators(_) => "Associators",
            Operation::AssociatorNames(_) => "AssociatorNames",
            Operation::References(_) => "References",
            Operation::ReferenceNames(_) => "ReferenceNames",
            Operation::GetProperty(_) => "GetProperty",
            Operation::SetProperty(_) => "SetProperty",
            Operation::GetQualifier(_) => "GetQualifier",
            Operation::SetQualifier(_) => "SetQualifier",
            Operation::DeleteQualifier(_) => "DeleteQualifier",
            Operation::EnumerateQualifiers => "EnumerateQualifiers",
            Operation::OpenEnumerateInstances(_) => "OpenEnumerateInstances",
            Operation::OpenEnumerateInstancePaths(_) => "OpenEnumerateInstancePaths",
            Operation::OpenReferenceInstances(_) => "OpenReferenceInstances",
            Operation::OpenReferenceInstancePaths(_) => "OpenReferenceInstancePaths",
            Operation::OpenAssociatorInstances(_) => "OpenAssociatorInstances",
            Operation::OpenAssociatorInstancePaths(_) => "OpenAssociatorInstancePaths",
            Operation::PullInstancesWithPath(_) => "PullInstancesWithPath",
            Operation::PullInstancePaths(_) => "PullInstancePaths",
            Operation::PullInstances(_) => "PullInstances",
            Operation::CloseEnumeration(_) => "CloseEnumeration",
            Operation::EnumerationCount(_) => "EnumerationCount",
            Operation::OpenQueryInstances(_) => "OpenQueryInstances",
            Operation::InvokeMethod(_) => "InvokeMethod",
        }
    }
}
