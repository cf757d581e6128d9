//! The method-call state machine for XML payloads.
//!
//! `CIM` -> `MESSAGE` -> `SIMPLEREQ` -> (`IMETHODCALL` | `METHODCALL`) -> parameters -> end tags.
//! Header/body disagreements and envelope errors surface as HTTP errors. Once the method is
//! known, CIM faults are answered with a `SIMPLERSP` error body instead.

use log::{debug, trace, warn};

use crate::decoder::headers::HeaderValues;
use crate::decoder::operations::{decode_invoke_method, lookup_intrinsic};
use crate::err::{CimException, DecodeFault, HttpError, Result, XmlError};
use crate::http::{HttpMessage, HttpResponse};
use crate::internal_err;
use crate::model::{CimNamespaceName, CimObjectPath, CimParamValue};
use crate::queue::{PasswordService, QueueMessage};
use crate::request::{CimRequest, InvokeMethodRequest, Operation, RequestHeader};
use crate::settings::DecoderSettings;
use crate::status::{CimErrorToken, CimStatusCode};
use crate::utils::eq_ignore_case;
use crate::xml::XmlParser;
use crate::xml::reader::{
    expect_end_tag, expect_start_tag, get_cim_start_tag, get_emethod_call_start_tag,
    get_imethod_call_start_tag, get_local_class_path_element, get_local_instance_path_element,
    get_local_namespace_path, get_message_start_tag, test_start_tag, test_xml_declaration,
};
use crate::xml::writer::{MethodKind, format_error_response, format_return_value_response};

const UPDATE_EXPIRED_PASSWORD: &str = "UpdateExpiredPassword";

pub(crate) struct DispatchContext<'a> {
    pub message: &'a HttpMessage,
    pub headers: &'a HeaderValues,
    pub settings: &'a DecoderSettings,
    pub password_service: Option<&'a dyn PasswordService>,
    /// Queue the decoded request is addressed to.
    pub output_queue_id: u32,
}

/// Result of decoding the method call itself.
enum Outcome {
    Request(CimRequest),
    /// Already a complete response; the rest of the body is not read.
    Respond(HttpResponse),
}

pub(crate) fn dispatch(ctx: &DispatchContext<'_>, body: &str) -> Result<QueueMessage> {
    let mut p = XmlParser::new(body, ctx.settings.get_max_elements());

    test_xml_declaration(&mut p)?;

    let (cim_version, dtd_version) = get_cim_start_tag(&mut p)?;
    if !ctx.settings.supports_cim_version(&cim_version) {
        return Err(HttpError::not_implemented(
            CimErrorToken::UnsupportedCimVersion,
            format!("CIM version \"{cim_version}\" is not supported"),
        )
        .into());
    }
    if !ctx.settings.supports_dtd_version(&dtd_version) {
        return Err(HttpError::not_implemented(
            CimErrorToken::UnsupportedDtdVersion,
            format!("DTD version \"{dtd_version}\" is not supported"),
        )
        .into());
    }

    let (message_id, protocol_version) = get_message_start_tag(&mut p)?;
    if !eq_ignore_case(&protocol_version, &ctx.headers.protocol_version) {
        return Err(HttpError::header_mismatch(format!(
            "CIMProtocolVersion value \"{}\" does not match PROTOCOLVERSION \"{protocol_version}\"",
            ctx.headers.protocol_version
        ))
        .into());
    }
    if !ctx.settings.supports_protocol_version(&protocol_version) {
        return Err(HttpError::not_implemented(
            CimErrorToken::UnsupportedProtocolVersion,
            format!("Protocol version \"{protocol_version}\" is not supported"),
        )
        .into());
    }

    if test_start_tag(&mut p, "MULTIREQ")?.is_some() {
        return Err(HttpError::header_mismatch("MULTIREQ received without a CIMBatch header").into());
    }
    expect_start_tag(&mut p, "SIMPLEREQ")?;

    let outcome = if let Some(method_name) = get_imethod_call_start_tag(&mut p)? {
        trace!("IMETHODCALL {} (message {})", method_name, message_id);
        let outcome = intrinsic_call(ctx, &mut p, &message_id, &method_name)?;
        if matches!(outcome, Outcome::Request(_)) {
            expect_end_tag(&mut p, "IMETHODCALL")?;
        }
        outcome
    } else if let Some(method_name) = get_emethod_call_start_tag(&mut p)? {
        trace!("METHODCALL {} (message {})", method_name, message_id);
        let outcome = extrinsic_call(ctx, &mut p, &message_id, &method_name)?;
        if matches!(outcome, Outcome::Request(_)) {
            expect_end_tag(&mut p, "METHODCALL")?;
        }
        outcome
    } else {
        return Err(
            XmlError::validation(p.line(), "expected IMETHODCALL or METHODCALL element").into(),
        );
    };

    match outcome {
        Outcome::Request(request) => {
            expect_end_tag(&mut p, "SIMPLEREQ")?;
            expect_end_tag(&mut p, "MESSAGE")?;
            expect_end_tag(&mut p, "CIM")?;
            Ok(QueueMessage::Request(Box::new(request)))
        }
        Outcome::Respond(response) => Ok(QueueMessage::Response(response)),
    }
}

fn intrinsic_call(
    ctx: &DispatchContext<'_>,
    p: &mut XmlParser<'_>,
    message_id: &str,
    method_name: &str,
) -> Result<Outcome> {
    match ctx.headers.cim_method.as_deref() {
        None => return Err(HttpError::header_mismatch("CIMMethod header missing").into()),
        Some(header) if !eq_ignore_case(header, method_name) => {
            return Err(method_mismatch(header, method_name).into());
        }
        Some(_) => {}
    }

    let line = p.line();
    let namespace = get_local_namespace_path(p)?
        .ok_or_else(|| XmlError::validation(line, "expected LOCALNAMESPACEPATH element"))?;

    match ctx.headers.cim_object.as_deref() {
        None => return Err(HttpError::header_mismatch("CIMObject header missing").into()),
        Some(header) if !eq_ignore_case(header.trim_start_matches('/'), namespace.as_str()) => {
            return Err(HttpError::header_mismatch(format!(
                "CIMObject value \"{header}\" does not match namespace \"{namespace}\""
            ))
            .into());
        }
        Some(_) => {}
    }

    let Some(schema) = lookup_intrinsic(method_name) else {
        debug!("unsupported intrinsic method {}", method_name);
        return fault(
            ctx,
            message_id,
            MethodKind::Intrinsic,
            method_name,
            CimException::not_supported(format!("Intrinsic method \"{method_name}\" is not supported")),
        );
    };

    let operation = match schema.decode(p) {
        Ok(operation) => operation,
        Err(err) => return operation_fault(ctx, message_id, MethodKind::Intrinsic, method_name, err),
    };

    if ctx.message.expired_password {
        return access_denied(ctx, message_id, MethodKind::Intrinsic, method_name);
    }

    Ok(Outcome::Request(CimRequest {
        header: request_header(ctx, message_id, namespace),
        operation,
    }))
}

fn extrinsic_call(
    ctx: &DispatchContext<'_>,
    p: &mut XmlParser<'_>,
    message_id: &str,
    method_name: &str,
) -> Result<Outcome> {
    // Extrinsic names may be arbitrary Unicode, compared as sent.
    match ctx.headers.cim_method.as_deref() {
        None => return Err(HttpError::header_mismatch("CIMMethod header missing").into()),
        Some(header) if header != method_name => {
            return Err(method_mismatch(header, method_name).into());
        }
        Some(_) => {}
    }

    let line = p.line();
    let object_path = match get_local_instance_path_element(p)? {
        Some(path) => path,
        None => get_local_class_path_element(p)?.ok_or_else(|| {
            XmlError::validation(line, "expected LOCALINSTANCEPATH or LOCALCLASSPATH element")
        })?,
    };

    let header = ctx
        .headers
        .cim_object
        .as_deref()
        .ok_or_else(|| HttpError::header_mismatch("CIMObject header missing"))?;
    let header_path: CimObjectPath = header.parse().map_err(|e| {
        debug!("CIMObject header: {}", e);
        HttpError::header_mismatch(format!("CIMObject value \"{header}\" is not a valid object path"))
    })?;
    if !header_path.identical(&object_path) {
        return Err(HttpError::header_mismatch(format!(
            "CIMObject value \"{header}\" does not match object path \"{object_path}\""
        ))
        .into());
    }

    let in_parameters = match decode_invoke_method(p) {
        Ok(params) => params,
        Err(err) => return operation_fault(ctx, message_id, MethodKind::Extrinsic, method_name, err),
    };

    if ctx.message.expired_password {
        if ctx.headers.update_expired_password && method_name == UPDATE_EXPIRED_PASSWORD {
            return update_expired_password(ctx, message_id, method_name, &in_parameters);
        }
        return access_denied(ctx, message_id, MethodKind::Extrinsic, method_name);
    }

    let namespace = object_path
        .namespace
        .clone()
        .ok_or_else(|| internal_err!("local object path without namespace"))?;

    Ok(Outcome::Request(CimRequest {
        header: request_header(ctx, message_id, namespace),
        operation: Operation::InvokeMethod(InvokeMethodRequest {
            object_path,
            method_name: method_name.to_owned(),
            in_parameters,
        }),
    }))
}

fn method_mismatch(header: &str, method_name: &str) -> HttpError {
    HttpError::header_mismatch(format!(
        "CIMMethod value \"{header}\" does not match method name \"{method_name}\""
    ))
}

/// Map an error raised while reading parameters. CIM faults and unclassified failures become
/// a fault response; XML errors keep propagating.
fn operation_fault(
    ctx: &DispatchContext<'_>,
    message_id: &str,
    kind: MethodKind,
    method_name: &str,
    err: DecodeFault,
) -> Result<Outcome> {
    match err {
        DecodeFault::Cim(e) => fault(ctx, message_id, kind, method_name, e),
        DecodeFault::Internal(message) => {
            warn!("{} failed unexpectedly: {}", method_name, message);
            fault(ctx, message_id, kind, method_name, CimException::invalid_parameter(message))
        }
        other => Err(other),
    }
}

fn fault(
    ctx: &DispatchContext<'_>,
    message_id: &str,
    kind: MethodKind,
    method_name: &str,
    error: CimException,
) -> Result<Outcome> {
    debug!("{} fault for message {}: {}", method_name, message_id, error);
    let body = format_error_response(message_id, kind, method_name, &error)?;
    Ok(Outcome::Respond(HttpResponse::method_response(
        body,
        ctx.message.close_connection,
    )))
}

fn access_denied(
    ctx: &DispatchContext<'_>,
    message_id: &str,
    kind: MethodKind,
    method_name: &str,
) -> Result<Outcome> {
    fault(
        ctx,
        message_id,
        kind,
        method_name,
        CimException::new(CimStatusCode::AccessDenied, "The password has expired"),
    )
}

fn update_expired_password(
    ctx: &DispatchContext<'_>,
    message_id: &str,
    method_name: &str,
    params: &[CimParamValue],
) -> Result<Outcome> {
    let string_param = |name: &str| {
        params
            .iter()
            .find(|param| eq_ignore_case(&param.name, name))
            .and_then(|param| param.value.as_ref())
            .and_then(|value| value.as_str())
            .unwrap_or_default()
    };

    let Some(service) = ctx.password_service else {
        warn!("password update requested but no password service is installed");
        return fault(
            ctx,
            message_id,
            MethodKind::Extrinsic,
            method_name,
            CimException::new(CimStatusCode::AccessDenied, "Password update is not available"),
        );
    };

    let auth = &ctx.message.auth;
    let updated = service.update_expired_password(
        &auth.user_name,
        string_param("OldPassword"),
        string_param("NewPassword"),
        &auth.remote_address,
    );
    if !updated {
        return fault(
            ctx,
            message_id,
            MethodKind::Extrinsic,
            method_name,
            CimException::new(CimStatusCode::AccessDenied, "Password update failed"),
        );
    }

    debug!("expired password updated for user {}", auth.user_name);
    let body = format_return_value_response(message_id, method_name, "uint32", "0")?;
    Ok(Outcome::Respond(HttpResponse::method_response(
        body,
        ctx.message.close_connection,
    )))
}

fn request_header(
    ctx: &DispatchContext<'_>,
    message_id: &str,
    namespace: CimNamespaceName,
) -> RequestHeader {
    let message = ctx.message;
    RequestHeader {
        message_id: message_id.to_owned(),
        namespace,
        queue_id: ctx.output_queue_id,
        return_queue_id: message.queue_id,
        user_name: message.auth.user_name.clone(),
        auth_type: message.auth.auth_type.clone(),
        user_role: message.auth.user_role.clone(),
        remote_address: message.auth.remote_address.clone(),
        http_method: message.method.clone(),
        accept_languages: message.accept_languages.clone(),
        content_languages: message.content_languages.clone(),
        binary_response: ctx.headers.binary_response,
        close_connection: message.close_connection,
    }
}
