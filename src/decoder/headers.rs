use log::debug;

use crate::err::HttpError;
use crate::http::{BINARY_MEDIA_TYPE, ContentType, HttpMessage, find_cim_header, find_header};
use crate::status::CimErrorToken;
use crate::utils::{eq_ignore_case, percent_decode};

/// Header values of one request, validated in wire-protocol order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderValues {
    /// `CIMProtocolVersion`, `1.0` when absent. Checked against the body later.
    pub protocol_version: String,
    /// Percent-decoded `CIMMethod`.
    pub cim_method: Option<String>,
    /// Percent-decoded `CIMObject`.
    pub cim_object: Option<String>,
    pub content_type: ContentType,
    /// `Pragma: UpdateExpiredPassword`.
    pub update_expired_password: bool,
    /// The client accepts the binary encoding in responses.
    pub binary_response: bool,
}

impl HeaderValues {
    /// Validate the request headers. `binary_accepted` says whether a binary payload may be
    /// decoded at all.
    pub fn parse(message: &HttpMessage, binary_accepted: bool) -> Result<HeaderValues, HttpError> {
        let headers = &message.headers;

        if message.http_version.eq_ignore_ascii_case("HTTP/1.1")
            && find_header(headers, "Host").is_none()
        {
            return Err(HttpError::bad_request(None, "HTTP/1.1 request without a Host header"));
        }

        match find_cim_header(headers, "CIMOperation") {
            Some(value) if eq_ignore_case(value.trim(), "MethodCall") => {}
            Some(value) => {
                return Err(HttpError::bad_request(
                    Some(CimErrorToken::UnsupportedOperation),
                    format!("CIMOperation value \"{value}\" is not supported"),
                ));
            }
            None => {
                return Err(HttpError::bad_request(
                    Some(CimErrorToken::UnsupportedOperation),
                    "CIMOperation header missing",
                ));
            }
        }

        if find_cim_header(headers, "CIMBatch").is_some() {
            return Err(HttpError::not_implemented(
                CimErrorToken::MultipleRequestsUnsupported,
                "Multiple requests are not supported",
            ));
        }

        let protocol_version = find_cim_header(headers, "CIMProtocolVersion")
            .map(|v| v.trim().to_owned())
            .unwrap_or_else(|| "1.0".to_owned());

        let update_expired_password =
            find_header(headers, "Pragma").is_some_and(|v| v.contains("UpdateExpiredPassword"));

        let cim_method = decode_cim_header(headers, "CIMMethod")?;
        let cim_object = decode_cim_header(headers, "CIMObject")?;

        let content_type = parse_content_type(headers, binary_accepted)?;

        let binary_response = find_header(headers, "Accept").is_some_and(|accept| {
            accept.split(',').any(|range| {
                range
                    .split(';')
                    .next()
                    .is_some_and(|media| media.trim().eq_ignore_ascii_case(BINARY_MEDIA_TYPE))
            })
        });

        Ok(HeaderValues {
            protocol_version,
            cim_method,
            cim_object,
            content_type,
            update_expired_password,
            binary_response,
        })
    }

    pub fn is_binary(&self) -> bool {
        self.content_type.is_binary()
    }
}

fn decode_cim_header(headers: &[(String, String)], name: &str) -> Result<Option<String>, HttpError> {
    let Some(value) = find_cim_header(headers, name) else {
        return Ok(None);
    };
    if value.trim().is_empty() {
        return Err(HttpError::header_mismatch(format!("{name} header is empty")));
    }
    percent_decode(value.trim()).map(Some).map_err(|e| {
        debug!("{} header \"{}\": {}", name, value, e);
        HttpError::header_mismatch(format!("{name} value \"{value}\" is not correctly encoded"))
    })
}

fn parse_content_type(
    headers: &[(String, String)],
    binary_accepted: bool,
) -> Result<ContentType, HttpError> {
    let raw = find_header(headers, "Content-Type")
        .ok_or_else(|| HttpError::bad_request(None, "Content-Type header missing"))?;
    let bad = || HttpError::bad_request(None, format!("Unsupported Content-Type \"{raw}\""));

    let content_type = ContentType::parse(raw).ok_or_else(bad)?;
    if content_type.is_xml() {
        match content_type.charset.as_deref() {
            None | Some("utf-8") => Ok(content_type),
            Some(_) => Err(bad()),
        }
    } else if content_type.is_binary() {
        if binary_accepted {
            Ok(content_type)
        } else {
            Err(HttpError::bad_request(None, "Binary request encoding is not enabled"))
        }
    } else {
        Err(bad())
    }
}
