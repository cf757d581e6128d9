//! The HTTP envelope around a CIM-XML request, and the responses sent back.

mod headers;
mod message;
mod response;

pub use self::headers::{ContentType, find_cim_header, find_header};
pub use self::message::{AuthInfo, HttpMessage, HttpMethod, LanguageTag};
pub use self::response::HttpResponse;

/// Media type of the OpenPegasus binary encoding, in `Content-Type` and `Accept`.
pub const BINARY_MEDIA_TYPE: &str = "application/x-openpegasus";
