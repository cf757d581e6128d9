use thiserror::Error;

use crate::model::CimInstance;
use crate::status::{CimErrorToken, CimStatusCode, HttpStatus};

pub type Result<T> = std::result::Result<T, DecodeFault>;
pub type XmlResult<T> = std::result::Result<T, XmlError>;

/// Errors raised while walking the XML token stream.
///
/// Each variant maps onto exactly one `CIMError` token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    #[error("XML is not well formed (line {line}): {message}")]
    NotWellFormed { line: usize, message: String },

    #[error("validation error (line {line}): {message}")]
    Validation { line: usize, message: String },

    #[error("too many elements (line {line}): more than {limit} elements in request")]
    TooManyElements { line: usize, limit: usize },
}

impl XmlError {
    pub(crate) fn not_well_formed(line: usize, message: impl Into<String>) -> Self {
        XmlError::NotWellFormed {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn validation(line: usize, message: impl Into<String>) -> Self {
        XmlError::Validation {
            line,
            message: message.into(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            XmlError::NotWellFormed { line, .. }
            | XmlError::Validation { line, .. }
            | XmlError::TooManyElements { line, .. } => *line,
        }
    }

    pub fn cim_error(&self) -> CimErrorToken {
        match self {
            XmlError::NotWellFormed { .. } => CimErrorToken::RequestNotWellFormed,
            XmlError::Validation { .. } => CimErrorToken::RequestNotValid,
            XmlError::TooManyElements { .. } => CimErrorToken::RequestWithTooManyElements,
        }
    }
}

/// A typed CIM fault, reported to the client inside an `<ERROR>` element.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct CimException {
    pub code: CimStatusCode,
    pub message: String,
    /// Optional embedded `CIM_Error` style instance (error type, probable cause...).
    pub error_instance: Option<Box<CimInstance>>,
}

impl CimException {
    pub fn new(code: CimStatusCode, message: impl Into<String>) -> Self {
        CimException {
            code,
            message: message.into(),
            error_instance: None,
        }
    }

    pub fn with_error_instance(mut self, instance: CimInstance) -> Self {
        self.error_instance = Some(Box::new(instance));
        self
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(CimStatusCode::InvalidParameter, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(CimStatusCode::NotSupported, message)
    }

    pub fn duplicate_parameter(name: &str) -> Self {
        Self::invalid_parameter(format!("Duplicate IPARAMVALUE \"{name}\" received"))
    }

    pub fn required_parameter_missing(name: &str) -> Self {
        Self::invalid_parameter(format!("Required parameter missing: {name}"))
    }

    /// Used by operations whose required-parameter check is not tied to one name.
    pub fn required_parameters_missing() -> Self {
        Self::invalid_parameter("Required parameter missing")
    }

    pub fn null_value(name: &str) -> Self {
        Self::invalid_parameter(format!(
            "A null value is not valid for IPARAMVALUE \"{name}\""
        ))
    }

    pub fn unrecognized_parameter(name: &str) -> Self {
        Self::not_supported(format!("Unrecognized IPARAMVALUE \"{name}\""))
    }
}

/// A transport level rejection: status line, optional `CIMError` token and detail text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status}: {detail}")]
pub struct HttpError {
    pub status: HttpStatus,
    pub cim_error: Option<CimErrorToken>,
    pub detail: String,
}

impl HttpError {
    pub fn new(status: HttpStatus, cim_error: Option<CimErrorToken>, detail: impl Into<String>) -> Self {
        HttpError {
            status,
            cim_error,
            detail: detail.into(),
        }
    }

    pub fn bad_request(cim_error: Option<CimErrorToken>, detail: impl Into<String>) -> Self {
        Self::new(HttpStatus::BAD_REQUEST, cim_error, detail)
    }

    pub fn not_implemented(cim_error: CimErrorToken, detail: impl Into<String>) -> Self {
        Self::new(HttpStatus::NOT_IMPLEMENTED, Some(cim_error), detail)
    }

    pub fn header_mismatch(detail: impl Into<String>) -> Self {
        Self::bad_request(Some(CimErrorToken::HeaderMismatch), detail)
    }
}

impl From<XmlError> for HttpError {
    fn from(err: XmlError) -> Self {
        HttpError::bad_request(Some(err.cim_error()), err.to_string())
    }
}

/// Everything that can stop the decode of a single message.
///
/// The dispatcher matches on the variant to decide whether the client gets a raw HTTP error
/// or a CIM-XML fault envelope.
#[derive(Debug, Error)]
pub enum DecodeFault {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error(transparent)]
    Cim(#[from] CimException),

    #[error("an unexpected error has occurred: {0}")]
    Internal(String),
}

/// Generic error helper for internal failures, inspired by failure's `format_err!` macro.
#[macro_export]
macro_rules! internal_err {
   ($($arg:tt)*) => { $crate::err::DecodeFault::Internal(format!($($arg)*)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn xml_errors_map_to_distinct_tokens() {
        assert_eq!(
            XmlError::not_well_formed(1, "x").cim_error(),
            CimErrorToken::RequestNotWellFormed
        );
        assert_eq!(
            XmlError::validation(1, "x").cim_error(),
            CimErrorToken::RequestNotValid
        );
        assert_eq!(
            XmlError::TooManyElements { line: 3, limit: 2 }.cim_error(),
            CimErrorToken::RequestWithTooManyElements
        );
    }

    #[test]
    fn http_error_from_xml_error_keeps_line() {
        let err: HttpError = XmlError::validation(7, "expected CIM element").into();
        assert_eq!(err.status, HttpStatus::BAD_REQUEST);
        assert_eq!(err.cim_error, Some(CimErrorToken::RequestNotValid));
        assert!(err.detail.contains("line 7"));
    }
}
