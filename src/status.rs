use serde::Serialize;
use std::fmt;

/// CIM status codes as defined by DSP0200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum CimStatusCode {
    Failed = 1,
    AccessDenied = 2,
    InvalidNamespace = 3,
    InvalidParameter = 4,
    InvalidClass = 5,
    NotFound = 6,
    NotSupported = 7,
    ClassHasChildren = 8,
    ClassHasInstances = 9,
    InvalidSuperclass = 10,
    AlreadyExists = 11,
    NoSuchProperty = 12,
    TypeMismatch = 13,
    QueryLanguageNotSupported = 14,
    InvalidQuery = 15,
    MethodNotAvailable = 16,
    MethodNotFound = 17,
    NamespaceNotEmpty = 20,
    InvalidEnumerationContext = 21,
    InvalidOperationTimeout = 22,
    PullHasBeenAbandoned = 23,
    PullCannotBeAbandoned = 24,
    FilteredEnumerationNotSupported = 25,
    ContinuationOnErrorNotSupported = 26,
    ServerLimitsExceeded = 27,
    ServerIsShuttingDown = 28,
}

impl CimStatusCode {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// The symbolic `CIM_ERR_*` name.
    pub fn as_str(self) -> &'static str {
        match self {
            CimStatusCode::Failed => "CIM_ERR_FAILED",
            CimStatusCode::AccessDenied => "CIM_ERR_ACCESS_DENIED",
            CimStatusCode::InvalidNamespace => "CIM_ERR_INVALID_NAMESPACE",
            CimStatusCode::InvalidParameter => "CIM_ERR_INVALID_PARAMETER",
            CimStatusCode::InvalidClass => "CIM_ERR_INVALID_CLASS",
            CimStatusCode::NotFound => "CIM_ERR_NOT_FOUND",
            CimStatusCode::NotSupported => "CIM_ERR_NOT_SUPPORTED",
            CimStatusCode::ClassHasChildren => "CIM_ERR_CLASS_HAS_CHILDREN",
            CimStatusCode::ClassHasInstances => "CIM_ERR_CLASS_HAS_INSTANCES",
            CimStatusCode::InvalidSuperclass => "CIM_ERR_INVALID_SUPERCLASS",
            CimStatusCode::AlreadyExists => "CIM_ERR_ALREADY_EXISTS",
            CimStatusCode::NoSuchProperty => "CIM_ERR_NO_SUCH_PROPERTY",
            CimStatusCode::TypeMismatch => "CIM_ERR_TYPE_MISMATCH",
            CimStatusCode::QueryLanguageNotSupported => "CIM_ERR_QUERY_LANGUAGE_NOT_SUPPORTED",
            CimStatusCode::InvalidQuery => "CIM_ERR_INVALID_QUERY",
            CimStatusCode::MethodNotAvailable => "CIM_ERR_METHOD_NOT_AVAILABLE",
            CimStatusCode::MethodNotFound => "CIM_ERR_METHOD_NOT_FOUND",
            CimStatusCode::NamespaceNotEmpty => "CIM_ERR_NAMESPACE_NOT_EMPTY",
            CimStatusCode::InvalidEnumerationContext => "CIM_ERR_INVALID_ENUMERATION_CONTEXT",
            CimStatusCode::InvalidOperationTimeout => "CIM_ERR_INVALID_OPERATION_TIMEOUT",
            CimStatusCode::PullHasBeenAbandoned => "CIM_ERR_PULL_HAS_BEEN_ABANDONED",
            CimStatusCode::PullCannotBeAbandoned => "CIM_ERR_PULL_CANNOT_BE_ABANDONED",
            CimStatusCode::FilteredEnumerationNotSupported => {
                "CIM_ERR_FILTERED_ENUMERATION_NOT_SUPPORTED"
            }
            CimStatusCode::ContinuationOnErrorNotSupported => {
                "CIM_ERR_CONTINUATION_ON_ERROR_NOT_SUPPORTED"
            }
            CimStatusCode::ServerLimitsExceeded => "CIM_ERR_SERVER_LIMITS_EXCEEDED",
            CimStatusCode::ServerIsShuttingDown => "CIM_ERR_SERVER_IS_SHUTTING_DOWN",
        }
    }
}

impl fmt::Display for CimStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Values of the `CIMError` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CimErrorToken {
    UnsupportedOperation,
    MultipleRequestsUnsupported,
    HeaderMismatch,
    UnsupportedCimVersion,
    UnsupportedDtdVersion,
    UnsupportedProtocolVersion,
    RequestNotValid,
    RequestNotWellFormed,
    RequestWithTooManyElements,
}

impl CimErrorToken {
    pub fn as_str(self) -> &'static str {
        match self {
            CimErrorToken::UnsupportedOperation => "unsupported-operation",
            CimErrorToken::MultipleRequestsUnsupported => "multiple-requests-unsupported",
            CimErrorToken::HeaderMismatch => "header-mismatch",
            CimErrorToken::UnsupportedCimVersion => "unsupported-cim-version",
            CimErrorToken::UnsupportedDtdVersion => "unsupported-dtd-version",
            CimErrorToken::UnsupportedProtocolVersion => "unsupported-protocol-version",
            CimErrorToken::RequestNotValid => "request-not-valid",
            CimErrorToken::RequestNotWellFormed => "request-not-well-formed",
            CimErrorToken::RequestWithTooManyElements => "request-with-too-many-elements",
        }
    }
}

impl fmt::Display for CimErrorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP status line (code + reason phrase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HttpStatus {
    pub code: u16,
    pub reason: &'static str,
}

impl HttpStatus {
    pub const OK: HttpStatus = HttpStatus::new(200, "OK");
    pub const BAD_REQUEST: HttpStatus = HttpStatus::new(400, "Bad Request");
    pub const METHOD_NOT_ALLOWED: HttpStatus = HttpStatus::new(405, "Method Not Allowed");
    pub const INTERNAL_SERVER_ERROR: HttpStatus = HttpStatus::new(500, "Internal Server Error");
    pub const NOT_IMPLEMENTED: HttpStatus = HttpStatus::new(501, "Not Implemented");
    pub const SERVICE_UNAVAILABLE: HttpStatus = HttpStatus::new(503, "Service Unavailable");

    pub const fn new(code: u16, reason: &'static str) -> Self {
        HttpStatus { code, reason }
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}
