use serde::Serialize;
use std::fmt::Write as _;

use crate::err::HttpError;
use crate::http::headers::find_header;
use crate::status::HttpStatus;
use crate::utils::percent_encode;

/// An outbound response, queued back to the transport that delivered the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpResponse {
    pub status: HttpStatus,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub close_connection: bool,
}

impl HttpResponse {
    fn new(status: HttpStatus, mut headers: Vec<(String, String)>, body: Vec<u8>, close_connection: bool) -> Self {
        headers.push(("Content-Length".to_owned(), body.len().to_string()));
        if close_connection {
            headers.push(("Connection".to_owned(), "close".to_owned()));
        }
        HttpResponse {
            status,
            headers,
            body,
            close_connection,
        }
    }

    /// A transport level rejection.
    ///
    /// The detail travels percent-encoded in `PGErrorDetail` and as a plain-text body.
    pub fn http_error(error: &HttpError, close_connection: bool) -> Self {
        let mut headers = Vec::new();
        if let Some(token) = error.cim_error {
            headers.push(("CIMError".to_owned(), token.as_str().to_owned()));
        }
        if !error.detail.is_empty() {
            headers.push(("PGErrorDetail".to_owned(), percent_encode(&error.detail)));
            headers.push((
                "Content-Type".to_owned(),
                "text/plain; charset=utf-8".to_owned(),
            ));
        }
        HttpResponse::new(
            error.status,
            headers,
            error.detail.clone().into_bytes(),
            close_connection,
        )
    }

    /// A CIM-XML `SIMPLERSP` body: status 200, `CIMOperation: MethodResponse`.
    pub fn method_response(body: Vec<u8>, close_connection: bool) -> Self {
        let headers = vec![
            (
                "Content-Type".to_owned(),
                "application/xml; charset=utf-8".to_owned(),
            ),
            ("CIMOperation".to_owned(), "MethodResponse".to_owned()),
        ];
        HttpResponse::new(HttpStatus::OK, headers, body, close_connection)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Serialize as an HTTP/1.1 response.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = String::new();
        let _ = write!(head, "HTTP/1.1 {}\r\n", self.status);
        for (name, value) in &self.headers {
            let _ = write!(head, "{name}: {value}\r\n");
        }
        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}
