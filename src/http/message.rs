use log::debug;
use serde::Serialize;
use std::fmt;

use crate::err::HttpError;
use crate::http::headers::find_header;
use crate::utils::eq_ignore_case;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HttpMethod {
    Post,
    MPost,
    /// Anything else; rejected by the decoder.
    Other(String),
}

impl HttpMethod {
    pub fn parse(token: &str) -> HttpMethod {
        match token {
            "POST" => HttpMethod::Post,
            "M-POST" => HttpMethod::MPost,
            other => HttpMethod::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Post => f.write_str("POST"),
            HttpMethod::MPost => f.write_str("M-POST"),
            HttpMethod::Other(other) => f.write_str(other),
        }
    }
}

/// Caller identity, filled in by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthInfo {
    pub user_name: String,
    pub user_role: String,
    pub auth_type: String,
    pub remote_address: String,
}

/// One `Accept-Language` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageTag {
    pub tag: String,
    pub quality: f32,
}

/// A fully buffered inbound HTTP request, as handed over by the transport.
#[derive(Debug, Clone)]
pub struct HttpMessage {
    pub method: HttpMethod,
    pub uri: String,
    pub http_version: String,
    /// In wire order, duplicates kept.
    pub headers: Vec<(String, String)>,
    /// The whole message: request line, headers and body.
    pub content: Vec<u8>,
    /// Offset of the first byte after the blank line.
    pub header_len: usize,
    /// Sorted by descending quality.
    pub accept_languages: Vec<LanguageTag>,
    pub content_languages: Vec<String>,
    pub auth: AuthInfo,
    pub close_connection: bool,
    pub expired_password: bool,
    /// Transport queue that responses go back to.
    pub queue_id: u32,
}

fn bad_request(detail: impl Into<String>) -> HttpError {
    HttpError::bad_request(None, detail)
}

/// Locate the blank line ending the head, whichever line ending reaches it first.
fn find_header_end(bytes: &[u8]) -> Option<(usize, usize)> {
    let crlf = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| (pos, pos + 4));
    let lf = bytes
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|pos| (pos, pos + 2));

    match (crlf, lf) {
        (Some(crlf), Some(lf)) if lf.0 < crlf.0 => Some(lf),
        (Some(crlf), _) => Some(crlf),
        (None, lf) => lf,
    }
}

impl HttpMessage {
    /// Split a raw request into request line, headers and body.
    pub fn parse(bytes: &[u8], queue_id: u32) -> Result<HttpMessage, HttpError> {
        let (head_end, header_len) =
            find_header_end(bytes).ok_or_else(|| bad_request("Incomplete HTTP message header"))?;
        let head = std::str::from_utf8(&bytes[..head_end])
            .map_err(|_| bad_request("HTTP message header is not valid UTF-8"))?;

        let mut lines = head.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

        let request_line = lines.next().unwrap_or_default();
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        let [method, uri, http_version] = parts[..] else {
            return Err(bad_request(format!("Malformed request line \"{request_line}\"")));
        };

        let mut headers = Vec::new();
        for line in lines.filter(|l| !l.is_empty()) {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| bad_request(format!("Malformed header line \"{line}\"")))?;
            headers.push((name.trim().to_owned(), value.trim().to_owned()));
        }

        let accept_languages = match find_header(&headers, "Accept-Language") {
            Some(value) => parse_accept_languages(value)?,
            None => Vec::new(),
        };
        let content_languages = match find_header(&headers, "Content-Language") {
            Some(value) => parse_content_languages(value)?,
            None => Vec::new(),
        };
        let close_connection = find_header(&headers, "Connection")
            .is_some_and(|v| v.split(',').any(|t| eq_ignore_case(t.trim(), "close")));

        debug!(
            "parsed {} {} {} with {} headers, {} bytes",
            method,
            uri,
            http_version,
            headers.len(),
            bytes.len()
        );

        Ok(HttpMessage {
            method: HttpMethod::parse(method),
            uri: uri.to_owned(),
            http_version: http_version.to_owned(),
            headers,
            content: bytes.to_vec(),
            header_len,
            accept_languages,
            content_languages,
            auth: AuthInfo::default(),
            close_connection,
            expired_password: false,
            queue_id,
        })
    }

    pub fn with_auth(mut self, auth: AuthInfo) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_expired_password(mut self, expired_password: bool) -> Self {
        self.expired_password = expired_password;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Declared body length, or everything after the header block when `Content-Length` is
    /// absent.
    pub fn content_length(&self) -> Result<usize, HttpError> {
        let available = self.content.len().saturating_sub(self.header_len);
        let length = match self.header("Content-Length") {
            None => return Ok(available),
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| bad_request(format!("Invalid Content-Length header \"{value}\"")))?,
        };
        if length > available {
            return Err(bad_request(format!(
                "Content-Length {length} exceeds the {available} bytes received"
            )));
        }
        Ok(length)
    }
}

fn is_language_tag(tag: &str) -> bool {
    let mut subtags = tag.split('-');
    let primary = subtags.next().unwrap_or_default();
    (1..=8).contains(&primary.len())
        && primary.bytes().all(|b| b.is_ascii_alphabetic())
        && subtags.all(|s| (1..=8).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphanumeric()))
}

fn parse_accept_languages(value: &str) -> Result<Vec<LanguageTag>, HttpError> {
    let malformed = || bad_request(format!("Malformed Accept-Language header \"{value}\""));

    let mut tags = Vec::new();
    for item in value.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        let mut parts = item.split(';');
        let tag = parts.next().unwrap_or_default().trim();
        if tag != "*" && !is_language_tag(tag) {
            return Err(malformed());
        }

        let mut quality = 1.0_f32;
        for param in parts {
            let (name, q) = param.split_once('=').ok_or_else(malformed)?;
            if !name.trim().eq_ignore_ascii_case("q") {
                return Err(malformed());
            }
            quality = q
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|q| (0.0..=1.0).contains(q))
                .ok_or_else(malformed)?;
        }

        tags.push(LanguageTag {
            tag: tag.to_owned(),
            quality,
        });
    }

    tags.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    Ok(tags)
}

fn parse_content_languages(value: &str) -> Result<Vec<String>, HttpError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|tag| {
            if is_language_tag(tag) {
                Ok(tag.to_owned())
            } else {
                Err(bad_request(format!("Malformed Content-Language header \"{value}\"")))
            }
        })
        .collect()
}
