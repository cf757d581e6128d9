//! The CIM-XML operation request decoder.
//!
//! [`CimOperationRequestDecoder`] takes one buffered [`HttpMessage`], validates its headers,
//! decodes the XML (or binary) payload and either forwards a typed [`CimRequest`] to the
//! output queue or sends exactly one error response back to the transport queue.
//!
//! [`CimRequest`]: crate::request::CimRequest

mod dispatch;
mod headers;
pub(crate) mod operations;
pub(crate) mod params;

pub use self::headers::HeaderValues;

use log::{debug, error, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::decoder::dispatch::{DispatchContext, dispatch};
use crate::err::{DecodeFault, HttpError, Result};
use crate::http::{HttpMessage, HttpMethod, HttpResponse};
use crate::queue::{BinaryCodec, MessageQueue, PasswordService, QueueDirectory, QueueMessage};
use crate::settings::DecoderSettings;
use crate::status::{CimErrorToken, HttpStatus};
use crate::utils::check_utf8;

/// Binary payloads start on this boundary, relative to the start of the message buffer.
const BINARY_ALIGNMENT: usize = 8;

pub struct CimOperationRequestDecoder {
    output_queue: Arc<dyn MessageQueue>,
    directory: Arc<dyn QueueDirectory>,
    settings: DecoderSettings,
    terminating: Arc<AtomicBool>,
    binary_codec: Option<Arc<dyn BinaryCodec>>,
    password_service: Option<Arc<dyn PasswordService>>,
}

impl CimOperationRequestDecoder {
    /// Decoded requests go to `output_queue`; responses are sent to the queue named by each
    /// message's `queue_id`, resolved through `directory`.
    pub fn new(
        output_queue: Arc<dyn MessageQueue>,
        directory: Arc<dyn QueueDirectory>,
        settings: DecoderSettings,
    ) -> Self {
        CimOperationRequestDecoder {
            output_queue,
            directory,
            settings,
            terminating: Arc::new(AtomicBool::new(false)),
            binary_codec: None,
            password_service: None,
        }
    }

    /// Share the server's shutdown flag. While it is set every message gets a 503.
    pub fn with_terminating_flag(mut self, terminating: Arc<AtomicBool>) -> Self {
        self.terminating = terminating;
        self
    }

    pub fn with_binary_codec(mut self, codec: Arc<dyn BinaryCodec>) -> Self {
        self.binary_codec = Some(codec);
        self
    }

    pub fn with_password_service(mut self, service: Arc<dyn PasswordService>) -> Self {
        self.password_service = Some(service);
        self
    }

    pub fn settings(&self) -> &DecoderSettings {
        &self.settings
    }

    /// Decode `message` and deliver the outcome.
    pub fn handle_http_message(&self, message: &HttpMessage) {
        match self.decode(message) {
            QueueMessage::Request(request) => {
                debug!(
                    "enqueue {} (message {}) to queue {}",
                    request.operation_name(),
                    request.header.message_id,
                    self.output_queue.queue_id()
                );
                self.output_queue.enqueue(QueueMessage::Request(request));
            }
            QueueMessage::Response(response) => match self.directory.lookup(message.queue_id) {
                Some(queue) => queue.enqueue(QueueMessage::Response(response)),
                None => error!(
                    "response queue {} not found, dropping {} response",
                    message.queue_id, response.status
                ),
            },
        }
    }

    /// Decode `message` without delivering anything.
    ///
    /// The result is either the request to forward or the single response to send back.
    pub fn decode(&self, message: &HttpMessage) -> QueueMessage {
        match self.try_decode(message) {
            Ok(outcome) => outcome,
            Err(fault) => QueueMessage::Response(fault_response(fault, message.close_connection)),
        }
    }

    fn try_decode(&self, message: &HttpMessage) -> Result<QueueMessage> {
        if self.terminating.load(Ordering::Relaxed) {
            return Err(HttpError::new(
                HttpStatus::SERVICE_UNAVAILABLE,
                None,
                "CIM server is shutting down",
            )
            .into());
        }

        if !matches!(message.method, HttpMethod::Post | HttpMethod::MPost) {
            return Err(HttpError::new(
                HttpStatus::METHOD_NOT_ALLOWED,
                None,
                format!("HTTP method {} is not supported", message.method),
            )
            .into());
        }

        let binary_accepted = self.settings.is_binary_enabled() && self.binary_codec.is_some();
        let headers = HeaderValues::parse(message, binary_accepted)?;

        let content_length = message.content_length()?;
        let start = message.content.len() - content_length;

        if headers.is_binary() {
            return self.decode_binary(message, &headers, start);
        }

        let payload = &message.content[start..];
        let body = check_utf8(payload).map_err(|violation| {
            HttpError::bad_request(
                Some(CimErrorToken::RequestNotValid),
                format!("Invalid UTF-8 character detected at offset {}", violation.offset),
            )
        })?;

        let ctx = DispatchContext {
            message,
            headers: &headers,
            settings: &self.settings,
            password_service: self.password_service.as_deref(),
            output_queue_id: self.output_queue.queue_id(),
        };
        dispatch(&ctx, body)
    }

    fn decode_binary(
        &self,
        message: &HttpMessage,
        headers: &HeaderValues,
        start: usize,
    ) -> Result<QueueMessage> {
        let codec = self
            .binary_codec
            .as_ref()
            .ok_or_else(|| HttpError::bad_request(None, "Binary request encoding is not enabled"))?;

        let aligned = start.next_multiple_of(BINARY_ALIGNMENT).min(message.content.len());
        let payload = &message.content[aligned..];

        let mut request = codec
            .decode_request(payload, self.output_queue.queue_id(), message.queue_id)
            .ok_or_else(|| {
                warn!("corrupt binary request of {} bytes", payload.len());
                HttpError::bad_request(None, "Corrupt binary request message")
            })?;

        request.header.binary_response = headers.binary_response;
        request.header.close_connection = message.close_connection;
        Ok(QueueMessage::Request(Box::new(request)))
    }
}

fn fault_response(fault: DecodeFault, close_connection: bool) -> HttpResponse {
    match fault {
        DecodeFault::Http(err) => {
            debug!("rejecting request: {}", err);
            HttpResponse::http_error(&err, close_connection)
        }
        DecodeFault::Xml(err) => {
            debug!("rejecting request body: {}", err);
            HttpResponse::http_error(&HttpError::from(err), close_connection)
        }
        DecodeFault::Cim(err) => {
            error!("CIM fault escaped the method dispatcher: {}", err);
            internal_server_error(err.to_string(), close_connection)
        }
        DecodeFault::Internal(message) => {
            error!("internal error while decoding request: {}", message);
            internal_server_error(message, close_connection)
        }
    }
}

fn internal_server_error(detail: String, close_connection: bool) -> HttpResponse {
    HttpResponse::http_error(
        &HttpError::new(HttpStatus::INTERNAL_SERVER_ERROR, None, detail),
        close_connection,
    )
}
