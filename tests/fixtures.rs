#![allow(dead_code)]
use std::sync::{Arc, Mutex, Once};

use cimxml::{
    CimOperationRequestDecoder, CimRequest, DecoderSettings, HttpMessage, HttpResponse,
    MessageQueue, QueueMessage, QueueRegistry,
};

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

pub const TRANSPORT_QUEUE: u32 = 10;
pub const DISPATCHER_QUEUE: u32 = 20;

pub struct RecordingQueue {
    id: u32,
    messages: Mutex<Vec<QueueMessage>>,
}

impl RecordingQueue {
    pub fn new(id: u32) -> Arc<Self> {
        Arc::new(RecordingQueue {
            id,
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn take(&self) -> Vec<QueueMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }
}

impl MessageQueue for RecordingQueue {
    fn queue_id(&self) -> u32 {
        self.id
    }

    fn enqueue(&self, message: QueueMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

/// A decoder wired to two recording queues.
pub struct Harness {
    pub decoder: CimOperationRequestDecoder,
    pub requests: Arc<RecordingQueue>,
    pub responses: Arc<RecordingQueue>,
}

impl Harness {
    pub fn new() -> Self {
        Harness::with(|decoder| decoder)
    }

    pub fn with_settings(settings: DecoderSettings) -> Self {
        Harness::build(settings, |decoder| decoder)
    }

    pub fn with(
        configure: impl FnOnce(CimOperationRequestDecoder) -> CimOperationRequestDecoder,
    ) -> Self {
        Harness::build(DecoderSettings::default(), configure)
    }

    fn build(
        settings: DecoderSettings,
        configure: impl FnOnce(CimOperationRequestDecoder) -> CimOperationRequestDecoder,
    ) -> Self {
        ensure_env_logger_initialized();

        let requests = RecordingQueue::new(DISPATCHER_QUEUE);
        let responses = RecordingQueue::new(TRANSPORT_QUEUE);
        let directory = QueueRegistry::new().register(responses.clone());
        let decoder = configure(CimOperationRequestDecoder::new(
            requests.clone(),
            Arc::new(directory),
            settings,
        ));

        Harness {
            decoder,
            requests,
            responses,
        }
    }

    /// Feed one message and collect exactly one outcome.
    pub fn send(&self, message: &HttpMessage) -> Delivered {
        self.decoder.handle_http_message(message);

        let mut requests = self.requests.take();
        let mut responses = self.responses.take();
        match (requests.len(), responses.len()) {
            (1, 0) => match requests.remove(0) {
                QueueMessage::Request(request) => Delivered::Request(request),
                other => panic!("unexpected message on the request queue: {other:?}"),
            },
            (0, 1) => match responses.remove(0) {
                QueueMessage::Response(response) => Delivered::Response(response),
                other => panic!("unexpected message on the response queue: {other:?}"),
            },
            (r, s) => panic!("expected exactly one outcome, got {r} requests and {s} responses"),
        }
    }

    pub fn send_raw(&self, raw: &[u8]) -> Delivered {
        self.send(&HttpMessage::parse(raw, TRANSPORT_QUEUE).unwrap())
    }
}

#[derive(Debug)]
pub enum Delivered {
    Request(Box<CimRequest>),
    Response(HttpResponse),
}

impl Delivered {
    pub fn request(self) -> Box<CimRequest> {
        match self {
            Delivered::Request(request) => request,
            Delivered::Response(response) => panic!(
                "expected a request, got {} {:?}: {}",
                response.status,
                response.headers,
                response.body_text()
            ),
        }
    }

    pub fn response(self) -> HttpResponse {
        match self {
            Delivered::Response(response) => response,
            Delivered::Request(request) => panic!("expected a response, got {request:?}"),
        }
    }
}

/// Raw HTTP request bytes with a correct `Content-Length`.
pub fn raw_request(request_line: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut raw = format!("{request_line}\r\n");
    for (name, value) in headers {
        raw.push_str(&format!("{name}: {value}\r\n"));
    }
    raw.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

    let mut bytes = raw.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// Headers of a well-formed simple operation request.
pub fn operation_headers<'a>(method: &'a str, object: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("Host", "localhost:5988"),
        ("Content-Type", "application/xml; charset=\"utf-8\""),
        ("CIMOperation", "MethodCall"),
        ("CIMMethod", method),
        ("CIMObject", object),
    ]
}

pub fn post(headers: &[(&str, &str)], body: &str) -> Vec<u8> {
    raw_request("POST /cimom HTTP/1.1", headers, body.as_bytes())
}

/// Wrap a method call in `CIM`/`MESSAGE`/`SIMPLEREQ`.
pub fn simple_req(call: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0">"#,
            r#"<MESSAGE ID="1001" PROTOCOLVERSION="1.0">"#,
            "<SIMPLEREQ>{}</SIMPLEREQ></MESSAGE></CIM>"
        ),
        call
    )
}

pub const LOCAL_NAMESPACE: &str =
    r#"<LOCALNAMESPACEPATH><NAMESPACE NAME="root"/><NAMESPACE NAME="cimv2"/></LOCALNAMESPACEPATH>"#;

/// An `IMETHODCALL` against `root/cimv2`.
pub fn intrinsic_body(method: &str, params: &str) -> String {
    simple_req(&format!(
        r#"<IMETHODCALL NAME="{method}">{LOCAL_NAMESPACE}{params}</IMETHODCALL>"#
    ))
}

pub fn iparam(name: &str, content: &str) -> String {
    format!(r#"<IPARAMVALUE NAME="{name}">{content}</IPARAMVALUE>"#)
}

pub fn class_name(name: &str) -> String {
    format!(r#"<CLASSNAME NAME="{name}"/>"#)
}

pub fn value(text: &str) -> String {
    format!("<VALUE>{text}</VALUE>")
}

/// A complete intrinsic request with matching headers.
pub fn intrinsic_request(method: &str, params: &str) -> Vec<u8> {
    post(
        &operation_headers(method, "root/cimv2"),
        &intrinsic_body(method, params),
    )
}

pub fn sample_get_class_request() -> Vec<u8> {
    intrinsic_request("GetClass", &iparam("ClassName", &class_name("CIM_Foo")))
}
