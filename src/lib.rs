#![deny(unused_must_use)]
#![forbid(unsafe_code)]
//! Decoder and dispatcher for DMTF CIM-XML operation requests (CIM Operations over HTTP).
//!
//! A transport hands each fully buffered HTTP request to
//! [`CimOperationRequestDecoder::handle_http_message`]. The decoder validates the CIM
//! extension headers, parses the `SIMPLEREQ` body, cross-checks it against the headers and
//! either enqueues a typed [`CimRequest`] or answers with an error response.

pub mod decoder;
pub mod err;
pub mod http;
pub mod model;
pub mod queue;
pub mod request;
pub mod settings;
pub mod status;
pub mod utils;
pub mod xml;

pub use decoder::{CimOperationRequestDecoder, HeaderValues};
pub use err::{CimException, DecodeFault, HttpError, XmlError};
pub use http::{AuthInfo, HttpMessage, HttpMethod, HttpResponse};
pub use queue::{
    BinaryCodec, MessageQueue, PasswordService, QueueDirectory, QueueMessage, QueueRegistry,
};
pub use request::{CimRequest, Operation, RequestHeader};
pub use settings::DecoderSettings;
pub use status::{CimErrorToken, CimStatusCode, HttpStatus};

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
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
