//! Seams to the rest of the server: queues, the binary codec and the password service.

use hashbrown::HashMap as FastMap;
use std::sync::Arc;

use crate::http::HttpResponse;
use crate::request::CimRequest;

/// What the decoder hands on for one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueMessage {
    Request(Box<CimRequest>),
    Response(HttpResponse),
}

pub trait MessageQueue: Send + Sync {
    fn queue_id(&self) -> u32;
    fn enqueue(&self, message: QueueMessage);
}

pub trait QueueDirectory: Send + Sync {
    fn lookup(&self, queue_id: u32) -> Option<Arc<dyn MessageQueue>>;
}

/// Decoder for `application/x-openpegasus` payloads.
pub trait BinaryCodec: Send + Sync {
    /// `None` means the payload is corrupt.
    fn decode_request(&self, buffer: &[u8], queue_id: u32, return_queue_id: u32) -> Option<CimRequest>;
}

/// Changes a password that has expired, on behalf of an `UpdateExpiredPassword` call.
pub trait PasswordService: Send + Sync {
    fn update_expired_password(
        &self,
        user_name: &str,
        old_password: &str,
        new_password: &str,
        remote_address: &str,
    ) -> bool;
}

/// A fixed set of queues keyed by id.
#[derive(Default)]
pub struct QueueRegistry {
    queues: FastMap<u32, Arc<dyn MessageQueue>, ahash::RandomState>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        QueueRegistry::default()
    }

    pub fn register(mut self, queue: Arc<dyn MessageQueue>) -> Self {
        self.queues.insert(queue.queue_id(), queue);
        self
    }
}

impl QueueDirectory for QueueRegistry {
    fn lookup(&self, queue_id: u32) -> Option<Arc<dyn MessageQueue>> {
        self.queues.get(&queue_id).cloned()
    }
}
