//! Response handler capability surface.
//!
//! # Responsibilities
//! - Define the lifecycle callback trait executions drive
//! - Model transfer progress as one event per chunk
//! - Provide ready-made handlers: channel forwarding, text and JSON decoding
//!
//! Callback order per execution: `on_send`, upload progress (body present
//! only), download progress, exactly one of `on_success`/`on_failure` (or
//! neither on early failure), then `before_callback`, `before_finish`,
//! `on_finish`. A cancelled execution stops firing at the cancellation
//! point.

mod channel;
mod json;
mod string;

pub use channel::{ChannelHandler, HandlerEvent};
pub use json::{JsonOutcome, JsonResponseHandler};
pub use string::{StringResponseHandler, TextOutcome};

use crate::request::ConnectionInfo;

/// Progress for one transferred chunk.
///
/// One event covers both legacy progress notification shapes: consumers
/// that only care about running totals read `transferred`/`total`, while
/// chunk-aware consumers also read `chunk` (and its length).
#[derive(Debug)]
pub struct TransferEvent<'a> {
    /// Bytes of this chunk.
    pub chunk: &'a [u8],
    /// Running total including this chunk.
    pub transferred: u64,
    /// Declared total length, `None` when the peer did not declare one.
    pub total: Option<u64>,
}

impl TransferEvent<'_> {
    pub fn chunk_len(&self) -> usize {
        self.chunk.len()
    }
}

/// Lifecycle callbacks for one execution. All methods default to no-ops.
pub trait ResponseHandler: Send {
    /// Fired once before any network I/O, on the caller's task.
    fn on_send(&mut self, info: &ConnectionInfo) {
        let _ = info;
    }

    /// Fired once per uploaded chunk.
    fn on_upload_progress(&mut self, event: &TransferEvent<'_>) {
        let _ = event;
    }

    /// Fired once per downloaded chunk, plus one synthetic final event
    /// carrying the actual total in both positions.
    fn on_download_progress(&mut self, event: &TransferEvent<'_>) {
        let _ = event;
    }

    /// Terminal callback for a 2xx status.
    fn on_success(&mut self, body: &[u8], info: &ConnectionInfo) {
        let _ = (body, info);
    }

    /// Terminal callback for any other resolved status.
    fn on_failure(&mut self, body: &[u8], info: &ConnectionInfo) {
        let _ = (body, info);
    }

    /// First of the finish family, after transport resources are released.
    fn before_callback(&mut self, info: &ConnectionInfo) {
        let _ = info;
    }

    /// Second of the finish family.
    fn before_finish(&mut self, info: &ConnectionInfo) {
        let _ = info;
    }

    /// Last callback of the execution.
    fn on_finish(&mut self, info: &ConnectionInfo) {
        let _ = info;
    }
}
