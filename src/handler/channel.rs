//! Channel-forwarding handler.

use tokio::sync::mpsc;

use crate::handler::{ResponseHandler, TransferEvent};
use crate::request::ConnectionInfo;

/// Owned snapshot of one lifecycle callback.
#[derive(Debug, Clone)]
pub enum HandlerEvent {
    Send { info: ConnectionInfo },
    UploadProgress {
        chunk_len: usize,
        transferred: u64,
        total: Option<u64>,
    },
    DownloadProgress {
        chunk_len: usize,
        transferred: u64,
        total: Option<u64>,
    },
    Success { body: Vec<u8>, info: ConnectionInfo },
    Failure { body: Vec<u8>, info: ConnectionInfo },
    BeforeCallback { info: ConnectionInfo },
    BeforeFinish { info: ConnectionInfo },
    Finish { info: ConnectionInfo },
}

/// Re-emits every callback as an owned [`HandlerEvent`] over an unbounded
/// channel, for consumption outside the execution task.
///
/// Sends ignore a dropped receiver: an execution must not fail because the
/// observer went away.
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<HandlerEvent>,
}

impl ChannelHandler {
    /// Create a handler and the receiving half for its events.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HandlerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: HandlerEvent) {
        let _ = self.tx.send(event);
    }
}

impl ResponseHandler for ChannelHandler {
    fn on_send(&mut self, info: &ConnectionInfo) {
        self.emit(HandlerEvent::Send { info: info.clone() });
    }

    fn on_upload_progress(&mut self, event: &TransferEvent<'_>) {
        self.emit(HandlerEvent::UploadProgress {
            chunk_len: event.chunk_len(),
            transferred: event.transferred,
            total: event.total,
        });
    }

    fn on_download_progress(&mut self, event: &TransferEvent<'_>) {
        self.emit(HandlerEvent::DownloadProgress {
            chunk_len: event.chunk_len(),
            transferred: event.transferred,
            total: event.total,
        });
    }

    fn on_success(&mut self, body: &[u8], info: &ConnectionInfo) {
        self.emit(HandlerEvent::Success {
            body: body.to_vec(),
            info: info.clone(),
        });
    }

    fn on_failure(&mut self, body: &[u8], info: &ConnectionInfo) {
        self.emit(HandlerEvent::Failure {
            body: body.to_vec(),
            info: info.clone(),
        });
    }

    fn before_callback(&mut self, info: &ConnectionInfo) {
        self.emit(HandlerEvent::BeforeCallback { info: info.clone() });
    }

    fn before_finish(&mut self, info: &ConnectionInfo) {
        self.emit(HandlerEvent::BeforeFinish { info: info.clone() });
    }

    fn on_finish(&mut self, info: &ConnectionInfo) {
        self.emit(HandlerEvent::Finish { info: info.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_callbacks_in_order() {
        let (mut handler, mut rx) = ChannelHandler::new();
        let info = ConnectionInfo::new();

        handler.on_send(&info);
        handler.on_download_progress(&TransferEvent {
            chunk: b"abc",
            transferred: 3,
            total: Some(3),
        });
        handler.on_success(b"abc", &info);
        handler.on_finish(&info);

        assert!(matches!(rx.recv().await, Some(HandlerEvent::Send { .. })));
        match rx.recv().await {
            Some(HandlerEvent::DownloadProgress {
                chunk_len,
                transferred,
                total,
            }) => {
                assert_eq!(chunk_len, 3);
                assert_eq!(transferred, 3);
                assert_eq!(total, Some(3));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(HandlerEvent::Success { .. })));
        assert!(matches!(rx.recv().await, Some(HandlerEvent::Finish { .. })));
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_panic() {
        let (mut handler, rx) = ChannelHandler::new();
        drop(rx);
        handler.on_send(&ConnectionInfo::new());
    }
}
