//! Request body streaming.
//!
//! # Responsibilities
//! - Pump the entity's byte stream into the connection's outbound body
//! - Bound memory at one buffer: each chunk is handed off before the next
//!   is read
//! - Report progress once per chunk with the running total

use futures_channel::mpsc;
use futures_util::SinkExt;
use hyper::body::{Bytes, Frame};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

use crate::engine::{guard, BUFFER_SIZE};
use crate::error::{ExecutionError, ExecutionResult};
use crate::handler::{ResponseHandler, TransferEvent};

/// Stream `content` into the outbound body channel, chunk by chunk.
///
/// Returns the number of bytes actually written. Dropping the sender on
/// return closes the outbound stream, whatever length the entity declared.
pub(crate) async fn stream_entity(
    mut content: Box<dyn AsyncRead + Send + Unpin>,
    declared_len: Option<u64>,
    mut tx: mpsc::Sender<Result<Frame<Bytes>, std::io::Error>>,
    handler: &mut Option<Box<dyn ResponseHandler>>,
    cancel: &mut watch::Receiver<bool>,
) -> ExecutionResult<u64> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut written: u64 = 0;

    loop {
        let read = guard(cancel, content.read(&mut buffer))
            .await?
            .map_err(ExecutionError::Body)?;
        if read == 0 {
            break;
        }

        let chunk = Bytes::copy_from_slice(&buffer[..read]);
        if guard(cancel, tx.send(Ok(Frame::data(chunk.clone()))))
            .await?
            .is_err()
        {
            return Err(ExecutionError::Body(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "outbound body stream closed by the connection",
            )));
        }
        written += read as u64;

        if let Some(h) = handler.as_mut() {
            h.on_upload_progress(&TransferEvent {
                chunk: &chunk,
                transferred: written,
                total: declared_len,
            });
        }
    }

    tracing::trace!(written, declared = ?declared_len, "request body streamed");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ChannelHandler, HandlerEvent};
    use futures_util::StreamExt;

    #[tokio::test]
    async fn streams_in_bounded_chunks_with_progress() {
        let payload = vec![7u8; BUFFER_SIZE + 100];
        let content: Box<dyn AsyncRead + Send + Unpin> =
            Box::new(std::io::Cursor::new(payload.clone()));
        let (tx, rx) = mpsc::channel(1);
        let (handler, mut events) = ChannelHandler::new();
        let mut handler: Option<Box<dyn ResponseHandler>> = Some(Box::new(handler));
        let (_cancel_tx, mut cancel_rx) = watch::channel(false);

        let drain = tokio::spawn(async move {
            rx.map(|frame: Result<Frame<Bytes>, std::io::Error>| {
                frame
                    .unwrap()
                    .into_data()
                    .expect("only data frames expected")
                    .len()
            })
            .collect::<Vec<_>>()
            .await
        });

        let written = stream_entity(
            content,
            Some(payload.len() as u64),
            tx,
            &mut handler,
            &mut cancel_rx,
        )
        .await
        .unwrap();
        assert_eq!(written, payload.len() as u64);

        let chunk_sizes = drain.await.unwrap();
        assert_eq!(chunk_sizes, vec![BUFFER_SIZE, 100]);

        drop(handler);
        let mut reported = Vec::new();
        while let Some(event) = events.recv().await {
            if let HandlerEvent::UploadProgress {
                chunk_len,
                transferred,
                total,
            } = event
            {
                reported.push((chunk_len, transferred, total));
            }
        }
        assert_eq!(
            reported,
            vec![
                (BUFFER_SIZE, BUFFER_SIZE as u64, Some(payload.len() as u64)),
                (100, payload.len() as u64, Some(payload.len() as u64)),
            ]
        );
    }

    #[tokio::test]
    async fn cancellation_stops_before_next_chunk() {
        let payload = vec![1u8; BUFFER_SIZE * 4];
        let content: Box<dyn AsyncRead + Send + Unpin> = Box::new(std::io::Cursor::new(payload));
        let (tx, mut rx) = mpsc::channel(1);
        let mut handler: Option<Box<dyn ResponseHandler>> = None;
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        // consume one chunk, then cancel without draining further
        let upload = tokio::spawn(async move {
            stream_entity(content, None, tx, &mut handler, &mut cancel_rx).await
        });
        let first = rx.next().await.expect("first chunk").unwrap();
        assert_eq!(
            first.into_data().expect("only data frames expected").len(),
            BUFFER_SIZE
        );
        cancel_tx.send(true).unwrap();

        let result = upload.await.unwrap();
        assert!(matches!(result, Err(ExecutionError::Cancelled)));
    }
}
