//! Response classification and streaming.
//!
//! # Responsibilities
//! - Resolve the status code (heuristic mapping when the exchange failed)
//! - Transparently decode gzip response bodies
//! - Accumulate the body while reporting bounded-chunk progress
//! - Emit the synthetic final progress event once the stream is drained

use std::io::Write;

use flate2::write::GzDecoder;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header;
use hyper::Response;
use tokio::sync::watch;

use crate::engine::{guard, BUFFER_SIZE};
use crate::error::{ExecutionError, ExecutionResult};
use crate::handler::{ResponseHandler, TransferEvent};

/// Result of draining one response.
pub(crate) struct ReadOutcome {
    pub(crate) status: u16,
    pub(crate) body: Vec<u8>,
}

impl ReadOutcome {
    pub(crate) fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Map an exchange error message onto a status code, legacy style.
///
/// "authentication" anywhere in the message means an auth challenge we
/// could not satisfy; "not found"-class messages map to 404; everything
/// else is unresolvable.
pub(crate) fn classify_status_message(message: &str) -> i32 {
    let message = message.to_ascii_lowercase();
    if message.contains("authentication") {
        401
    } else if message.contains("not found") {
        404
    } else {
        -1
    }
}

/// Drain `response`, decoding gzip transparently, firing one progress event
/// per bounded chunk plus the synthetic final event.
pub(crate) async fn read_response(
    response: Response<Incoming>,
    handler: &mut Option<Box<dyn ResponseHandler>>,
    cancel: &mut watch::Receiver<bool>,
) -> ExecutionResult<ReadOutcome> {
    let status = response.status().as_u16();
    let declared_len = declared_content_length(&response);
    let gzip = is_gzip(&response);
    tracing::trace!(status, declared = ?declared_len, gzip, "reading response body");

    let mut body = response.into_body();
    let mut decoder = BodyDecoder::new(gzip);
    let mut reported: u64 = 0;

    loop {
        let frame = match guard(cancel, body.frame()).await? {
            Some(frame) => frame?,
            None => break,
        };
        let Ok(data) = frame.into_data() else {
            // trailers carry no body bytes
            continue;
        };
        decoder.write_chunk(&data).map_err(ExecutionError::Decode)?;
        reported = publish_progress(handler, decoder.decoded(), reported, declared_len);
    }

    let bytes = decoder.finish().map_err(ExecutionError::Decode)?;
    reported = publish_progress(handler, &bytes, reported, declared_len);
    debug_assert_eq!(reported, bytes.len() as u64);

    if let Some(h) = handler.as_mut() {
        // declared length may be absent or compressed; the final event
        // carries the actual decoded total in both positions
        let total = bytes.len() as u64;
        h.on_download_progress(&TransferEvent {
            chunk: &bytes,
            transferred: total,
            total: Some(total),
        });
    }

    Ok(ReadOutcome { status, body: bytes })
}

/// Report every not-yet-reported decoded byte in windows of at most
/// [`BUFFER_SIZE`]. Returns the new reported watermark.
fn publish_progress(
    handler: &mut Option<Box<dyn ResponseHandler>>,
    decoded: &[u8],
    mut reported: u64,
    declared_len: Option<u64>,
) -> u64 {
    let available = decoded.len() as u64;
    let Some(h) = handler.as_mut() else {
        return available;
    };

    while reported < available {
        let end = (reported + BUFFER_SIZE as u64).min(available);
        h.on_download_progress(&TransferEvent {
            chunk: &decoded[reported as usize..end as usize],
            transferred: end,
            total: declared_len,
        });
        reported = end;
    }
    reported
}

fn declared_content_length(response: &Response<Incoming>) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn is_gzip(response: &Response<Incoming>) -> bool {
    response
        .headers()
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("gzip"))
        .unwrap_or(false)
}

/// Accumulates the response, passing bytes through a gzip decoder when the
/// response declared one.
enum BodyDecoder {
    Identity(Vec<u8>),
    Gzip(GzDecoder<Vec<u8>>),
}

impl BodyDecoder {
    fn new(gzip: bool) -> Self {
        if gzip {
            BodyDecoder::Gzip(GzDecoder::new(Vec::new()))
        } else {
            BodyDecoder::Identity(Vec::new())
        }
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        match self {
            BodyDecoder::Identity(buf) => {
                buf.extend_from_slice(chunk);
                Ok(())
            }
            BodyDecoder::Gzip(decoder) => decoder.write_all(chunk),
        }
    }

    /// Bytes decoded so far. For gzip this can lag the final total until
    /// [`finish`](Self::finish) flushes the decoder.
    fn decoded(&self) -> &[u8] {
        match self {
            BodyDecoder::Identity(buf) => buf,
            BodyDecoder::Gzip(decoder) => decoder.get_ref(),
        }
    }

    fn finish(self) -> std::io::Result<Vec<u8>> {
        match self {
            BodyDecoder::Identity(buf) => Ok(buf),
            BodyDecoder::Gzip(decoder) => decoder.finish(),
        }
    }
}
