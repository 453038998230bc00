//! Execution engine.
//!
//! # Responsibilities
//! - Guarantee at most one outstanding execution per engine instance
//! - Spawn a fresh worker task per `start`, never reusing a prior one
//! - Drive the fixed callback sequence and per-execution telemetry
//! - Swallow pipeline errors at the boundary, logging only
//!
//! # Callback ordering
//! `on_send` fires synchronously inside [`ExecutionEngine::start`]; all
//! network I/O runs on the spawned worker; the finish family
//! (`before_callback`, `before_finish`, `on_finish`) runs on the worker
//! after every transport resource has been released. The finish family
//! fires for every non-cancelled execution, including ones that failed
//! before a status code was resolved. A cancelled execution fires nothing
//! past the cancellation point.

mod adapter;
mod download;
pub mod state;
mod upload;

pub use state::{ExecutionId, ExecutionState};

use std::future::Future;
use std::time::SystemTime;

use futures_channel::mpsc;
use http_body_util::{BodyExt, Empty, StreamBody};
use hyper::body::Bytes;
use hyper::header;
use tokio::sync::watch;

use crate::config::ClientConfig;
use crate::error::{ExecutionError, ExecutionResult};
use crate::handler::ResponseHandler;
use crate::request::{ConnectionInfo, RequestDescriptor};
use crate::engine::adapter::OutboundBody;
use crate::engine::state::StateCell;

/// Fixed transfer buffer size; bounds memory use and progress granularity.
pub(crate) const BUFFER_SIZE: usize = 8192;

/// Run `fut` unless cancellation is (or becomes) requested.
///
/// A dropped cancellation sender counts as cancellation: it means the
/// owning engine is gone.
pub(crate) async fn guard<T, F>(
    cancel: &mut watch::Receiver<bool>,
    fut: F,
) -> ExecutionResult<T>
where
    F: Future<Output = T>,
{
    if *cancel.borrow() {
        return Err(ExecutionError::Cancelled);
    }
    tokio::select! {
        out = fut => Ok(out),
        _ = cancel.changed() => Err(ExecutionError::Cancelled),
    }
}

/// Handle to one spawned execution.
pub struct ExecutionHandle {
    id: ExecutionId,
    task: tokio::task::JoinHandle<()>,
    cancel_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<ExecutionState>,
}

impl ExecutionHandle {
    pub fn id(&self) -> ExecutionId {
        self.id
    }

    /// Latest observed lifecycle state.
    pub fn state(&self) -> ExecutionState {
        *self.state_rx.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    fn request_cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Single-flight request executor.
///
/// At most one execution is outstanding per engine instance; `start`ing a
/// new one first cancels the old one. Must be used within a tokio runtime.
pub struct ExecutionEngine {
    config: ClientConfig,
    active: Option<ExecutionHandle>,
}

impl ExecutionEngine {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Launch an execution for `descriptor`, cancelling any outstanding one.
    ///
    /// With a `None` handler the exchange still runs, but no callbacks are
    /// issued. `on_send` fires on the caller's task before this returns.
    pub fn start(
        &mut self,
        descriptor: RequestDescriptor,
        mut handler: Option<Box<dyn ResponseHandler>>,
    ) -> ExecutionId {
        let superseded = self.active.take();
        let id = ExecutionId::new();

        let mut info = ConnectionInfo::new();
        info.set_connection_time(SystemTime::now());
        info.set_request_method(descriptor.method());
        if let Some(h) = handler.as_mut() {
            h.on_send(&info);
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_cell, state_rx) = StateCell::new(id);
        let task = tokio::spawn(run_execution(
            id,
            self.config.clone(),
            descriptor,
            handler,
            info,
            cancel_rx,
            state_cell,
            superseded,
        ));

        self.active = Some(ExecutionHandle {
            id,
            task,
            cancel_tx,
            state_rx,
        });
        id
    }

    /// Request cancellation of the outstanding execution, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            tracing::debug!(execution_id = %handle.id(), "cancellation requested");
            handle.request_cancel();
        }
    }

    /// Whether an execution is currently outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.active
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Handle to the most recently started execution, until superseded.
    pub fn active_execution(&self) -> Option<&ExecutionHandle> {
        self.active.as_ref()
    }
}

impl Drop for ExecutionEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.request_cancel();
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_execution(
    id: ExecutionId,
    config: ClientConfig,
    descriptor: RequestDescriptor,
    mut handler: Option<Box<dyn ResponseHandler>>,
    mut info: ConnectionInfo,
    mut cancel: watch::Receiver<bool>,
    state: StateCell,
    superseded: Option<ExecutionHandle>,
) {
    // ordering barrier: the superseded worker fully winds down before this
    // execution touches the network
    if let Some(previous) = superseded {
        tracing::debug!(execution_id = %id, superseded = %previous.id(), "superseding outstanding execution");
        previous.request_cancel();
        let _ = previous.task.await;
    }

    tracing::debug!(
        execution_id = %id,
        method = %descriptor.method(),
        uri = %descriptor.uri(),
        "execution starting"
    );

    match perform(&config, descriptor, &mut handler, &mut info, &mut cancel, &state).await {
        Ok(()) => {}
        Err(ExecutionError::Cancelled) => {
            tracing::debug!(execution_id = %id, "execution cancelled");
            state.advance(ExecutionState::Cancelling);
            state.advance(ExecutionState::Cancelled);
            return;
        }
        Err(error) => {
            // swallow-all boundary: the error never reaches the caller
            tracing::error!(execution_id = %id, error = %error, "execution failed");
        }
    }

    if *cancel.borrow() {
        state.advance(ExecutionState::Cancelling);
        state.advance(ExecutionState::Cancelled);
        return;
    }

    info.set_response_time(SystemTime::now());
    if let Some(h) = handler.as_mut() {
        h.before_callback(&info);
        h.before_finish(&info);
        h.on_finish(&info);
    }
    state.advance(ExecutionState::Completed);
    tracing::debug!(
        execution_id = %id,
        response_code = ?info.response_code(),
        response_length = ?info.response_length(),
        "execution finished"
    );
}

async fn perform(
    config: &ClientConfig,
    mut descriptor: RequestDescriptor,
    handler: &mut Option<Box<dyn ResponseHandler>>,
    info: &mut ConnectionInfo,
    cancel: &mut watch::Receiver<bool>,
    state: &StateCell,
) -> ExecutionResult<()> {
    let method = descriptor.method();

    let entity = if method.allows_body() {
        descriptor.take_body()
    } else {
        if descriptor.has_body() {
            tracing::debug!(%method, "body entity ignored for body-less method");
        }
        None
    };
    let had_body = entity.is_some();

    // entity metadata is read before the stream is surrendered
    let mut upload_source = match entity {
        Some(entity) => {
            let content_type = entity.content_type();
            let declared_len = entity.content_length();
            let content = entity.content().map_err(ExecutionError::Body)?;
            Some((content_type, declared_len, content))
        }
        None => None,
    };

    let mut target = descriptor.uri().clone();
    let mut hops = 0u32;

    loop {
        state.advance(ExecutionState::Connecting);
        let mut conn = adapter::open(config, &target).await?;

        let response = match upload_source.take() {
            Some((content_type, declared_len, content)) => {
                state.advance(ExecutionState::Uploading);
                let (tx, rx) = mpsc::channel(1);
                let body: OutboundBody = StreamBody::new(rx).boxed();
                let request = adapter::build_request(
                    config,
                    &target,
                    method,
                    descriptor.headers(),
                    Some(&content_type),
                    declared_len,
                    body,
                )?;

                let mut upload_cancel = cancel.clone();
                let (response, upload_result) = tokio::join!(
                    guard(cancel, conn.sender.send_request(request)),
                    upload::stream_entity(
                        content,
                        declared_len,
                        tx,
                        handler,
                        &mut upload_cancel
                    ),
                );

                let response = match response? {
                    Ok(response) => response,
                    Err(error) => {
                        info.set_response_code(download::classify_status_message(
                            &error.to_string(),
                        ));
                        return Err(error.into());
                    }
                };
                info.set_connection_length(upload_result?);
                response
            }
            None => {
                let body: OutboundBody = Empty::<Bytes>::new()
                    .map_err(|never| match never {})
                    .boxed();
                let request = adapter::build_request(
                    config,
                    &target,
                    method,
                    descriptor.headers(),
                    None,
                    None,
                    body,
                )?;

                match guard(cancel, conn.sender.send_request(request)).await? {
                    Ok(response) => response,
                    Err(error) => {
                        info.set_response_code(download::classify_status_message(
                            &error.to_string(),
                        ));
                        return Err(error.into());
                    }
                }
            }
        };

        if !had_body && response.status().is_redirection() && hops < config.max_redirects {
            if let Some(location) = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
            {
                let next = target
                    .join(location)
                    .map_err(|e| ExecutionError::Redirect(format!("{location}: {e}")))?;
                tracing::debug!(from = %target, to = %next, "following redirect");
                target = next;
                hops += 1;
                continue;
            }
        }

        state.advance(ExecutionState::Downloading);
        let outcome = download::read_response(response, handler, cancel).await?;
        // scoped release: connection and driver go away before any
        // terminal callback fires
        drop(conn);

        info.set_response_code(outcome.status as i32);
        info.set_response_length(outcome.body.len() as u64);

        if *cancel.borrow() {
            return Err(ExecutionError::Cancelled);
        }
        if let Some(h) = handler.as_mut() {
            if outcome.is_success() {
                h.on_success(&outcome.body, info);
            } else {
                h.on_failure(&outcome.body, info);
            }
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_passes_through_uncancelled() {
        let (_tx, mut rx) = watch::channel(false);
        let value = guard(&mut rx, async { 42 }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn guard_rejects_when_already_cancelled() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();
        let result = guard(&mut rx, async { 42 }).await;
        assert!(matches!(result, Err(ExecutionError::Cancelled)));
    }

    #[tokio::test]
    async fn guard_interrupts_pending_future() {
        let (tx, mut rx) = watch::channel(false);
        let pending = std::future::pending::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            let _ = tx.send(true);
        });
        let result = guard(&mut rx, pending).await;
        assert!(matches!(result, Err(ExecutionError::Cancelled)));
    }

    #[tokio::test]
    async fn guard_treats_dropped_sender_as_cancelled() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        let result = guard(&mut rx, std::future::pending::<()>()).await;
        assert!(matches!(result, Err(ExecutionError::Cancelled)));
    }
}
