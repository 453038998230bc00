//! Asynchronous single-flight HTTP request executor.
//!
//! One engine instance runs at most one request at a time: starting a new
//! execution cancels the outstanding one. Each execution streams the
//! request body up and the response body down through bounded buffers,
//! reports per-chunk progress, decodes gzip responses transparently, and
//! delivers exactly one terminal outcome (success or failure) to a
//! caller-supplied handler, followed by a finish notification.
//!
//! ```text
//!  caller ──► HttpClient ──► ExecutionEngine ──► ConnectionAdapter
//!                                  │                  (TCP / TLS + HTTP/1.1)
//!                                  ├──► BodyUploader ──► request body
//!                                  ├──► ResponseReader ◄── response body
//!                                  └──► ResponseHandler callbacks
//! ```
//!
//! Failures inside an execution are logged and swallowed, matching the
//! legacy client this crate models: handlers observe them as an execution
//! that finishes without a success/failure callback.

pub mod client;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod handler;
pub mod request;

pub use client::HttpClient;
pub use config::ClientConfig;
pub use engine::{ExecutionEngine, ExecutionId, ExecutionState};
pub use entity::{BodyEntity, BytesEntity, FileEntity, JsonEntity};
pub use error::ExecutionError;
pub use handler::{ChannelHandler, HandlerEvent, ResponseHandler, TransferEvent};
pub use request::{ConnectionInfo, RequestDescriptor, RequestMethod};
