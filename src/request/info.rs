//! Per-execution telemetry.

use std::time::SystemTime;

use crate::request::RequestMethod;

/// Telemetry for one execution.
///
/// Owned by the engine; handlers only ever see a shared reference. Every
/// field is write-once — the first value sticks, later writes are ignored
/// and logged at trace level.
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    connection_time: Option<SystemTime>,
    request_method: Option<RequestMethod>,
    connection_length: Option<u64>,
    response_length: Option<u64>,
    response_code: Option<i32>,
    response_time: Option<SystemTime>,
}

impl ConnectionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp taken immediately before network activity began.
    pub fn connection_time(&self) -> Option<SystemTime> {
        self.connection_time
    }

    /// The method used for this execution.
    pub fn request_method(&self) -> Option<RequestMethod> {
        self.request_method
    }

    /// Bytes actually streamed as the outgoing body.
    pub fn connection_length(&self) -> Option<u64> {
        self.connection_length
    }

    /// Total decoded bytes read from the response.
    pub fn response_length(&self) -> Option<u64> {
        self.response_length
    }

    /// Resolved status code; `-1` when the code could not be determined.
    pub fn response_code(&self) -> Option<i32> {
        self.response_code
    }

    /// Timestamp taken when the execution completed.
    pub fn response_time(&self) -> Option<SystemTime> {
        self.response_time
    }

    pub(crate) fn set_connection_time(&mut self, at: SystemTime) {
        set_once(&mut self.connection_time, at, "connection_time");
    }

    pub(crate) fn set_request_method(&mut self, method: RequestMethod) {
        set_once(&mut self.request_method, method, "request_method");
    }

    pub(crate) fn set_connection_length(&mut self, len: u64) {
        set_once(&mut self.connection_length, len, "connection_length");
    }

    pub(crate) fn set_response_length(&mut self, len: u64) {
        set_once(&mut self.response_length, len, "response_length");
    }

    pub(crate) fn set_response_code(&mut self, code: i32) {
        set_once(&mut self.response_code, code, "response_code");
    }

    pub(crate) fn set_response_time(&mut self, at: SystemTime) {
        set_once(&mut self.response_time, at, "response_time");
    }
}

fn set_once<T: std::fmt::Debug>(slot: &mut Option<T>, value: T, field: &'static str) {
    if slot.is_some() {
        tracing::trace!(field, ?value, "ignoring repeated telemetry write");
        return;
    }
    *slot = Some(value);
}
