//! JSON-decoding handler.

use serde::de::DeserializeOwned;

use crate::handler::ResponseHandler;
use crate::request::ConnectionInfo;

/// Terminal outcome of a JSON-expecting request.
///
/// Only success bodies are parsed; failure bodies (error pages, problem
/// documents) are passed through raw.
#[derive(Debug)]
pub enum JsonOutcome<T> {
    Success(Result<T, serde_json::Error>),
    Failure(Vec<u8>),
}

/// Parses 2xx response bytes into `T` and hands the outcome to a
/// caller-supplied closure.
pub struct JsonResponseHandler<T, F>
where
    T: DeserializeOwned,
    F: FnMut(JsonOutcome<T>, &ConnectionInfo) + Send,
{
    on_outcome: F,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, F> JsonResponseHandler<T, F>
where
    T: DeserializeOwned,
    F: FnMut(JsonOutcome<T>, &ConnectionInfo) + Send,
{
    pub fn new(on_outcome: F) -> Self {
        Self {
            on_outcome,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, F> ResponseHandler for JsonResponseHandler<T, F>
where
    T: DeserializeOwned,
    F: FnMut(JsonOutcome<T>, &ConnectionInfo) + Send,
{
    fn on_success(&mut self, body: &[u8], info: &ConnectionInfo) {
        (self.on_outcome)(JsonOutcome::Success(serde_json::from_slice(body)), info);
    }

    fn on_failure(&mut self, body: &[u8], info: &ConnectionInfo) {
        (self.on_outcome)(JsonOutcome::Failure(body.to_vec()), info);
    }
}
