//! Text-decoding handler.

use crate::handler::ResponseHandler;
use crate::request::ConnectionInfo;

/// Terminal outcome decoded as UTF-8 text (lossy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    Success(String),
    Failure(String),
}

/// Decodes terminal response bytes as text and hands the outcome to a
/// caller-supplied closure.
pub struct StringResponseHandler<F>
where
    F: FnMut(TextOutcome, &ConnectionInfo) + Send,
{
    on_outcome: F,
}

impl<F> StringResponseHandler<F>
where
    F: FnMut(TextOutcome, &ConnectionInfo) + Send,
{
    pub fn new(on_outcome: F) -> Self {
        Self { on_outcome }
    }
}

impl<F> ResponseHandler for StringResponseHandler<F>
where
    F: FnMut(TextOutcome, &ConnectionInfo) + Send,
{
    fn on_success(&mut self, body: &[u8], info: &ConnectionInfo) {
        let text = String::from_utf8_lossy(body).into_owned();
        (self.on_outcome)(TextOutcome::Success(text), info);
    }

    fn on_failure(&mut self, body: &[u8], info: &ConnectionInfo) {
        let text = String::from_utf8_lossy(body).into_owned();
        (self.on_outcome)(TextOutcome::Failure(text), info);
    }
}
