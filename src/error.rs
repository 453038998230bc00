//! Execution error definitions.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while executing a request.
///
/// Nothing here reaches the caller of the engine directly: the engine
/// boundary logs and swallows. The taxonomy exists so each pipeline stage
/// stays individually testable.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The descriptor URL cannot be dialed (bad scheme, missing host).
    #[error("invalid request target: {0}")]
    Target(String),

    /// DNS resolution or TCP connect failed.
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// The connect phase exceeded the configured timeout.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// TLS handshake with the server failed.
    #[error("TLS handshake failed: {0}")]
    Tls(#[source] std::io::Error),

    /// The HTTP/1.1 exchange failed (handshake, dispatch, or read).
    #[error("HTTP exchange failed: {0}")]
    Exchange(#[from] hyper::Error),

    /// The request body entity failed while being read or streamed.
    #[error("request body error: {0}")]
    Body(#[source] std::io::Error),

    /// The response body could not be decoded (gzip corruption).
    #[error("response decode error: {0}")]
    Decode(#[source] std::io::Error),

    /// A caller-supplied header name or value is not representable on the
    /// wire.
    #[error("invalid header: {0}")]
    Header(String),

    /// A redirect response carried no usable Location target.
    #[error("unresolvable redirect: {0}")]
    Redirect(String),

    /// The execution was superseded or explicitly cancelled.
    #[error("execution cancelled")]
    Cancelled,
}

/// Result type for engine pipeline stages.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExecutionError::ConnectTimeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));

        let err = ExecutionError::Target("no host".into());
        assert_eq!(err.to_string(), "invalid request target: no host");
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        let err = ExecutionError::Cancelled;
        assert!(matches!(err, ExecutionError::Cancelled));
    }
}
