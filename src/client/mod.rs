//! Convenience client surface.
//!
//! # Responsibilities
//! - Hold a base URL and client configuration
//! - Resolve per-call target URLs from the original base, never from a
//!   previously resolved URL
//! - Build descriptors for the four verbs and hand them to the engine
//!
//! # Example
//! ```no_run
//! use courier::client::HttpClient;
//! use courier::handler::ChannelHandler;
//!
//! # async fn example() -> Result<(), url::ParseError> {
//! let (handler, mut events) = ChannelHandler::new();
//! let mut client = HttpClient::new("http://example.com")?;
//! client.get("api/v1", &[("key", "value")], &[], handler)?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

use url::Url;

use crate::config::ClientConfig;
use crate::engine::{ExecutionEngine, ExecutionId};
use crate::entity::BodyEntity;
use crate::handler::ResponseHandler;
use crate::request::{RequestDescriptor, RequestMethod};

/// Query parameters as borrowed (name, value) pairs.
pub type Params<'a> = [(&'a str, &'a str)];

/// HTTP client bound to a base URL, executing one request at a time.
pub struct HttpClient {
    base: Url,
    engine: ExecutionEngine,
}

impl HttpClient {
    /// Create a client with default configuration.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Self::with_config(base_url, ClientConfig::default())
    }

    /// Create a client with explicit configuration.
    pub fn with_config(base_url: &str, config: ClientConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base_url)?,
            engine: ExecutionEngine::new(config),
        })
    }

    /// The base URL every call resolves against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Cancel the outstanding execution, if any.
    pub fn cancel(&mut self) {
        self.engine.cancel();
    }

    /// Perform a GET request on the base URL.
    pub fn get(
        &mut self,
        path: &str,
        params: &Params<'_>,
        headers: &Params<'_>,
        handler: impl ResponseHandler + 'static,
    ) -> Result<ExecutionId, url::ParseError> {
        let uri = self.resolve(path, params)?;
        let descriptor = RequestDescriptor::new(RequestMethod::Get, uri).with_headers(
            headers.iter().map(|(n, v)| (n.to_string(), v.to_string())),
        );
        Ok(self.engine.start(descriptor, Some(Box::new(handler))))
    }

    /// Perform a DELETE request on the base URL.
    pub fn delete(
        &mut self,
        path: &str,
        params: &Params<'_>,
        headers: &Params<'_>,
        handler: impl ResponseHandler + 'static,
    ) -> Result<ExecutionId, url::ParseError> {
        let uri = self.resolve(path, params)?;
        let descriptor = RequestDescriptor::new(RequestMethod::Delete, uri).with_headers(
            headers.iter().map(|(n, v)| (n.to_string(), v.to_string())),
        );
        Ok(self.engine.start(descriptor, Some(Box::new(handler))))
    }

    /// Perform a POST request on the base URL.
    pub fn post(
        &mut self,
        path: &str,
        params: &Params<'_>,
        body: Option<Box<dyn BodyEntity>>,
        headers: &Params<'_>,
        handler: impl ResponseHandler + 'static,
    ) -> Result<ExecutionId, url::ParseError> {
        self.send_with_body(RequestMethod::Post, path, params, body, headers, handler)
    }

    /// Perform a PUT request on the base URL.
    pub fn put(
        &mut self,
        path: &str,
        params: &Params<'_>,
        body: Option<Box<dyn BodyEntity>>,
        headers: &Params<'_>,
        handler: impl ResponseHandler + 'static,
    ) -> Result<ExecutionId, url::ParseError> {
        self.send_with_body(RequestMethod::Put, path, params, body, headers, handler)
    }

    fn send_with_body(
        &mut self,
        method: RequestMethod,
        path: &str,
        params: &Params<'_>,
        body: Option<Box<dyn BodyEntity>>,
        headers: &Params<'_>,
        handler: impl ResponseHandler + 'static,
    ) -> Result<ExecutionId, url::ParseError> {
        let uri = self.resolve(path, params)?;
        let mut descriptor = RequestDescriptor::new(method, uri).with_headers(
            headers.iter().map(|(n, v)| (n.to_string(), v.to_string())),
        );
        if let Some(body) = body {
            descriptor = descriptor.with_boxed_body(body);
        }
        Ok(self.engine.start(descriptor, Some(Box::new(handler))))
    }

    /// Resolve `path` and `params` against the original base URL.
    fn resolve(&self, path: &str, params: &Params<'_>) -> Result<Url, url::ParseError> {
        let mut url = self.base.clone();
        if !path.is_empty() {
            url.path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
                .pop_if_empty()
                .extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        for (name, value) in params {
            url.query_pairs_mut().append_pair(name, value);
        }
        Ok(url)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base", &self.base.as_str())
            .finish()
    }
}
