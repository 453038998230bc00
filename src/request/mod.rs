//! Request descriptors.
//!
//! # Responsibilities
//! - Describe one fully-resolved request (method, target URL, headers, body)
//! - Preserve caller header order, duplicates included
//! - Hand the single-use body entity to the engine exactly once

mod info;

pub use info::ConnectionInfo;

use url::Url;

use crate::entity::BodyEntity;

/// The four request methods the executor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RequestMethod {
    /// Canonical verb string sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        }
    }

    /// Whether a request body is conventional for this method.
    pub fn allows_body(&self) -> bool {
        matches!(self, RequestMethod::Post | RequestMethod::Put)
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one request, consumed by a single execution.
///
/// Headers are an ordered sequence of (name, value) pairs; duplicate names
/// are all sent. The body entity, when present, is consumed by the upload
/// phase and cannot be reused.
pub struct RequestDescriptor {
    method: RequestMethod,
    uri: Url,
    headers: Vec<(String, String)>,
    body: Option<Box<dyn BodyEntity>>,
}

impl RequestDescriptor {
    /// Create a descriptor for a fully-resolved target URL.
    pub fn new(method: RequestMethod, uri: Url) -> Self {
        Self {
            method,
            uri,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append one caller header. Duplicates are kept, never collapsed.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a sequence of caller headers in order.
    pub fn with_headers<I, N, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(n, v)| (n.into(), v.into())));
        self
    }

    /// Attach the outgoing body entity.
    pub fn with_body(mut self, body: impl BodyEntity + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Attach an already-boxed body entity.
    pub fn with_boxed_body(mut self, body: Box<dyn BodyEntity>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Take the body entity out for upload. Single-use.
    pub(crate) fn take_body(&mut self) -> Option<Box<dyn BodyEntity>> {
        self.body.take()
    }
}

impl std::fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("uri", &self.uri.as_str())
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
