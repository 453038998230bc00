//! In-memory byte buffer entity.

use std::io::Cursor;

use tokio::io::AsyncRead;

use crate::entity::BodyEntity;

/// An entity backed by an owned byte buffer with a caller-chosen content
/// type.
#[derive(Debug, Clone)]
pub struct BytesEntity {
    bytes: Vec<u8>,
    content_type: String,
}

impl BytesEntity {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Convenience for UTF-8 text payloads.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text.into().into_bytes(), "text/plain; charset=utf-8")
    }
}

impl BodyEntity for BytesEntity {
    fn content_type(&self) -> (String, String) {
        ("Content-Type".to_string(), self.content_type.clone())
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }

    fn content(self: Box<Self>) -> std::io::Result<Box<dyn AsyncRead + Send + Unpin>> {
        Ok(Box::new(Cursor::new(self.bytes)))
    }
}
