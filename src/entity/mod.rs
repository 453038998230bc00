//! Outgoing body entities.
//!
//! # Responsibilities
//! - Define the capability trait the engine consumes for request bodies
//! - Provide the basic entity kinds: raw bytes, JSON values, files
//!
//! An entity declares its content type and (possibly unknown) length up
//! front; its byte stream is surrendered exactly once. Consuming `Box<Self>`
//! makes single use a property of the type system rather than a runtime
//! convention.

mod bytes;
mod file;
mod json;

pub use bytes::BytesEntity;
pub use file::FileEntity;
pub use json::JsonEntity;

use tokio::io::AsyncRead;

/// An opaque source of outgoing bytes with declared type and length.
pub trait BodyEntity: Send {
    /// The content-type header this entity wants on the wire, as a
    /// (name, value) pair.
    fn content_type(&self) -> (String, String);

    /// Declared byte length, `None` when unknown up front.
    fn content_length(&self) -> Option<u64>;

    /// Surrender the byte stream. Consumes the entity.
    fn content(self: Box<Self>) -> std::io::Result<Box<dyn AsyncRead + Send + Unpin>>;
}
