//! JSON value entity.

use std::io::Cursor;

use serde::Serialize;
use tokio::io::AsyncRead;

use crate::entity::BodyEntity;

/// An entity holding a value serialized to JSON at construction time.
#[derive(Debug, Clone)]
pub struct JsonEntity {
    bytes: Vec<u8>,
}

impl JsonEntity {
    /// Serialize `value` eagerly so the declared length is exact.
    pub fn new<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Self {
            bytes: serde_json::to_vec(value)?,
        })
    }
}

impl BodyEntity for JsonEntity {
    fn content_type(&self) -> (String, String) {
        ("Content-Type".to_string(), "application/json".to_string())
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }

    fn content(self: Box<Self>) -> std::io::Result<Box<dyn AsyncRead + Send + Unpin>> {
        Ok(Box::new(Cursor::new(self.bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Payload {
        key: String,
        count: u32,
    }

    #[test]
    fn serializes_at_construction() {
        let entity = JsonEntity::new(&Payload {
            key: "value".into(),
            count: 3,
        })
        .unwrap();

        assert_eq!(entity.content_type().1, "application/json");
        let expected = br#"{"key":"value","count":3}"#;
        assert_eq!(entity.content_length(), Some(expected.len() as u64));
    }
}
