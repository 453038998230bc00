//! File-backed entity.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncRead;

use crate::entity::BodyEntity;

/// An entity streaming a file from disk.
///
/// The file is opened and sized at construction so the declared length is
/// fixed before the upload starts.
#[derive(Debug)]
pub struct FileEntity {
    file: File,
    len: u64,
    content_type: String,
}

impl FileEntity {
    pub async fn open(
        path: impl AsRef<Path>,
        content_type: impl Into<String>,
    ) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        let len = file.metadata().await?.len();
        Ok(Self {
            file,
            len,
            content_type: content_type.into(),
        })
    }
}

impl BodyEntity for FileEntity {
    fn content_type(&self) -> (String, String) {
        ("Content-Type".to_string(), self.content_type.clone())
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.len)
    }

    fn content(self: Box<Self>) -> std::io::Result<Box<dyn AsyncRead + Send + Unpin>> {
        Ok(Box::new(self.file))
    }
}
