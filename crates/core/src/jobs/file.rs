//! Files selected for upload and upload progress reporting.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

/// A file selected for upload: name, MIME type and content.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// File name as presented to the backend.
    pub name: String,
    /// MIME type, sent as the storage PUT's `Content-Type`.
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self::new(name, content_type, data))
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Bytes handed to the transport so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    /// Total size; 0 when unknown.
    pub total: u64,
}

impl UploadProgress {
    /// Completed fraction. An unknown total counts as 1 byte.
    pub fn fraction(&self) -> f64 {
        self.loaded as f64 / self.total.max(1) as f64
    }

    /// Completed percentage, rounded.
    pub fn percent(&self) -> u64 {
        (self.fraction() * 100.0).round() as u64
    }
}

/// Receives upload progress updates.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;
