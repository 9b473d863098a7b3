//! Direct-to-storage uploads over presigned URLs.

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Url};
use tracing::debug;

use crate::transport::{ApiError, Interceptor, SessionGuard};

use super::{ProgressCallback, UploadFile, UploadProgress};

/// Bytes per body chunk; also the progress reporting granularity.
const CHUNK_SIZE: usize = 64 * 1024;

/// Uploads raw file content to a presigned storage URL.
///
/// Uses its own `reqwest` client: no base address, no default headers, no
/// timeout and no credential injection. The only hook it shares with the API
/// client is the optional [`SessionGuard`], so an auth rejection from storage
/// invalidates the session like any other call.
#[derive(Clone, Default)]
pub struct StorageUploader {
    client: Client,
    guard: Option<SessionGuard>,
}

impl StorageUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// React to 401/403 from storage by invalidating the session.
    pub fn with_session_guard(mut self, guard: SessionGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// PUT `file` to `presigned_url` with the file's content type.
    pub async fn upload(
        &self,
        presigned_url: &str,
        file: &UploadFile,
        progress: Option<ProgressCallback>,
    ) -> Result<(), ApiError> {
        let url = Url::parse(presigned_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", presigned_url, e)))?;

        let total = file.size();
        debug!(
            "Uploading {} ({} bytes, {}) to storage",
            file.name, total, file.content_type
        );

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, file.content_type.as_str())
            .header(CONTENT_LENGTH, total)
            .body(progress_body(file, progress))
            .send()
            .await?;

        let status = response.status();
        if let Some(guard) = &self.guard {
            guard.on_response(status, response.url());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        debug!("Storage upload of {} complete", file.name);
        Ok(())
    }
}

/// Stream the file in chunks, reporting progress as each chunk is handed off.
fn progress_body(file: &UploadFile, progress: Option<ProgressCallback>) -> Body {
    let data = file.data.clone();
    let total = data.len() as u64;
    let chunks: Vec<_> = (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
        .collect();

    let mut loaded = 0u64;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        loaded += chunk.len() as u64;
        if let Some(callback) = &progress {
            callback(UploadProgress { loaded, total });
        }
        Ok::<_, std::io::Error>(chunk)
    }));

    Body::wrap_stream(stream)
}
