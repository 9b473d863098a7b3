//! Job service trait.

use async_trait::async_trait;

use crate::transport::ApiError;

use super::{JobCreate, JobDownload, JobRead, ProgressCallback, UploadFile, UploadTicket};

/// Operations against the jobs API and object storage.
///
/// Implementations hold no per-call state; every call stands alone.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Ask the backend for a presigned upload address for one file.
    async fn get_upload_ticket(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadTicket, ApiError>;

    /// PUT the file straight to storage at `presigned_url`.
    ///
    /// Must not carry the backend credential: the storage endpoint validates
    /// the URL signature and rejects unexpected headers.
    async fn upload_file_to_storage(
        &self,
        presigned_url: &str,
        file: &UploadFile,
        progress: Option<ProgressCallback>,
    ) -> Result<(), ApiError>;

    /// Create a job.
    async fn create_job(&self, payload: &JobCreate) -> Result<JobRead, ApiError>;

    /// Fetch a job's current state.
    async fn get_job(&self, job_id: &str) -> Result<JobRead, ApiError>;

    /// Get a temporary download link for a finished job's output.
    async fn get_download_link(&self, job_id: &str) -> Result<JobDownload, ApiError>;
}
