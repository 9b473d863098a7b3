//! Mock job service for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, RwLock};

use crate::jobs::{
    JobCreate, JobDownload, JobRead, JobService, JobStatus, ProgressCallback, UploadFile,
    UploadProgress, UploadTicket,
};
use crate::transport::ApiError;

use super::fixtures;

/// A recorded job service call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    UploadTicket {
        filename: String,
        content_type: String,
    },
    Upload {
        url: String,
        content_type: String,
        size: u64,
    },
    CreateJob(JobCreate),
    GetJob(String),
    GetDownloadLink(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Operation {
    UploadTicket,
    Upload,
    CreateJob,
    GetJob,
    GetDownloadLink,
}

/// Mock implementation of the JobService trait.
///
/// Provides controllable behavior for testing:
/// - Record every call, in order, for assertions
/// - Fail the next call of a given kind
/// - Hold `create_job` open until released, to observe in-flight state
///
/// # Example
///
/// ```rust,ignore
/// use labcg_core::testing::{MockJobService, RecordedCall};
///
/// let service = MockJobService::new();
/// service.fail_upload(ApiError::Timeout).await;
///
/// // Submit through the orchestrator...
///
/// let calls = service.calls().await;
/// assert!(matches!(calls[0], RecordedCall::UploadTicket { .. }));
/// ```
pub struct MockJobService {
    /// Recorded calls, oldest first.
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    /// One-shot errors keyed by operation.
    next_errors: Arc<RwLock<HashMap<Operation, ApiError>>>,
    /// Ticket returned by `get_upload_ticket`.
    ticket: Arc<RwLock<UploadTicket>>,
    /// Jobs created or seeded, by id.
    jobs: Arc<RwLock<HashMap<String, JobRead>>>,
    /// If set, `create_job` waits for a notification before returning.
    create_gate: Arc<RwLock<Option<Arc<Notify>>>>,
    next_job_id: AtomicU64,
}

impl std::fmt::Debug for MockJobService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockJobService")
            .field("calls", &"<calls>")
            .field("next_errors", &"<next_errors>")
            .field("create_gate", &"<gate>")
            .finish()
    }
}

impl Default for MockJobService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockJobService {
    /// Create a mock where every call succeeds.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            next_errors: Arc::new(RwLock::new(HashMap::new())),
            ticket: Arc::new(RwLock::new(fixtures::upload_ticket("uploads/inputs/mock.png"))),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            create_gate: Arc::new(RwLock::new(None)),
            next_job_id: AtomicU64::new(1),
        }
    }

    /// Set the ticket returned by subsequent `get_upload_ticket` calls.
    pub async fn set_ticket(&self, ticket: UploadTicket) {
        *self.ticket.write().await = ticket;
    }

    /// Make a job visible to `get_job` and `get_download_link`.
    pub async fn add_job(&self, job: JobRead) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    pub async fn fail_upload_ticket(&self, error: ApiError) {
        self.set_next_error(Operation::UploadTicket, error).await;
    }

    pub async fn fail_upload(&self, error: ApiError) {
        self.set_next_error(Operation::Upload, error).await;
    }

    pub async fn fail_create_job(&self, error: ApiError) {
        self.set_next_error(Operation::CreateJob, error).await;
    }

    pub async fn fail_get_job(&self, error: ApiError) {
        self.set_next_error(Operation::GetJob, error).await;
    }

    pub async fn fail_download_link(&self, error: ApiError) {
        self.set_next_error(Operation::GetDownloadLink, error).await;
    }

    /// Hold every subsequent `create_job` after it is recorded, until the
    /// returned handle is notified (once per held call).
    pub async fn hold_create_job(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.create_gate.write().await = Some(Arc::clone(&notify));
        notify
    }

    /// Get recorded calls.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Clear recorded calls.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Wait until at least `count` calls were recorded. Returns false on timeout.
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.calls.read().await.len() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn set_next_error(&self, operation: Operation, error: ApiError) {
        self.next_errors.write().await.insert(operation, error);
    }

    async fn record(&self, call: RecordedCall, operation: Operation) -> Result<(), ApiError> {
        self.calls.write().await.push(call);
        match self.next_errors.write().await.remove(&operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn find_job(&self, job_id: &str) -> Result<JobRead, ApiError> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::from_status(404, r#"{"detail":"Job not found"}"#.to_string())
            })
    }
}

#[async_trait]
impl JobService for MockJobService {
    async fn get_upload_ticket(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadTicket, ApiError> {
        self.record(
            RecordedCall::UploadTicket {
                filename: filename.to_string(),
                content_type: content_type.to_string(),
            },
            Operation::UploadTicket,
        )
        .await?;
        Ok(self.ticket.read().await.clone())
    }

    async fn upload_file_to_storage(
        &self,
        presigned_url: &str,
        file: &UploadFile,
        progress: Option<ProgressCallback>,
    ) -> Result<(), ApiError> {
        self.record(
            RecordedCall::Upload {
                url: presigned_url.to_string(),
                content_type: file.content_type.clone(),
                size: file.size(),
            },
            Operation::Upload,
        )
        .await?;

        if let Some(callback) = progress {
            callback(UploadProgress {
                loaded: file.size(),
                total: file.size(),
            });
        }
        Ok(())
    }

    async fn create_job(&self, payload: &JobCreate) -> Result<JobRead, ApiError> {
        self.record(RecordedCall::CreateJob(payload.clone()), Operation::CreateJob)
            .await?;

        let gate = self.create_gate.read().await.clone();
        if let Some(notify) = gate {
            notify.notified().await;
        }

        let id = format!("job-{}", self.next_job_id.fetch_add(1, Ordering::SeqCst));
        let mut job = fixtures::job_read(&id, &payload.model_id, JobStatus::Pending);
        job.prompt = payload
            .input_params
            .get("prompt")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        job.input_params = payload.input_params.clone();

        self.jobs.write().await.insert(id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, job_id: &str) -> Result<JobRead, ApiError> {
        self.record(RecordedCall::GetJob(job_id.to_string()), Operation::GetJob)
            .await?;
        self.find_job(job_id).await
    }

    async fn get_download_link(&self, job_id: &str) -> Result<JobDownload, ApiError> {
        self.record(
            RecordedCall::GetDownloadLink(job_id.to_string()),
            Operation::GetDownloadLink,
        )
        .await?;

        let job = self.find_job(job_id).await?;
        if job.status != JobStatus::Succeeded {
            return Err(ApiError::from_status(
                409,
                r#"{"detail":"Job has no output yet"}"#.to_string(),
            ));
        }
        Ok(JobDownload {
            download_url: format!("https://storage.test/outputs/{}.glb", job.id),
            expires_in: 3600,
        })
    }
}
