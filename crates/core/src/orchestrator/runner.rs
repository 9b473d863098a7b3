//! Submission orchestrator implementation.
//!
//! Validates a request, picks the text or image flow and runs its calls
//! strictly in sequence. A failure at any step aborts the remaining ones.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use crate::config::ModelsConfig;
use crate::jobs::{JobCreate, JobRead, JobService, ProgressCallback, UploadProgress};

use super::types::{
    SubmissionPhase, SubmissionState, SubmitError, SubmitMode, SubmitRequest,
    GENERIC_FAILURE_MESSAGE, IMAGE_REQUIRED_MESSAGE, PROMPT_REQUIRED_MESSAGE,
};

/// Drives one submission at a time through validation and the job service.
///
/// Failures never escape [`submit`](Self::submit): they become the
/// user-facing `last_error` and a `false` outcome.
pub struct SubmissionOrchestrator {
    service: Arc<dyn JobService>,
    models: ModelsConfig,
    state: Arc<Mutex<SubmissionState>>,
    upload_progress: ProgressCallback,
}

impl SubmissionOrchestrator {
    /// Create an orchestrator in the `Idle` phase.
    pub fn new(service: Arc<dyn JobService>, models: ModelsConfig) -> Self {
        Self {
            service,
            models,
            state: Arc::new(Mutex::new(SubmissionState::default())),
            upload_progress: Arc::new(|p: UploadProgress| {
                debug!("Storage upload: {}%", p.percent());
            }),
        }
    }

    /// Replace the upload progress reporter.
    pub fn with_upload_progress(mut self, callback: ProgressCallback) -> Self {
        self.upload_progress = callback;
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SubmissionState {
        lock(&self.state).clone()
    }

    pub fn phase(&self) -> SubmissionPhase {
        lock(&self.state).phase
    }

    pub fn is_submitting(&self) -> bool {
        lock(&self.state).in_progress
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    pub fn last_job(&self) -> Option<JobRead> {
        lock(&self.state).last_job.clone()
    }

    /// Submit a job. Returns `true` once the backend has created it.
    ///
    /// On `false`, [`last_error`](Self::last_error) holds the message, except
    /// when the call was rejected because another submission is running.
    pub async fn submit(&self, request: SubmitRequest) -> bool {
        self.try_submit(request).await.is_ok()
    }

    /// Submit a job and return the created job or the failure.
    pub async fn try_submit(&self, request: SubmitRequest) -> Result<JobRead, SubmitError> {
        let attempt = match SubmissionAttempt::begin(&self.state) {
            Some(attempt) => attempt,
            None => {
                warn!("Rejected {} submission: another one is in progress", request.mode);
                return Err(SubmitError::Busy);
            }
        };

        let result = self.run(&request).await;
        match &result {
            Ok(job) => {
                info!("Created job {} ({})", job.id, job.model_id);
                attempt.succeed(job.clone());
            }
            Err(e) => {
                let message = e.user_message();
                error!("Failed to submit {} job: {}", request.mode, e);
                attempt.fail(message);
            }
        }
        result
    }

    async fn run(&self, request: &SubmitRequest) -> Result<JobRead, SubmitError> {
        let payload = match request.mode {
            SubmitMode::Text => {
                if request.prompt.trim().is_empty() {
                    return Err(SubmitError::Validation(PROMPT_REQUIRED_MESSAGE.to_string()));
                }
                self.text_payload(request)
            }
            SubmitMode::Image => {
                let file = request
                    .file
                    .as_ref()
                    .ok_or_else(|| SubmitError::Validation(IMAGE_REQUIRED_MESSAGE.to_string()))?;

                let ticket = self
                    .service
                    .get_upload_ticket(&file.name, &file.content_type)
                    .await?;

                self.service
                    .upload_file_to_storage(
                        &ticket.upload_url,
                        file,
                        Some(Arc::clone(&self.upload_progress)),
                    )
                    .await?;

                self.image_payload(&ticket.object_name, request)
            }
        };

        Ok(self.service.create_job(&payload).await?)
    }

    fn text_payload(&self, request: &SubmitRequest) -> JobCreate {
        JobCreate::new(self.models.text_model_id.as_str())
            .with_param("prompt", request.prompt.as_str())
            .with_param("max_steps", request.steps)
            .with_param("guidance_scale", request.guidance)
            .with_param("seed", request.seed)
            .with_param("random_bg", true)
    }

    fn image_payload(&self, object_name: &str, request: &SubmitRequest) -> JobCreate {
        JobCreate::new(self.models.image_model_id.as_str())
            .with_param("input_path", object_name)
            .with_param("texture_resolution", request.texture_resolution)
            .with_param("remesh_option", request.remesh.as_str())
            .with_param("foreground_ratio", self.models.foreground_ratio)
    }
}

fn lock(state: &Mutex<SubmissionState>) -> MutexGuard<'_, SubmissionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One pass through `Submitting`.
///
/// Leaves `Submitting` when dropped, whichever way the attempt ends: an
/// outcome that was never recorded (the future was dropped, or a step
/// panicked) counts as a failure.
struct SubmissionAttempt<'a> {
    state: &'a Mutex<SubmissionState>,
    finished: bool,
}

impl<'a> SubmissionAttempt<'a> {
    /// Enter `Submitting` and clear the previous error, or `None` if a
    /// submission is already running.
    fn begin(state: &'a Mutex<SubmissionState>) -> Option<Self> {
        let mut guard = lock(state);
        if !guard.phase.accepts_submit() {
            return None;
        }
        guard.phase = SubmissionPhase::Submitting;
        guard.in_progress = true;
        guard.last_error = None;
        Some(Self {
            state,
            finished: false,
        })
    }

    fn succeed(mut self, job: JobRead) {
        let mut guard = lock(self.state);
        guard.phase = SubmissionPhase::Succeeded;
        guard.last_job = Some(job);
        self.finished = true;
    }

    fn fail(mut self, message: String) {
        let mut guard = lock(self.state);
        guard.phase = SubmissionPhase::Failed;
        guard.last_error = Some(message);
        self.finished = true;
    }
}

impl Drop for SubmissionAttempt<'_> {
    fn drop(&mut self) {
        let mut guard = lock(self.state);
        if !self.finished {
            guard.phase = SubmissionPhase::Failed;
            guard.last_error = Some(GENERIC_FAILURE_MESSAGE.to_string());
        }
        guard.in_progress = false;
    }
}
