//! Subcommand implementations.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use tokio::sync::broadcast;
use tracing::info;

use labcg_core::jobs::ProgressCallback;
use labcg_core::{
    ApiError, Config, HttpJobService, JobRead, JobService, SessionEvent, SessionEvents,
    SessionStore, SubmissionOrchestrator, SubmitError, SubmitRequest, UploadFile, UploadProgress,
};

/// Store the credential.
pub fn login(config: &Config, store: &dyn SessionStore, api_key: &str) -> Result<()> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    store
        .set(&config.session.api_key_key, api_key)
        .context("Failed to save API key")?;
    info!("API key saved");
    println!("Logged in.");
    Ok(())
}

/// Wipe all session state.
pub fn logout(store: &dyn SessionStore) -> Result<()> {
    store.clear().context("Failed to clear session")?;
    println!("Logged out.");
    Ok(())
}

/// Job service and orchestrator for backend commands, plus a watch on
/// session invalidation.
pub struct Client {
    service: Arc<HttpJobService>,
    orchestrator: SubmissionOrchestrator,
    invalidations: broadcast::Receiver<SessionEvent>,
}

impl Client {
    pub fn new(config: Config, store: Arc<dyn SessionStore>) -> Result<Self> {
        if store.get(&config.session.api_key_key)?.is_none() {
            eprintln!("Not logged in; requests will be sent without an API key.");
        }

        let events = SessionEvents::new();
        let invalidations = events.subscribe();
        let service = Arc::new(
            HttpJobService::from_config(&config, store, events)
                .context("Failed to create job service")?,
        );
        let orchestrator = SubmissionOrchestrator::new(
            Arc::clone(&service) as Arc<dyn JobService>,
            config.models.clone(),
        )
        .with_upload_progress(terminal_progress());

        Ok(Self {
            service,
            orchestrator,
            invalidations,
        })
    }

    pub async fn submit_text(
        &self,
        prompt: String,
        steps: u32,
        guidance: f64,
        seed: i64,
    ) -> Result<()> {
        let request = SubmitRequest::text(prompt)
            .with_steps(steps)
            .with_guidance(guidance)
            .with_seed(seed);
        self.submit(request).await
    }

    pub async fn submit_image(
        &self,
        path: &Path,
        texture_resolution: u32,
        remesh: String,
    ) -> Result<()> {
        let file = UploadFile::from_path(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        let request = SubmitRequest::image(Some(file))
            .with_texture_resolution(texture_resolution)
            .with_remesh(remesh);
        self.submit(request).await
    }

    async fn submit(&self, request: SubmitRequest) -> Result<()> {
        if self.orchestrator.submit(request).await {
            let job = self
                .orchestrator
                .last_job()
                .ok_or_else(|| anyhow!("Job was created but not recorded"))?;
            print_job(&job)
        } else {
            Err(anyhow!(self
                .orchestrator
                .last_error()
                .unwrap_or_else(|| "Submission rejected".to_string())))
        }
    }

    pub async fn status(&self, job_id: &str) -> Result<()> {
        let job = self.service.get_job(job_id).await.map_err(user_error)?;
        print_job(&job)
    }

    pub async fn download(&self, job_id: &str) -> Result<()> {
        let link = self
            .service
            .get_download_link(job_id)
            .await
            .map_err(user_error)?;
        println!("{}", link.download_url);
        eprintln!("Link expires in {} seconds.", link.expires_in);
        Ok(())
    }

    /// Tell the user to log in again if the backend rejected the credential,
    /// then pass `result` through.
    pub fn finish(mut self, result: Result<()>) -> Result<()> {
        if let Ok(SessionEvent::Invalidated { status, .. }) = self.invalidations.try_recv() {
            eprintln!(
                "Session rejected by the backend (HTTP {}). Run `labcg login` again.",
                status
            );
        }
        result
    }
}

fn user_error(e: ApiError) -> anyhow::Error {
    anyhow!(SubmitError::from(e).user_message())
}

fn print_job(job: &JobRead) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(job)?);
    Ok(())
}

/// Upload percentage on stderr, redrawn in place, once per change.
fn terminal_progress() -> ProgressCallback {
    let last = Mutex::new(None);
    Arc::new(move |p: UploadProgress| {
        let percent = p.percent();
        let mut last = last.lock().unwrap_or_else(|e| e.into_inner());
        if *last == Some(percent) {
            return;
        }
        *last = Some(percent);
        eprint!("\rUploading... {}%", percent);
        if percent >= 100 {
            eprintln!();
        }
    })
}
