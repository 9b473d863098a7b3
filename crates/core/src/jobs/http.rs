//! HTTP implementation of the job service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::session::{SessionEvents, SessionStore};
use crate::transport::{ApiClient, ApiError, SessionGuard};

use super::{
    JobCreate, JobDownload, JobRead, JobService, ProgressCallback, StorageUploader, UploadFile,
    UploadTicket, UploadTicketRequest,
};

/// Job service backed by the jobs REST API and presigned storage uploads.
#[derive(Clone)]
pub struct HttpJobService {
    api: ApiClient,
    storage: StorageUploader,
}

impl HttpJobService {
    pub fn new(api: ApiClient, storage: StorageUploader) -> Self {
        Self { api, storage }
    }

    /// Build the authenticated API client and storage uploader from config,
    /// both bound to the same session store and event channel.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn SessionStore>,
        events: SessionEvents,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::authenticated(
            &config.api,
            Arc::clone(&store),
            &config.session.api_key_key,
            events.clone(),
        )?;
        let storage = StorageUploader::new().with_session_guard(SessionGuard::new(store, events));
        Ok(Self::new(api, storage))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

#[async_trait]
impl JobService for HttpJobService {
    async fn get_upload_ticket(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadTicket, ApiError> {
        let request = UploadTicketRequest {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
        };
        let ticket: UploadTicket = self.api.post_json("/jobs/upload-ticket", &request).await?;
        debug!("Received upload ticket for {}: {}", filename, ticket.object_name);
        Ok(ticket)
    }

    async fn upload_file_to_storage(
        &self,
        presigned_url: &str,
        file: &UploadFile,
        progress: Option<ProgressCallback>,
    ) -> Result<(), ApiError> {
        self.storage.upload(presigned_url, file, progress).await
    }

    async fn create_job(&self, payload: &JobCreate) -> Result<JobRead, ApiError> {
        self.api.post_json("/jobs", payload).await
    }

    async fn get_job(&self, job_id: &str) -> Result<JobRead, ApiError> {
        self.api
            .get_json(&format!("/jobs/{}", urlencoding::encode(job_id)))
            .await
    }

    async fn get_download_link(&self, job_id: &str) -> Result<JobDownload, ApiError> {
        self.api
            .get_json(&format!("/jobs/{}/download", urlencoding::encode(job_id)))
            .await
    }
}
