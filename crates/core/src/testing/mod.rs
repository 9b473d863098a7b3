//! Testing utilities and mock implementations.
//!
//! Lets the orchestrator and its callers be tested without a backend or
//! object storage.
//!
//! # Example
//!
//! ```rust,ignore
//! use labcg_core::testing::{MockJobService, fixtures};
//!
//! let service = Arc::new(MockJobService::new());
//! service.set_ticket(fixtures::upload_ticket("uploads/inputs/chair.png")).await;
//!
//! let orchestrator = SubmissionOrchestrator::new(service.clone(), ModelsConfig::default());
//! ```

mod mock_job_service;

pub use mock_job_service::{MockJobService, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::DateTime;

    use crate::jobs::{InputParams, JobRead, JobStatus, UploadFile, UploadTicket};

    /// PNG signature and IHDR chunk of a 1x1 image.
    const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89,
    ];

    /// Create an upload ticket for `object_name` on a fake storage host.
    pub fn upload_ticket(object_name: &str) -> UploadTicket {
        UploadTicket {
            upload_url: format!(
                "https://storage.test/{}?X-Amz-Signature=deadbeef",
                object_name
            ),
            object_name: object_name.to_string(),
            expires_in: Some(900),
        }
    }

    /// Create a PNG upload of `size` bytes.
    pub fn png_file(name: &str, size: usize) -> UploadFile {
        let mut data = PNG_HEADER.to_vec();
        data.resize(size.max(PNG_HEADER.len()), 0);
        UploadFile::new(name, "image/png", data)
    }

    /// Create a job with a fixed creation time and no parameters.
    pub fn job_read(id: &str, model_id: &str, status: JobStatus) -> JobRead {
        JobRead {
            id: id.to_string(),
            model_id: model_id.to_string(),
            status,
            // 2025-01-15T10:30:00Z
            created_at: DateTime::from_timestamp(1_736_937_000, 0).unwrap_or_default(),
            prompt: None,
            input_params: InputParams::new(),
            progress_percent: None,
            started_at: None,
            completed_at: None,
        }
    }
}
