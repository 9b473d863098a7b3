//! Types for the submission orchestrator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::jobs::{JobRead, UploadFile};
use crate::transport::ApiError;

/// Shown when a text submission has no prompt.
pub const PROMPT_REQUIRED_MESSAGE: &str = "Please describe the object in the prompt.";

/// Shown when an image submission has no file.
pub const IMAGE_REQUIRED_MESSAGE: &str = "Select a reference image (PNG/JPG).";

/// Shown when a failure carries neither a backend detail nor a message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to start generation.";

/// Which generation flow a submission takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubmitMode {
    /// Text-to-3D: parameters only, one call.
    Text,
    /// Image-to-3D: ticket, storage upload, then job creation.
    Image,
}

impl fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitMode::Text => write!(f, "TEXT"),
            SubmitMode::Image => write!(f, "IMAGE"),
        }
    }
}

impl FromStr for SubmitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" => Ok(SubmitMode::Text),
            "IMAGE" => Ok(SubmitMode::Image),
            other => Err(format!("unknown submit mode: {}", other)),
        }
    }
}

/// Everything the user entered for one submission.
///
/// Fields of the flow not selected by `mode` are ignored.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub mode: SubmitMode,
    // Text flow
    pub prompt: String,
    pub steps: u32,
    pub guidance: f64,
    pub seed: i64,
    // Image flow
    pub file: Option<UploadFile>,
    pub texture_resolution: u32,
    pub remesh: String,
}

impl Default for SubmitRequest {
    fn default() -> Self {
        Self {
            mode: SubmitMode::Text,
            prompt: String::new(),
            steps: 1000,
            guidance: 100.0,
            seed: 0,
            file: None,
            texture_resolution: 1024,
            remesh: "triangle".to_string(),
        }
    }
}

impl SubmitRequest {
    /// A text-to-3D request with default parameters.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            mode: SubmitMode::Text,
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// An image-to-3D request with default parameters.
    pub fn image(file: Option<UploadFile>) -> Self {
        Self {
            mode: SubmitMode::Image,
            file,
            ..Default::default()
        }
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_guidance(mut self, guidance: f64) -> Self {
        self.guidance = guidance;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_texture_resolution(mut self, resolution: u32) -> Self {
        self.texture_resolution = resolution;
        self
    }

    pub fn with_remesh(mut self, remesh: impl Into<String>) -> Self {
        self.remesh = remesh.into();
        self
    }
}

/// Where the orchestrator is in its submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmissionPhase {
    /// Whether a new submission may start from this phase.
    pub fn accepts_submit(&self) -> bool {
        !matches!(self, SubmissionPhase::Submitting)
    }
}

/// Snapshot of orchestrator state.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionState {
    pub phase: SubmissionPhase,
    /// True for the whole duration of a submission.
    pub in_progress: bool,
    /// User-facing message of the last failed submission.
    pub last_error: Option<String>,
    /// Job created by the last successful submission.
    pub last_job: Option<JobRead>,
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self {
            phase: SubmissionPhase::Idle,
            in_progress: false,
            last_error: None,
            last_job: None,
        }
    }
}

/// Why a submission failed.
#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    /// Input rejected before any network call.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Another submission on this orchestrator has not finished.
    #[error("A submission is already in progress")]
    Busy,
}

impl SubmitError {
    /// Message to show the user: the backend's error detail if the failing
    /// response carried one, else the raw error message, else a generic
    /// fallback.
    pub fn user_message(&self) -> String {
        if let SubmitError::Api(e) = self {
            if let Some(detail) = e.detail().filter(|d| !d.is_empty()) {
                return detail.to_string();
            }
        }

        let raw = self.to_string();
        if raw.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            raw
        }
    }
}
