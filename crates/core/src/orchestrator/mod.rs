//! Submission orchestrator for text-to-3D and image-to-3D jobs.
//!
//! The orchestrator turns what the user entered into backend calls:
//! - **Text**: validate the prompt, then create the job
//! - **Image**: validate the file, get an upload ticket, upload the file
//!   straight to storage, then create the job referencing the stored object
//!
//! Only one submission runs at a time per orchestrator.

mod runner;
mod types;

pub use runner::SubmissionOrchestrator;
pub use types::{
    SubmissionPhase, SubmissionState, SubmitError, SubmitMode, SubmitRequest,
    GENERIC_FAILURE_MESSAGE, IMAGE_REQUIRED_MESSAGE, PROMPT_REQUIRED_MESSAGE,
};
