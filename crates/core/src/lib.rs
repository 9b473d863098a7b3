pub mod config;
pub mod jobs;
pub mod orchestrator;
pub mod session;
pub mod testing;
pub mod transport;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, ApiConfig, Config,
    ConfigError, ModelsConfig, SessionConfig,
};
pub use jobs::{
    HttpJobService, JobCreate, JobDownload, JobRead, JobService, JobStatus, StorageUploader,
    UploadFile, UploadProgress, UploadTicket,
};
pub use orchestrator::{
    SubmissionOrchestrator, SubmissionPhase, SubmissionState, SubmitError, SubmitMode,
    SubmitRequest,
};
pub use session::{
    FileSessionStore, MemorySessionStore, SessionError, SessionEvent, SessionEvents, SessionStore,
};
pub use transport::{ApiClient, ApiError};
