//! Job service: upload tickets, direct-to-storage uploads and job creation.

mod file;
mod http;
mod service;
mod storage;
mod types;

pub use file::{ProgressCallback, UploadFile, UploadProgress};
pub use http::HttpJobService;
pub use service::JobService;
pub use storage::StorageUploader;
pub use types::*;
