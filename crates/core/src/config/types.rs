use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base address of the API. Either absolute (`https://host/api/v1`) or a
    /// path prefix resolved against `origin`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Origin used when `base_url` is only a path prefix.
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Request timeout for backend calls in milliseconds (default: 10000).
    /// Storage uploads are not bound by it.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Header carrying the credential on authenticated calls.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
}

impl ApiConfig {
    /// Absolute base URL with no trailing slash.
    pub fn resolved_base_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!(
                "{}/{}",
                self.origin.trim_end_matches('/'),
                base.trim_start_matches('/')
            )
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            origin: default_origin(),
            timeout_ms: default_timeout_ms(),
            api_key_header: default_api_key_header(),
        }
    }
}

fn default_base_url() -> String {
    "/api/v1".to_string()
}

fn default_origin() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_api_key_header() -> String {
    "x-api-key".to_string()
}

/// Persisted client state configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// File backing the session store.
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
    /// Key the credential is stored under.
    #[serde(default = "default_api_key_key")]
    pub api_key_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
            api_key_key: default_api_key_key(),
        }
    }
}

fn default_session_path() -> PathBuf {
    PathBuf::from("labcg-session.json")
}

fn default_api_key_key() -> String {
    "labcg_api_key".to_string()
}

/// Generation model identifiers and fixed model parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelsConfig {
    /// Text-to-3D model.
    #[serde(default = "default_text_model_id")]
    pub text_model_id: String,
    /// Image-to-3D model.
    #[serde(default = "default_image_model_id")]
    pub image_model_id: String,
    /// Foreground ratio sent with every image job.
    #[serde(default = "default_foreground_ratio")]
    pub foreground_ratio: f64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            text_model_id: default_text_model_id(),
            image_model_id: default_image_model_id(),
            foreground_ratio: default_foreground_ratio(),
        }
    }
}

fn default_text_model_id() -> String {
    "dreamfusion-sd".to_string()
}

fn default_image_model_id() -> String {
    "sf3d-v1".to_string()
}

fn default_foreground_ratio() -> f64 {
    0.85
}
