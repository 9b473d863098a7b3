//! Configured HTTP client for backend calls.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::session::{SessionEvents, SessionStore};

use super::{ApiError, CredentialInjector, Interceptor, SessionGuard};

/// Backend API client.
///
/// Every request goes through the registered interceptors in order:
/// `on_request` before sending, `on_response` once the status is known and
/// before a non-2xx status is turned into [`ApiError::Status`].
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ApiClient {
    /// Create a client with no interceptors.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.resolved_base_url(),
            interceptors: Vec::new(),
        })
    }

    /// Create a client wired to the session: credential injection on the way
    /// out, session invalidation on 401/403 on the way back.
    pub fn authenticated(
        config: &ApiConfig,
        store: Arc<dyn SessionStore>,
        credential_key: &str,
        events: SessionEvents,
    ) -> Result<Self, ApiError> {
        let header = HeaderName::from_bytes(config.api_key_header.trim().as_bytes())
            .map_err(|e| ApiError::Request(format!("Invalid credential header name: {}", e)))?;

        Ok(Self::new(config)?
            .with_interceptor(CredentialInjector::new(
                Arc::clone(&store),
                credential_key,
                header,
            ))
            .with_interceptor(SessionGuard::new(store, events)))
    }

    /// Append an interceptor to the chain.
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Absolute base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.client.get(self.url(path))).await?;
        decode(response).await
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.client.post(self.url(path)).json(body))
            .await?;
        decode(response).await
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let mut request = builder.build()?;
        for interceptor in &self.interceptors {
            interceptor.on_request(&mut request);
        }

        debug!("{} {}", request.method(), request.url());

        let response = self.client.execute(request).await?;
        let status = response.status();

        for interceptor in &self.interceptors {
            interceptor.on_response(status, response.url());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Request failed with HTTP {}", status);
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
