//! In-process backend and object storage for integration tests.
//!
//! One axum server plays both roles: the jobs API under `/api/v1` and a
//! presigned-URL storage endpoint under `/storage`. Every request is recorded
//! with its headers so tests can assert what went over the wire.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use labcg_core::{
    Config, HttpJobService, MemorySessionStore, SessionEvents, SessionStore,
};

/// Credential stored in the session by [`TestBackend::service`].
pub const TEST_API_KEY: &str = "lab-key-123";

/// Backend routes that can be rejected or slowed down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    UploadTicket,
    StoragePut,
    CreateJob,
    GetJob,
    Download,
}

/// A request the backend received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub route: Route,
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

#[derive(Default)]
struct BackendState {
    requests: Vec<RecordedRequest>,
    rejections: HashMap<Route, (StatusCode, String)>,
    delays: HashMap<Route, Duration>,
    jobs: HashMap<String, Value>,
    stored_objects: HashMap<String, Bytes>,
}

#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<BackendState>>,
    base: String,
}

/// Running mock backend.
pub struct TestBackend {
    pub addr: SocketAddr,
    state: Arc<Mutex<BackendState>>,
    _server: tokio::task::JoinHandle<()>,
}

impl TestBackend {
    /// Start the backend on a free local port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test backend");
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(Mutex::new(BackendState::default()));
        let app_state = AppState {
            inner: Arc::clone(&state),
            base: format!("http://{}", addr),
        };

        let router = Router::new()
            .route("/api/v1/jobs/upload-ticket", post(upload_ticket))
            .route("/api/v1/jobs", post(create_job))
            .route("/api/v1/jobs/{id}", get(get_job))
            .route("/api/v1/jobs/{id}/download", get(download_link))
            .route("/storage/{*object}", put(storage_put))
            .with_state(app_state);

        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            state,
            _server: server,
        }
    }

    /// Config pointing at this backend with an absolute base URL.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.api.base_url = format!("http://{}/api/v1", self.addr);
        config
    }

    /// Job service with a logged-in session.
    pub fn service(&self) -> (HttpJobService, Arc<MemorySessionStore>, SessionEvents) {
        self.service_with_config(&self.config())
    }

    pub fn service_with_config(
        &self,
        config: &Config,
    ) -> (HttpJobService, Arc<MemorySessionStore>, SessionEvents) {
        let store = Arc::new(MemorySessionStore::with_value(
            &config.session.api_key_key,
            TEST_API_KEY,
        ));
        let events = SessionEvents::new();
        let service = HttpJobService::from_config(
            config,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            events.clone(),
        )
        .expect("Failed to build job service");
        (service, store, events)
    }

    /// Answer every request on `route` with `status` and `body`.
    pub fn reject(&self, route: Route, status: u16, body: &str) {
        self.state.lock().unwrap().rejections.insert(
            route,
            (StatusCode::from_u16(status).unwrap(), body.to_string()),
        );
    }

    /// Delay every response on `route`.
    pub fn delay(&self, route: Route, delay: Duration) {
        self.state.lock().unwrap().delays.insert(route, delay);
    }

    /// Overwrite the status of a created job.
    pub fn set_job_status(&self, id: &str, status: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.jobs.get_mut(id) {
            job["status"] = json!(status);
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, route: Route) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.route == route)
            .collect()
    }

    pub fn stored_object(&self, object_name: &str) -> Option<Bytes> {
        self.state
            .lock()
            .unwrap()
            .stored_objects
            .get(object_name)
            .cloned()
    }
}

/// Record the request, then apply any configured delay and rejection.
async fn intercept(
    state: &AppState,
    route: Route,
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
) -> Option<Response> {
    let (delay, rejection) = {
        let mut inner = state.inner.lock().unwrap();
        inner.requests.push(RecordedRequest {
            route,
            method,
            path,
            headers,
            body,
        });
        (
            inner.delays.get(&route).copied(),
            inner.rejections.get(&route).cloned(),
        )
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    rejection.map(|(status, body)| {
        (status, [("content-type", "application/json")], body).into_response()
    })
}

async fn upload_ticket(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(rejected) = intercept(
        &state,
        Route::UploadTicket,
        Method::POST,
        "/api/v1/jobs/upload-ticket".to_string(),
        headers,
        body.clone(),
    )
    .await
    {
        return rejected;
    }

    let request: Value = serde_json::from_slice(&body).unwrap_or_default();
    let filename = request["filename"].as_str().unwrap_or("upload.bin");
    let object_name = format!("uploads/inputs/{}-{}", uuid::Uuid::new_v4(), filename);

    Json(json!({
        "upload_url": format!("{}/storage/{}?X-Amz-Signature=abc123", state.base, object_name),
        "object_name": object_name,
        "expires_in": 900
    }))
    .into_response()
}

async fn storage_put(
    State(state): State<AppState>,
    Path(object): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(rejected) = intercept(
        &state,
        Route::StoragePut,
        Method::PUT,
        format!("/storage/{}", object),
        headers,
        body.clone(),
    )
    .await
    {
        return rejected;
    }

    state
        .inner
        .lock()
        .unwrap()
        .stored_objects
        .insert(object, body);
    StatusCode::OK.into_response()
}

async fn create_job(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(rejected) = intercept(
        &state,
        Route::CreateJob,
        Method::POST,
        "/api/v1/jobs".to_string(),
        headers,
        body.clone(),
    )
    .await
    {
        return rejected;
    }

    let request: Value = serde_json::from_slice(&body).unwrap_or_default();
    let id = uuid::Uuid::new_v4().to_string();
    let job = json!({
        "id": id,
        "model_id": request["model_id"],
        "status": "QUEUED",
        "prompt": request["input_params"]["prompt"],
        "input_params": request["input_params"],
        "progress_percent": 0,
        "created_at": "2025-01-15T10:30:00.123456",
        "started_at": null,
        "completed_at": null
    });
    state.inner.lock().unwrap().jobs.insert(id, job.clone());

    (StatusCode::CREATED, Json(job)).into_response()
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejected) = intercept(
        &state,
        Route::GetJob,
        Method::GET,
        format!("/api/v1/jobs/{}", id),
        headers,
        Bytes::new(),
    )
    .await
    {
        return rejected;
    }

    match state.inner.lock().unwrap().jobs.get(&id) {
        Some(job) => Json(job.clone()).into_response(),
        None => not_found(),
    }
}

async fn download_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejected) = intercept(
        &state,
        Route::Download,
        Method::GET,
        format!("/api/v1/jobs/{}/download", id),
        headers,
        Bytes::new(),
    )
    .await
    {
        return rejected;
    }

    let status = match state.inner.lock().unwrap().jobs.get(&id) {
        Some(job) => job["status"].as_str().unwrap_or_default().to_string(),
        None => return not_found(),
    };
    if status != "SUCCEEDED" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "detail": "Job output is not ready" })),
        )
            .into_response();
    }

    Json(json!({
        "download_url": format!("{}/storage/outputs/{}.glb?X-Amz-Signature=abc123", state.base, id),
        "expires_in": 3600
    }))
    .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Job not found" })),
    )
        .into_response()
}
