//! Submission flow integration tests.
//!
//! These tests drive the orchestrator against the in-process backend over
//! real HTTP: text submissions, the three-step image flow, error messages
//! surfaced from backend responses, and job lookups.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use common::{Route, TestBackend, TEST_API_KEY};
use labcg_core::{
    testing::fixtures, ApiError, JobService, JobStatus, ModelsConfig, SubmissionOrchestrator,
    SubmissionPhase, SubmitRequest, UploadProgress,
};

fn orchestrator(service: labcg_core::HttpJobService) -> SubmissionOrchestrator {
    SubmissionOrchestrator::new(Arc::new(service), ModelsConfig::default())
}

#[tokio::test]
async fn test_text_submission_creates_job() {
    let backend = TestBackend::start().await;
    let (service, _store, _events) = backend.service();
    let orch = orchestrator(service);

    let request = SubmitRequest::text("a low-poly fox")
        .with_steps(500)
        .with_guidance(75.5)
        .with_seed(1234);
    assert!(orch.submit(request).await);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let create = &requests[0];
    assert_eq!(create.route, Route::CreateJob);
    assert_eq!(create.header("x-api-key"), Some(TEST_API_KEY));
    assert_eq!(create.header("content-type"), Some("application/json"));
    assert_eq!(
        create.json(),
        json!({
            "model_id": "dreamfusion-sd",
            "input_params": {
                "prompt": "a low-poly fox",
                "max_steps": 500,
                "guidance_scale": 75.5,
                "seed": 1234,
                "random_bg": true
            }
        })
    );

    let job = orch.last_job().expect("job should be recorded");
    assert_eq!(job.model_id, "dreamfusion-sd");
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.prompt.as_deref(), Some("a low-poly fox"));
    assert_eq!(orch.phase(), SubmissionPhase::Succeeded);
    assert!(orch.last_error().is_none());
}

#[tokio::test]
async fn test_image_submission_uploads_then_creates_job() {
    let backend = TestBackend::start().await;
    let (service, _store, _events) = backend.service();

    let progress = Arc::new(Mutex::new(Vec::<UploadProgress>::new()));
    let orch = orchestrator(service).with_upload_progress({
        let progress = Arc::clone(&progress);
        Arc::new(move |p: UploadProgress| progress.lock().unwrap().push(p))
    });

    // Spans several body chunks
    let file = fixtures::png_file("chair.png", 200 * 1024);
    let request = SubmitRequest::image(Some(file.clone()))
        .with_texture_resolution(2048)
        .with_remesh("quad");
    assert!(orch.submit(request).await);

    let requests = backend.requests();
    let routes: Vec<Route> = requests.iter().map(|r| r.route).collect();
    assert_eq!(
        routes,
        vec![Route::UploadTicket, Route::StoragePut, Route::CreateJob]
    );

    assert_eq!(
        requests[0].json(),
        json!({ "filename": "chair.png", "content_type": "image/png" })
    );
    assert_eq!(requests[0].header("x-api-key"), Some(TEST_API_KEY));

    // Storage sees the raw file with its own content type and no credential
    let put = &requests[1];
    assert_eq!(put.header("content-type"), Some("image/png"));
    assert_eq!(put.header("content-length"), Some("204800"));
    assert!(put.header("x-api-key").is_none());
    assert_eq!(put.body, file.data);

    let create = requests[2].json();
    let object_name = create["input_params"]["input_path"].as_str().unwrap();
    assert!(object_name.starts_with("uploads/inputs/"));
    assert!(object_name.ends_with("-chair.png"));
    assert_eq!(backend.stored_object(object_name), Some(file.data.clone()));
    assert_eq!(
        create,
        json!({
            "model_id": "sf3d-v1",
            "input_params": {
                "input_path": object_name,
                "texture_resolution": 2048,
                "remesh_option": "quad",
                "foreground_ratio": 0.85
            }
        })
    );

    let progress = progress.lock().unwrap();
    assert!(progress.len() >= 2);
    assert!(progress.windows(2).all(|w| w[0].loaded <= w[1].loaded));
    let last = progress.last().unwrap();
    assert_eq!(last.loaded, 200 * 1024);
    assert_eq!(last.percent(), 100);
}

#[tokio::test]
async fn test_ticket_rejection_surfaces_detail() {
    let backend = TestBackend::start().await;
    backend.reject(
        Route::UploadTicket,
        400,
        r#"{"detail":"Only PNG and JPEG images are accepted."}"#,
    );
    let (service, _store, _events) = backend.service();
    let orch = orchestrator(service);

    let file = labcg_core::UploadFile::new("notes.txt", "text/plain", b"hello".to_vec());
    assert!(!orch.submit(SubmitRequest::image(Some(file))).await);

    assert_eq!(
        orch.last_error().as_deref(),
        Some("Only PNG and JPEG images are accepted.")
    );
    assert_eq!(orch.phase(), SubmissionPhase::Failed);
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_storage_failure_skips_job_creation() {
    let backend = TestBackend::start().await;
    backend.reject(
        Route::StoragePut,
        500,
        "<Error><Code>InternalError</Code></Error>",
    );
    let (service, _store, _events) = backend.service();
    let orch = orchestrator(service);

    let file = fixtures::png_file("lamp.png", 1024);
    assert!(!orch.submit(SubmitRequest::image(Some(file))).await);

    assert!(backend.requests_to(Route::CreateJob).is_empty());
    assert_eq!(
        orch.last_error().as_deref(),
        Some("Request failed with status code 500")
    );
}

#[tokio::test]
async fn test_validation_error_from_backend() {
    let backend = TestBackend::start().await;
    backend.reject(
        Route::CreateJob,
        422,
        r#"{"detail":[{"loc":["body","model_id"],"msg":"field required"}]}"#,
    );
    let (service, _store, _events) = backend.service();
    let orch = orchestrator(service);

    assert!(!orch.submit(SubmitRequest::text("a cup")).await);

    // Non-string detail is shown as its JSON text
    let message = orch.last_error().unwrap();
    assert!(message.contains("field required"), "got: {}", message);
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend = TestBackend::start().await;
    backend.delay(Route::CreateJob, Duration::from_millis(1500));

    let mut config = backend.config();
    config.api.timeout_ms = 200;
    let (service, _store, _events) = backend.service_with_config(&config);
    let orch = orchestrator(service);

    assert!(!orch.submit(SubmitRequest::text("a clock")).await);
    assert_eq!(orch.last_error().as_deref(), Some("Request timeout"));
    assert!(!orch.is_submitting());
}

#[tokio::test]
async fn test_storage_upload_ignores_api_timeout() {
    let backend = TestBackend::start().await;
    backend.delay(Route::StoragePut, Duration::from_millis(600));

    let mut config = backend.config();
    config.api.timeout_ms = 200;
    let (service, _store, _events) = backend.service_with_config(&config);
    let orch = orchestrator(service);

    let file = fixtures::png_file("slow.png", 4096);
    assert!(orch.submit(SubmitRequest::image(Some(file))).await);
}

#[tokio::test]
async fn test_job_status_and_download_link() {
    let backend = TestBackend::start().await;
    let (service, _store, _events) = backend.service();
    let service = Arc::new(service);
    let orch = SubmissionOrchestrator::new(
        Arc::clone(&service) as Arc<dyn JobService>,
        ModelsConfig::default(),
    );

    assert!(orch.submit(SubmitRequest::text("a bonsai tree")).await);
    let created = orch.last_job().unwrap();

    let fetched = service.get_job(&created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.status, JobStatus::Pending);

    let err = service.get_download_link(&created.id).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.detail(), Some("Job output is not ready"));

    backend.set_job_status(&created.id, "SUCCEEDED");
    let link = service.get_download_link(&created.id).await.unwrap();
    assert!(link.download_url.contains(&created.id));
    assert_eq!(link.expires_in, 3600);

    let missing = service.get_job("does-not-exist").await.unwrap_err();
    assert!(matches!(missing, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_relative_base_url_uses_origin() {
    let backend = TestBackend::start().await;
    let mut config = backend.config();
    config.api.base_url = "/api/v1".to_string();
    config.api.origin = format!("http://{}", backend.addr);
    let (service, _store, _events) = backend.service_with_config(&config);
    let orch = orchestrator(service);

    assert!(orch.submit(SubmitRequest::text("a kettle")).await);
    assert_eq!(backend.requests_to(Route::CreateJob).len(), 1);
}
