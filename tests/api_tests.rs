//! Integration tests for the FlowState HTTP API.
//!
//! The extraction service is replaced by an in-process `VisionClient`, so no
//! network access is needed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::util::ServiceExt; // for `oneshot`

use flowstate::api::{build_router, AppState};
use flowstate::config::Config;
use flowstate::intake::{ImageUpload, MAX_IMAGE_BYTES};
use flowstate::llm::{LlmError, StructuredRequest, StructuredResponse, VisionClient};
use flowstate::service::GENERIC_FAILURE_MESSAGE;
use flowstate::SessionView;

const BOUNDARY: &str = "flowstate-test-boundary";

const REVENUE_JSON: &str = r#"{
    "objective": "Grow Q3 revenue",
    "keyResults": ["A", "B", "C"],
    "tasks": [
        {"title": "Launch influencer campaign", "description": "", "hours": 8},
        {"title": "Fix bug", "description": "", "hours": 3}
    ]
}"#;

/// Vision client returning a fixed outcome, optionally after a gate opens.
struct StubVision {
    reply: Option<&'static str>,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl VisionClient for StubVision {
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> Result<StructuredResponse, LlmError> {
        assert!(!request.image.data.starts_with("data:"));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.reply {
            Some(text) => Ok(StructuredResponse {
                text: Some(text.to_string()),
                ..Default::default()
            }),
            None => Err(LlmError::network_error("connection refused".to_string())),
        }
    }
}

fn setup_app(reply: Option<&'static str>, gate: Option<Arc<Notify>>) -> Router {
    let state = AppState::new(
        Config::new("test-key".to_string()),
        Arc::new(StubVision { reply, gate }),
    );
    build_router(Arc::new(state))
}

fn multipart_request(field: &str, content_type: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_upload() -> Request<Body> {
    multipart_request("file", "image/png", "sketch.png", &[0x89, b'P', b'N', b'G'])
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).expect("Should parse JSON"))
}

/// Poll the board until it leaves `analyzing`.
async fn wait_for_outcome(app: &Router) -> Value {
    for _ in 0..200 {
        let (_, board) = send_json(app, empty_request("GET", "/api/board")).await;
        if board["view"] != "analyzing" {
            return board;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("analysis never finished");
}

#[tokio::test]
async fn test_health() {
    let app = setup_app(Some(REVENUE_JSON), None);
    let (status, body) = send_json(&app, empty_request("GET", "/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_initial_board_is_upload() {
    let app = setup_app(Some(REVENUE_JSON), None);
    let (status, body) = send_json(&app, empty_request("GET", "/api/board")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"view": "upload", "project": null, "error": null, "budget": null})
    );
}

#[tokio::test]
async fn test_analyze_to_dashboard() {
    let app = setup_app(Some(REVENUE_JSON), None);

    let (status, body) = send_json(&app, png_upload()).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["view"], "analyzing");

    let board = wait_for_outcome(&app).await;
    assert_eq!(board["view"], "dashboard");
    assert_eq!(board["project"]["objective"], "Grow Q3 revenue");
    assert_eq!(board["project"]["keyResults"], json!(["A", "B", "C"]));

    let tasks = board["project"]["tasks"].as_array().unwrap();
    assert_eq!(tasks[0]["title"], "Launch influencer campaign");
    assert_eq!(tasks[0]["priority"], "high");
    assert_eq!(tasks[0]["status"], "todo");
    assert_eq!(tasks[1]["title"], "Fix bug");
    assert_eq!(tasks[1]["priority"], "normal");
    assert_ne!(tasks[0]["id"], tasks[1]["id"]);

    assert_eq!(board["budget"]["totalHours"], 11);
    assert_eq!(board["budget"]["totalCost"], 1650);
}

#[tokio::test]
async fn test_image_field_alias_accepted() {
    let app = setup_app(Some(REVENUE_JSON), None);
    let request = multipart_request("image", "image/jpeg", "board.jpg", b"\xff\xd8\xff");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_non_image_rejected_inline() {
    let app = setup_app(Some(REVENUE_JSON), None);
    let request = multipart_request("file", "text/plain", "notes.txt", b"objective: win");

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (_, board) = send_json(&app, empty_request("GET", "/api/board")).await;
    assert_eq!(board["view"], "upload");
}

#[tokio::test]
async fn test_oversized_image_rejected_inline() {
    let app = setup_app(Some(REVENUE_JSON), None);
    let data = vec![0u8; MAX_IMAGE_BYTES];
    let request = multipart_request("file", "image/png", "huge.png", &data);

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (_, board) = send_json(&app, empty_request("GET", "/api/board")).await;
    assert_eq!(board["view"], "upload");
}

#[tokio::test]
async fn test_oversized_non_image_reports_type() {
    let app = setup_app(Some(REVENUE_JSON), None);
    let data = vec![b'a'; MAX_IMAGE_BYTES + 10];
    let request = multipart_request("file", "text/plain", "dump.txt", &data);

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_missing_file_field() {
    let app = setup_app(Some(REVENUE_JSON), None);
    let request = multipart_request("attachment", "image/png", "x.png", b"png");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extraction_failure_shows_error_view() {
    let app = setup_app(None, None);

    let (status, _) = send(&app, png_upload()).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let board = wait_for_outcome(&app).await;
    assert_eq!(board["view"], "error");
    assert_eq!(board["error"], GENERIC_FAILURE_MESSAGE);
    assert!(board["project"].is_null());
    assert!(board["budget"].is_null());

    let (_, board) = send_json(&app, empty_request("POST", "/api/board/reset")).await;
    assert_eq!(board["view"], "upload");
    assert!(board["error"].is_null());
}

#[tokio::test]
async fn test_upload_while_analyzing_conflicts() {
    let gate = Arc::new(Notify::new());
    let app = setup_app(Some(REVENUE_JSON), Some(gate.clone()));

    let (status, _) = send(&app, png_upload()).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = send(&app, png_upload()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    gate.notify_one();
    let board = wait_for_outcome(&app).await;
    assert_eq!(board["view"], "dashboard");
}

#[tokio::test]
async fn test_reset_while_analyzing_discards_result() {
    let state = Arc::new(AppState::new(
        Config::new("test-key".to_string()),
        Arc::new(StubVision {
            reply: Some(REVENUE_JSON),
            gate: None,
        }),
    ));
    let app = build_router(state.clone());

    // Start the analysis directly so its completion can be awaited
    let upload = ImageUpload::new(vec![0x89, b'P', b'N', b'G']).with_content_type("image/png");
    let pending = state.service.begin(&upload).await.unwrap();
    let (_, board) = send_json(&app, empty_request("GET", "/api/board")).await;
    assert_eq!(board["view"], "analyzing");

    let (_, board) = send_json(&app, empty_request("POST", "/api/board/reset")).await;
    assert_eq!(board["view"], "upload");

    assert_eq!(state.service.finish(pending).await, SessionView::Upload);

    let (_, board) = send_json(&app, empty_request("GET", "/api/board")).await;
    assert_eq!(board["view"], "upload");
    assert!(board["project"].is_null());
}

#[tokio::test]
async fn test_move_task_and_reset() {
    let app = setup_app(Some(REVENUE_JSON), None);
    send(&app, png_upload()).await;
    let board = wait_for_outcome(&app).await;
    let id = board["project"]["tasks"][1]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/board/tasks/{}/move", id);

    let (status, board) =
        send_json(&app, json_request("POST", &uri, json!({"direction": "prev"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["project"]["tasks"][1]["status"], "todo");

    let (_, board) = send_json(&app, json_request("POST", &uri, json!({"direction": "next"}))).await;
    assert_eq!(board["project"]["tasks"][1]["status"], "in-progress");
    assert_eq!(board["budget"]["columns"][1]["hours"], 3);

    send(&app, json_request("POST", &uri, json!({"direction": "next"}))).await;
    let (_, board) = send_json(&app, json_request("POST", &uri, json!({"direction": "next"}))).await;
    assert_eq!(board["project"]["tasks"][1]["status"], "done");

    let (_, board) = send_json(&app, empty_request("POST", "/api/board/reset")).await;
    assert_eq!(
        board,
        json!({"view": "upload", "project": null, "error": null, "budget": null})
    );
}

#[tokio::test]
async fn test_move_unknown_task_is_noop() {
    let app = setup_app(Some(REVENUE_JSON), None);
    send(&app, png_upload()).await;
    let before = wait_for_outcome(&app).await;

    let (status, after) = send_json(
        &app,
        json_request(
            "POST",
            "/api/board/tasks/does-not-exist/move",
            json!({"direction": "next"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_invalid_direction_rejected() {
    let app = setup_app(Some(REVENUE_JSON), None);
    let request = json_request(
        "POST",
        "/api/board/tasks/task-1/move",
        json!({"direction": "sideways"}),
    );
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
