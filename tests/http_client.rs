//! PdfApiClient 与本地 axum 模拟服务之间的协议测试

use std::time::Duration;

use axum::extract::Multipart;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pdf_merge_client::clients::{PdfApi, PdfApiClient};
use pdf_merge_client::error::ApiError;
use pdf_merge_client::models::{BrokenKind, DocumentHandle, Rotation};
use pdf_merge_client::services::ValidationService;
use pdf_merge_client::store::CollectionState;
use pdf_merge_client::workflow::submission::prepare;
use pdf_merge_client::workflow::{CompressionLevel, Transform};
use serde_json::{json, Value};
use std::sync::Arc;

/// 收到的 multipart 表单
#[derive(Default)]
struct Received {
    files: Vec<(String, String, usize)>,
    texts: Vec<(String, String)>,
}

impl Received {
    async fn read(mut multipart: Multipart) -> Self {
        let mut received = Received::default();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field.bytes().await.unwrap();
                    received.files.push((name, file_name, data.len()));
                }
                None => {
                    let text = field.text().await.unwrap();
                    received.texts.push((name, text));
                }
            }
        }
        received
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "PDF API is running" }))
}

async fn validate(multipart: Multipart) -> Json<Value> {
    let received = Received::read(multipart).await;
    let mut report = serde_json::Map::new();
    for (field, file_name, _) in &received.files {
        assert_eq!(field, "files");
        let verdict = if file_name.starts_with("broken") {
            json!({ "ok": false, "error": "Not a generic PDF.", "error_type": " invalid_format " })
        } else {
            json!({ "ok": true })
        };
        report.insert(file_name.clone(), verdict);
    }
    Json(Value::Object(report))
}

async fn check_password(multipart: Multipart) -> Json<Value> {
    let received = Received::read(multipart).await;
    assert_eq!(received.files.len(), 1);
    assert_eq!(received.files[0].0, "file");
    match received.text("password") {
        Some("secret") => Json(json!({ "ok": true })),
        Some(_) => Json(json!({ "ok": false, "error": "Invalid password" })),
        None => Json(json!({ "ok": false, "error": "File is encrypted" })),
    }
}

/// b.pdf 需要密码 "secret"；成功时把收到的表单原样回显
async fn merge(multipart: Multipart) -> Response {
    let received = Received::read(multipart).await;
    let passwords: Value = serde_json::from_str(received.text("passwords").unwrap_or("{}")).unwrap();
    let has_b = received.files.iter().any(|(_, name, _)| name == "b.pdf");

    if has_b && passwords.get("b.pdf").and_then(Value::as_str) != Some("secret") {
        return (
            StatusCode::LOCKED,
            Json(json!({ "detail": "[\"b.pdf\"]" })),
        )
            .into_response();
    }

    let echo = json!({
        "files": received.files.iter().map(|(f, n, _)| format!("{}:{}", f, n)).collect::<Vec<_>>(),
        "passwords": passwords,
        "rotations": serde_json::from_str::<Value>(received.text("rotations").unwrap_or("{}")).unwrap(),
    });
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"merged.pdf\""),
        ],
        echo.to_string(),
    )
        .into_response()
}

async fn compress(multipart: Multipart) -> Response {
    let received = Received::read(multipart).await;
    assert_eq!(received.text("level"), Some("extreme"));
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Operation failed: boom" })),
    )
        .into_response()
}

/// 只认单数 `password` 字段，把收到的密码写进结果
async fn unlock(multipart: Multipart) -> Response {
    let received = Received::read(multipart).await;
    assert_eq!(received.files.len(), 1);
    assert_eq!(received.files[0].0, "file");
    match received.text("password") {
        Some(password) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/pdf")],
            format!("unlocked with {}", password),
        )
            .into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Password required" })),
        )
            .into_response(),
    }
}

async fn delete_pages(_multipart: Multipart) -> Response {
    (StatusCode::LOCKED, "c.pdf").into_response()
}

async fn split(_multipart: Multipart) -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK.into_response()
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/", get(health))
        .route("/validate-pdf", post(validate))
        .route("/check-password", post(check_password))
        .route("/merge", post(merge))
        .route("/compress_pdf", post(compress))
        .route("/unlock-pdf", post(unlock))
        .route("/delete-pages", post(delete_pages))
        .route("/split_pdf", post(split));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str) -> PdfApiClient {
    PdfApiClient::with_base_url(base_url, Duration::from_millis(500)).unwrap()
}

fn doc(name: &str) -> DocumentHandle {
    DocumentHandle::new(name, format!("%PDF-1.7 {}", name).into_bytes())
}

fn ready_state(names: &[&str]) -> CollectionState {
    let mut state = CollectionState::new(150);
    state.add(names.iter().map(|n| doc(n)).collect()).unwrap();
    state
}

#[tokio::test]
async fn test_health() {
    let base = spawn_server().await;
    let message = client(&base).health().await.unwrap();
    assert_eq!(message, "PDF API is running");
}

#[tokio::test]
async fn test_validate_batch_over_http() {
    let base = spawn_server().await;
    let api = Arc::new(client(&base));
    let service = ValidationService::new(api);

    let outcome = service
        .validate_batch(&[doc("a.pdf"), doc("broken.pdf")])
        .await;

    assert!(!outcome.transport_failed);
    assert_eq!(outcome.verdicts[0], ("a.pdf".to_string(), None));
    let reason = outcome.verdicts[1].1.clone().unwrap();
    assert_eq!(reason.to_string(), "invalid_format: Not a generic PDF.");
}

#[tokio::test]
async fn test_check_password() {
    let base = spawn_server().await;
    let api = client(&base);

    assert!(api.check_password(&doc("b.pdf"), Some("secret")).await.unwrap().ok);
    let wrong = api.check_password(&doc("b.pdf"), Some("nope")).await.unwrap();
    assert!(!wrong.ok);
    assert_eq!(wrong.error.as_deref(), Some("Invalid password"));
    assert!(!api.check_password(&doc("b.pdf"), None).await.unwrap().ok);
}

#[tokio::test]
async fn test_merge_sends_ordered_files_and_json_maps() {
    let base = spawn_server().await;
    let api = client(&base);

    let mut state = ready_state(&["a.pdf", "b.pdf", "c.pdf"]);
    state.set_password("b.pdf", "secret").unwrap();
    state.mark_verified("b.pdf").unwrap();
    state.set_password("c.pdf", "pw-c").unwrap();
    state.mark_verified("c.pdf").unwrap();
    state.set_rotation("a.pdf", Rotation::from_degrees(180).unwrap()).unwrap();
    state.move_document(2, 0).unwrap();

    let request = prepare(&state, &Transform::Merge).unwrap();
    let output = api.transform(&request).await.unwrap();

    assert_eq!(output.file_name, "merged.pdf");
    assert_eq!(output.content_type.as_deref(), Some("application/pdf"));
    let echo: Value = serde_json::from_slice(&output.content).unwrap();
    assert_eq!(
        echo["files"],
        json!(["files:c.pdf", "files:a.pdf", "files:b.pdf"])
    );
    assert_eq!(echo["passwords"], json!({ "b.pdf": "secret", "c.pdf": "pw-c" }));
    assert_eq!(echo["rotations"], json!({ "a.pdf": 180 }));
}

#[tokio::test]
async fn test_merge_423_detail_holding_encoded_array() {
    let base = spawn_server().await;
    let api = client(&base);

    let request = prepare(&ready_state(&["a.pdf", "b.pdf"]), &Transform::Merge).unwrap();
    match api.transform(&request).await {
        Err(ApiError::Locked { names }) => assert_eq!(names, vec!["b.pdf"]),
        other => panic!("expected 423, got {:?}", other.map(|o| o.file_name)),
    }
}

#[tokio::test]
async fn test_unlock_sends_verified_password() {
    let base = spawn_server().await;
    let api = client(&base);

    let mut state = ready_state(&["b.pdf"]);
    state.set_password("b.pdf", "secret").unwrap();
    state.mark_verified("b.pdf").unwrap();

    let request = prepare(&state, &Transform::Unlock).unwrap();
    let output = api.transform(&request).await.unwrap();

    assert_eq!(output.file_name, "unlocked_b.pdf");
    assert_eq!(output.content, b"unlocked with secret".to_vec());
}

#[tokio::test]
async fn test_423_bare_text_body() {
    let base = spawn_server().await;
    let api = client(&base);

    let request = prepare(
        &ready_state(&["c.pdf"]),
        &Transform::DeletePages {
            pages: "2".to_string(),
        },
    )
    .unwrap();
    match api.transform(&request).await {
        Err(ApiError::Locked { names }) => assert_eq!(names, vec!["c.pdf"]),
        other => panic!("expected 423, got {:?}", other.map(|o| o.file_name)),
    }
}

#[tokio::test]
async fn test_server_error_detail_is_surfaced() {
    let base = spawn_server().await;
    let api = client(&base);

    let request = prepare(
        &ready_state(&["a.pdf"]),
        &Transform::Compress {
            level: CompressionLevel::Extreme,
        },
    )
    .unwrap();
    match api.transform(&request).await {
        Err(ApiError::BadResponse { status, message, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(message.as_deref(), Some("Operation failed: boom"));
        }
        other => panic!("expected 500, got {:?}", other.map(|o| o.file_name)),
    }
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let base = spawn_server().await;
    let api = client(&base);

    let request = prepare(
        &ready_state(&["a.pdf"]),
        &Transform::Split {
            ranges: "1".to_string(),
        },
    )
    .unwrap();
    let err = api.transform(&request).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout { .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_unreachable_server_marks_batch_broken() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let service = ValidationService::new(Arc::new(client(&base)));
    let outcome = service.validate_batch(&[doc("a.pdf"), doc("b.pdf")]).await;

    assert!(outcome.transport_failed);
    assert_eq!(outcome.broken_count(), 2);
    for (_, reason) in &outcome.verdicts {
        assert_eq!(reason.as_ref().unwrap().kind, BrokenKind::Connection);
    }
}
