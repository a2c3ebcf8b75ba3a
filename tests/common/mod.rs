#![allow(dead_code)]

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
    response::Response,
    routing::post,
};
use receipt_scanner::config::Config;
use receipt_scanner::router::{ScannerState, scanner_router};
use serde_json::Value;
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

pub const BOUNDARY: &str = "receipt-scanner-test-boundary";

/// Per-test scratch paths, removed on drop.
pub struct Scratch {
    pub dir: PathBuf,
}

impl Scratch {
    pub fn new(tag: &str) -> Self {
        let mut dir = std::env::temp_dir();
        dir.push(format!(
            "receipt-scanner-it-{tag}-{}-{}",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        Self { dir }
    }

    pub fn database_url(&self) -> String {
        format!("sqlite:{}", self.dir.join("cloud.sqlite").display())
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

pub fn test_config(scratch: &Scratch) -> Config {
    let mut cfg = Config::default();
    cfg.local_store_dir = scratch.dir.join("local");
    cfg.demo_delay_ms = 20;
    cfg
}

pub async fn build_app(cfg: &Config) -> Router {
    let state = ScannerState::build(cfg).await.expect("build state");
    scanner_router(state)
}

pub fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn text_field_body(field: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n--{BOUNDARY}--\r\n"
    )
    .into_bytes()
}

pub fn scan_request(uri: &str, body: Vec<u8>, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(uid) = session {
        builder = builder.header("x-session-uid", uid);
    }
    builder.body(Body::from(body)).expect("failed to build request")
}

pub fn json_request(method: &str, uri: &str, body: Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(uid) = session {
        builder = builder.header("x-session-uid", uid);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn get_request(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(uid) = session {
        builder = builder.header("x-session-uid", uid);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("request failed")
}

pub async fn body_json(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body was not JSON")
}

pub async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("response body was not utf-8")
}

/// What the fake model endpoint saw.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// Serve a stand-in for the Gemini API on a random local port.
pub async fn fake_gemini(status: StatusCode, reply: Value) -> (Url, Arc<Mutex<Vec<CapturedCall>>>) {
    let calls: Arc<Mutex<Vec<CapturedCall>>> = Arc::default();
    let seen = calls.clone();

    let app = Router::new().route(
        "/v1beta/models/{model}",
        post(
            move |uri: axum::http::Uri, headers: HeaderMap, Json(body): Json<Value>| {
                let seen = seen.clone();
                let reply = reply.clone();
                async move {
                    seen.lock().unwrap().push(CapturedCall {
                        path: uri.path().to_string(),
                        api_key: headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_owned),
                        body,
                    });
                    (status, Json(reply))
                }
            },
        ),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake upstream crashed");
    });

    let url = Url::parse(&format!("http://{addr}")).expect("fake upstream url");
    (url, calls)
}

/// A generateContent reply whose only text part is `text`.
pub fn model_reply(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "modelVersion": "gemini-1.5-flash"
    })
}
