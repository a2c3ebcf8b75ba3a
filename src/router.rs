use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

use crate::config::Config;
use crate::error::ScannerError;
use crate::handlers::{health, receipts, scan};
use crate::service::{ExtractionGateway, Persistence};

/// Service context shared by every handler.
#[derive(Clone)]
pub struct ScannerState {
    pub gateway: ExtractionGateway,
    pub persistence: Persistence,
    pub max_upload_bytes: usize,
}

impl ScannerState {
    pub fn new(gateway: ExtractionGateway, persistence: Persistence, max_upload_bytes: usize) -> Self {
        Self {
            gateway,
            persistence,
            max_upload_bytes,
        }
    }

    /// Build the HTTP client, the extraction gateway and both stores from configuration.
    pub async fn build(cfg: &Config) -> Result<Self, ScannerError> {
        let client = build_http_client(cfg)?;
        let gateway = ExtractionGateway::from_config(client, cfg);
        let persistence = Persistence::from_config(cfg).await?;
        Ok(Self::new(gateway, persistence, cfg.max_upload_bytes))
    }
}

/// Upstream client. Only connecting is bounded; the model call itself has no timeout.
pub fn build_http_client(cfg: &Config) -> Result<reqwest::Client, ScannerError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("receipt-scanner/0.1"));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10));
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}

pub fn scanner_router(state: ScannerState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/healthz", get(health::health_handler))
        .route("/api/scan", post(scan::scan_handler))
        .route(
            "/api/receipts",
            get(receipts::list_receipts).post(receipts::save_receipt),
        )
        .route("/api/receipts/feed", get(receipts::receipt_feed))
        .route("/api/receipts/{id}", get(receipts::get_receipt))
        .route("/api/receipts/{id}/export", get(receipts::export_receipt))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
