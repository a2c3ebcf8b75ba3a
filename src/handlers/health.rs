use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::router::ScannerState;

/// GET /healthz -> liveness plus the modes the service runs in.
pub async fn health_handler(State(state): State<ScannerState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "demo_mode": state.gateway.demo_mode(),
        "cloud": state.persistence.cloud_configured(),
        "view_source": state.persistence.active().kind(),
    }))
}
