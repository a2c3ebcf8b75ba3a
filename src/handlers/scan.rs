use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::middleware::{MaybeSession, ReceiptUpload};
use crate::{ScannerError, router::ScannerState};

#[derive(Debug, Default, Deserialize)]
pub struct ScanQuery {
    /// Persist the extracted record before answering.
    #[serde(default)]
    pub save: bool,
}

/// POST /api/scan -> extracted receipt JSON, or a save outcome with `?save=true`.
pub async fn scan_handler(
    State(state): State<ScannerState>,
    query: Result<Query<ScanQuery>, QueryRejection>,
    session: MaybeSession,
    ReceiptUpload(image): ReceiptUpload,
) -> Result<Response, ScannerError> {
    let Query(query) = query.map_err(|e| ScannerError::InvalidBody(e.body_text()))?;
    let record = state.gateway.extract(&image).await?;
    info!(
        store = ?record.store_name,
        items = record.items.len(),
        demo = state.gateway.demo_mode(),
        "receipt extracted"
    );

    if !query.save {
        return Ok(Json(record).into_response());
    }

    let outcome = state.persistence.save(record, session.session()).await?;
    Ok(Json(outcome).into_response())
}
