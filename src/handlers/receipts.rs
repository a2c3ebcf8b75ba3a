use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use crate::middleware::MaybeSession;
use crate::service::persistence::ReceiptStore;
use crate::types::receipt::{ReceiptRecord, StoreKind};
use crate::types::view::{ReceiptDetail, ReceiptRow, export_csv, export_file_name, export_rows};
use crate::{ScannerError, router::ScannerState};

/// The store views read from. Cloud-backed views need a signed-in session.
fn view_source(
    state: &ScannerState,
    session: &MaybeSession,
) -> Result<Arc<dyn ReceiptStore>, ScannerError> {
    let store = state.persistence.active();
    if store.kind() == StoreKind::Cloud && session.session().is_none() {
        return Err(ScannerError::Unauthorized);
    }
    Ok(store.clone())
}

async fn rows(store: &Arc<dyn ReceiptStore>) -> Result<Vec<ReceiptRow>, ScannerError> {
    Ok(store.list().await?.iter().map(ReceiptRow::from).collect())
}

/// POST /api/receipts -> persist one extracted record.
pub async fn save_receipt(
    State(state): State<ScannerState>,
    session: MaybeSession,
    payload: Result<Json<ReceiptRecord>, JsonRejection>,
) -> Result<impl IntoResponse, ScannerError> {
    let Json(record) = payload.map_err(|e| ScannerError::InvalidBody(e.body_text()))?;
    let outcome = state.persistence.save(record, session.session()).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/receipts -> dashboard rows, newest first.
pub async fn list_receipts(
    State(state): State<ScannerState>,
    session: MaybeSession,
) -> Result<Json<Vec<ReceiptRow>>, ScannerError> {
    let store = view_source(&state, &session)?;
    Ok(Json(rows(&store).await?))
}

/// GET /api/receipts/{id} -> detail view.
pub async fn get_receipt(
    State(state): State<ScannerState>,
    session: MaybeSession,
    Path(id): Path<String>,
) -> Result<Json<ReceiptDetail>, ScannerError> {
    let store = view_source(&state, &session)?;
    let receipt = store
        .get(&id)
        .await?
        .ok_or_else(|| ScannerError::NotFound(id.clone()))?;
    Ok(Json(ReceiptDetail::from(receipt)))
}

/// GET /api/receipts/{id}/export -> line items as CSV.
pub async fn export_receipt(
    State(state): State<ScannerState>,
    session: MaybeSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ScannerError> {
    let store = view_source(&state, &session)?;
    let receipt = store
        .get(&id)
        .await?
        .ok_or_else(|| ScannerError::NotFound(id.clone()))?;
    let body = export_csv(&export_rows(&receipt))?;
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(&receipt));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// GET /api/receipts/feed -> a `snapshot` event now and after every change.
pub async fn receipt_feed(
    State(state): State<ScannerState>,
    session: MaybeSession,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ScannerError> {
    let store = view_source(&state, &session)?;
    // subscribe before the first read so no write slips between them
    let updates = BroadcastStream::new(store.subscribe());
    let initial = snapshot_event(&store).await;

    let refreshes = updates.then(move |_| {
        let store = store.clone();
        async move { snapshot_event(&store).await }
    });
    let events = stream::once(async move { initial }).chain(refreshes).map(Ok::<_, Infallible>);

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn snapshot_event(store: &Arc<dyn ReceiptStore>) -> Event {
    let result = match rows(store).await {
        Ok(rows) => Event::default().event("snapshot").json_data(rows),
        Err(e) => Err(axum::Error::new(e)),
    };
    result.unwrap_or_else(|e| {
        warn!(error = %e, "failed to build receipt snapshot");
        Event::default().event("error").data("Could not load receipts.")
    })
}
