use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use valora_store::StoredDecision;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub product_id: Option<Uuid>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/products/{id}/decisions
/// Recent pricing decisions for a product, newest first
pub async fn decision_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<StoredDecision>>, AppError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 500);

    let decisions = state
        .decisions
        .list_for_product(id, limit)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Decision lookup failed: {}", e)))?;

    Ok(Json(decisions))
}

/// GET /v1/decisions/stream
/// Live stream of pricing decisions, optionally filtered to one product
pub async fn stream_decisions(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sse_tx.subscribe();
    let wanted = params.product_id;

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        async move {
            match result {
                Ok(decision) => {
                    if let Some(product_id) = wanted {
                        if decision.product_id != product_id {
                            return None;
                        }
                    }

                    match Event::default().event("price_decision").json_data(&decision) {
                        Ok(event) => Some(Ok::<_, Infallible>(event)),
                        Err(e) => {
                            tracing::error!("Failed to serialize decision event: {}", e);
                            None
                        }
                    }
                }
                // Lagged subscribers skip the dropped records and catch up
                Err(_) => None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
