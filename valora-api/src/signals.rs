use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;

use valora_pricing::SignalKind;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ViewSignalRequest {
    pub product_id: Uuid,
    pub customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseSignalRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct StockSignalRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CompetitorSignalRequest {
    pub product_id: Uuid,
    pub competitor_id: String,
    pub price: f64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/signals/view
/// Record a product view for the demand model
pub async fn record_view(
    State(state): State<AppState>,
    Json(req): Json<ViewSignalRequest>,
) -> Result<StatusCode, AppError> {
    state.demand.record_signal(req.product_id, SignalKind::View, 1);

    tracing::debug!("Recorded view signal for product {}", req.product_id);
    Ok(StatusCode::ACCEPTED)
}

/// POST /v1/signals/purchase
/// Record a purchase for the demand model
pub async fn record_purchase(
    State(state): State<AppState>,
    Json(req): Json<PurchaseSignalRequest>,
) -> Result<StatusCode, AppError> {
    if req.quantity == 0 {
        return Err(AppError::ValidationError(
            "Purchase quantity must be at least 1".to_string(),
        ));
    }

    state
        .demand
        .record_signal(req.product_id, SignalKind::Purchase, req.quantity);

    tracing::debug!("Recorded purchase signal for product {}", req.product_id);
    Ok(StatusCode::ACCEPTED)
}

/// POST /v1/signals/stock
/// Record a stock level snapshot
pub async fn record_stock(
    State(state): State<AppState>,
    Json(req): Json<StockSignalRequest>,
) -> Result<StatusCode, AppError> {
    if req.quantity < 0 {
        return Err(AppError::ValidationError(
            "Stock quantity cannot be negative".to_string(),
        ));
    }

    state.inventory.record_stock(req.product_id, req.quantity);

    tracing::debug!("Recorded stock snapshot for product {}", req.product_id);
    Ok(StatusCode::ACCEPTED)
}

/// POST /v1/signals/competitor
/// Record an observed competitor price
pub async fn record_competitor(
    State(state): State<AppState>,
    Json(req): Json<CompetitorSignalRequest>,
) -> Result<StatusCode, AppError> {
    if req.competitor_id.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Competitor id cannot be empty".to_string(),
        ));
    }
    if !req.price.is_finite() || req.price < 0.0 {
        return Err(AppError::ValidationError(format!(
            "Competitor price {} is not a valid price",
            req.price
        )));
    }

    state
        .competitors
        .record_sample(req.product_id, &req.competitor_id, req.price);

    tracing::debug!(
        "Recorded competitor price {} from {} for product {}",
        req.price,
        req.competitor_id,
        req.product_id
    );
    Ok(StatusCode::ACCEPTED)
}
