use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use valora_catalog::Product;
use valora_pricing::{PricingContext, PricingDecision};
use valora_shared::models::events::PriceCalculatedEvent;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub customer_id: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FactorBreakdown {
    pub name: String,
    pub raw: f64,
    pub weight: f64,
    pub weighted: f64,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub product_id: Uuid,
    pub base_price: f64,
    pub price: f64,
    pub currency: String,
    pub total_adjustment: f64,
    pub margin_floor_applied: bool,
    pub factors: Vec<FactorBreakdown>,
    pub decision_id: Option<Uuid>,
    pub calculated_at: chrono::DateTime<chrono::Utc>,
}

impl QuoteResponse {
    /// Base price with no adjustment, used whenever the engine is disabled
    /// or cannot produce a decision in time.
    fn passthrough(product: &Product) -> Self {
        Self {
            product_id: product.id,
            base_price: product.base_price,
            price: product.base_price,
            currency: product.currency.clone(),
            total_adjustment: 0.0,
            margin_floor_applied: false,
            factors: Vec::new(),
            decision_id: None,
            calculated_at: Utc::now(),
        }
    }

    fn from_decision(product: &Product, decision: &PricingDecision) -> Self {
        Self {
            product_id: product.id,
            base_price: product.base_price,
            price: decision.new_price,
            currency: product.currency.clone(),
            total_adjustment: decision.total_adjustment,
            margin_floor_applied: decision.margin_floor_applied,
            factors: decision
                .factors
                .iter()
                .map(|f| FactorBreakdown {
                    name: f.name.clone(),
                    raw: f.raw,
                    weight: f.weight,
                    weighted: f.weighted(),
                })
                .collect(),
            decision_id: Some(decision.id),
            calculated_at: decision.calculated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/products/{id}/quote
/// Price a product under the current policy and live market signals
pub async fn quote_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<QuoteResponse>, AppError> {
    // 1. Load and validate the product
    let product = state
        .products
        .get_product(id)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Product lookup failed: {}", e)))?
        .ok_or_else(|| AppError::NotFoundError(format!("Product {} not found", id)))?;

    product
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    if !state.quote.enabled {
        return Ok(Json(QuoteResponse::passthrough(&product)));
    }

    // 2. Snapshot the policy; an unusable policy degrades to the base price
    let policy = match state.policy.current().await {
        Ok(policy) => policy,
        Err(e) => {
            tracing::warn!("Pricing policy unavailable for {}, returning base price: {}", id, e);
            return Ok(Json(QuoteResponse::passthrough(&product)));
        }
    };

    let ctx = PricingContext {
        requested_at: Utc::now(),
        customer_id: params.customer_id,
        channel: params.channel,
        metadata: serde_json::json!({}),
    };

    // 3. Run the engine off the async runtime under a hard deadline
    let engine = state.engine.clone();
    let calc_product = product.clone();
    let calc_ctx = ctx.clone();
    let calc_policy = policy.clone();
    let outcome = tokio::time::timeout(
        state.quote.timeout,
        tokio::task::spawn_blocking(move || engine.calculate(&calc_product, &calc_policy, &calc_ctx)),
    )
    .await;

    let decision = match outcome {
        Ok(Ok((_, decision))) => decision,
        Ok(Err(e)) => {
            tracing::warn!("Price calculation panicked for {}, returning base price: {}", id, e);
            return Ok(Json(QuoteResponse::passthrough(&product)));
        }
        Err(_) => {
            tracing::warn!(
                "Price calculation for {} exceeded {}ms, returning base price",
                id,
                state.quote.timeout.as_millis()
            );
            return Ok(Json(QuoteResponse::passthrough(&product)));
        }
    };

    // 4. Fan out to SSE subscribers and the decisions topic
    let _ = state.sse_tx.send(decision.clone());

    let telemetry = state.telemetry.clone();
    let event = PriceCalculatedEvent {
        decision_id: decision.id,
        product_id: decision.product_id,
        old_price: decision.old_price,
        new_price: decision.new_price,
        total_adjustment: decision.total_adjustment,
        factors: decision.factors_json(),
        timestamp: decision.calculated_at.timestamp(),
    };
    tokio::spawn(async move {
        telemetry.log_price_calculated(&event).await;
    });

    Ok(Json(QuoteResponse::from_decision(&product, &decision)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use valora_pricing::FactorContribution;

    fn product() -> Product {
        Product {
            id: Uuid::new_v4(),
            sku: "SKU-100".to_string(),
            name: "Desk lamp".to_string(),
            description: None,
            base_price: 100.0,
            cost: Some(70.0),
            current_stock: 25,
            currency: "USD".to_string(),
            is_active: true,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn test_passthrough_quote_keeps_the_base_price() {
        let product = product();
        let quote = QuoteResponse::passthrough(&product);

        assert_eq!(quote.price, 100.0);
        assert_eq!(quote.total_adjustment, 0.0);
        assert!(!quote.margin_floor_applied);
        assert!(quote.factors.is_empty());
        assert!(quote.decision_id.is_none());
    }

    #[test]
    fn test_quote_from_decision_carries_the_factor_breakdown() {
        let product = product();
        let decision = PricingDecision {
            id: Uuid::new_v4(),
            product_id: product.id,
            old_price: 100.0,
            new_price: 111.0,
            candidate_price: 111.0,
            minimum_price: 80.5,
            raw_adjustment: 0.11,
            total_adjustment: 0.11,
            margin_floor_applied: false,
            factors: vec![FactorContribution {
                name: "demand".to_string(),
                raw: 0.2,
                weight: 0.4,
            }],
            calculated_at: Utc::now(),
        };

        let quote = QuoteResponse::from_decision(&product, &decision);

        assert_eq!(quote.price, 111.0);
        assert_eq!(quote.decision_id, Some(decision.id));
        assert_eq!(quote.factors.len(), 1);
        assert_eq!(quote.factors[0].weighted, 0.2 * 0.4);
    }
}
