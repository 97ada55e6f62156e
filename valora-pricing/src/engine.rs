use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use valora_catalog::Product;

use crate::decision::{DecisionLog, FactorContribution, PricingDecision};
use crate::factor::FactorProvider;
use crate::policy::PricingPolicy;

/// Share of the base price treated as cost when a product carries none.
const DEFAULT_COST_RATIO: f64 = 0.7;

/// Context for one price calculation.
///
/// Nothing about a calculation is ambient: the instant driving every
/// trailing-window lookup travels here, so replaying a context yields
/// the same factors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingContext {
    /// Instant the price was requested
    pub requested_at: DateTime<Utc>,

    /// Requesting customer, when known
    pub customer_id: Option<String>,

    /// Sales channel ("web", "mobile", ...)
    pub channel: Option<String>,

    /// Additional context metadata
    pub metadata: serde_json::Value,
}

impl Default for PricingContext {
    fn default() -> Self {
        Self {
            requested_at: Utc::now(),
            customer_id: None,
            channel: None,
            metadata: serde_json::json!({}),
        }
    }
}

/// Combines weighted factor signals into a guardrailed price.
///
/// The pipeline is: query each registered provider, weight and sum the
/// raw factors, clamp the sum to the policy's adjustment limit, apply it
/// to the base price, then raise the result to the margin floor if it
/// fell below. Factors are combined before clamping, so opposing signals
/// can offset each other within the limit.
pub struct PriceDecisionEngine {
    providers: Vec<Arc<dyn FactorProvider>>,
    decisions: Arc<dyn DecisionLog>,
}

impl PriceDecisionEngine {
    pub fn new(decisions: Arc<dyn DecisionLog>) -> Self {
        Self {
            providers: Vec::new(),
            decisions,
        }
    }

    /// Register a factor source. Registration order is fixed at startup
    /// and preserved in every decision record.
    pub fn register(&mut self, provider: Arc<dyn FactorProvider>) {
        self.providers.push(provider);
    }

    /// Price the product under an already validated policy.
    ///
    /// Never fails: a provider error or non-finite value neutralizes that
    /// single factor, missing signals read as zero, and the guardrails
    /// bound the output. The decision record is appended to the log
    /// before returning.
    pub fn calculate(
        &self,
        product: &Product,
        policy: &PricingPolicy,
        ctx: &PricingContext,
    ) -> (f64, PricingDecision) {
        let base_price = product.base_price;

        let mut factors = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let raw = match provider.factor(product, ctx) {
                Ok(value) if value.is_finite() => value,
                Ok(value) => {
                    tracing::warn!(
                        "Factor {} returned non-finite value {} for product {}, treating as neutral",
                        provider.name(),
                        value,
                        product.id
                    );
                    0.0
                }
                Err(e) => {
                    tracing::warn!(
                        "Factor {} unavailable for product {}, treating as neutral: {}",
                        provider.name(),
                        product.id,
                        e
                    );
                    0.0
                }
            };

            factors.push(FactorContribution {
                name: provider.name().to_string(),
                raw,
                weight: provider.weight(policy),
            });
        }

        let raw_adjustment: f64 = factors.iter().map(|f| f.weighted()).sum();
        let total_adjustment =
            raw_adjustment.clamp(-policy.adjustment_limit, policy.adjustment_limit);

        let candidate_price = base_price * (1.0 + total_adjustment);

        let effective_cost = product.cost.unwrap_or(base_price * DEFAULT_COST_RATIO);
        let minimum_price = effective_cost * (1.0 + policy.minimum_margin_rate);

        let (new_price, margin_floor_applied) = if candidate_price < minimum_price {
            (minimum_price, true)
        } else {
            (candidate_price, false)
        };

        let decision = PricingDecision {
            id: Uuid::new_v4(),
            product_id: product.id,
            old_price: base_price,
            new_price,
            candidate_price,
            minimum_price,
            raw_adjustment,
            total_adjustment,
            margin_floor_applied,
            factors,
            calculated_at: Utc::now(),
        };

        self.decisions.append(decision.clone());

        (new_price, decision)
    }
}
