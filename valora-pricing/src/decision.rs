use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

use crate::factor::{FACTOR_COMPETITOR, FACTOR_DEMAND, FACTOR_INVENTORY};

/// One factor's contribution to a decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorContribution {
    pub name: String,
    pub raw: f64,
    pub weight: f64,
}

impl FactorContribution {
    pub fn weighted(&self) -> f64 {
        self.raw * self.weight
    }
}

/// Auditable record of one price calculation.
///
/// Every intermediate is captured so a reviewer can replay the arithmetic
/// from the record alone: raw factor values, the pre-clamp adjustment,
/// the clamped adjustment, the candidate price, and the margin floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingDecision {
    pub id: Uuid,
    pub product_id: Uuid,
    pub old_price: f64,
    pub new_price: f64,
    pub candidate_price: f64,
    pub minimum_price: f64,
    pub raw_adjustment: f64,
    pub total_adjustment: f64,
    pub margin_floor_applied: bool,
    pub factors: Vec<FactorContribution>,
    pub calculated_at: DateTime<Utc>,
}

impl PricingDecision {
    /// Raw value of a named factor, 0.0 when the factor is absent.
    pub fn factor(&self, name: &str) -> f64 {
        self.factors
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.raw)
            .unwrap_or(0.0)
    }

    pub fn demand_factor(&self) -> f64 {
        self.factor(FACTOR_DEMAND)
    }

    pub fn inventory_factor(&self) -> f64 {
        self.factor(FACTOR_INVENTORY)
    }

    pub fn competitor_factor(&self) -> f64 {
        self.factor(FACTOR_COMPETITOR)
    }

    /// Factor list serialized for persistence and telemetry payloads.
    pub fn factors_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.factors).unwrap_or_else(|_| serde_json::json!([]))
    }
}

/// Append-only audit sink for decisions.
///
/// Implementations must not block the caller; a decision that cannot be
/// stored is logged and dropped, never surfaced to the price path.
pub trait DecisionLog: Send + Sync {
    fn append(&self, decision: PricingDecision);
}

/// In-memory log used by tests and single-process deployments.
pub struct MemoryDecisionLog {
    entries: RwLock<Vec<PricingDecision>>,
}

impl MemoryDecisionLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<PricingDecision> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryDecisionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionLog for MemoryDecisionLog {
    fn append(&self, decision: PricingDecision) {
        if let Ok(mut entries) = self.entries.write() {
            entries.push(decision);
        }
    }
}
