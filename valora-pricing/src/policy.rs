use serde::{Deserialize, Serialize};

/// Guardrails and factor weights for price calculation.
///
/// A calculation takes one policy snapshot up front and never observes a
/// mid-flight change. Weights do not have to sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Weight of the demand factor
    #[serde(default = "default_demand_weight")]
    pub demand_weight: f64,

    /// Weight of the inventory factor
    #[serde(default = "default_inventory_weight")]
    pub inventory_weight: f64,

    /// Weight of the competitor factor
    #[serde(default = "default_competitor_weight")]
    pub competitor_weight: f64,

    /// Maximum relative deviation from the base price, in (0, 1]
    #[serde(default = "default_adjustment_limit")]
    pub adjustment_limit: f64,

    /// Minimum margin over cost, in [0, 1]
    #[serde(default = "default_minimum_margin_rate")]
    pub minimum_margin_rate: f64,
}

fn default_demand_weight() -> f64 {
    0.4
}

fn default_inventory_weight() -> f64 {
    0.3
}

fn default_competitor_weight() -> f64 {
    0.3
}

fn default_adjustment_limit() -> f64 {
    0.20
}

fn default_minimum_margin_rate() -> f64 {
    0.15
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            demand_weight: default_demand_weight(),
            inventory_weight: default_inventory_weight(),
            competitor_weight: default_competitor_weight(),
            adjustment_limit: default_adjustment_limit(),
            minimum_margin_rate: default_minimum_margin_rate(),
        }
    }
}

impl PricingPolicy {
    /// Range checks applied on every load and refresh. The engine only
    /// ever sees a policy that passed this.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (name, weight) in [
            ("demand_weight", self.demand_weight),
            ("inventory_weight", self.inventory_weight),
            ("competitor_weight", self.competitor_weight),
        ] {
            if !weight.is_finite() {
                return Err(PolicyError::InvalidWeight {
                    name: name.to_string(),
                    value: weight,
                });
            }
        }

        if !self.adjustment_limit.is_finite()
            || self.adjustment_limit <= 0.0
            || self.adjustment_limit > 1.0
        {
            return Err(PolicyError::InvalidAdjustmentLimit(self.adjustment_limit));
        }

        if !self.minimum_margin_rate.is_finite()
            || self.minimum_margin_rate < 0.0
            || self.minimum_margin_rate > 1.0
        {
            return Err(PolicyError::InvalidMarginRate(self.minimum_margin_rate));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Adjustment limit must be within (0, 1], got {0}")]
    InvalidAdjustmentLimit(f64),

    #[error("Minimum margin rate must be within [0, 1], got {0}")]
    InvalidMarginRate(f64),

    #[error("Weight {name} must be finite, got {value}")]
    InvalidWeight { name: String, value: f64 },
}
