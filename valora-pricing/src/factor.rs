use valora_catalog::Product;

use crate::engine::PricingContext;
use crate::policy::PricingPolicy;

pub const FACTOR_DEMAND: &str = "demand";
pub const FACTOR_INVENTORY: &str = "inventory";
pub const FACTOR_COMPETITOR: &str = "competitor";

/// One pricing signal source.
///
/// Providers are registered on the engine in a fixed order at startup and
/// that order is preserved in every decision record. A provider that
/// cannot produce a value returns an error; the engine treats the factor
/// as neutral for that calculation and keeps going.
pub trait FactorProvider: Send + Sync {
    /// Stable name written into decision audit records.
    fn name(&self) -> &'static str;

    /// Weight this factor carries under the given policy.
    fn weight(&self, policy: &PricingPolicy) -> f64;

    /// Raw factor in [-1.0, 1.0] for the product at the context instant.
    fn factor(&self, product: &Product, ctx: &PricingContext) -> Result<f64, FactorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FactorError {
    #[error("Factor unavailable: {0}")]
    Unavailable(String),
}
