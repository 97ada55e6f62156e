use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};

use valora_catalog::ProductRepository;
use valora_pricing::{
    CompetitorPriceTracker, DemandSignalStore, InventoryLevelTracker, PolicyError,
    PriceDecisionEngine, PricingDecision, PricingPolicy,
};
use valora_store::{DecisionRepository, PricingTelemetry};

/// Shared snapshot of the active pricing policy.
///
/// The refresh job swaps in new policies after validating them, so readers
/// normally see a valid policy. Validation is re-checked on read anyway:
/// if the snapshot is ever unusable the quote path falls back to the
/// product's base price instead of serving a broken calculation.
pub struct PolicyHandle {
    inner: RwLock<PricingPolicy>,
}

impl PolicyHandle {
    pub fn new(policy: PricingPolicy) -> Self {
        Self {
            inner: RwLock::new(policy),
        }
    }

    pub async fn current(&self) -> Result<PricingPolicy, PolicyError> {
        let policy = self.inner.read().await.clone();
        policy.validate()?;
        Ok(policy)
    }

    pub async fn replace(&self, policy: PricingPolicy) {
        *self.inner.write().await = policy;
    }
}

#[derive(Clone)]
pub struct QuoteSettings {
    /// When false every quote returns the base price untouched.
    pub enabled: bool,
    /// How long a single engine calculation may run before the quote falls back.
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
    pub engine: Arc<PriceDecisionEngine>,
    pub policy: Arc<PolicyHandle>,
    pub demand: Arc<DemandSignalStore>,
    pub inventory: Arc<InventoryLevelTracker>,
    pub competitors: Arc<CompetitorPriceTracker>,
    pub decisions: Arc<DecisionRepository>,
    pub telemetry: Arc<PricingTelemetry>,
    pub sse_tx: broadcast::Sender<PricingDecision>,
    pub quote: QuoteSettings,
}
