use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use valora_catalog::Product;

use crate::cache::TtlCache;
use crate::engine::PricingContext;
use crate::factor::{FactorError, FactorProvider, FACTOR_DEMAND};
use crate::policy::PricingPolicy;

/// Kind of recorded demand activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    View,
    Purchase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandSignal {
    pub product_id: Uuid,
    pub kind: SignalKind,
    pub quantity: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Tuning knobs for demand scoring
#[derive(Debug, Clone)]
pub struct DemandTuning {
    /// Trailing window scored for the factor
    pub window: Duration,

    /// Weight of one purchased unit relative to one view
    pub purchase_weight: f64,

    /// Half-capacity constant of the saturating curve
    pub saturation: f64,

    /// Signals older than this are pruned by the rollup job
    pub retention: Duration,

    /// Factor cache TTL
    pub factor_ttl: Duration,
}

impl Default for DemandTuning {
    fn default() -> Self {
        Self {
            window: Duration::hours(24),
            purchase_weight: 3.0,
            saturation: 50.0,
            retention: Duration::days(7),
            factor_ttl: Duration::seconds(60),
        }
    }
}

/// Records view and purchase activity per product and derives a
/// normalized demand factor from it.
///
/// The factor is `score / (score + saturation)` over the trailing window,
/// so it is 0.0 with no activity, grows with velocity, and stays below
/// 1.0. Absence of demand is neutral, never punitive.
pub struct DemandSignalStore {
    signals: RwLock<HashMap<Uuid, Vec<DemandSignal>>>,
    factors: TtlCache<Uuid, f64>,
    tuning: DemandTuning,
}

impl DemandSignalStore {
    pub fn new(tuning: DemandTuning) -> Self {
        Self {
            signals: RwLock::new(HashMap::new()),
            factors: TtlCache::new(tuning.factor_ttl),
            tuning,
        }
    }

    /// Append a signal. Best-effort: the caller is never failed, a signal
    /// that cannot be stored is lost.
    pub fn record_signal(&self, product_id: Uuid, kind: SignalKind, quantity: u32) {
        self.record_signal_at(product_id, kind, quantity, Utc::now());
    }

    pub fn record_signal_at(
        &self,
        product_id: Uuid,
        kind: SignalKind,
        quantity: u32,
        recorded_at: DateTime<Utc>,
    ) {
        if let Ok(mut signals) = self.signals.write() {
            signals.entry(product_id).or_default().push(DemandSignal {
                product_id,
                kind,
                quantity,
                recorded_at,
            });
        }
        self.factors.invalidate(&product_id);
    }

    /// Demand factor in [0, 1) as of now.
    pub fn demand_factor(&self, product_id: Uuid) -> f64 {
        self.demand_factor_at(product_id, Utc::now())
    }

    /// Demand factor evaluated against an explicit instant, so a fixed
    /// calculation context always sees the same trailing window.
    pub fn demand_factor_at(&self, product_id: Uuid, now: DateTime<Utc>) -> f64 {
        if let Some(cached) = self.factors.get(&product_id, now) {
            return cached;
        }

        let factor = self.compute_factor(product_id, now);
        self.factors.set(product_id, factor, now);
        factor
    }

    fn compute_factor(&self, product_id: Uuid, now: DateTime<Utc>) -> f64 {
        let cutoff = now - self.tuning.window;
        let score = match self.signals.read() {
            Ok(signals) => signals
                .get(&product_id)
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|s| s.recorded_at > cutoff && s.recorded_at <= now)
                        .map(|s| self.signal_weight(s))
                        .sum::<f64>()
                })
                .unwrap_or(0.0),
            Err(_) => return 0.0,
        };

        if score <= 0.0 {
            return 0.0;
        }

        score / (score + self.tuning.saturation)
    }

    fn signal_weight(&self, signal: &DemandSignal) -> f64 {
        match signal.kind {
            SignalKind::View => signal.quantity as f64,
            SignalKind::Purchase => signal.quantity as f64 * self.tuning.purchase_weight,
        }
    }

    /// Prune signals past retention and re-warm every cached factor.
    /// Called by the periodic demand rollup job.
    pub fn rollup(&self, now: DateTime<Utc>) {
        let cutoff = now - self.tuning.retention;
        if let Ok(mut signals) = self.signals.write() {
            for entries in signals.values_mut() {
                entries.retain(|s| s.recorded_at > cutoff);
            }
            signals.retain(|_, entries| !entries.is_empty());
        }

        for product_id in self.product_ids() {
            let factor = self.compute_factor(product_id, now);
            self.factors.set(product_id, factor, now);
        }
    }

    /// Products with at least one retained signal.
    pub fn product_ids(&self) -> Vec<Uuid> {
        self.signals
            .read()
            .map(|signals| signals.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for DemandSignalStore {
    fn default() -> Self {
        Self::new(DemandTuning::default())
    }
}

impl FactorProvider for DemandSignalStore {
    fn name(&self) -> &'static str {
        FACTOR_DEMAND
    }

    fn weight(&self, policy: &PricingPolicy) -> f64 {
        policy.demand_weight
    }

    fn factor(&self, product: &Product, ctx: &PricingContext) -> Result<f64, FactorError> {
        Ok(self.demand_factor_at(product.id, ctx.requested_at))
    }
}
