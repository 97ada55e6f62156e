use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use valora_catalog::Product;

use crate::cache::TtlCache;
use crate::engine::PricingContext;
use crate::factor::{FactorError, FactorProvider, FACTOR_COMPETITOR};
use crate::policy::PricingPolicy;

/// One observed competitor price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorPriceSample {
    pub product_id: Uuid,
    pub competitor_id: String,
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

/// Aggregated market view over the latest sample of each competitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub average_price: f64,
    pub competitor_count: usize,
}

/// Tuning knobs for market aggregation
#[derive(Debug, Clone)]
pub struct CompetitorTuning {
    /// Market snapshot cache TTL
    pub snapshot_ttl: chrono::Duration,

    /// Superseded samples kept per competitor for trend analysis
    pub history_limit: usize,
}

impl Default for CompetitorTuning {
    fn default() -> Self {
        Self {
            snapshot_ttl: chrono::Duration::seconds(900),
            history_limit: 100,
        }
    }
}

/// Tracks competitor price observations per product.
///
/// Every sample is kept (up to the per-competitor history cap) but only
/// the most recent one per competitor feeds the market average, so one
/// chatty competitor cannot dominate the factor.
pub struct CompetitorPriceTracker {
    samples: RwLock<HashMap<Uuid, HashMap<String, Vec<CompetitorPriceSample>>>>,
    snapshots: TtlCache<Uuid, MarketSnapshot>,
    tuning: CompetitorTuning,
}

impl CompetitorPriceTracker {
    pub fn new(tuning: CompetitorTuning) -> Self {
        Self {
            samples: RwLock::new(HashMap::new()),
            snapshots: TtlCache::new(tuning.snapshot_ttl),
            tuning,
        }
    }

    /// Append an observation and invalidate the cached market snapshot.
    pub fn record_sample(&self, product_id: Uuid, competitor_id: &str, price: f64) {
        self.record_sample_at(product_id, competitor_id, price, Utc::now());
    }

    pub fn record_sample_at(
        &self,
        product_id: Uuid,
        competitor_id: &str,
        price: f64,
        observed_at: DateTime<Utc>,
    ) {
        if let Ok(mut samples) = self.samples.write() {
            let history = samples
                .entry(product_id)
                .or_default()
                .entry(competitor_id.to_string())
                .or_default();
            history.push(CompetitorPriceSample {
                product_id,
                competitor_id: competitor_id.to_string(),
                price,
                observed_at,
            });
            if history.len() > self.tuning.history_limit {
                let excess = history.len() - self.tuning.history_limit;
                history.drain(..excess);
            }
        }
        self.snapshots.invalidate(&product_id);
    }

    /// Market snapshot for the product, or None without any samples.
    pub fn market_snapshot(&self, product_id: Uuid) -> Option<MarketSnapshot> {
        self.market_snapshot_at(product_id, Utc::now())
    }

    pub fn market_snapshot_at(
        &self,
        product_id: Uuid,
        now: DateTime<Utc>,
    ) -> Option<MarketSnapshot> {
        if let Some(cached) = self.snapshots.get(&product_id, now) {
            return Some(cached);
        }

        let snapshot = self.compute_snapshot(product_id)?;
        self.snapshots.set(product_id, snapshot.clone(), now);
        Some(snapshot)
    }

    fn compute_snapshot(&self, product_id: Uuid) -> Option<MarketSnapshot> {
        let samples = self.samples.read().ok()?;
        let competitors = samples.get(&product_id)?;

        let latest: Vec<f64> = competitors
            .values()
            .filter_map(|history| {
                history
                    .iter()
                    .max_by_key(|sample| sample.observed_at)
                    .map(|sample| sample.price)
            })
            .collect();

        if latest.is_empty() {
            return None;
        }

        Some(MarketSnapshot {
            average_price: latest.iter().sum::<f64>() / latest.len() as f64,
            competitor_count: latest.len(),
        })
    }

    /// Relative market position in [-1, 1]: negative when we are priced
    /// above the market, positive when below it, 0.0 without data.
    pub fn competitor_factor(&self, product: &Product) -> f64 {
        self.competitor_factor_at(product, Utc::now())
    }

    pub fn competitor_factor_at(&self, product: &Product, now: DateTime<Utc>) -> f64 {
        if product.base_price <= 0.0 {
            return 0.0;
        }

        match self.market_snapshot_at(product.id, now) {
            Some(snapshot) => {
                let relative = (snapshot.average_price - product.base_price) / product.base_price;
                relative.clamp(-1.0, 1.0)
            }
            None => 0.0,
        }
    }

    /// Products with at least one recorded sample.
    pub fn product_ids(&self) -> Vec<Uuid> {
        self.samples
            .read()
            .map(|samples| samples.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for CompetitorPriceTracker {
    fn default() -> Self {
        Self::new(CompetitorTuning::default())
    }
}

impl FactorProvider for CompetitorPriceTracker {
    fn name(&self) -> &'static str {
        FACTOR_COMPETITOR
    }

    fn weight(&self, policy: &PricingPolicy) -> f64 {
        policy.competitor_weight
    }

    fn factor(&self, product: &Product, ctx: &PricingContext) -> Result<f64, FactorError> {
        Ok(self.competitor_factor_at(product, ctx.requested_at))
    }
}

/// External source of competitor quotes, polled by the periodic scan job.
#[async_trait]
pub trait CompetitorFeed: Send + Sync {
    async fn fetch_quotes(&self) -> Result<Vec<CompetitorQuote>, FeedError>;
}

/// One quote as delivered by a feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorQuote {
    pub product_id: Uuid,
    pub competitor_id: String,
    pub price: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Request(String),

    #[error("Feed payload invalid: {0}")]
    InvalidPayload(String),
}
