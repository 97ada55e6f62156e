use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use valora_catalog::Product;

use crate::cache::TtlCache;
use crate::engine::PricingContext;
use crate::factor::{FactorError, FactorProvider, FACTOR_INVENTORY};
use crate::policy::PricingPolicy;

/// Current stock below this share of the rolling average reads as scarcity.
const SCARCITY_RATIO: f64 = 0.2;

/// Current stock above this multiple of the rolling average reads as overstock.
const OVERSTOCK_RATIO: f64 = 2.0;

const SCARCITY_PREMIUM: f64 = 0.15;
const OVERSTOCK_DISCOUNT: f64 = -0.10;

/// Point-in-time stock level for a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub product_id: Uuid,
    pub quantity: i32,
    pub recorded_at: DateTime<Utc>,
}

/// Tuning knobs for stock averaging
#[derive(Debug, Clone)]
pub struct InventoryTuning {
    /// Days of history feeding the rolling average
    pub window_days: i64,

    /// Rolling-average cache TTL
    pub average_ttl: Duration,

    /// Snapshots older than this are pruned on refresh
    pub retention: Duration,
}

impl Default for InventoryTuning {
    fn default() -> Self {
        Self {
            window_days: 30,
            average_ttl: Duration::seconds(300),
            retention: Duration::days(90),
        }
    }
}

/// Tracks stock snapshots per product and derives an inventory factor
/// from the ratio of current stock to the rolling average.
///
/// The factor is a three-step function: a scarcity premium well below the
/// average, an overstock discount well above it, neutral otherwise. Both
/// comparisons are strict, so a ratio sitting exactly on a boundary is
/// neutral.
pub struct InventoryLevelTracker {
    snapshots: RwLock<HashMap<Uuid, Vec<StockSnapshot>>>,
    averages: TtlCache<Uuid, f64>,
    tuning: InventoryTuning,
}

impl InventoryLevelTracker {
    pub fn new(tuning: InventoryTuning) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            averages: TtlCache::new(tuning.average_ttl),
            tuning,
        }
    }

    /// Append a stock snapshot and invalidate the cached average so the
    /// next factor read reflects it immediately.
    pub fn record_stock(&self, product_id: Uuid, quantity: i32) {
        self.record_stock_at(product_id, quantity, Utc::now());
    }

    pub fn record_stock_at(&self, product_id: Uuid, quantity: i32, recorded_at: DateTime<Utc>) {
        if let Ok(mut snapshots) = self.snapshots.write() {
            snapshots.entry(product_id).or_default().push(StockSnapshot {
                product_id,
                quantity,
                recorded_at,
            });
        }
        self.averages.invalidate(&product_id);
    }

    /// Mean snapshot quantity over the trailing window, 0.0 without data.
    pub fn average_stock(&self, product_id: Uuid, window_days: i64) -> f64 {
        self.average_stock_at(product_id, window_days, Utc::now())
    }

    /// Windowed average against an explicit instant. Only the configured
    /// window is cached; ad-hoc windows are computed directly.
    pub fn average_stock_at(&self, product_id: Uuid, window_days: i64, now: DateTime<Utc>) -> f64 {
        if window_days != self.tuning.window_days {
            return self.compute_average(product_id, window_days, now);
        }

        if let Some(cached) = self.averages.get(&product_id, now) {
            return cached;
        }

        let average = self.compute_average(product_id, window_days, now);
        self.averages.set(product_id, average, now);
        average
    }

    fn compute_average(&self, product_id: Uuid, window_days: i64, now: DateTime<Utc>) -> f64 {
        let cutoff = now - Duration::days(window_days);
        let snapshots = match self.snapshots.read() {
            Ok(snapshots) => snapshots,
            Err(_) => return 0.0,
        };

        let window: Vec<i32> = snapshots
            .get(&product_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|s| s.recorded_at > cutoff && s.recorded_at <= now)
                    .map(|s| s.quantity)
                    .collect()
            })
            .unwrap_or_default();

        if window.is_empty() {
            return 0.0;
        }

        window.iter().map(|q| *q as f64).sum::<f64>() / window.len() as f64
    }

    /// Inventory factor for the product's current stock as of now.
    pub fn inventory_factor(&self, product: &Product) -> f64 {
        self.inventory_factor_at(product, Utc::now())
    }

    pub fn inventory_factor_at(&self, product: &Product, now: DateTime<Utc>) -> f64 {
        let average = self.average_stock_at(product.id, self.tuning.window_days, now);
        if average == 0.0 {
            return 0.0;
        }

        let ratio = product.current_stock as f64 / average;
        if ratio < SCARCITY_RATIO {
            SCARCITY_PREMIUM
        } else if ratio > OVERSTOCK_RATIO {
            OVERSTOCK_DISCOUNT
        } else {
            0.0
        }
    }

    /// Prune snapshots past retention and re-warm every cached average.
    /// Called by the periodic stock recompute job.
    pub fn refresh_averages(&self, now: DateTime<Utc>) {
        let cutoff = now - self.tuning.retention;
        if let Ok(mut snapshots) = self.snapshots.write() {
            for entries in snapshots.values_mut() {
                entries.retain(|s| s.recorded_at > cutoff);
            }
            snapshots.retain(|_, entries| !entries.is_empty());
        }

        for product_id in self.product_ids() {
            let average = self.compute_average(product_id, self.tuning.window_days, now);
            self.averages.set(product_id, average, now);
        }
    }

    /// Products with at least one retained snapshot.
    pub fn product_ids(&self) -> Vec<Uuid> {
        self.snapshots
            .read()
            .map(|snapshots| snapshots.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for InventoryLevelTracker {
    fn default() -> Self {
        Self::new(InventoryTuning::default())
    }
}

impl FactorProvider for InventoryLevelTracker {
    fn name(&self) -> &'static str {
        FACTOR_INVENTORY
    }

    fn weight(&self, policy: &PricingPolicy) -> f64 {
        policy.inventory_weight
    }

    fn factor(&self, product: &Product, ctx: &PricingContext) -> Result<f64, FactorError> {
        Ok(self.inventory_factor_at(product, ctx.requested_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_stock(current_stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            sku: "SKU-2001".to_string(),
            name: "Ceramic Pour-Over Set".to_string(),
            description: None,
            base_price: 100.0,
            cost: Some(70.0),
            current_stock,
            currency: "USD".to_string(),
            is_active: true,
            metadata: serde_json::json!({}),
        }
    }

    fn tracker_with_average(product_id: Uuid, average: i32, now: DateTime<Utc>) -> InventoryLevelTracker {
        let tracker = InventoryLevelTracker::default();
        tracker.record_stock_at(product_id, average, now - Duration::days(1));
        tracker
    }

    #[test]
    fn test_no_history_yields_neutral_factor() {
        let tracker = InventoryLevelTracker::default();
        let product = product_with_stock(10);
        assert_eq!(tracker.inventory_factor(&product), 0.0);
    }

    #[test]
    fn test_scarcity_premium_below_threshold() {
        let now = Utc::now();
        let product = product_with_stock(9);
        let tracker = tracker_with_average(product.id, 50, now);

        // 9 / 50 = 0.18, strictly under the scarcity boundary
        assert_eq!(tracker.inventory_factor_at(&product, now), SCARCITY_PREMIUM);
    }

    #[test]
    fn test_scarcity_boundary_is_strict() {
        let now = Utc::now();
        let product = product_with_stock(10);
        let tracker = tracker_with_average(product.id, 50, now);

        // 10 / 50 = 0.2 exactly, which is neutral
        assert_eq!(tracker.inventory_factor_at(&product, now), 0.0);
    }

    #[test]
    fn test_overstock_discount_above_threshold() {
        let now = Utc::now();
        let product = product_with_stock(101);
        let tracker = tracker_with_average(product.id, 50, now);

        // 101 / 50 = 2.02, strictly over the overstock boundary
        assert_eq!(tracker.inventory_factor_at(&product, now), OVERSTOCK_DISCOUNT);
    }

    #[test]
    fn test_overstock_boundary_is_strict() {
        let now = Utc::now();
        let product = product_with_stock(100);
        let tracker = tracker_with_average(product.id, 50, now);

        // 100 / 50 = 2.0 exactly, which is neutral
        assert_eq!(tracker.inventory_factor_at(&product, now), 0.0);
    }

    #[test]
    fn test_average_ignores_snapshots_outside_window() {
        let tracker = InventoryLevelTracker::default();
        let product_id = Uuid::new_v4();
        let now = Utc::now();

        tracker.record_stock_at(product_id, 1000, now - Duration::days(31));
        tracker.record_stock_at(product_id, 40, now - Duration::days(2));
        tracker.record_stock_at(product_id, 60, now - Duration::days(1));

        let average = tracker.average_stock_at(product_id, 30, now);
        assert!((average - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_recording_invalidates_cached_average() {
        let tracker = InventoryLevelTracker::default();
        let product_id = Uuid::new_v4();
        let now = Utc::now();

        tracker.record_stock_at(product_id, 50, now - Duration::days(1));
        assert!((tracker.average_stock_at(product_id, 30, now) - 50.0).abs() < 1e-9);

        tracker.record_stock_at(product_id, 150, now);
        assert!((tracker.average_stock_at(product_id, 30, now) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_refresh_prunes_expired_snapshots() {
        let tracker = InventoryLevelTracker::default();
        let stale = Uuid::new_v4();
        let live = Uuid::new_v4();
        let now = Utc::now();

        tracker.record_stock_at(stale, 10, now - Duration::days(91));
        tracker.record_stock_at(live, 10, now - Duration::days(1));

        tracker.refresh_averages(now);

        let ids = tracker.product_ids();
        assert!(!ids.contains(&stale));
        assert!(ids.contains(&live));
    }
}
