use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use valora_catalog::Product;
use valora_pricing::competitor::CompetitorPriceTracker;
use valora_pricing::decision::MemoryDecisionLog;
use valora_pricing::demand::{DemandSignalStore, DemandTuning, SignalKind};
use valora_pricing::engine::{PriceDecisionEngine, PricingContext};
use valora_pricing::inventory::InventoryLevelTracker;
use valora_pricing::policy::PricingPolicy;

struct Harness {
    demand: Arc<DemandSignalStore>,
    inventory: Arc<InventoryLevelTracker>,
    competitors: Arc<CompetitorPriceTracker>,
    log: Arc<MemoryDecisionLog>,
    engine: PriceDecisionEngine,
}

fn harness() -> Harness {
    // Saturation 200 makes the demand curve easy to pin: 50 views score
    // 50 / 250 = 0.2, 600 single-unit purchases score 1800 / 2000 = 0.9.
    let demand = Arc::new(DemandSignalStore::new(DemandTuning {
        saturation: 200.0,
        ..Default::default()
    }));
    let inventory = Arc::new(InventoryLevelTracker::default());
    let competitors = Arc::new(CompetitorPriceTracker::default());
    let log = Arc::new(MemoryDecisionLog::new());

    let mut engine = PriceDecisionEngine::new(log.clone());
    engine.register(demand.clone());
    engine.register(inventory.clone());
    engine.register(competitors.clone());

    Harness {
        demand,
        inventory,
        competitors,
        log,
        engine,
    }
}

fn product(base_price: f64, cost: Option<f64>, current_stock: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        sku: "SKU-5001".to_string(),
        name: "Oak Bookend Pair".to_string(),
        description: None,
        base_price,
        cost,
        current_stock,
        currency: "USD".to_string(),
        is_active: true,
        metadata: serde_json::json!({}),
    }
}

#[test]
fn moderate_signals_move_the_price_within_the_cap() {
    let h = harness();
    let now = Utc::now();
    let product = product(100.0, Some(70.0), 10);

    for _ in 0..50 {
        h.demand
            .record_signal_at(product.id, SignalKind::View, 1, now - Duration::hours(1));
    }
    h.inventory
        .record_stock_at(product.id, 100, now - Duration::days(1));
    h.competitors
        .record_sample_at(product.id, "acme", 95.0, now - Duration::hours(2));

    let ctx = PricingContext {
        requested_at: now,
        ..Default::default()
    };
    let (price, decision) = h
        .engine
        .calculate(&product, &PricingPolicy::default(), &ctx);

    // demand 0.2, inventory +0.15 (stock 10 vs average 100), competitor
    // -0.05 (market 95 vs base 100): adjustment 0.11
    assert!((decision.demand_factor() - 0.2).abs() < 1e-9);
    assert!((decision.inventory_factor() - 0.15).abs() < 1e-9);
    assert!((decision.competitor_factor() - (-0.05)).abs() < 1e-9);
    assert!((decision.total_adjustment - 0.11).abs() < 1e-9);
    assert!((price - 111.0).abs() < 1e-9);
    assert!(!decision.margin_floor_applied);
}

#[test]
fn hot_demand_is_clamped_by_the_adjustment_limit() {
    let h = harness();
    let now = Utc::now();
    let product = product(100.0, Some(70.0), 10);

    for _ in 0..600 {
        h.demand.record_signal_at(
            product.id,
            SignalKind::Purchase,
            1,
            now - Duration::hours(1),
        );
    }
    h.inventory
        .record_stock_at(product.id, 100, now - Duration::days(1));
    h.competitors
        .record_sample_at(product.id, "acme", 95.0, now - Duration::hours(2));

    let ctx = PricingContext {
        requested_at: now,
        ..Default::default()
    };
    let (price, decision) = h
        .engine
        .calculate(&product, &PricingPolicy::default(), &ctx);

    assert!((decision.demand_factor() - 0.9).abs() < 1e-9);
    assert!((decision.raw_adjustment - 0.39).abs() < 1e-9);
    assert!((decision.total_adjustment - 0.20).abs() < 1e-9);
    assert!((price - 120.0).abs() < 1e-9);
}

#[test]
fn margin_floor_wins_over_a_crushing_market() {
    let h = harness();
    let now = Utc::now();
    let product = product(100.0, Some(95.0), 30);

    // Overstocked (30 on hand vs average 10) and badly undercut
    h.inventory
        .record_stock_at(product.id, 10, now - Duration::days(1));
    h.competitors
        .record_sample_at(product.id, "acme", 40.0, now - Duration::hours(2));

    let ctx = PricingContext {
        requested_at: now,
        ..Default::default()
    };
    let (price, decision) = h
        .engine
        .calculate(&product, &PricingPolicy::default(), &ctx);

    // Raw -0.21 clamps to -0.20, candidate 80.00, floor 95 * 1.15
    assert!((decision.inventory_factor() - (-0.10)).abs() < 1e-9);
    assert!((decision.competitor_factor() - (-0.6)).abs() < 1e-9);
    assert!((decision.candidate_price - 80.0).abs() < 1e-9);
    assert!((price - 109.25).abs() < 1e-9);
    assert!(decision.margin_floor_applied);
}

#[test]
fn product_without_history_keeps_its_base_price() {
    let h = harness();
    let product = product(100.0, Some(70.0), 25);

    let (price, decision) =
        h.engine
            .calculate(&product, &PricingPolicy::default(), &PricingContext::default());

    assert_eq!(price, 100.0);
    assert_eq!(decision.total_adjustment, 0.0);
    assert_eq!(decision.factors.len(), 3);
}

#[test]
fn repeated_calculation_over_unchanged_state_is_stable() {
    let h = harness();
    let now = Utc::now();
    let product = product(100.0, Some(70.0), 10);

    for _ in 0..50 {
        h.demand
            .record_signal_at(product.id, SignalKind::View, 1, now - Duration::hours(1));
    }
    h.inventory
        .record_stock_at(product.id, 100, now - Duration::days(1));
    h.competitors
        .record_sample_at(product.id, "acme", 95.0, now - Duration::hours(2));

    let ctx = PricingContext {
        requested_at: now,
        ..Default::default()
    };
    let (first, first_decision) = h
        .engine
        .calculate(&product, &PricingPolicy::default(), &ctx);
    let (second, second_decision) = h
        .engine
        .calculate(&product, &PricingPolicy::default(), &ctx);

    assert_eq!(first, second);
    assert_eq!(
        first_decision.total_adjustment,
        second_decision.total_adjustment
    );
    assert_ne!(first_decision.id, second_decision.id);
    assert_eq!(h.log.len(), 2);
}

#[test]
fn fresh_signals_are_visible_to_the_next_calculation() {
    let h = harness();
    let now = Utc::now();
    let product = product(100.0, Some(70.0), 10);

    h.inventory
        .record_stock_at(product.id, 100, now - Duration::days(1));

    let ctx = PricingContext {
        requested_at: now,
        ..Default::default()
    };
    let (before, _) = h
        .engine
        .calculate(&product, &PricingPolicy::default(), &ctx);

    // A competitor undercut lands and the cached snapshot is invalidated
    h.competitors
        .record_sample_at(product.id, "acme", 80.0, now - Duration::minutes(1));

    let (after, decision) = h
        .engine
        .calculate(&product, &PricingPolicy::default(), &ctx);

    assert!(after < before);
    assert!((decision.competitor_factor() - (-0.2)).abs() < 1e-9);
}
