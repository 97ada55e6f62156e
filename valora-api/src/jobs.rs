use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use valora_pricing::{
    CompetitorFeed, CompetitorPriceTracker, DemandSignalStore, InventoryLevelTracker,
    PricingPolicy,
};
use valora_store::DbClient;

use crate::state::PolicyHandle;

/// Spread job start times so a fleet of instances does not hit the feed
/// and the database in lockstep.
fn startup_jitter(interval_secs: u64) -> Duration {
    let ceiling = interval_secs.min(30).max(1);
    let jitter = rand::thread_rng().gen_range(0..ceiling);
    Duration::from_secs(jitter)
}

/// Poll the competitor feed and fold fresh quotes into the tracker.
pub async fn run_competitor_scan(
    feed: Arc<dyn CompetitorFeed>,
    competitors: Arc<CompetitorPriceTracker>,
    interval_secs: u64,
) {
    sleep(startup_jitter(interval_secs)).await;
    info!("Competitor scan job started, polling every {}s", interval_secs);

    loop {
        match feed.fetch_quotes().await {
            Ok(quotes) => {
                let mut recorded = 0;
                for quote in quotes {
                    if quote.price.is_finite() && quote.price >= 0.0 {
                        competitors.record_sample(quote.product_id, &quote.competitor_id, quote.price);
                        recorded += 1;
                    } else {
                        warn!(
                            "Feed returned invalid price {} for product {}",
                            quote.price, quote.product_id
                        );
                    }
                }
                info!("Competitor scan recorded {} quotes", recorded);
            }
            Err(e) => warn!("Competitor scan failed, keeping last observations: {}", e),
        }

        sleep(Duration::from_secs(interval_secs)).await;
    }
}

/// Drop demand signals past retention and rebuild the cached factors.
pub async fn run_demand_rollup(demand: Arc<DemandSignalStore>, interval_secs: u64) {
    sleep(startup_jitter(interval_secs)).await;
    info!("Demand rollup job started, running every {}s", interval_secs);

    loop {
        demand.rollup(Utc::now());
        debug!("Demand rollup completed for {} products", demand.product_ids().len());

        sleep(Duration::from_secs(interval_secs)).await;
    }
}

/// Prune stock history past retention and rewarm the average cache.
pub async fn run_stock_recompute(inventory: Arc<InventoryLevelTracker>, interval_secs: u64) {
    sleep(startup_jitter(interval_secs)).await;
    info!("Stock recompute job started, running every {}s", interval_secs);

    loop {
        inventory.refresh_averages(Utc::now());
        debug!(
            "Stock averages recomputed for {} products",
            inventory.product_ids().len()
        );

        sleep(Duration::from_secs(interval_secs)).await;
    }
}

/// Reload stored policy overrides. Invalid or unreadable overrides leave
/// the current policy in place.
pub async fn run_policy_refresh(
    db: Arc<DbClient>,
    policy: Arc<PolicyHandle>,
    defaults: PricingPolicy,
    interval_secs: u64,
) {
    sleep(startup_jitter(interval_secs)).await;
    info!("Policy refresh job started, running every {}s", interval_secs);

    loop {
        match db.fetch_policy_overrides(defaults.clone()).await {
            Ok(merged) => match merged.validate() {
                Ok(()) => {
                    policy.replace(merged).await;
                    debug!("Pricing policy refreshed from stored rules");
                }
                Err(e) => warn!("Rejecting invalid policy overrides: {}", e),
            },
            Err(e) => warn!("Policy refresh failed, keeping current policy: {}", e),
        }

        sleep(Duration::from_secs(interval_secs)).await;
    }
}
