use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use valora_api::state::{AppState, PolicyHandle, QuoteSettings};
use valora_api::{app, jobs, worker};
use valora_pricing::{
    CompetitorPriceTracker, DemandSignalStore, InventoryLevelTracker, PriceDecisionEngine,
};
use valora_store::{
    DbClient, DecisionRepository, EventProducer, HttpCompetitorFeed, PgDecisionLog,
    PricingTelemetry, StoreProductRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "valora_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = valora_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Valora pricing API on port {}", config.server.port);

    // Postgres Connection
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");
    let db = Arc::new(db);

    // Kafka Connection
    let kafka_producer = EventProducer::new(&config.kafka.brokers)
        .expect("Failed to create Kafka producer");
    let telemetry = Arc::new(PricingTelemetry::new(kafka_producer));

    // In-memory signal stores
    let demand = Arc::new(DemandSignalStore::new(config.signals.demand_tuning()));
    let inventory = Arc::new(InventoryLevelTracker::new(config.signals.inventory_tuning()));
    let competitors = Arc::new(CompetitorPriceTracker::new(config.signals.competitor_tuning()));

    // Decision persistence
    let decision_repo = DecisionRepository::new(db.pool.clone());
    let decision_log = Arc::new(PgDecisionLog::spawn(decision_repo.clone(), 1024));
    let decisions = Arc::new(decision_repo);

    // Pricing engine with its factor providers in evaluation order
    let mut engine = PriceDecisionEngine::new(decision_log);
    engine.register(demand.clone());
    engine.register(inventory.clone());
    engine.register(competitors.clone());
    let engine = Arc::new(engine);

    // Startup policy: configured defaults overlaid with stored rules
    let base_policy = config.pricing.policy().expect("Invalid pricing configuration");
    let startup_policy = match db.fetch_policy_overrides(base_policy.clone()).await {
        Ok(merged) => match merged.validate() {
            Ok(()) => merged,
            Err(e) => {
                tracing::warn!("Ignoring invalid stored policy overrides: {}", e);
                base_policy.clone()
            }
        },
        Err(e) => {
            tracing::warn!("Could not read stored policy overrides, using configured policy: {}", e);
            base_policy.clone()
        }
    };
    let policy = Arc::new(PolicyHandle::new(startup_policy));

    // SSE Broadcast Channel
    let (sse_tx, _) = tokio::sync::broadcast::channel(100);

    let app_state = AppState {
        products: Arc::new(StoreProductRepository::new(db.pool.clone())),
        engine,
        policy: policy.clone(),
        demand: demand.clone(),
        inventory: inventory.clone(),
        competitors: competitors.clone(),
        decisions,
        telemetry,
        sse_tx,
        quote: QuoteSettings {
            enabled: config.pricing.enabled,
            timeout: Duration::from_millis(config.pricing.quote_timeout_ms),
        },
    };

    // Kafka signal consumer
    tokio::spawn(worker::start_signal_worker(
        config.kafka.brokers.clone(),
        config.kafka.group_id.clone(),
        demand.clone(),
        inventory.clone(),
        competitors.clone(),
    ));

    // Background jobs
    match &config.feed {
        Some(feed_config) => {
            let feed = HttpCompetitorFeed::new(&feed_config.url, feed_config.timeout_secs)
                .expect("Failed to build competitor feed client");
            tokio::spawn(jobs::run_competitor_scan(
                Arc::new(feed),
                competitors.clone(),
                config.jobs.competitor_scan_secs,
            ));
        }
        None => tracing::info!("No competitor feed configured, scan job disabled"),
    }
    tokio::spawn(jobs::run_demand_rollup(
        demand.clone(),
        config.jobs.demand_rollup_secs,
    ));
    tokio::spawn(jobs::run_stock_recompute(
        inventory.clone(),
        config.jobs.stock_recompute_secs,
    ));
    tokio::spawn(jobs::run_policy_refresh(
        db.clone(),
        policy,
        base_policy,
        config.jobs.policy_refresh_secs,
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
