pub mod app_config;
pub mod database;
pub mod decision_repo;
pub mod events;
pub mod feed;
pub mod product_repo;

pub use database::DbClient;
pub use decision_repo::{DecisionRepository, PgDecisionLog, StoredDecision};
pub use events::{EventProducer, PricingTelemetry};
pub use feed::HttpCompetitorFeed;
pub use product_repo::StoreProductRepository;
