use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;
use serde_json::Value;

use valora_pricing::policy::PricingPolicy;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay `pricing_rules` rows onto the configured policy.
    ///
    /// Rows carry `{"value": <number>}` payloads keyed by policy field.
    /// Unknown keys are ignored so rules can be rolled out ahead of code,
    /// and the caller re-validates the merged policy before adopting it.
    pub async fn fetch_policy_overrides(
        &self,
        defaults: PricingPolicy,
    ) -> Result<PricingPolicy, sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct RuleRow {
            rule_key: String,
            rule_value: Value,
        }

        let rows: Vec<RuleRow> =
            sqlx::query_as("SELECT rule_key, rule_value FROM pricing_rules")
                .fetch_all(&self.pool)
                .await?;

        let mut policy = defaults;

        for row in rows {
            if let Some(value) = row.rule_value.get("value").and_then(Value::as_f64) {
                match row.rule_key.as_str() {
                    "demand_weight" => policy.demand_weight = value,
                    "inventory_weight" => policy.inventory_weight = value,
                    "competitor_weight" => policy.competitor_weight = value,
                    "adjustment_limit" => policy.adjustment_limit = value,
                    "minimum_margin_rate" => policy.minimum_margin_rate = value,
                    _ => {}
                }
            }
        }

        Ok(policy)
    }
}
