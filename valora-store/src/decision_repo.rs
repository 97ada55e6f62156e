use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{error, warn};
use uuid::Uuid;

use valora_pricing::decision::{DecisionLog, PricingDecision};

/// Persisted decision row, as served by the audit endpoints
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredDecision {
    pub id: Uuid,
    pub product_id: Uuid,
    pub old_price: f64,
    pub new_price: f64,
    pub factors: serde_json::Value,
    pub total_adjustment: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct DecisionRepository {
    pool: PgPool,
}

impl DecisionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, decision: &PricingDecision) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO price_decisions (id, product_id, old_price, new_price, factors, total_adjustment, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(decision.id)
        .bind(decision.product_id)
        .bind(decision.old_price)
        .bind(decision.new_price)
        .bind(decision.factors_json())
        .bind(decision.total_adjustment)
        .bind(decision.calculated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_for_product(
        &self,
        product_id: Uuid,
        limit: i64,
    ) -> Result<Vec<StoredDecision>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, product_id, old_price, new_price, factors, total_adjustment, created_at FROM price_decisions WHERE product_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}

/// Postgres-backed decision log.
///
/// `append` hands the record to a bounded channel drained by a spawned
/// writer task. A full channel or a failed insert is logged and the
/// record dropped; the price path never waits on the database.
pub struct PgDecisionLog {
    tx: mpsc::Sender<PricingDecision>,
}

impl PgDecisionLog {
    pub fn spawn(repository: DecisionRepository, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<PricingDecision>(capacity);

        tokio::spawn(async move {
            while let Some(decision) = rx.recv().await {
                if let Err(e) = repository.insert(&decision).await {
                    error!("Failed to persist decision {}: {}", decision.id, e);
                }
            }
        });

        Self { tx }
    }
}

impl DecisionLog for PgDecisionLog {
    fn append(&self, decision: PricingDecision) {
        if let Err(e) = self.tx.try_send(decision) {
            warn!("Decision log backlogged, dropping record: {}", e);
        }
    }
}
