use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use valora_catalog::{Product, ProductRepository};

pub struct StoreProductRepository {
    pool: PgPool,
}

impl StoreProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    sku: String,
    name: String,
    description: Option<String>,
    base_price: f64,
    cost: Option<f64>,
    current_stock: i32,
    currency: Option<String>,
    is_active: Option<bool>,
    metadata: Option<serde_json::Value>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            description: row.description,
            base_price: row.base_price,
            cost: row.cost,
            current_stock: row.current_stock,
            currency: row.currency.unwrap_or_else(|| "USD".to_string()),
            is_active: row.is_active.unwrap_or(true),
            metadata: row.metadata.unwrap_or_else(|| serde_json::json!({})),
        }
    }
}

#[async_trait]
impl ProductRepository for StoreProductRepository {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, sku, name, description, base_price, cost, current_stock, currency, is_active, metadata FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn list_active_products(
        &self,
        limit: i64,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, sku, name, description, base_price, cost, current_stock, currency, is_active, metadata FROM products WHERE is_active = TRUE ORDER BY name LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
