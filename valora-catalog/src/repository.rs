use async_trait::async_trait;
use uuid::Uuid;

use crate::product::Product;

/// Repository trait for product catalog access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_active_products(
        &self,
        limit: i64,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>>;
}
