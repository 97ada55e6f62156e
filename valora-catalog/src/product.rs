use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Core product structure as the pricing subsystem sees it.
///
/// Products are owned by the catalog service; this crate only reads them.
/// `cost` is optional because not every SKU carries unit-cost data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub base_price: f64,
    pub cost: Option<f64>,
    pub current_stock: i32,
    pub currency: String,
    pub is_active: bool,
    pub metadata: serde_json::Value,
}

impl Product {
    /// Boundary validation: malformed monetary fields and negative stock
    /// are rejected here, before any factor computation sees the product.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if !self.base_price.is_finite() || self.base_price < 0.0 {
            return Err(CatalogError::Validation(format!(
                "base price must be a non-negative number, got {}",
                self.base_price
            )));
        }

        if let Some(cost) = self.cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(CatalogError::Validation(format!(
                    "cost must be a non-negative number, got {}",
                    cost
                )));
            }
        }

        if self.current_stock < 0 {
            return Err(CatalogError::Validation(format!(
                "stock cannot be negative, got {}",
                self.current_stock
            )));
        }

        Ok(())
    }
}

/// Catalog-related errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
