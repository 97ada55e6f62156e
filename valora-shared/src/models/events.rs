use uuid::Uuid;

pub const TOPIC_PRODUCT_VIEWED: &str = "pricing.product.viewed";
pub const TOPIC_PRODUCT_PURCHASED: &str = "pricing.product.purchased";
pub const TOPIC_INVENTORY_CHANGED: &str = "pricing.inventory.changed";
pub const TOPIC_COMPETITOR_OBSERVED: &str = "pricing.competitor.observed";
pub const TOPIC_PRICE_DECISIONS: &str = "pricing.decisions";

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ProductViewedEvent {
    pub product_id: Uuid,
    pub customer_id: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ProductPurchasedEvent {
    pub product_id: Uuid,
    pub order_id: Option<Uuid>,
    pub quantity: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct InventoryChangedEvent {
    pub product_id: Uuid,
    pub new_quantity: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CompetitorPriceObservedEvent {
    pub product_id: Uuid,
    pub competitor_id: String,
    pub price: f64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PriceCalculatedEvent {
    pub decision_id: Uuid,
    pub product_id: Uuid,
    pub old_price: f64,
    pub new_price: f64,
    pub total_adjustment: f64,
    pub factors: serde_json::Value, // Serialized FactorContribution list
    pub timestamp: i64,
}
