use std::sync::Arc;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{error, info, warn};

use valora_pricing::{CompetitorPriceTracker, DemandSignalStore, InventoryLevelTracker, SignalKind};
use valora_shared::models::events::{
    CompetitorPriceObservedEvent, InventoryChangedEvent, ProductPurchasedEvent, ProductViewedEvent,
    TOPIC_COMPETITOR_OBSERVED, TOPIC_INVENTORY_CHANGED, TOPIC_PRODUCT_PURCHASED,
    TOPIC_PRODUCT_VIEWED,
};

pub async fn start_signal_worker(
    brokers: String,
    group_id: String,
    demand: Arc<DemandSignalStore>,
    inventory: Arc<InventoryLevelTracker>,
    competitors: Arc<CompetitorPriceTracker>,
) {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("group.id", &group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "earliest")
        .create()
        .expect("Consumer creation failed");

    consumer
        .subscribe(&[
            TOPIC_PRODUCT_VIEWED,
            TOPIC_PRODUCT_PURCHASED,
            TOPIC_INVENTORY_CHANGED,
            TOPIC_COMPETITOR_OBSERVED,
        ])
        .expect("Can't subscribe");

    info!("Signal worker started, listening for pricing signals...");

    loop {
        match consumer.recv().await {
            Err(e) => error!("Kafka error: {}", e),
            Ok(m) => {
                if let Some(payload) = m.payload_view::<str>() {
                    match payload {
                        Ok(raw) => dispatch_signal(m.topic(), raw, &demand, &inventory, &competitors),
                        Err(e) => error!("Error reading payload: {}", e),
                    }
                }
            }
        }
    }
}

/// Route one raw event to its signal store. A record that fails to parse
/// or carries an invalid value is logged and dropped so the consumer keeps
/// draining the topic.
fn dispatch_signal(
    topic: &str,
    raw: &str,
    demand: &DemandSignalStore,
    inventory: &InventoryLevelTracker,
    competitors: &CompetitorPriceTracker,
) {
    match topic {
        TOPIC_PRODUCT_VIEWED => match serde_json::from_str::<ProductViewedEvent>(raw) {
            Ok(event) => demand.record_signal(event.product_id, SignalKind::View, 1),
            Err(e) => error!("Malformed event on {}: {}", topic, e),
        },
        TOPIC_PRODUCT_PURCHASED => match serde_json::from_str::<ProductPurchasedEvent>(raw) {
            Ok(event) if event.quantity == 0 => {
                warn!("Ignoring zero-quantity purchase for product {}", event.product_id)
            }
            Ok(event) => demand.record_signal(event.product_id, SignalKind::Purchase, event.quantity),
            Err(e) => error!("Malformed event on {}: {}", topic, e),
        },
        TOPIC_INVENTORY_CHANGED => match serde_json::from_str::<InventoryChangedEvent>(raw) {
            Ok(event) if event.new_quantity < 0 => warn!(
                "Ignoring negative stock level {} for product {}",
                event.new_quantity, event.product_id
            ),
            Ok(event) => inventory.record_stock(event.product_id, event.new_quantity),
            Err(e) => error!("Malformed event on {}: {}", topic, e),
        },
        TOPIC_COMPETITOR_OBSERVED => match serde_json::from_str::<CompetitorPriceObservedEvent>(raw) {
            Ok(event) if !event.price.is_finite() || event.price < 0.0 => warn!(
                "Ignoring invalid competitor price {} for product {}",
                event.price, event.product_id
            ),
            Ok(event) => competitors.record_sample(event.product_id, &event.competitor_id, event.price),
            Err(e) => error!("Malformed event on {}: {}", topic, e),
        },
        other => warn!("Ignoring message from unexpected topic {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn stores() -> (DemandSignalStore, InventoryLevelTracker, CompetitorPriceTracker) {
        (
            DemandSignalStore::default(),
            InventoryLevelTracker::default(),
            CompetitorPriceTracker::default(),
        )
    }

    #[test]
    fn test_view_event_lands_in_the_demand_store() {
        let (demand, inventory, competitors) = stores();
        let product_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"product_id":"{}","customer_id":null,"timestamp":{}}}"#,
            product_id,
            Utc::now().timestamp()
        );

        dispatch_signal(TOPIC_PRODUCT_VIEWED, &raw, &demand, &inventory, &competitors);

        assert!(demand.demand_factor(product_id) > 0.0);
    }

    #[test]
    fn test_inventory_event_updates_the_tracker() {
        let (demand, inventory, competitors) = stores();
        let product_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"product_id":"{}","new_quantity":120,"timestamp":{}}}"#,
            product_id,
            Utc::now().timestamp()
        );

        dispatch_signal(TOPIC_INVENTORY_CHANGED, &raw, &demand, &inventory, &competitors);

        assert_eq!(inventory.average_stock(product_id, 30), 120.0);
    }

    #[test]
    fn test_negative_stock_is_dropped() {
        let (demand, inventory, competitors) = stores();
        let product_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"product_id":"{}","new_quantity":-5,"timestamp":{}}}"#,
            product_id,
            Utc::now().timestamp()
        );

        dispatch_signal(TOPIC_INVENTORY_CHANGED, &raw, &demand, &inventory, &competitors);

        assert!(inventory.product_ids().is_empty());
    }

    #[test]
    fn test_competitor_event_feeds_the_market_snapshot() {
        let (demand, inventory, competitors) = stores();
        let product_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"product_id":"{}","competitor_id":"acme","price":89.5,"timestamp":{}}}"#,
            product_id,
            Utc::now().timestamp()
        );

        dispatch_signal(TOPIC_COMPETITOR_OBSERVED, &raw, &demand, &inventory, &competitors);

        let snapshot = competitors.market_snapshot(product_id);
        assert_eq!(snapshot.map(|s| s.average_price), Some(89.5));
    }

    #[test]
    fn test_malformed_payload_is_ignored() {
        let (demand, inventory, competitors) = stores();

        dispatch_signal(TOPIC_PRODUCT_VIEWED, "not json", &demand, &inventory, &competitors);
        dispatch_signal("unknown.topic", "{}", &demand, &inventory, &competitors);

        assert!(demand.product_ids().is_empty());
    }
}
