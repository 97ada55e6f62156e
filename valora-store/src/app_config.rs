use serde::Deserialize;
use std::env;

use valora_pricing::competitor::CompetitorTuning;
use valora_pricing::demand::DemandTuning;
use valora_pricing::inventory::InventoryTuning;
use valora_pricing::policy::{PolicyError, PricingPolicy};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub pricing: PricingSettings,
    #[serde(default)]
    pub signals: SignalSettings,
    #[serde(default)]
    pub jobs: JobSettings,
    #[serde(default)]
    pub feed: Option<FeedConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    #[serde(default = "default_group_id")]
    pub group_id: String,
}

fn default_group_id() -> String {
    "valora-pricing".to_string()
}

/// Policy knobs plus the quote-path switches. Every field has a default
/// so the section can be omitted entirely.
#[derive(Debug, Deserialize, Clone)]
pub struct PricingSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_quote_timeout_ms")]
    pub quote_timeout_ms: u64,

    #[serde(default = "default_demand_weight")]
    pub demand_weight: f64,

    #[serde(default = "default_inventory_weight")]
    pub inventory_weight: f64,

    #[serde(default = "default_competitor_weight")]
    pub competitor_weight: f64,

    #[serde(default = "default_adjustment_limit")]
    pub adjustment_limit: f64,

    #[serde(default = "default_minimum_margin_rate")]
    pub minimum_margin_rate: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_quote_timeout_ms() -> u64 {
    250
}

fn default_demand_weight() -> f64 {
    0.4
}

fn default_inventory_weight() -> f64 {
    0.3
}

fn default_competitor_weight() -> f64 {
    0.3
}

fn default_adjustment_limit() -> f64 {
    0.20
}

fn default_minimum_margin_rate() -> f64 {
    0.15
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            quote_timeout_ms: default_quote_timeout_ms(),
            demand_weight: default_demand_weight(),
            inventory_weight: default_inventory_weight(),
            competitor_weight: default_competitor_weight(),
            adjustment_limit: default_adjustment_limit(),
            minimum_margin_rate: default_minimum_margin_rate(),
        }
    }
}

impl PricingSettings {
    /// Validated policy built from the configured knobs.
    pub fn policy(&self) -> Result<PricingPolicy, PolicyError> {
        let policy = PricingPolicy {
            demand_weight: self.demand_weight,
            inventory_weight: self.inventory_weight,
            competitor_weight: self.competitor_weight,
            adjustment_limit: self.adjustment_limit,
            minimum_margin_rate: self.minimum_margin_rate,
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Windows, retention and cache lifetimes for the signal stores.
#[derive(Debug, Deserialize, Clone)]
pub struct SignalSettings {
    #[serde(default = "default_demand_window_hours")]
    pub demand_window_hours: i64,

    #[serde(default = "default_purchase_weight")]
    pub purchase_weight: f64,

    #[serde(default = "default_demand_saturation")]
    pub demand_saturation: f64,

    #[serde(default = "default_demand_retention_days")]
    pub demand_retention_days: i64,

    #[serde(default = "default_demand_factor_ttl_secs")]
    pub demand_factor_ttl_secs: i64,

    #[serde(default = "default_stock_window_days")]
    pub stock_window_days: i64,

    #[serde(default = "default_average_stock_ttl_secs")]
    pub average_stock_ttl_secs: i64,

    #[serde(default = "default_stock_retention_days")]
    pub stock_retention_days: i64,

    #[serde(default = "default_competitor_snapshot_ttl_secs")]
    pub competitor_snapshot_ttl_secs: i64,

    #[serde(default = "default_competitor_history_limit")]
    pub competitor_history_limit: usize,
}

fn default_demand_window_hours() -> i64 {
    24
}

fn default_purchase_weight() -> f64 {
    3.0
}

fn default_demand_saturation() -> f64 {
    50.0
}

fn default_demand_retention_days() -> i64 {
    7
}

fn default_demand_factor_ttl_secs() -> i64 {
    60
}

fn default_stock_window_days() -> i64 {
    30
}

fn default_average_stock_ttl_secs() -> i64 {
    300
}

fn default_stock_retention_days() -> i64 {
    90
}

fn default_competitor_snapshot_ttl_secs() -> i64 {
    900
}

fn default_competitor_history_limit() -> usize {
    100
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            demand_window_hours: default_demand_window_hours(),
            purchase_weight: default_purchase_weight(),
            demand_saturation: default_demand_saturation(),
            demand_retention_days: default_demand_retention_days(),
            demand_factor_ttl_secs: default_demand_factor_ttl_secs(),
            stock_window_days: default_stock_window_days(),
            average_stock_ttl_secs: default_average_stock_ttl_secs(),
            stock_retention_days: default_stock_retention_days(),
            competitor_snapshot_ttl_secs: default_competitor_snapshot_ttl_secs(),
            competitor_history_limit: default_competitor_history_limit(),
        }
    }
}

impl SignalSettings {
    pub fn demand_tuning(&self) -> DemandTuning {
        DemandTuning {
            window: chrono::Duration::hours(self.demand_window_hours),
            purchase_weight: self.purchase_weight,
            saturation: self.demand_saturation,
            retention: chrono::Duration::days(self.demand_retention_days),
            factor_ttl: chrono::Duration::seconds(self.demand_factor_ttl_secs),
        }
    }

    pub fn inventory_tuning(&self) -> InventoryTuning {
        InventoryTuning {
            window_days: self.stock_window_days,
            average_ttl: chrono::Duration::seconds(self.average_stock_ttl_secs),
            retention: chrono::Duration::days(self.stock_retention_days),
        }
    }

    pub fn competitor_tuning(&self) -> CompetitorTuning {
        CompetitorTuning {
            snapshot_ttl: chrono::Duration::seconds(self.competitor_snapshot_ttl_secs),
            history_limit: self.competitor_history_limit,
        }
    }
}

/// Cadence of the background jobs, in seconds.
#[derive(Debug, Deserialize, Clone)]
pub struct JobSettings {
    #[serde(default = "default_competitor_scan_secs")]
    pub competitor_scan_secs: u64,

    #[serde(default = "default_demand_rollup_secs")]
    pub demand_rollup_secs: u64,

    #[serde(default = "default_stock_recompute_secs")]
    pub stock_recompute_secs: u64,

    #[serde(default = "default_policy_refresh_secs")]
    pub policy_refresh_secs: u64,
}

fn default_competitor_scan_secs() -> u64 {
    900
}

fn default_demand_rollup_secs() -> u64 {
    300
}

fn default_stock_recompute_secs() -> u64 {
    900
}

fn default_policy_refresh_secs() -> u64 {
    300
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            competitor_scan_secs: default_competitor_scan_secs(),
            demand_rollup_secs: default_demand_rollup_secs(),
            stock_recompute_secs: default_stock_recompute_secs(),
            policy_refresh_secs: default_policy_refresh_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub url: String,
    #[serde(default = "default_feed_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_feed_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of VALORA)
            // Eg.. `VALORA__SERVER__PORT=8080` would set the server port
            .add_source(config::Environment::with_prefix("VALORA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_settings_defaults_build_a_valid_policy() {
        let settings = PricingSettings::default();
        let policy = settings.policy().unwrap();

        assert_eq!(policy.demand_weight, 0.4);
        assert_eq!(policy.inventory_weight, 0.3);
        assert_eq!(policy.competitor_weight, 0.3);
        assert_eq!(policy.adjustment_limit, 0.20);
        assert_eq!(policy.minimum_margin_rate, 0.15);
        assert!(settings.enabled);
    }

    #[test]
    fn test_out_of_range_settings_rejected() {
        let settings = PricingSettings {
            adjustment_limit: 1.5,
            ..Default::default()
        };
        assert!(settings.policy().is_err());
    }

    #[test]
    fn test_signal_settings_convert_to_tunings() {
        let settings = SignalSettings::default();

        let demand = settings.demand_tuning();
        assert_eq!(demand.window, chrono::Duration::hours(24));
        assert_eq!(demand.purchase_weight, 3.0);

        let inventory = settings.inventory_tuning();
        assert_eq!(inventory.window_days, 30);
        assert_eq!(inventory.average_ttl, chrono::Duration::seconds(300));

        let competitor = settings.competitor_tuning();
        assert_eq!(competitor.snapshot_ttl, chrono::Duration::seconds(900));
        assert_eq!(competitor.history_limit, 100);
    }
}
