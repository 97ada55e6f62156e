pub mod cache;
pub mod competitor;
pub mod decision;
pub mod demand;
pub mod engine;
pub mod factor;
pub mod inventory;
pub mod policy;

pub use competitor::{CompetitorFeed, CompetitorPriceTracker, CompetitorQuote, CompetitorTuning};
pub use decision::{DecisionLog, FactorContribution, MemoryDecisionLog, PricingDecision};
pub use demand::{DemandSignalStore, DemandTuning, SignalKind};
pub use engine::{PriceDecisionEngine, PricingContext};
pub use factor::{FactorError, FactorProvider};
pub use inventory::{InventoryLevelTracker, InventoryTuning};
pub use policy::{PolicyError, PricingPolicy};
