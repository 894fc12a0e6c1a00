//! Application services: the building blocks of the engine.

pub mod dispatcher;
pub mod entity_cache;
pub mod identity_resolver;
pub mod lookup;
pub mod plan_aggregator;
pub mod readiness_evaluator;
pub mod segment_monitor;
pub mod toggle_reset;

pub use dispatcher::CleaningDispatcher;
pub use entity_cache::{EntityCache, RoomRecord};
pub use identity_resolver::RoomIdentityResolver;
pub use plan_aggregator::{PlanAggregator, PlanReadout};
pub use readiness_evaluator::{CooldownElapsed, ReadinessEvaluator};
pub use segment_monitor::SegmentMonitor;
pub use toggle_reset::ToggleResetController;
