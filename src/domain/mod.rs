//! Domain layer: hail reports, storms, knocks, and the event system.
//!
//! This module contains the server-side domain model: report and storm
//! types, the storm registry that serves as the report store, knock
//! entities with their differential updates, and the event bus that
//! carries [`MapMessage`]s to the rendering surface.

pub mod event_bus;
pub mod hail_report;
pub mod ids;
pub mod knock;
pub mod knock_delta;
pub mod map_message;
pub mod storm_event;
pub mod storm_grouping;
pub mod storm_registry;

pub use event_bus::EventBus;
pub use hail_report::{HailReport, partition_valid};
pub use ids::{KnockId, ReportId, StormId};
pub use knock::{KnockEntity, KnockOutcome};
pub use knock_delta::{KnockDelta, compute_delta};
pub use map_message::{MapChannel, MapMessage};
pub use storm_event::{GeoBounds, StormEvent, StormSummary};
pub use storm_grouping::{GroupingParams, group_reports};
pub use storm_registry::StormRegistry;
