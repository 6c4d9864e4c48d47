//! Service layer: business logic orchestration.
//!
//! [`StormService`] mutates the storm registry and resubmits enabled
//! reports to the [`ContourPipeline`], which debounces generation and
//! emits contours through the [`super::domain::EventBus`].
//! [`KnockSyncService`] turns knock snapshots into full or differential
//! updates.

pub mod contour_pipeline;
pub mod knock_sync;
pub mod storm_service;

pub use contour_pipeline::{ContourPipeline, PipelinePhase, PipelineStatus};
pub use knock_sync::{KnockPublication, KnockSyncService};
pub use storm_service::{IngestOutcome, StormService};
