//! Storm service: report store mutations that drive contour regeneration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;

use super::ContourPipeline;
use crate::domain::{
    EventBus, GroupingParams, HailReport, MapMessage, StormEvent, StormId, StormRegistry,
    StormSummary, group_reports, partition_valid,
};
use crate::error::{GatewayError, MalformedReport};

/// Result of ingesting a raw report batch.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Storms created from the valid reports.
    pub storms: Vec<StormSummary>,
    /// Reports rejected as malformed.
    pub rejected: Vec<MalformedReport>,
}

/// Orchestration layer for storm operations.
///
/// Every mutation follows the same pattern: update the registry → publish
/// the storm list → resubmit the enabled reports to the contour pipeline.
#[derive(Debug)]
pub struct StormService {
    registry: Arc<StormRegistry>,
    pipeline: ContourPipeline,
    event_bus: EventBus,
    grouping: GroupingParams,
    use_smooth: AtomicBool,
    /// Held across the enabled-report read and the pipeline submit.
    refresh_lock: Mutex<()>,
}

impl StormService {
    /// Creates a new `StormService`.
    #[must_use]
    pub fn new(
        registry: Arc<StormRegistry>,
        pipeline: ContourPipeline,
        event_bus: EventBus,
        grouping: GroupingParams,
        use_smooth: bool,
    ) -> Self {
        Self {
            registry,
            pipeline,
            event_bus,
            grouping,
            use_smooth: AtomicBool::new(use_smooth),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns a reference to the inner [`StormRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<StormRegistry> {
        &self.registry
    }

    /// Returns a reference to the contour pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &ContourPipeline {
        &self.pipeline
    }

    /// Groups a raw report batch into storms and stores them.
    ///
    /// Malformed reports are dropped and returned in the outcome; they do
    /// not block the rest of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if no valid report remains.
    pub async fn ingest_reports(
        &self,
        reports: Vec<HailReport>,
        source: &str,
    ) -> Result<IngestOutcome, GatewayError> {
        let (valid, rejected) = partition_valid(&reports);
        if valid.is_empty() {
            return Err(GatewayError::InvalidRequest(format!(
                "no valid reports in batch of {}",
                reports.len()
            )));
        }
        if !rejected.is_empty() {
            tracing::warn!(rejected = rejected.len(), source, "malformed reports dropped on ingest");
        }

        let mut storms = Vec::new();
        for storm in group_reports(valid, source, &self.grouping) {
            let summary = StormSummary::from(&storm);
            self.registry.insert(storm).await?;
            storms.push(summary);
        }
        tracing::info!(storms = storms.len(), source, "reports ingested");

        self.refresh_contours().await;
        Ok(IngestOutcome { storms, rejected })
    }

    /// Stores one pre-grouped storm.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the storm has no valid
    /// report, or [`GatewayError::MalformedReport`] for the first malformed
    /// one.
    pub async fn add_storm(
        &self,
        name: &str,
        source: &str,
        reports: Vec<HailReport>,
    ) -> Result<StormSummary, GatewayError> {
        for report in &reports {
            report.validate()?;
        }
        let storm = StormEvent::from_reports(name, source, reports)
            .ok_or_else(|| GatewayError::InvalidRequest("storm has no reports".to_string()))?;
        let summary = StormSummary::from(&storm);
        let storm_id = self.registry.insert(storm).await?;

        tracing::info!(%storm_id, name, reports = summary.report_count, "storm added");
        self.refresh_contours().await;
        Ok(summary)
    }

    /// Summaries of all storms, newest first.
    pub async fn get_active_storms(&self) -> Vec<StormSummary> {
        self.registry.active_storms().await
    }

    /// Full storm including its reports.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StormNotFound`] for unknown IDs.
    pub async fn get_storm(&self, storm_id: StormId) -> Result<StormEvent, GatewayError> {
        self.registry.get(storm_id).await
    }

    /// Enables or disables a storm.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StormNotFound`] for unknown IDs.
    pub async fn toggle_storm(
        &self,
        storm_id: StormId,
        enabled: bool,
    ) -> Result<StormSummary, GatewayError> {
        let summary = self.registry.toggle(storm_id, enabled).await?;
        tracing::info!(%storm_id, enabled, "storm toggled");
        self.refresh_contours().await;
        Ok(summary)
    }

    /// Deletes a storm.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StormNotFound`] for unknown IDs.
    pub async fn delete_storm(&self, storm_id: StormId) -> Result<(), GatewayError> {
        let removed = self.registry.remove(storm_id).await?;
        tracing::info!(%storm_id, name = %removed.name, "storm deleted");
        self.refresh_contours().await;
        Ok(())
    }

    /// Current smooth-contour preference.
    #[must_use]
    pub fn smooth_contours(&self) -> bool {
        self.use_smooth.load(Ordering::Relaxed)
    }

    /// Changes the smooth-contour preference and regenerates if it changed.
    pub async fn set_smooth_contours(&self, enabled: bool) {
        let previous = self.use_smooth.swap(enabled, Ordering::Relaxed);
        if previous != enabled {
            tracing::info!(enabled, "smooth contour preference changed");
            self.refresh_contours().await;
        }
    }

    /// Publishes the storm list and resubmits the enabled reports.
    ///
    /// Refreshes are serialized, so the last submission always reflects
    /// every registry mutation that completed before it.
    pub async fn refresh_contours(&self) {
        let _guard = self.refresh_lock.lock().await;
        let storms = self.registry.active_storms().await;
        let _ = self.event_bus.publish(MapMessage::StormsChanged {
            storms,
            timestamp: Utc::now(),
        });
        let reports = self.registry.enabled_reports().await;
        self.pipeline.submit(reports, self.smooth_contours());
    }
}
