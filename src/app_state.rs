//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::contour::{SeverityTable, SimpleContourGenerator, SmoothContourGenerator};
use crate::domain::{EventBus, StormRegistry};
use crate::service::{ContourPipeline, KnockSyncService, StormService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Storm service for report store mutations.
    pub storm_service: Arc<StormService>,
    /// Knock snapshot synchronization.
    pub knock_sync: Arc<KnockSyncService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Severity tiers in effect.
    pub severity_table: Arc<SeverityTable>,
    /// Upper bound on REST request handling time.
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires the domain and service layers from configuration.
    ///
    /// Both generators share the configured severity table.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let table = config.severity_table.clone();

        let pipeline = ContourPipeline::new(
            Arc::new(SmoothContourGenerator::new(table.clone(), config.smooth.clone())),
            Arc::new(SimpleContourGenerator::new(table.clone(), config.simple)),
            event_bus.clone(),
            config.contour_debounce,
        );
        let storm_service = Arc::new(StormService::new(
            Arc::new(StormRegistry::new()),
            pipeline,
            event_bus.clone(),
            config.grouping,
            config.use_smooth_contours,
        ));
        let knock_sync = Arc::new(KnockSyncService::new(
            event_bus.clone(),
            config.differential_updates_enabled,
        ));

        Self {
            storm_service,
            knock_sync,
            event_bus,
            severity_table: Arc::new(table),
            request_timeout: config.request_timeout,
        }
    }

    /// The contour pipeline owned by the storm service.
    #[must_use]
    pub fn pipeline(&self) -> &ContourPipeline {
        self.storm_service.pipeline()
    }
}
