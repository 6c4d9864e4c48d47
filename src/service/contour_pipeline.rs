//! Contour pipeline: debounced, last-input-wins contour generation.
//!
//! [`ContourPipeline::submit`] takes the enabled report snapshot and the
//! smooth-contour preference. Non-empty input is scheduled after the
//! debounce window; a newer submission aborts the scheduled run and bumps
//! the epoch, so a run that is already generating finishes but has its
//! result discarded. Empty input clears the overlay immediately.
//!
//! ```text
//! Idle ──submit──▶ Scheduled ──debounce──▶ Generating ──▶ Emitted
//!                     ▲                        │      └──▶ Failed
//!                     └────────submit──────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::{JoinError, JoinHandle};

use crate::contour::{ContourFeatureCollection, ContourGenerator};
use crate::domain::{EventBus, HailReport, MapMessage, partition_valid};
use crate::error::ContourError;

/// Strategy name reported when the overlay was cleared without generation.
pub const EMPTY_STRATEGY: &str = "none";

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    /// Nothing submitted yet.
    Idle,
    /// A run is waiting out the debounce window.
    Scheduled,
    /// A run is producing geometry.
    Generating,
    /// The latest run emitted a collection.
    Emitted,
    /// The latest run failed with every applicable strategy.
    Failed,
}

impl PipelinePhase {
    /// Phase as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scheduled => "scheduled",
            Self::Generating => "generating",
            Self::Emitted => "emitted",
            Self::Failed => "failed",
        }
    }
}

/// Point-in-time view of the pipeline for status endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStatus {
    /// Current phase.
    pub phase: PipelinePhase,
    /// Whether a generation run is in progress.
    pub generating: bool,
    /// Strategy of the last emitted collection.
    pub last_strategy: Option<&'static str>,
    /// Feature count of the last emitted collection.
    pub feature_count: usize,
    /// When the last collection was emitted.
    pub updated_at: Option<DateTime<Utc>>,
    /// Reports dropped as malformed from the latest submission.
    pub rejected_reports: usize,
}

#[derive(Debug)]
struct PipelineState {
    epoch: u64,
    phase: PipelinePhase,
    pending: Option<JoinHandle<()>>,
    running_epoch: Option<u64>,
    current: Arc<ContourFeatureCollection>,
    last_strategy: Option<&'static str>,
    updated_at: Option<DateTime<Utc>>,
    rejected_reports: usize,
}

#[derive(Debug)]
struct Inner {
    primary: Arc<dyn ContourGenerator>,
    fallback: Arc<dyn ContourGenerator>,
    event_bus: EventBus,
    debounce: Duration,
    state: Mutex<PipelineState>,
}

/// Owner of the current contour collection and the generating flag.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct ContourPipeline {
    inner: Arc<Inner>,
}

impl ContourPipeline {
    /// Creates a pipeline emitting to `event_bus`.
    #[must_use]
    pub fn new(
        primary: Arc<dyn ContourGenerator>,
        fallback: Arc<dyn ContourGenerator>,
        event_bus: EventBus,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                primary,
                fallback,
                event_bus,
                debounce,
                state: Mutex::new(PipelineState {
                    epoch: 0,
                    phase: PipelinePhase::Idle,
                    pending: None,
                    running_epoch: None,
                    current: Arc::new(ContourFeatureCollection::empty()),
                    last_strategy: None,
                    updated_at: None,
                    rejected_reports: 0,
                }),
            }),
        }
    }

    /// Submits a new report snapshot, superseding any earlier submission.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, reports: Vec<HailReport>, use_smooth: bool) {
        let (valid, malformed) = partition_valid(&reports);
        if !malformed.is_empty() {
            tracing::warn!(
                dropped = malformed.len(),
                first = %malformed.first().map(ToString::to_string).unwrap_or_default(),
                "malformed reports filtered before contour generation"
            );
        }

        let mut state = self.lock();
        state.epoch += 1;
        state.rejected_reports = malformed.len();
        let epoch = state.epoch;
        if let Some(pending) = state.pending.take() {
            pending.abort();
            tracing::debug!(epoch, "superseded scheduled contour run");
        }

        if valid.is_empty() {
            let contours = ContourFeatureCollection::empty();
            state.running_epoch = None;
            Self::apply(&mut state, contours.clone(), EMPTY_STRATEGY);
            drop(state);
            tracing::info!(epoch, "no enabled reports, contours cleared");
            let _ = self.inner.event_bus.publish(MapMessage::UpdateHailContours {
                contours,
                strategy: EMPTY_STRATEGY.to_string(),
                timestamp: Utc::now(),
            });
            return;
        }

        state.phase = PipelinePhase::Scheduled;
        let pipeline = self.clone();
        state.pending = Some(tokio::spawn(async move {
            pipeline.run(epoch, valid, use_smooth).await;
        }));
    }

    /// Returns `true` while a generation run is in progress.
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.lock().running_epoch.is_some()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> PipelinePhase {
        self.lock().phase
    }

    /// Returns the last emitted collection (empty before the first run).
    #[must_use]
    pub fn current(&self) -> Arc<ContourFeatureCollection> {
        Arc::clone(&self.lock().current)
    }

    /// Returns the strategy that produced the last emitted collection.
    #[must_use]
    pub fn last_strategy(&self) -> Option<&'static str> {
        self.lock().last_strategy
    }

    /// Returns a status snapshot.
    #[must_use]
    pub fn status(&self) -> PipelineStatus {
        let state = self.lock();
        PipelineStatus {
            phase: state.phase,
            generating: state.running_epoch.is_some(),
            last_strategy: state.last_strategy,
            feature_count: state.current.len(),
            updated_at: state.updated_at,
            rejected_reports: state.rejected_reports,
        }
    }

    async fn run(&self, epoch: u64, reports: Vec<HailReport>, use_smooth: bool) {
        tokio::time::sleep(self.inner.debounce).await;
        {
            let mut state = self.lock();
            if state.epoch != epoch {
                return;
            }
            // Past this point the run is no longer abortable, only discardable.
            state.pending = None;
            state.phase = PipelinePhase::Generating;
            state.running_epoch = Some(epoch);
        }
        tracing::debug!(epoch, reports = reports.len(), use_smooth, "contour generation started");

        let outcome = self.generate_with_failover(epoch, reports, use_smooth).await;

        let mut state = self.lock();
        if state.running_epoch == Some(epoch) {
            state.running_epoch = None;
        }
        if state.epoch != epoch {
            tracing::debug!(epoch, latest = state.epoch, "discarding stale contour result");
            return;
        }
        let Some((contours, strategy)) = outcome else {
            state.phase = PipelinePhase::Failed;
            return;
        };
        Self::apply(&mut state, contours.clone(), strategy);
        drop(state);

        tracing::info!(epoch, strategy, features = contours.len(), "contours emitted");
        let _ = self.inner.event_bus.publish(MapMessage::UpdateHailContours {
            contours,
            strategy: strategy.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Runs the primary strategy (when enabled) and falls back on any
    /// failure of it, panics included.
    ///
    /// Returns `None` when every applicable strategy failed.
    async fn generate_with_failover(
        &self,
        epoch: u64,
        reports: Vec<HailReport>,
        use_smooth: bool,
    ) -> Option<(ContourFeatureCollection, &'static str)> {
        let reports: Arc<[HailReport]> = reports.into();
        if use_smooth {
            let primary = &self.inner.primary;
            match attempt(Arc::clone(primary), Arc::clone(&reports)).await {
                Ok(contours) => return Some((contours, primary.name())),
                Err(e) => {
                    tracing::warn!(epoch, strategy = primary.name(), error = %e, "primary contour generation failed, falling back");
                }
            }
        }
        let fallback = &self.inner.fallback;
        match attempt(Arc::clone(fallback), reports).await {
            Ok(contours) => Some((contours, fallback.name())),
            Err(e) => {
                tracing::error!(epoch, strategy = fallback.name(), error = %e, "fallback contour generation failed");
                None
            }
        }
    }

    fn apply(state: &mut PipelineState, contours: ContourFeatureCollection, strategy: &'static str) {
        state.current = Arc::new(contours);
        state.last_strategy = Some(strategy);
        state.updated_at = Some(Utc::now());
        state.phase = PipelinePhase::Emitted;
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Why a single strategy attempt produced nothing.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error(transparent)]
    Contour(#[from] ContourError),

    #[error("generator task failed: {0}")]
    Task(#[from] JoinError),
}

/// Runs one strategy on the blocking pool. A panic inside the generator
/// comes back as [`AttemptError::Task`].
async fn attempt(
    generator: Arc<dyn ContourGenerator>,
    reports: Arc<[HailReport]>,
) -> Result<ContourFeatureCollection, AttemptError> {
    Ok(tokio::task::spawn_blocking(move || generator.generate(&reports)).await??)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::contour::ContourFeature;
    use crate::contour::geometry::{GeometryType, PolygonGeometry};
    use crate::contour::{ContourProperties, SeverityTable, SimpleContourGenerator, SimpleParams};
    use crate::error::{FallbackFailure, GenerationError};
    use std::sync::mpsc;
    use tokio::sync::Notify;
    use tokio::sync::broadcast::Receiver;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    /// Records input sizes and returns one triangle per report.
    #[derive(Debug)]
    struct Recording {
        name: &'static str,
        fail: bool,
        calls: Mutex<Vec<usize>>,
        gate: Mutex<Option<mpsc::Receiver<()>>>,
        entered: Arc<Notify>,
    }

    impl Recording {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail,
                calls: Mutex::new(Vec::new()),
                gate: Mutex::new(None),
                entered: Arc::new(Notify::new()),
            })
        }

        fn gated(name: &'static str) -> (Arc<Self>, mpsc::Sender<()>) {
            let (tx, rx) = mpsc::channel();
            let generator = Self::new(name, false);
            if let Ok(mut gate) = generator.gate.lock() {
                *gate = Some(rx);
            }
            (generator, tx)
        }

        fn calls(&self) -> Vec<usize> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    impl ContourGenerator for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn generate(&self, reports: &[HailReport]) -> Result<ContourFeatureCollection, ContourError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(reports.len());
            }
            let gate = self.gate.lock().ok().and_then(|mut g| g.take());
            if let Some(gate) = gate {
                self.entered.notify_one();
                let _ = gate.recv_timeout(Duration::from_secs(5));
            }
            if self.fail {
                return Err(if self.name == "smooth" {
                    ContourError::Generation(GenerationError::Degenerate)
                } else {
                    ContourError::Fallback(FallbackFailure::EmptyInput)
                });
            }
            Ok(ContourFeatureCollection::new(
                reports.iter().map(|_| triangle()).collect(),
            ))
        }
    }

    /// Primary strategy that panics on every call.
    #[derive(Debug)]
    struct Exploding;

    impl ContourGenerator for Exploding {
        fn name(&self) -> &'static str {
            "smooth"
        }

        fn generate(&self, _: &[HailReport]) -> Result<ContourFeatureCollection, ContourError> {
            panic!("interpolation blew up");
        }
    }

    fn triangle() -> ContourFeature {
        ContourFeature::new(
            ContourProperties {
                level: 0,
                label: "test".to_string(),
                color: "#000000".to_string(),
                threshold_in: 0.0,
            },
            PolygonGeometry {
                kind: GeometryType::Polygon,
                coordinates: vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]],
            },
        )
    }

    fn reports(n: usize) -> Vec<HailReport> {
        (0..n)
            .map(|i| HailReport::new(35.0 + i as f64 * 0.01, -97.0 + i as f64 * 0.007, 1.5, Utc::now()))
            .collect()
    }

    fn pipeline(primary: Arc<Recording>, fallback: Arc<Recording>) -> (ContourPipeline, Receiver<MapMessage>) {
        let bus = EventBus::new(64);
        let rx = bus.subscribe();
        (ContourPipeline::new(primary, fallback, bus, DEBOUNCE), rx)
    }

    async fn next_contours(rx: &mut Receiver<MapMessage>) -> (ContourFeatureCollection, String) {
        let Ok(Ok(msg)) = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await else {
            panic!("expected a contour message");
        };
        let MapMessage::UpdateHailContours { contours, strategy, .. } = msg else {
            panic!("unexpected message: {msg:?}");
        };
        (contours, strategy)
    }

    async fn assert_silent(rx: &mut Receiver<MapMessage>) {
        let result = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(result.is_err(), "unexpected message: {result:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_coalesces_to_latest_input() {
        let primary = Recording::new("smooth", false);
        let fallback = Recording::new("simple", false);
        let (pipeline, mut rx) = pipeline(Arc::clone(&primary), Arc::clone(&fallback));

        pipeline.submit(reports(1), true);
        pipeline.submit(reports(2), true);
        pipeline.submit(reports(3), true);
        assert_eq!(pipeline.phase(), PipelinePhase::Scheduled);

        let (contours, strategy) = next_contours(&mut rx).await;
        assert_eq!(contours.len(), 3);
        assert_eq!(strategy, "smooth");
        assert_eq!(primary.calls(), vec![3]);
        assert!(fallback.calls().is_empty());
        assert_silent(&mut rx).await;
        assert_eq!(pipeline.phase(), PipelinePhase::Emitted);
        assert_eq!(pipeline.current().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_clears_immediately_without_generators() {
        let primary = Recording::new("smooth", false);
        let fallback = Recording::new("simple", false);
        let (pipeline, mut rx) = pipeline(Arc::clone(&primary), Arc::clone(&fallback));

        pipeline.submit(reports(4), true);
        pipeline.submit(Vec::new(), true);

        let Ok(MapMessage::UpdateHailContours { contours, strategy, .. }) = rx.try_recv() else {
            panic!("empty collection must be emitted synchronously");
        };
        assert!(contours.is_empty());
        assert_eq!(strategy, EMPTY_STRATEGY);
        assert!(!pipeline.is_generating());

        assert_silent(&mut rx).await;
        assert!(primary.calls().is_empty());
        assert!(fallback.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn primary_failure_falls_back() {
        let primary = Recording::new("smooth", true);
        let fallback = Recording::new("simple", false);
        let (pipeline, mut rx) = pipeline(Arc::clone(&primary), Arc::clone(&fallback));

        pipeline.submit(reports(2), true);
        let (contours, strategy) = next_contours(&mut rx).await;
        assert_eq!(strategy, "simple");
        assert_eq!(contours.len(), 2);
        assert_eq!(primary.calls(), vec![2]);
        assert_eq!(fallback.calls(), vec![2]);
        assert_eq!(pipeline.last_strategy(), Some("simple"));
    }

    #[tokio::test(start_paused = true)]
    async fn primary_panic_falls_back() {
        let fallback = Recording::new("simple", false);
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let shared = Arc::clone(&fallback);
        let pipeline = ContourPipeline::new(Arc::new(Exploding), shared, bus, DEBOUNCE);

        pipeline.submit(reports(2), true);
        let (contours, strategy) = next_contours(&mut rx).await;
        assert_eq!(strategy, "simple");
        assert_eq!(contours.len(), 2);
        assert_eq!(fallback.calls(), vec![2]);
        assert_eq!(pipeline.phase(), PipelinePhase::Emitted);
        assert!(!pipeline.is_generating());
    }

    #[tokio::test(start_paused = true)]
    async fn both_failing_emits_nothing_and_keeps_previous() {
        let primary = Recording::new("smooth", true);
        let fallback = Recording::new("simple", true);
        let (pipeline, mut rx) = pipeline(primary, fallback);

        pipeline.submit(reports(2), true);
        assert_silent(&mut rx).await;
        assert_eq!(pipeline.phase(), PipelinePhase::Failed);
        assert!(!pipeline.is_generating());
        assert!(pipeline.current().is_empty());
        assert_eq!(pipeline.last_strategy(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn smooth_disabled_uses_fallback_directly() {
        let primary = Recording::new("smooth", false);
        let fallback = Recording::new("simple", false);
        let (pipeline, mut rx) = pipeline(Arc::clone(&primary), Arc::clone(&fallback));

        pipeline.submit(reports(3), false);
        let (_, strategy) = next_contours(&mut rx).await;
        assert_eq!(strategy, "simple");
        assert!(primary.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_result_is_discarded() {
        let (primary, release) = Recording::gated("smooth");
        let fallback = Recording::new("simple", false);
        let entered = Arc::clone(&primary.entered);
        let (pipeline, mut rx) = pipeline(Arc::clone(&primary), fallback);

        pipeline.submit(reports(5), true);
        entered.notified().await;
        assert!(pipeline.is_generating());

        pipeline.submit(reports(3), true);
        let _ = release.send(());

        let (contours, _) = next_contours(&mut rx).await;
        assert_eq!(contours.len(), 3);
        assert_silent(&mut rx).await;
        assert_eq!(primary.calls(), vec![5, 3]);
        assert!(!pipeline.is_generating());
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_reports_are_filtered() {
        let primary = Recording::new("smooth", false);
        let fallback = Recording::new("simple", false);
        let (pipeline, mut rx) = pipeline(Arc::clone(&primary), fallback);

        let mut input = reports(2);
        input.push(HailReport::new(f64::NAN, -97.0, 1.0, Utc::now()));
        input.push(HailReport::new(35.0, -97.0, -1.0, Utc::now()));
        pipeline.submit(input, true);

        let _ = next_contours(&mut rx).await;
        assert_eq!(primary.calls(), vec![2]);
        assert_eq!(pipeline.status().rejected_reports, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn real_fallback_covers_two_clusters() {
        let (reports, centers) = crate::contour::test_support::two_cluster_reports();
        let primary = Recording::new("smooth", true);
        let fallback = Arc::new(SimpleContourGenerator::new(
            SeverityTable::default(),
            SimpleParams::default(),
        ));
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let pipeline = ContourPipeline::new(primary, fallback, bus, DEBOUNCE);

        pipeline.submit(reports, true);
        let (contours, strategy) = next_contours(&mut rx).await;
        assert_eq!(strategy, "simple");
        for center in centers {
            assert!(contours.covers(1, center));
        }
    }
}
