//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Unset or unparsable numeric values
//! fall back to defaults; a malformed `LISTEN_ADDR` or
//! `SEVERITY_TIERS_JSON` stops startup.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use crate::contour::smooth::MAX_SMOOTHING_PASSES;
use crate::contour::{Kernel, SeverityTable, SimpleParams, SmoothParams, SurfaceParams};
use crate::domain::GroupingParams;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Upper bound on REST request handling time.
    pub request_timeout: Duration,

    /// Window in which contour submissions coalesce.
    pub contour_debounce: Duration,

    /// Initial smooth-contour preference.
    pub use_smooth_contours: bool,

    /// Send knock deltas instead of full replacements after the first load.
    pub differential_updates_enabled: bool,

    /// Severity tiers shared by both generators.
    pub severity_table: SeverityTable,

    /// Primary generator parameters.
    pub smooth: SmoothParams,

    /// Fallback generator parameters.
    pub simple: SimpleParams,

    /// Storm grouping limits for report ingestion.
    pub grouping: GroupingParams,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            event_bus_capacity: 10_000,
            request_timeout: Duration::from_secs(30),
            contour_debounce: Duration::from_millis(300),
            use_smooth_contours: true,
            differential_updates_enabled: true,
            severity_table: SeverityTable::default(),
            smooth: SmoothParams::default(),
            simple: SimpleParams::default(),
            grouping: GroupingParams::default(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as a
    /// [`SocketAddr`], or if `SEVERITY_TIERS_JSON` is set but is not a
    /// valid tier table.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid LISTEN_ADDR {raw:?}"))?,
            Err(_) => defaults.listen_addr,
        };

        let severity_table = match std::env::var("SEVERITY_TIERS_JSON") {
            Ok(raw) => SeverityTable::from_json(&raw).context("invalid SEVERITY_TIERS_JSON")?,
            Err(_) => defaults.severity_table,
        };

        let surface_defaults = defaults.smooth.surface;
        let smooth = SmoothParams {
            surface: SurfaceParams {
                influence_radius_km: parse_env_positive(
                    "CONTOUR_INFLUENCE_RADIUS_KM",
                    surface_defaults.influence_radius_km,
                ),
                cells_per_radius: parse_env("CONTOUR_CELLS_PER_RADIUS", surface_defaults.cells_per_radius)
                    .max(1),
                max_grid_dim: parse_env("CONTOUR_MAX_GRID_DIM", surface_defaults.max_grid_dim).max(8),
                kernel: parse_env::<Kernel>("CONTOUR_KERNEL", surface_defaults.kernel),
            },
            level: parse_env_positive("CONTOUR_LEVEL", defaults.smooth.level),
            smoothing_passes: parse_env("CONTOUR_SMOOTHING_PASSES", defaults.smooth.smoothing_passes)
                .min(MAX_SMOOTHING_PASSES),
            simplify_tolerance_km: parse_env(
                "CONTOUR_SIMPLIFY_TOLERANCE_KM",
                defaults.smooth.simplify_tolerance_km,
            )
            .max(0.0),
        };

        let simple = SimpleParams {
            buffer_km: parse_env_positive("FALLBACK_BUFFER_KM", defaults.simple.buffer_km),
            circle_segments: parse_env("FALLBACK_CIRCLE_SEGMENTS", defaults.simple.circle_segments),
        };

        let grouping = GroupingParams {
            max_gap: gap_from_minutes(
                parse_env("STORM_GROUP_MAX_GAP_MINUTES", defaults.grouping.max_gap.num_minutes()),
                defaults.grouping.max_gap,
            ),
            max_distance_km: parse_env("STORM_GROUP_MAX_DISTANCE_KM", defaults.grouping.max_distance_km),
        };

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            listen_addr,
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity).max(1),
            request_timeout: Duration::from_secs(
                parse_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout.as_secs()).max(1),
            ),
            contour_debounce: Duration::from_millis(parse_env(
                "CONTOUR_DEBOUNCE_MS",
                defaults.contour_debounce.as_millis() as u64,
            )),
            use_smooth_contours: parse_env_bool("USE_SMOOTH_CONTOURS", defaults.use_smooth_contours),
            differential_updates_enabled: parse_env_bool(
                "DIFFERENTIAL_UPDATES_ENABLED",
                defaults.differential_updates_enabled,
            ),
            severity_table,
            smooth,
            simple,
            grouping,
            log_format,
        })
    }
}

/// Storm grouping gap from a minute count, or `default` when negative or
/// out of range.
fn gap_from_minutes(minutes: i64, default: chrono::Duration) -> chrono::Duration {
    if minutes < 0 {
        return default;
    }
    chrono::Duration::try_minutes(minutes).unwrap_or(default)
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env`] but also rejects non-positive and non-finite values.
fn parse_env_positive(key: &str, default: f64) -> f64 {
    let value: f64 = parse_env(key, default);
    if value.is_finite() && value > 0.0 {
        value
    } else {
        default
    }
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.contour_debounce, Duration::from_millis(300));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.use_smooth_contours);
        assert!(config.differential_updates_enabled);
        assert_eq!(config.severity_table.tiers().len(), 5);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn missing_variables_use_defaults() {
        assert_eq!(parse_env("HAILMAP_TEST_UNSET_NUMBER", 42_u32), 42);
        assert!(parse_env_bool("HAILMAP_TEST_UNSET_BOOL", true));
        assert!((parse_env_positive("HAILMAP_TEST_UNSET_FLOAT", 6.0) - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn grouping_gap_rejects_out_of_range_minutes() {
        let default = chrono::Duration::minutes(90);
        assert_eq!(gap_from_minutes(45, default), chrono::Duration::minutes(45));
        assert_eq!(gap_from_minutes(-5, default), default);
        assert_eq!(gap_from_minutes(i64::MAX, default), default);
    }
}
