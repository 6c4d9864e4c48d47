//! # hailmap-gateway
//!
//! Hail contour pipeline and knock synchronization for field canvassing
//! maps.
//!
//! Storm events group hail reports. The enabled reports are turned into
//! tiered severity polygons (GeoJSON) by a smooth density-contour
//! generator, with a buffered-hull generator as the always-succeeding
//! fallback. Knock markers are pushed to map surfaces as full sets or
//! minimal deltas.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket map surfaces)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── StormService / KnockSyncService (service/)
//!     ├── ContourPipeline (service/)  debounce, failover, freshness
//!     ├── EventBus (domain/)
//!     │
//!     ├── StormRegistry (domain/)
//!     └── Smooth / Simple generators (contour/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod contour;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
