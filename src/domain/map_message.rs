//! Messages for the map rendering surface.
//!
//! The surface is a passive consumer: every message is a complete
//! instruction (replace the overlay, apply a delta, replace all knocks) and
//! delivery is fire-and-forget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{KnockDelta, KnockEntity, StormSummary};
use crate::contour::ContourFeatureCollection;

/// Topic a message belongs to, used for per-connection filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapChannel {
    /// Hail contour overlay.
    Contours,
    /// Knock markers.
    Knocks,
    /// Storm list changes.
    Storms,
}

impl std::str::FromStr for MapChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contours" => Ok(Self::Contours),
            "knocks" => Ok(Self::Knocks),
            "storms" => Ok(Self::Storms),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

/// A message to the map surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapMessage {
    /// Replace the hail overlay wholesale.
    UpdateHailContours {
        /// New overlay; empty clears it.
        contours: ContourFeatureCollection,
        /// Strategy that produced it (`"smooth"`, `"simple"`, or `"none"`).
        strategy: String,
        /// Emission time.
        timestamp: DateTime<Utc>,
    },

    /// Apply incremental knock changes.
    UpdateKnocksDifferential {
        /// Changes since the previous snapshot.
        delta: KnockDelta,
        /// Emission time.
        timestamp: DateTime<Utc>,
    },

    /// Replace all knock markers.
    UpdateKnocks {
        /// Full knock set.
        knocks: Vec<KnockEntity>,
        /// Emission time.
        timestamp: DateTime<Utc>,
    },

    /// The storm list changed (added, toggled, or deleted).
    StormsChanged {
        /// Current storms, newest first.
        storms: Vec<StormSummary>,
        /// Emission time.
        timestamp: DateTime<Utc>,
    },
}

impl MapMessage {
    /// Channel this message is published on.
    #[must_use]
    pub const fn channel(&self) -> MapChannel {
        match self {
            Self::UpdateHailContours { .. } => MapChannel::Contours,
            Self::UpdateKnocksDifferential { .. } | Self::UpdateKnocks { .. } => MapChannel::Knocks,
            Self::StormsChanged { .. } => MapChannel::Storms,
        }
    }

    /// Message type as a static string slice.
    #[must_use]
    pub const fn message_type_str(&self) -> &'static str {
        match self {
            Self::UpdateHailContours { .. } => "update_hail_contours",
            Self::UpdateKnocksDifferential { .. } => "update_knocks_differential",
            Self::UpdateKnocks { .. } => "update_knocks",
            Self::StormsChanged { .. } => "storms_changed",
        }
    }
}
