//! Knocks: recorded door-to-door visit outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::KnockId;

/// Coordinates closer than this (degrees, about 1 cm) are the same spot.
pub const COORDINATE_EPSILON_DEG: f64 = 1e-7;

/// Result of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnockOutcome {
    /// Nobody answered.
    NotHome,
    /// Homeowner declined.
    NotInterested,
    /// Homeowner wants a follow-up.
    Lead,
    /// Inspection booked.
    Appointment,
    /// Asked to come back later.
    Callback,
    /// Contract signed.
    Sale,
    /// Do not knock again.
    DoNotKnock,
}

/// A knock as the map surface sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnockEntity {
    /// Stable identifier from storage.
    pub id: KnockId,
    /// Visit outcome.
    pub outcome: KnockOutcome,
    /// Free-form rep notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Last modification time; informational, never compared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl KnockEntity {
    /// Creates a knock with no notes or address.
    #[must_use]
    pub fn new(id: impl Into<String>, outcome: KnockOutcome, lat: f64, lng: f64) -> Self {
        Self {
            id: KnockId::new(id),
            outcome,
            notes: None,
            address: None,
            lat,
            lng,
            updated_at: None,
        }
    }

    /// Compares the fields a map marker renders: outcome, notes, address
    /// and coordinates (within [`COORDINATE_EPSILON_DEG`]).
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.outcome == other.outcome
            && self.notes == other.notes
            && self.address == other.address
            && (self.lat - other.lat).abs() <= COORDINATE_EPSILON_DEG
            && (self.lng - other.lng).abs() <= COORDINATE_EPSILON_DEG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_noise_is_not_a_change() {
        let a = KnockEntity::new("1", KnockOutcome::Lead, 35.123_456_7, -97.1);
        let mut b = a.clone();
        b.lat += 1e-9;
        b.updated_at = Some(Utc::now());
        assert!(a.same_content(&b));
    }

    #[test]
    fn compared_fields_detect_changes() {
        let a = KnockEntity::new("1", KnockOutcome::Lead, 35.0, -97.0);
        let mut moved = a.clone();
        moved.lng += 0.0001;
        assert!(!a.same_content(&moved));

        let mut noted = a.clone();
        noted.notes = Some("dog in yard".to_string());
        assert!(!a.same_content(&noted));

        let mut readdressed = a.clone();
        readdressed.address = Some("12 Elm St".to_string());
        assert!(!a.same_content(&readdressed));

        let mut outcome = a.clone();
        outcome.outcome = KnockOutcome::Sale;
        assert!(!a.same_content(&outcome));
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&KnockOutcome::NotHome).unwrap_or_default();
        assert_eq!(json, "\"not_home\"");
    }
}
