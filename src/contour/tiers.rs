//! Severity tiers: the hail-size thresholds that define contour bands.
//!
//! Tiers are cumulative. A report belongs to every tier whose threshold it
//! meets, so the area of a higher tier is always contained in the area of
//! the tiers below it.

use serde::{Deserialize, Serialize};

use super::geometry::ContourProperties;
use crate::domain::HailReport;

/// One severity band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityTier {
    /// Ordinal level (0 = lowest).
    pub level: u8,
    /// Minimum hail size in inches.
    pub threshold_in: f64,
    /// Human-readable label.
    pub label: String,
    /// Display color (`#rrggbb`).
    pub color: String,
}

impl SeverityTier {
    fn new(level: u8, threshold_in: f64, label: &str, color: &str) -> Self {
        Self {
            level,
            threshold_in,
            label: label.to_string(),
            color: color.to_string(),
        }
    }

    /// Returns `true` if a report of this size counts toward the tier.
    #[must_use]
    pub fn admits(&self, size_in: f64) -> bool {
        size_in >= self.threshold_in
    }

    /// Feature properties for polygons of this tier.
    #[must_use]
    pub fn properties(&self) -> ContourProperties {
        ContourProperties {
            level: self.level,
            label: self.label.clone(),
            color: self.color.clone(),
            threshold_in: self.threshold_in,
        }
    }

    /// Reports of this tier and every higher tier, in input order.
    #[must_use]
    pub fn qualifying<'a>(&self, reports: &'a [HailReport]) -> Vec<&'a HailReport> {
        reports.iter().filter(|r| self.admits(r.size_in())).collect()
    }
}

/// Validation failure for a custom tier table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TierTableError {
    /// No tiers were given.
    #[error("severity table is empty")]
    Empty,
    /// A threshold is negative or not finite.
    #[error("tier {0} has an invalid threshold")]
    InvalidThreshold(u8),
    /// Thresholds are not strictly ascending.
    #[error("tier {0} threshold is not above the previous tier")]
    NotAscending(u8),
    /// Two tiers share a level.
    #[error("duplicate tier level {0}")]
    DuplicateLevel(u8),
    /// The JSON could not be parsed.
    #[error("invalid severity table JSON: {0}")]
    Json(String),
}

/// Ordered table of severity tiers, lowest threshold first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SeverityTable {
    tiers: Vec<SeverityTier>,
}

impl SeverityTable {
    /// Builds a table, sorting by threshold and validating it.
    ///
    /// # Errors
    ///
    /// Returns [`TierTableError`] if the table is empty, a threshold is
    /// invalid, thresholds repeat, or levels repeat.
    pub fn new(mut tiers: Vec<SeverityTier>) -> Result<Self, TierTableError> {
        if tiers.is_empty() {
            return Err(TierTableError::Empty);
        }
        if let Some(bad) = tiers
            .iter()
            .find(|t| !t.threshold_in.is_finite() || t.threshold_in < 0.0)
        {
            return Err(TierTableError::InvalidThreshold(bad.level));
        }
        tiers.sort_by(|a, b| a.threshold_in.total_cmp(&b.threshold_in));
        for pair in tiers.windows(2) {
            if let [lower, upper] = pair
                && upper.threshold_in <= lower.threshold_in
            {
                return Err(TierTableError::NotAscending(upper.level));
            }
        }
        let mut levels: Vec<u8> = tiers.iter().map(|t| t.level).collect();
        levels.sort_unstable();
        if let Some(dup) = levels.windows(2).find_map(|w| match w {
            [a, b] if a == b => Some(*a),
            _ => None,
        }) {
            return Err(TierTableError::DuplicateLevel(dup));
        }
        Ok(Self { tiers })
    }

    /// Parses a JSON array of tiers.
    ///
    /// # Errors
    ///
    /// Returns [`TierTableError::Json`] on malformed JSON, or any
    /// validation error from [`Self::new`].
    pub fn from_json(json: &str) -> Result<Self, TierTableError> {
        let tiers: Vec<SeverityTier> =
            serde_json::from_str(json).map_err(|e| TierTableError::Json(e.to_string()))?;
        Self::new(tiers)
    }

    /// Tiers in ascending threshold order.
    #[must_use]
    pub fn tiers(&self) -> &[SeverityTier] {
        &self.tiers
    }

    /// Highest tier a report of this size reaches, if any.
    #[must_use]
    pub fn tier_for(&self, size_in: f64) -> Option<&SeverityTier> {
        self.tiers.iter().rev().find(|t| t.admits(size_in))
    }
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                SeverityTier::new(0, 0.0, "Small hail", "#4caf50"),
                SeverityTier::new(1, 1.0, "1\" (quarter)", "#ffeb3b"),
                SeverityTier::new(2, 1.5, "1.5\" (ping pong)", "#ff9800"),
                SeverityTier::new(3, 2.0, "2\" (hen egg)", "#f44336"),
                SeverityTier::new(4, 2.75, "2.75\" (baseball)", "#9c27b0"),
            ],
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn default_table_is_valid_and_ascending() {
        let table = SeverityTable::default();
        let Ok(rebuilt) = SeverityTable::new(table.tiers().to_vec()) else {
            panic!("default table must validate");
        };
        assert_eq!(rebuilt, table);
        assert_eq!(table.tiers().len(), 5);
    }

    #[test]
    fn tier_for_picks_highest_admitting_tier() {
        let table = SeverityTable::default();
        assert_eq!(table.tier_for(0.5).map(|t| t.level), Some(0));
        assert_eq!(table.tier_for(1.0).map(|t| t.level), Some(1));
        assert_eq!(table.tier_for(1.74).map(|t| t.level), Some(2));
        assert_eq!(table.tier_for(3.0).map(|t| t.level), Some(4));
    }

    #[test]
    fn qualifying_is_cumulative() {
        let now = Utc::now();
        let reports = vec![
            HailReport::new(35.0, -97.0, 0.75, now),
            HailReport::new(35.0, -97.0, 1.25, now),
            HailReport::new(35.0, -97.0, 2.5, now),
        ];
        let table = SeverityTable::default();
        let counts: Vec<usize> = table
            .tiers()
            .iter()
            .map(|t| t.qualifying(&reports).len())
            .collect();
        assert_eq!(counts, vec![3, 2, 1, 1, 0]);
    }

    #[test]
    fn rejects_bad_tables() {
        assert_eq!(SeverityTable::new(vec![]), Err(TierTableError::Empty));
        let dup_threshold = vec![
            SeverityTier::new(0, 1.0, "a", "#000000"),
            SeverityTier::new(1, 1.0, "b", "#000000"),
        ];
        assert_eq!(
            SeverityTable::new(dup_threshold),
            Err(TierTableError::NotAscending(1))
        );
        let dup_level = vec![
            SeverityTier::new(0, 1.0, "a", "#000000"),
            SeverityTier::new(0, 2.0, "b", "#000000"),
        ];
        assert_eq!(
            SeverityTable::new(dup_level),
            Err(TierTableError::DuplicateLevel(0))
        );
        let negative = vec![SeverityTier::new(3, -1.0, "a", "#000000")];
        assert_eq!(
            SeverityTable::new(negative),
            Err(TierTableError::InvalidThreshold(3))
        );
    }

    #[test]
    fn parses_json_and_sorts() {
        let json = r##"[
            {"level": 1, "threshold_in": 2.0, "label": "big", "color": "#ff0000"},
            {"level": 0, "threshold_in": 1.0, "label": "small", "color": "#00ff00"}
        ]"##;
        let Ok(table) = SeverityTable::from_json(json) else {
            panic!("valid json");
        };
        let levels: Vec<u8> = table.tiers().iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![0, 1]);
        assert!(matches!(
            SeverityTable::from_json("nope"),
            Err(TierTableError::Json(_))
        ));
    }
}
