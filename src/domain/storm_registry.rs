//! Concurrent storm storage.
//!
//! [`StormRegistry`] is the Report Store: it owns every loaded
//! [`StormEvent`] and answers which reports are currently enabled. Readers
//! receive clones, so a snapshot handed to contour generation never
//! changes underneath it.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::storm_event::{StormEvent, StormSummary};
use super::{HailReport, StormId};
use crate::error::GatewayError;

/// Central store for all loaded storm events.
///
/// # Concurrency
///
/// - Multiple tasks may read concurrently.
/// - Writes (insert, toggle, remove) are serialized.
#[derive(Debug, Default)]
pub struct StormRegistry {
    storms: RwLock<HashMap<StormId, StormEvent>>,
}

impl StormRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a storm.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if a storm with the same
    /// ID already exists.
    pub async fn insert(&self, storm: StormEvent) -> Result<StormId, GatewayError> {
        let id = storm.id;
        let mut map = self.storms.write().await;
        if map.contains_key(&id) {
            return Err(GatewayError::InvalidRequest(format!(
                "storm {id} already exists"
            )));
        }
        map.insert(id, storm);
        Ok(id)
    }

    /// Returns a copy of the storm.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StormNotFound`] for unknown IDs.
    pub async fn get(&self, id: StormId) -> Result<StormEvent, GatewayError> {
        self.storms
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(GatewayError::StormNotFound(id))
    }

    /// Summaries of all storms, newest first.
    pub async fn active_storms(&self) -> Vec<StormSummary> {
        let map = self.storms.read().await;
        let mut summaries: Vec<StormSummary> = map.values().map(StormSummary::from).collect();
        summaries.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(a.name.cmp(&b.name)));
        summaries
    }

    /// Enables or disables a storm, returning its updated summary.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StormNotFound`] for unknown IDs.
    pub async fn toggle(&self, id: StormId, enabled: bool) -> Result<StormSummary, GatewayError> {
        let mut map = self.storms.write().await;
        let storm = map.get_mut(&id).ok_or(GatewayError::StormNotFound(id))?;
        storm.enabled = enabled;
        Ok(StormSummary::from(&*storm))
    }

    /// Removes a storm, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StormNotFound`] for unknown IDs.
    pub async fn remove(&self, id: StormId) -> Result<StormEvent, GatewayError> {
        self.storms
            .write()
            .await
            .remove(&id)
            .ok_or(GatewayError::StormNotFound(id))
    }

    /// Flattened reports of every enabled storm, oldest storm first.
    pub async fn enabled_reports(&self) -> Vec<HailReport> {
        let map = self.storms.read().await;
        let mut enabled: Vec<&StormEvent> = map.values().filter(|s| s.enabled).collect();
        enabled.sort_by_key(|s| (s.started_at, s.id));
        enabled
            .into_iter()
            .flat_map(|s| s.reports.iter().cloned())
            .collect()
    }

    /// Returns the number of storms in the registry.
    pub async fn len(&self) -> usize {
        self.storms.read().await.len()
    }

    /// Returns `true` if the registry contains no storms.
    pub async fn is_empty(&self) -> bool {
        self.storms.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_storm(name: &str, hours: i64, reports: usize) -> StormEvent {
        let Some(t0) = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single() else {
            panic!("valid timestamp");
        };
        let start = t0 + Duration::hours(hours);
        let reports = (0..reports)
            .map(|i| HailReport::new(35.0 + i as f64 * 0.01, -97.0, 1.0, start))
            .collect();
        let Some(storm) = StormEvent::from_reports(name, "test", reports) else {
            panic!("storm expected");
        };
        storm
    }

    #[tokio::test]
    async fn insert_and_get() {
        let registry = StormRegistry::new();
        let storm = make_storm("a", 0, 2);
        let id = storm.id;

        let Ok(inserted) = registry.insert(storm).await else {
            panic!("insert failed");
        };
        assert_eq!(inserted, id);

        let Ok(fetched) = registry.get(id).await else {
            panic!("storm should exist");
        };
        assert_eq!(fetched.name, "a");
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let registry = StormRegistry::new();
        let storm = make_storm("a", 0, 1);
        let _ = registry.insert(storm.clone()).await;
        assert!(registry.insert(storm).await.is_err());
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let registry = StormRegistry::new();
        let result = registry.get(StormId::new()).await;
        assert!(matches!(result, Err(GatewayError::StormNotFound(_))));
    }

    #[tokio::test]
    async fn active_storms_newest_first() {
        let registry = StormRegistry::new();
        let _ = registry.insert(make_storm("old", 0, 1)).await;
        let _ = registry.insert(make_storm("new", 48, 1)).await;
        let _ = registry.insert(make_storm("mid", 24, 1)).await;

        let names: Vec<String> = registry
            .active_storms()
            .await
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn toggle_filters_enabled_reports() {
        let registry = StormRegistry::new();
        let a = make_storm("a", 0, 2);
        let b = make_storm("b", 1, 3);
        let a_id = a.id;
        let _ = registry.insert(a).await;
        let _ = registry.insert(b).await;
        assert_eq!(registry.enabled_reports().await.len(), 5);

        let Ok(summary) = registry.toggle(a_id, false).await else {
            panic!("toggle failed");
        };
        assert!(!summary.enabled);
        assert_eq!(registry.enabled_reports().await.len(), 3);

        assert!(registry.toggle(StormId::new(), true).await.is_err());
    }

    #[tokio::test]
    async fn remove_returns_storm() {
        let registry = StormRegistry::new();
        let storm = make_storm("a", 0, 1);
        let id = storm.id;
        let _ = registry.insert(storm).await;

        assert!(registry.remove(id).await.is_ok());
        assert!(registry.get(id).await.is_err());
        assert!(registry.remove(id).await.is_err());
    }

    #[tokio::test]
    async fn len_and_is_empty() {
        let registry = StormRegistry::new();
        assert!(registry.is_empty().await);
        assert_eq!(registry.len().await, 0);

        let _ = registry.insert(make_storm("a", 0, 1)).await;
        assert!(!registry.is_empty().await);
        assert_eq!(registry.len().await, 1);
    }
}
