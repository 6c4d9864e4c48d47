//! Knock synchronization: full or differential updates to the map surface.

use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::{EventBus, KnockDelta, KnockEntity, MapMessage, compute_delta};

/// What [`KnockSyncService::publish`] sent.
#[derive(Debug, Clone, PartialEq)]
pub enum KnockPublication {
    /// Full replacement with this many knocks.
    Full(usize),
    /// Incremental changes.
    Differential(KnockDelta),
    /// Nothing changed; no message sent.
    Unchanged,
}

/// Tracks the last published knock snapshot.
///
/// Differential mode is fixed at construction.
#[derive(Debug)]
pub struct KnockSyncService {
    event_bus: EventBus,
    differential: bool,
    last: Mutex<Option<Vec<KnockEntity>>>,
}

impl KnockSyncService {
    /// Creates a service with no published snapshot.
    #[must_use]
    pub fn new(event_bus: EventBus, differential: bool) -> Self {
        Self {
            event_bus,
            differential,
            last: Mutex::new(None),
        }
    }

    /// Whether deltas are sent instead of full replacements.
    #[must_use]
    pub const fn differential_enabled(&self) -> bool {
        self.differential
    }

    /// Publishes `current` as the new knock set.
    ///
    /// The first snapshot, and every snapshot when differential mode is
    /// off, is sent in full. Otherwise only a non-empty delta is sent.
    pub async fn publish(&self, current: Vec<KnockEntity>) -> KnockPublication {
        let mut last = self.last.lock().await;
        let publication = match last.as_deref() {
            Some(previous) if self.differential => {
                let delta = compute_delta(previous, &current);
                if delta.has_changes {
                    tracing::debug!(changes = delta.change_count(), "knock delta published");
                    let _ = self.event_bus.publish(MapMessage::UpdateKnocksDifferential {
                        delta: delta.clone(),
                        timestamp: Utc::now(),
                    });
                    KnockPublication::Differential(delta)
                } else {
                    KnockPublication::Unchanged
                }
            }
            _ => {
                tracing::debug!(knocks = current.len(), "full knock set published");
                let _ = self.event_bus.publish(MapMessage::UpdateKnocks {
                    knocks: current.clone(),
                    timestamp: Utc::now(),
                });
                KnockPublication::Full(current.len())
            }
        };
        *last = Some(current);
        publication
    }

    /// Last published knock set, for newly connected surfaces.
    pub async fn snapshot(&self) -> Vec<KnockEntity> {
        self.last.lock().await.clone().unwrap_or_default()
    }
}
