//! Minimal add/update/remove transition between two knock snapshots.
//!
//! Snapshots are treated as sets keyed by id. Lookups go through hash maps,
//! so a diff is linear in the size of both snapshots.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{KnockEntity, KnockId};

/// Changes that turn a previous snapshot into the current one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KnockDelta {
    /// Knocks only in the current snapshot, in current order.
    pub added: Vec<KnockEntity>,
    /// Knocks in both whose compared fields differ, in current order.
    pub updated: Vec<KnockEntity>,
    /// Ids only in the previous snapshot, in previous order.
    pub removed: Vec<KnockId>,
    /// `true` iff any list is non-empty.
    pub has_changes: bool,
}

impl KnockDelta {
    /// Total number of changed entities.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}

/// Diffs two snapshots. When an id repeats within a snapshot, its first
/// occurrence is used.
#[must_use]
pub fn compute_delta(previous: &[KnockEntity], current: &[KnockEntity]) -> KnockDelta {
    let mut before: HashMap<&KnockId, &KnockEntity> = HashMap::with_capacity(previous.len());
    for knock in previous {
        before.entry(&knock.id).or_insert(knock);
    }

    let mut seen: HashSet<&KnockId> = HashSet::with_capacity(current.len());
    let mut added = Vec::new();
    let mut updated = Vec::new();
    for knock in current {
        if !seen.insert(&knock.id) {
            continue;
        }
        match before.get(&knock.id) {
            None => added.push(knock.clone()),
            Some(old) if !old.same_content(knock) => updated.push(knock.clone()),
            Some(_) => {}
        }
    }

    let mut removed_seen: HashSet<&KnockId> = HashSet::new();
    let removed: Vec<KnockId> = previous
        .iter()
        .map(|k| &k.id)
        .filter(|id| !seen.contains(*id) && removed_seen.insert(*id))
        .cloned()
        .collect();

    let has_changes = !(added.is_empty() && updated.is_empty() && removed.is_empty());
    KnockDelta {
        added,
        updated,
        removed,
        has_changes,
    }
}
