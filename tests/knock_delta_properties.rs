//! Property tests for the differential update calculator.

use std::collections::HashSet;

use proptest::prelude::*;

use hailmap_gateway::domain::{KnockEntity, KnockId, KnockOutcome, compute_delta};

fn outcome() -> impl Strategy<Value = KnockOutcome> {
    prop_oneof![
        Just(KnockOutcome::NotHome),
        Just(KnockOutcome::NotInterested),
        Just(KnockOutcome::Lead),
        Just(KnockOutcome::Appointment),
        Just(KnockOutcome::Callback),
        Just(KnockOutcome::Sale),
        Just(KnockOutcome::DoNotKnock),
    ]
}

fn knock() -> impl Strategy<Value = KnockEntity> {
    (
        0_u8..40,
        outcome(),
        proptest::option::of("[a-z]{0,6}"),
        34.0_f64..36.0,
        -98.0_f64..-96.0,
    )
        .prop_map(|(id, outcome, notes, lat, lng)| {
            let mut knock = KnockEntity::new(id.to_string(), outcome, lat, lng);
            knock.notes = notes;
            knock
        })
}

/// A snapshot with unique ids.
fn snapshot() -> impl Strategy<Value = Vec<KnockEntity>> {
    proptest::collection::vec(knock(), 0..30).prop_map(|knocks| {
        let mut seen = HashSet::new();
        knocks
            .into_iter()
            .filter(|k| seen.insert(k.id.clone()))
            .collect()
    })
}

fn ids(knocks: &[KnockEntity]) -> HashSet<KnockId> {
    knocks.iter().map(|k| k.id.clone()).collect()
}

proptest! {
    #[test]
    fn delta_is_idempotent(previous in snapshot(), current in snapshot()) {
        prop_assert_eq!(compute_delta(&previous, &current), compute_delta(&previous, &current));
    }

    #[test]
    fn identical_snapshots_have_no_changes(knocks in snapshot()) {
        let delta = compute_delta(&knocks, &knocks);
        prop_assert!(!delta.has_changes);
        prop_assert!(delta.added.is_empty());
        prop_assert!(delta.updated.is_empty());
        prop_assert!(delta.removed.is_empty());
    }

    #[test]
    fn every_id_is_classified_once(previous in snapshot(), current in snapshot()) {
        let delta = compute_delta(&previous, &current);
        let before = ids(&previous);
        let after = ids(&current);

        let added = ids(&delta.added);
        let updated = ids(&delta.updated);
        let removed: HashSet<KnockId> = delta.removed.iter().cloned().collect();

        prop_assert_eq!(&added, &after.difference(&before).cloned().collect::<HashSet<_>>());
        prop_assert_eq!(&removed, &before.difference(&after).cloned().collect::<HashSet<_>>());
        prop_assert!(updated.is_subset(&before) && updated.is_subset(&after));
        prop_assert!(added.is_disjoint(&updated));
        prop_assert_eq!(delta.added.len(), added.len());
        prop_assert_eq!(delta.removed.len(), removed.len());
        prop_assert_eq!(
            delta.has_changes,
            !(delta.added.is_empty() && delta.updated.is_empty() && delta.removed.is_empty())
        );
    }

    #[test]
    fn order_within_snapshots_does_not_change_classification(
        previous in snapshot(),
        current in snapshot(),
    ) {
        let delta = compute_delta(&previous, &current);
        let mut reversed_prev = previous.clone();
        reversed_prev.reverse();
        let mut reversed_cur = current.clone();
        reversed_cur.reverse();
        let other = compute_delta(&reversed_prev, &reversed_cur);

        prop_assert_eq!(ids(&delta.added), ids(&other.added));
        prop_assert_eq!(ids(&delta.updated), ids(&other.updated));
        prop_assert_eq!(
            delta.removed.iter().collect::<HashSet<_>>(),
            other.removed.iter().collect::<HashSet<_>>()
        );
    }

    #[test]
    fn updated_entries_really_changed(previous in snapshot(), current in snapshot()) {
        let delta = compute_delta(&previous, &current);
        for knock in &delta.updated {
            let Some(old) = previous.iter().find(|k| k.id == knock.id) else {
                return Err(TestCaseError::fail("updated id missing from previous"));
            };
            prop_assert!(!old.same_content(knock));
        }
    }
}
