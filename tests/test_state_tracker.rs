mod common;

use std::collections::BTreeSet;

use common::cid;
use radio_resource_scheduler::domain::scheduler::persistent::state_tracker::{ConnectionState, StateTracker};
use radio_resource_scheduler::domain::scheduler::utils::id::ConnectionId;

fn active(names: &[&str]) -> BTreeSet<ConnectionId> {
    names.iter().map(|name| cid(name)).collect()
}

#[test]
fn test_classification_over_five_rounds() {
    // Setup
    let mut tracker = StateTracker::new(5);
    let c1 = cid("C1");

    // Execution and verification, one round per frame
    let round_0 = tracker.update_state(&active(&["C1"]), 0);
    assert_eq!(round_0.get_state(&c1), Some(ConnectionState::Unpersistent), "first sighting");

    let round_1 = tracker.update_state(&active(&["C1"]), 1);
    assert_eq!(round_1.get_state(&c1), Some(ConnectionState::NewPersistent), "second consecutive round promotes");

    let round_2 = tracker.update_state(&active(&["C1"]), 2);
    assert_eq!(round_2.get_state(&c1), Some(ConnectionState::Persistent));

    let round_3 = tracker.update_state(&active(&[]), 3);
    assert_eq!(round_3.get_state(&c1), Some(ConnectionState::Silenced), "absent persistent connection");

    let round_4 = tracker.update_state(&active(&["C1"]), 4);
    assert_eq!(round_4.get_state(&c1), Some(ConnectionState::Unpersistent), "no immediate re-promotion");

    let round_5 = tracker.update_state(&active(&["C1"]), 0);
    assert_eq!(round_5.get_state(&c1), Some(ConnectionState::Reactivated));

    assert!(tracker.is_tracked(&c1));
}

#[test]
fn test_silenced_reported_once() {
    let mut tracker = StateTracker::new(4);
    tracker.update_state(&active(&["C1"]), 0);
    tracker.update_state(&active(&["C1"]), 1);

    let first_absence = tracker.update_state(&active(&[]), 2);
    let second_absence = tracker.update_state(&active(&[]), 3);

    assert_eq!(first_absence.silenced.len(), 1);
    assert!(second_absence.is_empty(), "silenced connections are only reported in the round they go quiet");
    assert_eq!(tracker.get_number_of_tracked_connections(), 1, "silence never removes the entry");
}

#[test]
fn test_classification_partitions_connections() {
    let mut tracker = StateTracker::new(3);
    tracker.update_state(&active(&["C1", "C2"]), 0);

    let classification = tracker.update_state(&active(&["C1", "C3"]), 1);

    assert_eq!(classification.len(), 2, "C2 was never persistent and is not reported when absent");
    assert!(classification.new_persistent.contains(&cid("C1")));
    assert!(classification.unpersistent.contains(&cid("C3")));
    assert_eq!(classification.get_state(&cid("C2")), None);
}

#[test]
fn test_updates_for_foreign_frames_are_ignored() {
    let mut tracker = StateTracker::new(5);
    tracker.update_state(&active(&["C1"]), 0);

    let ignored = tracker.update_state(&active(&["C1"]), 3);
    assert!(ignored.is_empty());
    assert_eq!(tracker.get_expected_frame(), Some(1));

    let classification = tracker.update_state(&active(&["C1"]), 1);
    assert_eq!(classification.get_state(&cid("C1")), Some(ConnectionState::NewPersistent), "the ignored call did not count as a round");
}

#[test]
fn test_gap_resets_promotion() {
    let mut tracker = StateTracker::new(2);
    tracker.update_state(&active(&["C1"]), 0);
    tracker.update_state(&active(&[]), 1);

    let classification = tracker.update_state(&active(&["C1"]), 0);

    assert_eq!(classification.get_state(&cid("C1")), Some(ConnectionState::Unpersistent));
}

#[test]
fn test_teardown_forgets_history() {
    let mut tracker = StateTracker::new(2);
    tracker.update_state(&active(&["C1"]), 0);
    tracker.update_state(&active(&["C1"]), 1);

    assert!(tracker.teardown(&cid("C1")));
    assert!(!tracker.teardown(&cid("C1")));

    let classification = tracker.update_state(&active(&["C1"]), 0);
    assert_eq!(classification.get_state(&cid("C1")), Some(ConnectionState::Unpersistent), "a torn down connection starts over");
}
