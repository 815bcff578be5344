mod common;

use common::cid;
use radio_resource_scheduler::domain::scheduler::persistent::resource_grid::ResourceGrid;
use radio_resource_scheduler::domain::scheduler::persistent::transmission_block::TransmissionBlock;

#[test]
fn test_free_runs_around_reservations() {
    // Setup
    let mut grid = ResourceGrid::new(5, 10).unwrap();
    grid.on_new_frame(0).unwrap();

    grid.reserve(0, &cid("C1"), TransmissionBlock::new(0, 5), true).unwrap();
    grid.reserve(0, &cid("C2"), TransmissionBlock::new(7, 3), false).unwrap();

    // Execution
    let runs = grid.find_transmission_blocks(0).unwrap();

    // Verification
    assert_eq!(runs.into_iter().collect::<Vec<_>>(), vec![TransmissionBlock::new(5, 2)], "only blocks 5 and 6 should be free");
    assert_eq!(grid.get_load(0), 8);
    assert_eq!(grid.find_transmission_blocks(1).unwrap().len(), 1, "an untouched frame is one single free run");
}

#[test]
fn test_overlapping_reservation_is_rejected() {
    let mut grid = ResourceGrid::new(5, 10).unwrap();
    grid.on_new_frame(0).unwrap();
    grid.reserve(1, &cid("C2"), TransmissionBlock::new(1, 1), true).unwrap();

    let conflict = grid.reserve(1, &cid("C4"), TransmissionBlock::new(0, 2), false);

    assert!(conflict.unwrap_err().is_invariant_violation());
    assert_eq!(grid.get_frame(1).unwrap().get_owner(1), Some(&cid("C2")), "the failed reservation must not touch the frame");
    assert_eq!(grid.get_frame(1).unwrap().get_owner(0), None);
}

#[test]
fn test_one_persistent_reservation_per_connection() {
    let mut grid = ResourceGrid::new(3, 4).unwrap();
    grid.reserve(0, &cid("C1"), TransmissionBlock::new(0, 1), true).unwrap();

    let second = grid.reserve(2, &cid("C1"), TransmissionBlock::new(0, 1), true);

    assert!(second.unwrap_err().is_invariant_violation());
    assert_eq!(grid.get_number_of_persistent_reservations(), 1);
    assert_eq!(grid.get_persistent_reservation(&cid("C1")).unwrap().frame, 0);
}

#[test]
fn test_frames_open_in_window_order() {
    let mut grid = ResourceGrid::new(3, 4).unwrap();

    grid.on_new_frame(1).unwrap();
    grid.on_new_frame(2).unwrap();
    grid.on_new_frame(0).unwrap();

    assert!(grid.on_new_frame(2).unwrap_err().is_invariant_violation(), "frame 1 is due after frame 0");
    assert!(grid.on_new_frame(3).unwrap_err().is_invariant_violation());
    assert_eq!(grid.frame_index_for_round(7), 1);
}

#[test]
fn test_new_frame_clears_only_unpersistent_reservations() {
    let mut grid = ResourceGrid::new(2, 4).unwrap();
    grid.on_new_frame(0).unwrap();
    grid.reserve(0, &cid("C1"), TransmissionBlock::new(0, 2), true).unwrap();
    grid.reserve(0, &cid("C2"), TransmissionBlock::new(2, 1), false).unwrap();
    grid.on_new_frame(1).unwrap();

    let cleared = grid.on_new_frame(0).unwrap();

    assert_eq!(cleared, vec![cid("C2")]);
    assert!(grid.get_frame(0).unwrap().has_reservation(&cid("C1")));
    assert_eq!(grid.get_load(0), 2);
}

#[test]
fn test_compaction_merges_free_blocks() {
    // Setup: free blocks 1 and 3 are too small for a reservation of two
    let mut grid = ResourceGrid::new(1, 4).unwrap();
    grid.reserve(0, &cid("C1"), TransmissionBlock::new(0, 1), true).unwrap();
    grid.reserve(0, &cid("C3"), TransmissionBlock::new(2, 1), true).unwrap();
    assert_eq!(grid.get_frame(0).unwrap().find_best_fit(2), None);

    // Execution
    let moves = grid.compact_frame(0).unwrap();

    // Verification
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].cid, cid("C3"));
    assert_eq!(moves[0].to, TransmissionBlock::new(1, 1));
    assert_eq!(grid.get_persistent_reservation(&cid("C3")).unwrap().block, TransmissionBlock::new(1, 1), "slot map follows the move");
    assert_eq!(grid.get_frame(0).unwrap().find_best_fit(2), Some(TransmissionBlock::new(2, 2)));
    grid.debug_check_coherence();
}

#[test]
fn test_relocation_to_least_loaded_frame() {
    let mut grid = ResourceGrid::new(3, 2).unwrap();
    grid.reserve(0, &cid("C1"), TransmissionBlock::new(0, 2), true).unwrap();
    grid.reserve(1, &cid("C2"), TransmissionBlock::new(0, 1), true).unwrap();

    assert_eq!(grid.least_loaded_frame(0, 1), Some(2));
    assert_eq!(grid.least_loaded_frame(2, 2), None, "frame 0 is full and frame 1 has a single free block");

    grid.relocate(&cid("C1"), 2, TransmissionBlock::new(0, 2)).unwrap();

    assert_eq!(grid.get_load(0), 0);
    assert_eq!(grid.get_persistent_connections(2).into_iter().collect::<Vec<_>>(), vec![cid("C1")]);
}

#[test]
fn test_failed_relocation_keeps_old_position() {
    let mut grid = ResourceGrid::new(2, 2).unwrap();
    grid.reserve(0, &cid("C1"), TransmissionBlock::new(0, 1), true).unwrap();
    grid.reserve(1, &cid("C2"), TransmissionBlock::new(0, 2), true).unwrap();

    let result = grid.relocate(&cid("C1"), 1, TransmissionBlock::new(1, 1));

    assert!(result.is_err());
    assert_eq!(grid.get_persistent_reservation(&cid("C1")).unwrap().frame, 0);
    assert_eq!(grid.get_frame(0).unwrap().get_owner(0), Some(&cid("C1")));
}

#[test]
fn test_teardown_releases_everything() {
    let mut grid = ResourceGrid::new(2, 4).unwrap();
    grid.reserve(0, &cid("C1"), TransmissionBlock::new(0, 1), true).unwrap();
    grid.reserve(1, &cid("C1"), TransmissionBlock::new(3, 1), false).unwrap();

    assert_eq!(grid.teardown(&cid("C1")), 2);
    assert!(!grid.has_persistent_reservation(&cid("C1")));
    assert_eq!(grid.get_load(0) + grid.get_load(1), 0);

    grid.reserve(0, &cid("C4"), TransmissionBlock::new(0, 1), true).unwrap();
}

#[test]
fn test_empty_grid_is_a_configuration_error() {
    assert!(ResourceGrid::new(0, 10).is_err());
    assert!(ResourceGrid::new(5, 0).is_err());
}
