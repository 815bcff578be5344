mod common;

use std::collections::BTreeSet;
use std::rc::Rc;

use common::{add_connection, cid, put_voice, user};
use radio_resource_scheduler::domain::scheduler::apc::apc_type::ApcStrategyType;
use radio_resource_scheduler::domain::scheduler::channel_quality::PowerCapabilities;
use radio_resource_scheduler::domain::scheduler::interfaces::harq::{HarqRetransmission, HarqRetransmissionQueue};
use radio_resource_scheduler::domain::scheduler::interfaces::queue::QueueInterface;
use radio_resource_scheduler::domain::scheduler::interfaces::simple_queue::SimpleQueue;
use radio_resource_scheduler::domain::scheduler::interfaces::static_registry::StaticRegistry;
use radio_resource_scheduler::domain::scheduler::pdu::{Pdu, PduKind};
use radio_resource_scheduler::domain::scheduler::persistent::persistent_voip::{PersistentVoIP, PersistentVoipConfig};
use radio_resource_scheduler::domain::scheduler::persistent::transmission_block::TransmissionBlock;
use radio_resource_scheduler::domain::scheduler::request::StrategyInput;
use radio_resource_scheduler::domain::scheduler::scheduling_map::scheduled_compound::ScheduledCompound;
use radio_resource_scheduler::domain::scheduler::strategy::strategy_trait::{SchedulingEnvironment, Strategy, StrategyResult};
use radio_resource_scheduler::domain::scheduler::utils::units::Power;

/// 256 bits fit into one resource block at QAM64 (3000 bits per block).
const VOICE_BITS: u32 = 256;

/// Two of these no longer fit into one resource block.
const LARGE_BITS: u32 = 2000;

struct Cell {
    strategy: PersistentVoIP,
    input: StrategyInput,
    registry: StaticRegistry,
    queue: SimpleQueue,
}

impl Cell {
    fn new(number_of_frames: usize, blocks_per_frame: usize, number_of_pdcch_resources: usize, connections: &[&str]) -> Self {
        Self::with_registry(number_of_frames, blocks_per_frame, number_of_pdcch_resources, common::registry(1), connections)
    }

    fn with_registry(
        number_of_frames: usize,
        blocks_per_frame: usize,
        number_of_pdcch_resources: usize,
        mut registry: StaticRegistry,
        connections: &[&str],
    ) -> Self {
        let config = PersistentVoipConfig { number_of_frames, number_of_pdcch_resources, voice_priority: 0 };
        let strategy = PersistentVoIP::new(config, blocks_per_frame, ApcStrategyType::UseMaxTxPower.get_instance()).unwrap();

        let mut queue = SimpleQueue::new();
        for name in connections {
            add_connection(&mut registry, &mut queue, name, &format!("U{}", name), 0);
        }

        Cell { strategy, input: StrategyInput::new(blocks_per_frame, 1, common::SLOT_LENGTH), registry, queue }
    }

    fn run_round(&mut self, round: u64) -> StrategyResult {
        let mut env = SchedulingEnvironment::new(&mut self.queue, &self.registry, round, round as f64);
        self.strategy.do_start_scheduling(&self.input, &mut env, &mut |_: &ScheduledCompound| {}).expect("round succeeds")
    }
}

#[test]
fn test_voice_connections_become_persistent() {
    // Setup
    let mut cell = Cell::new(5, 10, 4, &["C1", "C2", "C3"]);

    // Execution: round 0, every connection is new
    for name in ["C1", "C2", "C3"] {
        put_voice(&mut cell.queue, name, VOICE_BITS);
    }
    let round_0 = cell.run_round(0);

    // Verification
    assert_eq!(round_0.statistics.dynamic_grants, 3);
    assert_eq!(round_0.statistics.new_persistent_grants, 0);
    assert_eq!(round_0.statistics.scheduled_bits, 3 * VOICE_BITS as u64);
    assert_eq!(cell.strategy.get_resource_grid().get_number_of_persistent_reservations(), 0);

    // Execution: round 1, active again and promoted
    for name in ["C1", "C2", "C3"] {
        put_voice(&mut cell.queue, name, VOICE_BITS);
    }
    let round_1 = cell.run_round(1);

    // Verification
    assert_eq!(round_1.statistics.new_persistent_grants, 3);
    assert_eq!(round_1.statistics.dynamic_grants, 0);
    assert_eq!(round_1.statistics.pdcch_used, 3);
    assert_eq!(round_1.bursts.len(), 3);

    let frame_1 = cell.strategy.get_resource_grid().get_frame(1).unwrap();
    assert_eq!(frame_1.get_owner(0), Some(&cid("C1")));
    assert_eq!(frame_1.get_owner(1), Some(&cid("C2")));
    assert_eq!(frame_1.get_owner(2), Some(&cid("C3")));

    // Execution: round 2, C2 falls silent, the others wait for frame 1
    put_voice(&mut cell.queue, "C1", VOICE_BITS);
    put_voice(&mut cell.queue, "C3", VOICE_BITS);
    let round_2 = cell.run_round(2);

    // Verification
    assert!(cell.strategy.get_last_classification().silenced.contains(&cid("C2")));
    assert!(cell.strategy.get_last_classification().persistent.contains(&cid("C1")));
    assert_eq!(round_2.statistics.scheduled_bits, 0, "persistent data waits for its own frame");
    assert_eq!(
        cell.strategy.get_resource_grid().get_frame(1).unwrap().get_owner(1),
        Some(&cid("C2")),
        "a silenced connection keeps its reservation"
    );

    // Execution: C2 closes, frame 1 comes round again in round 6
    cell.strategy.teardown(&cid("C2"));
    for round in 3..6 {
        cell.run_round(round);
    }
    let round_6 = cell.run_round(6);

    // Verification
    assert_eq!(cell.strategy.get_resource_grid().get_frame(1).unwrap().get_owner(1), None);
    assert!(!cell.strategy.get_resource_grid().has_persistent_reservation(&cid("C2")));
    assert_eq!(round_6.statistics.persistent_grants, 2);
    assert_eq!(round_6.statistics.pdcch_used, 0, "persistent grants are not signaled again");
    assert_eq!(round_6.statistics.scheduled_bits, 2 * VOICE_BITS as u64);
    assert!(cell.queue.get_active_connections().is_empty());
}

#[test]
fn test_silenced_reservation_is_not_given_to_another_connection() {
    // Setup: C1 to C3 persistent on blocks 0 to 2 of frame 1
    let mut cell = Cell::new(2, 4, 4, &["C1", "C2", "C3", "C4"]);
    for round in 0..2 {
        for name in ["C1", "C2", "C3"] {
            put_voice(&mut cell.queue, name, VOICE_BITS);
        }
        cell.run_round(round);
    }

    // Execution: C2 falls silent while C4 starts talking
    put_voice(&mut cell.queue, "C1", VOICE_BITS);
    put_voice(&mut cell.queue, "C3", VOICE_BITS);
    put_voice(&mut cell.queue, "C4", VOICE_BITS);
    cell.run_round(2);
    assert!(cell.strategy.get_last_classification().silenced.contains(&cid("C2")));

    // Execution: frame 1 again, C4 is promoted and needs a block there
    put_voice(&mut cell.queue, "C4", VOICE_BITS);
    let round_3 = cell.run_round(3);

    // Verification
    let grid = cell.strategy.get_resource_grid();
    let reservation = grid.get_persistent_reservation(&cid("C4")).copied().unwrap();
    assert_eq!(reservation.frame, 1);
    assert_eq!(reservation.block, TransmissionBlock::new(3, 1), "the silenced block 1 stays with C2");
    assert_eq!(grid.get_frame(1).unwrap().get_owner(1), Some(&cid("C2")));
    assert_eq!(round_3.statistics.new_persistent_grants, 1);
    assert_eq!(round_3.statistics.persistent_grants, 2);
    assert_eq!(round_3.statistics.scheduled_bits, 3 * VOICE_BITS as u64);
}

#[test]
fn test_returning_talker_is_served_on_its_kept_reservation() {
    // Setup: C1 persistent on block 0 of frame 1
    let mut cell = Cell::new(2, 4, 4, &["C1"]);
    for round in 0..2 {
        put_voice(&mut cell.queue, "C1", VOICE_BITS);
        cell.run_round(round);
    }
    assert_eq!(cell.strategy.get_resource_grid().get_persistent_reservation(&cid("C1")).unwrap().frame, 1);

    // Execution: silent in round 2, speaks again when frame 1 comes round
    cell.run_round(2);
    assert!(cell.strategy.get_last_classification().silenced.contains(&cid("C1")));

    put_voice(&mut cell.queue, "C1", VOICE_BITS);
    let round_3 = cell.run_round(3);

    // Verification
    assert!(cell.strategy.get_last_classification().unpersistent.contains(&cid("C1")));
    assert_eq!(round_3.statistics.scheduled_bits, VOICE_BITS as u64);
    assert_eq!(round_3.statistics.persistent_grants, 1);
    assert_eq!(round_3.statistics.dynamic_grants, 0);
    assert_eq!(round_3.statistics.deferred_connections, 0);
    assert_eq!(round_3.statistics.pdcch_used, 0, "the kept reservation needs no new grant");
    assert_eq!(round_3.bursts.len(), 1);
    assert_eq!(round_3.bursts[0].resource.sub_channel, 0);
    assert_eq!(cell.queue.get_queued_bits(&cid("C1")), 0);
}

#[test]
fn test_callback_reports_power_after_scaling() {
    // Setup: 1000 mW per subchannel but only 2000 mW for the whole slot
    let station = PowerCapabilities::new(Power::from_mw(1000.0), Power::from_mw(1000.0), Power::from_mw(2000.0));
    let registry = StaticRegistry::new(station, common::phy_table(), 1);
    let mut cell = Cell::with_registry(5, 10, 4, registry, &["C1", "C2", "C3"]);
    for name in ["C1", "C2", "C3"] {
        put_voice(&mut cell.queue, name, VOICE_BITS);
    }

    // Execution
    let mut reported: Vec<(usize, f64)> = Vec::new();
    let result = {
        let mut env = SchedulingEnvironment::new(&mut cell.queue, &cell.registry, 0, 0.0);
        cell.strategy
            .do_start_scheduling(&cell.input, &mut env, &mut |compound: &ScheduledCompound| {
                reported.push((compound.resource.sub_channel, compound.tx_power.get_mw()))
            })
            .unwrap()
    };

    // Verification
    assert_eq!(reported.len(), 3);
    assert_eq!(result.bursts.len(), 3);

    let reported_sum: f64 = reported.iter().map(|(_, mw)| mw).sum();
    let burst_sum: f64 = result.bursts.iter().map(|burst| burst.tx_power.get_mw()).sum();
    assert!((reported_sum - 2000.0).abs() < 1e-6, "callback sum {} mW", reported_sum);
    assert!((reported_sum - burst_sum).abs() < 1e-6);

    for (sub_channel, mw) in reported {
        let burst = result.bursts.iter().find(|burst| burst.resource.sub_channel == sub_channel).unwrap();
        assert!((burst.tx_power.get_mw() - mw).abs() < 1e-6);
    }
}

#[test]
fn test_pdcch_exhaustion_defers_dynamic_grants() {
    // Setup
    let mut cell = Cell::new(5, 10, 2, &["C1", "C2", "C3", "C4"]);
    for name in ["C1", "C2", "C3", "C4"] {
        put_voice(&mut cell.queue, name, VOICE_BITS);
    }

    // Execution
    let result = cell.run_round(0);

    // Verification
    assert_eq!(result.statistics.dynamic_grants, 2);
    assert_eq!(result.statistics.deferred_connections, 2);
    assert_eq!(result.statistics.pdcch_used, 2);
    let waiting: BTreeSet<_> = [cid("C3"), cid("C4")].into_iter().collect();
    assert_eq!(cell.queue.get_active_connections(), waiting);
}

#[test]
fn test_full_frame_relocates_in_time() {
    // Setup: one resource block per frame
    let mut cell = Cell::new(3, 1, 4, &["C1", "C2"]);
    put_voice(&mut cell.queue, "C1", VOICE_BITS);
    put_voice(&mut cell.queue, "C2", VOICE_BITS);

    // Execution: round 0 only has room for C1
    let round_0 = cell.run_round(0);

    // Verification
    assert_eq!(round_0.statistics.dynamic_grants, 1);
    assert_eq!(round_0.statistics.deferred_connections, 1);

    // Execution: round 1, both promoted but frame 1 holds one reservation
    put_voice(&mut cell.queue, "C1", VOICE_BITS);
    let round_1 = cell.run_round(1);

    // Verification: frame 0 still carries the stale grant of round 0, frame 2 is free
    assert_eq!(round_1.statistics.new_persistent_grants, 1);
    assert_eq!(round_1.statistics.time_relocations, 1);
    let reservation = cell.strategy.get_resource_grid().get_persistent_reservation(&cid("C2")).copied().unwrap();
    assert_eq!(reservation.frame, 2);
    assert_eq!(cell.queue.get_queued_bits(&cid("C2")), VOICE_BITS as u64);

    // Execution: round 2 opens frame 2
    let round_2 = cell.run_round(2);

    // Verification
    assert_eq!(round_2.statistics.persistent_grants, 1);
    assert_eq!(round_2.statistics.scheduled_bits, VOICE_BITS as u64);
    assert_eq!(cell.queue.get_queued_bits(&cid("C2")), 0);
}

#[test]
fn test_fragmented_frame_is_compacted() {
    // Setup: a single frame of four blocks, C1 to C3 persistent on blocks 0 to 2
    let mut cell = Cell::new(1, 4, 4, &["C1", "C2", "C3", "C4"]);
    for round in 0..2 {
        for name in ["C1", "C2", "C3"] {
            put_voice(&mut cell.queue, name, VOICE_BITS);
        }
        cell.run_round(round);
    }
    assert_eq!(cell.strategy.get_resource_grid().get_number_of_persistent_reservations(), 3);

    // Execution: C2 leaves a hole at block 1, C4 shows up and grows to two blocks
    cell.strategy.teardown(&cid("C2"));
    cell.queue.reset_queue(&cid("C2"));

    put_voice(&mut cell.queue, "C4", LARGE_BITS);
    let round_2 = cell.run_round(2);
    assert_eq!(round_2.statistics.dynamic_grants, 1);

    put_voice(&mut cell.queue, "C4", LARGE_BITS);
    put_voice(&mut cell.queue, "C4", LARGE_BITS);
    let round_3 = cell.run_round(3);

    // Verification: C3 moved from block 2 to block 1, C4 took blocks 2 and 3
    let grid = cell.strategy.get_resource_grid();
    assert_eq!(round_3.statistics.frequency_relocations, 1);
    assert_eq!(round_3.statistics.new_persistent_grants, 1);
    assert_eq!(round_3.statistics.pdcch_used, 2, "one move and one new reservation");
    assert_eq!(grid.get_persistent_reservation(&cid("C3")).unwrap().block, TransmissionBlock::new(1, 1));
    assert_eq!(grid.get_persistent_reservation(&cid("C4")).unwrap().block, TransmissionBlock::new(2, 2));
    assert_eq!(round_3.statistics.scheduled_bits, 2 * LARGE_BITS as u64);
}

#[test]
fn test_outgrown_reservation_is_placed_again() {
    // Setup: C1 persistent in frame 1 with a single block
    let mut cell = Cell::new(2, 4, 4, &["C1"]);
    for round in 0..2 {
        put_voice(&mut cell.queue, "C1", VOICE_BITS);
        cell.run_round(round);
    }
    assert_eq!(cell.strategy.get_resource_grid().get_persistent_reservation(&cid("C1")).unwrap().block, TransmissionBlock::new(0, 1));

    // Execution: the queue grows past one block before frame 1 comes round again
    put_voice(&mut cell.queue, "C1", VOICE_BITS);
    cell.run_round(2);
    put_voice(&mut cell.queue, "C1", LARGE_BITS);
    put_voice(&mut cell.queue, "C1", LARGE_BITS);
    let round_3 = cell.run_round(3);

    // Verification
    let reservation = cell.strategy.get_resource_grid().get_persistent_reservation(&cid("C1")).copied().unwrap();
    assert_eq!(reservation.frame, 1);
    assert_eq!(reservation.block, TransmissionBlock::new(0, 2));
    assert_eq!(round_3.statistics.new_persistent_grants, 1);
    assert_eq!(round_3.statistics.scheduled_bits, (VOICE_BITS + 2 * LARGE_BITS) as u64);
}

#[test]
fn test_harq_retransmission_before_dynamic_traffic() {
    // Setup
    let mut cell = Cell::new(1, 2, 4, &["C1", "C2"]);
    put_voice(&mut cell.queue, "C1", VOICE_BITS);

    let mut harq = HarqRetransmissionQueue::new();
    harq.push(HarqRetransmission {
        process: 3,
        user: user("UC2"),
        cid: cid("C2"),
        pdu: Rc::new(Pdu::new(99, cid("C2"), 500, PduKind::HarqRetransmission { process: 3 }, 0.0)),
    });

    // Execution
    let result = {
        let mut env = SchedulingEnvironment::new(&mut cell.queue, &cell.registry, 0, 0.0).with_harq(&mut harq);
        cell.strategy.do_start_scheduling(&cell.input, &mut env, &mut |_: &ScheduledCompound| {}).unwrap()
    };

    // Verification
    assert_eq!(result.statistics.harq_grants, 1);
    assert_eq!(result.statistics.dynamic_grants, 1);
    assert_eq!(result.statistics.pdcch_used, 2);
    assert!(harq.is_empty(), "scheduled retransmissions leave the HARQ queue");

    let frame = cell.strategy.get_resource_grid().get_frame(0).unwrap();
    assert_eq!(frame.get_owner(0), Some(&cid("C2")));
    assert_eq!(frame.get_owner(1), Some(&cid("C1")));
}

#[test]
fn test_subchannel_count_must_match_frame_size() {
    // Setup
    let mut cell = Cell::new(2, 4, 4, &["C1"]);
    cell.input = StrategyInput::new(6, 1, common::SLOT_LENGTH);
    put_voice(&mut cell.queue, "C1", VOICE_BITS);

    // Execution
    let mut env = SchedulingEnvironment::new(&mut cell.queue, &cell.registry, 0, 0.0);
    let result = cell.strategy.do_start_scheduling(&cell.input, &mut env, &mut |_: &ScheduledCompound| {});

    // Verification
    let error = result.unwrap_err();
    assert!(!error.is_invariant_violation());
    assert!(error.to_string().contains("subchannels"));
}
