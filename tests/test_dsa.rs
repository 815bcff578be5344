mod common;

use std::rc::Rc;

use common::{add_connection, cid, put, qam64, user, user_entry};
use radio_resource_scheduler::domain::scheduler::dsa::best_capacity::BestCapacity;
use radio_resource_scheduler::domain::scheduler::dsa::dsa_trait::DsaStrategy;
use radio_resource_scheduler::domain::scheduler::dsa::dsa_type::DsaStrategyType;
use radio_resource_scheduler::domain::scheduler::dsa::far_first::FarFirst;
use radio_resource_scheduler::domain::scheduler::dsa::linear_ffirst::LinearFFirst;
use radio_resource_scheduler::domain::scheduler::interfaces::simple_queue::SimpleQueue;
use radio_resource_scheduler::domain::scheduler::interfaces::static_registry::StaticRegistry;
use radio_resource_scheduler::domain::scheduler::pdu::{Pdu, PduKind};
use radio_resource_scheduler::domain::scheduler::request::{Direction, DsaResult, RequestForResource, SchedulerState, StrategyInput};
use radio_resource_scheduler::domain::scheduler::scheduling_map::SchedulingMap;
use radio_resource_scheduler::domain::scheduler::utils::units::Power;

/// Fills a whole subchannel with data of an unrelated user.
fn occupy(map: &mut SchedulingMap, sub_channel: usize) {
    let pdu = Rc::new(Pdu::new(999, cid("OTHER"), 3000, PduKind::UserData, 0.0));
    map.add_compound(&DsaResult::new(sub_channel, 0, 0), &user("OTHER"), pdu, qam64(), 3000.0, Power::from_dbm(30.0), None, None).unwrap();
}

/// U1 sees 15 dB on subchannel 0, 12 dB on subchannel 1 and 30 dB on subchannel 2 in the downlink.
fn frequency_selective_registry() -> StaticRegistry {
    let mut registry = common::registry(1);
    registry.add_user(
        user("U1"),
        user_entry(100.0, 100.0, 0.0)
            .with_sub_channel_interference(0, Power::from_dbm(-85.0))
            .with_sub_channel_interference(1, Power::from_dbm(-82.0)),
    );
    registry
}

#[test]
fn test_best_capacity_prefers_best_sub_channel() {
    // Setup
    let registry = frequency_selective_registry();
    let input = StrategyInput::new(3, 1, common::SLOT_LENGTH);
    let state = SchedulerState::new(input, &registry);
    let mut map = SchedulingMap::from_input(&input);
    let request = RequestForResource::new(user("U1"), cid("C1"), 0, 1000);
    let mut dsa = BestCapacity::new(false);

    // Execution and verification
    assert_eq!(dsa.get_sub_channel_with_dsa(&request, &state, &map), Some(DsaResult::new(2, 0, 0)), "QAM64 on subchannel 2");

    occupy(&mut map, 2);
    assert_eq!(
        dsa.get_sub_channel_with_dsa(&request, &state, &map),
        Some(DsaResult::new(0, 0, 0)),
        "subchannels 0 and 1 tie at QAM16, the lower index wins"
    );

    occupy(&mut map, 0);
    occupy(&mut map, 1);
    assert_eq!(dsa.get_sub_channel_with_dsa(&request, &state, &map), None, "a full map yields no resource");
}

#[test]
fn test_best_capacity_skips_resources_too_small() {
    let registry = frequency_selective_registry();
    let input = StrategyInput::new(3, 1, common::SLOT_LENGTH);
    let state = SchedulerState::new(input, &registry);
    let map = SchedulingMap::from_input(&input);
    let mut dsa = BestCapacity::new(false);

    // 2500 bits only fit the 3000 bit/s subchannel
    let request = RequestForResource::new(user("U1"), cid("C1"), 0, 2500);
    assert_eq!(dsa.get_sub_channel_with_dsa(&request, &state, &map), Some(DsaResult::new(2, 0, 0)));

    let request = RequestForResource::new(user("U1"), cid("C1"), 0, 3500);
    assert_eq!(dsa.get_sub_channel_with_dsa(&request, &state, &map), None);
}

#[test]
fn test_best_capacity_adjacent_uplink_search() {
    // Setup: in the uplink (20 dBm terminal) U1 sees 5 dB, 2 dB and 20 dB
    let registry = frequency_selective_registry();
    let input = StrategyInput::new(3, 1, common::SLOT_LENGTH).with_direction(Direction::Uplink);
    let state = SchedulerState::new(input, &registry);
    let mut map = SchedulingMap::from_input(&input);
    let request = RequestForResource::new(user("U1"), cid("C1"), 0, 1000);
    let mut dsa = BestCapacity::new(true);

    // Execution
    let first = dsa.get_sub_channel_with_dsa(&request, &state, &map);
    occupy(&mut map, 2);
    let second = dsa.get_sub_channel_with_dsa(&request, &state, &map);

    // Verification
    assert_eq!(first, Some(DsaResult::new(2, 0, 0)), "without history the free search decides");
    assert_eq!(second, Some(DsaResult::new(0, 0, 0)), "subchannel 1 cannot carry any PHY mode, the probe moves on");
}

#[test]
fn test_far_first_partitions_by_distance() {
    // Setup
    let mut registry = common::registry(1);
    let mut queue = SimpleQueue::new();

    registry.add_user(user("NEAR"), user_entry(100.0, 100.0, 0.0));
    registry.add_user(user("MID"), user_entry(100.0, 300.0, 0.0));
    registry.add_user(user("FAR"), user_entry(100.0, 500.0, 0.0));
    registry.add_user(user("IDLE"), user_entry(100.0, 900.0, 0.0));

    add_connection(&mut registry, &mut queue, "C_NEAR", "NEAR", 0);
    add_connection(&mut registry, &mut queue, "C_MID", "MID", 0);
    add_connection(&mut registry, &mut queue, "C_FAR", "FAR", 0);
    add_connection(&mut registry, &mut queue, "C_IDLE", "IDLE", 0);
    put(&mut queue, "C_NEAR", 100);
    put(&mut queue, "C_MID", 100);
    put(&mut queue, "C_FAR", 100);

    let input = StrategyInput::new(2, 1, common::SLOT_LENGTH).with_time_slots(2);
    let state = SchedulerState::new(input, &registry);
    let map = SchedulingMap::from_input(&input);
    let mut dsa = FarFirst::new();

    // Execution
    dsa.initialize(&state, &queue, &map);

    // Verification: 4 resources for 3 users, the farthest user takes the remainder
    assert_eq!(dsa.get_partition(&user("FAR")).unwrap(), &[DsaResult::new(0, 0, 0), DsaResult::new(0, 1, 0)]);
    assert_eq!(dsa.get_partition(&user("MID")).unwrap(), &[DsaResult::new(1, 0, 0)]);
    assert!(dsa.get_partition(&user("IDLE")).is_none(), "users without data get no partition");

    let request = RequestForResource::new(user("NEAR"), cid("C_NEAR"), 0, 100);
    assert_eq!(dsa.get_sub_channel_with_dsa(&request, &state, &map), Some(DsaResult::new(1, 1, 0)));

    let request = RequestForResource::new(user("IDLE"), cid("C_IDLE"), 0, 100);
    assert_eq!(dsa.get_sub_channel_with_dsa(&request, &state, &map), None);
}

#[test]
fn test_linear_first_fit() {
    let registry = frequency_selective_registry();
    let input = StrategyInput::new(3, 1, common::SLOT_LENGTH);
    let state = SchedulerState::new(input, &registry);
    let mut map = SchedulingMap::from_input(&input);
    let request = RequestForResource::new(user("U1"), cid("C1"), 0, 1000);
    let mut dsa = LinearFFirst::new();

    assert_eq!(dsa.get_sub_channel_with_dsa(&request, &state, &map), Some(DsaResult::new(0, 0, 0)));

    occupy(&mut map, 0);
    assert_eq!(dsa.get_sub_channel_with_dsa(&request, &state, &map), Some(DsaResult::new(1, 0, 0)));
}

#[test]
fn test_dsa_type_parsing() {
    assert_eq!("FarFirst".parse::<DsaStrategyType>().unwrap(), DsaStrategyType::FarFirst);
    assert_eq!("BestCapacity".parse::<DsaStrategyType>().unwrap().get_instance(false).get_name(), "BestCapacity");
    assert!("Random".parse::<DsaStrategyType>().is_err());
}
