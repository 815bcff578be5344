#![allow(dead_code)]

use radio_resource_scheduler::domain::scheduler::channel_quality::PowerCapabilities;
use radio_resource_scheduler::domain::scheduler::interfaces::simple_queue::SimpleQueue;
use radio_resource_scheduler::domain::scheduler::interfaces::static_registry::{StaticRegistry, UserEntry};
use radio_resource_scheduler::domain::scheduler::pdu::PduKind;
use radio_resource_scheduler::domain::scheduler::phy::phy_mode::{Modulation, PhyMode};
use radio_resource_scheduler::domain::scheduler::phy::phy_mode_mapper::TablePhyModeMapper;
use radio_resource_scheduler::domain::scheduler::utils::id::{ConnectionId, UserId};
use radio_resource_scheduler::domain::scheduler::utils::units::{Power, Ratio};

/// One-second slots keep the arithmetic simple: a resource block carries `data rate` bits.
pub const SLOT_LENGTH: f64 = 1.0;

/// Interference plus noise of every test user.
pub const INTERFERENCE_DBM: f64 = -100.0;

/// 1000 symbols/s: QPSK 1/2 = 1000 bit/s, QAM16 1/2 = 2000 bit/s, QAM64 1/2 = 3000 bit/s.
pub fn phy_table() -> TablePhyModeMapper {
    TablePhyModeMapper::new(
        1000.0,
        vec![
            (PhyMode::new(Modulation::Qpsk, 0.5), Ratio::from_db(3.0)),
            (PhyMode::new(Modulation::Qam16, 0.5), Ratio::from_db(10.0)),
            (PhyMode::new(Modulation::Qam64, 0.5), Ratio::from_db(16.0)),
        ],
    )
    .expect("valid PHY mode table")
}

pub fn qam64() -> PhyMode {
    PhyMode::new(Modulation::Qam64, 0.5)
}

/// 30 dBm per subchannel, 40 dBm in total.
pub fn station_power() -> PowerCapabilities {
    PowerCapabilities::new(Power::from_dbm(30.0), Power::from_dbm(30.0), Power::from_dbm(40.0))
}

pub fn terminal_power() -> PowerCapabilities {
    PowerCapabilities::new(Power::from_dbm(23.0), Power::from_dbm(20.0), Power::from_dbm(23.0))
}

pub fn registry(number_of_priorities: usize) -> StaticRegistry {
    StaticRegistry::new(station_power(), phy_table(), number_of_priorities)
}

/// With the station at 30 dBm a pathloss of 100 dB gives a downlink SINR of 30 dB (QAM64).
pub fn user_entry(pathloss_db: f64, distance: f64, azimuth: f64) -> UserEntry {
    UserEntry::new(Ratio::from_db(pathloss_db), Power::from_dbm(INTERFERENCE_DBM), distance, azimuth, terminal_power())
}

pub fn cid(name: &str) -> ConnectionId {
    ConnectionId::new(name)
}

pub fn user(name: &str) -> UserId {
    UserId::new(name)
}

/// Adds `cid_name` at `priority` to registry and queue. Unknown users get a 30 dB downlink channel.
pub fn add_connection(registry: &mut StaticRegistry, queue: &mut SimpleQueue, cid_name: &str, user_name: &str, priority: usize) {
    if registry.get_user_entry_mut(&user(user_name)).is_none() {
        registry.add_user(user(user_name), user_entry(100.0, 100.0, 0.0));
    }

    registry.add_connection(cid(cid_name), user(user_name), priority).expect("connection registered");
    queue.register_connection(cid(cid_name), user(user_name));
}

pub fn put(queue: &mut SimpleQueue, cid_name: &str, bits: u32) {
    queue.put(&cid(cid_name), bits, PduKind::UserData, 0.0).expect("connection registered at the queue");
}

pub fn put_voice(queue: &mut SimpleQueue, cid_name: &str, bits: u32) {
    queue.put(&cid(cid_name), bits, PduKind::Voice, 0.0).expect("connection registered at the queue");
}
