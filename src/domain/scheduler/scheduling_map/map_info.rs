use crate::domain::scheduler::grouper::beamforming::AntennaPattern;
use crate::domain::scheduler::pdu::SharedPdu;
use crate::domain::scheduler::phy::phy_mode::PhyMode;
use crate::domain::scheduler::request::DsaResult;
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::units::Power;

/// A scheduled, time-bounded transmission of one user on one resource ("burst").
///
/// Created once per round by the strategy and not modified afterwards.
#[derive(Debug, Clone)]
pub struct MapInfoEntry {
    pub start: f64,
    pub end: f64,
    pub user: UserId,
    pub cid: ConnectionId,
    pub resource: DsaResult,
    pub phy_mode: PhyMode,
    pub tx_power: Power,
    pub pattern: Option<AntennaPattern>,
    pub compounds: Vec<SharedPdu>,
}

impl MapInfoEntry {
    pub fn get_bits(&self) -> u64 {
        self.compounds.iter().map(|pdu| pdu.bits as u64).sum()
    }
}

/// Bursts of one round, ordered by time slot, subchannel and spatial layer.
pub type MapInfoCollection = Vec<MapInfoEntry>;
