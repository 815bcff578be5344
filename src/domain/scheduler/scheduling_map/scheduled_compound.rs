use crate::domain::scheduler::channel_quality::CandI;
use crate::domain::scheduler::grouper::beamforming::AntennaPattern;
use crate::domain::scheduler::pdu::SharedPdu;
use crate::domain::scheduler::phy::phy_mode::PhyMode;
use crate::domain::scheduler::request::DsaResult;
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::units::Power;

/// One data unit placed on a resource unit of the scheduling map.
///
/// `start` and `end` are relative to the start of the frame.
#[derive(Debug, Clone)]
pub struct ScheduledCompound {
    pub start: f64,
    pub end: f64,
    pub user: UserId,
    pub cid: ConnectionId,
    pub pdu: SharedPdu,
    pub resource: DsaResult,
    pub phy_mode: PhyMode,
    pub tx_power: Power,
    pub pattern: Option<AntennaPattern>,
    pub estimated_cand_i: Option<CandI>,
}

impl ScheduledCompound {
    pub fn get_duration(&self) -> f64 {
        self.end - self.start
    }
}
