use crate::domain::scheduler::grouper::beamforming::AntennaPattern;
use crate::domain::scheduler::phy::phy_mode::PhyMode;
use crate::domain::scheduler::request::DsaResult;
use crate::domain::scheduler::scheduling_map::scheduled_compound::ScheduledCompound;
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::units::Power;
use crate::ensure_invariant;
use crate::error::Result;

/// Slack used when comparing durations against the remaining slot time.
pub const TIME_EPSILON: f64 = 1e-12;

/// A single (subchannel, time slot, spatial layer) cell of the scheduling map.
///
/// A cell is either empty or owned by exactly one (user, connection) pair for the current round.
#[derive(Debug, Clone)]
pub struct PhysicalResourceBlock {
    pub resource: DsaResult,

    slot_length: f64,

    owner: Option<(UserId, ConnectionId)>,

    pub phy_mode: Option<PhyMode>,

    pub tx_power: Power,

    pub pattern: Option<AntennaPattern>,

    compounds: Vec<ScheduledCompound>,

    /// Offset inside the slot where the next compound starts.
    next_position: f64,

    /// Locked cells are not available for this round (e.g. reserved by another scheduler).
    locked: bool,
}

impl PhysicalResourceBlock {
    pub fn new(resource: DsaResult, slot_length: f64) -> Self {
        PhysicalResourceBlock {
            resource,
            slot_length,
            owner: None,
            phy_mode: None,
            tx_power: Power::zero(),
            pattern: None,
            compounds: Vec::new(),
            next_position: 0.0,
            locked: false,
        }
    }

    pub fn get_free_time(&self) -> f64 {
        if self.locked {
            return 0.0;
        }
        (self.slot_length - self.next_position).max(0.0)
    }

    pub fn get_used_time(&self) -> f64 {
        self.next_position
    }

    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn get_owner(&self) -> Option<&(UserId, ConnectionId)> {
        self.owner.as_ref()
    }

    pub fn get_user(&self) -> Option<&UserId> {
        self.owner.as_ref().map(|(user, _)| user)
    }

    pub fn get_compounds(&self) -> &[ScheduledCompound] {
        &self.compounds
    }

    pub fn get_scheduled_bits(&self) -> u64 {
        self.compounds.iter().map(|compound| compound.pdu.bits as u64).sum()
    }

    /// Whether `cid` of `user` may still append a compound of `duration` seconds.
    pub fn can_carry(&self, user: &UserId, cid: &ConnectionId, phy_mode: Option<&PhyMode>, duration: f64) -> bool {
        if self.locked {
            return false;
        }

        if let Some((owner_user, owner_cid)) = &self.owner {
            if owner_user != user || owner_cid != cid {
                return false;
            }
        }

        if let (Some(current), Some(requested)) = (&self.phy_mode, phy_mode) {
            if current != requested && !self.is_empty() {
                return false;
            }
        }

        duration <= self.get_free_time() + TIME_EPSILON
    }

    /// Whether the cell is free or already owned by `cid` of `user`.
    pub fn is_usable_for(&self, user: &UserId, cid: &ConnectionId) -> bool {
        if self.locked {
            return false;
        }

        match &self.owner {
            None => true,
            Some((owner_user, owner_cid)) => owner_user == user && owner_cid == cid && self.get_free_time() > TIME_EPSILON,
        }
    }

    /// Appends `compound` at the current end of the cell.
    pub fn add_compound(&mut self, mut compound: ScheduledCompound, duration: f64) -> Result<ScheduledCompound> {
        ensure_invariant!(!self.locked, "Resource {:?} is locked and cannot carry data", self.resource);

        if let Some((owner_user, owner_cid)) = &self.owner {
            ensure_invariant!(
                *owner_user == compound.user && *owner_cid == compound.cid,
                "Resource {:?} is owned by {}/{} and cannot carry data of {}/{}",
                self.resource,
                owner_user,
                owner_cid,
                compound.user,
                compound.cid
            );
        }

        ensure_invariant!(
            duration <= self.get_free_time() + TIME_EPSILON,
            "Compound of {:.3e}s does not fit the {:.3e}s left on resource {:?}",
            duration,
            self.get_free_time(),
            self.resource
        );

        let slot_start = self.resource.time_slot as f64 * self.slot_length;
        compound.start = slot_start + self.next_position;
        compound.end = compound.start + duration;
        compound.resource = self.resource;

        self.next_position = (self.next_position + duration).min(self.slot_length);
        self.owner = Some((compound.user.clone(), compound.cid.clone()));
        self.phy_mode = Some(compound.phy_mode);
        self.tx_power = compound.tx_power;

        if compound.pattern.is_some() {
            self.pattern = compound.pattern;
        }

        self.compounds.push(compound.clone());

        Ok(compound)
    }

    /// Scales the transmit power of the cell and of every compound on it.
    pub fn scale_power(&mut self, factor: f64) {
        self.tx_power = self.tx_power * factor;

        for compound in self.compounds.iter_mut() {
            compound.tx_power = compound.tx_power * factor;
        }
    }
}
