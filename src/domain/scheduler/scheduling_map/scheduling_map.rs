use std::collections::BTreeSet;

use crate::domain::scheduler::channel_quality::CandI;
use crate::domain::scheduler::grouper::beamforming::AntennaPattern;
use crate::domain::scheduler::pdu::SharedPdu;
use crate::domain::scheduler::phy::phy_mode::PhyMode;
use crate::domain::scheduler::request::{DsaResult, StrategyInput};
use crate::domain::scheduler::scheduling_map::map_info::{MapInfoCollection, MapInfoEntry};
use crate::domain::scheduler::scheduling_map::physical_resource_block::PhysicalResourceBlock;
use crate::domain::scheduler::scheduling_map::scheduled_compound::ScheduledCompound;
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::units::Power;
use crate::ensure_invariant;
use crate::error::{Error, Result};

/// The resource grid of one scheduling round: subchannels x time slots x spatial layers.
///
/// Resources are stored **frequency-major**: all time slots and layers of subchannel 0 come first,
/// then subchannel 1 and so on. `get_resources` iterates in the same order.
#[derive(Debug, Clone)]
pub struct SchedulingMap {
    num_sub_channels: usize,
    num_time_slots: usize,
    num_spatial_layers: usize,
    slot_length: f64,
    prbs: Vec<PhysicalResourceBlock>,

    /// (resource index, compound index on that resource) of every placed compound.
    placement_order: Vec<(usize, usize)>,
}

impl SchedulingMap {
    pub fn new(num_sub_channels: usize, num_time_slots: usize, num_spatial_layers: usize, slot_length: f64) -> Self {
        let mut prbs = Vec::with_capacity(num_sub_channels * num_time_slots * num_spatial_layers);

        for sub_channel in 0..num_sub_channels {
            for time_slot in 0..num_time_slots {
                for spatial_layer in 0..num_spatial_layers {
                    prbs.push(PhysicalResourceBlock::new(DsaResult::new(sub_channel, time_slot, spatial_layer), slot_length));
                }
            }
        }

        SchedulingMap { num_sub_channels, num_time_slots, num_spatial_layers, slot_length, prbs, placement_order: Vec::new() }
    }

    pub fn from_input(input: &StrategyInput) -> Self {
        SchedulingMap::new(input.num_sub_channels, input.num_time_slots, input.max_spatial_layers, input.slot_length)
    }

    pub fn get_num_sub_channels(&self) -> usize {
        self.num_sub_channels
    }

    pub fn get_num_time_slots(&self) -> usize {
        self.num_time_slots
    }

    pub fn get_num_spatial_layers(&self) -> usize {
        self.num_spatial_layers
    }

    pub fn get_slot_length(&self) -> f64 {
        self.slot_length
    }

    fn index(&self, resource: &DsaResult) -> Option<usize> {
        if resource.sub_channel >= self.num_sub_channels
            || resource.time_slot >= self.num_time_slots
            || resource.spatial_layer >= self.num_spatial_layers
        {
            return None;
        }

        Some((resource.sub_channel * self.num_time_slots + resource.time_slot) * self.num_spatial_layers + resource.spatial_layer)
    }

    pub fn get_prb(&self, resource: &DsaResult) -> Option<&PhysicalResourceBlock> {
        let index = self.index(resource)?;
        self.prbs.get(index)
    }

    pub fn get_prb_mut(&mut self, resource: &DsaResult) -> Option<&mut PhysicalResourceBlock> {
        let index = self.index(resource)?;
        self.prbs.get_mut(index)
    }

    pub fn get_prbs(&self) -> &[PhysicalResourceBlock] {
        &self.prbs
    }

    /// All resource units in frequency-major order.
    pub fn get_resources(&self) -> impl Iterator<Item = DsaResult> + '_ {
        self.prbs.iter().map(|prb| prb.resource)
    }

    /// Remaining time on `resource`, 0.0 for unknown resources.
    pub fn get_free_time(&self, resource: &DsaResult) -> f64 {
        self.get_prb(resource).map(|prb| prb.get_free_time()).unwrap_or(0.0)
    }

    pub fn is_usable_for(&self, resource: &DsaResult, user: &UserId, cid: &ConnectionId) -> bool {
        self.get_prb(resource).is_some_and(|prb| prb.is_usable_for(user, cid))
    }

    pub fn can_carry(&self, resource: &DsaResult, user: &UserId, cid: &ConnectionId, phy_mode: Option<&PhyMode>, duration: f64) -> bool {
        self.get_prb(resource).is_some_and(|prb| prb.can_carry(user, cid, phy_mode, duration))
    }

    /// Removes every resource unit of `sub_channel` from this round.
    pub fn lock_sub_channel(&mut self, sub_channel: usize) -> Result<()> {
        ensure_invariant!(
            sub_channel < self.num_sub_channels,
            "Cannot lock subchannel {} of a map with {} subchannels",
            sub_channel,
            self.num_sub_channels
        );

        for prb in self.prbs.iter_mut().filter(|prb| prb.resource.sub_channel == sub_channel) {
            prb.lock();
        }

        Ok(())
    }

    /// Places `pdu` at the end of `resource`. The unit occupies `bits / data_rate` seconds.
    #[allow(clippy::too_many_arguments)]
    pub fn add_compound(
        &mut self,
        resource: &DsaResult,
        user: &UserId,
        pdu: SharedPdu,
        phy_mode: PhyMode,
        data_rate: f64,
        tx_power: Power,
        pattern: Option<AntennaPattern>,
        estimated_cand_i: Option<CandI>,
    ) -> Result<ScheduledCompound> {
        ensure_invariant!(data_rate > 0.0, "Cannot place a compound with data rate {}", data_rate);

        let duration = pdu.bits as f64 / data_rate;

        let compound = ScheduledCompound {
            start: 0.0,
            end: 0.0,
            user: user.clone(),
            cid: pdu.cid.clone(),
            pdu,
            resource: *resource,
            phy_mode,
            tx_power,
            pattern,
            estimated_cand_i,
        };

        let index = self
            .index(resource)
            .ok_or_else(|| Error::InvariantViolation(format!("Resource {:?} is outside of the scheduling map", resource)))?;
        let prb = &mut self.prbs[index];

        let placed = prb.add_compound(compound, duration)?;
        let position = prb.get_compounds().len() - 1;
        self.placement_order.push((index, position));

        Ok(placed)
    }

    /// Compounds in the order they were placed, with the power they carry now.
    pub fn get_compounds_in_placement_order(&self) -> impl Iterator<Item = &ScheduledCompound> + '_ {
        self.placement_order
            .iter()
            .filter_map(move |(index, position)| self.prbs.get(*index).and_then(|prb| prb.get_compounds().get(*position)))
    }

    /// Hands every compound to `callback` once, in placement order. Called on the finished map so
    /// the callback sees the same power as the bursts.
    pub fn notify_compounds(&self, callback: &mut dyn FnMut(&ScheduledCompound)) {
        for compound in self.get_compounds_in_placement_order() {
            callback(compound);
        }
    }

    /// Resources of time slot `time_slot` that carry data.
    pub fn get_used_prbs_in_slot(&self, time_slot: usize) -> impl Iterator<Item = &PhysicalResourceBlock> + '_ {
        self.prbs.iter().filter(move |prb| prb.resource.time_slot == time_slot && !prb.is_empty())
    }

    pub fn get_used_prbs_in_slot_mut(&mut self, time_slot: usize) -> impl Iterator<Item = &mut PhysicalResourceBlock> + '_ {
        self.prbs.iter_mut().filter(move |prb| prb.resource.time_slot == time_slot && !prb.is_empty())
    }

    pub fn get_users(&self) -> BTreeSet<UserId> {
        self.prbs.iter().filter_map(|prb| prb.get_user().cloned()).collect()
    }

    pub fn get_num_compounds(&self) -> usize {
        self.prbs.iter().map(|prb| prb.get_compounds().len()).sum()
    }

    pub fn get_scheduled_bits(&self) -> u64 {
        self.prbs.iter().map(|prb| prb.get_scheduled_bits()).sum()
    }

    /// Fraction of the total resource time that carries data.
    pub fn get_resource_usage(&self) -> f64 {
        if self.prbs.is_empty() {
            return 0.0;
        }

        let used: f64 = self.prbs.iter().map(|prb| prb.get_used_time()).sum();
        used / (self.prbs.len() as f64 * self.slot_length)
    }

    /// Collects one burst per used resource unit, ordered by time slot, subchannel and spatial layer.
    pub fn to_map_info(&self) -> MapInfoCollection {
        let mut bursts: MapInfoCollection = Vec::new();

        for prb in self.prbs.iter().filter(|prb| !prb.is_empty()) {
            let compounds = prb.get_compounds();

            let (Some(first), Some(last)) = (compounds.first(), compounds.last()) else {
                continue;
            };

            bursts.push(MapInfoEntry {
                start: first.start,
                end: last.end,
                user: first.user.clone(),
                cid: first.cid.clone(),
                resource: prb.resource,
                phy_mode: first.phy_mode,
                tx_power: prb.tx_power,
                pattern: prb.pattern,
                compounds: compounds.iter().map(|compound| compound.pdu.clone()).collect(),
            });
        }

        bursts.sort_by_key(|burst| (burst.resource.time_slot, burst.resource.sub_channel, burst.resource.spatial_layer));

        bursts
    }

    /// Human readable occupancy table, one line per subchannel.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();

        for sub_channel in 0..self.num_sub_channels {
            out.push_str(&format!("SC{:>3}:", sub_channel));

            for time_slot in 0..self.num_time_slots {
                for spatial_layer in 0..self.num_spatial_layers {
                    let cell = self.get_prb(&DsaResult::new(sub_channel, time_slot, spatial_layer)).and_then(|prb| prb.get_user());
                    match cell {
                        Some(user) => out.push_str(&format!(" {:>6}", user.id)),
                        None => out.push_str("      ."),
                    }
                }
                out.push_str(" |");
            }

            out.push('\n');
        }

        out
    }
}
