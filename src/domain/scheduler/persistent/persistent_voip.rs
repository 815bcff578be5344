use std::collections::BTreeSet;

use crate::domain::scheduler::apc::apc_trait::ApcStrategy;
use crate::domain::scheduler::interfaces::harq::HarqInterface;
use crate::domain::scheduler::interfaces::queue::QueueInterface;
use crate::domain::scheduler::persistent::resource_grid::ResourceGrid;
use crate::domain::scheduler::persistent::state_tracker::{Classification, StateTracker};
use crate::domain::scheduler::persistent::transmission_block::TransmissionBlock;
use crate::domain::scheduler::request::{ApcResult, DsaResult, RequestForResource, SchedulerState, StrategyInput};
use crate::domain::scheduler::scheduling_map::SchedulingMap;
use crate::domain::scheduler::scheduling_map::physical_resource_block::TIME_EPSILON;
use crate::domain::scheduler::scheduling_map::scheduled_compound::ScheduledCompound;
use crate::domain::scheduler::strategy::strategy_trait::{SchedulingEnvironment, Strategy, StrategyResult};
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::statistics::RoundStatistics;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistentVoipConfig {
    /// Size of the rolling frame window, i.e. the period of a persistent reservation.
    pub number_of_frames: usize,

    /// Grants that can be signaled on the control channel per round.
    pub number_of_pdcch_resources: usize,

    /// Priority class of the voice connections.
    pub voice_priority: usize,
}

impl Default for PersistentVoipConfig {
    fn default() -> Self {
        PersistentVoipConfig { number_of_frames: 20, number_of_pdcch_resources: 10, voice_priority: 0 }
    }
}

/// Control channel capacity of one round.
#[derive(Debug, Clone, Copy)]
struct PdcchBudget {
    capacity: usize,
    used: usize,
}

impl PdcchBudget {
    fn new(capacity: usize) -> Self {
        PdcchBudget { capacity, used: 0 }
    }

    fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    fn has_remaining(&self) -> bool {
        self.used < self.capacity
    }

    /// Takes `count` resources if all of them are still available.
    fn try_use(&mut self, count: usize) -> bool {
        if count > self.remaining() {
            return false;
        }
        self.used += count;
        true
    }
}

/// Power, PHY mode and rate a connection transmits with this round.
#[derive(Debug, Clone)]
struct Link {
    user: UserId,
    apc: ApcResult,
    data_rate: f64,
}

/// Semi-persistent scheduling for voice traffic.
///
/// Resource block `b` of a frame is subchannel `b` of time slot 0 on spatial layer 0, so the
/// scheduling map needs exactly as many subchannels as the grid has blocks per frame.
///
/// A round on frame `f = round % number_of_frames`:
/// 1. open frame `f`, its unpersistent reservations are dropped
/// 2. classify the active voice connections
/// 3. connections with a persistent reservation in `f` keep it if their queued data still fits,
///    otherwise they are placed again
/// 4. new-persistent and reactivated connections without a reservation are placed persistently:
///    first fit into the free runs of `f`, then after compacting `f` (frequency relocation),
///    then into the least loaded other frame (time relocation, data waits for that frame)
/// 5. silenced connections keep their reservation untouched, and when they speak again in the
///    frame of that reservation they are served there without a new grant
/// 6. HARQ retransmissions, then dynamic traffic, each grant costing one PDCCH resource
///
/// Connections that find no room are deferred to a later round.
#[derive(Debug)]
pub struct PersistentVoIP {
    config: PersistentVoipConfig,
    grid: ResourceGrid,
    tracker: StateTracker,
    apc: Box<dyn ApcStrategy>,
    last_classification: Classification,
}

impl PersistentVoIP {
    pub fn new(config: PersistentVoipConfig, blocks_per_frame: usize, apc: Box<dyn ApcStrategy>) -> Result<Self> {
        if config.number_of_pdcch_resources == 0 {
            log::warn!("PersistentVoIP without PDCCH resources can only serve existing persistent reservations.");
        }

        let grid = ResourceGrid::new(config.number_of_frames, blocks_per_frame)?;
        let tracker = StateTracker::new(config.number_of_frames);

        Ok(PersistentVoIP { config, grid, tracker, apc, last_classification: Classification::default() })
    }

    pub fn get_config(&self) -> &PersistentVoipConfig {
        &self.config
    }

    pub fn get_resource_grid(&self) -> &ResourceGrid {
        &self.grid
    }

    pub fn get_state_tracker(&self) -> &StateTracker {
        &self.tracker
    }

    /// Classification of the most recent round.
    pub fn get_last_classification(&self) -> &Classification {
        &self.last_classification
    }

    /// Number of resource blocks the queued units of a connection occupy when packed in queue order.
    /// `None` if a single unit does not fit into one block.
    fn get_needed_blocks(sizes: &[u32], data_rate: f64, slot_length: f64) -> Option<usize> {
        if sizes.is_empty() {
            return Some(0);
        }

        if data_rate <= 0.0 {
            return None;
        }

        let mut blocks = 1;
        let mut used = 0.0;

        for bits in sizes {
            let duration = *bits as f64 / data_rate;
            if duration > slot_length + TIME_EPSILON {
                return None;
            }

            if used + duration > slot_length + TIME_EPSILON {
                blocks += 1;
                used = 0.0;
            }

            used += duration;
        }

        Some(blocks)
    }

    fn get_link(&self, cid: &ConnectionId, state: &SchedulerState, map: &SchedulingMap) -> Option<Link> {
        let registry = state.registry;
        let user = registry.get_user_for_cid(cid)?;

        let request = RequestForResource::new(user.clone(), cid.clone(), registry.get_priority_for_cid(cid), 0);
        let apc = self.apc.do_start_apc(&request, state, map)?;
        let data_rate = registry.get_phy_mode_mapper().get_data_rate(&apc.phy_mode);

        Some(Link { user, apc, data_rate })
    }

    /// Link and block demand of `cid`, `None` on estimation shortfall.
    fn get_demand(&self, cid: &ConnectionId, state: &SchedulerState, queue: &dyn QueueInterface, map: &SchedulingMap) -> Option<(Link, usize)> {
        let link = self.get_link(cid, state, map)?;
        let needed = Self::get_needed_blocks(&queue.get_queued_pdu_sizes(cid), link.data_rate, state.input.slot_length)?;
        Some((link, needed))
    }

    /// Drains the queue of `cid` into the resource blocks of `block`.
    fn fill_block(
        cid: &ConnectionId,
        link: &Link,
        block: TransmissionBlock,
        queue: &mut dyn QueueInterface,
        map: &mut SchedulingMap,
    ) -> Result<usize> {
        let mut placed = 0;

        for index in block.indices() {
            let resource = DsaResult::new(index, 0, 0);

            while let Some(bits) = queue.get_head_of_line_pdu_bits(cid) {
                if !map.can_carry(&resource, &link.user, cid, Some(&link.apc.phy_mode), bits as f64 / link.data_rate) {
                    break;
                }

                let Some(pdu) = queue.get_head_of_line_pdu(cid) else {
                    break;
                };

                map.add_compound(&resource, &link.user, pdu, link.apc.phy_mode, link.data_rate, link.apc.tx_power, None, None)?;
                placed += 1;
            }

            if !queue.queue_has_pdus(cid) {
                break;
            }
        }

        Ok(placed)
    }

    /// Places a persistent reservation of `needed` blocks for `cid`.
    ///
    /// # Returns
    /// `true` if the reservation landed in `frame` and can be served this round.
    fn schedule_persistently(
        &mut self,
        cid: &ConnectionId,
        needed: usize,
        frame: usize,
        pdcch: &mut PdcchBudget,
        statistics: &mut RoundStatistics,
    ) -> Result<bool> {
        if !pdcch.has_remaining() {
            log::info!("PDCCH budget exhausted, persistent placement of {} deferred.", cid);
            statistics.deferred_connections += 1;
            return Ok(false);
        }

        if let Some(block) = self.grid.get_frame(frame).and_then(|current| current.find_best_fit(needed)) {
            self.grid.reserve(frame, cid, block, true)?;
            pdcch.try_use(1);
            statistics.new_persistent_grants += 1;
            log::debug!("{} reserved {} persistently in frame {}.", cid, block, frame);
            return Ok(true);
        }

        let free_blocks = self.grid.get_frame(frame).map(|current| current.get_free_blocks()).unwrap_or(0);
        let moves = self.grid.get_compaction_moves(frame);

        if !moves.is_empty() && free_blocks >= needed && pdcch.remaining() > moves.len() {
            let moved = self.grid.compact_frame(frame)?;
            pdcch.try_use(moved.len());
            statistics.frequency_relocations += moved.len();

            if let Some(block) = self.grid.get_frame(frame).and_then(|current| current.find_best_fit(needed)) {
                self.grid.reserve(frame, cid, block, true)?;
                pdcch.try_use(1);
                statistics.new_persistent_grants += 1;
                log::debug!("{} reserved {} in frame {} after moving {} reservations.", cid, block, frame, moved.len());
                return Ok(true);
            }
        }

        if let Some(other) = self.grid.least_loaded_frame(frame, needed) {
            if let Some(block) = self.grid.get_frame(other).and_then(|target| target.find_best_fit(needed)) {
                self.grid.reserve(other, cid, block, true)?;
                pdcch.try_use(1);
                statistics.time_relocations += 1;
                log::debug!("{} moved to frame {} at {}, its data waits for that frame.", cid, other, block);
                return Ok(false);
            }
        }

        log::info!("No frame has {} free resource blocks for {}, deferred to a later round.", needed, cid);
        statistics.deferred_connections += 1;

        Ok(false)
    }

    /// Dynamic candidates: unpersistent voice connections first, then all other priority classes.
    fn get_dynamic_candidates(&self, classification: &Classification, state: &SchedulerState, queue: &dyn QueueInterface, reachable: &BTreeSet<UserId>) -> Vec<ConnectionId> {
        let registry = state.registry;
        let mut candidates: Vec<ConnectionId> = classification.unpersistent.iter().cloned().collect();

        for priority in (0..registry.get_number_of_priorities()).filter(|priority| *priority != self.config.voice_priority) {
            candidates.extend(
                registry
                    .get_connections_for_priority(priority)
                    .into_iter()
                    .filter(|cid| queue.queue_has_pdus(cid))
                    .filter(|cid| registry.get_user_for_cid(cid).is_some_and(|user| reachable.contains(&user))),
            );
        }

        candidates
    }

    #[allow(clippy::too_many_arguments)]
    fn schedule_retransmissions(
        &mut self,
        harq: &mut dyn HarqInterface,
        frame: usize,
        state: &SchedulerState,
        map: &mut SchedulingMap,
        pdcch: &mut PdcchBudget,
        statistics: &mut RoundStatistics,
    ) -> Result<()> {
        for retransmission in harq.get_pending_retransmissions() {
            if !pdcch.has_remaining() {
                log::info!("PDCCH budget exhausted, HARQ process {} of {} deferred.", retransmission.process, retransmission.user);
                statistics.deferred_connections += 1;
                continue;
            }

            if self.grid.get_frame(frame).is_some_and(|current| current.has_reservation(&retransmission.cid)) {
                log::debug!("{} already holds a reservation in frame {}, retransmission waits.", retransmission.cid, frame);
                continue;
            }

            let Some(link) = self.get_link(&retransmission.cid, state, map) else {
                continue;
            };

            let Some(needed) = Self::get_needed_blocks(&[retransmission.pdu.bits], link.data_rate, state.input.slot_length) else {
                continue;
            };

            let Some(block) = self.grid.get_frame(frame).and_then(|current| current.find_best_fit(needed)) else {
                log::info!("No resource block left for HARQ process {} of {}.", retransmission.process, retransmission.user);
                statistics.deferred_connections += 1;
                continue;
            };

            self.grid.reserve(frame, &retransmission.cid, block, false)?;
            pdcch.try_use(1);

            let resource = DsaResult::new(block.start, 0, 0);
            map.add_compound(
                &resource,
                &link.user,
                retransmission.pdu.clone(),
                link.apc.phy_mode,
                link.data_rate,
                link.apc.tx_power,
                None,
                None,
            )?;

            harq.retransmission_scheduled(&retransmission.user, retransmission.process);
            statistics.harq_grants += 1;
        }

        Ok(())
    }
}

impl Strategy for PersistentVoIP {
    fn do_start_scheduling(
        &mut self,
        input: &StrategyInput,
        env: &mut SchedulingEnvironment,
        callback: &mut dyn FnMut(&ScheduledCompound),
    ) -> Result<StrategyResult> {
        input.validate()?;

        if input.num_sub_channels != self.grid.get_blocks_per_frame() {
            return Err(Error::ConfigurationError(format!(
                "PersistentVoIP needs {} subchannels (one per resource block), got {}",
                self.grid.get_blocks_per_frame(),
                input.num_sub_channels
            )));
        }

        let frame = self.grid.frame_index_for_round(env.round);
        self.grid.on_new_frame(frame)?;

        let registry = env.registry;
        let state = SchedulerState::new(*input, registry).with_priority(self.config.voice_priority);
        let mut map = SchedulingMap::from_input(input);
        let mut statistics = RoundStatistics::new(env.round, frame, env.time);
        let mut pdcch = PdcchBudget::new(self.config.number_of_pdcch_resources);
        let mut excluded: BTreeSet<UserId> = BTreeSet::new();

        let reachable = registry.filter_reachable(env.queue.get_queued_users());

        let active: BTreeSet<ConnectionId> = env
            .queue
            .get_active_connections()
            .into_iter()
            .filter(|cid| registry.get_priority_for_cid(cid) == self.config.voice_priority)
            .filter(|cid| registry.get_user_for_cid(cid).is_some_and(|user| reachable.contains(&user)))
            .collect();

        let classification = self.tracker.update_state(&active, frame);

        // Keep or re-place existing persistent reservations.
        let mut serve: Vec<(ConnectionId, Link)> = Vec::new();
        let mut to_place: Vec<(ConnectionId, Link, usize)> = Vec::new();

        let promoted = classification.persistent.iter().chain(classification.new_persistent.iter()).chain(classification.reactivated.iter());

        for cid in promoted {
            let Some((link, needed)) = self.get_demand(cid, &state, &*env.queue, &map) else {
                if let Some(user) = registry.get_user_for_cid(cid) {
                    excluded.insert(user);
                }
                continue;
            };

            if needed == 0 {
                continue;
            }

            match self.grid.get_persistent_reservation(cid).copied() {
                Some(reservation) if reservation.frame == frame => {
                    if needed <= reservation.block.length {
                        serve.push((cid.clone(), link));
                        statistics.persistent_grants += 1;
                    } else {
                        log::debug!("{} outgrew its reservation {} ({} blocks needed).", cid, reservation.block, needed);
                        self.grid.release(frame, cid)?;
                        to_place.push((cid.clone(), link, needed));
                    }
                }
                Some(_) => {}
                None => to_place.push((cid.clone(), link, needed)),
            }
        }

        for (cid, link, needed) in to_place {
            if self.schedule_persistently(&cid, needed, frame, &mut pdcch, &mut statistics)? {
                serve.push((cid, link));
            }
        }

        // Talkers back from silence whose kept reservation lies in this frame use it without a new grant.
        let mut returning: BTreeSet<ConnectionId> = BTreeSet::new();

        for cid in &classification.unpersistent {
            if !self.grid.get_persistent_reservation(cid).is_some_and(|reservation| reservation.frame == frame) {
                continue;
            }

            let Some(link) = self.get_link(cid, &state, &map) else {
                if let Some(user) = registry.get_user_for_cid(cid) {
                    excluded.insert(user);
                }
                continue;
            };

            log::debug!("{} is back from silence and uses its reservation in frame {}.", cid, frame);
            returning.insert(cid.clone());
            serve.push((cid.clone(), link));
            statistics.persistent_grants += 1;
        }

        for cid in &classification.silenced {
            log::debug!("{} silenced in frame {}, reservation {:?} kept.", cid, frame, self.grid.get_persistent_reservation(cid));
        }

        for (cid, link) in &serve {
            let block = self.grid.get_frame(frame).and_then(|current| current.get_reservation(cid)).map(|reservation| reservation.block);

            let Some(block) = block else {
                return Err(Error::InvariantViolation(format!("{} is served in frame {} without a reservation", cid, frame)));
            };

            Self::fill_block(cid, link, block, &mut *env.queue, &mut map)?;
        }

        if let Some(harq) = env.harq.as_deref_mut() {
            self.schedule_retransmissions(harq, frame, &state, &mut map, &mut pdcch, &mut statistics)?;
        }

        let mut candidates = self.get_dynamic_candidates(&classification, &state, &*env.queue, &reachable);
        candidates.retain(|cid| !returning.contains(cid));

        for (position, cid) in candidates.iter().enumerate() {
            if !pdcch.has_remaining() {
                log::info!("PDCCH budget exhausted in frame {}, {} dynamic connections deferred.", frame, candidates.len() - position);
                statistics.deferred_connections += candidates.len() - position;
                break;
            }

            if self.grid.get_frame(frame).is_some_and(|current| current.has_reservation(cid)) {
                log::info!("{} already holds a reservation in frame {}, dynamic grant deferred.", cid, frame);
                statistics.deferred_connections += 1;
                continue;
            }

            let Some((link, needed)) = self.get_demand(cid, &state, &*env.queue, &map) else {
                if let Some(user) = registry.get_user_for_cid(cid) {
                    excluded.insert(user);
                }
                continue;
            };

            if needed == 0 {
                continue;
            }

            let Some(run) = self.grid.get_frame(frame).and_then(|current| current.get_largest_free_run()) else {
                log::info!("Frame {} is full, {} dynamic connections deferred.", frame, candidates.len() - position);
                statistics.deferred_connections += candidates.len() - position;
                break;
            };

            let block = TransmissionBlock::new(run.start, needed.min(run.length));
            self.grid.reserve(frame, cid, block, false)?;
            pdcch.try_use(1);

            Self::fill_block(cid, &link, block, &mut *env.queue, &mut map)?;
            statistics.dynamic_grants += 1;
        }

        self.apc.post_process(&state, &mut map);
        map.notify_compounds(callback);
        self.grid.debug_check_coherence();

        statistics.pdcch_used = pdcch.used;
        statistics.excluded_users = excluded.len();
        self.last_classification = classification;

        Ok(StrategyResult::from_map(map, statistics))
    }

    fn teardown(&mut self, cid: &ConnectionId) {
        self.grid.teardown(cid);
        self.tracker.teardown(cid);
    }

    fn get_name(&self) -> &'static str {
        "PersistentVoIP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needed_blocks_pack_in_queue_order() {
        // 1000 bit/s and 1 s slots: 1000 bits per block
        assert_eq!(PersistentVoIP::get_needed_blocks(&[], 1000.0, 1.0), Some(0));
        assert_eq!(PersistentVoIP::get_needed_blocks(&[600, 400], 1000.0, 1.0), Some(1));
        assert_eq!(PersistentVoIP::get_needed_blocks(&[600, 600, 300], 1000.0, 1.0), Some(2));
        assert_eq!(PersistentVoIP::get_needed_blocks(&[1200], 1000.0, 1.0), None);
    }

    #[test]
    fn test_pdcch_budget() {
        let mut pdcch = PdcchBudget::new(2);

        assert!(!pdcch.try_use(3));
        assert!(pdcch.try_use(2));
        assert!(!pdcch.has_remaining());
    }
}
