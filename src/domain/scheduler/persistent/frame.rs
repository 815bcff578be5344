use std::collections::{BTreeMap, BTreeSet};

use crate::domain::scheduler::persistent::transmission_block::TransmissionBlock;
use crate::domain::scheduler::utils::id::ConnectionId;
use crate::ensure_invariant;
use crate::error::Result;

/// A reservation of one connection inside one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReservation {
    pub block: TransmissionBlock,

    /// Persistent reservations survive `clear_unpersistent`.
    pub persistent: bool,
}

/// Occupancy of the resource blocks of one scheduling round.
///
/// **Invariants:**
/// * No two connections occupy the same block.
/// * A connection holds at most one reservation per frame.
/// * `occupancy` and `reservations` always describe the same blocks.
#[derive(Debug, Clone)]
pub struct Frame {
    index: usize,

    /// Owner of every resource block, `None` if free.
    occupancy: Vec<Option<ConnectionId>>,

    reservations: BTreeMap<ConnectionId, FrameReservation>,
}

impl Frame {
    pub fn new(index: usize, num_blocks: usize) -> Self {
        Frame { index, occupancy: vec![None; num_blocks], reservations: BTreeMap::new() }
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn get_num_blocks(&self) -> usize {
        self.occupancy.len()
    }

    /// Number of occupied resource blocks.
    pub fn get_load(&self) -> usize {
        self.occupancy.iter().filter(|owner| owner.is_some()).count()
    }

    pub fn get_free_blocks(&self) -> usize {
        self.get_num_blocks() - self.get_load()
    }

    pub fn get_owner(&self, block: usize) -> Option<&ConnectionId> {
        self.occupancy.get(block).and_then(|owner| owner.as_ref())
    }

    pub fn get_reservation(&self, cid: &ConnectionId) -> Option<&FrameReservation> {
        self.reservations.get(cid)
    }

    pub fn get_reservations(&self) -> impl Iterator<Item = (&ConnectionId, &FrameReservation)> {
        self.reservations.iter()
    }

    pub fn has_reservation(&self, cid: &ConnectionId) -> bool {
        self.reservations.contains_key(cid)
    }

    /// Reserves `block` for `cid`.
    ///
    /// # Returns
    /// `Err(InvariantViolation)` if the block leaves the frame, if `cid` already holds a reservation
    /// in this frame or if any block of the range belongs to another connection.
    pub fn reserve(&mut self, cid: &ConnectionId, block: TransmissionBlock, persistent: bool) -> Result<()> {
        ensure_invariant!(!block.is_empty(), "Frame {}: empty reservation for {}", self.index, cid);

        ensure_invariant!(
            block.end() <= self.get_num_blocks(),
            "Frame {}: reservation {} of {} exceeds the {} resource blocks",
            self.index,
            block,
            cid,
            self.get_num_blocks()
        );

        ensure_invariant!(
            !self.reservations.contains_key(cid),
            "Frame {}: {} already holds reservation {:?}",
            self.index,
            cid,
            self.reservations.get(cid).map(|reservation| reservation.block)
        );

        let conflict = block.indices().find_map(|index| self.occupancy[index].as_ref().map(|owner| (index, owner)));

        ensure_invariant!(
            conflict.is_none(),
            "Frame {}: reservation {} of {} overlaps block {:?}",
            self.index,
            block,
            cid,
            conflict
        );

        for index in block.indices() {
            self.occupancy[index] = Some(cid.clone());
        }

        self.reservations.insert(cid.clone(), FrameReservation { block, persistent });
        self.debug_check_coherence();

        Ok(())
    }

    /// Frees the reservation of `cid` and returns it.
    pub fn release(&mut self, cid: &ConnectionId) -> Option<FrameReservation> {
        let reservation = self.reservations.remove(cid)?;

        for index in reservation.block.indices() {
            self.occupancy[index] = None;
        }

        self.debug_check_coherence();

        Some(reservation)
    }

    /// Removes every unpersistent reservation and returns the affected connections.
    pub fn clear_unpersistent(&mut self) -> Vec<ConnectionId> {
        let cleared: Vec<ConnectionId> =
            self.reservations.iter().filter(|(_, reservation)| !reservation.persistent).map(|(cid, _)| cid.clone()).collect();

        for cid in &cleared {
            self.release(cid);
        }

        cleared
    }

    /// Every maximal run of free resource blocks, ordered by start position.
    /// An empty frame yields one run spanning the whole frame.
    pub fn find_transmission_blocks(&self) -> BTreeSet<TransmissionBlock> {
        let mut blocks = BTreeSet::new();
        let mut run_start: Option<usize> = None;

        for (index, owner) in self.occupancy.iter().enumerate() {
            match (owner, run_start) {
                (None, None) => run_start = Some(index),
                (Some(_), Some(start)) => {
                    blocks.insert(TransmissionBlock::new(start, index - start));
                    run_start = None;
                }
                _ => {}
            }
        }

        if let Some(start) = run_start {
            blocks.insert(TransmissionBlock::new(start, self.get_num_blocks() - start));
        }

        blocks
    }

    /// Smallest free run that holds `length` blocks, lowest start on ties. The returned
    /// block starts at the beginning of that run and is exactly `length` long.
    pub fn find_best_fit(&self, length: usize) -> Option<TransmissionBlock> {
        if length == 0 {
            return None;
        }

        self.find_transmission_blocks()
            .into_iter()
            .filter(|run| run.length >= length)
            .min_by_key(|run| (run.length, run.start))
            .map(|run| TransmissionBlock::new(run.start, length))
    }

    pub fn get_largest_free_run(&self) -> Option<TransmissionBlock> {
        // min_by_key over (Reverse(length), start) keeps the earliest of equally long runs
        self.find_transmission_blocks().into_iter().min_by_key(|run| (std::cmp::Reverse(run.length), run.start))
    }

    fn debug_check_coherence(&self) {
        debug_assert_eq!(
            self.occupancy.iter().filter(|owner| owner.is_some()).count(),
            self.reservations.values().map(|reservation| reservation.block.length).sum::<usize>(),
            "frame {} occupancy and reservation table disagree",
            self.index
        );
    }
}
