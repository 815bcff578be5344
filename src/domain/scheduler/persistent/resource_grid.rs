use std::collections::{BTreeMap, BTreeSet};

use slotmap::{SlotMap, new_key_type};

use crate::domain::scheduler::persistent::frame::{Frame, FrameReservation};
use crate::domain::scheduler::persistent::transmission_block::TransmissionBlock;
use crate::domain::scheduler::utils::id::ConnectionId;
use crate::ensure_invariant;
use crate::error::{Error, Result};

new_key_type! {
    pub struct PersistentReservationId;
}

/// Aggregate view of one persistent reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistentReservation {
    pub frame: usize,
    pub block: TransmissionBlock,
}

/// A reservation that `compact_frame` moved to a new position inside its frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub cid: ConnectionId,
    pub from: TransmissionBlock,
    pub to: TransmissionBlock,
}

/// Rolling window of frames used for semi-persistent scheduling.
///
/// Round `r` works on frame `r % number_of_frames`. Every connection holds at most one persistent
/// reservation in the whole grid, tracked in a slot map next to the per-frame occupancy.
#[derive(Debug)]
pub struct ResourceGrid {
    frames: Vec<Frame>,

    blocks_per_frame: usize,

    /// Persistent reservation storage.
    persistent: SlotMap<PersistentReservationId, (ConnectionId, PersistentReservation)>,

    /// Index lookup of the persistent reservation of a connection.
    connection_index: BTreeMap<ConnectionId, PersistentReservationId>,

    /// Frame whose round is currently open.
    current_frame: Option<usize>,
}

impl ResourceGrid {
    pub fn new(number_of_frames: usize, blocks_per_frame: usize) -> Result<Self> {
        if number_of_frames == 0 || blocks_per_frame == 0 {
            return Err(Error::ConfigurationError(format!(
                "Resource grid needs at least one frame and one resource block, got {}x{}",
                number_of_frames, blocks_per_frame
            )));
        }

        let frames = (0..number_of_frames).map(|index| Frame::new(index, blocks_per_frame)).collect();

        Ok(ResourceGrid {
            frames,
            blocks_per_frame,
            persistent: SlotMap::with_key(),
            connection_index: BTreeMap::new(),
            current_frame: None,
        })
    }

    pub fn get_number_of_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn get_blocks_per_frame(&self) -> usize {
        self.blocks_per_frame
    }

    pub fn get_current_frame(&self) -> Option<usize> {
        self.current_frame
    }

    /// Maps a round number onto the rolling window.
    pub fn frame_index_for_round(&self, round: u64) -> usize {
        (round % self.frames.len() as u64) as usize
    }

    pub fn get_frame(&self, frame: usize) -> Option<&Frame> {
        self.frames.get(frame)
    }

    fn frame_mut(&mut self, frame: usize) -> Result<&mut Frame> {
        let number_of_frames = self.frames.len();
        self.frames
            .get_mut(frame)
            .ok_or_else(|| Error::InvariantViolation(format!("Frame index {} outside of a grid with {} frames", frame, number_of_frames)))
    }

    /// Opens the round of `frame` and clears its unpersistent reservations.
    ///
    /// Frames have to be opened in window order; the first call may open any frame.
    ///
    /// # Returns
    /// The connections whose unpersistent reservations were removed.
    pub fn on_new_frame(&mut self, frame: usize) -> Result<Vec<ConnectionId>> {
        ensure_invariant!(frame < self.frames.len(), "Frame index {} outside of a grid with {} frames", frame, self.frames.len());

        if let Some(current) = self.current_frame {
            let expected = (current + 1) % self.frames.len();
            ensure_invariant!(frame == expected, "Frame {} opened out of order, frame {} is due", frame, expected);
        }

        self.current_frame = Some(frame);
        let cleared = self.frame_mut(frame)?.clear_unpersistent();

        log::trace!("Opened frame {}, {} unpersistent reservations cleared.", frame, cleared.len());

        Ok(cleared)
    }

    /// Reserves `block` in `frame` for `cid`.
    ///
    /// # Returns
    /// `Err(InvariantViolation)` for an unknown frame, for any conflict inside the frame and for a
    /// second persistent reservation of the same connection anywhere in the grid.
    pub fn reserve(&mut self, frame: usize, cid: &ConnectionId, block: TransmissionBlock, persistent: bool) -> Result<()> {
        if persistent {
            ensure_invariant!(
                !self.connection_index.contains_key(cid),
                "{} already holds persistent reservation {:?}",
                cid,
                self.get_persistent_reservation(cid)
            );
        }

        self.frame_mut(frame)?.reserve(cid, block, persistent)?;

        if persistent {
            let key = self.persistent.insert((cid.clone(), PersistentReservation { frame, block }));
            self.connection_index.insert(cid.clone(), key);
        }

        Ok(())
    }

    /// Frees the reservation of `cid` in `frame`, persistent or not.
    pub fn release(&mut self, frame: usize, cid: &ConnectionId) -> Result<Option<FrameReservation>> {
        let released = self.frame_mut(frame)?.release(cid);

        if let Some(reservation) = released {
            if reservation.persistent {
                self.forget_persistent(cid);
            }
        }

        Ok(released)
    }

    fn forget_persistent(&mut self, cid: &ConnectionId) {
        if let Some(key) = self.connection_index.remove(cid) {
            self.persistent.remove(key);
        }
    }

    /// Moves the persistent reservation of `cid` to `block` of `to_frame`.
    pub fn relocate(&mut self, cid: &ConnectionId, to_frame: usize, block: TransmissionBlock) -> Result<()> {
        let current = self
            .get_persistent_reservation(cid)
            .copied()
            .ok_or_else(|| Error::InvariantViolation(format!("{} has no persistent reservation to relocate", cid)))?;

        self.release(current.frame, cid)?;

        if let Err(error) = self.reserve(to_frame, cid, block, true) {
            // restore the old position
            self.reserve(current.frame, cid, current.block, true)?;
            return Err(error);
        }

        Ok(())
    }

    /// Releases every reservation of `cid` in every frame.
    ///
    /// # Returns
    /// The number of released reservations.
    pub fn teardown(&mut self, cid: &ConnectionId) -> usize {
        let mut released = 0;

        for frame in self.frames.iter_mut() {
            if frame.release(cid).is_some() {
                released += 1;
            }
        }

        self.forget_persistent(cid);

        log::debug!("Tore down {} reservations of {}.", released, cid);

        released
    }

    pub fn get_persistent_reservation(&self, cid: &ConnectionId) -> Option<&PersistentReservation> {
        let key = self.connection_index.get(cid)?;
        self.persistent.get(*key).map(|(_, reservation)| reservation)
    }

    pub fn has_persistent_reservation(&self, cid: &ConnectionId) -> bool {
        self.connection_index.contains_key(cid)
    }

    /// Connections with a persistent reservation in `frame`.
    pub fn get_persistent_connections(&self, frame: usize) -> BTreeSet<ConnectionId> {
        self.persistent.values().filter(|(_, reservation)| reservation.frame == frame).map(|(cid, _)| cid.clone()).collect()
    }

    pub fn get_number_of_persistent_reservations(&self) -> usize {
        self.persistent.len()
    }

    pub fn get_load(&self, frame: usize) -> usize {
        self.frames.get(frame).map(|frame| frame.get_load()).unwrap_or(0)
    }

    pub fn find_transmission_blocks(&self, frame: usize) -> Result<BTreeSet<TransmissionBlock>> {
        let number_of_frames = self.frames.len();
        let frame = self
            .frames
            .get(frame)
            .ok_or_else(|| Error::InvariantViolation(format!("Frame index {} outside of a grid with {} frames", frame, number_of_frames)))?;

        Ok(frame.find_transmission_blocks())
    }

    /// Moves planned by `compact_frame`: reservations are packed towards block 0 in order of
    /// their start position, so all free blocks form a single run at the end of the frame.
    pub fn get_compaction_moves(&self, frame: usize) -> Vec<Relocation> {
        let Some(frame) = self.frames.get(frame) else {
            return Vec::new();
        };

        let mut reservations: Vec<(&ConnectionId, &FrameReservation)> = frame.get_reservations().collect();
        reservations.sort_by_key(|(_, reservation)| reservation.block.start);

        let mut moves = Vec::new();
        let mut next_start = 0;

        for (cid, reservation) in reservations {
            let target = TransmissionBlock::new(next_start, reservation.block.length);
            if target != reservation.block {
                moves.push(Relocation { cid: cid.clone(), from: reservation.block, to: target });
            }
            next_start += reservation.block.length;
        }

        moves
    }

    /// Frequency relocation: defragments `frame`.
    ///
    /// # Returns
    /// The reservations that changed position.
    pub fn compact_frame(&mut self, frame: usize) -> Result<Vec<Relocation>> {
        let moves = self.get_compaction_moves(frame);

        let mut released = Vec::with_capacity(moves.len());
        for relocation in &moves {
            let reservation = self.frame_mut(frame)?.release(&relocation.cid);
            ensure_invariant!(reservation.is_some(), "Frame {}: {} vanished during compaction", frame, relocation.cid);
            released.push((relocation, reservation.map(|reservation| reservation.persistent).unwrap_or(false)));
        }

        for (relocation, persistent) in released {
            self.frame_mut(frame)?.reserve(&relocation.cid, relocation.to, persistent)?;

            if persistent {
                if let Some(key) = self.connection_index.get(&relocation.cid) {
                    if let Some((_, entry)) = self.persistent.get_mut(*key) {
                        entry.block = relocation.to;
                    }
                }
            }
        }

        if !moves.is_empty() {
            log::debug!("Compacted frame {}: {} reservations moved.", frame, moves.len());
        }

        Ok(moves)
    }

    /// Least loaded frame other than `exclude` that still has a free run of `length` blocks.
    /// Ties go to the lowest frame index.
    pub fn least_loaded_frame(&self, exclude: usize, length: usize) -> Option<usize> {
        self.frames
            .iter()
            .filter(|frame| frame.get_index() != exclude)
            .filter(|frame| frame.find_best_fit(length).is_some())
            .min_by_key(|frame| (frame.get_load(), frame.get_index()))
            .map(|frame| frame.get_index())
    }

    /// Checks the slot map against the frames. Only active in debug builds.
    pub fn debug_check_coherence(&self) {
        for (cid, reservation) in self.persistent.values() {
            debug_assert_eq!(
                self.frames[reservation.frame].get_reservation(cid),
                Some(&FrameReservation { block: reservation.block, persistent: true }),
                "persistent reservation of {} is not backed by its frame",
                cid
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(name: &str) -> ConnectionId {
        ConnectionId::new(name)
    }

    #[test]
    fn test_on_new_frame_order() {
        let mut grid = ResourceGrid::new(3, 10).unwrap();

        grid.on_new_frame(1).unwrap();
        grid.on_new_frame(2).unwrap();
        grid.on_new_frame(0).unwrap();

        assert!(grid.on_new_frame(2).unwrap_err().is_invariant_violation());
        assert!(grid.on_new_frame(7).unwrap_err().is_invariant_violation());
    }

    #[test]
    fn test_single_persistent_reservation_per_connection() {
        let mut grid = ResourceGrid::new(2, 10).unwrap();

        grid.reserve(0, &cid("C1"), TransmissionBlock::new(0, 2), true).unwrap();
        assert!(grid.reserve(1, &cid("C1"), TransmissionBlock::new(0, 2), true).unwrap_err().is_invariant_violation());

        grid.reserve(1, &cid("C1"), TransmissionBlock::new(0, 2), false).unwrap();
        assert_eq!(grid.get_persistent_reservation(&cid("C1")).map(|reservation| reservation.frame), Some(0));
    }

    #[test]
    fn test_compaction_updates_persistent_index() {
        let mut grid = ResourceGrid::new(1, 10).unwrap();
        grid.reserve(0, &cid("A"), TransmissionBlock::new(2, 2), true).unwrap();
        grid.reserve(0, &cid("B"), TransmissionBlock::new(6, 1), false).unwrap();

        let moves = grid.compact_frame(0).unwrap();

        assert_eq!(moves.len(), 2);
        assert_eq!(grid.get_persistent_reservation(&cid("A")).map(|reservation| reservation.block), Some(TransmissionBlock::new(0, 2)));
        assert_eq!(grid.find_transmission_blocks(0).unwrap().into_iter().collect::<Vec<_>>(), vec![TransmissionBlock::new(3, 7)]);
        grid.debug_check_coherence();
    }

    #[test]
    fn test_relocate_and_teardown() {
        let mut grid = ResourceGrid::new(3, 4).unwrap();
        grid.reserve(0, &cid("A"), TransmissionBlock::new(0, 4), true).unwrap();
        grid.reserve(1, &cid("B"), TransmissionBlock::new(0, 1), true).unwrap();

        assert_eq!(grid.least_loaded_frame(0, 2), Some(2));
        assert_eq!(grid.least_loaded_frame(2, 4), None);

        grid.relocate(&cid("A"), 2, TransmissionBlock::new(0, 2)).unwrap();
        assert_eq!(grid.get_load(0), 0);
        assert_eq!(grid.get_persistent_connections(2), BTreeSet::from([cid("A")]));

        assert_eq!(grid.teardown(&cid("A")), 1);
        assert!(!grid.has_persistent_reservation(&cid("A")));
        assert_eq!(grid.get_number_of_persistent_reservations(), 1);
    }
}
