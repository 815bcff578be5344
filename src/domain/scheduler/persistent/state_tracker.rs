use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::scheduler::utils::id::ConnectionId;

/// Classification of a connection for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Active in two consecutive rounds for the first time, promoted to persistent.
    NewPersistent,
    /// Back from silence for a second consecutive round, promoted again.
    Reactivated,
    /// Persistent and still active.
    Persistent,
    /// Persistent until the last round, absent now.
    Silenced,
    /// Brand new, or back from silence for a single round only.
    Unpersistent,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::NewPersistent => "new-persistent",
            ConnectionState::Reactivated => "reactivated",
            ConnectionState::Persistent => "persistent",
            ConnectionState::Silenced => "silenced",
            ConnectionState::Unpersistent => "unpersistent",
        };
        write!(f, "{}", name)
    }
}

/// Result of `StateTracker::update_state`, one set per class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub new_persistent: BTreeSet<ConnectionId>,
    pub reactivated: BTreeSet<ConnectionId>,
    pub persistent: BTreeSet<ConnectionId>,
    pub silenced: BTreeSet<ConnectionId>,
    pub unpersistent: BTreeSet<ConnectionId>,
}

impl Classification {
    pub fn get_state(&self, cid: &ConnectionId) -> Option<ConnectionState> {
        if self.new_persistent.contains(cid) {
            return Some(ConnectionState::NewPersistent);
        }
        if self.reactivated.contains(cid) {
            return Some(ConnectionState::Reactivated);
        }
        if self.persistent.contains(cid) {
            return Some(ConnectionState::Persistent);
        }
        if self.silenced.contains(cid) {
            return Some(ConnectionState::Silenced);
        }
        if self.unpersistent.contains(cid) {
            return Some(ConnectionState::Unpersistent);
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.new_persistent.len() + self.reactivated.len() + self.persistent.len() + self.silenced.len() + self.unpersistent.len()
    }

    fn insert(&mut self, cid: &ConnectionId, state: ConnectionState) {
        let set = match state {
            ConnectionState::NewPersistent => &mut self.new_persistent,
            ConnectionState::Reactivated => &mut self.reactivated,
            ConnectionState::Persistent => &mut self.persistent,
            ConnectionState::Silenced => &mut self.silenced,
            ConnectionState::Unpersistent => &mut self.unpersistent,
        };
        set.insert(cid.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Seen, not yet promoted.
    Candidate,
    Persistent,
    Silenced,
    /// Back from silence, waiting for the second consecutive round.
    Returning,
}

#[derive(Debug, Clone, Copy)]
struct ConnectionHistory {
    phase: Phase,
    last_active_round: u64,
}

/// Remembers per connection in which rounds it was active and classifies it every round.
///
/// Rounds are counted by accepted `update_state` calls. The frame index of each call has to follow
/// the previous one in window order (`(previous + 1) % number_of_frames`); any other frame index is
/// ignored until its turn comes.
///
/// Entries are created on first sighting and removed only by `teardown`.
#[derive(Debug, Clone)]
pub struct StateTracker {
    number_of_frames: usize,

    history: BTreeMap<ConnectionId, ConnectionHistory>,

    /// Round of the last accepted update.
    round: Option<u64>,

    /// Frame index the next update must carry.
    expected_frame: Option<usize>,
}

impl StateTracker {
    pub fn new(number_of_frames: usize) -> Self {
        StateTracker { number_of_frames: number_of_frames.max(1), history: BTreeMap::new(), round: None, expected_frame: None }
    }

    pub fn get_expected_frame(&self) -> Option<usize> {
        self.expected_frame
    }

    pub fn get_number_of_tracked_connections(&self) -> usize {
        self.history.len()
    }

    pub fn is_tracked(&self, cid: &ConnectionId) -> bool {
        self.history.contains_key(cid)
    }

    /// Classifies `active` for the round of `frame`.
    ///
    /// Connections absent this round appear in the result only when they were persistent until
    /// the previous round (`silenced`).
    pub fn update_state(&mut self, active: &BTreeSet<ConnectionId>, frame: usize) -> Classification {
        let mut classification = Classification::default();

        if let Some(expected) = self.expected_frame {
            if frame != expected {
                log::warn!("StateTracker: update for frame {} ignored, frame {} is due.", frame, expected);
                return classification;
            }
        }

        let round = self.round.map(|round| round + 1).unwrap_or(0);
        self.round = Some(round);
        self.expected_frame = Some((frame + 1) % self.number_of_frames);

        for cid in active {
            let state = match self.history.get_mut(cid) {
                None => {
                    self.history.insert(cid.clone(), ConnectionHistory { phase: Phase::Candidate, last_active_round: round });
                    ConnectionState::Unpersistent
                }
                Some(history) => {
                    let consecutive = history.last_active_round + 1 == round;
                    history.last_active_round = round;

                    match (history.phase, consecutive) {
                        (Phase::Candidate, true) => {
                            history.phase = Phase::Persistent;
                            ConnectionState::NewPersistent
                        }
                        (Phase::Candidate, false) => ConnectionState::Unpersistent,
                        (Phase::Persistent, true) => ConnectionState::Persistent,
                        (Phase::Returning, true) => {
                            history.phase = Phase::Persistent;
                            ConnectionState::Reactivated
                        }
                        (Phase::Persistent, false) | (Phase::Silenced, _) | (Phase::Returning, false) => {
                            history.phase = Phase::Returning;
                            ConnectionState::Unpersistent
                        }
                    }
                }
            };

            classification.insert(cid, state);
        }

        for (cid, history) in self.history.iter_mut() {
            if active.contains(cid) || history.last_active_round + 1 != round {
                continue;
            }

            if matches!(history.phase, Phase::Persistent | Phase::Returning) {
                history.phase = Phase::Silenced;
                classification.insert(cid, ConnectionState::Silenced);
            }
        }

        log::trace!(
            "StateTracker round {} frame {}: {} new, {} reactivated, {} persistent, {} silenced, {} unpersistent",
            round,
            frame,
            classification.new_persistent.len(),
            classification.reactivated.len(),
            classification.persistent.len(),
            classification.silenced.len(),
            classification.unpersistent.len()
        );

        classification
    }

    /// Forgets everything about `cid`.
    pub fn teardown(&mut self, cid: &ConnectionId) -> bool {
        self.history.remove(cid).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<ConnectionId> {
        names.iter().map(|name| ConnectionId::new(*name)).collect()
    }

    #[test]
    fn test_candidate_with_gap_stays_unpersistent() {
        let mut tracker = StateTracker::new(4);
        let c = ConnectionId::new("C");

        assert_eq!(tracker.update_state(&set(&["C"]), 0).get_state(&c), Some(ConnectionState::Unpersistent));
        assert!(tracker.update_state(&set(&[]), 1).is_empty());
        assert_eq!(tracker.update_state(&set(&["C"]), 2).get_state(&c), Some(ConnectionState::Unpersistent));
        assert_eq!(tracker.update_state(&set(&["C"]), 3).get_state(&c), Some(ConnectionState::NewPersistent));
    }

    #[test]
    fn test_out_of_order_frame_is_ignored() {
        let mut tracker = StateTracker::new(3);

        tracker.update_state(&set(&["C"]), 0);
        assert!(tracker.update_state(&set(&["C"]), 2).is_empty());
        assert_eq!(tracker.get_expected_frame(), Some(1));
        assert_eq!(tracker.update_state(&set(&["C"]), 1).get_state(&ConnectionId::new("C")), Some(ConnectionState::NewPersistent));
    }
}
