use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::domain::scheduler::grouper::grouping::Grouping;
use crate::domain::scheduler::request::{Direction, SchedulerState};
use crate::domain::scheduler::utils::id::UserId;

/// Partitions the active users of a round into co-scheduled spatial groups.
///
/// Implementations are pure functions of their inputs.
pub trait Grouper: Debug {
    fn get_tx_grouping(&self, state: &SchedulerState, users: &BTreeSet<UserId>, max_spatial_layers: usize) -> Grouping;

    fn get_rx_grouping(&self, state: &SchedulerState, users: &BTreeSet<UserId>, max_spatial_layers: usize) -> Grouping;

    /// Dispatches on the direction of `state`.
    fn get_grouping(&self, state: &SchedulerState, users: &BTreeSet<UserId>, max_spatial_layers: usize) -> Grouping {
        match state.input.direction {
            Direction::Downlink => self.get_tx_grouping(state, users, max_spatial_layers),
            Direction::Uplink => self.get_rx_grouping(state, users, max_spatial_layers),
        }
    }
}
