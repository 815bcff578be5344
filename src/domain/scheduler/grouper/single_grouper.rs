use std::collections::BTreeSet;

use crate::domain::scheduler::grouper::beamforming::BeamformingModel;
use crate::domain::scheduler::grouper::grouper_trait::Grouper;
use crate::domain::scheduler::grouper::grouping::Grouping;
use crate::domain::scheduler::grouper::tree_based_grouper::GroupEvaluator;
use crate::domain::scheduler::request::{Direction, SchedulerState};
use crate::domain::scheduler::utils::id::UserId;

/// No SDMA: every serviceable user forms its own group.
#[derive(Debug, Clone, Default)]
pub struct SingleGrouper {
    beamforming: BeamformingModel,
}

impl SingleGrouper {
    pub fn new(beamforming: BeamformingModel) -> Self {
        SingleGrouper { beamforming }
    }

    fn group(&self, state: &SchedulerState, users: &BTreeSet<UserId>, direction: Direction) -> Grouping {
        let evaluator = GroupEvaluator::new(state, direction, &self.beamforming);
        let (targets, excluded) = evaluator.get_serviceable_targets(users);

        let groups = targets.iter().filter_map(|target| evaluator.evaluate(&[target])).map(|evaluation| evaluation.group).collect();

        Grouping::new(groups, excluded, 1.0)
    }
}

impl Grouper for SingleGrouper {
    fn get_tx_grouping(&self, state: &SchedulerState, users: &BTreeSet<UserId>, _max_spatial_layers: usize) -> Grouping {
        self.group(state, users, Direction::Downlink)
    }

    fn get_rx_grouping(&self, state: &SchedulerState, users: &BTreeSet<UserId>, _max_spatial_layers: usize) -> Grouping {
        self.group(state, users, Direction::Uplink)
    }
}
