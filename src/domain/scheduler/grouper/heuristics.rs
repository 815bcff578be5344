use std::f64::consts::PI;
use std::fmt::Debug;

use crate::domain::scheduler::grouper::beamforming::angular_separation;
use crate::domain::scheduler::grouper::grouping::Group;

/// A candidate group with its estimated performance.
#[derive(Debug, Clone)]
pub struct GroupEvaluation {
    pub group: Group,

    /// Sum of the data rates of all members at their best PHY mode.
    pub throughput: f64,

    /// Directions of arrival of the members, in member order.
    pub azimuths: Vec<f64>,
}

/// Rates how desirable a merged group is. Higher is better.
pub trait GroupingHeuristic: Debug {
    fn get_utility(&self, candidate: &GroupEvaluation) -> f64;

    fn get_name(&self) -> &'static str;
}

/// Prefers merges with the highest SINR-weighted throughput sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinrHeuristic;

impl GroupingHeuristic for SinrHeuristic {
    fn get_utility(&self, candidate: &GroupEvaluation) -> f64 {
        candidate.throughput
    }

    fn get_name(&self) -> &'static str {
        "SINRHeuristic"
    }
}

/// Prefers merges whose members are angularly far apart; the closest pair of the group
/// determines the utility.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoAHeuristic;

impl GroupingHeuristic for DoAHeuristic {
    fn get_utility(&self, candidate: &GroupEvaluation) -> f64 {
        let mut min_separation = PI;

        for (i, a) in candidate.azimuths.iter().enumerate() {
            for b in candidate.azimuths.iter().skip(i + 1) {
                min_separation = min_separation.min(angular_separation(*a, *b));
            }
        }

        min_separation
    }

    fn get_name(&self) -> &'static str {
        "DoAHeuristic"
    }
}
