use std::str::FromStr;

use crate::domain::scheduler::grouper::beamforming::BeamformingModel;
use crate::domain::scheduler::grouper::grouper_trait::Grouper;
use crate::domain::scheduler::grouper::heuristics::{DoAHeuristic, SinrHeuristic};
use crate::domain::scheduler::grouper::single_grouper::SingleGrouper;
use crate::domain::scheduler::grouper::tree_based_grouper::TreeBasedGrouper;
use crate::error::ConversionError;

/// Available spatial grouping algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrouperType {
    /// Every user alone, no SDMA.
    NoGrouping,
    /// Tree based grouping rated by throughput.
    TreeBasedSinr,
    /// Tree based grouping rated by angular separation.
    TreeBasedDoA,
}

impl GrouperType {
    /// Factory method to create a concrete Grouper.
    pub fn get_instance(&self, beamforming: BeamformingModel) -> Box<dyn Grouper> {
        match self {
            GrouperType::NoGrouping => Box::new(SingleGrouper::new(beamforming)),
            GrouperType::TreeBasedSinr => Box::new(TreeBasedGrouper::new(SinrHeuristic, beamforming)),
            GrouperType::TreeBasedDoA => Box::new(TreeBasedGrouper::new(DoAHeuristic, beamforming)),
        }
    }
}

impl FromStr for GrouperType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NoGrouping" | "SingleGrouper" => Ok(GrouperType::NoGrouping),
            "TreeBasedSINRHeuristic" | "SINRHeuristic" => Ok(GrouperType::TreeBasedSinr),
            "TreeBasedDoAHeuristic" | "DoAHeuristic" => Ok(GrouperType::TreeBasedDoA),
            _ => Err(ConversionError::UnknownGrouperType(s.to_string())),
        }
    }
}
