use std::str::FromStr;

use crate::domain::scheduler::dsa::best_capacity::BestCapacity;
use crate::domain::scheduler::dsa::dsa_trait::DsaStrategy;
use crate::domain::scheduler::dsa::far_first::FarFirst;
use crate::domain::scheduler::dsa::linear_ffirst::LinearFFirst;
use crate::error::ConversionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsaStrategyType {
    BestCapacity,
    FarFirst,
    LinearFFirst,
}

impl DsaStrategyType {
    /// Factory method to create a concrete DSA strategy.
    ///
    /// `use_adjacent_sub_channels` only affects strategies that support SC-FDMA uplink search.
    pub fn get_instance(&self, use_adjacent_sub_channels: bool) -> Box<dyn DsaStrategy> {
        match self {
            DsaStrategyType::BestCapacity => Box::new(BestCapacity::new(use_adjacent_sub_channels)),
            DsaStrategyType::FarFirst => Box::new(FarFirst::new()),
            DsaStrategyType::LinearFFirst => Box::new(LinearFFirst::new()),
        }
    }
}

impl FromStr for DsaStrategyType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BestCapacity" => Ok(DsaStrategyType::BestCapacity),
            "FarFirst" => Ok(DsaStrategyType::FarFirst),
            "LinearFFirst" => Ok(DsaStrategyType::LinearFFirst),
            _ => Err(ConversionError::UnknownDsaStrategyType(s.to_string())),
        }
    }
}
