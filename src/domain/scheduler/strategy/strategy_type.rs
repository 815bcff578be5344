use std::str::FromStr;

use crate::domain::scheduler::apc::apc_trait::ApcStrategy;
use crate::domain::scheduler::dsa::dsa_trait::DsaStrategy;
use crate::domain::scheduler::grouper::grouper_trait::Grouper;
use crate::domain::scheduler::persistent::persistent_voip::{PersistentVoIP, PersistentVoipConfig};
use crate::domain::scheduler::strategy::dsa_driven::DsaDriven;
use crate::domain::scheduler::strategy::grouped_round_robin::GroupedRoundRobin;
use crate::domain::scheduler::strategy::strategy_trait::Strategy;
use crate::domain::scheduler::strategy::sub_strategy::SubStrategyType;
use crate::error::{ConversionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyType {
    DsaDriven,
    EqualTimeRR,
    RoundRobinUL,
    PersistentVoIP,
}

/// Plugins a strategy is assembled from. Each strategy takes the parts it needs.
#[derive(Debug)]
pub struct StrategyComponents {
    pub sub_strategy: SubStrategyType,
    pub grouper: Box<dyn Grouper>,
    pub dsa: Box<dyn DsaStrategy>,
    pub apc: Box<dyn ApcStrategy>,
    pub persistent: PersistentVoipConfig,

    /// Resource blocks per frame of the persistent grid, one per subchannel.
    pub blocks_per_frame: usize,
}

impl StrategyType {
    /// Factory method to create a concrete Strategy.
    pub fn get_instance(&self, components: StrategyComponents) -> Result<Box<dyn Strategy>> {
        let StrategyComponents { sub_strategy, grouper, dsa, apc, persistent, blocks_per_frame } = components;

        let strategy: Box<dyn Strategy> = match self {
            StrategyType::DsaDriven => Box::new(DsaDriven::new(sub_strategy.get_instance(), grouper, dsa, apc)),
            StrategyType::EqualTimeRR => Box::new(GroupedRoundRobin::equal_time_rr(grouper, apc)),
            StrategyType::RoundRobinUL => Box::new(GroupedRoundRobin::round_robin_ul(grouper, apc)),
            StrategyType::PersistentVoIP => Box::new(PersistentVoIP::new(persistent, blocks_per_frame, apc)?),
        };

        log::info!("Created scheduling strategy {}.", strategy.get_name());

        Ok(strategy)
    }
}

impl FromStr for StrategyType {
    type Err = ConversionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DSADriven" | "DsaDriven" => Ok(StrategyType::DsaDriven),
            "EqualTimeRR" => Ok(StrategyType::EqualTimeRR),
            "RoundRobinUL" => Ok(StrategyType::RoundRobinUL),
            "PersistentVoIP" => Ok(StrategyType::PersistentVoIP),
            _ => Err(ConversionError::UnknownStrategyType(s.to_string())),
        }
    }
}
