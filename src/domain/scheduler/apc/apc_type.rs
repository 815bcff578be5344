use std::str::FromStr;

use crate::domain::scheduler::apc::apc_trait::ApcStrategy;
use crate::domain::scheduler::apc::use_max_tx_power::UseMaxTxPower;
use crate::error::ConversionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApcStrategyType {
    UseMaxTxPower,
}

impl ApcStrategyType {
    /// Factory method to create a concrete APC strategy.
    pub fn get_instance(&self) -> Box<dyn ApcStrategy> {
        match self {
            ApcStrategyType::UseMaxTxPower => Box::new(UseMaxTxPower::new()),
        }
    }
}

impl FromStr for ApcStrategyType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UseMaxTxPower" => Ok(ApcStrategyType::UseMaxTxPower),
            _ => Err(ConversionError::UnknownApcStrategyType(s.to_string())),
        }
    }
}
