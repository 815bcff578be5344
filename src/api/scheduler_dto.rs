use serde::{Deserialize, Serialize};

use crate::domain::scheduler::apc::apc_type::ApcStrategyType;
use crate::domain::scheduler::dsa::dsa_type::DsaStrategyType;
use crate::domain::scheduler::grouper::beamforming::BeamformingModel;
use crate::domain::scheduler::grouper::grouper_type::GrouperType;
use crate::domain::scheduler::persistent::persistent_voip::PersistentVoipConfig;
use crate::domain::scheduler::request::{Direction, StrategyInput};
use crate::domain::scheduler::strategy::strategy_trait::Strategy;
use crate::domain::scheduler::strategy::strategy_type::{StrategyComponents, StrategyType};
use crate::domain::scheduler::strategy::sub_strategy::SubStrategyType;
use crate::domain::scheduler::utils::units::Ratio;
use crate::error::Result;

fn default_sub_strategy() -> String {
    "RoundRobin".to_string()
}

fn default_grouper() -> String {
    "NoGrouping".to_string()
}

fn default_dsa() -> String {
    "BestCapacity".to_string()
}

fn default_apc() -> String {
    "UseMaxTxPower".to_string()
}

fn default_direction() -> String {
    "downlink".to_string()
}

fn default_one() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamformingDto {
    pub beam_width_deg: f64,
    pub max_suppression_db: f64,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentDto {
    pub number_of_frames: usize,
    pub number_of_pdcch_resources: usize,
    #[serde(default)]
    pub voice_priority: usize,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerDto {
    pub strategy_typ: String,
    #[serde(default = "default_sub_strategy")]
    pub sub_strategy_typ: String,
    #[serde(default = "default_grouper")]
    pub grouper_typ: String,
    #[serde(default = "default_dsa")]
    pub dsa_typ: String,
    #[serde(default)]
    pub use_adjacent_sub_channels: bool,
    #[serde(default = "default_apc")]
    pub apc_typ: String,
    #[serde(default = "default_direction")]
    pub direction: String,
    pub num_sub_channels: usize,
    #[serde(default = "default_one")]
    pub num_time_slots: usize,
    #[serde(default = "default_one")]
    pub max_spatial_layers: usize,
    pub slot_length: f64,
    #[serde(default)]
    pub beamforming: Option<BeamformingDto>,
    #[serde(default)]
    pub persistent: Option<PersistentDto>,
}

impl SchedulerDto {
    pub fn get_input(&self) -> Result<StrategyInput> {
        let direction: Direction = self.direction.parse()?;

        let input = StrategyInput::new(self.num_sub_channels, self.max_spatial_layers, self.slot_length)
            .with_time_slots(self.num_time_slots)
            .with_direction(direction);
        input.validate()?;

        Ok(input)
    }

    pub fn get_beamforming(&self) -> BeamformingModel {
        match &self.beamforming {
            Some(dto) => BeamformingModel::new(dto.beam_width_deg.to_radians(), Ratio::from_db(dto.max_suppression_db)),
            None => BeamformingModel::default(),
        }
    }

    pub fn get_persistent_config(&self) -> PersistentVoipConfig {
        match &self.persistent {
            Some(dto) => PersistentVoipConfig {
                number_of_frames: dto.number_of_frames,
                number_of_pdcch_resources: dto.number_of_pdcch_resources,
                voice_priority: dto.voice_priority,
            },
            None => PersistentVoipConfig::default(),
        }
    }

    /// Resolves every plugin name and assembles the strategy. Unknown names are configuration errors.
    pub fn build_strategy(&self) -> Result<Box<dyn Strategy>> {
        let strategy_type: StrategyType = self.strategy_typ.parse()?;
        let sub_strategy: SubStrategyType = self.sub_strategy_typ.parse()?;
        let grouper_type: GrouperType = self.grouper_typ.parse()?;
        let dsa_type: DsaStrategyType = self.dsa_typ.parse()?;
        let apc_type: ApcStrategyType = self.apc_typ.parse()?;

        let components = StrategyComponents {
            sub_strategy,
            grouper: grouper_type.get_instance(self.get_beamforming()),
            dsa: dsa_type.get_instance(self.use_adjacent_sub_channels),
            apc: apc_type.get_instance(),
            persistent: self.get_persistent_config(),
            blocks_per_frame: self.num_sub_channels,
        };

        strategy_type.get_instance(components)
    }
}
