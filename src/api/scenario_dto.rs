use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::scheduler_dto::SchedulerDto;
use crate::domain::scheduler::channel_quality::PowerCapabilities;
use crate::domain::scheduler::phy::phy_mode::{Modulation, PhyMode};
use crate::domain::scheduler::phy::phy_mode_mapper::TablePhyModeMapper;
use crate::domain::scheduler::utils::units::{Power, Ratio};
use crate::domain::simulator::traffic::{TrafficModel, TrafficModelType};
use crate::error::Result;

fn default_one() -> usize {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerCapabilitiesDto {
    pub max_per_sub_channel_dbm: f64,
    pub nominal_per_sub_channel_dbm: f64,
    pub max_overall_dbm: f64,
}

impl PowerCapabilitiesDto {
    pub fn to_capabilities(&self) -> PowerCapabilities {
        PowerCapabilities::new(
            Power::from_dbm(self.max_per_sub_channel_dbm),
            Power::from_dbm(self.nominal_per_sub_channel_dbm),
            Power::from_dbm(self.max_overall_dbm),
        )
    }
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhyModeDto {
    pub modulation: Modulation,
    pub coding_rate: f64,
    pub min_sinr_db: f64,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhyModeTableDto {
    /// Modulation symbols per second on one subchannel.
    pub symbol_rate: f64,
    pub modes: Vec<PhyModeDto>,
}

impl PhyModeTableDto {
    pub fn to_mapper(&self) -> Result<TablePhyModeMapper> {
        let modes =
            self.modes.iter().map(|mode| (PhyMode::new(mode.modulation, mode.coding_rate), Ratio::from_db(mode.min_sinr_db))).collect();

        TablePhyModeMapper::new(self.symbol_rate, modes)
    }
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub pathloss_db: f64,
    pub interference_dbm: f64,
    /// Distance to the station in meters.
    pub distance: f64,
    #[serde(default)]
    pub azimuth_deg: f64,
    pub power: PowerCapabilitiesDto,
    #[serde(default = "default_true")]
    pub reachable: bool,
    #[serde(default)]
    pub sub_channel_interference_dbm: BTreeMap<usize, f64>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficDto {
    pub typ: String,
    #[serde(default)]
    pub bits_per_round: u32,
    #[serde(default)]
    pub pdu_size: u32,
    #[serde(default)]
    pub frame_bits: u32,
    #[serde(default)]
    pub mean_talk_rounds: f64,
    #[serde(default)]
    pub mean_silence_rounds: f64,
}

impl TrafficDto {
    pub fn to_model(&self) -> Result<TrafficModel> {
        let model = match self.typ.parse::<TrafficModelType>()? {
            TrafficModelType::ConstantBitRate => TrafficModel::ConstantBitRate { bits_per_round: self.bits_per_round, pdu_size: self.pdu_size },
            TrafficModelType::Voice => TrafficModel::Voice {
                frame_bits: self.frame_bits,
                mean_talk_rounds: self.mean_talk_rounds,
                mean_silence_rounds: self.mean_silence_rounds,
            },
        };

        Ok(model)
    }
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDto {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub priority: usize,
    pub traffic: TrafficDto,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationDto {
    pub rounds: u64,
    #[serde(default)]
    pub seed: u64,
    /// Simulated time per round in seconds.
    pub frame_duration: f64,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub station: PowerCapabilitiesDto,
    pub phy_modes: PhyModeTableDto,
    #[serde(default = "default_one")]
    pub number_of_priorities: usize,
    pub users: Vec<UserDto>,
    pub connections: Vec<ConnectionDto>,
    pub simulation: SimulationDto,
    pub scheduler: SchedulerDto,
}
