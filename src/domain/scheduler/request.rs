use std::str::FromStr;

use crate::domain::scheduler::channel_quality::{CandI, ChannelQualityOnPathloss, PowerCapabilities};
use crate::domain::scheduler::interfaces::registry::RegistryProxy;
use crate::domain::scheduler::phy::phy_mode::PhyMode;
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::units::{Power, Ratio};
use crate::error::{ConversionError, Error, Result};

/// Transmit direction of the scheduling station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Station transmits (Tx scheduling).
    Downlink,
    /// Users transmit, the station assigns the grants (Rx scheduling).
    Uplink,
}

impl FromStr for Direction {
    type Err = ConversionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "downlink" | "Downlink" | "tx" => Ok(Direction::Downlink),
            "uplink" | "Uplink" | "rx" => Ok(Direction::Uplink),
            _ => Err(ConversionError::UnknownDirection(s.to_string())),
        }
    }
}

/// Shape of the resource grid of one scheduling round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyInput {
    pub num_sub_channels: usize,
    pub num_time_slots: usize,
    pub max_spatial_layers: usize,

    /// Duration of one time slot in seconds.
    pub slot_length: f64,

    pub direction: Direction,
}

impl StrategyInput {
    pub fn new(num_sub_channels: usize, max_spatial_layers: usize, slot_length: f64) -> Self {
        StrategyInput { num_sub_channels, num_time_slots: 1, max_spatial_layers, slot_length, direction: Direction::Downlink }
    }

    pub fn with_time_slots(mut self, num_time_slots: usize) -> Self {
        self.num_time_slots = num_time_slots;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_sub_channels == 0 || self.num_time_slots == 0 || self.max_spatial_layers == 0 {
            return Err(Error::ConfigurationError(format!(
                "Scheduling grid needs at least one subchannel, time slot and spatial layer, got {}x{}x{}",
                self.num_sub_channels, self.num_time_slots, self.max_spatial_layers
            )));
        }

        if !(self.slot_length > 0.0) {
            return Err(Error::ConfigurationError(format!("Slot length must be positive, got {}", self.slot_length)));
        }

        Ok(())
    }

    /// Number of resource units (subchannel x time slot x spatial layer).
    pub fn get_resource_count(&self) -> usize {
        self.num_sub_channels * self.num_time_slots * self.max_spatial_layers
    }
}

/// Round-wide scheduler state handed to the DSA and APC plugins.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerState<'a> {
    pub input: StrategyInput,
    pub registry: &'a dyn RegistryProxy,

    /// Priority class currently being served.
    pub current_priority: usize,
}

impl<'a> SchedulerState<'a> {
    pub fn new(input: StrategyInput, registry: &'a dyn RegistryProxy) -> Self {
        SchedulerState { input, registry, current_priority: 0 }
    }

    pub fn with_priority(mut self, priority: usize) -> Self {
        self.current_priority = priority;
        self
    }

    /// Channel estimate of `user` in the scheduled direction, optionally restricted to one subchannel.
    pub fn estimate(&self, user: &UserId, sub_channel: Option<usize>) -> Option<ChannelQualityOnPathloss> {
        match (self.input.direction, sub_channel) {
            (Direction::Downlink, Some(index)) => self.registry.estimate_tx_sinr_on(user, index),
            (Direction::Downlink, None) => self.registry.estimate_tx_sinr_at(user),
            (Direction::Uplink, Some(index)) => self.registry.estimate_rx_sinr_on(user, index),
            (Direction::Uplink, None) => self.registry.estimate_rx_sinr_of(user),
        }
    }

    /// Power capabilities of the transmitting device for `user`'s link.
    pub fn get_transmitter_power(&self, user: &UserId) -> PowerCapabilities {
        match self.input.direction {
            Direction::Downlink => self.registry.get_power_capabilities(None),
            Direction::Uplink => self.registry.get_power_capabilities(Some(user)),
        }
    }
}

/// Demand of one connection for radio resources.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestForResource {
    pub user: UserId,
    pub cid: ConnectionId,
    pub priority: usize,

    /// Size of the unit that has to fit.
    pub bits: u32,

    /// Power fixed beforehand, e.g. by a master scheduler.
    pub predefined_power: Option<Power>,

    /// PHY mode fixed beforehand, e.g. for a retransmission.
    pub predefined_phy_mode: Option<PhyMode>,

    /// Carrier and interference estimate from the spatial grouping.
    pub cand_i: Option<CandI>,

    /// Resource the request was granted on, set once DSA succeeded.
    pub sub_channel: Option<usize>,
    pub time_slot: usize,
    pub spatial_layer: usize,
}

impl RequestForResource {
    pub fn new(user: UserId, cid: ConnectionId, priority: usize, bits: u32) -> Self {
        RequestForResource {
            user,
            cid,
            priority,
            bits,
            predefined_power: None,
            predefined_phy_mode: None,
            cand_i: None,
            sub_channel: None,
            time_slot: 0,
            spatial_layer: 0,
        }
    }

    pub fn on_resource(mut self, resource: DsaResult) -> Self {
        self.sub_channel = Some(resource.sub_channel);
        self.time_slot = resource.time_slot;
        self.spatial_layer = resource.spatial_layer;
        self
    }
}

/// A resource unit found by dynamic subchannel assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DsaResult {
    pub sub_channel: usize,
    pub time_slot: usize,
    pub spatial_layer: usize,
}

impl DsaResult {
    pub fn new(sub_channel: usize, time_slot: usize, spatial_layer: usize) -> Self {
        DsaResult { sub_channel, time_slot, spatial_layer }
    }
}

/// Transmit power and PHY mode proposed by adaptive power control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApcResult {
    pub tx_power: Power,
    pub phy_mode: PhyMode,
    pub sinr: Ratio,
}
