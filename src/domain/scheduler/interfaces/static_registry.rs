use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::scheduler::channel_quality::{ChannelQualityOnPathloss, PowerCapabilities};
use crate::domain::scheduler::interfaces::registry::RegistryProxy;
use crate::domain::scheduler::phy::phy_mode_mapper::{PhyModeMapper, TablePhyModeMapper};
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::units::{Power, Ratio};
use crate::error::{Error, Result};

/// Static description of one user as known to the registry.
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub pathloss: Ratio,
    pub interference: Power,
    pub distance: f64,
    pub azimuth: f64,
    pub power_capabilities: PowerCapabilities,
    pub reachable: bool,

    /// Interference values that differ from `interference` on individual subchannels.
    pub sub_channel_interference: HashMap<usize, Power>,
}

impl UserEntry {
    pub fn new(pathloss: Ratio, interference: Power, distance: f64, azimuth: f64, power_capabilities: PowerCapabilities) -> Self {
        UserEntry { pathloss, interference, distance, azimuth, power_capabilities, reachable: true, sub_channel_interference: HashMap::new() }
    }

    pub fn with_sub_channel_interference(mut self, sub_channel: usize, interference: Power) -> Self {
        self.sub_channel_interference.insert(sub_channel, interference);
        self
    }
}

#[derive(Debug, Clone)]
struct ConnectionEntry {
    user: UserId,
    priority: usize,
}

/// Registry with fixed channel estimates, the reference implementation used by the simulator and the tests.
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    users: BTreeMap<UserId, UserEntry>,
    connections: BTreeMap<ConnectionId, ConnectionEntry>,
    station_power: PowerCapabilities,
    phy_mode_mapper: TablePhyModeMapper,
    number_of_priorities: usize,
}

impl StaticRegistry {
    pub fn new(station_power: PowerCapabilities, phy_mode_mapper: TablePhyModeMapper, number_of_priorities: usize) -> Self {
        StaticRegistry {
            users: BTreeMap::new(),
            connections: BTreeMap::new(),
            station_power,
            phy_mode_mapper,
            number_of_priorities: number_of_priorities.max(1),
        }
    }

    pub fn add_user(&mut self, user: UserId, entry: UserEntry) {
        self.users.insert(user, entry);
    }

    pub fn add_connection(&mut self, cid: ConnectionId, user: UserId, priority: usize) -> Result<()> {
        if !self.users.contains_key(&user) {
            return Err(Error::ConfigurationError(format!("Connection {} refers to unknown user {}", cid, user)));
        }

        if priority >= self.number_of_priorities {
            return Err(Error::ConfigurationError(format!(
                "Connection {} has priority {} but only {} priorities are configured",
                cid, priority, self.number_of_priorities
            )));
        }

        self.connections.insert(cid, ConnectionEntry { user, priority });
        Ok(())
    }

    pub fn get_user_entry_mut(&mut self, user: &UserId) -> Option<&mut UserEntry> {
        self.users.get_mut(user)
    }

    pub fn get_users(&self) -> impl Iterator<Item = &UserId> {
        self.users.keys()
    }

    fn estimate(&self, user: &UserId, sub_channel: Option<usize>, nominal: Power) -> Option<ChannelQualityOnPathloss> {
        let entry = self.users.get(user)?;

        let interference = sub_channel.and_then(|index| entry.sub_channel_interference.get(&index).copied()).unwrap_or(entry.interference);

        Some(ChannelQualityOnPathloss::new(entry.pathloss, interference, nominal / entry.pathloss))
    }
}

impl RegistryProxy for StaticRegistry {
    fn get_user_for_cid(&self, cid: &ConnectionId) -> Option<UserId> {
        self.connections.get(cid).map(|entry| entry.user.clone())
    }

    fn get_priority_for_cid(&self, cid: &ConnectionId) -> usize {
        match self.connections.get(cid) {
            Some(entry) => entry.priority,
            None => {
                log::warn!("Priority of unknown connection {} requested, using lowest priority.", cid);
                self.number_of_priorities - 1
            }
        }
    }

    fn get_number_of_priorities(&self) -> usize {
        self.number_of_priorities
    }

    fn get_connections_for_priority(&self, priority: usize) -> Vec<ConnectionId> {
        self.connections.iter().filter(|(_, entry)| entry.priority == priority).map(|(cid, _)| cid.clone()).collect()
    }

    fn estimate_tx_sinr_at(&self, user: &UserId) -> Option<ChannelQualityOnPathloss> {
        self.estimate(user, None, self.station_power.nominal_per_subchannel)
    }

    fn estimate_tx_sinr_on(&self, user: &UserId, sub_channel: usize) -> Option<ChannelQualityOnPathloss> {
        self.estimate(user, Some(sub_channel), self.station_power.nominal_per_subchannel)
    }

    fn estimate_rx_sinr_of(&self, user: &UserId) -> Option<ChannelQualityOnPathloss> {
        let nominal = self.users.get(user)?.power_capabilities.nominal_per_subchannel;
        self.estimate(user, None, nominal)
    }

    fn estimate_rx_sinr_on(&self, user: &UserId, sub_channel: usize) -> Option<ChannelQualityOnPathloss> {
        let nominal = self.users.get(user)?.power_capabilities.nominal_per_subchannel;
        self.estimate(user, Some(sub_channel), nominal)
    }

    fn get_power_capabilities(&self, user: Option<&UserId>) -> PowerCapabilities {
        match user.and_then(|user| self.users.get(user)) {
            Some(entry) => entry.power_capabilities,
            None => self.station_power,
        }
    }

    fn get_phy_mode_mapper(&self) -> &dyn PhyModeMapper {
        &self.phy_mode_mapper
    }

    fn filter_reachable(&self, users: BTreeSet<UserId>) -> BTreeSet<UserId> {
        users.into_iter().filter(|user| self.users.get(user).is_some_and(|entry| entry.reachable)).collect()
    }

    fn get_distance(&self, user: &UserId) -> f64 {
        self.users.get(user).map(|entry| entry.distance).unwrap_or(0.0)
    }

    fn get_azimuth(&self, user: &UserId) -> f64 {
        self.users.get(user).map(|entry| entry.azimuth).unwrap_or(0.0)
    }
}
