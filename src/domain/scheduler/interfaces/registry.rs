use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::domain::scheduler::channel_quality::{ChannelQualityOnPathloss, PowerCapabilities};
use crate::domain::scheduler::phy::phy_mode_mapper::PhyModeMapper;
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};

/// Read-only view on the layer-2 registry: connection bookkeeping, channel estimates and device capabilities.
pub trait RegistryProxy: Debug {
    fn get_user_for_cid(&self, cid: &ConnectionId) -> Option<UserId>;

    /// Priority class of `cid`, 0 is the highest priority.
    fn get_priority_for_cid(&self, cid: &ConnectionId) -> usize;

    fn get_number_of_priorities(&self) -> usize;

    /// All registered connections of a priority class in ascending id order.
    fn get_connections_for_priority(&self, priority: usize) -> Vec<ConnectionId>;

    /// Downlink estimate at `user` for the nominal station power. `None` if nothing is known about the user.
    fn estimate_tx_sinr_at(&self, user: &UserId) -> Option<ChannelQualityOnPathloss>;

    /// Downlink estimate restricted to one subchannel.
    fn estimate_tx_sinr_on(&self, user: &UserId, _sub_channel: usize) -> Option<ChannelQualityOnPathloss> {
        self.estimate_tx_sinr_at(user)
    }

    /// Uplink estimate of `user` as seen by the station.
    fn estimate_rx_sinr_of(&self, user: &UserId) -> Option<ChannelQualityOnPathloss>;

    fn estimate_rx_sinr_on(&self, user: &UserId, _sub_channel: usize) -> Option<ChannelQualityOnPathloss> {
        self.estimate_rx_sinr_of(user)
    }

    /// Capabilities of `user`, or of the station itself for `None`.
    fn get_power_capabilities(&self, user: Option<&UserId>) -> PowerCapabilities;

    fn get_phy_mode_mapper(&self) -> &dyn PhyModeMapper;

    /// Keeps only the users the station can currently reach.
    fn filter_reachable(&self, users: BTreeSet<UserId>) -> BTreeSet<UserId>;

    /// Distance between `user` and the serving station in meters.
    fn get_distance(&self, user: &UserId) -> f64;

    /// Direction of arrival of `user` in radians, seen from the station.
    fn get_azimuth(&self, user: &UserId) -> f64;
}
