use std::fmt::Debug;

use crate::domain::scheduler::interfaces::queue::QueueInterface;
use crate::domain::scheduler::request::{DsaResult, RequestForResource, SchedulerState};
use crate::domain::scheduler::scheduling_map::SchedulingMap;
use crate::domain::scheduler::scheduling_map::physical_resource_block::TIME_EPSILON;

/// Dynamic subchannel assignment: finds a resource unit of the scheduling map for one request.
pub trait DsaStrategy: Debug {
    /// Called once per priority pass of a round, before the first request.
    fn initialize(&mut self, _state: &SchedulerState, _queue: &dyn QueueInterface, _map: &SchedulingMap) {}

    /// Returns a resource that can carry `request`, or `None` if the map has none left.
    /// Never modifies the map, placing the data is up to the caller.
    fn get_sub_channel_with_dsa(&mut self, request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap) -> Option<DsaResult>;

    fn get_name(&self) -> &'static str;
}

/// Data rate `request` would reach on `resource` with nominal power, `None` if no PHY mode is decodable.
pub fn get_data_rate_on(request: &RequestForResource, state: &SchedulerState, resource: &DsaResult) -> Option<f64> {
    let mapper = state.registry.get_phy_mode_mapper();

    let phy_mode = match request.predefined_phy_mode {
        Some(phy_mode) => phy_mode,
        None => {
            let sinr = match &request.cand_i {
                Some(cand_i) => cand_i.get_sinr(),
                None => state.estimate(&request.user, Some(resource.sub_channel))?.get_sinr(),
            };
            mapper.get_best_phy_mode(sinr)?
        }
    };

    let data_rate = mapper.get_data_rate(&phy_mode);
    if data_rate > 0.0 { Some(data_rate) } else { None }
}

/// Achievable bits on `resource`: data rate times the time still free.
pub fn get_capacity(request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap, resource: &DsaResult) -> f64 {
    match get_data_rate_on(request, state, resource) {
        Some(data_rate) => data_rate * map.get_free_time(resource),
        None => 0.0,
    }
}

/// Whether `resource` is free (or owned by the requesting connection) and the requested size fits.
pub fn fits_request(request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap, resource: &DsaResult) -> bool {
    if !map.is_usable_for(resource, &request.user, &request.cid) {
        return false;
    }

    let Some(data_rate) = get_data_rate_on(request, state, resource) else {
        return false;
    };

    request.bits as f64 / data_rate <= map.get_free_time(resource) + TIME_EPSILON
}
