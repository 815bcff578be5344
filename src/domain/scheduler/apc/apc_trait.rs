use std::fmt::Debug;

use crate::domain::scheduler::request::{ApcResult, RequestForResource, SchedulerState};
use crate::domain::scheduler::scheduling_map::SchedulingMap;

/// Adaptive power control: transmit power and PHY mode for a granted resource.
pub trait ApcStrategy: Debug {
    /// `request` must already point at the granted resource. `None` if no PHY mode is decodable.
    fn do_start_apc(&self, request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap) -> Option<ApcResult>;

    /// Runs once after every request of the round was granted.
    fn post_process(&self, _state: &SchedulerState, _map: &mut SchedulingMap) {}

    fn get_name(&self) -> &'static str;
}
