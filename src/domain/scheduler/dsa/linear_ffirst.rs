use crate::domain::scheduler::dsa::dsa_trait::{DsaStrategy, fits_request};
use crate::domain::scheduler::request::{DsaResult, RequestForResource, SchedulerState};
use crate::domain::scheduler::scheduling_map::SchedulingMap;

/// First fit in frequency-major order.
#[derive(Debug, Clone, Default)]
pub struct LinearFFirst;

impl LinearFFirst {
    pub fn new() -> Self {
        LinearFFirst
    }
}

impl DsaStrategy for LinearFFirst {
    fn get_sub_channel_with_dsa(&mut self, request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap) -> Option<DsaResult> {
        let found = map.get_resources().find(|resource| fits_request(request, state, map, resource));

        if found.is_none() {
            log::debug!("LinearFFirst: no resource left for {} ({} bits).", request.cid, request.bits);
        }

        found
    }

    fn get_name(&self) -> &'static str {
        "LinearFFirst"
    }
}
