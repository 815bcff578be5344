use std::collections::BTreeSet;

use crate::domain::scheduler::apc::apc_trait::ApcStrategy;
use crate::domain::scheduler::dsa::dsa_trait::{DsaStrategy, fits_request};
use crate::domain::scheduler::grouper::grouper_trait::Grouper;
use crate::domain::scheduler::interfaces::harq::HarqInterface;
use crate::domain::scheduler::interfaces::queue::QueueInterface;
use crate::domain::scheduler::pdu::SharedPdu;
use crate::domain::scheduler::request::{ApcResult, DsaResult, RequestForResource, SchedulerState, StrategyInput};
use crate::domain::scheduler::scheduling_map::SchedulingMap;
use crate::domain::scheduler::scheduling_map::scheduled_compound::ScheduledCompound;
use crate::domain::scheduler::strategy::strategy_trait::{SchedulingEnvironment, Strategy, StrategyResult};
use crate::domain::scheduler::strategy::sub_strategy::SubStrategy;
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::statistics::RoundStatistics;
use crate::error::Result;

/// Asks APC for power and PHY mode of `request` on `resource`.
///
/// # Returns
/// The request bound to the resource, the APC proposal and its data rate, or `None` if no PHY mode
/// is decodable or the requested size does not fit the resource.
pub(crate) fn check_with_apc(
    request: &RequestForResource,
    resource: DsaResult,
    state: &SchedulerState,
    apc: &dyn ApcStrategy,
    map: &SchedulingMap,
) -> Option<(RequestForResource, ApcResult, f64)> {
    let request = request.clone().on_resource(resource);
    let apc_result = apc.do_start_apc(&request, state, map)?;

    let data_rate = state.registry.get_phy_mode_mapper().get_data_rate(&apc_result.phy_mode);
    if data_rate <= 0.0 || !map.can_carry(&resource, &request.user, &request.cid, Some(&apc_result.phy_mode), request.bits as f64 / data_rate) {
        return None;
    }

    Some((request, apc_result, data_rate))
}

fn place(
    request: &RequestForResource,
    apc_result: &ApcResult,
    data_rate: f64,
    pdu: SharedPdu,
    map: &mut SchedulingMap,
) -> Result<()> {
    let resource = DsaResult::new(request.sub_channel.unwrap_or(0), request.time_slot, request.spatial_layer);
    map.add_compound(&resource, &request.user, pdu, apc_result.phy_mode, data_rate, apc_result.tx_power, None, request.cand_i)?;

    Ok(())
}

/// Serves every priority class in turn (0 first): the sub-strategy picks a connection, DSA finds
/// a resource for its head-of-line unit and APC sets power and PHY mode. Pending HARQ
/// retransmissions go first.
#[derive(Debug)]
pub struct DsaDriven {
    sub_strategy: Box<dyn SubStrategy>,
    grouper: Box<dyn Grouper>,
    dsa: Box<dyn DsaStrategy>,
    apc: Box<dyn ApcStrategy>,
}

impl DsaDriven {
    pub fn new(sub_strategy: Box<dyn SubStrategy>, grouper: Box<dyn Grouper>, dsa: Box<dyn DsaStrategy>, apc: Box<dyn ApcStrategy>) -> Self {
        DsaDriven { sub_strategy, grouper, dsa, apc }
    }

    /// Retransmissions take the first resource that fits, in frequency-major order.
    fn schedule_retransmissions(
        &self,
        harq: &mut dyn HarqInterface,
        state: &SchedulerState,
        serviceable: &BTreeSet<UserId>,
        map: &mut SchedulingMap,
        statistics: &mut RoundStatistics,
    ) -> Result<()> {
        for retransmission in harq.get_pending_retransmissions() {
            if !serviceable.contains(&retransmission.user) {
                continue;
            }

            let priority = state.registry.get_priority_for_cid(&retransmission.cid);
            let request = RequestForResource::new(retransmission.user.clone(), retransmission.cid.clone(), priority, retransmission.pdu.bits);

            let Some(resource) = map.get_resources().find(|resource| fits_request(&request, state, map, resource)) else {
                log::debug!("DsaDriven: no resource left for HARQ process {} of {}.", retransmission.process, retransmission.user);
                continue;
            };

            let Some((request, apc_result, data_rate)) = check_with_apc(&request, resource, state, self.apc.as_ref(), map) else {
                continue;
            };

            place(&request, &apc_result, data_rate, retransmission.pdu.clone(), map)?;
            harq.retransmission_scheduled(&retransmission.user, retransmission.process);
            statistics.harq_grants += 1;
        }

        Ok(())
    }

    /// Places the head-of-line unit of `cid`.
    ///
    /// # Returns
    /// `Ok(false)` if the connection cannot be served any more this round.
    fn place_head_of_line(
        &mut self,
        cid: &ConnectionId,
        user: &UserId,
        state: &SchedulerState,
        queue: &mut dyn QueueInterface,
        map: &mut SchedulingMap,
    ) -> Result<bool> {
        let Some(bits) = queue.get_head_of_line_pdu_bits(cid) else {
            return Ok(false);
        };

        let request = RequestForResource::new(user.clone(), cid.clone(), state.current_priority, bits);

        let Some(resource) = self.dsa.get_sub_channel_with_dsa(&request, state, map) else {
            return Ok(false);
        };

        let Some((request, apc_result, data_rate)) = check_with_apc(&request, resource, state, self.apc.as_ref(), map) else {
            return Ok(false);
        };

        let Some(pdu) = queue.get_head_of_line_pdu(cid) else {
            return Ok(false);
        };

        place(&request, &apc_result, data_rate, pdu, map)?;

        Ok(true)
    }
}

impl Strategy for DsaDriven {
    fn do_start_scheduling(
        &mut self,
        input: &StrategyInput,
        env: &mut SchedulingEnvironment,
        callback: &mut dyn FnMut(&ScheduledCompound),
    ) -> Result<StrategyResult> {
        input.validate()?;

        let registry = env.registry;
        let state = SchedulerState::new(*input, registry);
        let mut map = SchedulingMap::from_input(input);
        let mut statistics = RoundStatistics::new(env.round, 0, env.time);

        let queued = registry.filter_reachable(env.queue.get_queued_users());
        let grouping = self.grouper.get_grouping(&state, &queued, 1);
        let serviceable = grouping.get_users();
        statistics.excluded_users = grouping.excluded.len();

        if let Some(harq) = env.harq.as_deref_mut() {
            self.schedule_retransmissions(harq, &state, &serviceable, &mut map, &mut statistics)?;
        }

        let mut served: BTreeSet<ConnectionId> = BTreeSet::new();

        for priority in 0..registry.get_number_of_priorities() {
            let state = state.with_priority(priority);

            let mut candidates: Vec<(ConnectionId, UserId)> = registry
                .get_connections_for_priority(priority)
                .into_iter()
                .filter(|cid| env.queue.queue_has_pdus(cid))
                .filter_map(|cid| registry.get_user_for_cid(&cid).map(|user| (cid, user)))
                .filter(|(_, user)| serviceable.contains(user))
                .collect();

            if candidates.is_empty() {
                continue;
            }

            self.dsa.initialize(&state, &*env.queue, &map);

            loop {
                let cids: Vec<ConnectionId> = candidates.iter().map(|(cid, _)| cid.clone()).collect();
                let Some(cid) = self.sub_strategy.select_connection(priority, &cids) else {
                    break;
                };

                let Some(position) = candidates.iter().position(|(candidate, _)| *candidate == cid) else {
                    break;
                };
                let user = candidates[position].1.clone();

                let placed = self.place_head_of_line(&cid, &user, &state, &mut *env.queue, &mut map)?;

                if placed {
                    served.insert(cid.clone());
                } else {
                    log::debug!("{}: {} cannot be served any more this round.", self.dsa.get_name(), cid);
                }

                if !placed || !env.queue.queue_has_pdus(&cid) {
                    candidates.remove(position);
                }
            }
        }

        statistics.dynamic_grants = served.len();
        self.apc.post_process(&state, &mut map);
        map.notify_compounds(callback);

        Ok(StrategyResult::from_map(map, statistics))
    }

    fn get_name(&self) -> &'static str {
        "DSADriven"
    }
}
