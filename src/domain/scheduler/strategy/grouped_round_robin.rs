use std::collections::VecDeque;
use std::ops::Range;

use crate::domain::scheduler::apc::apc_trait::ApcStrategy;
use crate::domain::scheduler::grouper::grouper_trait::Grouper;
use crate::domain::scheduler::grouper::grouping::GroupMember;
use crate::domain::scheduler::interfaces::queue::QueueInterface;
use crate::domain::scheduler::request::{DsaResult, RequestForResource, SchedulerState, StrategyInput};
use crate::domain::scheduler::scheduling_map::SchedulingMap;
use crate::domain::scheduler::scheduling_map::scheduled_compound::ScheduledCompound;
use crate::domain::scheduler::strategy::strategy_trait::{SchedulingEnvironment, Strategy, StrategyResult};
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::statistics::RoundStatistics;
use crate::error::Result;

/// How the resources of a round are split between the spatial groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePartition {
    /// Equal shares of the time slots, every group gets all subchannels (`EqualTimeRR`).
    EqualTime,
    /// Contiguous subchannel blocks over all time slots (`RoundRobinUL`, SC-FDMA friendly).
    ContiguousSubChannels,
}

/// Splits `units` into `parts` contiguous ranges, the first ranges take the remainder.
fn split(units: usize, parts: usize) -> Vec<Range<usize>> {
    if parts == 0 {
        return Vec::new();
    }

    let base = units / parts;
    let remainder = units % parts;
    let mut start = 0;

    (0..parts)
        .map(|part| {
            let size = base + usize::from(part < remainder);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

/// Round robin over SDMA groups.
///
/// The grouper partitions the queued users; the groups are served in turn, starting where the last
/// round stopped. Members of a group share the group's resources on distinct spatial layers and
/// every resource unit carries data of a single connection.
#[derive(Debug)]
pub struct GroupedRoundRobin {
    partition: ResourcePartition,
    grouper: Box<dyn Grouper>,
    apc: Box<dyn ApcStrategy>,

    /// Group the next round starts with.
    next_group: usize,
}

impl GroupedRoundRobin {
    pub fn new(partition: ResourcePartition, grouper: Box<dyn Grouper>, apc: Box<dyn ApcStrategy>) -> Self {
        GroupedRoundRobin { partition, grouper, apc, next_group: 0 }
    }

    pub fn equal_time_rr(grouper: Box<dyn Grouper>, apc: Box<dyn ApcStrategy>) -> Self {
        GroupedRoundRobin::new(ResourcePartition::EqualTime, grouper, apc)
    }

    pub fn round_robin_ul(grouper: Box<dyn Grouper>, apc: Box<dyn ApcStrategy>) -> Self {
        GroupedRoundRobin::new(ResourcePartition::ContiguousSubChannels, grouper, apc)
    }

    pub fn get_partition(&self) -> ResourcePartition {
        self.partition
    }

    /// Resources of `share` on `spatial_layer`, subchannel-major.
    fn get_resources(&self, input: &StrategyInput, share: &Range<usize>, spatial_layer: usize) -> Vec<DsaResult> {
        let mut resources = Vec::new();

        match self.partition {
            ResourcePartition::EqualTime => {
                for sub_channel in 0..input.num_sub_channels {
                    for time_slot in share.clone() {
                        resources.push(DsaResult::new(sub_channel, time_slot, spatial_layer));
                    }
                }
            }
            ResourcePartition::ContiguousSubChannels => {
                for sub_channel in share.clone() {
                    for time_slot in 0..input.num_time_slots {
                        resources.push(DsaResult::new(sub_channel, time_slot, spatial_layer));
                    }
                }
            }
        }

        resources
    }

    /// Drains the queues of `user` into `resources`, one connection per resource.
    #[allow(clippy::too_many_arguments)]
    fn serve_member(
        &self,
        user: &UserId,
        member: &GroupMember,
        resources: &[DsaResult],
        state: &SchedulerState,
        queue: &mut dyn QueueInterface,
        map: &mut SchedulingMap,
    ) -> Result<usize> {
        let registry = state.registry;
        let mapper = registry.get_phy_mode_mapper();

        let mut connections: Vec<ConnectionId> = queue.get_connections_for_user(user).into_iter().filter(|cid| queue.queue_has_pdus(cid)).collect();
        connections.sort_by_key(|cid| (registry.get_priority_for_cid(cid), cid.clone()));
        let mut connections: VecDeque<ConnectionId> = connections.into();

        let mut placed = 0;

        for resource in resources {
            while connections.front().is_some_and(|cid| !queue.queue_has_pdus(cid)) {
                connections.pop_front();
            }

            let Some(cid) = connections.front().cloned() else {
                break;
            };

            let Some(bits) = queue.get_head_of_line_pdu_bits(&cid) else {
                continue;
            };

            let mut request = RequestForResource::new(user.clone(), cid.clone(), registry.get_priority_for_cid(&cid), bits).on_resource(*resource);
            request.cand_i = Some(member.cand_i);

            let Some(apc_result) = self.apc.do_start_apc(&request, state, map) else {
                log::debug!("{} is excluded this round, no PHY mode fits its SINR inside the group.", user);
                return Ok(placed);
            };

            let data_rate = mapper.get_data_rate(&apc_result.phy_mode);
            let mut placed_here = 0;

            while let Some(bits) = queue.get_head_of_line_pdu_bits(&cid) {
                if data_rate <= 0.0 || !map.can_carry(resource, user, &cid, Some(&apc_result.phy_mode), bits as f64 / data_rate) {
                    break;
                }

                let Some(pdu) = queue.get_head_of_line_pdu(&cid) else {
                    break;
                };

                map.add_compound(resource, user, pdu, apc_result.phy_mode, data_rate, apc_result.tx_power, Some(member.pattern), Some(member.cand_i))?;
                placed_here += 1;
            }

            if placed_here == 0 {
                log::debug!("Head-of-line unit of {} ({} bits) exceeds a whole resource, skipped this round.", cid, bits);
                connections.pop_front();
            }

            placed += placed_here;
        }

        Ok(placed)
    }
}

impl Strategy for GroupedRoundRobin {
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

        let users = registry.filter_reachable(env.queue.get_queued_users());
        let grouping = self.grouper.get_grouping(&state, &users, input.max_spatial_layers);
        statistics.excluded_users = grouping.excluded.len();

        debug_assert!(grouping.is_valid(input.max_spatial_layers), "grouper produced an invalid grouping");

        if grouping.is_empty() {
            return Ok(StrategyResult::from_map(map, statistics));
        }

        let units = match self.partition {
            ResourcePartition::EqualTime => input.num_time_slots,
            ResourcePartition::ContiguousSubChannels => input.num_sub_channels,
        };

        let number_of_groups = grouping.len();
        let served_groups = number_of_groups.min(units);
        let shares = split(units, served_groups);
        let first = self.next_group % number_of_groups;

        for (position, share) in shares.iter().enumerate() {
            let group = &grouping.groups[(first + position) % number_of_groups];

            for (spatial_layer, (user, member)) in group.iter().enumerate() {
                let resources = self.get_resources(input, share, spatial_layer);
                let placed = self.serve_member(user, member, &resources, &state, &mut *env.queue, &mut map)?;

                if placed > 0 {
                    statistics.dynamic_grants += 1;
                }
            }
        }

        self.next_group = (first + served_groups) % number_of_groups;
        self.apc.post_process(&state, &mut map);
        map.notify_compounds(callback);

        log::debug!("{}: {} of {} groups served, SDMA gain {:.3}.", self.get_name(), served_groups, number_of_groups, grouping.sdma_gain);

        Ok(StrategyResult::from_map(map, statistics))
    }

    fn get_name(&self) -> &'static str {
        match self.partition {
            ResourcePartition::EqualTime => "EqualTimeRR",
            ResourcePartition::ContiguousSubChannels => "RoundRobinUL",
        }
    }
}
