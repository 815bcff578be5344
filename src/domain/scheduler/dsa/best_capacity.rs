use std::collections::BTreeMap;

use crate::domain::scheduler::dsa::dsa_trait::{DsaStrategy, fits_request, get_capacity};
use crate::domain::scheduler::request::{Direction, DsaResult, RequestForResource, SchedulerState};
use crate::domain::scheduler::scheduling_map::SchedulingMap;
use crate::domain::scheduler::utils::id::UserId;

/// Picks the resource with the highest achievable capacity.
///
/// **Free search** (default): every resource unit is rated with
/// `datarate(best PHY mode at its SINR) x remaining free time`. The best remaining candidate is
/// tested; if it cannot carry the request it is marked as tried and the next best one follows.
/// Ties go to the lowest frequency-major index, so equal inputs always yield the same resource.
///
/// **Adjacent uplink search**: with `use_adjacent_sub_channels` set and uplink scheduling, a user
/// stays close to the subchannel it used last (SC-FDMA). Offsets 0, +-1, +-2, ... are probed,
/// the side probed first alternates from call to call.
#[derive(Debug, Clone, Default)]
pub struct BestCapacity {
    use_adjacent_sub_channels: bool,

    last_sub_channel: BTreeMap<UserId, usize>,

    /// Probe the higher neighbour first on the next call.
    probe_upwards: bool,
}

impl BestCapacity {
    pub fn new(use_adjacent_sub_channels: bool) -> Self {
        BestCapacity { use_adjacent_sub_channels, last_sub_channel: BTreeMap::new(), probe_upwards: true }
    }

    fn free_search(&self, request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap) -> Option<DsaResult> {
        let candidates: Vec<(DsaResult, f64)> = map
            .get_resources()
            .map(|resource| (resource, get_capacity(request, state, map, &resource)))
            .filter(|(_, capacity)| *capacity > 0.0)
            .collect();

        let mut tried = vec![false; candidates.len()];

        loop {
            let mut best: Option<usize> = None;

            for (index, (_, capacity)) in candidates.iter().enumerate() {
                if tried[index] {
                    continue;
                }

                match best {
                    Some(current) if candidates[current].1 >= *capacity => {}
                    _ => best = Some(index),
                }
            }

            let best = best?;
            let resource = candidates[best].0;

            if fits_request(request, state, map, &resource) {
                log::trace!("BestCapacity: {} gets {:?} with capacity {:.1} bit.", request.cid, resource, candidates[best].1);
                return Some(resource);
            }

            tried[best] = true;
        }
    }

    /// Offsets in probe order: 0, +1, -1, +2, -2, ... (or -1 first when probing downwards).
    fn get_probe_offsets(num_sub_channels: usize, upwards: bool) -> Vec<isize> {
        let sign: isize = if upwards { 1 } else { -1 };
        let mut offsets = vec![0];

        for distance in 1..num_sub_channels as isize {
            offsets.push(sign * distance);
            offsets.push(-sign * distance);
        }

        offsets
    }

    fn adjacent_search(&mut self, request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap) -> Option<DsaResult> {
        let Some(&last) = self.last_sub_channel.get(&request.user) else {
            let found = self.free_search(request, state, map)?;
            self.last_sub_channel.insert(request.user.clone(), found.sub_channel);
            return Some(found);
        };

        let upwards = self.probe_upwards;
        self.probe_upwards = !self.probe_upwards;

        let num_sub_channels = map.get_num_sub_channels();

        for offset in Self::get_probe_offsets(num_sub_channels, upwards) {
            let sub_channel = last as isize + offset;
            if sub_channel < 0 || sub_channel >= num_sub_channels as isize {
                continue;
            }

            let found = map
                .get_resources()
                .filter(|resource| resource.sub_channel == sub_channel as usize)
                .find(|resource| fits_request(request, state, map, resource));

            if let Some(resource) = found {
                self.last_sub_channel.insert(request.user.clone(), resource.sub_channel);
                return Some(resource);
            }
        }

        None
    }
}

impl DsaStrategy for BestCapacity {
    fn get_sub_channel_with_dsa(&mut self, request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap) -> Option<DsaResult> {
        let found = if self.use_adjacent_sub_channels && state.input.direction == Direction::Uplink {
            self.adjacent_search(request, state, map)
        } else {
            self.free_search(request, state, map)
        };

        if found.is_none() {
            log::debug!("BestCapacity: no resource can carry {} bits of {}.", request.bits, request.cid);
        }

        found
    }

    fn get_name(&self) -> &'static str {
        "BestCapacity"
    }
}
