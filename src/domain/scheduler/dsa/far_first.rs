use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use crate::domain::scheduler::dsa::dsa_trait::{DsaStrategy, fits_request};
use crate::domain::scheduler::interfaces::queue::QueueInterface;
use crate::domain::scheduler::request::{DsaResult, RequestForResource, SchedulerState};
use crate::domain::scheduler::scheduling_map::SchedulingMap;
use crate::domain::scheduler::utils::id::UserId;

/// Distance based fairness: far users are served first.
///
/// On `initialize` the complete resource set (frequency-major order) is split into contiguous
/// ranges, one per user with queued data at the current priority. Users are ordered by distance,
/// farthest first; every range holds `total / users` resources and the remainder goes to the
/// farthest users. A request only scans its user's own range.
///
/// The partition is computed from the users known at `initialize` and kept for the whole pass.
/// A user arriving later in the same pass gets no range and therefore no resource.
#[derive(Debug, Clone, Default)]
pub struct FarFirst {
    resources: Vec<DsaResult>,
    partitions: BTreeMap<UserId, Range<usize>>,
}

impl FarFirst {
    pub fn new() -> Self {
        FarFirst::default()
    }

    pub fn get_partition(&self, user: &UserId) -> Option<&[DsaResult]> {
        let range = self.partitions.get(user)?;
        self.resources.get(range.clone())
    }

    /// Splits `total` resources between users ordered farthest first.
    fn partition(users: &[UserId], total: usize) -> BTreeMap<UserId, Range<usize>> {
        let mut partitions = BTreeMap::new();

        if users.is_empty() {
            return partitions;
        }

        let base = total / users.len();
        let remainder = total % users.len();
        let mut start = 0;

        for (position, user) in users.iter().enumerate() {
            let size = base + usize::from(position < remainder);

            if size > 0 {
                partitions.insert(user.clone(), start..start + size);
            }

            start += size;
        }

        partitions
    }
}

impl DsaStrategy for FarFirst {
    fn initialize(&mut self, state: &SchedulerState, queue: &dyn QueueInterface, map: &SchedulingMap) {
        let registry = state.registry;

        let users: BTreeSet<UserId> = registry
            .get_connections_for_priority(state.current_priority)
            .iter()
            .filter(|cid| queue.queue_has_pdus(cid))
            .filter_map(|cid| registry.get_user_for_cid(cid))
            .collect();

        let mut ordered: Vec<(f64, UserId)> = users.into_iter().map(|user| (registry.get_distance(&user), user)).collect();
        ordered.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let ordered: Vec<UserId> = ordered.into_iter().map(|(_, user)| user).collect();

        self.resources = map.get_resources().collect();
        self.partitions = Self::partition(&ordered, self.resources.len());

        log::debug!(
            "FarFirst: {} resources split between {} users at priority {}.",
            self.resources.len(),
            self.partitions.len(),
            state.current_priority
        );
    }

    fn get_sub_channel_with_dsa(&mut self, request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap) -> Option<DsaResult> {
        let Some(partition) = self.get_partition(&request.user) else {
            log::debug!("FarFirst: {} has no partition this round.", request.user);
            return None;
        };

        partition.iter().find(|resource| fits_request(request, state, map, resource)).copied()
    }

    fn get_name(&self) -> &'static str {
        "FarFirst"
    }
}
