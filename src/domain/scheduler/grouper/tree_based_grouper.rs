use std::collections::{BTreeMap, BTreeSet};

use crate::domain::scheduler::grouper::beamforming::{BeamformingModel, BeamformingTarget};
use crate::domain::scheduler::grouper::grouper_trait::Grouper;
use crate::domain::scheduler::grouper::grouping::{Group, GroupMember, Grouping};
use crate::domain::scheduler::grouper::heuristics::{GroupEvaluation, GroupingHeuristic};
use crate::domain::scheduler::request::{Direction, SchedulerState};
use crate::domain::scheduler::utils::id::UserId;

/// Estimates the performance of candidate groups for one direction.
pub(crate) struct GroupEvaluator<'a, 'b> {
    state: &'a SchedulerState<'b>,
    direction: Direction,
    beamforming: &'a BeamformingModel,
}

impl<'a, 'b> GroupEvaluator<'a, 'b> {
    pub(crate) fn new(state: &'a SchedulerState<'b>, direction: Direction, beamforming: &'a BeamformingModel) -> Self {
        GroupEvaluator { state, direction, beamforming }
    }

    pub(crate) fn get_target(&self, user: &UserId) -> Option<BeamformingTarget> {
        let registry = self.state.registry;

        let estimate = match self.direction {
            Direction::Downlink => registry.estimate_tx_sinr_at(user)?,
            Direction::Uplink => registry.estimate_rx_sinr_of(user)?,
        };

        Some(BeamformingTarget {
            user: user.clone(),
            estimate,
            azimuth: registry.get_azimuth(user),
            tx_power: registry.get_power_capabilities(Some(user)).nominal_per_subchannel,
        })
    }

    /// `None` if any member could not be served inside this group.
    pub(crate) fn evaluate(&self, targets: &[&BeamformingTarget]) -> Option<GroupEvaluation> {
        let owned: Vec<BeamformingTarget> = targets.iter().map(|target| (*target).clone()).collect();

        let cand_is = match self.direction {
            Direction::Downlink => {
                let station_power = self.state.registry.get_power_capabilities(None).nominal_per_subchannel;
                self.beamforming.calculate_tx_cand_is(&owned, station_power)
            }
            Direction::Uplink => self.beamforming.calculate_rx_cand_is(&owned),
        };

        let mapper = self.state.registry.get_phy_mode_mapper();
        let mut group: Group = BTreeMap::new();
        let mut throughput = 0.0;

        for target in &owned {
            let cand_i = *cand_is.get(&target.user)?;
            let sinr = cand_i.get_sinr();

            if !mapper.sinr_is_above_limit(sinr) {
                return None;
            }

            let phy_mode = mapper.get_best_phy_mode(sinr)?;
            throughput += mapper.get_data_rate(&phy_mode);

            group.insert(target.user.clone(), GroupMember { cand_i, pattern: self.beamforming.get_pattern(target.azimuth) });
        }

        let azimuths = group.keys().filter_map(|user| owned.iter().find(|target| target.user == *user)).map(|target| target.azimuth).collect();

        Some(GroupEvaluation { group, throughput, azimuths })
    }

    /// Splits `users` into serviceable single-user targets and excluded users.
    pub(crate) fn get_serviceable_targets(&self, users: &BTreeSet<UserId>) -> (Vec<BeamformingTarget>, BTreeSet<UserId>) {
        let mut targets = Vec::new();
        let mut excluded = BTreeSet::new();

        for user in users {
            match self.get_target(user) {
                Some(target) if self.evaluate(&[&target]).is_some() => targets.push(target),
                _ => {
                    log::debug!("User {} is below the minimum serviceable SINR and skipped this round.", user);
                    excluded.insert(user.clone());
                }
            }
        }

        (targets, excluded)
    }
}

/// One node of the current tree level: the members of a group and its evaluation.
#[derive(Debug, Clone)]
struct LevelGroup {
    members: Vec<usize>,
    evaluation: GroupEvaluation,
}

/// Agglomerative SDMA grouping.
///
/// Starts with one group per serviceable user. On every tree level all legal pairs of groups
/// (combined size within the spatial-layer limit, every member still serviceable) are rated by
/// the heuristic; the best pair is merged and both groups leave the comparison for the rest
/// of the level, then the next best remaining pair is merged and so on. The level whose average
/// throughput per group has the best ratio to the no-SDMA baseline is returned.
#[derive(Debug, Clone)]
pub struct TreeBasedGrouper<H: GroupingHeuristic> {
    heuristic: H,
    beamforming: BeamformingModel,
}

impl<H: GroupingHeuristic> TreeBasedGrouper<H> {
    pub fn new(heuristic: H, beamforming: BeamformingModel) -> Self {
        TreeBasedGrouper { heuristic, beamforming }
    }

    fn get_level_throughput(level: &[LevelGroup]) -> f64 {
        if level.is_empty() {
            return 0.0;
        }

        level.iter().map(|group| group.evaluation.throughput).sum::<f64>() / level.len() as f64
    }

    fn merge_level(&self, evaluator: &GroupEvaluator, targets: &[BeamformingTarget], level: &[LevelGroup], max_spatial_layers: usize) -> Option<Vec<LevelGroup>> {
        let mut candidates: Vec<(usize, usize, f64, Option<GroupEvaluation>)> = Vec::new();

        for i in 0..level.len() {
            for j in (i + 1)..level.len() {
                if level[i].members.len() + level[j].members.len() > max_spatial_layers {
                    continue;
                }

                let members: Vec<&BeamformingTarget> = level[i].members.iter().chain(level[j].members.iter()).map(|index| &targets[*index]).collect();

                if let Some(evaluation) = evaluator.evaluate(&members) {
                    let utility = self.heuristic.get_utility(&evaluation);
                    candidates.push((i, j, utility, Some(evaluation)));
                }
            }
        }

        if candidates.is_empty() {
            return None;
        }

        let mut used = vec![false; level.len()];
        let mut merged_into: BTreeMap<usize, (usize, GroupEvaluation)> = BTreeMap::new();

        loop {
            let mut best: Option<usize> = None;

            for (index, (i, j, utility, evaluation)) in candidates.iter().enumerate() {
                if used[*i] || used[*j] || evaluation.is_none() {
                    continue;
                }

                match best {
                    Some(current) if candidates[current].2 >= *utility => {}
                    _ => best = Some(index),
                }
            }

            let Some(best) = best else {
                break;
            };

            let (i, j, _, evaluation) = &mut candidates[best];
            used[*i] = true;
            used[*j] = true;

            if let Some(evaluation) = evaluation.take() {
                merged_into.insert(*i, (*j, evaluation));
            }
        }

        if merged_into.is_empty() {
            return None;
        }

        let partners: BTreeSet<usize> = merged_into.values().map(|(j, _)| *j).collect();
        let mut next_level = Vec::with_capacity(level.len() - merged_into.len());

        for (index, group) in level.iter().enumerate() {
            if partners.contains(&index) {
                continue;
            }

            match merged_into.remove(&index) {
                Some((partner, evaluation)) => {
                    let mut members = group.members.clone();
                    members.extend(level[partner].members.iter().copied());
                    next_level.push(LevelGroup { members, evaluation });
                }
                None => next_level.push(group.clone()),
            }
        }

        Some(next_level)
    }

    fn group(&self, state: &SchedulerState, users: &BTreeSet<UserId>, max_spatial_layers: usize, direction: Direction) -> Grouping {
        let evaluator = GroupEvaluator::new(state, direction, &self.beamforming);
        let (targets, excluded) = evaluator.get_serviceable_targets(users);

        if targets.is_empty() {
            return Grouping::new(Vec::new(), excluded, 1.0);
        }

        let mut level: Vec<LevelGroup> = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            if let Some(evaluation) = evaluator.evaluate(&[target]) {
                level.push(LevelGroup { members: vec![index], evaluation });
            }
        }

        let baseline = Self::get_level_throughput(&level);
        let mut best_level = level.clone();
        let mut best_gain = 1.0;
        let mut tree_level = 0;

        while max_spatial_layers > 1 {
            let Some(next_level) = self.merge_level(&evaluator, &targets, &level, max_spatial_layers) else {
                break;
            };

            tree_level += 1;
            let gain = if baseline > 0.0 { Self::get_level_throughput(&next_level) / baseline } else { 0.0 };

            log::trace!("{} tree level {}: {} groups, SDMA gain {:.4}", self.heuristic.get_name(), tree_level, next_level.len(), gain);

            if gain > best_gain {
                best_gain = gain;
                best_level = next_level.clone();
            }

            level = next_level;
        }

        let groups = best_level.into_iter().map(|group| group.evaluation.group).collect();

        Grouping::new(groups, excluded, best_gain)
    }
}

impl<H: GroupingHeuristic> Grouper for TreeBasedGrouper<H> {
    fn get_tx_grouping(&self, state: &SchedulerState, users: &BTreeSet<UserId>, max_spatial_layers: usize) -> Grouping {
        self.group(state, users, max_spatial_layers, Direction::Downlink)
    }

    fn get_rx_grouping(&self, state: &SchedulerState, users: &BTreeSet<UserId>, max_spatial_layers: usize) -> Grouping {
        self.group(state, users, max_spatial_layers, Direction::Uplink)
    }
}
