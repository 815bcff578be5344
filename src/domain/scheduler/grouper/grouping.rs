use std::collections::{BTreeMap, BTreeSet};

use crate::domain::scheduler::channel_quality::CandI;
use crate::domain::scheduler::grouper::beamforming::AntennaPattern;
use crate::domain::scheduler::utils::id::UserId;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub cand_i: CandI,
    pub pattern: AntennaPattern,
}

/// Users that share one time/frequency resource on distinct beams. Ordered by user id,
/// the position of a member is its spatial layer.
pub type Group = BTreeMap<UserId, GroupMember>;

/// Partition of the serviceable users of one round into disjoint spatial groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping {
    pub groups: Vec<Group>,

    /// Users excluded because their SINR cannot carry any PHY mode.
    pub excluded: BTreeSet<UserId>,

    /// Throughput ratio of this grouping against serving every user alone.
    pub sdma_gain: f64,
}

impl Grouping {
    pub fn new(groups: Vec<Group>, excluded: BTreeSet<UserId>, sdma_gain: f64) -> Self {
        Grouping { groups, excluded, sdma_gain }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get_group_of(&self, user: &UserId) -> Option<usize> {
        self.groups.iter().position(|group| group.contains_key(user))
    }

    pub fn get_member(&self, user: &UserId) -> Option<&GroupMember> {
        self.groups.iter().find_map(|group| group.get(user))
    }

    /// Spatial layer of `user` inside its group.
    pub fn get_spatial_layer(&self, user: &UserId) -> Option<usize> {
        let group = &self.groups[self.get_group_of(user)?];
        group.keys().position(|member| member == user)
    }

    pub fn get_users(&self) -> BTreeSet<UserId> {
        self.groups.iter().flat_map(|group| group.keys().cloned()).collect()
    }

    pub fn get_max_group_size(&self) -> usize {
        self.groups.iter().map(|group| group.len()).max().unwrap_or(0)
    }

    /// Every user in at most one group and no group larger than `max_spatial_layers`.
    pub fn is_valid(&self, max_spatial_layers: usize) -> bool {
        let mut seen = BTreeSet::new();

        for group in &self.groups {
            if group.is_empty() || group.len() > max_spatial_layers {
                return false;
            }

            for user in group.keys() {
                if !seen.insert(user.clone()) {
                    return false;
                }
            }
        }

        true
    }

    pub fn to_pretty_string(&self) -> String {
        let groups: Vec<String> = self
            .groups
            .iter()
            .map(|group| {
                let members: Vec<String> = group.iter().map(|(user, member)| format!("{}({})", user, member.cand_i.get_sinr())).collect();
                format!("[{}]", members.join(", "))
            })
            .collect();

        format!("{} (gain {:.3})", groups.join(" "), self.sdma_gain)
    }
}
