use std::collections::BTreeMap;
use std::fmt::Debug;
use std::str::FromStr;

use crate::domain::scheduler::utils::id::ConnectionId;
use crate::error::ConversionError;

/// Decides which connection of a priority class is served next.
pub trait SubStrategy: Debug {
    /// Picks one of `candidates` (ascending id order), `None` if there is none.
    /// The strategy removes connections from `candidates` once they cannot be served any more.
    fn select_connection(&mut self, priority: usize, candidates: &[ConnectionId]) -> Option<ConnectionId>;

    fn get_name(&self) -> &'static str;
}

/// First candidate after `last`, wrapping around.
fn next_after(last: Option<&ConnectionId>, candidates: &[ConnectionId]) -> Option<ConnectionId> {
    let first = candidates.first()?;

    let next = match last {
        Some(last) => candidates.iter().find(|cid| *cid > last).unwrap_or(first),
        None => first,
    };

    Some(next.clone())
}

/// One data unit per turn, cycling through the connections.
#[derive(Debug, Clone, Default)]
pub struct RoundRobin {
    /// Last served connection per priority, kept across rounds.
    last_served: BTreeMap<usize, ConnectionId>,
}

impl RoundRobin {
    pub fn new() -> Self {
        RoundRobin::default()
    }
}

impl SubStrategy for RoundRobin {
    fn select_connection(&mut self, priority: usize, candidates: &[ConnectionId]) -> Option<ConnectionId> {
        let next = next_after(self.last_served.get(&priority), candidates)?;
        self.last_served.insert(priority, next.clone());
        Some(next)
    }

    fn get_name(&self) -> &'static str {
        "RoundRobin"
    }
}

/// Serves a connection until it has nothing left (or cannot be served), then moves on.
#[derive(Debug, Clone, Default)]
pub struct ExhaustiveRoundRobin {
    current: BTreeMap<usize, ConnectionId>,
}

impl ExhaustiveRoundRobin {
    pub fn new() -> Self {
        ExhaustiveRoundRobin::default()
    }
}

impl SubStrategy for ExhaustiveRoundRobin {
    fn select_connection(&mut self, priority: usize, candidates: &[ConnectionId]) -> Option<ConnectionId> {
        if let Some(current) = self.current.get(&priority) {
            if candidates.contains(current) {
                return Some(current.clone());
            }
        }

        let next = next_after(self.current.get(&priority), candidates)?;
        self.current.insert(priority, next.clone());
        Some(next)
    }

    fn get_name(&self) -> &'static str {
        "ExhaustiveRoundRobin"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubStrategyType {
    RoundRobin,
    ExhaustiveRoundRobin,
}

impl SubStrategyType {
    /// Factory method to create a concrete SubStrategy.
    pub fn get_instance(&self) -> Box<dyn SubStrategy> {
        match self {
            SubStrategyType::RoundRobin => Box::new(RoundRobin::new()),
            SubStrategyType::ExhaustiveRoundRobin => Box::new(ExhaustiveRoundRobin::new()),
        }
    }
}

impl FromStr for SubStrategyType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RoundRobin" => Ok(SubStrategyType::RoundRobin),
            "ExhaustiveRoundRobin" | "ExhaustiveRR" => Ok(SubStrategyType::ExhaustiveRoundRobin),
            _ => Err(ConversionError::UnknownSubStrategyType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cids(names: &[&str]) -> Vec<ConnectionId> {
        names.iter().map(|name| ConnectionId::new(*name)).collect()
    }

    #[test]
    fn test_round_robin_cycles_and_remembers() {
        let mut rr = RoundRobin::new();
        let candidates = cids(&["A", "B", "C"]);

        assert_eq!(rr.select_connection(0, &candidates), Some(ConnectionId::new("A")));
        assert_eq!(rr.select_connection(0, &candidates), Some(ConnectionId::new("B")));
        assert_eq!(rr.select_connection(1, &candidates), Some(ConnectionId::new("A")));
        assert_eq!(rr.select_connection(0, &cids(&["A", "C"])), Some(ConnectionId::new("C")));
        assert_eq!(rr.select_connection(0, &candidates), Some(ConnectionId::new("A")));
        assert_eq!(rr.select_connection(0, &[]), None);
    }

    #[test]
    fn test_exhaustive_sticks_to_connection() {
        let mut rr = ExhaustiveRoundRobin::new();

        assert_eq!(rr.select_connection(0, &cids(&["A", "B"])), Some(ConnectionId::new("A")));
        assert_eq!(rr.select_connection(0, &cids(&["A", "B"])), Some(ConnectionId::new("A")));
        assert_eq!(rr.select_connection(0, &cids(&["B"])), Some(ConnectionId::new("B")));
    }
}
