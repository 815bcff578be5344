use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::error::Result;

/// Per-round outcome of one `do_start_scheduling` call.
///
/// Every field is one column in the CSV written by [`StatisticsWriter`]. Counters that a strategy does
/// not use (e.g. PDCCH usage for the round-robin strategies) simply stay at zero.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RoundStatistics {
    /// Round counter of the simulation context.
    pub round: u64,

    /// Frame index inside the resource grid window (0 for non-persistent strategies).
    pub frame: usize,

    /// Simulation time at the start of the round in seconds.
    pub time: f64,

    /// Number of emitted bursts (map info entries).
    pub bursts: usize,

    /// Number of data units placed on the scheduling map.
    pub scheduled_compounds: usize,

    /// Sum of the sizes of all placed data units.
    pub scheduled_bits: u64,

    /// Users dropped because their SINR cannot carry any PHY mode.
    pub excluded_users: usize,

    /// Connections served from a persistent reservation kept from an earlier round.
    pub persistent_grants: usize,

    /// Connections that received a new persistent reservation this round.
    pub new_persistent_grants: usize,

    /// Connections served with a dynamic (PDCCH signaled) grant.
    pub dynamic_grants: usize,

    /// HARQ retransmissions served.
    pub harq_grants: usize,

    pub frequency_relocations: usize,

    pub time_relocations: usize,

    /// Connections whose data was pushed to a later round because no resource or no PDCCH was left.
    pub deferred_connections: usize,

    pub pdcch_used: usize,
}

impl RoundStatistics {
    pub fn new(round: u64, frame: usize, time: f64) -> Self {
        RoundStatistics { round, frame, time, ..Default::default() }
    }
}

/// Accumulates per-round statistics into run totals.
#[derive(Debug, Clone, Default)]
pub struct StatisticsSummary {
    pub rounds: u64,
    pub bursts: usize,
    pub scheduled_compounds: usize,
    pub scheduled_bits: u64,
    pub persistent_grants: usize,
    pub new_persistent_grants: usize,
    pub dynamic_grants: usize,
    pub harq_grants: usize,
    pub relocations: usize,
    pub deferred_connections: usize,
}

impl StatisticsSummary {
    pub fn add(&mut self, round: &RoundStatistics) {
        self.rounds += 1;
        self.bursts += round.bursts;
        self.scheduled_compounds += round.scheduled_compounds;
        self.scheduled_bits += round.scheduled_bits;
        self.persistent_grants += round.persistent_grants;
        self.new_persistent_grants += round.new_persistent_grants;
        self.dynamic_grants += round.dynamic_grants;
        self.harq_grants += round.harq_grants;
        self.relocations += round.frequency_relocations + round.time_relocations;
        self.deferred_connections += round.deferred_connections;
    }

    pub fn avg_bits_per_round(&self) -> f64 {
        if self.rounds == 0 {
            return 0.0;
        }
        self.scheduled_bits as f64 / self.rounds as f64
    }
}

/// Writes one CSV row per scheduling round.
pub struct StatisticsWriter {
    writer: csv::Writer<File>,
}

impl StatisticsWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let writer = csv::Writer::from_path(path)?;
        Ok(StatisticsWriter { writer })
    }

    pub fn record(&mut self, statistics: &RoundStatistics) -> Result<()> {
        self.writer.serialize(statistics)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accumulates_rounds() {
        let mut summary = StatisticsSummary::default();
        let mut first = RoundStatistics::new(0, 0, 0.0);
        first.scheduled_bits = 300;
        first.time_relocations = 1;
        let mut second = RoundStatistics::new(1, 1, 0.001);
        second.scheduled_bits = 100;
        second.frequency_relocations = 2;

        summary.add(&first);
        summary.add(&second);

        assert_eq!(summary.rounds, 2);
        assert_eq!(summary.relocations, 3);
        assert!((summary.avg_bits_per_round() - 200.0).abs() < 1e-9);
    }
}
