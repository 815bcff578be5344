use std::fmt::Debug;

use crate::domain::scheduler::interfaces::harq::HarqInterface;
use crate::domain::scheduler::interfaces::queue::QueueInterface;
use crate::domain::scheduler::interfaces::registry::RegistryProxy;
use crate::domain::scheduler::request::StrategyInput;
use crate::domain::scheduler::scheduling_map::SchedulingMap;
use crate::domain::scheduler::scheduling_map::map_info::MapInfoCollection;
use crate::domain::scheduler::scheduling_map::scheduled_compound::ScheduledCompound;
use crate::domain::scheduler::utils::id::ConnectionId;
use crate::domain::scheduler::utils::statistics::RoundStatistics;
use crate::error::Result;

/// Collaborators of one scheduling round.
///
/// The queue is only drained, everything else is read-only while the round runs.
pub struct SchedulingEnvironment<'a> {
    pub queue: &'a mut dyn QueueInterface,
    pub registry: &'a dyn RegistryProxy,
    pub harq: Option<&'a mut dyn HarqInterface>,

    /// Round counter of the simulation context.
    pub round: u64,

    /// Simulation time at the start of the round.
    pub time: f64,
}

impl<'a> SchedulingEnvironment<'a> {
    pub fn new(queue: &'a mut dyn QueueInterface, registry: &'a dyn RegistryProxy, round: u64, time: f64) -> Self {
        SchedulingEnvironment { queue, registry, harq: None, round, time }
    }

    pub fn with_harq(mut self, harq: &'a mut dyn HarqInterface) -> Self {
        self.harq = Some(harq);
        self
    }
}

/// Output of one scheduling round.
#[derive(Debug)]
pub struct StrategyResult {
    pub scheduling_map: SchedulingMap,
    pub bursts: MapInfoCollection,
    pub statistics: RoundStatistics,
}

impl StrategyResult {
    /// Derives the bursts and the map based counters from the filled map.
    pub fn from_map(scheduling_map: SchedulingMap, mut statistics: RoundStatistics) -> Self {
        let bursts = scheduling_map.to_map_info();

        statistics.bursts = bursts.len();
        statistics.scheduled_compounds = scheduling_map.get_num_compounds();
        statistics.scheduled_bits = scheduling_map.get_scheduled_bits();

        StrategyResult { scheduling_map, bursts, statistics }
    }
}

/// A scheduling strategy, called once per round by the owning layer.
pub trait Strategy: Debug {
    /// Fills a fresh scheduling map shaped by `input`. `callback` is invoked once for every placed
    /// data unit, in placement order, after power control finished the map.
    ///
    /// # Returns
    /// `Err(InvariantViolation)` if a bookkeeping contract broke, `Err(ConfigurationError)` if
    /// `input` does not fit the strategy. Running out of resources is not an error.
    fn do_start_scheduling(
        &mut self,
        input: &StrategyInput,
        env: &mut SchedulingEnvironment,
        callback: &mut dyn FnMut(&ScheduledCompound),
    ) -> Result<StrategyResult>;

    /// Drops all state kept for `cid`, e.g. after the connection was closed.
    fn teardown(&mut self, _cid: &ConnectionId) {}

    fn get_name(&self) -> &'static str;
}
