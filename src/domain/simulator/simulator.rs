use crate::api::scenario_dto::{ScenarioDto, UserDto};
use crate::domain::scheduler::interfaces::harq::HarqRetransmissionQueue;
use crate::domain::scheduler::interfaces::queue::QueueInterface;
use crate::domain::scheduler::interfaces::simple_queue::SimpleQueue;
use crate::domain::scheduler::interfaces::static_registry::{StaticRegistry, UserEntry};
use crate::domain::scheduler::request::StrategyInput;
use crate::domain::scheduler::scheduling_map::scheduled_compound::ScheduledCompound;
use crate::domain::scheduler::strategy::strategy_trait::{SchedulingEnvironment, Strategy, StrategyResult};
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::domain::scheduler::utils::statistics::{StatisticsSummary, StatisticsWriter};
use crate::domain::scheduler::utils::units::{Power, Ratio};
use crate::domain::simulator::context::SimulationContext;
use crate::domain::simulator::traffic::TrafficSource;
use crate::error::Result;

/// Drives one strategy round by round against a static radio environment.
#[derive(Debug)]
pub struct Simulator {
    strategy: Box<dyn Strategy>,
    input: StrategyInput,
    registry: StaticRegistry,
    queue: SimpleQueue,
    harq: HarqRetransmissionQueue,
    sources: Vec<TrafficSource>,
}

impl Simulator {
    pub fn new(strategy: Box<dyn Strategy>, input: StrategyInput, registry: StaticRegistry) -> Self {
        Simulator { strategy, input, registry, queue: SimpleQueue::new(), harq: HarqRetransmissionQueue::new(), sources: Vec::new() }
    }

    /// Builds registry, queues, traffic sources and the configured strategy from a scenario.
    pub fn from_dto(dto: &ScenarioDto) -> Result<Self> {
        let input = dto.scheduler.get_input()?;
        let strategy = dto.scheduler.build_strategy()?;

        let registry = StaticRegistry::new(dto.station.to_capabilities(), dto.phy_modes.to_mapper()?, dto.number_of_priorities);

        let mut simulator = Simulator::new(strategy, input, registry);

        for user in dto.users.iter() {
            simulator.registry.add_user(UserId::new(user.id.as_str()), Self::user_entry_from_dto(user));
        }

        for connection in dto.connections.iter() {
            simulator.add_connection(
                ConnectionId::new(connection.id.as_str()),
                UserId::new(connection.user.as_str()),
                connection.priority,
                Some(TrafficSource::new(ConnectionId::new(connection.id.as_str()), connection.traffic.to_model()?)),
            )?;
        }

        log::info!(
            "Simulator built: strategy {}, {} users, {} connections, {}x{}x{} resource grid.",
            simulator.strategy.get_name(),
            dto.users.len(),
            dto.connections.len(),
            input.num_sub_channels,
            input.num_time_slots,
            input.max_spatial_layers
        );

        Ok(simulator)
    }

    fn user_entry_from_dto(dto: &UserDto) -> UserEntry {
        let mut entry = UserEntry::new(
            Ratio::from_db(dto.pathloss_db),
            Power::from_dbm(dto.interference_dbm),
            dto.distance,
            dto.azimuth_deg.to_radians(),
            dto.power.to_capabilities(),
        );
        entry.reachable = dto.reachable;

        for (sub_channel, interference_dbm) in dto.sub_channel_interference_dbm.iter() {
            entry = entry.with_sub_channel_interference(*sub_channel, Power::from_dbm(*interference_dbm));
        }

        entry
    }

    /// Registers a connection at the registry and the queue. Without a traffic source the
    /// connection only carries what is put into its queue directly.
    pub fn add_connection(&mut self, cid: ConnectionId, user: UserId, priority: usize, source: Option<TrafficSource>) -> Result<()> {
        self.registry.add_connection(cid.clone(), user.clone(), priority)?;
        self.queue.register_connection(cid, user);

        if let Some(source) = source {
            self.sources.push(source);
        }

        Ok(())
    }

    pub fn get_strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn get_input(&self) -> &StrategyInput {
        &self.input
    }

    pub fn get_registry(&self) -> &StaticRegistry {
        &self.registry
    }

    pub fn get_registry_mut(&mut self) -> &mut StaticRegistry {
        &mut self.registry
    }

    pub fn get_queue(&self) -> &SimpleQueue {
        &self.queue
    }

    pub fn get_queue_mut(&mut self) -> &mut SimpleQueue {
        &mut self.queue
    }

    pub fn get_harq_mut(&mut self) -> &mut HarqRetransmissionQueue {
        &mut self.harq
    }

    /// Generates the traffic of the current round, schedules it and moves the context on.
    pub fn run_round(&mut self, ctx: &mut SimulationContext) -> Result<StrategyResult> {
        for source in self.sources.iter_mut() {
            source.generate(ctx, &mut self.queue)?;
        }

        let mut placed = 0usize;
        let mut count_placed = |_: &ScheduledCompound| placed += 1;

        let result = {
            let mut env = SchedulingEnvironment::new(&mut self.queue, &self.registry, ctx.get_round(), ctx.get_current_time())
                .with_harq(&mut self.harq);

            self.strategy.do_start_scheduling(&self.input, &mut env, &mut count_placed)?
        };

        log::debug!(
            "Round {}: {} compounds ({} bits) in {} bursts, {} bits left in the queues.",
            ctx.get_round(),
            placed,
            result.statistics.scheduled_bits,
            result.bursts.len(),
            self.queue.total_queued_bits()
        );

        ctx.advance();

        Ok(result)
    }

    /// Runs `rounds` rounds and optionally writes one statistics row per round.
    ///
    /// # Returns
    /// The accumulated statistics of all rounds.
    pub fn run(&mut self, ctx: &mut SimulationContext, rounds: u64, mut writer: Option<&mut StatisticsWriter>) -> Result<StatisticsSummary> {
        let mut summary = StatisticsSummary::default();

        for _ in 0..rounds {
            let result = self.run_round(ctx)?;

            if let Some(writer) = writer.as_deref_mut() {
                writer.record(&result.statistics)?;
            }

            summary.add(&result.statistics);
        }

        if let Some(writer) = writer {
            writer.flush()?;
        }

        log::info!(
            "Simulation finished after {} rounds: {} bits scheduled ({:.1} per round), {} dynamic, {} persistent grants.",
            summary.rounds,
            summary.scheduled_bits,
            summary.avg_bits_per_round(),
            summary.dynamic_grants,
            summary.persistent_grants
        );

        Ok(summary)
    }

    /// Closes a connection: drops its traffic source, its queued data and all strategy state.
    pub fn teardown_connection(&mut self, cid: &ConnectionId) {
        self.sources.retain(|source| source.get_cid() != cid);
        let dropped = self.queue.reset_queue(cid);
        self.strategy.teardown(cid);

        log::info!("Connection {} torn down, {} queued units dropped.", cid, dropped);
    }
}
