use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::api::scenario_dto::SimulationDto;

/// State of one simulation run: clock, round counter and random number generator.
///
/// One context per run; scheduler components receive what they need from it explicitly.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    time: f64,
    round: u64,

    /// Simulated time that passes per round in seconds.
    frame_duration: f64,

    seed: u64,
    rng: StdRng,
}

impl SimulationContext {
    pub fn new(seed: u64, frame_duration: f64) -> Self {
        SimulationContext { time: 0.0, round: 0, frame_duration, seed, rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_dto(dto: &SimulationDto) -> Self {
        SimulationContext::new(dto.seed, dto.frame_duration)
    }

    pub fn get_current_time(&self) -> f64 {
        self.time
    }

    pub fn get_round(&self) -> u64 {
        self.round
    }

    pub fn get_frame_duration(&self) -> f64 {
        self.frame_duration
    }

    pub fn get_seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Moves on to the next round.
    pub fn advance(&mut self) {
        self.round += 1;
        self.time = self.round as f64 * self.frame_duration;
    }

    /// Back to round 0 with a freshly seeded generator.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.round = 0;
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}
