use crate::api::scenario_dto::ScenarioDto;
use crate::domain::simulator::context::SimulationContext;
use crate::domain::simulator::simulator::Simulator;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads a scenario file and builds the simulator and its context from it.
///
/// The logger is not touched, callers initialize it once via [`logger::init`].
pub fn load_scenario(file_path: &str) -> Result<(ScenarioDto, Simulator, SimulationContext)> {
    let scenario: ScenarioDto = parse_json_file::<ScenarioDto>(file_path)?;
    log::info!("Scenario '{}' parsed successfully.", file_path);

    let simulator = Simulator::from_dto(&scenario)?;
    let ctx = SimulationContext::from_dto(&scenario.simulation);

    Ok((scenario, simulator, ctx))
}
