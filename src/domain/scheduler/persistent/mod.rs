pub mod frame;
pub mod persistent_voip;
pub mod resource_grid;
pub mod state_tracker;
pub mod transmission_block;
