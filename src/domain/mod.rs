pub mod scheduler;
pub mod simulator;
