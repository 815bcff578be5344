pub mod context;
pub mod simulator;
pub mod traffic;
