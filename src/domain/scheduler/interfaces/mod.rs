pub mod harq;
pub mod queue;
pub mod registry;
pub mod simple_queue;
pub mod static_registry;
