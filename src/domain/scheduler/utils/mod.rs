pub mod id;
pub mod statistics;
pub mod units;
