pub mod dsa_driven;
pub mod grouped_round_robin;
pub mod strategy_trait;
pub mod strategy_type;
pub mod sub_strategy;
