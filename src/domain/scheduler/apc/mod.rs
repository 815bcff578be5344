pub mod apc_trait;
pub mod apc_type;
pub mod use_max_tx_power;
