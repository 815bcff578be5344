pub mod apc;
pub mod channel_quality;
pub mod dsa;
pub mod grouper;
pub mod interfaces;
pub mod pdu;
pub mod persistent;
pub mod phy;
pub mod request;
pub mod scheduling_map;
pub mod strategy;
pub mod utils;
