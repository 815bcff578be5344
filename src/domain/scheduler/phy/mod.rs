pub mod phy_mode;
pub mod phy_mode_mapper;
