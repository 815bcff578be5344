use std::fmt::Debug;

use crate::domain::scheduler::phy::phy_mode::PhyMode;
use crate::domain::scheduler::utils::units::Ratio;
use crate::error::{Error, Result};

/// Maps a SINR estimate onto the most efficient decodable PHY mode.
pub trait PhyModeMapper: Debug {
    /// Returns the PHY mode with the highest data rate whose threshold is below `sinr`,
    /// `None` if the SINR cannot carry even the most robust mode.
    fn get_best_phy_mode(&self, sinr: Ratio) -> Option<PhyMode>;

    fn sinr_is_above_limit(&self, sinr: Ratio) -> bool {
        sinr.get_db() >= self.get_min_sinr().get_db()
    }

    /// Lowest SINR that still allows a transmission.
    fn get_min_sinr(&self) -> Ratio;

    /// Required SINR for a given mode, `None` if the mode is not part of the table.
    fn get_min_sinr_for(&self, phy_mode: &PhyMode) -> Option<Ratio>;

    /// Data rate of one subchannel in bit/s when transmitting with `phy_mode`.
    fn get_data_rate(&self, phy_mode: &PhyMode) -> f64;
}

#[derive(Debug, Clone)]
struct PhyModeEntry {
    phy_mode: PhyMode,
    min_sinr: Ratio,
}

/// Table based mapper. Entries are kept sorted by their SINR threshold.
#[derive(Debug, Clone)]
pub struct TablePhyModeMapper {
    entries: Vec<PhyModeEntry>,

    /// Modulation symbols per second on one subchannel.
    symbol_rate: f64,
}

impl TablePhyModeMapper {
    pub fn new(symbol_rate: f64, modes: Vec<(PhyMode, Ratio)>) -> Result<Self> {
        if modes.is_empty() {
            return Err(Error::ConfigurationError("PHY mode table must contain at least one mode".to_string()));
        }

        if symbol_rate <= 0.0 {
            return Err(Error::ConfigurationError(format!("Symbol rate must be positive, got {}", symbol_rate)));
        }

        let mut entries: Vec<PhyModeEntry> = modes.into_iter().map(|(phy_mode, min_sinr)| PhyModeEntry { phy_mode, min_sinr }).collect();

        entries.sort_by(|a, b| a.min_sinr.get_db().total_cmp(&b.min_sinr.get_db()));

        Ok(TablePhyModeMapper { entries, symbol_rate })
    }

    pub fn get_symbol_rate(&self) -> f64 {
        self.symbol_rate
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PhyModeMapper for TablePhyModeMapper {
    fn get_best_phy_mode(&self, sinr: Ratio) -> Option<PhyMode> {
        let mut best: Option<&PhyModeEntry> = None;

        for entry in &self.entries {
            if entry.min_sinr.get_db() > sinr.get_db() {
                continue;
            }

            match best {
                Some(current) if self.get_data_rate(&current.phy_mode) >= self.get_data_rate(&entry.phy_mode) => {}
                _ => best = Some(entry),
            }
        }

        best.map(|entry| entry.phy_mode)
    }

    fn get_min_sinr(&self) -> Ratio {
        self.entries.first().map(|entry| entry.min_sinr).unwrap_or(Ratio::from_db(f64::INFINITY))
    }

    fn get_min_sinr_for(&self, phy_mode: &PhyMode) -> Option<Ratio> {
        self.entries.iter().find(|entry| entry.phy_mode == *phy_mode).map(|entry| entry.min_sinr)
    }

    fn get_data_rate(&self, phy_mode: &PhyMode) -> f64 {
        phy_mode.get_bits_per_symbol() * self.symbol_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scheduler::phy::phy_mode::Modulation;

    fn mapper() -> TablePhyModeMapper {
        TablePhyModeMapper::new(
            1000.0,
            vec![
                (PhyMode::new(Modulation::Qam16, 0.5), Ratio::from_db(10.0)),
                (PhyMode::new(Modulation::Bpsk, 0.5), Ratio::from_db(0.0)),
                (PhyMode::new(Modulation::Qpsk, 0.75), Ratio::from_db(5.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_best_phy_mode_respects_thresholds() {
        let mapper = mapper();

        assert_eq!(mapper.get_best_phy_mode(Ratio::from_db(-1.0)), None);
        assert_eq!(mapper.get_best_phy_mode(Ratio::from_db(0.0)), Some(PhyMode::new(Modulation::Bpsk, 0.5)));
        assert_eq!(mapper.get_best_phy_mode(Ratio::from_db(7.0)), Some(PhyMode::new(Modulation::Qpsk, 0.75)));
        assert_eq!(mapper.get_best_phy_mode(Ratio::from_db(30.0)), Some(PhyMode::new(Modulation::Qam16, 0.5)));
    }

    #[test]
    fn test_limits_and_rates() {
        let mapper = mapper();

        assert!(!mapper.sinr_is_above_limit(Ratio::from_db(-0.5)));
        assert!(mapper.sinr_is_above_limit(Ratio::from_db(0.0)));
        assert!((mapper.get_data_rate(&PhyMode::new(Modulation::Qpsk, 0.75)) - 1500.0).abs() < 1e-9);
        assert!(TablePhyModeMapper::new(1000.0, vec![]).is_err());
    }
}
