use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modulation {
    Bpsk,
    Qpsk,
    Qam16,
    Qam64,
    Qam256,
}

impl Modulation {
    pub fn bits_per_symbol(&self) -> u32 {
        match self {
            Modulation::Bpsk => 1,
            Modulation::Qpsk => 2,
            Modulation::Qam16 => 4,
            Modulation::Qam64 => 6,
            Modulation::Qam256 => 8,
        }
    }
}

impl FromStr for Modulation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BPSK" => Ok(Modulation::Bpsk),
            "QPSK" => Ok(Modulation::Qpsk),
            "QAM16" | "16QAM" => Ok(Modulation::Qam16),
            "QAM64" | "64QAM" => Ok(Modulation::Qam64),
            "QAM256" | "256QAM" => Ok(Modulation::Qam256),
            _ => Err(format!("unknown modulation '{}'", s)),
        }
    }
}

/// A modulation and coding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhyMode {
    pub modulation: Modulation,

    /// Fraction of information bits per coded bit, in (0, 1].
    pub coding_rate: f64,
}

impl PhyMode {
    pub fn new(modulation: Modulation, coding_rate: f64) -> Self {
        PhyMode { modulation, coding_rate }
    }

    /// Information bits carried per modulation symbol.
    pub fn get_bits_per_symbol(&self) -> f64 {
        self.modulation.bits_per_symbol() as f64 * self.coding_rate
    }
}

impl fmt::Display for PhyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}-{:.3}", self.modulation, self.coding_rate)
    }
}
