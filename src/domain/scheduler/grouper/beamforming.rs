use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::domain::scheduler::channel_quality::{CandI, ChannelQualityOnPathloss};
use crate::domain::scheduler::utils::id::UserId;
use crate::domain::scheduler::utils::units::{Power, Ratio};

/// Main lobe direction and width of one transmit/receive beam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntennaPattern {
    /// Steering direction in radians.
    pub azimuth: f64,
    pub beam_width: f64,
}

/// Input of the beamforming estimate for one group member.
#[derive(Debug, Clone)]
pub struct BeamformingTarget {
    pub user: UserId,
    pub estimate: ChannelQualityOnPathloss,
    pub azimuth: f64,

    /// Transmit power of the member's own device, only used for receive beams.
    pub tx_power: Power,
}

/// Simple adaptive array model: a beam towards a co-scheduled user leaks into the others
/// attenuated by a suppression that grows linearly with the angular separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamformingModel {
    pub beam_width: f64,

    /// Suppression reached at (and beyond) one beam width of separation.
    pub max_suppression: Ratio,
}

impl Default for BeamformingModel {
    fn default() -> Self {
        BeamformingModel { beam_width: PI / 6.0, max_suppression: Ratio::from_db(20.0) }
    }
}

/// Smallest angle between two directions, in [0, PI].
pub fn angular_separation(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(2.0 * PI);
    if diff > PI { 2.0 * PI - diff } else { diff }
}

impl BeamformingModel {
    pub fn new(beam_width: f64, max_suppression: Ratio) -> Self {
        BeamformingModel { beam_width, max_suppression }
    }

    /// Leakage factor of a beam steered `separation` radians away.
    pub fn get_leakage(&self, separation: f64) -> f64 {
        if self.beam_width <= 0.0 {
            return Ratio::from_db(-self.max_suppression.get_db()).get_factor();
        }

        let share = (separation / self.beam_width).min(1.0);
        Ratio::from_db(-self.max_suppression.get_db() * share).get_factor()
    }

    pub fn get_pattern(&self, azimuth: f64) -> AntennaPattern {
        AntennaPattern { azimuth, beam_width: self.beam_width }
    }

    /// Carrier and interference of every member if the station transmits to all of them on the same
    /// resource. The total power `tx_power` is split equally between the beams.
    pub fn calculate_tx_cand_is(&self, targets: &[BeamformingTarget], tx_power: Power) -> BTreeMap<UserId, CandI> {
        let mut result = BTreeMap::new();

        if targets.is_empty() {
            return result;
        }

        let beam_power = tx_power * (1.0 / targets.len() as f64);

        for target in targets {
            let carrier = beam_power / target.estimate.pathloss;
            let mut interference = target.estimate.interference;

            for other in targets.iter().filter(|other| other.user != target.user) {
                let leakage = self.get_leakage(angular_separation(target.azimuth, other.azimuth));
                interference += (beam_power / target.estimate.pathloss) * leakage;
            }

            result.insert(target.user.clone(), CandI::new(carrier, interference));
        }

        result
    }

    /// Carrier and interference of every member if all of them transmit to the station on the same
    /// resource, each with its own power, separated by receive beams.
    pub fn calculate_rx_cand_is(&self, targets: &[BeamformingTarget]) -> BTreeMap<UserId, CandI> {
        let mut result = BTreeMap::new();

        for target in targets {
            let carrier = target.tx_power / target.estimate.pathloss;
            let mut interference = target.estimate.interference;

            for other in targets.iter().filter(|other| other.user != target.user) {
                let leakage = self.get_leakage(angular_separation(target.azimuth, other.azimuth));
                interference += (other.tx_power / other.estimate.pathloss) * leakage;
            }

            result.insert(target.user.clone(), CandI::new(carrier, interference));
        }

        result
    }
}
