use crate::domain::scheduler::utils::units::{Power, Ratio};

/// Externally produced link estimate between the station and one user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelQualityOnPathloss {
    pub pathloss: Ratio,

    /// Interference plus noise power at the receiver.
    pub interference: Power,

    /// Received carrier power for the nominal transmit power.
    pub carrier: Power,
}

impl ChannelQualityOnPathloss {
    pub fn new(pathloss: Ratio, interference: Power, carrier: Power) -> Self {
        ChannelQualityOnPathloss { pathloss, interference, carrier }
    }

    /// SINR estimate at the nominal power the carrier was computed with.
    pub fn get_sinr(&self) -> Ratio {
        self.carrier / self.interference
    }

    /// SINR estimate if `tx_power` were used instead of the nominal power.
    pub fn get_sinr_with(&self, tx_power: Power) -> Ratio {
        (tx_power / self.pathloss) / self.interference
    }
}

/// Carrier and interference of one member inside a co-scheduled spatial group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandI {
    pub carrier: Power,
    pub interference: Power,
}

impl CandI {
    pub fn new(carrier: Power, interference: Power) -> Self {
        CandI { carrier, interference }
    }

    pub fn get_sinr(&self) -> Ratio {
        self.carrier / self.interference
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerCapabilities {
    /// Upper bound for the power on one subchannel.
    pub max_per_subchannel: Power,

    /// Default power on one subchannel.
    pub nominal_per_subchannel: Power,

    /// Budget summed over all subchannels used in one time slot.
    pub max_overall: Power,
}

impl PowerCapabilities {
    pub fn new(max_per_subchannel: Power, nominal_per_subchannel: Power, max_overall: Power) -> Self {
        PowerCapabilities { max_per_subchannel, nominal_per_subchannel, max_overall }
    }
}
