use std::str::FromStr;

use rand::Rng;

use crate::domain::scheduler::interfaces::simple_queue::SimpleQueue;
use crate::domain::scheduler::pdu::PduKind;
use crate::domain::scheduler::utils::id::ConnectionId;
use crate::domain::simulator::context::SimulationContext;
use crate::error::{ConversionError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrafficModel {
    /// `bits_per_round` split into units of at most `pdu_size` bits, every round.
    ConstantBitRate { bits_per_round: u32, pdu_size: u32 },

    /// On/off voice source: one frame of `frame_bits` per round while talking. Talk spurts and
    /// silences last `mean_talk_rounds` and `mean_silence_rounds` on average (geometric).
    Voice { frame_bits: u32, mean_talk_rounds: f64, mean_silence_rounds: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficModelType {
    ConstantBitRate,
    Voice,
}

impl FromStr for TrafficModelType {
    type Err = ConversionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "CBR" | "ConstantBitRate" => Ok(TrafficModelType::ConstantBitRate),
            "Voice" | "VoIP" => Ok(TrafficModelType::Voice),
            _ => Err(ConversionError::UnknownTrafficModel(s.to_string())),
        }
    }
}

/// Generates the data of one connection.
#[derive(Debug, Clone)]
pub struct TrafficSource {
    cid: ConnectionId,
    model: TrafficModel,

    /// Voice sources start talking.
    talking: bool,
}

impl TrafficSource {
    pub fn new(cid: ConnectionId, model: TrafficModel) -> Self {
        TrafficSource { cid, model, talking: true }
    }

    pub fn get_cid(&self) -> &ConnectionId {
        &self.cid
    }

    pub fn is_talking(&self) -> bool {
        self.talking
    }

    /// Enqueues the data of the current round.
    ///
    /// # Returns
    /// The number of enqueued bits.
    pub fn generate(&mut self, ctx: &mut SimulationContext, queue: &mut SimpleQueue) -> Result<u64> {
        let time = ctx.get_current_time();

        match self.model {
            TrafficModel::ConstantBitRate { bits_per_round, pdu_size } => {
                let pdu_size = pdu_size.max(1);
                let mut remaining = bits_per_round;

                while remaining > 0 {
                    let bits = remaining.min(pdu_size);
                    queue.put(&self.cid, bits, PduKind::UserData, time)?;
                    remaining -= bits;
                }

                Ok(bits_per_round as u64)
            }
            TrafficModel::Voice { frame_bits, mean_talk_rounds, mean_silence_rounds } => {
                let mean = if self.talking { mean_talk_rounds } else { mean_silence_rounds };

                if mean > 0.0 && ctx.rng().random_bool((1.0 / mean).clamp(0.0, 1.0)) {
                    self.talking = !self.talking;
                    log::trace!("{} {} talking.", self.cid, if self.talking { "starts" } else { "stops" });
                }

                if !self.talking {
                    return Ok(0);
                }

                queue.put(&self.cid, frame_bits, PduKind::Voice, time)?;

                Ok(frame_bits as u64)
            }
        }
    }
}
