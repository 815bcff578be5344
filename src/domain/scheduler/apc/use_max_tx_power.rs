use std::collections::BTreeMap;

use crate::domain::scheduler::apc::apc_trait::ApcStrategy;
use crate::domain::scheduler::request::{ApcResult, Direction, DsaResult, RequestForResource, SchedulerState};
use crate::domain::scheduler::scheduling_map::SchedulingMap;
use crate::domain::scheduler::utils::id::UserId;
use crate::domain::scheduler::utils::units::Power;

/// Always transmits with the maximum power per subchannel.
///
/// In slave mode (a master scheduler already fixed the power) the predefined power of the request,
/// or the power already set on the resource, is kept. `post_process` scales every time slot back
/// into the overall power budget of each transmitting device.
///
/// Known limitation: after scaling down, the PHY modes chosen at full power are not checked again.
#[derive(Debug, Clone, Default)]
pub struct UseMaxTxPower;

impl UseMaxTxPower {
    pub fn new() -> Self {
        UseMaxTxPower
    }

    fn get_tx_power(request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap) -> Power {
        if let Some(power) = request.predefined_power {
            return power;
        }

        if let Some(sub_channel) = request.sub_channel {
            let resource = DsaResult::new(sub_channel, request.time_slot, request.spatial_layer);
            if let Some(prb) = map.get_prb(&resource) {
                if !prb.is_empty() {
                    return prb.tx_power;
                }
            }
        }

        state.get_transmitter_power(&request.user).max_per_subchannel
    }
}

/// Transmitting device of a resource: the station itself for downlink, the user for uplink.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Transmitter {
    Station,
    User(UserId),
}

impl ApcStrategy for UseMaxTxPower {
    fn do_start_apc(&self, request: &RequestForResource, state: &SchedulerState, map: &SchedulingMap) -> Option<ApcResult> {
        let tx_power = Self::get_tx_power(request, state, map);

        let sinr = match &request.cand_i {
            Some(cand_i) => cand_i.get_sinr(),
            None => state.estimate(&request.user, request.sub_channel)?.get_sinr_with(tx_power),
        };

        let mapper = state.registry.get_phy_mode_mapper();

        let phy_mode = match request.predefined_phy_mode {
            Some(phy_mode) => phy_mode,
            None => match mapper.get_best_phy_mode(sinr) {
                Some(phy_mode) => phy_mode,
                None => {
                    log::debug!("UseMaxTxPower: SINR {} of {} supports no PHY mode.", sinr, request.user);
                    return None;
                }
            },
        };

        Some(ApcResult { tx_power, phy_mode, sinr })
    }

    fn post_process(&self, state: &SchedulerState, map: &mut SchedulingMap) {
        for time_slot in 0..map.get_num_time_slots() {
            let mut sums: BTreeMap<Transmitter, f64> = BTreeMap::new();

            for prb in map.get_used_prbs_in_slot(time_slot) {
                let transmitter = match (state.input.direction, prb.get_user()) {
                    (Direction::Uplink, Some(user)) => Transmitter::User(user.clone()),
                    _ => Transmitter::Station,
                };
                *sums.entry(transmitter).or_insert(0.0) += prb.tx_power.get_mw();
            }

            for (transmitter, sum) in sums {
                let budget = match &transmitter {
                    Transmitter::Station => state.registry.get_power_capabilities(None).max_overall,
                    Transmitter::User(user) => state.registry.get_power_capabilities(Some(user)).max_overall,
                };

                if sum <= budget.get_mw() || sum <= 0.0 {
                    continue;
                }

                let factor = budget.get_mw() / sum;
                log::debug!("UseMaxTxPower: slot {} of {:?} uses {:.3} mW, scaling by {:.4}.", time_slot, transmitter, sum, factor);

                for prb in map.get_used_prbs_in_slot_mut(time_slot) {
                    let owned_by = match (state.input.direction, prb.get_user()) {
                        (Direction::Uplink, Some(user)) => Transmitter::User(user.clone()),
                        _ => Transmitter::Station,
                    };

                    if owned_by == transmitter {
                        prb.scale_power(factor);
                    }
                }
            }
        }
    }

    fn get_name(&self) -> &'static str {
        "UseMaxTxPower"
    }
}
