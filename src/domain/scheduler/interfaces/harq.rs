use std::collections::VecDeque;
use std::fmt::Debug;

use crate::domain::scheduler::pdu::SharedPdu;
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};

/// A transport block waiting for retransmission by a HARQ process.
#[derive(Debug, Clone)]
pub struct HarqRetransmission {
    pub process: u8,
    pub user: UserId,
    pub cid: ConnectionId,
    pub pdu: SharedPdu,
}

/// Source of pending HARQ retransmissions. Only their scheduling priority matters here,
/// the retransmission protocol itself lives elsewhere.
pub trait HarqInterface: Debug {
    /// Pending retransmissions, oldest first.
    fn get_pending_retransmissions(&self) -> Vec<HarqRetransmission>;

    /// Notifies that the retransmission of `process` for `user` got resources.
    fn retransmission_scheduled(&mut self, user: &UserId, process: u8);
}

#[derive(Debug, Clone, Default)]
pub struct HarqRetransmissionQueue {
    pending: VecDeque<HarqRetransmission>,
}

impl HarqRetransmissionQueue {
    pub fn new() -> Self {
        HarqRetransmissionQueue { pending: VecDeque::new() }
    }

    pub fn push(&mut self, retransmission: HarqRetransmission) {
        self.pending.push_back(retransmission);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl HarqInterface for HarqRetransmissionQueue {
    fn get_pending_retransmissions(&self) -> Vec<HarqRetransmission> {
        self.pending.iter().cloned().collect()
    }

    fn retransmission_scheduled(&mut self, user: &UserId, process: u8) {
        self.pending.retain(|retransmission| !(retransmission.user == *user && retransmission.process == process));
    }
}
