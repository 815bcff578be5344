use std::rc::Rc;

use crate::domain::scheduler::utils::id::ConnectionId;

/// The kinds of data units the scheduler dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduKind {
    UserData,
    Voice,
    HarqRetransmission { process: u8 },
}

/// A data unit handed over by the protocol stack. Opaque apart from its size.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    pub id: u64,
    pub cid: ConnectionId,
    pub bits: u32,
    pub kind: PduKind,

    /// Simulation time the unit entered the queue.
    pub created_at: f64,
}

pub type SharedPdu = Rc<Pdu>;

impl Pdu {
    pub fn new(id: u64, cid: ConnectionId, bits: u32, kind: PduKind, created_at: f64) -> Self {
        Pdu { id, cid, bits, kind, created_at }
    }

    pub fn is_retransmission(&self) -> bool {
        matches!(self.kind, PduKind::HarqRetransmission { .. })
    }
}
