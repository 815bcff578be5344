use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use crate::domain::scheduler::interfaces::queue::QueueInterface;
use crate::domain::scheduler::pdu::{Pdu, PduKind, SharedPdu};
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct ConnectionQueue {
    user: UserId,
    pdus: VecDeque<SharedPdu>,
}

/// Unbounded FIFO queue per connection.
#[derive(Debug, Clone, Default)]
pub struct SimpleQueue {
    connections: BTreeMap<ConnectionId, ConnectionQueue>,
    next_pdu_id: u64,
}

impl SimpleQueue {
    pub fn new() -> Self {
        SimpleQueue { connections: BTreeMap::new(), next_pdu_id: 0 }
    }

    pub fn register_connection(&mut self, cid: ConnectionId, user: UserId) {
        self.connections.entry(cid).or_insert(ConnectionQueue { user, pdus: VecDeque::new() });
    }

    /// Enqueues a new unit for a registered connection and returns it.
    pub fn put(&mut self, cid: &ConnectionId, bits: u32, kind: PduKind, time: f64) -> Result<SharedPdu> {
        let id = self.next_pdu_id;

        let queue = self
            .connections
            .get_mut(cid)
            .ok_or_else(|| Error::ConfigurationError(format!("Connection {} is not registered at the queue", cid)))?;

        let pdu = Rc::new(Pdu::new(id, cid.clone(), bits, kind, time));
        queue.pdus.push_back(pdu.clone());
        self.next_pdu_id += 1;

        Ok(pdu)
    }

    pub fn get_user(&self, cid: &ConnectionId) -> Option<&UserId> {
        self.connections.get(cid).map(|queue| &queue.user)
    }

    pub fn total_queued_bits(&self) -> u64 {
        self.connections.keys().map(|cid| self.get_queued_bits(cid)).sum()
    }
}

impl QueueInterface for SimpleQueue {
    fn queue_has_pdus(&self, cid: &ConnectionId) -> bool {
        self.connections.get(cid).is_some_and(|queue| !queue.pdus.is_empty())
    }

    fn get_head_of_line_pdu(&mut self, cid: &ConnectionId) -> Option<SharedPdu> {
        self.connections.get_mut(cid)?.pdus.pop_front()
    }

    fn get_head_of_line_pdu_bits(&self, cid: &ConnectionId) -> Option<u32> {
        self.connections.get(cid)?.pdus.front().map(|pdu| pdu.bits)
    }

    fn get_queued_users(&self) -> BTreeSet<UserId> {
        self.connections.values().filter(|queue| !queue.pdus.is_empty()).map(|queue| queue.user.clone()).collect()
    }

    fn get_connections_for_user(&self, user: &UserId) -> Vec<ConnectionId> {
        self.connections.iter().filter(|(_, queue)| queue.user == *user).map(|(cid, _)| cid.clone()).collect()
    }

    fn get_active_connections(&self) -> BTreeSet<ConnectionId> {
        self.connections.iter().filter(|(_, queue)| !queue.pdus.is_empty()).map(|(cid, _)| cid.clone()).collect()
    }

    fn get_queued_bits(&self, cid: &ConnectionId) -> u64 {
        self.connections.get(cid).map(|queue| queue.pdus.iter().map(|pdu| pdu.bits as u64).sum()).unwrap_or(0)
    }

    fn get_queued_pdu_sizes(&self, cid: &ConnectionId) -> Vec<u32> {
        self.connections.get(cid).map(|queue| queue.pdus.iter().map(|pdu| pdu.bits).collect()).unwrap_or_default()
    }

    fn reset_queue(&mut self, cid: &ConnectionId) -> usize {
        match self.connections.get_mut(cid) {
            Some(queue) => {
                let dropped = queue.pdus.len();
                queue.pdus.clear();
                dropped
            }
            None => 0,
        }
    }
}
