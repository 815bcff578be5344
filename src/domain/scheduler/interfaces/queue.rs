use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::domain::scheduler::pdu::SharedPdu;
use crate::domain::scheduler::utils::id::{ConnectionId, UserId};

/// Access to the per-connection transmit queues filled by the protocol stack.
///
/// Apart from draining head-of-line units the scheduler treats the queues as read-only during a round.
pub trait QueueInterface: Debug {
    fn queue_has_pdus(&self, cid: &ConnectionId) -> bool;

    /// Removes and returns the head-of-line unit of `cid`.
    fn get_head_of_line_pdu(&mut self, cid: &ConnectionId) -> Option<SharedPdu>;

    fn get_head_of_line_pdu_bits(&self, cid: &ConnectionId) -> Option<u32>;

    /// Users with at least one non-empty queue.
    fn get_queued_users(&self) -> BTreeSet<UserId>;

    /// All connections registered for `user`, in ascending id order.
    fn get_connections_for_user(&self, user: &UserId) -> Vec<ConnectionId>;

    /// Connections with at least one queued unit.
    fn get_active_connections(&self) -> BTreeSet<ConnectionId>;

    fn get_queued_bits(&self, cid: &ConnectionId) -> u64;

    /// Sizes of all queued units of `cid` in queue order.
    fn get_queued_pdu_sizes(&self, cid: &ConnectionId) -> Vec<u32>;

    /// Drops every queued unit of `cid` and returns how many were dropped.
    fn reset_queue(&mut self, cid: &ConnectionId) -> usize;

    /// Drops every queued unit of all connections of `user`.
    fn reset_queues(&mut self, user: &UserId) -> usize {
        let mut dropped = 0;
        for cid in self.get_connections_for_user(user) {
            dropped += self.reset_queue(&cid);
        }
        dropped
    }
}
