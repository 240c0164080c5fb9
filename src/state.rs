//! Per-node runtime state, guarded by a single coarse lock in the style
//! `neutronium::net::channel::Channel` keeps its mutable fields (sequence
//! numbers, timestamps, state enum) directly on the struct rather than
//! behind fine-grained locks — one node-wide mutex covers both the token
//! machine and the queue, since a router decision mutates both together.

use crate::queue::OutboundQueue;
use crate::timing::TimingParams;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// All mutable state for a node, behind one lock.
pub struct NodeState {
    pub token_holder: bool,
    pub waiting_for_answer: bool,
    pub last_token_time: Option<Instant>,
    pub time_i_last_sent_token: Option<Instant>,
    pub running: bool,
    pub queue: OutboundQueue,
    pub timing: TimingParams,
    /// Test-mode knob: when true, outbound data packets are subject to the
    /// pseudo-random single-character corruption of an outbound message.
    pub corruption_enabled: bool,
}

impl NodeState {
    pub fn new(token_hold_time: u64, corruption_enabled: bool) -> NodeState {
        NodeState {
            token_holder: false,
            waiting_for_answer: false,
            last_token_time: None,
            time_i_last_sent_token: None,
            running: true,
            queue: OutboundQueue::new(),
            timing: TimingParams::new(token_hold_time as f64),
            corruption_enabled,
        }
    }
}

pub type SharedState = Arc<Mutex<NodeState>>;

pub fn shared(state: NodeState) -> SharedState {
    Arc::new(Mutex::new(state))
}
