//! Data packet router. On each inbound data packet, decides whether to
//! deliver to self, complete a self-originated round-trip, or forward
//! (including broadcast replication). Mirrors the connection-event dispatch
//! shape of `neutronium::net::endpoint::Endpoint`, but over a single packet
//! at a time rather than a batch.

use crate::crc::{canonical_form, compute_crc};
use crate::packet::{DataPacket, Status, BROADCAST_DEST};
use crate::state::NodeState;
use slog::{info, warn, Logger};

/// What the caller should do after routing an inbound data packet.
pub enum RouteOutcome {
    /// Forward this (possibly rewritten) packet verbatim to the right neighbor.
    Forward(DataPacket),
    /// The packet completed a round-trip back to its originator; queue
    /// disposition has already been applied. The caller should now re-check
    /// the token/queue state to decide whether to transmit the next entry or
    /// hold-then-forward the token.
    SelfReturned,
}

/// Routes one inbound data packet: self-returned disposition, unicast
/// delivery to self, broadcast replication, or plain transit forwarding.
pub fn route(nickname: &str, state: &mut NodeState, mut packet: DataPacket, log: &Logger) -> RouteOutcome {
    if packet.src == nickname {
        dispose_self_returned(nickname, state, &packet, log);
        return RouteOutcome::SelfReturned;
    }

    if packet.dest == nickname {
        let verified = verify_packet(&packet);
        packet.set_status(if verified { Status::Ack } else { Status::Nak });
        let canonical = canonical_form(&packet.src, &packet.dest, &packet.status_raw, &packet.message);
        packet.set_crc(compute_crc(&canonical));
        info!(
            log,
            "{}: received unicast from {} ({}), answering {}", nickname, packet.src, packet.message, packet.status_raw
        );
        return RouteOutcome::Forward(packet);
    }

    if packet.dest == BROADCAST_DEST {
        let verified = verify_packet(&packet);
        if !verified {
            warn!(log, "{}: broadcast from {} failed integrity check (advisory only)", nickname, packet.src);
        }
        info!(log, "{}: broadcast from {}: {}", nickname, packet.src, packet.message);
        return RouteOutcome::Forward(packet);
    }

    RouteOutcome::Forward(packet)
}

/// Recomputes the CRC over the received fields (with the crc slot zeroed)
/// and compares to the packet's stored value. An unparseable crc is treated
/// as a mismatch.
fn verify_packet(packet: &DataPacket) -> bool {
    if packet.crc_unparseable {
        return false;
    }
    let canonical = canonical_form(&packet.src, &packet.dest, &packet.status_raw, &packet.message);
    compute_crc(&canonical) == packet.crc
}

/// Case 1: disposition of a packet that has returned to its originator.
fn dispose_self_returned(nickname: &str, state: &mut NodeState, packet: &DataPacket, log: &Logger) {
    state.waiting_for_answer = false;

    if packet.is_broadcast() {
        state.queue.dequeue();
        info!(log, "{}: broadcast to TODOS completed its round-trip, dequeued", nickname);
        return;
    }

    match packet.status {
        Status::Ack => {
            state.queue.dequeue();
            info!(log, "{}: {} delivered (ACK), dequeued", nickname, packet.dest);
        }
        Status::Nak => {
            let give_up = match state.queue.peek_mut() {
                Some(head) if head.dest == packet.dest => {
                    head.attempts += 1;
                    let attempts = head.attempts;
                    if attempts >= crate::timing::RETRY_CAP {
                        info!(log, "{}: {} gave up after {} attempts (NAK)", nickname, packet.dest, attempts);
                        true
                    } else {
                        info!(log, "{}: {} NAK, will retransmit (attempt {})", nickname, packet.dest, attempts);
                        false
                    }
                }
                Some(_) => {
                    warn!(log, "{}: NAK for {} does not match queue head, ignoring", nickname, packet.dest);
                    false
                }
                None => false,
            };
            if give_up {
                state.queue.dequeue();
            }
        }
        Status::NoSuchDestination => {
            state.queue.dequeue();
            info!(log, "{}: destination {} does not exist, giving up", nickname, packet.dest);
        }
        Status::Unknown => {
            warn!(log, "{}: unknown status {:?} on returned packet, ignoring", nickname, packet.status_raw);
        }
    }
}
