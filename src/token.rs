//! Token state machine. Pure decision logic over [`NodeState`]; callers hold
//! the node-wide lock for the duration of these calls and perform any
//! blocking I/O (sleeps, sends) after releasing it.

use crate::state::NodeState;
use slog::{info, warn, Logger};
use std::time::Instant;

/// What the caller should do after a token arrived on the wire.
#[derive(Debug, Eq, PartialEq)]
pub enum TokenOutcome {
    /// This node already held the token; the incoming one was dropped.
    Duplicate,
    /// Token accepted, queue has a head entry to transmit.
    AcceptedWithData,
    /// Token accepted, queue is empty; caller should hold for T then forward.
    AcceptedEmpty,
}

/// Applies an inbound token to the state machine.
pub fn on_token_received(state: &mut NodeState, nickname: &str, now: Instant, log: &Logger) -> TokenOutcome {
    if state.token_holder {
        info!(log, "{}: duplicate token received while already holder, dropping", nickname);
        return TokenOutcome::Duplicate;
    }

    if let Some(sent_at) = state.time_i_last_sent_token {
        let elapsed = now.saturating_duration_since(sent_at);
        if elapsed < state.timing.min_token_time() {
            warn!(
                log,
                "{}: token returned suspiciously fast ({:?} < {:?}), accepting anyway",
                nickname,
                elapsed,
                state.timing.min_token_time()
            );
        }
    }

    state.token_holder = true;
    state.last_token_time = Some(now);

    if state.queue.is_empty() {
        TokenOutcome::AcceptedEmpty
    } else {
        state.waiting_for_answer = true;
        TokenOutcome::AcceptedWithData
    }
}

/// Watchdog check: regenerates the token if inactivity has exceeded the
/// configured timeout and this node isn't already holding it.
pub fn check_token_loss(state: &mut NodeState, nickname: &str, now: Instant, log: &Logger) -> bool {
    let timed_out = match state.last_token_time {
        Some(last) => !state.token_holder && now.saturating_duration_since(last) > state.timing.token_timeout(),
        None => false,
    };

    if !timed_out {
        return false;
    }

    info!(log, "{}: token inactivity exceeded timeout, regenerating", nickname);
    state.token_holder = true;
    state.last_token_time = Some(now);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueEntry;
    use crate::state::NodeState;
    use std::time::Duration;

    fn logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn duplicate_token_is_dropped_when_already_holder() {
        let mut state = NodeState::new(1, false);
        state.token_holder = true;
        let outcome = on_token_received(&mut state, "A", Instant::now(), &logger());
        assert_eq!(outcome, TokenOutcome::Duplicate);
    }

    #[test]
    fn accepted_with_empty_queue() {
        let mut state = NodeState::new(1, false);
        let outcome = on_token_received(&mut state, "A", Instant::now(), &logger());
        assert_eq!(outcome, TokenOutcome::AcceptedEmpty);
        assert!(state.token_holder);
        assert!(!state.waiting_for_answer);
    }

    #[test]
    fn accepted_with_data_sets_waiting() {
        let mut state = NodeState::new(1, false);
        state.queue.enqueue(QueueEntry::new("B", "hi"));
        let outcome = on_token_received(&mut state, "A", Instant::now(), &logger());
        assert_eq!(outcome, TokenOutcome::AcceptedWithData);
        assert!(state.waiting_for_answer);
    }

    #[test]
    fn monitor_regenerates_after_timeout() {
        let mut state = NodeState::new(1, false);
        let past = Instant::now() - Duration::from_secs(10);
        state.last_token_time = Some(past);
        assert!(check_token_loss(&mut state, "A", Instant::now(), &logger()));
        assert!(state.token_holder);
    }

    #[test]
    fn monitor_does_nothing_while_holder() {
        let mut state = NodeState::new(1, false);
        state.token_holder = true;
        let past = Instant::now() - Duration::from_secs(10);
        state.last_token_time = Some(past);
        assert!(!check_token_loss(&mut state, "A", Instant::now(), &logger()));
    }

    #[test]
    fn monitor_does_nothing_before_timeout() {
        let mut state = NodeState::new(1, false);
        state.last_token_time = Some(Instant::now());
        assert!(!check_token_loss(&mut state, "A", Instant::now(), &logger()));
    }
}
