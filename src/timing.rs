//! Timing parameters derived from the configured hold time `T`. Named
//! constants in the style of `neutronium::net::endpoint::Endpoint`'s
//! `HANDSHAKE_TIMEOUT` / `KEEPALIVE_INTERVAL` associated constants.

use std::time::Duration;

/// How long after startup the configured originator mints the initial token.
pub const INITIAL_TOKEN_DELAY: Duration = Duration::from_secs(1);

/// Period of the token-loss watchdog tick.
pub const MONITOR_PERIOD: Duration = Duration::from_secs(1);

/// Poll interval for the operator's line-based input.
pub const OPERATOR_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Read timeout on the UDP receive socket.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum number of transmission attempts (including the first) before a
/// NAK'd entry is given up on (see DESIGN.md for the choice of 3).
pub const RETRY_CAP: u32 = 3;

/// Receive buffer size; datagrams larger than this are truncated and treated
/// as malformed.
pub const RECV_BUFFER_SIZE: usize = 4096;

/// Derived timing parameters for a node, recomputed whenever the operator
/// issues `/tempo <value>`.
#[derive(Debug, Clone, Copy)]
pub struct TimingParams {
    /// Base hold time T, in seconds.
    pub hold_time: f64,
}

impl TimingParams {
    pub fn new(hold_time: f64) -> TimingParams {
        TimingParams { hold_time }
    }

    /// Inactivity duration after which the token is presumed lost: `5T`.
    pub fn token_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.hold_time * 5.0)
    }

    /// Lower bound on a legitimate token round-trip: `2T + 0.5`.
    pub fn min_token_time(&self) -> Duration {
        Duration::from_secs_f64(self.hold_time * 2.0 + 0.5)
    }

    /// How long an idle holder retains the token before forwarding it.
    pub fn hold_duration(&self) -> Duration {
        Duration::from_secs_f64(self.hold_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_timeout_and_min_time_from_hold_time() {
        let timing = TimingParams::new(1.0);
        assert_eq!(timing.token_timeout(), Duration::from_secs_f64(5.0));
        assert_eq!(timing.min_token_time(), Duration::from_secs_f64(2.5));
    }

    #[test]
    fn retunes_on_operator_command() {
        let mut timing = TimingParams::new(1.0);
        timing.hold_time = 2.0;
        assert_eq!(timing.token_timeout(), Duration::from_secs_f64(10.0));
        assert_eq!(timing.min_token_time(), Duration::from_secs_f64(4.5));
    }
}
