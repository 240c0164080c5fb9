//! Ties the packet codec, CRC, queue, token machine and router together into
//! the running node: the Receiver, Token Monitor, Operator and initial-token
//! emitter loops. Plays the role
//! `neutronium::net::endpoint::Endpoint` plays elsewhere: the hub that owns
//! the transport and drives the protocol state machine.

use crate::config::NodeConfig;
use crate::corruption;
use crate::crc;
use crate::operator::{self, Command};
use crate::packet::{classify, DataPacket, Inbound, TOKEN_WIRE};
use crate::queue::{EnqueueResult, QueueEntry};
use crate::router::{self, RouteOutcome};
use crate::state::{self, NodeState, SharedState};
use crate::timing::{self, TimingParams};
use crate::token::{self, TokenOutcome};
use crate::transport::Transport;
use slog::{info, warn, Logger};
use std::io::{self, BufRead};
use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

enum NextStep {
    Transmit(QueueEntry),
    HoldThenForward,
    Nothing,
}

pub struct Engine<T: Transport> {
    nickname: String,
    right_neighbor: SocketAddr,
    state: SharedState,
    transport: Arc<T>,
    log: Logger,
}

impl<T: Transport> Engine<T> {
    pub fn new(config: &NodeConfig, transport: T, log: Logger, corruption_enabled: bool) -> Engine<T> {
        let state = state::shared(NodeState::new(config.token_hold_time, corruption_enabled));
        Engine {
            nickname: config.nickname.clone(),
            right_neighbor: config.right_neighbor,
            state,
            transport: Arc::new(transport),
            log,
        }
    }

    /// Test/embedder constructor giving direct access to the shared state and
    /// transport handle, so scenarios can be seeded and inspected.
    #[cfg(any(test, feature = "test-util"))]
    pub fn new_with(
        nickname: impl Into<String>,
        right_neighbor: SocketAddr,
        state: SharedState,
        transport: Arc<T>,
        log: Logger,
    ) -> Engine<T> {
        Engine {
            nickname: nickname.into(),
            right_neighbor,
            state,
            transport,
            log,
        }
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    /// Stops all loops; used by `/sair` and by callers driving the engine
    /// programmatically (tests, embedders).
    pub fn shutdown(&self) {
        self.state.lock().unwrap().running = false;
    }

    /// Runs the initial-token emitter: after the configured delay, only the
    /// configured originator mints the first token.
    pub fn run_initial_emitter(&self, is_originator: bool) {
        if !is_originator {
            return;
        }
        thread::sleep(timing::INITIAL_TOKEN_DELAY);
        if !self.is_running() {
            return;
        }
        {
            let mut state = self.state.lock().unwrap();
            state.token_holder = false;
            state.last_token_time = Some(Instant::now());
            state.time_i_last_sent_token = Some(Instant::now());
        }
        info!(self.log, "{}: minting initial token", self.nickname);
        if let Err(err) = self.send_token() {
            warn!(self.log, "{}: failed to send initial token: {}", self.nickname, err);
        }
    }

    pub fn run_receiver(&self) {
        while self.is_running() {
            match self.transport.recv_timeout(timing::RECV_TIMEOUT) {
                Ok(None) => continue,
                Ok(Some((bytes, addr))) => self.handle_inbound(&bytes, addr),
                Err(err) => warn!(self.log, "{}: receive error: {}", self.nickname, err),
            }
        }
    }

    pub fn run_monitor(&self) {
        while self.is_running() {
            thread::sleep(timing::MONITOR_PERIOD);
            if !self.is_running() {
                break;
            }
            self.monitor_tick();
        }
    }

    pub fn run_operator(&self) {
        let (tx, rx) = mpsc::channel::<String>();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(l) => {
                        if tx.send(l).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        while self.is_running() {
            match rx.recv_timeout(timing::OPERATOR_POLL_INTERVAL) {
                Ok(line) => {
                    if let Some(cmd) = operator::parse(&line) {
                        self.handle_command(cmd);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn handle_inbound(&self, bytes: &[u8], addr: SocketAddr) {
        let payload = match std::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(_) => {
                warn!(self.log, "{}: dropped non-utf8 datagram from {}", self.nickname, addr);
                return;
            }
        };

        match classify(payload) {
            Some(Inbound::Token) => {
                let outcome = {
                    let mut state = self.state.lock().unwrap();
                    token::on_token_received(&mut state, &self.nickname, Instant::now(), &self.log)
                };
                match outcome {
                    TokenOutcome::Duplicate => {}
                    TokenOutcome::AcceptedWithData => self.transmit_head(),
                    TokenOutcome::AcceptedEmpty => self.hold_then_forward(),
                }
            }
            Some(Inbound::Data(packet)) => {
                let outcome = {
                    let mut state = self.state.lock().unwrap();
                    router::route(&self.nickname, &mut state, packet, &self.log)
                };
                match outcome {
                    RouteOutcome::Forward(packet) => {
                        if let Err(err) = self.send_packet(&packet) {
                            warn!(self.log, "{}: failed to forward packet: {}", self.nickname, err);
                        }
                    }
                    RouteOutcome::SelfReturned => self.continue_after_disposition(),
                }
            }
            None => {
                info!(self.log, "{}: dropped malformed/unrecognized payload from {}", self.nickname, addr);
            }
        }
    }

    fn monitor_tick(&self) {
        let now = Instant::now();
        let regenerated = {
            let mut state = self.state.lock().unwrap();
            token::check_token_loss(&mut state, &self.nickname, now, &self.log)
        };
        if regenerated {
            self.promote_then_forward();
        }
    }

    fn handle_command(&self, command: Command) {
        match command {
            Command::Enqueue { dest, message } => self.handle_enqueue(dest, message),
            Command::ForceToken => self.handle_force_token(),
            Command::RemoveToken => {
                let mut state = self.state.lock().unwrap();
                state.token_holder = false;
                info!(self.log, "{}: operator removed the token (will not be forwarded)", self.nickname);
            }
            Command::ClearQueue => {
                let mut state = self.state.lock().unwrap();
                state.queue.drain();
                println!("[{}] outbound queue cleared.", self.nickname);
            }
            Command::DuplicateToken => {
                let _ = self.send_token();
                let _ = self.send_token();
                info!(self.log, "{}: operator sent a duplicate token", self.nickname);
            }
            Command::RingStatus => {
                let state = self.state.lock().unwrap();
                println!("[{}] ring status:", self.nickname);
                println!("  token: {}", state.token_holder);
                println!("  queue empty: {}", state.queue.is_empty());
                println!("  waiting for answer: {}", state.waiting_for_answer);
            }
            Command::Debug => {
                let state = self.state.lock().unwrap();
                let since_token = state
                    .last_token_time
                    .map(|t| format!("{:?} ago", t.elapsed()))
                    .unwrap_or_else(|| "never".to_string());
                println!("[{}] DEBUG STATUS", self.nickname);
                println!("  holds token? {}", state.token_holder);
                println!("  waiting for ACK/NAK? {}", state.waiting_for_answer);
                println!("  last token seen: {}", since_token);
            }
            Command::ShowQueue => {
                let state = self.state.lock().unwrap();
                println!("[{}] current queue:", self.nickname);
                for (i, entry) in state.queue.iter().enumerate() {
                    println!("  {}. to {} - \"{}\" (attempts: {})", i + 1, entry.dest, entry.content, entry.attempts);
                }
            }
            Command::SetHoldTime(value) => {
                let mut state = self.state.lock().unwrap();
                state.timing = TimingParams::new(value);
                println!("[{}] token hold time set to {} seconds.", self.nickname, value);
            }
            Command::Help => print_help(&self.nickname),
            Command::Shutdown => {
                self.shutdown();
                info!(self.log, "{}: operator requested shutdown", self.nickname);
            }
            Command::Invalid(raw) => {
                println!("[{}] invalid command: {}", self.nickname, raw);
            }
        }
    }

    fn handle_enqueue(&self, dest: String, message: String) {
        let should_transmit = {
            let mut state = self.state.lock().unwrap();
            match state.queue.enqueue(QueueEntry::new(dest, message)) {
                EnqueueResult::Full => {
                    println!("[{}] queue full, could not enqueue.", self.nickname);
                    false
                }
                EnqueueResult::Ok => {
                    if state.token_holder && !state.waiting_for_answer {
                        state.waiting_for_answer = true;
                        true
                    } else {
                        false
                    }
                }
            }
        };
        if should_transmit {
            println!("[{}] holds token, sending...", self.nickname);
            self.transmit_head();
        }
    }

    fn handle_force_token(&self) {
        let promoted = {
            let mut state = self.state.lock().unwrap();
            if state.token_holder {
                false
            } else {
                state.token_holder = true;
                state.last_token_time = Some(Instant::now());
                true
            }
        };
        if promoted {
            self.promote_then_forward();
        }
    }

    /// Flips a momentarily-held token back to "forwarded" and sends it,
    /// without the hold-for-T delay: used by the monitor's regeneration and
    /// by the operator's `/forcartoken`, neither of which wait on a queue.
    fn promote_then_forward(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.token_holder = false;
            state.time_i_last_sent_token = Some(Instant::now());
        }
        if let Err(err) = self.send_token() {
            warn!(self.log, "{}: failed to forward token: {}", self.nickname, err);
        }
    }

    /// Sends the current queue head, assuming `waiting_for_answer` has
    /// already been set by the caller under the lock.
    fn transmit_head(&self) {
        let entry = {
            let state = self.state.lock().unwrap();
            state.queue.peek().cloned()
        };
        if let Some(entry) = entry {
            let packet = self.build_and_sign(&entry);
            info!(self.log, "{}: sending to {} (attempt {}) via {}", self.nickname, entry.dest, entry.attempts + 1, self.right_neighbor);
            if let Err(err) = self.send_packet(&packet) {
                self.handle_send_failure(err);
            }
        }
    }

    /// After a round-trip disposition, either transmits the (possibly still
    /// pending) head or holds-then-forwards.
    fn continue_after_disposition(&self) {
        let step = {
            let mut state = self.state.lock().unwrap();
            if !state.token_holder {
                NextStep::Nothing
            } else if let Some(entry) = state.queue.peek().cloned() {
                state.waiting_for_answer = true;
                NextStep::Transmit(entry)
            } else {
                NextStep::HoldThenForward
            }
        };
        match step {
            NextStep::Transmit(entry) => {
                let packet = self.build_and_sign(&entry);
                if let Err(err) = self.send_packet(&packet) {
                    self.handle_send_failure(err);
                }
            }
            NextStep::HoldThenForward => self.hold_then_forward(),
            NextStep::Nothing => {}
        }
    }

    /// Give up on this turn, keep the ring alive by holding briefly then
    /// forwarding the token.
    fn handle_send_failure(&self, err: io::Error) {
        warn!(self.log, "{}: error sending data: {}", self.nickname, err);
        {
            let mut state = self.state.lock().unwrap();
            state.waiting_for_answer = false;
        }
        self.hold_then_forward();
    }

    /// Holds an empty queue for T seconds (outside the lock), then forwards
    /// the token if nothing changed in the meantime.
    fn hold_then_forward(&self) {
        let hold_duration = self.state.lock().unwrap().timing.hold_duration();
        thread::sleep(hold_duration);

        let should_forward = {
            let mut state = self.state.lock().unwrap();
            if state.token_holder && state.queue.is_empty() && !state.waiting_for_answer {
                state.token_holder = false;
                state.time_i_last_sent_token = Some(Instant::now());
                true
            } else {
                false
            }
        };
        if should_forward {
            if let Err(err) = self.send_token() {
                warn!(self.log, "{}: failed to forward token: {}", self.nickname, err);
            }
        }
    }

    fn build_and_sign(&self, entry: &QueueEntry) -> DataPacket {
        let mut packet = DataPacket::new(self.nickname.clone(), entry.dest.clone(), entry.content.clone());
        let canonical = crc::canonical_form(&packet.src, &packet.dest, &packet.status_raw, &packet.message);
        packet.set_crc(crc::compute_crc(&canonical));

        let corruption_enabled = self.state.lock().unwrap().corruption_enabled;
        if corruption_enabled {
            let mut rng = rand::thread_rng();
            corruption::maybe_corrupt(&mut packet.message, &mut rng);
        }
        packet
    }

    fn send_packet(&self, packet: &DataPacket) -> io::Result<()> {
        self.transport.send_to(self.right_neighbor, packet.encode().as_bytes())
    }

    fn send_token(&self) -> io::Result<()> {
        self.transport.send_to(self.right_neighbor, TOKEN_WIRE.as_bytes())
    }
}


fn print_help(nickname: &str) {
    println!("[{}] available commands:", nickname);
    println!("  <dest> <message>   enqueue an outbound message");
    println!("  /forcartoken       self-promote and forward the token");
    println!("  /removertoken      drop the token without forwarding");
    println!("  /limparfila        clear the outbound queue");
    println!("  /duplicartoken     send two tokens back to back");
    println!("  /statusanel        show ring status");
    println!("  /debug             show debug status");
    println!("  /mostrafila        show the outbound queue");
    println!("  /tempo <seconds>   retune the hold time T");
    println!("  /sair              shut down this node");
}
