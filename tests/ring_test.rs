use ringnode::engine::Engine;
use ringnode::packet::{DataPacket, Status, TOKEN_WIRE};
use ringnode::queue::QueueEntry;
use ringnode::state::{self, NodeState};
use ringnode::transport::FakeTransport;
use slog::Logger;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn logger() -> Logger {
    Logger::root(slog::Discard, slog::o!())
}

fn addr() -> std::net::SocketAddr {
    "127.0.0.1:9100".parse().unwrap()
}

#[test]
fn receiver_loop_forwards_a_token_with_a_queued_entry() {
    let mut node_state = NodeState::new(1, false);
    node_state.queue.enqueue(QueueEntry::new("B", "hello"));
    let shared = state::shared(node_state);
    let transport = Arc::new(FakeTransport::new());
    transport.push_inbound(TOKEN_WIRE.as_bytes(), addr());

    let engine = Arc::new(Engine::new_with("A", addr(), shared, Arc::clone(&transport), logger()));

    let receiver = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.run_receiver())
    };

    // Give the receiver a moment to drain the one queued inbound datagram.
    thread::sleep(Duration::from_millis(50));
    engine.shutdown();
    receiver.join().unwrap();

    let sent = transport.sent_messages();
    assert_eq!(sent.len(), 1);
    let packet = DataPacket::decode(std::str::from_utf8(&sent[0].1).unwrap()).unwrap();
    assert_eq!(packet.dest, "B");
    assert!(engine.state().lock().unwrap().waiting_for_answer);
}

#[test]
fn receiver_loop_answers_a_unicast_addressed_to_self() {
    let shared = state::shared(NodeState::new(1, false));
    let transport = Arc::new(FakeTransport::new());

    let mut packet = DataPacket::new("C", "A", "ping");
    packet.set_status(Status::NoSuchDestination);
    let canonical = ringnode::crc::canonical_form(&packet.src, &packet.dest, &packet.status_raw, &packet.message);
    packet.set_crc(ringnode::crc::compute_crc(&canonical));
    transport.push_inbound(packet.encode().as_bytes(), addr());

    let engine = Arc::new(Engine::new_with("A", addr(), shared, Arc::clone(&transport), logger()));
    let receiver = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.run_receiver())
    };

    thread::sleep(Duration::from_millis(50));
    engine.shutdown();
    receiver.join().unwrap();

    let sent = transport.sent_messages();
    assert_eq!(sent.len(), 1);
    let answered = DataPacket::decode(std::str::from_utf8(&sent[0].1).unwrap()).unwrap();
    assert_eq!(answered.status, Status::Ack);
}

#[test]
fn monitor_loop_regenerates_a_lost_token() {
    let mut node_state = NodeState::new(1, false);
    // No token ever seen, but a last_token_time in the past exceeding 5T.
    node_state.last_token_time = Some(std::time::Instant::now() - Duration::from_secs(10));
    let shared = state::shared(node_state);
    let transport = Arc::new(FakeTransport::new());

    let engine = Arc::new(Engine::new_with("A", addr(), shared, Arc::clone(&transport), logger()));
    let monitor = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.run_monitor())
    };

    // The monitor sleeps MONITOR_PERIOD (1s) before its first check.
    thread::sleep(Duration::from_millis(1100));
    engine.shutdown();
    monitor.join().unwrap();

    assert_eq!(transport.sent_messages().len(), 1);
    assert!(transport.sent_messages()[0].1 == TOKEN_WIRE.as_bytes());
}

#[test]
fn initial_emitter_mints_the_token_only_for_the_originator() {
    let shared = state::shared(NodeState::new(1, false));
    let transport = Arc::new(FakeTransport::new());
    let engine = Engine::new_with("A", addr(), shared, Arc::clone(&transport), logger());

    engine.run_initial_emitter(false);
    assert!(transport.sent_messages().is_empty());
}

#[test]
fn initial_emitter_forwards_the_token_and_releases_holder_status() {
    let shared = state::shared(NodeState::new(1, false));
    let transport = Arc::new(FakeTransport::new());
    let engine = Engine::new_with("A", addr(), shared, Arc::clone(&transport), logger());

    engine.run_initial_emitter(true);

    let sent = transport.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, TOKEN_WIRE.as_bytes());
    assert!(!engine.state().lock().unwrap().token_holder);
}
