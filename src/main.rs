use clap::{App, Arg};
use ringnode::transport::UdpTransport;
use ringnode::{Engine, NodeConfig};
use std::process;
use std::sync::Arc;
use std::thread;

fn main() {
    let matches = App::new("ringnode")
        .version("0.1.0")
        .about("Token-passing ring network node over unreliable UDP unicast")
        .arg(
            Arg::with_name("config")
                .help("path to the node's 4-line config file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("port")
                .help("local UDP port to bind")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("corrupt")
                .long("corrupt")
                .help("enable the test-mode outbound corruption injector"),
        )
        .get_matches();

    let config_path = matches.value_of("config").unwrap();
    let port: u16 = match matches.value_of("port").unwrap().parse() {
        Ok(port) => port,
        Err(err) => {
            eprintln!("invalid port: {}", err);
            process::exit(2);
        }
    };
    let corruption_enabled = matches.is_present("corrupt");

    let config = match NodeConfig::load(config_path, port) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(2);
        }
    };

    let log = match ringnode::logging::init(&config.nickname) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("could not open log file for {}: {}", config.nickname, err);
            process::exit(2);
        }
    };

    let transport = match UdpTransport::bind(config.local_bind_port) {
        Ok(transport) => transport,
        Err(err) => {
            eprintln!("failed to bind to port {}: {}", config.local_bind_port, err);
            process::exit(2);
        }
    };

    let engine = Arc::new(Engine::new(&config, transport, log, corruption_enabled));
    let is_originator = config.is_token_originator;

    println!(
        "[{}] node up, right neighbor {}, hold time {}s{}",
        config.nickname,
        config.right_neighbor,
        config.token_hold_time,
        if corruption_enabled { " (corruption enabled)" } else { "" }
    );

    let receiver = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.run_receiver())
    };
    let monitor = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.run_monitor())
    };
    let emitter = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.run_initial_emitter(is_originator))
    };

    // The operator console runs on the main thread; it owns stdin.
    engine.run_operator();

    let _ = receiver.join();
    let _ = monitor.join();
    let _ = emitter.join();
}
