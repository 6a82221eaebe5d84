//! Scenario driver for arpforge
//!
//! Builds a shared segment with an attacker port, configures one poisoning
//! generator, schedules its start and stop hooks, runs the event queue to
//! completion, and prints what went over the wire.

use arpforge_attack::AppManager;
use arpforge_core::{Error, MacAddr, Result};
use arpforge_protocols::arp::{ArpSpoofApp, SpoofConfig};
use arpforge_sim::{Segment, SimScheduler};
use clap::Parser;
use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "arpforge")]
#[command(version, about = "Simulated ARP cache poisoning traffic generator", long_about = None)]
struct Cli {
    /// MAC address the forged replies claim to come from
    #[arg(long, default_value = "aa:aa:aa:aa:aa:01")]
    impersonated_mac: MacAddr,

    /// IP address whose binding the forged replies overwrite
    #[arg(long, default_value = "10.0.0.2")]
    impersonated_ip: Ipv4Addr,

    /// MAC address the forged replies are sent to
    #[arg(long, default_value = "aa:aa:aa:aa:aa:00")]
    victim_mac: MacAddr,

    /// IP address of the victim
    #[arg(long, default_value = "10.0.0.1")]
    victim_ip: Ipv4Addr,

    /// Nominal packet size in bytes, used for pacing
    #[arg(long, default_value_t = 1040)]
    packet_size: u32,

    /// Maximum number of packets to send (0 = unbounded)
    #[arg(short = 'n', long, default_value_t = 1000)]
    count: u32,

    /// Target sustained bit rate in bits per second
    #[arg(short = 'r', long, default_value_t = 1_000_000)]
    rate_bps: u64,

    /// Simulated start time in seconds
    #[arg(long, default_value_t = 2.0)]
    start: f64,

    /// Simulated stop time in seconds
    #[arg(long, default_value_t = 6.0)]
    stop: f64,

    /// Print each transmission
    #[arg(long)]
    dump: bool,

    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(cli: Cli) -> Result<()> {
    if cli.stop <= cli.start {
        return Err(Error::configuration(
            "stop",
            "must be later than the start time",
        ));
    }
    let engine = SimScheduler::new();
    let segment = Segment::new(engine.clone());
    let manager = AppManager::new(engine.clone());

    let app = ArpSpoofApp::new();
    app.configure(SpoofConfig {
        device: segment.attach(cli.impersonated_mac),
        impersonated_mac: cli.impersonated_mac,
        impersonated_ip: cli.impersonated_ip,
        victim_mac: cli.victim_mac,
        victim_ip: cli.victim_ip,
        packet_size: cli.packet_size,
        max_packets: cli.count,
        rate_bps: cli.rate_bps,
    })?;

    let id = manager.register("poisoner", app);
    manager.start_after(id, Duration::from_secs_f64(cli.start))?;
    manager.stop_after(id, Duration::from_secs_f64(cli.stop))?;

    let fired = engine.run();
    info!(events = fired, "event queue drained");

    let log = segment.transmissions();
    if cli.dump {
        for tx in &log {
            println!(
                "{:>12.6}s  {} -> {}  0x{:04x}  {} bytes",
                tx.at.as_secs_f64(),
                tx.source,
                tx.destination,
                tx.ethertype,
                tx.payload.len()
            );
        }
    }

    let stats = manager.info(id)?.stats;
    println!(
        "{} forged replies ({} bytes) for {} as {}, sent to {} between {:.6}s and {:.6}s",
        stats.packets_sent,
        stats.bytes_sent,
        cli.impersonated_ip,
        cli.impersonated_mac,
        cli.victim_mac,
        log.first().map_or(0.0, |tx| tx.at.as_secs_f64()),
        log.last().map_or(0.0, |tx| tx.at.as_secs_f64()),
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
