//! nspwheel Simulator Binary
//!
//! Serves a simulated RW4-12 over TCP, one client at a time.

use std::net::TcpListener;

use clap::Parser;
use nspwheel::config::parse_addr;
use nspwheel::session::rad_s_to_rpm;
use nspwheel::sim::SimulatedWheel;
use nspwheel::{TcpTransport, WheelError};
use tracing_subscriber::{fmt, EnvFilter};

/// nspwheel Simulator
#[derive(Parser, Debug)]
#[command(name = "nspwheel-sim")]
#[command(about = "Simulated RW4-12 reaction wheel speaking NSP over TCP")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7000")]
    listen: String,

    /// Wheel NSP address
    #[arg(short, long, default_value = "0x20", value_parser = parse_addr)]
    address: u8,

    /// Start in the bootloader (INIT required before file access)
    #[arg(long)]
    bootloader: bool,

    /// Drop this many replies before answering normally
    #[arg(long, default_value = "0")]
    drop_replies: u32,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nspwheel=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("nspwheel simulator v{}", nspwheel::VERSION);
    tracing::info!("Wheel address: 0x{:02x}", args.address);

    let mut sim = SimulatedWheel::new(args.address);
    if args.bootloader {
        sim = sim.in_bootloader();
    }
    let drop_replies = args.drop_replies;
    sim.inject(|f| f.drop_replies = drop_replies);

    let listener = match TcpListener::bind(&args.listen) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", args.listen);

    for stream in listener.incoming() {
        let accepted = stream
            .map_err(WheelError::from)
            .and_then(TcpTransport::from_stream);
        let transport = match accepted {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Failed to accept connection: {}", e);
                continue;
            }
        };

        tracing::info!("Client connected from {}", transport.addr());
        if let Err(e) = sim.serve(transport) {
            tracing::warn!("Client session ended with error: {}", e);
        }
        let state = sim.snapshot();
        tracing::info!(
            "Client disconnected; wheel mode {} at {:.1} RPM, {} packets handled",
            state.mode,
            rad_s_to_rpm(state.speed_rad_s),
            state.packets_received
        );
    }
}
