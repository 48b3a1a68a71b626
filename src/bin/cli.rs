//! nspwheel CLI
//!
//! Command-line interface for a reaction wheel behind a TCP serial bridge
//! (or `nspwheel-sim`).

use clap::{Parser, Subcommand};
use nspwheel::config::parse_addr;
use nspwheel::telemetry::POINTS;
use nspwheel::{Config, Reading, TcpTransport, TelemetryId, WheelMode, WheelSession};
use tracing_subscriber::{fmt, EnvFilter};

/// nspwheel CLI
#[derive(Parser, Debug)]
#[command(name = "nspwheel-cli")]
#[command(about = "Command and telemetry for an RW4-12 reaction wheel over NSP")]
#[command(version)]
struct Args {
    /// Bridge address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7000")]
    server: String,

    /// Host NSP address
    #[arg(long, default_value = "0x11", value_parser = parse_addr)]
    host_addr: u8,

    /// Wheel NSP address
    #[arg(long, default_value = "0x20", value_parser = parse_addr)]
    wheel_addr: u8,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value = "1000")]
    timeout_ms: u64,

    /// Resends before giving up
    #[arg(short, long, default_value = "2")]
    retries: u32,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the wheel and print its identity
    Ping,

    /// Start the application firmware
    Init,

    /// Read telemetry (all points when none is named)
    Telemetry {
        /// Point name (e.g. VBUS, SPEED, TEMP0) or "all"
        point: Option<String>,
    },

    /// Command IDLE
    Idle,

    /// Enter SPEED mode at the given RPM
    Speed {
        #[arg(allow_hyphen_values = true)]
        rpm: f32,
    },

    /// Enter TORQUE mode at the given N·m
    Torque {
        #[arg(allow_hyphen_values = true)]
        nm: f32,
    },

    /// Enter MOMENTUM mode at the given N·m·s
    Momentum {
        #[arg(allow_hyphen_values = true)]
        nms: f32,
    },

    /// Print the effective configuration
    Config,
}

fn find_point(name: &str) -> Option<TelemetryId> {
    POINTS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| p.id)
}

fn print_readings(readings: &[Reading], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(readings)?);
    } else {
        for reading in readings {
            println!("{}", reading);
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder()
        .host_addr(args.host_addr)
        .wheel_addr(args.wheel_addr)
        .response_timeout_ms(args.timeout_ms)
        .max_retries(args.retries)
        // A one-shot mode command must leave the wheel in that mode
        .idle_on_close(false)
        .build();

    if let Commands::Config = args.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let session = WheelSession::connect(config, TcpTransport::new(&args.server))?;

    match args.command {
        Commands::Ping => {
            let identity = session.ping()?;
            if args.json {
                println!("{}", serde_json::json!({ "identity": identity }));
            } else {
                println!("{}", identity);
            }
        }
        Commands::Init => {
            session.initialize()?;
            println!("OK");
        }
        Commands::Telemetry { point } => {
            let readings = match point.filter(|name| !name.eq_ignore_ascii_case("all")) {
                Some(name) => {
                    let id = find_point(&name).ok_or_else(|| format!("unknown telemetry point {:?}", name))?;
                    vec![session.read_telemetry(id)?]
                }
                None => session.read_all_telemetry()?,
            };
            print_readings(&readings, args.json)?;
        }
        Commands::Idle => {
            session.set_idle()?;
            println!("OK");
        }
        Commands::Speed { rpm } => {
            session.set_mode(WheelMode::Speed, rpm)?;
            println!("OK");
        }
        Commands::Torque { nm } => {
            session.set_mode(WheelMode::Torque, nm)?;
            println!("OK");
        }
        Commands::Momentum { nms } => {
            session.set_mode(WheelMode::Momentum, nms)?;
            println!("OK");
        }
        Commands::Config => {}
    }

    session.close()?;
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,nspwheel=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
