//! airthings-mqtt - Airthings BLE to MQTT bridge.
//!
//! Run with: `cargo run -p airthings-mqtt`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use airthings_core::{DeviceSession, MacAddress, ScanOptions, Setup, WaveBackend};
use airthings_mqtt::config::parse_bool;
use airthings_mqtt::suggest::{suggested_config, suggestion};
use airthings_mqtt::{Bridge, BrokerOptions, CliOverrides, Config, RumqttSink};

/// Bridge Airthings BLE sensors to MQTT with Home Assistant discovery.
#[derive(Parser, Debug)]
#[command(name = "airthings-mqtt")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (.toml, otherwise JSON).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// MQTT broker host (overrides config).
    #[arg(long, global = true)]
    mqtt_host: Option<String>,

    /// MQTT broker port (overrides config).
    #[arg(long, global = true)]
    mqtt_port: Option<u16>,

    /// MQTT user name (overrides config).
    #[arg(long, global = true)]
    mqtt_username: Option<String>,

    /// MQTT password (overrides config).
    #[arg(long, global = true)]
    mqtt_password: Option<String>,

    /// Retain value messages (overrides config).
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_bool
    )]
    mqtt_retain: Option<bool>,

    /// CRITICAL, ERROR, WARNING, INFO or DEBUG (overrides config).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            mqtt_host: self.mqtt_host.clone(),
            mqtt_port: self.mqtt_port,
            mqtt_username: self.mqtt_username.clone(),
            mqtt_password: self.mqtt_password.clone(),
            mqtt_retain: self.mqtt_retain,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll devices and publish readings (default behavior).
    Run,

    /// Scan for Airthings devices and print a suggested configuration.
    Scan,

    /// Scan for Airthings devices and write a configuration file.
    Init {
        /// File to write (.toml, otherwise JSON).
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = Config::resolve(args.config.as_deref(), &args.overrides());

    let level = match &config {
        Ok(config) => config.log_filter(),
        Err(_) => "info",
    };
    init_logging(level);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = tokio::select! {
        result = run(args.command, config) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(command: Option<Command>, config: Config) -> anyhow::Result<()> {
    let backend = WaveBackend::new(ScanOptions::default().duration(config.scan_timeout()))
        .await
        .context("No Bluetooth adapter available")?;
    let mut session = DeviceSession::new(backend, config.retry());

    match command {
        Some(Command::Scan) => {
            let macs = discover(&mut session).await?;
            print!("{}", suggestion(&config, &macs)?);
            Ok(())
        }
        Some(Command::Init { output }) => {
            let macs = discover(&mut session).await?;
            suggested_config(&config, &macs)
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote configuration for {} device(s) to {}", macs.len(), output.display());
            Ok(())
        }
        Some(Command::Run) | None => run_bridge(session, config).await,
    }
}

async fn discover(session: &mut DeviceSession<WaveBackend>) -> anyhow::Result<Vec<MacAddress>> {
    match session.setup(Default::default()).await? {
        Setup::Discovered(macs) => Ok(macs),
        Setup::Configured => Ok(Vec::new()),
    }
}

async fn run_bridge(mut session: DeviceSession<WaveBackend>, config: Config) -> anyhow::Result<()> {
    match session.setup(config.valid_devices()).await? {
        Setup::Configured => {}
        Setup::Discovered(macs) => {
            print!("{}", suggestion(&config, &macs)?);
            return Ok(());
        }
    }

    session
        .fetch_device_info()
        .await
        .context("Failed to read device info")?;

    let sink = RumqttSink::new(BrokerOptions::from_config(&config));
    let mut bridge = Bridge::new(session, sink, &config);
    bridge.run().await?;
    Ok(())
}
