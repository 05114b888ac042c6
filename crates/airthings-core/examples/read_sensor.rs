//! Example: Reading Current Sensor Values
//!
//! This example connects to one Airthings device, prints its identity
//! and every value it reports.
//!
//! Run with: `cargo run --example read_sensor -- <MAC_ADDRESS>`

use std::collections::BTreeMap;
use std::env;

use airthings_core::{DeviceSession, MacAddress, RetryConfig, ScanOptions, WaveBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let Some(arg) = args.get(1) else {
        eprintln!("Usage: {} <MAC_ADDRESS>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} AA:BB:CC:DD:EE:FF", args[0]);
        std::process::exit(1);
    };
    let mac: MacAddress = arg.parse()?;

    let backend = WaveBackend::new(ScanOptions::default()).await?;
    let mut session = DeviceSession::new(backend, RetryConfig::default());
    session
        .setup(BTreeMap::from([(mac, "Airthings".to_string())]))
        .await?;

    println!("Reading device information from {}...", mac);
    session.fetch_device_info().await?;
    if let Some(device) = session.device(&mac) {
        if let Some(info) = &device.info {
            println!("  Manufacturer: {}", info.manufacturer);
            println!("  Model:        {}", info.model_nr);
            println!("  Serial:       {}", info.serial_nr);
            println!("  Name:         {}", info.device_name);
        }
        println!("  Sensors:      {}", device.sensors.len());
    }

    println!();
    println!("Current Readings:");
    let readings = session.fetch_readings().await?;
    for reading in readings.iter() {
        println!("  {:<20} {}", reading.field, reading.value);
    }

    Ok(())
}
