//! Example: Scanning for Airthings Devices
//!
//! This example demonstrates how to scan for Airthings devices
//! using Bluetooth Low Energy. It will discover any Wave, Wave Plus,
//! Wave 2 or Wave Mini in range.
//!
//! Run with: `cargo run --example scan_devices`

use airthings_core::scan::{self, ScanOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("Scanning for Airthings devices...");
    println!();

    let options = ScanOptions::default().duration_secs(10);
    let devices = scan::scan_with_options(options).await?;

    if devices.is_empty() {
        println!("No Airthings devices found.");
        println!();
        println!("Make sure:");
        println!("  - Your Airthings device has batteries in it");
        println!("  - Bluetooth is enabled on this computer");
        println!("  - The official app is not connected to the device");
    } else {
        println!("Found {} device(s):", devices.len());
        println!();

        for device in &devices {
            let name = device.name.as_deref().unwrap_or("Unknown");
            let rssi = device
                .rssi
                .map(|r| format!("{} dBm", r))
                .unwrap_or_else(|| "N/A".to_string());

            println!("  {}", name);
            println!("    MAC: {}", device.mac);
            println!("    RSSI: {}", rssi);
            if let Some(serial) = device.serial_nr {
                println!("    Serial: {}", serial);
            }
            println!();
        }
    }

    Ok(())
}
