//! Device discovery and scanning.
//!
//! This module provides functionality to scan for Airthings devices
//! using Bluetooth Low Energy, and to look up the peripherals behind
//! configured MAC addresses.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::sleep;
use tracing::{debug, info};

use airthings_types::MacAddress;
use airthings_types::ble::MANUFACTURER_ID;

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::util::mac_from_bdaddr;

/// Information about a discovered Airthings device.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// The Bluetooth address.
    pub mac: MacAddress,
    /// The advertised name, if any.
    pub name: Option<String>,
    /// RSSI signal strength.
    pub rssi: Option<i16>,
    /// Serial number carried in the manufacturer data, if present.
    pub serial_nr: Option<u32>,
}

/// Options for scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to scan for devices.
    pub duration: Duration,
    /// Only return devices that advertise the Airthings manufacturer id.
    pub filter_airthings_only: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            filter_airthings_only: true,
        }
    }
}

impl ScanOptions {
    /// Create new scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set scan duration in seconds.
    #[must_use]
    pub fn duration_secs(mut self, secs: u64) -> Self {
        self.duration = Duration::from_secs(secs);
        self
    }

    /// Set whether to filter for Airthings devices only.
    #[must_use]
    pub fn filter_airthings_only(mut self, filter: bool) -> Self {
        self.filter_airthings_only = filter;
        self
    }
}

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter))
}

/// Scan for Airthings devices with custom options.
pub async fn scan_with_options(options: ScanOptions) -> Result<Vec<DiscoveredDevice>> {
    let adapter = get_adapter().await?;
    scan_with_adapter(&adapter, &options).await
}

/// Scan for devices using a specific adapter.
///
/// An empty list indicates no devices were found (not an error).
pub async fn scan_with_adapter(
    adapter: &Adapter,
    options: &ScanOptions,
) -> Result<Vec<DiscoveredDevice>> {
    info!(
        "Starting BLE scan for {} seconds...",
        options.duration.as_secs()
    );

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    let peripherals = adapter.peripherals().await?;
    let mut discovered = Vec::new();

    for peripheral in peripherals {
        match process_peripheral(&peripheral, options.filter_airthings_only).await {
            Ok(Some(device)) => {
                info!("Found Airthings device {} ({:?})", device.mac, device.name);
                discovered.push(device);
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Error processing peripheral: {}", e);
            }
        }
    }

    info!("Scan complete. Found {} device(s)", discovered.len());
    Ok(discovered)
}

async fn process_peripheral(
    peripheral: &Peripheral,
    filter_airthings_only: bool,
) -> Result<Option<DiscoveredDevice>> {
    let Some(properties) = peripheral.properties().await? else {
        return Ok(None);
    };

    if filter_airthings_only && !is_airthings_device(&properties.manufacturer_data) {
        return Ok(None);
    }

    let Some(mac) = mac_from_bdaddr(properties.address) else {
        debug!(
            "Skipping {:?}: platform does not expose its address",
            properties.local_name
        );
        return Ok(None);
    };

    Ok(Some(DiscoveredDevice {
        mac,
        name: properties.local_name,
        rssi: properties.rssi,
        serial_nr: serial_from_manufacturer_data(&properties.manufacturer_data),
    }))
}

/// Check whether advertisement manufacturer data carries the Airthings id.
pub fn is_airthings_device(manufacturer_data: &HashMap<u16, Vec<u8>>) -> bool {
    manufacturer_data.contains_key(&MANUFACTURER_ID)
}

/// The serial number Airthings devices put in the first four bytes of their
/// manufacturer data (little endian).
fn serial_from_manufacturer_data(manufacturer_data: &HashMap<u16, Vec<u8>>) -> Option<u32> {
    let data = manufacturer_data.get(&MANUFACTURER_ID)?;
    let bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// Look up the peripherals behind a set of MAC addresses.
///
/// Known peripherals are checked first; if any address is missing a scan of
/// `options.duration` is run and the lookup repeated. Every address must be
/// found.
pub async fn find_peripherals(
    adapter: &Adapter,
    macs: &[MacAddress],
    options: &ScanOptions,
) -> Result<BTreeMap<MacAddress, Peripheral>> {
    let mut found = known_peripherals(adapter, macs).await?;

    if found.len() < macs.len() {
        debug!(
            "{} of {} device(s) not cached, scanning",
            macs.len() - found.len(),
            macs.len()
        );
        adapter.start_scan(ScanFilter::default()).await?;
        sleep(options.duration).await;
        adapter.stop_scan().await?;
        found = known_peripherals(adapter, macs).await?;
    }

    if let Some(missing) = macs.iter().find(|mac| !found.contains_key(mac)) {
        return Err(Error::device_not_found(missing.to_string()));
    }
    Ok(found)
}

async fn known_peripherals(
    adapter: &Adapter,
    macs: &[MacAddress],
) -> Result<BTreeMap<MacAddress, Peripheral>> {
    let mut found = BTreeMap::new();
    for peripheral in adapter.peripherals().await? {
        let Ok(Some(props)) = peripheral.properties().await else {
            continue;
        };
        if let Some(mac) = mac_from_bdaddr(props.address)
            && macs.contains(&mac)
        {
            found.insert(mac, peripheral);
        }
    }
    Ok(found)
}
