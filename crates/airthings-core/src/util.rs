//! Utility functions for airthings-core.
//!
//! This module contains shared utility functions used across the crate.

use btleplug::api::BDAddr;

use airthings_types::MacAddress;

/// Convert a btleplug Bluetooth address into a [`MacAddress`].
///
/// Returns `None` for the all-zero address, which is what CoreBluetooth
/// reports on macOS where MAC addresses are not exposed.
pub fn mac_from_bdaddr(addr: BDAddr) -> Option<MacAddress> {
    let octets = addr.into_inner();
    if octets == [0; 6] {
        None
    } else {
        Some(MacAddress::new(octets))
    }
}

/// Convert a [`MacAddress`] into a btleplug Bluetooth address.
pub fn bdaddr_from_mac(mac: &MacAddress) -> BDAddr {
    BDAddr::from(mac.octets())
}
