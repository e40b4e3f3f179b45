//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable device ID in the form `RC-XXYYZZ` (last 3 bytes of
//! the 6-byte MAC in uppercase hex), plus per-attempt broker client IDs.
//! The broker drops the older of two sessions with the same client ID, so
//! every connection attempt appends a fresh random suffix — a stale
//! half-open session from a previous boot can then never collide with the
//! live one.

/// Fixed-size device ID string: "RC-XXYYZZ".
pub type DeviceIdString = heapless::String<16>;

/// Client ID with random suffix: "roomctl-XXYYZZ-FFFF".
pub type ClientIdString = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Fixed MAC for host-side simulation.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x24, 0x6F, 0x28, 0xAB, 0xCD, 0xEF]
}

/// Stable human-readable device ID: `RC-XXYYZZ`.
pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    // 9 ASCII chars always fit in the 16-byte buffer.
    let _ = core::fmt::Write::write_fmt(
        &mut id,
        format_args!("RC-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]),
    );
    id
}

/// Randomized broker client ID for one connection attempt.
pub fn client_id(mac: &MacAddress) -> ClientIdString {
    let mut id = ClientIdString::new();
    let _ = core::fmt::Write::write_fmt(
        &mut id,
        format_args!(
            "roomctl-{:02X}{:02X}{:02X}-{:04X}",
            mac[3],
            mac[4],
            mac[5],
            random_suffix()
        ),
    );
    id
}

#[cfg(target_os = "espidf")]
fn random_suffix() -> u16 {
    // Hardware RNG; entropy quality is irrelevant here, only uniqueness.
    (unsafe { esp_idf_svc::sys::esp_random() } & 0xFFFF) as u16
}

#[cfg(not(target_os = "espidf"))]
fn random_suffix() -> u16 {
    use std::time::{SystemTime, UNIX_EPOCH};
    // Sub-microsecond clock bits are plenty for sim-side uniqueness.
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos ^ (nanos >> 16)) as u16
}
