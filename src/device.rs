//! Known SDR receivers, by USB vendor / product id.

use serde::Serialize;

/// Realtek vendor id, shared by every RTL28xx DVB-T dongle.
pub const RTL_VENDOR_ID: u16 = 0x0bda;

/// Name used for receivers missing from the table.
pub const UNKNOWN_DEVICE: &str = "Unknown SDR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnownDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: &'static str,
}

const fn device(vendor_id: u16, product_id: u16, name: &'static str) -> KnownDevice {
    KnownDevice {
        vendor_id,
        product_id,
        name,
    }
}

pub const KNOWN_DEVICES: &[KnownDevice] = &[
    device(0x0bda, 0x2838, "RTL2838 DVB-T"),
    device(0x0bda, 0x2832, "RTL2832U DVB-T"),
    device(0x0bda, 0x2834, "RTL2834 DVB-T"),
    device(0x0bda, 0x2837, "RTL2837 DVB-T"),
    device(0x1d50, 0x604b, "HackRF One"),
    device(0x1d50, 0x6089, "Great Scott Gadgets HackRF One"),
    device(0x1d50, 0x60a1, "Airspy Mini"),
    device(0x03eb, 0x800c, "Airspy R2"),
    device(0x03eb, 0x800d, "Airspy HF+"),
];

/// Name of a known receiver.
pub fn identify(vendor_id: u16, product_id: u16) -> Option<&'static str> {
    KNOWN_DEVICES
        .iter()
        .find(|d| d.vendor_id == vendor_id && d.product_id == product_id)
        .map(|d| d.name)
}

/// Name of a receiver, falling back to [`UNKNOWN_DEVICE`].
pub fn describe(vendor_id: u16, product_id: u16) -> &'static str {
    identify(vendor_id, product_id).unwrap_or(UNKNOWN_DEVICE)
}

pub fn is_rtl_vendor(vendor_id: u16) -> bool {
    vendor_id == RTL_VENDOR_ID
}

/// Whether the device is worth opening: a listed receiver or any Realtek dongle.
pub fn is_sdr(vendor_id: u16, product_id: u16) -> bool {
    is_rtl_vendor(vendor_id) || identify(vendor_id, product_id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify() {
        assert_eq!(identify(0x0bda, 0x2838), Some("RTL2838 DVB-T"));
        assert_eq!(identify(0x03eb, 0x800d), Some("Airspy HF+"));
        assert_eq!(identify(0x1d50, 0x0000), None);
        assert_eq!(describe(0x1234, 0x5678), UNKNOWN_DEVICE);
    }

    #[test]
    fn test_unlisted_realtek_is_sdr() {
        assert!(is_rtl_vendor(0x0bda));
        assert!(is_sdr(0x0bda, 0x2839));
        assert!(!is_sdr(0x046d, 0xc52b));
    }
}
