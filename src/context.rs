/// USB backend lifecycle and device discovery
///
/// A [`Context`] owns the USB backend for its lifetime; sessions can only
/// be opened through a live context, and dropping the context tears the
/// backend down.
use log::debug;

use crate::error::{DiscFerretError, Result};

/// USB vendor ID of DiscFerret hardware
pub const VENDOR_ID: u16 = 0x04D8;
/// USB product ID of DiscFerret hardware
pub const PRODUCT_ID: u16 = 0xFBBB;

/// A discovered but unclaimed DiscFerret device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// USB vendor ID
    pub vendor_id: u16,
    /// USB product ID
    pub product_id: u16,
    /// Product name string; empty if the device does not report one
    pub product: String,
    /// Manufacturer string; empty if the device does not report one
    pub manufacturer: String,
    /// Serial number string; empty if the device does not report one
    pub serial_number: String,
}

/// Library context owning the USB backend
pub struct Context {
    usb: rusb::Context,
}

impl Context {
    /// Initialise the USB backend
    pub fn new() -> Result<Self> {
        let usb = rusb::Context::new()?;
        Ok(Context { usb })
    }

    /// Enumerate attached DiscFerret devices.
    ///
    /// Returns one entry per device matching the DiscFerret vendor/product
    /// identifiers. Devices that cannot be opened for string descriptor
    /// reads (typically because another process holds them) are skipped.
    pub fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        use rusb::UsbContext;

        let mut found = Vec::new();
        for device in self.usb.devices()?.iter() {
            let desc = match device.device_descriptor() {
                Ok(desc) => desc,
                Err(_) => continue,
            };
            if desc.vendor_id() != VENDOR_ID || desc.product_id() != PRODUCT_ID {
                continue;
            }
            let handle = match device.open() {
                Ok(handle) => handle,
                Err(_) => continue,
            };
            found.push(DeviceInfo {
                vendor_id: desc.vendor_id(),
                product_id: desc.product_id(),
                product: handle.read_product_string_ascii(&desc).unwrap_or_default(),
                manufacturer: handle
                    .read_manufacturer_string_ascii(&desc)
                    .unwrap_or_default(),
                serial_number: handle
                    .read_serial_number_string_ascii(&desc)
                    .unwrap_or_default(),
            });
        }
        debug!("enumeration found {} device(s)", found.len());
        Ok(found)
    }

    /// Open and return a handle to the first DiscFerret whose serial number
    /// matches, or the first available one when no serial is given.
    pub(crate) fn open_handle(
        &self,
        serial: Option<&str>,
    ) -> Result<rusb::DeviceHandle<rusb::Context>> {
        use rusb::UsbContext;

        for device in self.usb.devices()?.iter() {
            let desc = match device.device_descriptor() {
                Ok(desc) => desc,
                Err(_) => continue,
            };
            if desc.vendor_id() != VENDOR_ID || desc.product_id() != PRODUCT_ID {
                continue;
            }
            let handle = match device.open() {
                Ok(handle) => handle,
                Err(_) => continue,
            };
            match serial {
                None => return Ok(handle),
                Some(wanted) => {
                    let sn = handle.read_serial_number_string_ascii(&desc).unwrap_or_default();
                    if sn == wanted {
                        return Ok(handle);
                    }
                }
            }
        }
        Err(DiscFerretError::NoDevice)
    }
}
