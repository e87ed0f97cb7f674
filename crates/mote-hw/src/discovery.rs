//! Serial port discovery.
//!
//! Matching is a pure function over [`PortDescriptor`] values so it can be
//! exercised without hardware; [`enumerate_ports`] supplies the real list.

use tokio_serial::SerialPortType;
use tracing::{debug, info};

use crate::{Error, Result, MOTE_PID, MOTE_PRODUCT_NAME, MOTE_VID};

/// A serial port as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortDescriptor {
    /// Device path, e.g. `/dev/ttyACM0`.
    pub name: String,
    /// USB vendor ID, if this is a USB port.
    pub vid: Option<u16>,
    /// USB product ID, if this is a USB port.
    pub pid: Option<u16>,
    /// USB product string, if reported.
    pub product: Option<String>,
}

/// Criterion identifying the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMatch<'a> {
    /// USB vendor and product ID.
    UsbId { vid: u16, pid: u16 },
    /// Exact USB product string.
    ProductName(&'a str),
}

impl DeviceMatch<'_> {
    /// Returns true if the port satisfies this criterion.
    pub fn matches(&self, port: &PortDescriptor) -> bool {
        match *self {
            DeviceMatch::UsbId { vid, pid } => port.vid == Some(vid) && port.pid == Some(pid),
            DeviceMatch::ProductName(name) => port.product.as_deref() == Some(name),
        }
    }
}

/// Criteria for the Mote dock: VID:PID first, then the product string.
pub const MOTE_MATCHERS: [DeviceMatch<'static>; 2] = [
    DeviceMatch::UsbId {
        vid: MOTE_VID,
        pid: MOTE_PID,
    },
    DeviceMatch::ProductName(MOTE_PRODUCT_NAME),
];

/// Returns the first port, in enumeration order, matching any criterion.
pub fn find_port<'p>(
    ports: &'p [PortDescriptor],
    matchers: &[DeviceMatch<'_>],
) -> Option<&'p PortDescriptor> {
    ports
        .iter()
        .find(|port| matchers.iter().any(|m| m.matches(port)))
}

/// Returns true if the port looks like a Mote dock.
pub fn is_mote(port: &PortDescriptor) -> bool {
    MOTE_MATCHERS.iter().any(|m| m.matches(port))
}

/// Lists the serial ports available on this system.
pub fn enumerate_ports() -> Result<Vec<PortDescriptor>> {
    let ports = tokio_serial::available_ports()?
        .into_iter()
        .map(|info| match info.port_type {
            SerialPortType::UsbPort(usb) => PortDescriptor {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product,
            },
            _ => PortDescriptor {
                name: info.port_name,
                ..Default::default()
            },
        })
        .collect::<Vec<_>>();

    for port in &ports {
        debug!(
            "Found serial port: name={}, vid={:04X?}, pid={:04X?}, product={:?}",
            port.name, port.vid, port.pid, port.product
        );
    }

    Ok(ports)
}

/// Finds the first connected Mote dock and returns its port path.
pub fn discover_port() -> Result<String> {
    let ports = enumerate_ports()?;
    let port = find_port(&ports, &MOTE_MATCHERS).ok_or(Error::DeviceNotFound)?;
    info!("Found Mote connected to port: {}", port.name);
    Ok(port.name.clone())
}
