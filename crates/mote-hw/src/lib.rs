//! Mote Hardware Library
//!
//! Drives a Mote USB dock over its serial byte protocol: configure up to four
//! LED channels, write RGB values into a local buffer and flush the buffer to
//! the device.

pub mod channel;
pub mod device;
pub mod discovery;
pub mod error;
pub mod port;
pub mod protocol;

pub use channel::{Channel, Pixel};
pub use device::MoteDevice;
pub use discovery::{DeviceMatch, PortDescriptor};
pub use error::{Error, Result};
pub use port::Port;

/// USB VID:PID for the Mote dock
pub const MOTE_VID: u16 = 0x16D0;
pub const MOTE_PID: u16 = 0x08C4;

/// USB product string reported by the Mote dock.
pub const MOTE_PRODUCT_NAME: &str = "Mote USB Dock";

/// Serial baud rate.
pub const BAUD_RATE: u32 = 115_200;

/// Number of channel connectors on the dock.
pub const NUM_CHANNELS: usize = 4;

/// Maximum addressable pixels across all channels.
pub const MAX_PIXELS: usize = 512;

/// Maximum addressable pixels on a single channel.
pub const MAX_PIXELS_PER_CHANNEL: usize = MAX_PIXELS / NUM_CHANNELS;
