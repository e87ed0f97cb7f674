//! Error types for the Mote hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the hardware.
#[derive(Error, Debug)]
pub enum Error {
    /// No serial port matched the Mote identifiers.
    #[error("Mote device not found (VID:PID 16D0:08C4)")]
    DeviceNotFound,

    /// Explicit serial port path does not exist.
    #[error("Serial port not found at {0}")]
    PortNotFound(String),

    /// Channel index outside 1-4.
    #[error("Invalid channel {0} (must be 1-4)")]
    InvalidChannel(usize),

    /// Pixel count above the per-channel limit.
    #[error("Invalid pixel count {count} (must be at most {max})")]
    InvalidPixelCount { count: usize, max: usize },

    /// Channel used before being configured.
    #[error("Channel {0} has not been configured")]
    ChannelNotConfigured(usize),

    /// Pixel index past the end of the channel.
    #[error("Pixel index {index} out of range for channel {channel} (must be < {len})")]
    PixelIndexOutOfRange {
        channel: usize,
        index: usize,
        len: usize,
    },

    /// Serial port communication error.
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Serial I/O error.
    #[error("Serial I/O error: {0}")]
    SerialIo(#[from] std::io::Error),
}

impl Error {
    /// Returns true for addressing errors raised before any device I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidChannel(_)
                | Error::InvalidPixelCount { .. }
                | Error::ChannelNotConfigured(_)
                | Error::PixelIndexOutOfRange { .. }
        )
    }
}
