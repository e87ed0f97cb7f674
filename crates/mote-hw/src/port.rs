//! Byte sink abstraction for the serial connection.

use std::io::{self, Write};
use tokio_serial::{DataBits, Parity, SerialPort, StopBits};
use tracing::info;

use crate::{Error, Result, BAUD_RATE};

/// A writable connection to the dock that can be closed.
///
/// Implemented for real serial ports; tests substitute an in-memory recorder.
pub trait Port: Write {
    /// Flushes pending bytes and releases the connection.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Port for Box<dyn SerialPort> {}

/// Opens a serial port at 115200 8N1.
pub fn open_serial(path: &str) -> Result<Box<dyn SerialPort>> {
    let port = tokio_serial::new(path, BAUD_RATE)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .open()
        .map_err(|e| {
            // A missing device node means nothing is plugged in at that path
            if let tokio_serial::ErrorKind::Io(io::ErrorKind::NotFound) = e.kind {
                if !std::path::Path::new(path).exists() {
                    return Error::PortNotFound(path.to_string());
                }
            }
            Error::Serial(e)
        })?;

    info!("Serial port opened: {} ({} baud)", path, BAUD_RATE);
    Ok(port)
}
