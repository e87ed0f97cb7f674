//! Mote protocol definitions and encoding.
//!
//! Protocol structure:
//! - Every frame starts with the ASCII signature "mote" and a command byte
//! - Configure ('c'): channel, pixel count, gamma flag
//! - Output ('o'): pixel data for each configured channel, blue/green/red per pixel

use crate::channel::Channel;

/// Protocol signature.
pub const SIGNATURE: &[u8; 4] = b"mote";

/// Signature plus command byte.
pub const HEADER_SIZE: usize = SIGNATURE.len() + 1;

/// Total configuration frame size.
pub const CONFIG_FRAME_SIZE: usize = HEADER_SIZE + 3;

/// Bytes per pixel on the wire.
pub const BYTES_PER_PIXEL: usize = 3;

/// Mote command types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Channel configuration.
    Configure = b'c',
    /// Pixel output.
    Output = b'o',
}

/// Builds a channel configuration frame.
///
/// `channel` is the 1-based connector number as printed on the dock.
pub fn build_config_frame(
    channel: u8,
    num_pixels: u8,
    gamma_correction: bool,
) -> [u8; CONFIG_FRAME_SIZE] {
    let mut buffer = [0u8; CONFIG_FRAME_SIZE];
    buffer[..4].copy_from_slice(SIGNATURE);
    buffer[4] = Command::Configure as u8;
    buffer[5] = channel;
    buffer[6] = num_pixels;
    buffer[7] = gamma_correction as u8;
    buffer
}

/// Builds an output frame from the channel slots, in slot order.
///
/// Unconfigured slots contribute no bytes.
pub fn build_output_frame(channels: &[Option<Channel>]) -> Vec<u8> {
    let pixel_count: usize = channels.iter().flatten().map(Channel::len).sum();
    let mut buffer = Vec::with_capacity(HEADER_SIZE + pixel_count * BYTES_PER_PIXEL);
    buffer.extend_from_slice(SIGNATURE);
    buffer.push(Command::Output as u8);
    for channel in channels.iter().flatten() {
        channel.write_bgr(&mut buffer);
    }
    buffer
}
