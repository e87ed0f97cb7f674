//! Rainbow animation.

use mote_hw::{MoteDevice, Port, Result, NUM_CHANNELS};
use std::time::Duration;

/// Hue offset between neighbouring channels, in degrees.
const CHANNEL_HUE_STEP: usize = 64;

/// Hue offset between neighbouring pixels, in degrees.
const PIXEL_HUE_STEP: usize = 4;

/// Converts elapsed time to a hue phase (50 degrees per second).
pub fn phase(elapsed: Duration) -> usize {
    (elapsed.as_millis() / 20) as usize
}

/// Hue in degrees for a pixel at the given phase.
pub fn hue(phase: usize, channel: usize, pixel: usize) -> f32 {
    ((phase + channel * CHANNEL_HUE_STEP + pixel * PIXEL_HUE_STEP) % 360) as f32
}

/// Converts HSV (hue in degrees, saturation and value in 0-1) to RGB.
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> (u8, u8, u8) {
    let c = value * saturation;
    let h = (hue % 360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

/// Paints one rainbow frame into every configured channel.
pub fn paint<P: Port>(device: &mut MoteDevice<P>, phase: usize) -> Result<()> {
    for channel in 1..=NUM_CHANNELS {
        let len = match device.channel(channel)? {
            Some(buffer) => buffer.len(),
            None => continue,
        };
        for pixel in 0..len {
            let (r, g, b) = hsv_to_rgb(hue(phase, channel, pixel), 1.0, 1.0);
            device.set_pixel(channel, pixel, r.into(), g.into(), b.into())?;
        }
    }
    Ok(())
}
