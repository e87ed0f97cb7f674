//! Pixel buffers for the Mote channels.

use std::str::FromStr;

/// A single RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Pixel {
    /// Black, used to zero a channel.
    pub const OFF: Pixel = Pixel::new(0, 0, 0);

    /// Creates a pixel from 8-bit components.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Creates a pixel keeping only the low 8 bits of each component.
    ///
    /// Out of range values wrap rather than clamp: 256 becomes 0 and -1
    /// becomes 255.
    pub fn masked(red: i32, green: i32, blue: i32) -> Self {
        Self {
            red: (red & 0xFF) as u8,
            green: (green & 0xFF) as u8,
            blue: (blue & 0xFF) as u8,
        }
    }

    /// Returns the pixel in device wire order (blue, green, red).
    #[inline]
    pub fn to_bgr(self) -> [u8; 3] {
        [self.blue, self.green, self.red]
    }
}

impl From<(u8, u8, u8)> for Pixel {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

/// Parses `#RRGGBB` or `RRGGBB`.
impl FromStr for Pixel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("invalid hex color: {}", s));
        }
        let component = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| format!("invalid hex color: {}", s))
        };
        Ok(Self::new(component(0..2)?, component(2..4)?, component(4..6)?))
    }
}

impl std::fmt::Display for Pixel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// Pixel buffer for one channel.
///
/// The length is fixed when the channel is configured; reconfiguring
/// creates a new buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pixels: Vec<Pixel>,
    gamma_correction: bool,
}

impl Channel {
    /// Creates a channel of `num_pixels` black pixels.
    pub fn new(num_pixels: usize, gamma_correction: bool) -> Self {
        Self {
            pixels: vec![Pixel::OFF; num_pixels],
            gamma_correction,
        }
    }

    /// Returns the number of pixels.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns true if the channel has no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Returns whether the device applies gamma correction to this channel.
    pub fn gamma_correction(&self) -> bool {
        self.gamma_correction
    }

    /// Returns a reference to the pixel data.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Gets the pixel at `index`.
    pub fn get(&self, index: usize) -> Option<Pixel> {
        self.pixels.get(index).copied()
    }

    /// Sets the pixel at `index`. Returns false if out of range.
    pub fn set(&mut self, index: usize, pixel: Pixel) -> bool {
        match self.pixels.get_mut(index) {
            Some(slot) => {
                *slot = pixel;
                true
            }
            None => false,
        }
    }

    /// Appends the channel's pixels to `out` in wire order.
    pub fn write_bgr(&self, out: &mut Vec<u8>) {
        for pixel in &self.pixels {
            out.extend_from_slice(&pixel.to_bgr());
        }
    }
}
