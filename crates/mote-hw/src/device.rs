//! Mote device session over a serial port.

use std::io::Write;
use tokio_serial::SerialPort;
use tracing::{debug, info};

use crate::channel::{Channel, Pixel};
use crate::discovery::discover_port;
use crate::port::{open_serial, Port};
use crate::protocol::{build_config_frame, build_output_frame};
use crate::{Error, Result, MAX_PIXELS_PER_CHANNEL, NUM_CHANNELS};

/// Mote device controller.
///
/// Channels are numbered 1-4 as printed on the dock. All methods block on
/// the underlying port; the session is not shared between threads.
pub struct MoteDevice<P: Port = Box<dyn SerialPort>> {
    port_name: String,
    port: P,
    channels: [Option<Channel>; NUM_CHANNELS],
}

impl MoteDevice {
    /// Opens the first connected Mote dock.
    pub fn open() -> Result<Self> {
        let path = discover_port()?;
        Self::open_path(&path)
    }

    /// Opens a Mote dock at a specific serial port path.
    pub fn open_path(path: &str) -> Result<Self> {
        let port = open_serial(path)?;
        Ok(Self::with_port(path, port))
    }

    /// Opens `port_name` if given, otherwise auto-detects the dock.
    pub fn connect(port_name: Option<&str>) -> Result<Self> {
        match port_name {
            Some(path) if !path.is_empty() => Self::open_path(path),
            _ => Self::open(),
        }
    }
}

impl<P: Port> MoteDevice<P> {
    /// Wraps an already open connection.
    pub fn with_port(port_name: &str, port: P) -> Self {
        Self {
            port_name: port_name.to_string(),
            port,
            channels: Default::default(),
        }
    }

    /// Returns the port path.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Returns a reference to the underlying connection.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Maps a 1-based channel number to its slot.
    fn slot(channel: usize) -> Result<usize> {
        if (1..=NUM_CHANNELS).contains(&channel) {
            Ok(channel - 1)
        } else {
            Err(Error::InvalidChannel(channel))
        }
    }

    fn configured(&self, channel: usize) -> Result<&Channel> {
        self.channels[Self::slot(channel)?]
            .as_ref()
            .ok_or(Error::ChannelNotConfigured(channel))
    }

    fn configured_mut(&mut self, channel: usize) -> Result<&mut Channel> {
        self.channels[Self::slot(channel)?]
            .as_mut()
            .ok_or(Error::ChannelNotConfigured(channel))
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        debug!("Sending frame to {}: {:02X?}", self.port_name, frame);
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }

    /// Returns the channel at `channel`, or `None` if it is not configured.
    pub fn channel(&self, channel: usize) -> Result<Option<&Channel>> {
        Ok(self.channels[Self::slot(channel)?].as_ref())
    }

    /// Configures a channel with `num_pixels` black pixels.
    ///
    /// Replaces any previous buffer for the channel and sends the
    /// configuration to the dock. Nothing is written if the arguments are
    /// out of range. The new buffer is kept even if the write fails.
    pub fn configure_channel(
        &mut self,
        channel: usize,
        num_pixels: usize,
        gamma_correction: bool,
    ) -> Result<()> {
        let slot = Self::slot(channel)?;
        if num_pixels > MAX_PIXELS_PER_CHANNEL {
            return Err(Error::InvalidPixelCount {
                count: num_pixels,
                max: MAX_PIXELS_PER_CHANNEL,
            });
        }

        self.channels[slot] = Some(Channel::new(num_pixels, gamma_correction));

        // Both values were range checked above and fit in a byte
        let frame = build_config_frame(channel as u8, num_pixels as u8, gamma_correction);
        self.write_frame(&frame)?;

        info!(
            "Channel {} configured ({} pixels, gamma: {})",
            channel, num_pixels, gamma_correction
        );
        Ok(())
    }

    /// Sets the colour of a single pixel in the local buffer.
    ///
    /// Components keep only their low 8 bits. Call [`show`](Self::show) to
    /// send the buffer to the dock.
    pub fn set_pixel(
        &mut self,
        channel: usize,
        index: usize,
        r: i32,
        g: i32,
        b: i32,
    ) -> Result<()> {
        let buffer = self.configured_mut(channel)?;
        let len = buffer.len();
        if !buffer.set(index, Pixel::masked(r, g, b)) {
            return Err(Error::PixelIndexOutOfRange {
                channel,
                index,
                len,
            });
        }
        Ok(())
    }

    /// Sends the pixel buffers of all configured channels to the dock.
    pub fn show(&mut self) -> Result<()> {
        for (slot, channel) in self.channels.iter().enumerate() {
            if channel.is_none() {
                debug!("Skipping unconfigured channel {}", slot + 1);
            }
        }
        let frame = build_output_frame(&self.channels);
        self.write_frame(&frame)
    }

    /// Sets every pixel of a configured channel to black.
    pub fn clear(&mut self, channel: usize) -> Result<()> {
        let len = self.configured(channel)?.len();
        for index in 0..len {
            self.set_pixel(channel, index, 0, 0, 0)?;
        }
        Ok(())
    }

    /// Clears every configured channel, skipping unconfigured ones.
    pub fn clear_all(&mut self) -> Result<()> {
        for channel in 1..=NUM_CHANNELS {
            if self.channels[channel - 1].is_some() {
                self.clear(channel)?;
            }
        }
        Ok(())
    }

    /// Returns the number of pixels a channel is configured with.
    pub fn pixel_count(&self, channel: usize) -> Result<usize> {
        Ok(self.configured(channel)?.len())
    }

    /// Gets the colour of a single pixel from the local buffer.
    pub fn pixel(&self, channel: usize, index: usize) -> Result<Pixel> {
        let buffer = self.configured(channel)?;
        buffer.get(index).ok_or(Error::PixelIndexOutOfRange {
            channel,
            index,
            len: buffer.len(),
        })
    }

    /// Closes the connection, discarding all channel state.
    pub fn close(mut self) -> Result<()> {
        info!("Closing port {}", self.port_name);
        self.port.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    /// In-memory port recording each frame written.
    #[derive(Default)]
    struct RecordingPort {
        frames: Vec<Vec<u8>>,
        fail_writes: bool,
        closed: Rc<Cell<bool>>,
    }

    impl Write for RecordingPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
            }
            self.frames.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Port for RecordingPort {
        fn close(&mut self) -> io::Result<()> {
            self.closed.set(true);
            Ok(())
        }
    }

    fn device() -> MoteDevice<RecordingPort> {
        MoteDevice::with_port("/dev/null-mote", RecordingPort::default())
    }

    fn frames(device: &MoteDevice<RecordingPort>) -> &[Vec<u8>] {
        &device.port().frames
    }

    #[test]
    fn test_configure_channel_frame() {
        let mut dev = device();
        dev.configure_channel(1, 16, false).unwrap();
        dev.configure_channel(1, 8, true).unwrap();
        assert_eq!(
            frames(&dev),
            &[
                vec![b'm', b'o', b't', b'e', b'c', 1, 16, 0],
                vec![b'm', b'o', b't', b'e', b'c', 1, 8, 1],
            ]
        );
        assert_eq!(dev.pixel_count(1).unwrap(), 8);
    }

    #[test]
    fn test_configure_every_valid_pixel_count() {
        let mut dev = device();
        for n in 0..=MAX_PIXELS_PER_CHANNEL {
            dev.configure_channel(3, n, n % 2 == 0).unwrap();
            let expected = [b'm', b'o', b't', b'e', b'c', 3, n as u8, (n % 2 == 0) as u8];
            assert_eq!(frames(&dev).last().unwrap(), &expected);
        }
        assert_eq!(frames(&dev).len(), MAX_PIXELS_PER_CHANNEL + 1);
    }

    #[test]
    fn test_configure_invalid_writes_nothing() {
        let mut dev = device();
        for channel in [0, 5, 12, usize::MAX] {
            let err = dev.configure_channel(channel, 8, false).unwrap_err();
            assert!(matches!(err, Error::InvalidChannel(c) if c == channel));
        }
        let err = dev.configure_channel(1, 129, false).unwrap_err();
        assert!(matches!(err, Error::InvalidPixelCount { count: 129, max: 128 }));
        assert!(dev.configure_channel(1, 1000, false).unwrap_err().is_validation());

        assert!(frames(&dev).is_empty());
        assert!(dev.channel(1).unwrap().is_none());
    }

    #[test]
    fn test_reconfigure_discards_pixels() {
        let mut dev = device();
        dev.configure_channel(2, 4, false).unwrap();
        dev.set_pixel(2, 1, 9, 9, 9).unwrap();
        dev.configure_channel(2, 4, true).unwrap();
        assert_eq!(dev.pixel(2, 1).unwrap(), Pixel::OFF);
        assert!(dev.channel(2).unwrap().unwrap().gamma_correction());
    }

    #[test]
    fn test_set_pixel_validation() {
        let mut dev = device();
        assert!(matches!(
            dev.set_pixel(0, 0, 1, 2, 3),
            Err(Error::InvalidChannel(0))
        ));
        assert!(matches!(
            dev.set_pixel(5, 0, 1, 2, 3),
            Err(Error::InvalidChannel(5))
        ));
        assert!(matches!(
            dev.set_pixel(1, 0, 1, 2, 3),
            Err(Error::ChannelNotConfigured(1))
        ));

        dev.configure_channel(1, 16, false).unwrap();
        assert!(matches!(
            dev.set_pixel(1, 16, 0, 0, 0),
            Err(Error::PixelIndexOutOfRange {
                channel: 1,
                index: 16,
                len: 16
            })
        ));
        dev.set_pixel(1, 15, 1, 2, 3).unwrap();

        // Only the configuration frame was written
        assert_eq!(frames(&dev).len(), 1);
    }

    #[test]
    fn test_set_pixel_masks_components() {
        let mut dev = device();
        dev.configure_channel(1, 1, false).unwrap();
        dev.set_pixel(1, 0, 256, -1, 511).unwrap();
        assert_eq!(dev.pixel(1, 0).unwrap(), Pixel::new(0, 255, 255));
    }

    #[test]
    fn test_pixel_round_trip() {
        let mut dev = device();
        dev.configure_channel(1, 4, false).unwrap();
        let values = [(1, 2, 3), (255, 0, 128), (300, -20, 7), (-1, -256, 1024)];
        for (i, &(r, g, b)) in values.iter().enumerate() {
            dev.set_pixel(1, i, r, g, b).unwrap();
        }
        for (i, &(r, g, b)) in values.iter().enumerate() {
            assert_eq!(
                dev.pixel(1, i).unwrap(),
                Pixel::new((r & 0xFF) as u8, (g & 0xFF) as u8, (b & 0xFF) as u8)
            );
        }
        assert!(matches!(
            dev.pixel(1, 4),
            Err(Error::PixelIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_read_accessors_validation() {
        let dev = device();
        assert!(matches!(dev.pixel_count(0), Err(Error::InvalidChannel(0))));
        assert!(matches!(
            dev.pixel_count(4),
            Err(Error::ChannelNotConfigured(4))
        ));
        assert!(matches!(dev.pixel(2, 0), Err(Error::ChannelNotConfigured(2))));
        assert!(matches!(dev.channel(9), Err(Error::InvalidChannel(9))));
    }

    #[test]
    fn test_show_single_channel_bgr() {
        let mut dev = device();
        dev.configure_channel(2, 4, false).unwrap();
        for i in 0..4 {
            dev.set_pixel(2, i, 10, 20, 30).unwrap();
        }
        dev.show().unwrap();

        let mut expected = b"moteo".to_vec();
        for _ in 0..4 {
            expected.extend_from_slice(&[30, 20, 10]);
        }
        assert_eq!(frames(&dev).last().unwrap(), &expected);
    }

    #[test]
    fn test_show_channel_order() {
        let mut dev = device();
        dev.configure_channel(4, 1, false).unwrap();
        dev.configure_channel(1, 2, false).unwrap();
        dev.set_pixel(4, 0, 4, 4, 4).unwrap();
        dev.set_pixel(1, 1, 1, 2, 3).unwrap();
        dev.show().unwrap();
        assert_eq!(
            frames(&dev).last().unwrap(),
            &[b'm', b'o', b't', b'e', b'o', 0, 0, 0, 3, 2, 1, 4, 4, 4]
        );
    }

    #[test]
    fn test_show_without_channels() {
        let mut dev = device();
        dev.show().unwrap();
        assert_eq!(frames(&dev), &[b"moteo".to_vec()]);
    }

    #[test]
    fn test_clear() {
        let mut dev = device();
        assert!(matches!(dev.clear(1), Err(Error::ChannelNotConfigured(1))));
        assert!(matches!(dev.clear(0), Err(Error::InvalidChannel(0))));

        dev.configure_channel(1, 32, false).unwrap();
        for i in 0..32 {
            dev.set_pixel(1, i, 255, 255, 255).unwrap();
        }
        dev.clear(1).unwrap();
        let channel = dev.channel(1).unwrap().unwrap();
        assert!(channel.pixels().iter().all(|p| *p == Pixel::OFF));
    }

    #[test]
    fn test_clear_all_skips_unconfigured() {
        let mut dev = device();
        dev.configure_channel(1, 16, false).unwrap();
        dev.configure_channel(3, 8, false).unwrap();
        for i in 0..16 {
            dev.set_pixel(1, i, 1, 2, 3).unwrap();
        }
        for i in 0..8 {
            dev.set_pixel(3, i, 4, 5, 6).unwrap();
        }

        dev.clear_all().unwrap();

        for (channel, len) in [(1, 16), (3, 8)] {
            for i in 0..len {
                assert_eq!(dev.pixel(channel, i).unwrap(), Pixel::OFF);
            }
        }
        assert!(dev.channel(2).unwrap().is_none());
        assert!(dev.channel(4).unwrap().is_none());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut dev = device();
        dev.configure_channel(1, 2, false).unwrap();
        dev.set_pixel(1, 0, 7, 8, 9).unwrap();
        dev.port.fail_writes = true;

        assert!(matches!(dev.show(), Err(Error::SerialIo(_))));
        assert_eq!(dev.pixel(1, 0).unwrap(), Pixel::new(7, 8, 9));

        assert!(matches!(
            dev.configure_channel(2, 4, false),
            Err(Error::SerialIo(_))
        ));
        assert_eq!(dev.pixel_count(2).unwrap(), 4);
    }

    #[test]
    fn test_close() {
        let closed = Rc::new(Cell::new(false));
        let port = RecordingPort {
            closed: closed.clone(),
            ..Default::default()
        };
        let dev = MoteDevice::with_port("/dev/null-mote", port);
        assert_eq!(dev.port_name(), "/dev/null-mote");
        dev.close().unwrap();
        assert!(closed.get());
    }

    // Hardware tests are skipped by default
    #[test]
    #[ignore]
    fn test_device_open() {
        let device = MoteDevice::open();
        assert!(device.is_ok());
    }
}
