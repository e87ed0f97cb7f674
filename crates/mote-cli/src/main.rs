//! Mote Control Tool
//!
//! CLI for driving a Mote USB dock: list ports, set static colours and run a
//! rainbow animation.

mod config;
mod rainbow;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mote_hw::discovery::{enumerate_ports, is_mote};
use mote_hw::{MoteDevice, Pixel, Port, NUM_CHANNELS};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;

/// Time the dock needs to latch a frame before the port is closed.
const LATCH_DELAY: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "motectl")]
#[command(about = "Control tool for the Mote USB LED dock")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Serial port path (default: auto-detect)
    #[arg(short, long)]
    port: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List serial ports and mark connected Mote docks
    Ports {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set every pixel to an RGB colour
    Rgb {
        /// Red (0-255)
        #[arg(allow_negative_numbers = true)]
        red: i32,
        /// Green (0-255)
        #[arg(allow_negative_numbers = true)]
        green: i32,
        /// Blue (0-255)
        #[arg(allow_negative_numbers = true)]
        blue: i32,
    },
    /// Set every pixel to a hex colour
    Fill {
        /// Color in hex format (e.g., #FF0000 for red)
        color: String,
    },
    /// Animate a rainbow until interrupted
    Rainbow,
    /// Turn every pixel off
    Clear,
    /// Write the default configuration to a file
    InitConfig {
        /// Output file path
        #[arg(default_value = "motectl.toml")]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct PortEntry {
    name: String,
    vid: Option<String>,
    pid: Option<String>,
    product: Option<String>,
    mote: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    let port = cli.port.as_deref().or_else(|| config.port_path());

    match cli.command {
        Commands::Ports { json } => handle_ports(json),
        Commands::Rgb { red, green, blue } => {
            let device = open_device(port, &config)?;
            handle_fill(device, red, green, blue).await
        }
        Commands::Fill { color } => {
            let pixel: Pixel = color.parse().map_err(anyhow::Error::msg)?;
            let device = open_device(port, &config)?;
            handle_fill(
                device,
                pixel.red.into(),
                pixel.green.into(),
                pixel.blue.into(),
            )
            .await
        }
        Commands::Rainbow => {
            let device = open_device(port, &config)?;
            let interval = Duration::from_millis(config.frame_interval_ms.max(1));
            handle_rainbow(device, interval).await
        }
        Commands::Clear => {
            let mut device = open_device(port, &config)?;
            device.clear_all()?;
            device.show().context("Failed to send frame")?;
            finish(device).await?;
            println!("Mote cleared");
            Ok(())
        }
        Commands::InitConfig { output } => {
            config.save(&output)?;
            println!("Configuration written to: {}", output.display());
            Ok(())
        }
    }
}

/// Opens the dock and configures every channel listed in the config.
fn open_device(port: Option<&str>, config: &Config) -> Result<MoteDevice> {
    let mut device = MoteDevice::connect(port).context("Unable to connect to Mote")?;
    for channel in &config.channels {
        device
            .configure_channel(channel.channel, channel.pixels, channel.gamma)
            .with_context(|| format!("Failed to configure channel {}", channel.channel))?;
    }
    Ok(device)
}

/// Gives the dock time to latch the last frame, then closes the port.
async fn finish<P: Port>(device: MoteDevice<P>) -> Result<()> {
    tokio::time::sleep(LATCH_DELAY).await;
    device.close().context("Failed to close port")
}

fn handle_ports(json: bool) -> Result<()> {
    let ports = enumerate_ports().context("Failed to list serial ports")?;
    let entries: Vec<PortEntry> = ports
        .iter()
        .map(|port| PortEntry {
            name: port.name.clone(),
            vid: port.vid.map(|vid| format!("{:04x}", vid)),
            pid: port.pid.map(|pid| format!("{:04x}", pid)),
            product: port.product.clone(),
            mote: is_mote(port),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Found {} ports", entries.len());
    for entry in &entries {
        let marker = if entry.mote { " (Mote)" } else { "" };
        println!("  - Name: {}{}", entry.name, marker);
        if let (Some(vid), Some(pid)) = (&entry.vid, &entry.pid) {
            println!("    VID: {}", vid);
            println!("    PID: {}", pid);
        }
        if let Some(product) = &entry.product {
            println!("    Product: {}", product);
        }
    }
    Ok(())
}

async fn handle_fill<P: Port>(
    mut device: MoteDevice<P>,
    red: i32,
    green: i32,
    blue: i32,
) -> Result<()> {
    for channel in 1..=NUM_CHANNELS {
        let len = match device.channel(channel)? {
            Some(buffer) => buffer.len(),
            None => continue,
        };
        for pixel in 0..len {
            device.set_pixel(channel, pixel, red, green, blue)?;
        }
    }
    device.show().context("Failed to send frame")?;
    finish(device).await?;
    println!("Mote set to: {} {} {}", red & 0xFF, green & 0xFF, blue & 0xFF);
    Ok(())
}

async fn handle_rainbow<P: Port>(mut device: MoteDevice<P>, interval: Duration) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut ticker = tokio::time::interval(interval);
    let start = Instant::now();
    let mut consecutive_errors: u32 = 0;

    info!("Rainbow running on {} (Ctrl+C to stop)", device.port_name());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                rainbow::paint(&mut device, rainbow::phase(start.elapsed()))?;
                if let Err(e) = device.show() {
                    consecutive_errors += 1;
                    // Only log the first failure of a run
                    if consecutive_errors == 1 {
                        warn!("Failed to send frame: {}", e);
                    }
                } else {
                    consecutive_errors = 0;
                }
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
                break;
            }
        }
    }

    device.clear_all()?;
    device.show().context("Failed to send final frame")?;
    finish(device).await
}
