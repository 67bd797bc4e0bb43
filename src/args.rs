// src/args.rs
use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Hand gesture recognition and gesture-driven device control", long_about = None)]
pub struct Args {
    /// Configuration file (JSON). Defaults to the platform config directory.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Camera index
    #[arg(short = 'i', long)]
    pub cam_index: Option<u32>,

    /// Do not mirror the camera image
    #[arg(long, default_value_t = false)]
    pub no_mirror: bool,

    /// Maximum number of hands to classify (1 or 2)
    #[arg(long)]
    pub max_hands: Option<usize>,

    /// Run without a window, sending commands to the controller
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Serial device receiving commands, e.g. /dev/ttyACM0
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate of the controller port
    #[arg(long)]
    pub baud: Option<u32>,

    /// Replay recorded landmarks (JSON lines) instead of using a camera
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Save a CSV log and report of the session to the output directory
    #[arg(long, default_value_t = false)]
    pub record: bool,

    /// List available cameras and serial ports, then exit
    #[arg(long)]
    pub list: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Command line values take precedence over the configuration file.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(index) = self.cam_index {
            config.capture.camera_index = index;
        }
        if self.no_mirror {
            config.capture.mirror = false;
        }
        if let Some(max_hands) = self.max_hands {
            config.capture.max_hands = max_hands.clamp(1, 2);
        }
        if let Some(port) = &self.port {
            config.transport.port = Some(port.clone());
            config.transport.enabled = true;
        }
        if let Some(baud) = self.baud {
            config.transport.baud_rate = baud;
        }
    }
}
