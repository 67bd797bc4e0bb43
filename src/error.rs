// src/error.rs
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GestureError {
    #[error("hand landmark set must have {expected} points, got {found}")]
    LandmarkCount { expected: usize, found: usize },

    #[error("landmark {index} has a non-finite coordinate ({x}, {y})")]
    NonFiniteLandmark { index: usize, x: f64, y: f64 },

    #[error("replay line {line} is not a valid landmark frame: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read replay file: {0}")]
    ReplayIo(#[from] io::Error),

    #[error("failed to send command to {port}: {source}")]
    Transport {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot open controller port {port}: {source}")]
    PortOpen {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("cannot list serial ports: {0}")]
    PortScan(#[source] serialport::Error),

    #[error("camera error: {0}")]
    Camera(String),
}
