// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gesture::{ClassifierConfig, MAX_CLASSIFIED_HANDS};
use crate::transport::DEFAULT_BAUD_RATE;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub capture: CaptureConfig,
    pub transport: TransportConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub camera_index: u32,
    /// Flip frames horizontally before detection, like a mirror.
    pub mirror: bool,
    pub max_hands: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub enabled: bool,
    /// Device path of the controller, e.g. `/dev/ttyACM0`.
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Wait after opening the port while the controller resets.
    pub settle_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            mirror: true,
            max_hands: MAX_CLASSIFIED_HANDS,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            settle_ms: 2000,
        }
    }
}

impl TransportConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("HandGesture")))
                .unwrap_or_else(|| PathBuf::from("./output")),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "hand_gesture")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads the file at `path`. A missing or unreadable file yields defaults;
    /// fields absent from the file keep their default values.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No configuration at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path).map(|content| Self::from_json(&content)) {
            Ok(Ok(config)) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Ok(Err(e)) => {
                warn!("Error parsing {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
            Err(e) => {
                warn!("Cannot read {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let mut config: AppConfig = serde_json::from_str(content).context("Invalid configuration JSON")?;
        config.capture.max_hands = config.capture.max_hands.clamp(1, MAX_CLASSIFIED_HANDS);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::HandChirality;
    use crate::gesture::OkPolicy;

    #[test]
    fn defaults_match_calibration_constants() {
        let config = AppConfig::default();
        assert_eq!(config.classifier.ok_pinch_threshold, 0.05);
        assert_eq!(config.classifier.two_hand_pinch_threshold, 0.1);
        assert_eq!(config.classifier.reference_width, 0.3);
        assert_eq!(config.classifier.reference_distance_cm, 30.0);
        assert_eq!(config.classifier.ok_policy, OkPolicy::AtLeastThree);
        assert_eq!(config.classifier.chirality, HandChirality::RightMirrored);
        assert!(config.capture.mirror);
        assert_eq!(config.capture.max_hands, 2);
        assert!(!config.transport.enabled);
        assert_eq!(config.transport.baud_rate, 9600);
        assert_eq!(config.transport.settle(), Duration::from_secs(2));
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = AppConfig::from_json(
            r#"{ "classifier": { "ok_policy": "ThreeOpenFingers", "chirality": "LeftMirrored" },
                 "transport": { "enabled": true, "port": "/dev/ttyUSB0" } }"#,
        )
        .unwrap();

        assert_eq!(config.classifier.ok_policy, OkPolicy::ThreeOpenFingers);
        assert_eq!(config.classifier.chirality, HandChirality::LeftMirrored);
        assert_eq!(config.classifier.ok_pinch_threshold, 0.05);
        assert_eq!(config.transport.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.transport.baud_rate, 9600);
        assert_eq!(config.capture, CaptureConfig::default());
    }

    #[test]
    fn max_hands_is_clamped_on_load() {
        let config = AppConfig::from_json(r#"{ "capture": { "max_hands": 5 } }"#).unwrap();
        assert_eq!(config.capture.max_hands, 2);
    }

    #[test]
    fn line_settings_can_be_overridden() {
        let config = AppConfig::from_json(r#"{ "transport": { "baud_rate": 115200, "settle_ms": 0 } }"#).unwrap();
        assert_eq!(config.transport.baud_rate, 115200);
        assert!(config.transport.settle().is_zero());
        assert!(config.transport.port.is_none());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(AppConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("hand_gesture_cfg_{}.json", std::process::id()));
        let mut config = AppConfig::default();
        config.capture.camera_index = 3;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(loaded.capture.camera_index, 3);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/hand_gesture/config.json"));
        assert_eq!(config, AppConfig::default());
    }
}
