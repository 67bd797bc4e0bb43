// src/headless.rs - Windowless control loop: frames in, commands out
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::data::DataExporter;
use crate::mediapipe_bridge::{LandmarkProvider, MediaPipeWrapper, ReplayProvider};
use crate::tracking::{GestureTracker, TrackingResult};
use crate::transport::{CommandSink, LogSink, SerialSink};
use crate::video::VideoSource;

const REPORT_INTERVAL: usize = 300;

pub struct HeadlessOptions {
    pub replay: Option<std::path::PathBuf>,
    pub max_frames: Option<u64>,
    pub record: bool,
}

/// Opens the configured sink. Without a port, commands are only logged.
pub fn open_sink(config: &AppConfig) -> Result<Box<dyn CommandSink>> {
    match (&config.transport.port, config.transport.enabled) {
        (Some(port), true) => {
            let transport = &config.transport;
            let sink = SerialSink::open(port, transport.baud_rate, transport.settle())
                .with_context(|| format!("Cannot open controller port {}", port))?;
            Ok(Box::new(sink))
        }
        _ => Ok(Box::new(LogSink)),
    }
}

/// Delivers a command if any; a failed write disables the sink for the rest
/// of the session while classification keeps running.
pub fn forward_command(sink: &mut Option<Box<dyn CommandSink>>, result: &TrackingResult) {
    let Some(command) = result.command else {
        return;
    };

    if let Some(active) = sink.as_mut() {
        info!("Sending '{}' -> {}", command.token(), command.description());
        if let Err(e) = active.send(command) {
            error!("{}. Command output disabled.", e);
            *sink = None;
        }
    }
}

pub fn run(config: &AppConfig, options: HeadlessOptions) -> Result<()> {
    let mut tracker = GestureTracker::new(config.classifier.clone(), config.capture.max_hands);
    let mut sink = Some(open_sink(config)?);
    let mut exporter = options
        .record
        .then(|| DataExporter::new(&config.output.directory, None));

    info!(
        "Headless session started, commands go to {}",
        sink.as_ref().map(|s| s.describe()).unwrap_or_default()
    );

    let mut on_result = |result: TrackingResult| {
        forward_command(&mut sink, &result);
        record_frame(&mut exporter, &result);
    };

    if let Some(path) = &options.replay {
        let mut replay = ReplayProvider::from_path(path)
            .with_context(|| format!("Cannot load replay {}", path.display()))?;
        if replay.is_empty() {
            warn!("Replay {} contains no frames", path.display());
        }

        while let Some(hands) = replay.next_hands() {
            if reached(&tracker, options.max_frames) {
                break;
            }
            let result = tracker.process_hands(hands);
            on_result(result);
        }
    } else {
        let mut provider = MediaPipeWrapper::new();
        let mut camera = VideoSource::open(config.capture.camera_index, config.capture.mirror)?;
        info!("Detecting with {} on {}. Press Ctrl-C to stop.", provider.name(), camera.name());

        while !reached(&tracker, options.max_frames) {
            let start = Instant::now();
            let frame = match camera.read_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("{}", e);
                    break;
                }
            };

            let result = tracker.process_detection(provider.detect(&frame));
            tracker.record_loop_time(start.elapsed());
            on_result(result);
        }
    }

    let metrics = tracker.metrics();
    info!(
        "Session finished after {} frames ({:.1} fps over the last {})",
        tracker.frames_processed(),
        metrics.avg_fps,
        metrics.samples()
    );

    if let Some(exporter) = exporter.filter(|e| !e.is_empty()) {
        let report = exporter.generate_report()?;
        info!("Saved {} and {}", exporter.csv_path().display(), report.display());
    }

    Ok(())
}

/// Appends the frame to the recording. The report is refreshed every
/// `REPORT_INTERVAL` frames so an interrupted session still has one.
/// A failed write stops recording for the rest of the session.
fn record_frame(exporter: &mut Option<DataExporter>, result: &TrackingResult) {
    let Some(active) = exporter.as_mut() else {
        return;
    };

    let written = active.add_frame(result).and_then(|_| {
        if active.len() % REPORT_INTERVAL == 0 {
            active.generate_report()?;
        }
        Ok(())
    });

    if let Err(e) = written {
        error!("{:#}. Recording stopped.", e);
        *exporter = None;
    }
}

fn reached(tracker: &GestureTracker, max_frames: Option<u64>) -> bool {
    max_frames.is_some_and(|max| tracker.frames_processed() >= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::error::GestureError;
    use crate::gesture::{FrameGesture, GestureLabel};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        sent: Rc<RefCell<Vec<Command>>>,
        fail: bool,
    }

    impl CommandSink for Recorder {
        fn describe(&self) -> String {
            "recorder".into()
        }

        fn send(&mut self, command: Command) -> Result<(), GestureError> {
            if self.fail {
                return Err(GestureError::Transport {
                    port: "recorder".into(),
                    source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"),
                });
            }
            self.sent.borrow_mut().push(command);
            Ok(())
        }
    }

    fn with_command(command: Option<Command>) -> TrackingResult {
        TrackingResult {
            gesture: FrameGesture { label: GestureLabel::Fist, distance_cm: None },
            command,
            ..Default::default()
        }
    }

    #[test]
    fn forwards_only_emitted_commands() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut sink: Option<Box<dyn CommandSink>> = Some(Box::new(Recorder { sent: sent.clone(), fail: false }));

        forward_command(&mut sink, &with_command(Some(Command::Close)));
        forward_command(&mut sink, &with_command(None));
        forward_command(&mut sink, &with_command(Some(Command::Open)));

        assert_eq!(*sent.borrow(), vec![Command::Close, Command::Open]);
        assert!(sink.is_some());
    }

    #[test]
    fn failed_send_disables_sink() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut sink: Option<Box<dyn CommandSink>> = Some(Box::new(Recorder { sent, fail: true }));

        forward_command(&mut sink, &with_command(Some(Command::On)));
        assert!(sink.is_none());
    }

    #[test]
    fn sink_defaults_to_log() {
        let sink = open_sink(&AppConfig::default()).unwrap();
        assert_eq!(sink.describe(), "log");
    }

    #[test]
    fn replay_session_records_frames() {
        let dir = std::env::temp_dir().join(format!("hand_gesture_headless_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let replay = dir.join("frames.jsonl");

        let fist: Vec<[f64; 2]> = crate::gesture::fixtures::hand_with([false; 5]);
        let line = serde_json::to_string(&vec![fist]).unwrap();
        std::fs::write(&replay, format!("{line}\n{line}\n[]\n{line}\n")).unwrap();

        let mut config = AppConfig::default();
        config.output.directory = dir.clone();
        let options = HeadlessOptions { replay: Some(replay), max_frames: Some(3), record: true };
        run(&config, options).unwrap();

        let session = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .find(|e| e.path().is_dir())
            .expect("session directory");
        let csv = std::fs::read_to_string(session.path().join("gesture_data.csv")).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains(",Fist,") && rows[0].contains(",C,"));
        assert!(rows[1].contains(",Fist,") && !rows[1].contains(",C,"));
        assert!(rows[2].contains(",None,"));
    }
}
