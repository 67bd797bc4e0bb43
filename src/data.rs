// src/data.rs - Session recording: per-frame CSV export and an HTML summary
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::gesture::GestureLabel;
use crate::tracking::TrackingResult;

const CSV_FILE: &str = "gesture_data.csv";

#[derive(Debug, Clone, Serialize)]
struct GestureRecord {
    frame: u64,
    timestamp: f64,
    hand_count: usize,
    gesture: &'static str,
    distance_cm: Option<f64>,
    command: Option<&'static str>,
    tracking_lost: bool,
}

impl GestureRecord {
    fn from_result(result: &TrackingResult) -> Self {
        Self {
            frame: result.frame,
            timestamp: result.timestamp,
            hand_count: result.hand_count(),
            gesture: result.gesture.label.as_str(),
            distance_cm: result.gesture.distance_cm.map(|cm| (cm * 100.0).round() / 100.0),
            command: result.command.map(|c| c.token()),
            tracking_lost: result.tracking_lost,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub total_frames: usize,
    pub frames_with_hands: usize,
    pub tracking_lost: usize,
    pub commands_sent: usize,
    pub gesture_counts: BTreeMap<&'static str, usize>,
}

impl SessionSummary {
    fn count(&mut self, record: &GestureRecord) {
        self.total_frames += 1;
        if record.tracking_lost {
            self.tracking_lost += 1;
            return;
        }
        if record.hand_count > 0 {
            self.frames_with_hands += 1;
        }
        if record.command.is_some() {
            self.commands_sent += 1;
        }
        *self.gesture_counts.entry(record.gesture).or_insert(0) += 1;
    }
}

/// Records one session to `<output_dir>/<session_name>/`.
///
/// Every frame is appended to `gesture_data.csv` and flushed as it arrives,
/// so the file survives an abrupt exit. Only the summary counters stay in
/// memory.
pub struct DataExporter {
    output_dir: PathBuf,
    session_name: String,
    writer: Option<Writer<File>>,
    summary: SessionSummary,
}

impl DataExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            writer: None,
            summary: SessionSummary::default(),
        }
    }

    /// Appends one row. The CSV file is created with the first frame.
    pub fn add_frame(&mut self, result: &TrackingResult) -> Result<()> {
        let record = GestureRecord::from_result(result);

        if self.writer.is_none() {
            self.writer = Some(self.open_writer()?);
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.serialize(&record)?;
            writer.flush()?;
        }

        self.summary.count(&record);
        Ok(())
    }

    fn open_writer(&self) -> Result<Writer<File>> {
        let dir = self.session_dir();
        std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        let csv_path = self.csv_path();
        let writer = Writer::from_path(&csv_path)
            .with_context(|| format!("Failed to create {}", csv_path.display()))?;
        info!("Recording session to {}", csv_path.display());
        Ok(writer)
    }

    pub fn len(&self) -> usize {
        self.summary.total_frames
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total_frames == 0
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.session_dir().join(CSV_FILE)
    }

    /// Copies the recorded CSV to `target`.
    pub fn export_csv_to(&self, target: impl AsRef<Path>) -> Result<PathBuf> {
        if self.is_empty() {
            bail!("No frames recorded yet");
        }

        let target = target.as_ref().to_path_buf();
        std::fs::copy(self.csv_path(), &target)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Ok(target)
    }

    #[cfg(test)]
    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn generate_report(&self) -> Result<PathBuf> {
        let report_path = self.session_dir().join("report.html");
        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&report_path, self.create_html_report())?;
        Ok(report_path)
    }

    fn create_html_report(&self) -> String {
        let summary = &self.summary;
        let detection_rate = if summary.total_frames == 0 {
            0.0
        } else {
            summary.frames_with_hands as f64 / summary.total_frames as f64 * 100.0
        };

        let rows: String = GestureLabel::all()
            .iter()
            .filter_map(|label| {
                summary.gesture_counts.get(label.as_str()).map(|count| {
                    format!(
                        "        <tr><td>{}</td><td>{}</td></tr>\n",
                        label.display_name(),
                        count
                    )
                })
            })
            .collect();

        format!(r#"<!DOCTYPE html>
<html>
<head>
    <title>Gesture Session Report - {name}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        .stats {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #4682EA; font-size: 1.2em; }}
        td {{ padding: 4px 16px; }}
    </style>
</head>
<body>
    <h1>Gesture Session Report</h1>
    <div class="stats">
        <h2>Session: {name}</h2>
        <p><span class="stat-label">Total Frames:</span> <span class="stat-value">{total}</span></p>
        <p><span class="stat-label">Hand Detected:</span> <span class="stat-value">{rate:.1}%</span></p>
        <p><span class="stat-label">Detector Failures:</span> <span class="stat-value">{lost}</span></p>
        <p><span class="stat-label">Commands Sent:</span> <span class="stat-value">{commands}</span></p>
        <table>
        <tr><th>Gesture</th><th>Frames</th></tr>
{rows}        </table>
    </div>
</body>
</html>
"#,
            name = self.session_name,
            total = summary.total_frames,
            rate = detection_rate,
            lost = summary.tracking_lost,
            commands = summary.commands_sent,
            rows = rows,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::gesture::{fixtures::hand, FrameGesture};

    fn result(frame: u64, label: GestureLabel, distance_cm: Option<f64>, command: Option<Command>) -> TrackingResult {
        let hands = if label == GestureLabel::NoHands { vec![] } else { vec![hand([false; 5])] };
        TrackingResult {
            frame,
            timestamp: frame as f64 * 0.5,
            hands,
            gesture: FrameGesture { label, distance_cm },
            command,
            tracking_lost: false,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hand_gesture_data_{}_{}", name, std::process::id()))
    }

    fn exporter(dir: &Path) -> DataExporter {
        let mut exporter = DataExporter::new(dir, Some("unit".to_string()));
        exporter.add_frame(&result(0, GestureLabel::Fist, Some(45.004), Some(Command::Close))).unwrap();
        exporter.add_frame(&result(1, GestureLabel::Fist, Some(44.5), None)).unwrap();
        exporter.add_frame(&result(2, GestureLabel::NoHands, None, None)).unwrap();
        exporter.add_frame(&TrackingResult { frame: 3, tracking_lost: true, ..Default::default() }).unwrap();
        exporter
    }

    #[test]
    fn csv_has_one_row_per_frame() {
        let dir = temp_dir("rows");
        let exporter = exporter(&dir);
        let text = std::fs::read_to_string(exporter.csv_path()).unwrap();
        let _ = std::fs::remove_dir_all(&dir);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "frame,timestamp,hand_count,gesture,distance_cm,command,tracking_lost");
        assert_eq!(lines[1], "0,0.0,1,Fist,45.0,C,false");
        assert_eq!(lines[2], "1,0.5,1,Fist,44.5,,false");
        assert_eq!(lines[3], "2,1.0,0,None,,,false");
        assert_eq!(lines[4], "3,0.0,0,None,,,true");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn rows_reach_disk_while_recording() {
        let dir = temp_dir("live");
        let mut exporter = DataExporter::new(&dir, Some("live".to_string()));
        assert!(!exporter.csv_path().exists());

        exporter.add_frame(&result(0, GestureLabel::FiveFingers, Some(30.0), Some(Command::Open))).unwrap();
        let after_one = std::fs::read_to_string(exporter.csv_path()).unwrap();
        exporter.add_frame(&result(1, GestureLabel::FiveFingers, Some(30.0), None)).unwrap();
        let after_two = std::fs::read_to_string(exporter.csv_path()).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(after_one.lines().count(), 2);
        assert!(after_one.contains("FiveFingers,30.0,O,false"));
        assert_eq!(after_two.lines().count(), 3);
        assert_eq!(exporter.len(), 2);
    }

    #[test]
    fn summary_counts_gestures_and_commands() {
        let dir = temp_dir("summary");
        let exporter = exporter(&dir);
        let _ = std::fs::remove_dir_all(&dir);

        let summary = exporter.summary();
        assert_eq!(summary.total_frames, 4);
        assert_eq!(summary.frames_with_hands, 2);
        assert_eq!(summary.tracking_lost, 1);
        assert_eq!(summary.commands_sent, 1);
        assert_eq!(summary.gesture_counts.get("Fist"), Some(&2));
        assert_eq!(summary.gesture_counts.get("None"), Some(&1));
    }

    #[test]
    fn report_lists_seen_gestures() {
        let dir = temp_dir("report");
        let exporter = exporter(&dir);
        let html = exporter.create_html_report();
        let report = exporter.generate_report().unwrap();
        let on_disk = report.exists();
        let _ = std::fs::remove_dir_all(&dir);

        assert!(on_disk);
        assert!(html.contains("Session: unit"));
        assert!(html.contains("<td>Fist</td><td>2</td>"));
        assert!(!html.contains("Heart"));
    }

    #[test]
    fn export_copies_the_session_file() {
        let dir = temp_dir("export");
        let exporter = exporter(&dir);
        let copy = exporter.export_csv_to(dir.join("copy.csv")).unwrap();
        let copied = std::fs::read_to_string(&copy).unwrap();
        let original = std::fs::read_to_string(exporter.csv_path()).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(copied, original);
    }

    #[test]
    fn empty_session_has_nothing_to_export() {
        let exporter = DataExporter::new("/tmp/out", None);
        let name = exporter.session_dir().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("session_"));
        assert!(exporter.is_empty());
        assert!(exporter.export_csv_to("/tmp/out/never.csv").is_err());
    }
}
