// src/mediapipe_bridge.rs - Seam to the external hand-landmark detector
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use image::DynamicImage;
use tracing::{info, warn};

use crate::error::GestureError;
use crate::landmarks::HandLandmarks;

/// Anything that turns an RGB frame into zero or more hand landmark sets.
pub trait LandmarkProvider {
    fn name(&self) -> &str;

    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<HandLandmarks>, GestureError>;
}

/// Placeholder for the MediaPipe hand model. No model is linked into this
/// build, so every frame reports zero hands.
pub struct MediaPipeWrapper;

impl MediaPipeWrapper {
    pub fn new() -> Self {
        warn!("No hand landmark model linked, every frame will report zero hands");
        Self
    }
}

impl LandmarkProvider for MediaPipeWrapper {
    fn name(&self) -> &str {
        "mediapipe-stub"
    }

    fn detect(&mut self, _frame: &DynamicImage) -> Result<Vec<HandLandmarks>, GestureError> {
        Ok(Vec::new())
    }
}

/// Plays back landmarks recorded as JSON lines.
///
/// Each non-empty line is one frame: an array of hands, each hand an array of
/// 21 `[x, y]` pairs. Once the recording is exhausted, frames report no hands.
pub struct ReplayProvider {
    frames: Vec<Vec<HandLandmarks>>,
    cursor: usize,
}

impl ReplayProvider {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GestureError> {
        let path = path.as_ref();
        let provider = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!("Loaded {} replay frames from {}", provider.len(), path.display());
        Ok(provider)
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self, GestureError> {
        let mut frames = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let raw: Vec<Vec<[f64; 2]>> = serde_json::from_str(&line)
                .map_err(|source| GestureError::Replay { line: i + 1, source })?;
            let hands = raw
                .iter()
                .map(|coords| HandLandmarks::from_xy(coords))
                .collect::<Result<Vec<_>, _>>()?;
            frames.push(hands);
        }

        Ok(Self { frames, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    /// Next recorded frame, or `None` once every frame has been played.
    pub fn next_hands(&mut self) -> Option<Vec<HandLandmarks>> {
        let hands = self.frames.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(hands)
    }

    #[cfg(test)]
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl LandmarkProvider for ReplayProvider {
    fn name(&self) -> &str {
        "replay"
    }

    fn detect(&mut self, _frame: &DynamicImage) -> Result<Vec<HandLandmarks>, GestureError> {
        Ok(self.next_hands().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hand_json(x: f64) -> String {
        let points: Vec<String> = (0..21).map(|_| format!("[{}, 0.5]", x)).collect();
        format!("[{}]", points.join(","))
    }

    #[test]
    fn replays_frames_in_order() {
        let text = format!("[]\n\n[{}]\n[{},{}]\n", hand_json(0.1), hand_json(0.2), hand_json(0.3));
        let mut replay = ReplayProvider::from_reader(Cursor::new(text)).unwrap();
        assert_eq!(replay.len(), 3);

        assert_eq!(replay.next_hands().unwrap().len(), 0);
        let one = replay.next_hands().unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].wrist().x, 0.1);
        assert_eq!(replay.next_hands().unwrap().len(), 2);
        assert!(replay.is_finished());
        assert!(replay.next_hands().is_none());

        replay.rewind();
        assert!(!replay.is_finished());
    }

    #[test]
    fn detect_reports_no_hands_after_the_end() {
        let mut replay = ReplayProvider::from_reader(Cursor::new(format!("[{}]", hand_json(0.4)))).unwrap();
        let frame = DynamicImage::new_rgb8(4, 4);
        assert_eq!(replay.detect(&frame).unwrap().len(), 1);
        assert!(replay.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let text = format!("[{}]\nnot json\n", hand_json(0.1));
        match ReplayProvider::from_reader(Cursor::new(text)) {
            Err(GestureError::Replay { line, .. }) => assert_eq!(line, 2),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("malformed replay accepted"),
        }
    }

    #[test]
    fn short_hand_is_rejected() {
        let text = "[[[0.1, 0.2], [0.3, 0.4]]]";
        assert!(matches!(
            ReplayProvider::from_reader(Cursor::new(text)),
            Err(GestureError::LandmarkCount { found: 2, .. })
        ));
    }

    #[test]
    fn stub_detects_nothing() {
        let mut stub = MediaPipeWrapper::new();
        assert_eq!(stub.name(), "mediapipe-stub");
        assert!(stub.detect(&DynamicImage::new_rgb8(8, 8)).unwrap().is_empty());
    }
}
