// src/tracking.rs - Per-frame orchestration: detection -> classification -> command
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::command::{Command, CommandMapper};
use crate::error::GestureError;
use crate::gesture::{ClassifierConfig, FrameGesture, GestureDispatcher, GestureLabel};
use crate::landmarks::{FrameObservation, HandLandmarks};

const METRICS_WINDOW: usize = 30;

#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    pub avg_fps: f32,
    pub avg_processing_time: f32,
    frame_times: VecDeque<f32>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            avg_fps: 0.0,
            avg_processing_time: 0.0,
            frame_times: VecDeque::with_capacity(METRICS_WINDOW),
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.frame_times.push_front(elapsed.as_secs_f32());
        if self.frame_times.len() > METRICS_WINDOW {
            self.frame_times.pop_back();
        }

        self.avg_processing_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        self.avg_fps = if self.avg_processing_time > 0.0 {
            1.0 / self.avg_processing_time
        } else {
            0.0
        };
    }

    pub fn samples(&self) -> usize {
        self.frame_times.len()
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct TrackingResult {
    pub frame: u64,
    /// Seconds since the tracker was created.
    pub timestamp: f64,
    pub hands: Vec<HandLandmarks>,
    pub gesture: FrameGesture,
    pub command: Option<Command>,
    /// The detector failed for this frame; nothing was classified.
    pub tracking_lost: bool,
}

impl Default for TrackingResult {
    fn default() -> Self {
        Self {
            frame: 0,
            timestamp: 0.0,
            hands: Vec::new(),
            gesture: FrameGesture::no_hands(),
            command: None,
            tracking_lost: false,
        }
    }
}

impl TrackingResult {
    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }
}

/// Owns the dispatcher and the debounce state for one capture session.
pub struct GestureTracker {
    dispatcher: GestureDispatcher,
    mapper: CommandMapper,
    metrics: PerformanceMetrics,
    frame_counter: u64,
    started: Instant,
    /// Last frame had more hands than the dispatcher classifies.
    over_limit: bool,
}

impl GestureTracker {
    pub fn new(config: ClassifierConfig, max_hands: usize) -> Self {
        let dispatcher = GestureDispatcher::new(config, max_hands);
        info!(
            "Gesture tracker ready (max hands {}, OK policy {:?}, chirality {:?})",
            dispatcher.max_hands(),
            dispatcher.config().ok_policy,
            dispatcher.config().chirality
        );

        Self {
            dispatcher,
            mapper: CommandMapper::new(),
            metrics: PerformanceMetrics::new(),
            frame_counter: 0,
            started: Instant::now(),
            over_limit: false,
        }
    }

    /// Classifies one frame of hands and feeds the label to the command mapper.
    pub fn process_hands(&mut self, hands: Vec<HandLandmarks>) -> TrackingResult {
        let observation = FrameObservation::new(hands);
        self.note_hand_count(observation.hand_count());
        let gesture = self.dispatcher.classify(&observation);
        let had_gesture = self.mapper.stable_label().is_some();
        let command = self.mapper.observe(gesture.label);

        if had_gesture && gesture.label == GestureLabel::NoHands {
            info!("No hands detected, gesture state reset");
        }
        if let Some(cmd) = command {
            info!("Gesture {} -> command {}", gesture.label.as_str(), cmd.token());
        }
        debug!(
            "Frame {}: {} hand(s), {} {}",
            self.frame_counter,
            observation.hand_count(),
            gesture.label.as_str(),
            gesture.distance_text()
        );

        let result = TrackingResult {
            frame: self.frame_counter,
            timestamp: self.started.elapsed().as_secs_f64(),
            hands: observation.into_hands(),
            gesture,
            command,
            tracking_lost: false,
        };
        self.frame_counter += 1;
        result
    }

    fn note_hand_count(&mut self, count: usize) {
        let over = count > self.dispatcher.max_hands();
        if over && !self.over_limit {
            warn!(
                "Detector reported {} hands, classifying only the first {}",
                count,
                self.dispatcher.max_hands()
            );
        }
        self.over_limit = over;
    }

    /// Like `process_hands`, but takes the detector's raw outcome. A failed
    /// detection leaves the debounce state untouched.
    pub fn process_detection(&mut self, detection: Result<Vec<HandLandmarks>, GestureError>) -> TrackingResult {
        match detection {
            Ok(hands) => self.process_hands(hands),
            Err(e) => {
                warn!("Landmark detection failed on frame {}: {}", self.frame_counter, e);
                let result = TrackingResult {
                    frame: self.frame_counter,
                    timestamp: self.started.elapsed().as_secs_f64(),
                    tracking_lost: true,
                    ..Default::default()
                };
                self.frame_counter += 1;
                result
            }
        }
    }

    /// Records the wall time of one capture-detect-classify iteration.
    pub fn record_loop_time(&mut self, elapsed: Duration) {
        self.metrics.record(elapsed);
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn stable_label(&self) -> Option<GestureLabel> {
        self.mapper.stable_label()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_counter
    }

    /// Replaces the classifier settings. The debounce state is kept.
    pub fn set_config(&mut self, config: ClassifierConfig) {
        self.dispatcher = GestureDispatcher::new(config, self.dispatcher.max_hands());
    }

    /// Drops the stable gesture without emitting anything.
    pub fn reset(&mut self) {
        self.mapper.reset();
    }
}
