// src/gesture.rs - Rule-based gesture classification over hand landmarks
//
// One hand is classified from which fingers are extended plus a thumb/index
// pinch check. Two hands are classified from fingertip proximity only. Rules
// are evaluated in a fixed priority order and the first match wins.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{distance, is_extended_vertical, is_thumb_extended_horizontal, HandChirality};
use crate::landmarks::{FrameObservation, HandLandmarks, FINGERTIPS, THUMB_IP, THUMB_TIP};

/// Hands beyond this count are never classified.
pub const MAX_CLASSIFIED_HANDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureLabel {
    Fist,
    OneFinger,
    TwoFingers,
    ThreeFingers,
    FourFingers,
    FiveFingers,
    #[serde(rename = "OK")]
    Ok,
    TwoHands,
    Heart,
    LargeCircle,
    Unrecognized,
    #[serde(rename = "None")]
    NoHands,
}

impl GestureLabel {
    /// Identifier used in logs, CSV output and replay fixtures.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fist => "Fist",
            Self::OneFinger => "OneFinger",
            Self::TwoFingers => "TwoFingers",
            Self::ThreeFingers => "ThreeFingers",
            Self::FourFingers => "FourFingers",
            Self::FiveFingers => "FiveFingers",
            Self::Ok => "OK",
            Self::TwoHands => "TwoHands",
            Self::Heart => "Heart",
            Self::LargeCircle => "LargeCircle",
            Self::Unrecognized => "Unrecognized",
            Self::NoHands => "None",
        }
    }

    /// Human readable text for the control panel.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Fist => "Fist",
            Self::OneFinger => "1 Finger",
            Self::TwoFingers => "V (2 Fingers)",
            Self::ThreeFingers => "3 Fingers",
            Self::FourFingers => "4 Fingers",
            Self::FiveFingers => "5 Fingers (Open)",
            Self::Ok => "OK",
            Self::TwoHands => "Two Hands",
            Self::Heart => "Heart",
            Self::LargeCircle => "Large Circle",
            Self::Unrecognized => "Unrecognized",
            Self::NoHands => "-",
        }
    }

    pub fn all() -> [GestureLabel; 12] {
        [
            Self::Fist,
            Self::OneFinger,
            Self::TwoFingers,
            Self::ThreeFingers,
            Self::FourFingers,
            Self::FiveFingers,
            Self::Ok,
            Self::TwoHands,
            Self::Heart,
            Self::LargeCircle,
            Self::Unrecognized,
            Self::NoHands,
        ]
    }
}

/// How strict the "OK" pinch rule is about the remaining fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OkPolicy {
    /// Pinch plus at least three extended fingers in total.
    #[default]
    AtLeastThree,
    /// Pinch plus middle, ring and pinky all extended.
    ThreeOpenFingers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub ok_pinch_threshold: f64,
    pub two_hand_pinch_threshold: f64,
    pub ok_policy: OkPolicy,
    pub chirality: HandChirality,
    /// Wrist to middle-MCP length measured at `reference_distance_cm`.
    pub reference_width: f64,
    pub reference_distance_cm: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ok_pinch_threshold: 0.05,
            two_hand_pinch_threshold: 0.1,
            ok_policy: OkPolicy::AtLeastThree,
            chirality: HandChirality::RightMirrored,
            reference_width: 0.3,
            reference_distance_cm: 30.0,
        }
    }
}

/// Extension state of each finger, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingersUp {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingersUp {
    /// The thumb is compared against its IP joint horizontally, the other
    /// fingers against their PIP joint (two indices below the tip) vertically.
    pub fn from_hand(hand: &HandLandmarks, chirality: HandChirality) -> Self {
        let vertical = |tip: usize| is_extended_vertical(hand.point(tip), hand.point(tip - 2));

        Self {
            thumb: is_thumb_extended_horizontal(hand.point(THUMB_TIP), hand.point(THUMB_IP), chirality),
            index: vertical(FINGERTIPS[1]),
            middle: vertical(FINGERTIPS[2]),
            ring: vertical(FINGERTIPS[3]),
            pinky: vertical(FINGERTIPS[4]),
        }
    }

    pub fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    pub fn count(&self) -> usize {
        self.as_array().iter().filter(|up| **up).count()
    }
}

/// Classifier output for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGesture {
    pub label: GestureLabel,
    /// Monocular distance estimate, only meaningful relative to calibration.
    pub distance_cm: Option<f64>,
}

impl FrameGesture {
    pub fn no_hands() -> Self {
        Self { label: GestureLabel::NoHands, distance_cm: None }
    }

    pub fn distance_text(&self) -> String {
        match self.distance_cm {
            Some(cm) => format!("{:.2} cm", cm),
            None => "-".to_string(),
        }
    }
}

/// Distance from the camera derived from apparent palm length.
/// Returns `None` when the wrist and middle MCP coincide.
pub fn estimate_distance_cm(hand: &HandLandmarks, config: &ClassifierConfig) -> Option<f64> {
    let pixel_width = distance(hand.wrist(), hand.middle_mcp());
    if pixel_width > 0.0 {
        Some(config.reference_width * config.reference_distance_cm / pixel_width)
    } else {
        None
    }
}

pub fn classify_single_hand(hand: &HandLandmarks, config: &ClassifierConfig) -> FrameGesture {
    FrameGesture {
        label: single_hand_label(hand, config),
        distance_cm: estimate_distance_cm(hand, config),
    }
}

fn single_hand_label(hand: &HandLandmarks, config: &ClassifierConfig) -> GestureLabel {
    let up = FingersUp::from_hand(hand, config.chirality);
    let total = up.count();

    let pinch = distance(hand.thumb_tip(), hand.index_tip()) < config.ok_pinch_threshold;
    let ok_fingers = match config.ok_policy {
        OkPolicy::AtLeastThree => total >= 3,
        OkPolicy::ThreeOpenFingers => total >= 3 && up.middle && up.ring && up.pinky,
    };

    if pinch && ok_fingers {
        GestureLabel::Ok
    } else if total == 0 {
        GestureLabel::Fist
    } else if total == 1 && up.index {
        GestureLabel::OneFinger
    } else if total == 2 && up.index && up.middle {
        GestureLabel::TwoFingers
    } else if total == 3 && up.index && up.middle && up.ring {
        GestureLabel::ThreeFingers
    } else if total == 4 && up.index && up.middle && up.ring && up.pinky {
        GestureLabel::FourFingers
    } else if total == 5 {
        GestureLabel::FiveFingers
    } else {
        GestureLabel::Unrecognized
    }
}

/// Two-hand rules. Every check is either symmetric between the hands or
/// refers to one hand only, so argument order does not matter.
pub fn classify_two_hands(a: &HandLandmarks, b: &HandLandmarks, config: &ClassifierConfig) -> GestureLabel {
    let threshold = config.two_hand_pinch_threshold;

    let tips_together = distance(a.index_tip(), b.index_tip()) < threshold
        && distance(a.thumb_tip(), b.thumb_tip()) < threshold;
    let index_above_thumb = a.index_tip().y < a.thumb_tip().y && b.index_tip().y < b.thumb_tip().y;
    if tips_together && index_above_thumb {
        return GestureLabel::Heart;
    }

    if distance(a.index_tip(), a.thumb_tip()) < threshold && distance(b.index_tip(), b.thumb_tip()) < threshold {
        return GestureLabel::LargeCircle;
    }

    GestureLabel::TwoHands
}

/// Picks the single- or two-hand classifier from the hand count.
/// Holds configuration only; every call is independent of the previous one.
#[derive(Debug, Clone)]
pub struct GestureDispatcher {
    config: ClassifierConfig,
    max_hands: usize,
}

impl GestureDispatcher {
    pub fn new(config: ClassifierConfig, max_hands: usize) -> Self {
        Self {
            config,
            max_hands: max_hands.clamp(1, MAX_CLASSIFIED_HANDS),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn max_hands(&self) -> usize {
        self.max_hands
    }

    pub fn classify(&self, observation: &FrameObservation) -> FrameGesture {
        let hands = observation.hands();
        if hands.len() > self.max_hands {
            debug!(
                "Detector reported {} hands, classifying only the first {}",
                hands.len(),
                self.max_hands
            );
        }

        match &hands[..hands.len().min(self.max_hands)] {
            [] => FrameGesture::no_hands(),
            [hand] => classify_single_hand(hand, &self.config),
            [a, b, ..] => FrameGesture {
                label: classify_two_hands(a, b, &self.config),
                distance_cm: None,
            },
        }
    }
}

impl Default for GestureDispatcher {
    fn default() -> Self {
        Self::new(ClassifierConfig::default(), MAX_CLASSIFIED_HANDS)
    }
}
