// src/geometry.rs
use serde::{Deserialize, Serialize};

use crate::landmarks::Landmark;

/// Which hand the thumb test is tuned for, as seen on a horizontally
/// mirrored camera image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HandChirality {
    /// Thumb tip left of its IP joint counts as extended.
    #[default]
    RightMirrored,
    /// Thumb tip right of its IP joint counts as extended.
    LeftMirrored,
}

/// Euclidean distance in normalized image coordinates.
pub fn distance(p1: &Landmark, p2: &Landmark) -> f64 {
    nalgebra::distance(p1, p2)
}

/// A finger points up when its tip sits above the reference joint.
pub fn is_extended_vertical(tip: &Landmark, joint: &Landmark) -> bool {
    tip.y < joint.y
}

pub fn is_thumb_extended_horizontal(tip: &Landmark, joint: &Landmark, chirality: HandChirality) -> bool {
    match chirality {
        HandChirality::RightMirrored => tip.x < joint.x,
        HandChirality::LeftMirrored => tip.x > joint.x,
    }
}
