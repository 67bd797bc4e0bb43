// src/landmarks.rs - Hand landmark schema shared by every detected hand
use nalgebra::Point2;

use crate::error::GestureError;

/// One normalized image-space point, origin top-left, y growing downward.
pub type Landmark = Point2<f64>;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Fingertips in thumb, index, middle, ring, pinky order.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Bone segments used when drawing a hand over the video frame.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (WRIST, PINKY_MCP),
];

/// The 21 landmarks of one detected hand.
///
/// The index schema is the same for left and right hands. Construction checks
/// the point count and rejects non-finite coordinates, so every value of this
/// type is a valid classifier input.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Result<Self, GestureError> {
        for (index, p) in points.iter().enumerate() {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(GestureError::NonFiniteLandmark { index, x: p.x, y: p.y });
            }
        }
        Ok(Self { points })
    }

    pub fn from_xy(coords: &[[f64; 2]]) -> Result<Self, GestureError> {
        if coords.len() != LANDMARK_COUNT {
            return Err(GestureError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found: coords.len(),
            });
        }

        let mut points = [Landmark::origin(); LANDMARK_COUNT];
        for (slot, [x, y]) in points.iter_mut().zip(coords.iter().copied()) {
            *slot = Landmark::new(x, y);
        }
        Self::new(points)
    }

    pub fn point(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn wrist(&self) -> &Landmark {
        &self.points[WRIST]
    }

    pub fn thumb_tip(&self) -> &Landmark {
        &self.points[THUMB_TIP]
    }

    pub fn index_tip(&self) -> &Landmark {
        &self.points[INDEX_TIP]
    }

    pub fn middle_mcp(&self) -> &Landmark {
        &self.points[MIDDLE_MCP]
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

impl TryFrom<Vec<Landmark>> for HandLandmarks {
    type Error = GestureError;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        let found = points.len();
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| GestureError::LandmarkCount { expected: LANDMARK_COUNT, found })?;
        Self::new(points)
    }
}

/// Hands reported by the detector for one frame. Replaced every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameObservation {
    hands: Vec<HandLandmarks>,
}

impl FrameObservation {
    pub fn new(hands: Vec<HandLandmarks>) -> Self {
        Self { hands }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    pub fn hands(&self) -> &[HandLandmarks] {
        &self.hands
    }

    pub fn into_hands(self) -> Vec<HandLandmarks> {
        self.hands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_xy_requires_21_points() {
        let coords = vec![[0.5, 0.5]; 20];
        match HandLandmarks::from_xy(&coords) {
            Err(GestureError::LandmarkCount { expected, found }) => {
                assert_eq!(expected, 21);
                assert_eq!(found, 20);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let mut coords = vec![[0.5, 0.5]; 21];
        coords[7] = [f64::NAN, 0.2];
        assert!(matches!(
            HandLandmarks::from_xy(&coords),
            Err(GestureError::NonFiniteLandmark { index: 7, .. })
        ));
    }

    #[test]
    fn named_accessors_follow_the_schema() {
        let coords: Vec<[f64; 2]> = (0..21).map(|i| [i as f64 / 100.0, 0.0]).collect();
        let hand = HandLandmarks::from_xy(&coords).unwrap();
        assert_eq!(hand.wrist().x, 0.0);
        assert_eq!(hand.thumb_tip().x, 0.04);
        assert_eq!(hand.index_tip().x, 0.08);
        assert_eq!(hand.middle_mcp().x, 0.09);
        assert_eq!(hand.points().len(), LANDMARK_COUNT);
    }

    #[test]
    fn try_from_vec_checks_length() {
        let short = vec![Landmark::new(0.1, 0.1); 3];
        assert!(HandLandmarks::try_from(short).is_err());
        let full = vec![Landmark::new(0.1, 0.1); 21];
        assert!(HandLandmarks::try_from(full).is_ok());
    }
}
