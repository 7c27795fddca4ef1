//! Hand landmark types
//!
//! Landmarks arrive in camera-normalized coordinates (0..1 on both axes,
//! origin top-left) using the 21-point MediaPipe hand topology.

use serde::{Deserialize, Serialize};

/// Number of landmarks per hand
pub const LANDMARK_COUNT: usize = 21;

/// Wrist landmark index
pub const WRIST: usize = 0;
/// Thumb tip landmark index
pub const THUMB_TIP: usize = 4;
/// Index finger base (MCP joint) landmark index
pub const INDEX_BASE: usize = 5;
/// Index fingertip landmark index
pub const INDEX_TIP: usize = 8;

/// Maximum number of hands the gesture pipeline reads per frame
pub const MAX_HANDS: usize = 2;

/// A single tracked point on a hand
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth, when the tracker provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    /// Planar distance to another landmark (depth is ignored)
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One detected hand: 21 landmarks in anatomical order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandFrame {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { landmarks }
    }

    pub fn wrist(&self) -> Landmark {
        self.landmarks[WRIST]
    }

    pub fn thumb_tip(&self) -> Landmark {
        self.landmarks[THUMB_TIP]
    }

    pub fn index_base(&self) -> Landmark {
        self.landmarks[INDEX_BASE]
    }

    pub fn index_tip(&self) -> Landmark {
        self.landmarks[INDEX_TIP]
    }

    /// Whether every landmark the gesture estimator reads is finite
    pub fn is_usable(&self) -> bool {
        [WRIST, THUMB_TIP, INDEX_BASE, INDEX_TIP]
            .iter()
            .all(|&i| self.landmarks[i].is_finite())
    }
}

impl Default for HandFrame {
    fn default() -> Self {
        Self {
            landmarks: [Landmark::default(); LANDMARK_COUNT],
        }
    }
}

/// Everything a landmark source reports for one capture tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Capture time in milliseconds, relative to the start of the source
    #[serde(rename = "timestampMs", default)]
    pub timestamp_ms: f64,
    /// Zero, one, or two hands in tracker order (first is primary)
    #[serde(default)]
    pub hands: Vec<HandFrame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_ignores_depth() {
        let a = Landmark { x: 0.0, y: 0.0, z: Some(5.0) };
        let b = Landmark { x: 0.3, y: 0.4, z: None };
        assert!((a.distance(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_unusable_hand() {
        let mut hand = HandFrame::default();
        assert!(hand.is_usable());
        hand.landmarks[INDEX_TIP].x = f32::NAN;
        assert!(!hand.is_usable());
        // Landmarks the estimator never reads do not matter
        let mut hand = HandFrame::default();
        hand.landmarks[20].y = f32::INFINITY;
        assert!(hand.is_usable());
    }

    #[test]
    fn test_landmark_frame_json() {
        let json = r#"{"timestampMs": 33.0, "hands": []}"#;
        let frame: LandmarkFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp_ms, 33.0);
        assert!(frame.hands.is_empty());
    }
}
