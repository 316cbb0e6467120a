/// Detection records produced by an AprilTag detector.
///
/// Detection itself happens upstream (any detector that reports tag id,
/// corners, and center will do); these types are the exchange format the
/// rest of the crate consumes.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One detected tag in an image.
///
/// Corners are in pixel coordinates, ordered top-left, top-right,
/// bottom-right, bottom-left in the tag's own frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TagDetection {
    pub family: String,
    pub id: i32,
    pub corners: [[f64; 2]; 4],
    pub center: [f64; 2],
    #[cfg_attr(feature = "serde", serde(default))]
    pub decision_margin: f32,
}

/// All detections from one camera frame.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionFrame {
    pub width: u32,
    pub height: u32,
    pub detections: Vec<TagDetection>,
}
