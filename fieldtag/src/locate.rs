/// Camera-to-field localization.
///
/// Two strategies, one set of conventions:
///
/// - **ray**: back-project the detection center through the camera model,
///   rotate the sight ray into the field frame, and intersect it with the
///   horizontal plane the tags live on. Needs only the detection center and
///   the rig calibration.
/// - **pose**: rigidly transform an estimated tag pose translation into the
///   field frame. Needs the tag size but no ground-plane assumption.
use crate::camera::Camera;
use crate::detection::{DetectionFrame, TagDetection};
use crate::error::LocateError;
use crate::field::FieldMap;
use crate::math::Vec3;
use crate::mount::CameraMount;
use crate::pose::{estimate_pose, TagPose};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point on the field map, mm.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldPoint {
    pub x: f64,
    pub y: f64,
    /// Whether the point lies within the field boundary. Out-of-bounds
    /// positions are reported, not dropped.
    pub in_bounds: bool,
}

/// A located tag.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TagPosition {
    pub family: String,
    pub id: i32,
    pub point: FieldPoint,
}

/// Horizontal field-of-view check result.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Visibility {
    pub visible: bool,
    /// Signed bearing offset from the camera's forward direction, degrees.
    pub offset_deg: f64,
}

/// A calibrated rig bound to a field: everything needed to turn detections
/// into field positions.
#[derive(Debug, Clone)]
pub struct FieldLocator {
    pub camera: Camera,
    pub mount: CameraMount,
    pub field: FieldMap,
    /// Height of the tag plane above the floor, mm.
    pub tag_height: f64,
}

impl FieldLocator {
    pub fn new(camera: Camera, mount: CameraMount, field: FieldMap) -> Self {
        FieldLocator {
            camera,
            mount,
            field,
            tag_height: 0.0,
        }
    }

    pub fn with_tag_height(mut self, tag_height: f64) -> Self {
        self.tag_height = tag_height;
        self
    }

    /// Locate a pixel by intersecting its sight ray with the tag plane.
    pub fn locate_by_ray(&self, pixel: [f64; 2]) -> Result<FieldPoint, LocateError> {
        let dir_field = self.mount.rotation() * self.camera.ray(pixel);
        if dir_field.z.abs() < 1e-9 {
            return Err(LocateError::RayParallel);
        }
        let s = (self.tag_height - self.mount.position.z) / dir_field.z;
        if s <= 0.0 {
            return Err(LocateError::BehindCamera);
        }
        let p = self.mount.position + dir_field * s;
        Ok(self.field_point(p.x, p.y))
    }

    /// Locate a tag from its estimated pose translation.
    pub fn locate_by_pose(&self, pose: &TagPose) -> FieldPoint {
        let p = self.mount.camera_to_field(pose.t);
        self.field_point(p.x, p.y)
    }

    /// Locate one detection via the ray strategy.
    pub fn locate_detection(&self, det: &TagDetection) -> Result<TagPosition, LocateError> {
        let point = self.locate_by_ray(det.center)?;
        Ok(TagPosition {
            family: det.family.clone(),
            id: det.id,
            point,
        })
    }

    /// Locate every detection in a frame via the ray strategy.
    ///
    /// Detections whose sight ray misses the tag plane are skipped.
    pub fn locate_frame(&self, frame: &DetectionFrame) -> Vec<TagPosition> {
        frame
            .detections
            .iter()
            .filter_map(|det| self.locate_detection(det).ok())
            .collect()
    }

    /// Locate every detection in a frame via the pose strategy.
    ///
    /// Detections with degenerate corners are skipped.
    pub fn locate_frame_by_pose(&self, frame: &DetectionFrame, tag_size: f64) -> Vec<TagPosition> {
        frame
            .detections
            .iter()
            .filter_map(|det| {
                let est = estimate_pose(det, &self.camera, tag_size).ok()?;
                Some(TagPosition {
                    family: det.family.clone(),
                    id: det.id,
                    point: self.locate_by_pose(&est.pose),
                })
            })
            .collect()
    }

    /// Locate a batch of frames.
    #[cfg(feature = "parallel")]
    pub fn locate_frames(&self, frames: &[DetectionFrame]) -> Vec<Vec<TagPosition>> {
        frames.par_iter().map(|f| self.locate_frame(f)).collect()
    }

    /// Locate a batch of frames.
    #[cfg(not(feature = "parallel"))]
    pub fn locate_frames(&self, frames: &[DetectionFrame]) -> Vec<Vec<TagPosition>> {
        frames.iter().map(|f| self.locate_frame(f)).collect()
    }

    /// Check whether a field point falls within the camera's horizontal
    /// field of view.
    ///
    /// The bearing is measured in the field plane between the camera's
    /// projected forward direction and the direction to the target. A rig
    /// looking straight down has no horizontal forward direction and sees
    /// every bearing; a target at the camera's own footprint is reported
    /// not visible.
    pub fn visibility(&self, fov_deg: f64, target: [f64; 2]) -> Visibility {
        let to_target = [
            target[0] - self.mount.position.x,
            target[1] - self.mount.position.y,
        ];
        let dist = (to_target[0] * to_target[0] + to_target[1] * to_target[1]).sqrt();
        if dist < 1e-9 {
            return Visibility {
                visible: false,
                offset_deg: 0.0,
            };
        }

        let fwd = self.mount.rotation() * Vec3::new(0.0, 0.0, 1.0);
        if (fwd.x * fwd.x + fwd.y * fwd.y).sqrt() < 1e-9 {
            return Visibility {
                visible: true,
                offset_deg: 0.0,
            };
        }

        let center_angle = f64::atan2(fwd.y, fwd.x);
        let target_angle = f64::atan2(to_target[1], to_target[0]);
        let offset = normalize_angle(target_angle - center_angle);

        Visibility {
            visible: offset.abs() <= fov_deg.to_radians() / 2.0,
            offset_deg: offset.to_degrees(),
        }
    }

    fn field_point(&self, x: f64, y: f64) -> FieldPoint {
        FieldPoint {
            x,
            y,
            in_bounds: self.field.contains([x, y]),
        }
    }
}

/// Wrap an angle to [-pi, pi).
fn normalize_angle(a: f64) -> f64 {
    use std::f64::consts::PI;
    (a + PI).rem_euclid(2.0 * PI) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Intrinsics;
    use crate::rotation::EulerDeg;

    fn test_camera() -> Camera {
        Camera::new(Intrinsics::new(600.0, 600.0, 320.0, 240.0))
    }

    fn overhead_locator() -> FieldLocator {
        FieldLocator::new(
            test_camera(),
            CameraMount::overhead(900.0, 900.0, 900.0),
            FieldMap::square(1800.0),
        )
    }

    /// A level rig on the Y=0 edge looking along field +Y, image-down
    /// toward the floor.
    fn horizontal_locator() -> FieldLocator {
        FieldLocator::new(
            test_camera(),
            CameraMount::new(
                Vec3::new(250.0, 0.0, 500.0),
                EulerDeg::new(0.0, 0.0, -90.0),
            ),
            FieldMap::square(500.0),
        )
    }

    fn detection_at(center: [f64; 2], id: i32) -> TagDetection {
        TagDetection {
            family: "tag36h11".to_string(),
            id,
            corners: [
                [center[0] - 10.0, center[1] - 10.0],
                [center[0] + 10.0, center[1] - 10.0],
                [center[0] + 10.0, center[1] + 10.0],
                [center[0] - 10.0, center[1] + 10.0],
            ],
            center,
            decision_margin: 50.0,
        }
    }

    #[test]
    fn ray_locates_point_below_overhead_camera() {
        let loc = overhead_locator();
        let p = loc.locate_by_ray([320.0, 240.0]).unwrap();
        assert!((p.x - 900.0).abs() < 1e-9 && (p.y - 900.0).abs() < 1e-9);
        assert!(p.in_bounds);
    }

    #[test]
    fn ray_recovers_known_field_position() {
        let loc = overhead_locator();
        let truth = Vec3::new(1100.0, 700.0, 0.0);
        let pixel = loc
            .mount
            .project_field_point(&loc.camera, truth)
            .expect("tag projects into the image");
        let p = loc.locate_by_ray(pixel).unwrap();
        assert!(
            (p.x - truth.x).abs() < 1e-6 && (p.y - truth.y).abs() < 1e-6,
            "got ({}, {})",
            p.x,
            p.y
        );
    }

    #[test]
    fn ray_respects_tag_height() {
        let loc = overhead_locator().with_tag_height(100.0);
        let truth = Vec3::new(1100.0, 700.0, 100.0);
        let pixel = loc
            .mount
            .project_field_point(&loc.camera, truth)
            .expect("tag projects into the image");
        let p = loc.locate_by_ray(pixel).unwrap();
        assert!(
            (p.x - truth.x).abs() < 1e-6 && (p.y - truth.y).abs() < 1e-6,
            "got ({}, {})",
            p.x,
            p.y
        );
    }

    #[test]
    fn oblique_rig_recovers_known_position() {
        // Edge-mounted rig tilted down toward +X, like the tilted bench setups
        let loc = FieldLocator::new(
            test_camera(),
            CameraMount::new(
                Vec3::new(-250.0, 250.0, 790.0),
                EulerDeg::new(0.0, -60.0, 180.0),
            ),
            FieldMap::square(500.0),
        );
        let truth = Vec3::new(250.0, 300.0, 0.0);
        let pixel = loc
            .mount
            .project_field_point(&loc.camera, truth)
            .expect("tag projects into the image");
        let p = loc.locate_by_ray(pixel).unwrap();
        assert!(
            (p.x - truth.x).abs() < 1e-6 && (p.y - truth.y).abs() < 1e-6,
            "got ({}, {})",
            p.x,
            p.y
        );
    }

    #[test]
    fn horizontal_ray_is_parallel_error() {
        let loc = horizontal_locator();
        // Principal point looks exactly along the horizon
        assert_eq!(
            loc.locate_by_ray([320.0, 240.0]).unwrap_err(),
            LocateError::RayParallel
        );
    }

    #[test]
    fn plane_above_camera_is_behind_error() {
        let loc = overhead_locator().with_tag_height(2000.0);
        assert_eq!(
            loc.locate_by_ray([320.0, 240.0]).unwrap_err(),
            LocateError::BehindCamera
        );
    }

    #[test]
    fn out_of_bounds_positions_are_flagged_not_dropped() {
        let loc = FieldLocator::new(
            test_camera(),
            CameraMount::overhead(0.0, 0.0, 1000.0),
            FieldMap::square(500.0),
        );
        // A pixel left of center maps to negative field X
        let p = loc.locate_by_ray([100.0, 240.0]).unwrap();
        assert!(p.x < 0.0);
        assert!(!p.in_bounds);
    }

    #[test]
    fn pose_strategy_matches_rigid_transform() {
        let loc = overhead_locator();
        let truth = Vec3::new(400.0, 1300.0, 0.0);
        let pose = TagPose {
            r: crate::math::Mat3::IDENTITY,
            t: loc.mount.field_to_camera(truth),
        };
        let p = loc.locate_by_pose(&pose);
        assert!(
            (p.x - truth.x).abs() < 1e-9 && (p.y - truth.y).abs() < 1e-9,
            "got ({}, {})",
            p.x,
            p.y
        );
    }

    #[test]
    fn frame_locates_all_detections() {
        let loc = overhead_locator();
        let mut frame = DetectionFrame {
            width: 640,
            height: 480,
            detections: Vec::new(),
        };
        let truths = [Vec3::new(700.0, 800.0, 0.0), Vec3::new(1200.0, 1000.0, 0.0)];
        for (i, t) in truths.iter().enumerate() {
            let pixel = loc.mount.project_field_point(&loc.camera, *t).unwrap();
            frame.detections.push(detection_at(pixel, i as i32));
        }

        let positions = loc.locate_frame(&frame);
        assert_eq!(positions.len(), 2);
        for (pos, truth) in positions.iter().zip(&truths) {
            assert!(
                (pos.point.x - truth.x).abs() < 1e-6
                    && (pos.point.y - truth.y).abs() < 1e-6,
                "tag {}: got ({}, {})",
                pos.id,
                pos.point.x,
                pos.point.y
            );
        }
    }

    #[test]
    fn frame_skips_rays_missing_the_plane() {
        let loc = horizontal_locator();
        let frame = DetectionFrame {
            width: 640,
            height: 480,
            detections: vec![
                detection_at([320.0, 240.0], 0), // horizon, unlocatable
                detection_at([320.0, 400.0], 1), // below horizon, hits the floor
            ],
        };
        let positions = loc.locate_frame(&frame);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].id, 1);
    }

    #[test]
    fn frames_batch_matches_single_frame() {
        let loc = overhead_locator();
        let pixel = loc
            .mount
            .project_field_point(&loc.camera, Vec3::new(600.0, 600.0, 0.0))
            .unwrap();
        let frame = DetectionFrame {
            width: 640,
            height: 480,
            detections: vec![detection_at(pixel, 3)],
        };
        let batch = loc.locate_frames(&[frame.clone(), frame.clone()]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], loc.locate_frame(&frame));
        assert_eq!(batch[1], batch[0]);
    }

    #[test]
    fn overhead_rig_sees_every_bearing() {
        let loc = overhead_locator();
        let vis = loc.visibility(60.0, [0.0, 0.0]);
        assert!(vis.visible);
        assert_eq!(vis.offset_deg, 0.0);
    }

    #[test]
    fn forward_target_is_visible() {
        let loc = horizontal_locator();
        let vis = loc.visibility(120.0, [250.0, 500.0]);
        assert!(vis.visible);
        assert!(vis.offset_deg.abs() < 1e-9, "offset={}", vis.offset_deg);
    }

    #[test]
    fn narrow_fov_excludes_wide_target() {
        let loc = horizontal_locator();
        // Bearing to (50, 250) sits ~38.7 degrees left of the forward axis
        let wide = loc.visibility(120.0, [50.0, 250.0]);
        assert!(wide.visible, "offset={}", wide.offset_deg);
        let narrow = loc.visibility(60.0, [50.0, 250.0]);
        assert!(!narrow.visible, "offset={}", narrow.offset_deg);
        assert!((narrow.offset_deg - 38.66).abs() < 0.1, "offset={}", narrow.offset_deg);
    }

    #[test]
    fn target_behind_camera_not_visible() {
        let loc = horizontal_locator();
        let vis = loc.visibility(170.0, [250.0, -300.0]);
        assert!(!vis.visible);
        assert!(vis.offset_deg.abs() > 170.0 / 2.0);
    }

    #[test]
    fn target_at_camera_footprint_not_visible() {
        let loc = horizontal_locator();
        let vis = loc.visibility(120.0, [250.0, 0.0]);
        assert!(!vis.visible);
        assert_eq!(vis.offset_deg, 0.0);
    }
}
