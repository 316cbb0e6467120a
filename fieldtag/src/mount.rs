/// Camera extrinsics: where the camera sits in the field frame and how it
/// is aimed.
///
/// The mount attitude maps camera axes into field axes as
/// `Rz(yaw) * Ry(pitch) * Rx(roll)`. With zero attitude the optical axis
/// points straight up (+Z field); an overhead camera looking at the floor is
/// `roll = 180`, which keeps image-x along field +X. Tilted edge rigs
/// compose a pitch on top of that: pitch -60 with roll 180 looks down and
/// toward +X.
use crate::camera::Camera;
use crate::math::{Mat3, Vec3};
use crate::rotation::EulerDeg;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraMount {
    /// Optical center in the field frame, mm.
    pub position: Vec3,
    /// Camera-to-field attitude.
    pub attitude: EulerDeg,
}

impl CameraMount {
    pub fn new(position: Vec3, attitude: EulerDeg) -> Self {
        CameraMount { position, attitude }
    }

    /// An overhead rig at (x, y) looking straight down from `height` mm,
    /// image-x aligned with field +X.
    pub fn overhead(x: f64, y: f64, height: f64) -> Self {
        CameraMount {
            position: Vec3::new(x, y, height),
            attitude: EulerDeg::new(0.0, 0.0, 180.0),
        }
    }

    /// Camera-to-field rotation.
    pub fn rotation(&self) -> Mat3 {
        self.attitude.to_matrix()
    }

    /// Map a camera-frame point into the field frame.
    pub fn camera_to_field(&self, p_cam: Vec3) -> Vec3 {
        self.rotation() * p_cam + self.position
    }

    /// Map a field-frame point into the camera frame.
    pub fn field_to_camera(&self, p_field: Vec3) -> Vec3 {
        self.rotation().transpose() * (p_field - self.position)
    }

    /// Project a field-frame point into the image; `None` when it falls
    /// behind the camera. Used to overlay field geometry on camera frames.
    pub fn project_field_point(&self, camera: &Camera, p_field: Vec3) -> Option<[f64; 2]> {
        camera.project(self.field_to_camera(p_field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, Intrinsics};

    fn assert_vec_approx(a: Vec3, b: Vec3, tol: f64) {
        assert!((a - b).norm() < tol, "{a:?} vs {b:?}");
    }

    #[test]
    fn overhead_optical_axis_points_down() {
        let mount = CameraMount::overhead(900.0, 900.0, 900.0);
        let axis = mount.rotation() * Vec3::new(0.0, 0.0, 1.0);
        assert_vec_approx(axis, Vec3::new(0.0, 0.0, -1.0), 1e-12);
    }

    #[test]
    fn overhead_image_x_is_field_x() {
        let mount = CameraMount::overhead(0.0, 0.0, 1000.0);
        let x = mount.rotation() * Vec3::new(1.0, 0.0, 0.0);
        assert_vec_approx(x, Vec3::new(1.0, 0.0, 0.0), 1e-12);
    }

    #[test]
    fn transform_roundtrip() {
        let mount = CameraMount::new(
            Vec3::new(250.0, -200.0, 800.0),
            EulerDeg::new(30.0, -60.0, 175.0),
        );
        let p = Vec3::new(123.0, 456.0, 7.0);
        let back = mount.camera_to_field(mount.field_to_camera(p));
        assert_vec_approx(back, p, 1e-9);
    }

    #[test]
    fn camera_origin_maps_to_mount_position() {
        let mount = CameraMount::new(
            Vec3::new(250.0, 600.0, 750.0),
            EulerDeg::new(0.0, -60.0, 180.0),
        );
        assert_vec_approx(mount.camera_to_field(Vec3::ZERO), mount.position, 1e-12);
        assert_vec_approx(mount.field_to_camera(mount.position), Vec3::ZERO, 1e-12);
    }

    #[test]
    fn overhead_projects_point_below_to_center() {
        let mount = CameraMount::overhead(500.0, 500.0, 900.0);
        let camera = Camera::new(Intrinsics::new(600.0, 600.0, 320.0, 240.0));
        let px = mount
            .project_field_point(&camera, Vec3::new(500.0, 500.0, 0.0))
            .unwrap();
        assert!(
            (px[0] - 320.0).abs() < 1e-9 && (px[1] - 240.0).abs() < 1e-9,
            "got {px:?}"
        );
    }

    #[test]
    fn point_above_camera_is_not_projectable() {
        let mount = CameraMount::overhead(500.0, 500.0, 900.0);
        let camera = Camera::new(Intrinsics::new(600.0, 600.0, 320.0, 240.0));
        assert!(mount
            .project_field_point(&camera, Vec3::new(500.0, 500.0, 2000.0))
            .is_none());
    }

    #[test]
    fn overhead_field_offsets_keep_direction() {
        // A tag at +X of the camera appears right of center; a tag at +Y
        // appears above center (image y runs opposite field Y overhead).
        let mount = CameraMount::overhead(500.0, 500.0, 1000.0);
        let camera = Camera::new(Intrinsics::new(600.0, 600.0, 320.0, 240.0));
        let px = mount
            .project_field_point(&camera, Vec3::new(700.0, 500.0, 0.0))
            .unwrap();
        assert!(px[0] > 320.0, "+X should project right of center: {px:?}");

        let py = mount
            .project_field_point(&camera, Vec3::new(500.0, 700.0, 0.0))
            .unwrap();
        assert!(py[1] < 240.0, "+Y should project above center: {py:?}");
    }
}
