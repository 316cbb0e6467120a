/// Tag pose estimation from detection corners.
///
/// Homography decomposition seeds an orthogonal-iteration refinement
/// (Lu, Hager, Mjolsness 2000), followed by the Schweighofer-Pinz search
/// for the second local minimum of the planar pose ambiguity.
use crate::camera::Camera;
use crate::detection::TagDetection;
use crate::error::PoseError;
use crate::homography::Homography;
use crate::math::{Mat3, Vec3};
use crate::rotation::EulerDeg;

/// A rigid tag pose: camera <- tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagPose {
    /// Rotation matrix mapping tag-frame points into the camera frame.
    pub r: Mat3,
    /// Tag center in the camera frame, in the units of `tag_size`.
    pub t: Vec3,
}

impl TagPose {
    /// Straight-line distance from the camera to the tag center.
    pub fn distance(&self) -> f64 {
        self.t.norm()
    }

    /// Tag attitude as yaw/pitch/roll degrees in the camera frame.
    pub fn euler(&self) -> EulerDeg {
        EulerDeg::from_matrix(&self.r)
    }
}

/// Pose estimation result: the best solution plus the alternative local
/// minimum when the viewing geometry admits one.
#[derive(Debug, Clone)]
pub struct PoseEstimate {
    pub pose: TagPose,
    /// Object-space error of the best pose (squared length units).
    pub error: f64,
    /// Second local minimum, if any, with its error.
    pub alt: Option<(TagPose, f64)>,
}

/// Estimate the pose of a detected tag.
///
/// `tag_size` is the full edge length of the black tag square; the returned
/// translation is in the same units. Corners are undistorted through the
/// camera model before solving.
pub fn estimate_pose(
    det: &TagDetection,
    camera: &Camera,
    tag_size: f64,
) -> Result<PoseEstimate, PoseError> {
    let mut corners = det.corners;
    for c in &mut corners {
        *c = camera.undistort(*c);
    }

    let h = Homography::from_corners(&corners).ok_or(PoseError::DegenerateCorners)?;

    // Object points in the tag frame (z = 0 plane)
    let s = tag_size / 2.0;
    let tag_pts = [
        Vec3::new(-s, s, 0.0),
        Vec3::new(s, s, 0.0),
        Vec3::new(s, -s, 0.0),
        Vec3::new(-s, -s, 0.0),
    ];

    // Sight rays in normalized image coordinates
    let k = &camera.intrinsics;
    let mut rays = [Vec3::ZERO; 4];
    for (ray, corner) in rays.iter_mut().zip(&corners) {
        *ray = Vec3::new((corner[0] - k.cx) / k.fx, (corner[1] - k.cy) / k.fy, 1.0);
    }

    let initial = decompose_homography(&h, camera, tag_size);
    let (pose1, err1) = orthogonal_iteration(&rays, &tag_pts, initial.r, initial.t, 50);

    match second_minimum(&rays, &tag_pts, &pose1) {
        Some((pose2, err2)) if err2 < err1 => Ok(PoseEstimate {
            pose: pose2,
            error: err2,
            alt: Some((pose1, err1)),
        }),
        Some((pose2, err2)) => Ok(PoseEstimate {
            pose: pose1,
            error: err1,
            alt: Some((pose2, err2)),
        }),
        None => Ok(PoseEstimate {
            pose: pose1,
            error: err1,
            alt: None,
        }),
    }
}

/// Initial R, t from the detection homography.
fn decompose_homography(h: &Homography, camera: &Camera, tag_size: f64) -> TagPose {
    let k = &camera.intrinsics;
    let hd = &h.m.m;

    // Columns of K^{-1} * H
    let c0 = Vec3::new(
        (hd[0][0] - k.cx * hd[2][0]) / k.fx,
        (hd[1][0] - k.cy * hd[2][0]) / k.fy,
        hd[2][0],
    );
    let c1 = Vec3::new(
        (hd[0][1] - k.cx * hd[2][1]) / k.fx,
        (hd[1][1] - k.cy * hd[2][1]) / k.fy,
        hd[2][1],
    );
    let c2 = Vec3::new(
        (hd[0][2] - k.cx * hd[2][2]) / k.fx,
        (hd[1][2] - k.cy * hd[2][2]) / k.fy,
        hd[2][2],
    );

    let scale = (c0.norm() + c1.norm()) / 2.0;
    let inv_scale = 1.0 / scale;
    let c0 = c0 * inv_scale;
    let c1 = c1 * inv_scale;
    let c2 = c2 * inv_scale;

    // The homography's tag y-axis points opposite the 3D tag frame's, so
    // column 1 carries an embedded sign flip.
    let r0 = c0;
    let r1 = -c1;
    let r2 = r0.cross(r1);

    let r = Mat3::from_cols(r0, r1, r2).nearest_rotation();
    let t = c2 * (tag_size / 2.0);

    TagPose { r, t }
}

/// Orthogonal iteration refinement minimizing object-space error.
fn orthogonal_iteration(
    rays: &[Vec3; 4],
    tag_pts: &[Vec3; 4],
    r_init: Mat3,
    t_init: Vec3,
    n_iters: u32,
) -> (TagPose, f64) {
    let n = 4;
    let inv_n = 1.0 / n as f64;

    // Projection operators F[i] = v*v^T / (v^T v)
    let mut f_ops = [Mat3::ZERO; 4];
    for i in 0..n {
        f_ops[i] = rays[i].outer(rays[i]).scale(1.0 / rays[i].dot(rays[i]));
    }

    let mut p_mean = Vec3::ZERO;
    for p in tag_pts {
        p_mean = p_mean + *p;
    }
    let p_mean = p_mean * inv_n;

    let mut p_res = [Vec3::ZERO; 4];
    for i in 0..n {
        p_res[i] = tag_pts[i] - p_mean;
    }

    let mut f_mean = Mat3::ZERO;
    for f in &f_ops {
        f_mean = f_mean + *f;
    }
    let f_mean = f_mean.scale(inv_n);
    let m1_inv = (Mat3::IDENTITY - f_mean)
        .inverse()
        .unwrap_or(Mat3::IDENTITY);

    let mut r = r_init;
    let mut t = t_init;

    for _ in 0..n_iters {
        // t = M1^{-1} * (1/n) * sum((F[i] - I) * R * p[i])
        let mut m2 = Vec3::ZERO;
        for i in 0..n {
            let rp = r * tag_pts[i];
            m2 = m2 + (f_ops[i] * rp - rp) * inv_n;
        }
        t = m1_inv * m2;

        // Rotation update from q[i] = F[i] * (R * p[i] + t)
        let mut q = [Vec3::ZERO; 4];
        let mut q_mean = Vec3::ZERO;
        for i in 0..n {
            q[i] = f_ops[i] * (r * tag_pts[i] + t);
            q_mean = q_mean + q[i];
        }
        let q_mean = q_mean * inv_n;

        let mut m3 = Mat3::ZERO;
        for i in 0..n {
            m3 = m3 + (q[i] - q_mean).outer(p_res[i]);
        }

        r = m3.nearest_rotation();
    }

    let err = object_space_error(&f_ops, &r, t, tag_pts);
    (TagPose { r, t }, err)
}

/// Sum of squared residuals `(I - F[i]) * (R*p[i] + t)`.
fn object_space_error(f_ops: &[Mat3; 4], r: &Mat3, t: Vec3, tag_pts: &[Vec3; 4]) -> f64 {
    let mut err = 0.0;
    for i in 0..4 {
        let rp_t = *r * tag_pts[i] + t;
        let diff = rp_t - f_ops[i] * rp_t;
        err += diff.dot(diff);
    }
    err
}

/// Search for the second local minimum of the planar pose ambiguity.
fn second_minimum(
    rays: &[Vec3; 4],
    tag_pts: &[Vec3; 4],
    pose1: &TagPose,
) -> Option<(TagPose, f64)> {
    // The alternative solution sits near a 180° rotation about the axis
    // from the camera to the tag center.
    let n = pose1.t.normalized()?;

    // Reflect: R2 = (2*n*n^T - I) * R
    let reflect = n.outer(n).scale(2.0) - Mat3::IDENTITY;
    let r2 = reflect * pose1.r;

    // Skip when the reflected rotation is not meaningfully different
    let diff_rot = pose1.r.transpose() * r2;
    let cos_angle = ((diff_rot.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    if cos_angle.acos() < 0.1 {
        return None;
    }

    Some(orthogonal_iteration(rays, tag_pts, r2, pose1.t, 50))
}
