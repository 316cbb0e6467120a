/// Rotation conventions: Euler angles and axis-angle.
///
/// One convention is used everywhere: `R = Rz(yaw) * Ry(pitch) * Rx(roll)`,
/// angles in degrees at the API surface, radians internally.
use crate::math::{Mat3, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Yaw/pitch/roll in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EulerDeg {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl EulerDeg {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        EulerDeg { yaw, pitch, roll }
    }

    /// Compose the rotation matrix `Rz(yaw) * Ry(pitch) * Rx(roll)`.
    pub fn to_matrix(self) -> Mat3 {
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sr, cr) = self.roll.to_radians().sin_cos();

        let rz = Mat3::from_rows([[cy, -sy, 0.0], [sy, cy, 0.0], [0.0, 0.0, 1.0]]);
        let ry = Mat3::from_rows([[cp, 0.0, sp], [0.0, 1.0, 0.0], [-sp, 0.0, cp]]);
        let rx = Mat3::from_rows([[1.0, 0.0, 0.0], [0.0, cr, -sr], [0.0, sr, cr]]);

        rz * ry * rx
    }

    /// Recover yaw/pitch/roll from a rotation matrix.
    ///
    /// Near the gimbal-lock singularity (pitch = ±90°) roll is fixed at zero
    /// and the remaining freedom is folded into yaw.
    pub fn from_matrix(r: &Mat3) -> EulerDeg {
        let m = &r.m;
        let sy = (m[0][0] * m[0][0] + m[1][0] * m[1][0]).sqrt();

        let (yaw, pitch, roll) = if sy >= 1e-6 {
            (
                f64::atan2(m[1][0], m[0][0]),
                f64::atan2(-m[2][0], sy),
                f64::atan2(m[2][1], m[2][2]),
            )
        } else {
            (
                f64::atan2(-m[0][1], m[1][1]),
                f64::atan2(-m[2][0], sy),
                0.0,
            )
        };

        EulerDeg {
            yaw: yaw.to_degrees(),
            pitch: pitch.to_degrees(),
            roll: roll.to_degrees(),
        }
    }
}

/// Rotation matrix from an axis-angle vector (Rodrigues formula).
///
/// The vector's direction is the rotation axis and its norm the angle in
/// radians. A zero vector maps to the identity.
pub fn rotation_from_axis_angle(rvec: Vec3) -> Mat3 {
    let theta = rvec.norm();
    if theta < 1e-12 {
        return Mat3::IDENTITY;
    }
    let axis = rvec * (1.0 / theta);

    let k = Mat3::from_rows([
        [0.0, -axis.z, axis.y],
        [axis.z, 0.0, -axis.x],
        [-axis.y, axis.x, 0.0],
    ]);

    Mat3::IDENTITY + k.scale(theta.sin()) + (k * k).scale(1.0 - theta.cos())
}

/// Axis-angle vector from a rotation matrix.
pub fn axis_angle_from_rotation(r: &Mat3) -> Vec3 {
    let cos_theta = ((r.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();

    if theta < 1e-12 {
        return Vec3::ZERO;
    }

    let m = &r.m;
    if theta > std::f64::consts::PI - 1e-6 {
        // Near 180°: the skew part vanishes, recover the axis from the
        // symmetric part R + I = 2 * axis * axis^T (up to an overall sign).
        let xx = ((m[0][0] + 1.0) / 2.0).max(0.0).sqrt();
        let yy = ((m[1][1] + 1.0) / 2.0).max(0.0).sqrt();
        let zz = ((m[2][2] + 1.0) / 2.0).max(0.0).sqrt();
        let mut axis = Vec3::new(xx, yy, zz);
        // Signs from the off-diagonal sums, anchored on the largest component
        if xx >= yy && xx >= zz {
            axis.y = axis.y.copysign(m[0][1] + m[1][0]);
            axis.z = axis.z.copysign(m[0][2] + m[2][0]);
        } else if yy >= zz {
            axis.x = axis.x.copysign(m[0][1] + m[1][0]);
            axis.z = axis.z.copysign(m[1][2] + m[2][1]);
        } else {
            axis.x = axis.x.copysign(m[0][2] + m[2][0]);
            axis.y = axis.y.copysign(m[1][2] + m[2][1]);
        }
        return match axis.normalized() {
            Some(a) => a * theta,
            None => Vec3::ZERO,
        };
    }

    let axis = Vec3::new(m[2][1] - m[1][2], m[0][2] - m[2][0], m[1][0] - m[0][1])
        * (1.0 / (2.0 * theta.sin()));
    axis * theta
}
