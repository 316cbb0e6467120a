/// Pinhole camera model with Brown-Conrady lens distortion.
use crate::math::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics in pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Intrinsics { fx, fy, cx, cy }
    }
}

/// Radial (k1, k2, k3) and tangential (p1, p2) distortion coefficients,
/// matching the common 5-element calibration vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl Distortion {
    pub const NONE: Distortion = Distortion {
        k1: 0.0,
        k2: 0.0,
        p1: 0.0,
        p2: 0.0,
        k3: 0.0,
    };

    pub fn is_none(&self) -> bool {
        *self == Distortion::NONE
    }
}

/// A calibrated camera: intrinsics plus lens distortion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Camera {
    pub intrinsics: Intrinsics,
    #[cfg_attr(feature = "serde", serde(default))]
    pub distortion: Distortion,
}

/// Iterations of the fixed-point distortion inverse. Converges in a handful
/// of steps for calibration-grade coefficients.
const UNDISTORT_ITERS: usize = 8;

impl Camera {
    pub fn new(intrinsics: Intrinsics) -> Self {
        Camera {
            intrinsics,
            distortion: Distortion::NONE,
        }
    }

    pub fn with_distortion(intrinsics: Intrinsics, distortion: Distortion) -> Self {
        Camera {
            intrinsics,
            distortion,
        }
    }

    /// Project a camera-frame point to a pixel. `None` when the point is at
    /// or behind the image plane.
    pub fn project(&self, p: Vec3) -> Option<[f64; 2]> {
        if p.z < 1e-9 {
            return None;
        }
        let x = p.x / p.z;
        let y = p.y / p.z;
        let (xd, yd) = self.distort(x, y);
        let k = &self.intrinsics;
        Some([k.fx * xd + k.cx, k.fy * yd + k.cy])
    }

    /// Apply the distortion model to normalized image coordinates.
    fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let d = &self.distortion;
        let r2 = x * x + y * y;
        let radial = 1.0 + d.k1 * r2 + d.k2 * r2 * r2 + d.k3 * r2 * r2 * r2;
        let xd = x * radial + 2.0 * d.p1 * x * y + d.p2 * (r2 + 2.0 * x * x);
        let yd = y * radial + d.p1 * (r2 + 2.0 * y * y) + 2.0 * d.p2 * x * y;
        (xd, yd)
    }

    /// Undo lens distortion on a pixel, returning the ideal pinhole pixel.
    ///
    /// Fixed-point iteration on the normalized coordinates; exact when the
    /// camera has no distortion.
    pub fn undistort(&self, pixel: [f64; 2]) -> [f64; 2] {
        if self.distortion.is_none() {
            return pixel;
        }
        let (x, y) = self.undistort_normalized(pixel);
        let k = &self.intrinsics;
        [k.fx * x + k.cx, k.fy * y + k.cy]
    }

    /// Undistorted normalized image coordinates of a pixel.
    fn undistort_normalized(&self, pixel: [f64; 2]) -> (f64, f64) {
        let k = &self.intrinsics;
        let xd = (pixel[0] - k.cx) / k.fx;
        let yd = (pixel[1] - k.cy) / k.fy;

        let d = &self.distortion;
        let mut x = xd;
        let mut y = yd;
        for _ in 0..UNDISTORT_ITERS {
            let r2 = x * x + y * y;
            let radial = 1.0 + d.k1 * r2 + d.k2 * r2 * r2 + d.k3 * r2 * r2 * r2;
            let dx = 2.0 * d.p1 * x * y + d.p2 * (r2 + 2.0 * x * x);
            let dy = d.p1 * (r2 + 2.0 * y * y) + 2.0 * d.p2 * x * y;
            x = (xd - dx) / radial;
            y = (yd - dy) / radial;
        }
        (x, y)
    }

    /// Unit sight ray through a pixel, in the camera frame.
    pub fn ray(&self, pixel: [f64; 2]) -> Vec3 {
        let (x, y) = if self.distortion.is_none() {
            let k = &self.intrinsics;
            ((pixel[0] - k.cx) / k.fx, (pixel[1] - k.cy) / k.fy)
        } else {
            self.undistort_normalized(pixel)
        };
        let v = Vec3::new(x, y, 1.0);
        v * (1.0 / v.norm())
    }
}
