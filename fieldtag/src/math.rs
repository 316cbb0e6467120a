/// Fixed-size linear algebra for 3D geometry.
///
/// Everything the crate needs fits in 3-vectors and 3x3 matrices, so these
/// are plain value types over `f64` arrays rather than a linear-algebra
/// dependency.
use std::ops::{Add, Mul, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }

    pub fn from_array(a: [f64; 3]) -> Self {
        Vec3::new(a[0], a[1], a[2])
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a (near-)zero vector.
    pub fn normalized(self) -> Option<Vec3> {
        let n = self.norm();
        if n < 1e-12 {
            return None;
        }
        Some(self * (1.0 / n))
    }

    /// Outer product `self * other^T`.
    pub fn outer(self, other: Vec3) -> Mat3 {
        Mat3::from_rows([
            [self.x * other.x, self.x * other.y, self.x * other.z],
            [self.y * other.x, self.y * other.y, self.y * other.z],
            [self.z * other.x, self.z * other.y, self.z * other.z],
        ])
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// A 3x3 matrix, row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub m: [[f64; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const ZERO: Mat3 = Mat3 { m: [[0.0; 3]; 3] };

    pub fn from_rows(m: [[f64; 3]; 3]) -> Self {
        Mat3 { m }
    }

    pub fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Mat3::from_rows([
            [c0.x, c1.x, c2.x],
            [c0.y, c1.y, c2.y],
            [c0.z, c1.z, c2.z],
        ])
    }

    pub fn row(&self, i: usize) -> Vec3 {
        Vec3::from_array(self.m[i])
    }

    pub fn col(&self, j: usize) -> Vec3 {
        Vec3::new(self.m[0][j], self.m[1][j], self.m[2][j])
    }

    pub fn transpose(&self) -> Mat3 {
        let m = &self.m;
        Mat3::from_rows([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    pub fn det(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    pub fn trace(&self) -> f64 {
        self.m[0][0] + self.m[1][1] + self.m[2][2]
    }

    /// Inverse by cofactor expansion; `None` when singular.
    pub fn inverse(&self) -> Option<Mat3> {
        let det = self.det();
        if det.abs() < 1e-10 {
            return None;
        }
        let inv_det = 1.0 / det;
        let m = &self.m;
        Some(Mat3::from_rows([
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
            ],
        ]))
    }

    pub fn scale(&self, s: f64) -> Mat3 {
        let mut out = *self;
        for row in &mut out.m {
            for v in row.iter_mut() {
                *v *= s;
            }
        }
        out
    }

    /// Compute the SVD `M = U * diag(S) * V^T` by Jacobi iteration on
    /// `M^T M`. Singular values come back in decreasing order and `V` is a
    /// proper rotation.
    pub fn svd(&self) -> (Mat3, [f64; 3], Mat3) {
        let mut ata = (self.transpose() * *self).m;
        let mut v = Mat3::IDENTITY.m;

        for _ in 0..100 {
            // Largest off-diagonal element picks the rotation plane
            let mut max_val = 0.0;
            let mut p = 0;
            let mut q = 1;
            for i in 0..3 {
                for j in (i + 1)..3 {
                    if ata[i][j].abs() > max_val {
                        max_val = ata[i][j].abs();
                        p = i;
                        q = j;
                    }
                }
            }
            if max_val < 1e-15 {
                break;
            }

            let theta = 0.5 * f64::atan2(2.0 * ata[p][q], ata[p][p] - ata[q][q]);
            let c = theta.cos();
            let s = theta.sin();

            // ata = G^T * ata * G
            let mut new_ata = ata;
            for i in 0..3 {
                new_ata[i][p] = c * ata[i][p] + s * ata[i][q];
                new_ata[i][q] = -s * ata[i][p] + c * ata[i][q];
            }
            let tmp = new_ata;
            for j in 0..3 {
                new_ata[p][j] = c * tmp[p][j] + s * tmp[q][j];
                new_ata[q][j] = -s * tmp[p][j] + c * tmp[q][j];
            }
            ata = new_ata;

            let mut new_v = v;
            for i in 0..3 {
                new_v[i][p] = c * v[i][p] + s * v[i][q];
                new_v[i][q] = -s * v[i][p] + c * v[i][q];
            }
            v = new_v;
        }

        let eigenvalues = [ata[0][0], ata[1][1], ata[2][2]];

        // Sort singular values descending
        let mut order = [0usize, 1, 2];
        if eigenvalues[order[0]] < eigenvalues[order[1]] {
            order.swap(0, 1);
        }
        if eigenvalues[order[1]] < eigenvalues[order[2]] {
            order.swap(1, 2);
        }
        if eigenvalues[order[0]] < eigenvalues[order[1]] {
            order.swap(0, 1);
        }

        let sigma = [
            eigenvalues[order[0]].max(0.0).sqrt(),
            eigenvalues[order[1]].max(0.0).sqrt(),
            eigenvalues[order[2]].max(0.0).sqrt(),
        ];

        let mut v_sorted = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                v_sorted[i][j] = v[i][order[j]];
            }
        }
        let mut v_sorted = Mat3::from_rows(v_sorted);

        if v_sorted.det() < 0.0 {
            for i in 0..3 {
                v_sorted.m[i][2] = -v_sorted.m[i][2];
            }
        }

        // U = M * V * Sigma^{-1}
        let mv = *self * v_sorted;
        let mut u = Mat3::ZERO;
        for j in 0..3 {
            if sigma[j] > 1e-10 {
                for i in 0..3 {
                    u.m[i][j] = mv.m[i][j] / sigma[j];
                }
            }
        }

        // Complete missing U columns in the rank-deficient case
        if sigma[2] < 1e-10 {
            let u0 = u.col(0);
            let u1 = u.col(1);
            if sigma[1] < 1e-10 {
                // Rank <= 1
                let perp = if u0.x.abs() < 0.9 {
                    Vec3::new(1.0, 0.0, 0.0)
                } else {
                    Vec3::new(0.0, 1.0, 0.0)
                };
                if let Some(u1) = u0.cross(perp).normalized() {
                    let u2 = u0.cross(u1);
                    for i in 0..3 {
                        u.m[i][1] = u1.to_array()[i];
                        u.m[i][2] = u2.to_array()[i];
                    }
                }
            } else {
                let u2 = u0.cross(u1);
                u.m[0][2] = u2.x;
                u.m[1][2] = u2.y;
                u.m[2][2] = u2.z;
            }
        }

        (u, sigma, v_sorted)
    }

    /// Project onto SO(3): `R = U * V^T` with a sign correction so the
    /// result is a proper rotation (det +1) even for reflective inputs.
    pub fn nearest_rotation(&self) -> Mat3 {
        let (u, _s, v) = self.svd();
        let vt = v.transpose();
        let r = u * vt;
        if r.det() < 0.0 {
            let mut u_fixed = u;
            for i in 0..3 {
                u_fixed.m[i][2] = -u_fixed.m[i][2];
            }
            return u_fixed * vt;
        }
        r
    }
}

impl Mul for Mat3 {
    type Output = Mat3;
    fn mul(self, rhs: Mat3) -> Mat3 {
        let a = &self.m;
        let b = &rhs.m;
        let mut c = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                c[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Mat3::from_rows(c)
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        Vec3::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }
}

impl Add for Mat3 {
    type Output = Mat3;
    fn add(self, rhs: Mat3) -> Mat3 {
        let mut out = self;
        for i in 0..3 {
            for j in 0..3 {
                out.m[i][j] += rhs.m[i][j];
            }
        }
        out
    }
}

impl Sub for Mat3 {
    type Output = Mat3;
    fn sub(self, rhs: Mat3) -> Mat3 {
        let mut out = self;
        for i in 0..3 {
            for j in 0..3 {
                out.m[i][j] -= rhs.m[i][j];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_approx(a: &Mat3, b: &Mat3, tol: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (a.m[i][j] - b.m[i][j]).abs() < tol,
                    "[{i}][{j}]: {} vs {}",
                    a.m[i][j],
                    b.m[i][j],
                );
            }
        }
    }

    #[test]
    fn identity_times_matrix() {
        let a = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_mat_approx(&(Mat3::IDENTITY * a), &a, 1e-12);
    }

    #[test]
    fn inverse_roundtrip() {
        let m = Mat3::from_rows([[2.0, 1.0, 0.0], [0.0, 3.0, 1.0], [1.0, 0.0, 2.0]]);
        let inv = m.inverse().unwrap();
        assert_mat_approx(&(m * inv), &Mat3::IDENTITY, 1e-10);
    }

    #[test]
    fn inverse_singular_returns_none() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]); // det = 0
        assert!(m.inverse().is_none());
    }

    #[test]
    fn cross_follows_right_hand_rule() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = x.cross(y);
        assert!((z.z - 1.0).abs() < 1e-12, "x cross y = {z:?}");
    }

    #[test]
    fn normalized_zero_is_none() {
        assert!(Vec3::ZERO.normalized().is_none());
        assert!(Vec3::new(3.0, 0.0, 4.0).normalized().is_some());
    }

    #[test]
    fn normalized_has_unit_norm() {
        let v = Vec3::new(3.0, -4.0, 12.0).normalized().unwrap();
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn svd_identity() {
        let (u, s, v) = Mat3::IDENTITY.svd();
        for (i, si) in s.iter().enumerate() {
            assert!((si - 1.0).abs() < 1e-10, "s[{i}] = {si}");
        }
        assert_mat_approx(&(u * v.transpose()), &Mat3::IDENTITY, 1e-10);
    }

    #[test]
    fn svd_diagonal_sorted() {
        let m = Mat3::from_rows([[0.0, 0.0, 5.0], [0.0, 3.0, 0.0], [1.0, 0.0, 0.0]]);
        let (_u, s, _v) = m.svd();
        assert!(s[0] >= s[1] && s[1] >= s[2], "unsorted: {s:?}");
        assert!((s[0] - 5.0).abs() < 1e-8);
        assert!((s[1] - 3.0).abs() < 1e-8);
        assert!((s[2] - 1.0).abs() < 1e-8);
    }

    #[test]
    fn svd_reconstructs_matrix() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]]);
        let (u, s, v) = m.svd();
        let mut us = u;
        for i in 0..3 {
            for j in 0..3 {
                us.m[i][j] *= s[j];
            }
        }
        assert_mat_approx(&(us * v.transpose()), &m, 1e-8);
    }

    #[test]
    fn svd_rank_deficient() {
        // Rank-1 matrix: one nonzero singular value, reconstruction still holds
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [3.0, 6.0, 9.0]]);
        let (u, s, v) = m.svd();
        assert!(s[0] > 1.0, "s[0]={}", s[0]);
        assert!(s[1] < 1e-8 && s[2] < 1e-8, "s={s:?}");

        let mut us = u;
        for i in 0..3 {
            for j in 0..3 {
                us.m[i][j] *= s[j];
            }
        }
        assert_mat_approx(&(us * v.transpose()), &m, 1e-6);
    }

    #[test]
    fn nearest_rotation_keeps_rotation() {
        let angle: f64 = 0.3;
        let r = Mat3::from_rows([
            [angle.cos(), -angle.sin(), 0.0],
            [angle.sin(), angle.cos(), 0.0],
            [0.0, 0.0, 1.0],
        ]);
        assert_mat_approx(&r.nearest_rotation(), &r, 1e-10);
    }

    #[test]
    fn nearest_rotation_from_noisy_input() {
        let angle: f64 = 0.5;
        let mut r = Mat3::from_rows([
            [angle.cos(), -angle.sin(), 0.0],
            [angle.sin(), angle.cos(), 0.0],
            [0.0, 0.0, 1.0],
        ]);
        r.m[0][0] += 0.05;
        r.m[1][1] -= 0.03;
        let proj = r.nearest_rotation();
        assert_mat_approx(&(proj * proj.transpose()), &Mat3::IDENTITY, 1e-10);
        assert!((proj.det() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn nearest_rotation_negative_det() {
        let m = Mat3::from_rows([[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let r = m.nearest_rotation();
        assert_mat_approx(&(r * r.transpose()), &Mat3::IDENTITY, 1e-10);
        assert!((r.det() - 1.0).abs() < 1e-10, "det={}", r.det());
    }

    #[test]
    fn outer_product() {
        let m = Vec3::new(1.0, 2.0, 3.0).outer(Vec3::new(4.0, 5.0, 6.0));
        assert!((m.m[0][0] - 4.0).abs() < 1e-12);
        assert!((m.m[1][2] - 12.0).abs() < 1e-12);
        assert!((m.m[2][1] - 15.0).abs() < 1e-12);
    }
}
