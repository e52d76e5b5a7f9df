//! 2-D affine coordinate transforms.
//!
//! Points are `(x, y)` with `x` along columns and `y` along rows. Point sets
//! are `(n, 2)` arrays so a whole catalog is transformed with one matrix
//! product.

use std::fmt;

use ndarray::{arr1, arr2, Array2};

use crate::consts::EPSILON;

/// Affine transform stored as the top two rows of a homogeneous matrix:
///
/// ```text
/// | a  b  tx |
/// | c  d  ty |
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub matrix: [[f64; 3]; 2],
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Transform2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (tx, ty) = self.translation_components();
        write!(
            f,
            "Similarity(dx={:.2}, dy={:.2}, rot={:.3}°, scale={:.4})",
            tx,
            ty,
            self.rotation().to_degrees(),
            self.scale()
        )
    }
}

impl Transform2D {
    pub fn identity() -> Self {
        Self::from_matrix([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    pub fn from_matrix(matrix: [[f64; 3]; 2]) -> Self {
        Self { matrix }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::from_matrix([[1.0, 0.0, dx], [0.0, 1.0, dy]])
    }

    /// Rotation by `angle` radians and uniform `scale` about the origin,
    /// followed by a translation.
    pub fn similarity(scale: f64, angle: f64, dx: f64, dy: f64) -> Self {
        let a = scale * angle.cos();
        let b = scale * angle.sin();
        Self::from_matrix([[a, -b, dx], [b, a, dy]])
    }

    /// Least-squares similarity mapping `source[i]` onto `target[i]`.
    ///
    /// Returns `None` with fewer than two pairs or when the source points
    /// coincide.
    pub fn estimate_similarity(source: &[[f64; 2]], target: &[[f64; 2]]) -> Option<Self> {
        let n = source.len().min(target.len());
        if n < 2 {
            return None;
        }
        let inv_n = 1.0 / n as f64;

        let (mut sx, mut sy, mut tx, mut ty) = (0.0, 0.0, 0.0, 0.0);
        for i in 0..n {
            sx += source[i][0];
            sy += source[i][1];
            tx += target[i][0];
            ty += target[i][1];
        }
        let (sx, sy, tx, ty) = (sx * inv_n, sy * inv_n, tx * inv_n, ty * inv_n);

        // Closed-form 2-D Umeyama: rotation from the cross-covariance terms.
        let mut dot = 0.0;
        let mut cross = 0.0;
        let mut var = 0.0;
        for i in 0..n {
            let (ax, ay) = (source[i][0] - sx, source[i][1] - sy);
            let (bx, by) = (target[i][0] - tx, target[i][1] - ty);
            dot += ax * bx + ay * by;
            cross += ax * by - ay * bx;
            var += ax * ax + ay * ay;
        }
        if var < EPSILON {
            return None;
        }

        let angle = cross.atan2(dot);
        let scale = (dot * dot + cross * cross).sqrt() / var;
        let unshifted = Self::similarity(scale, angle, 0.0, 0.0);
        let (mx, my) = unshifted.apply(sx, sy);
        Some(Self::similarity(scale, angle, tx - mx, ty - my))
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.matrix;
        (
            m[0][0] * x + m[0][1] * y + m[0][2],
            m[1][0] * x + m[1][1] * y + m[1][2],
        )
    }

    /// Transform an `(n, 2)` array of points in one matrix product.
    pub fn apply_points(&self, points: &Array2<f64>) -> Array2<f64> {
        let m = &self.matrix;
        let linear_t = arr2(&[[m[0][0], m[1][0]], [m[0][1], m[1][1]]]);
        let mut out = points.dot(&linear_t);
        out += &arr1(&[m[0][2], m[1][2]]);
        out
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &Transform2D) -> Transform2D {
        let a = &self.matrix;
        let b = &other.matrix;
        let mut out = [[0.0; 3]; 2];
        for (r, row) in out.iter_mut().enumerate() {
            row[0] = a[r][0] * b[0][0] + a[r][1] * b[1][0];
            row[1] = a[r][0] * b[0][1] + a[r][1] * b[1][1];
            row[2] = a[r][0] * b[0][2] + a[r][1] * b[1][2] + a[r][2];
        }
        Transform2D::from_matrix(out)
    }

    /// Inverse transform, or `None` if the linear part is singular.
    pub fn inverse(&self) -> Option<Transform2D> {
        let m = &self.matrix;
        let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
        if det.abs() < EPSILON {
            return None;
        }
        let ia = m[1][1] / det;
        let ib = -m[0][1] / det;
        let ic = -m[1][0] / det;
        let id = m[0][0] / det;
        Some(Transform2D::from_matrix([
            [ia, ib, -(ia * m[0][2] + ib * m[1][2])],
            [ic, id, -(ic * m[0][2] + id * m[1][2])],
        ]))
    }

    /// Rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        self.matrix[1][0].atan2(self.matrix[0][0])
    }

    /// Uniform scale (geometric mean for non-similarity transforms).
    pub fn scale(&self) -> f64 {
        let m = &self.matrix;
        (m[0][0] * m[1][1] - m[0][1] * m[1][0]).abs().sqrt()
    }

    pub fn translation_components(&self) -> (f64, f64) {
        (self.matrix[0][2], self.matrix[1][2])
    }
}
