//! 2D affine transform value type.
//!
//! A [`Transform`] holds the six coefficients `(a, b, c, d, e, f)` of
//!
//! ```text
//! | x' |   | a c e | | x |
//! | y' | = | b d f | | y |
//!                    | 1 |
//! ```
//!
//! and is an immutable value: every operation returns a new transform.

use crate::foundation::core::{Affine, Point, Vec2};
use crate::foundation::error::{EaselError, EaselResult};

/// Relative threshold below which a determinant counts as zero.
///
/// Scaled by the squared magnitude of the linear coefficients, so the test is
/// independent of the overall zoom level.
const SINGULAR_EPSILON: f64 = 1e-10;

/// Immutable 2D affine transform, serialized as `[a, b, c, d, e, f]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct Transform(Affine);

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; 6]> for Transform {
    fn from(coeffs: [f64; 6]) -> Self {
        Self(Affine::new(coeffs))
    }
}

impl From<Transform> for [f64; 6] {
    fn from(t: Transform) -> Self {
        t.coeffs()
    }
}

impl From<Affine> for Transform {
    fn from(a: Affine) -> Self {
        Self(a)
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self(Affine::IDENTITY);

    /// Build a transform from its six coefficients.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self(Affine::new([a, b, c, d, e, f]))
    }

    /// Pure translation.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self(Affine::translate(Vec2::new(tx, ty)))
    }

    /// Pure (possibly non-uniform) scale about the origin.
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self(Affine::scale_non_uniform(sx, sy))
    }

    /// Pure rotation about the origin, in radians.
    pub fn rotation(radians: f64) -> Self {
        Self(Affine::rotate(radians))
    }

    /// Coefficients in `[a, b, c, d, e, f]` order.
    pub fn coeffs(self) -> [f64; 6] {
        self.0.as_coeffs()
    }

    /// The underlying `kurbo` affine.
    pub fn as_affine(self) -> Affine {
        self.0
    }

    /// Returns the transform that applies `self` first, then `other`.
    pub fn compose(self, other: Transform) -> Transform {
        Self(other.0 * self.0)
    }

    /// `self` followed by a translation.
    pub fn then_translate(self, tx: f64, ty: f64) -> Transform {
        self.compose(Self::translation(tx, ty))
    }

    /// `self` followed by a scale about the pixel-space point `(cx, cy)`.
    pub fn then_scale_about(self, factor: f64, cx: f64, cy: f64) -> Transform {
        self.then_translate(-cx, -cy)
            .compose(Self::scaling(factor, factor))
            .then_translate(cx, cy)
    }

    /// `a*d - b*c`.
    pub fn determinant(self) -> f64 {
        self.0.determinant()
    }

    /// Inverse transform.
    ///
    /// Fails with [`EaselError::SingularTransform`] when the determinant is
    /// within a relative epsilon of zero.
    pub fn invert(self) -> EaselResult<Transform> {
        let [a, b, c, d, _, _] = self.coeffs();
        let det = self.determinant();
        let mag = a.abs().max(b.abs()).max(c.abs()).max(d.abs());
        if !det.is_finite() || mag == 0.0 || det.abs() <= SINGULAR_EPSILON * mag * mag {
            return Err(EaselError::SingularTransform { determinant: det });
        }
        Ok(Self(self.0.inverse()))
    }

    /// Map a point through the transform.
    pub fn apply(self, p: Point) -> Point {
        self.0 * p
    }

    /// Map `(x, y)` through the transform.
    pub fn apply_xy(self, x: f64, y: f64) -> (f64, f64) {
        let p = self.apply(Point::new(x, y));
        (p.x, p.y)
    }

    /// Whether every coefficient is within `tol` of `other`'s.
    pub fn approx_eq(self, other: Transform, tol: f64) -> bool {
        self.coeffs()
            .iter()
            .zip(other.coeffs().iter())
            .all(|(x, y)| (x - y).abs() <= tol)
    }

    /// Transform that fits the scene rectangle `[x, y, x+width, y+height]` into
    /// `[0, 0, pixel_width, pixel_height]`.
    ///
    /// Aspect ratio is preserved: the smaller axis scale wins and the content is
    /// centered along the other axis. Returns `None` for an empty or non-finite
    /// rectangle, and for an empty pixel area.
    pub fn viewport_fit(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        pixel_width: f64,
        pixel_height: f64,
    ) -> Option<Transform> {
        if !(width > 0.0 && height > 0.0) || !x.is_finite() || !y.is_finite() {
            return None;
        }
        if !width.is_finite() || !height.is_finite() {
            return None;
        }

        let sx = pixel_width / width;
        let sy = pixel_height / height;
        let scale = sx.min(sy);
        if !(scale > 0.0 && scale.is_finite()) {
            return None;
        }

        let (x, y) = if sx > sy {
            // height constrains: center horizontally
            let slack = pixel_width / scale - width;
            (x - slack / 2.0, y)
        } else {
            let slack = pixel_height / scale - height;
            (x, y - slack / 2.0)
        };

        Some(Self::new(scale, 0.0, 0.0, scale, -x * scale, -y * scale))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/affine.rs"]
mod tests;
