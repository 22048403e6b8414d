// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mathematical helper functions.

use crate::kurbo::{Affine, Vec2};

/// Values closer to zero than this are treated as zero when classifying geometry.
pub const NEARLY_ZERO: f64 = 1.0e-9;

/// Floating point comparisons with a tolerance.
pub trait FloatExt: Sized {
    /// Whether the number is within [`NEARLY_ZERO`] of zero.
    fn is_nearly_zero(self) -> bool;
    /// Whether the number is within `tolerance` of zero.
    fn is_nearly_zero_within(self, tolerance: Self) -> bool;
}

impl FloatExt for f64 {
    #[inline(always)]
    fn is_nearly_zero(self) -> bool {
        self.is_nearly_zero_within(NEARLY_ZERO)
    }

    #[inline(always)]
    fn is_nearly_zero_within(self, tolerance: Self) -> bool {
        self.abs() <= tolerance
    }
}

/// Linear interpolation between `a` and `b`.
#[inline(always)]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Linear interpolation between `a` and `b` in single precision.
#[inline(always)]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// The greatest common divisor of two integers.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Apply only the linear part of `affine` to a vector.
#[inline]
pub fn transform_vec(affine: Affine, v: Vec2) -> Vec2 {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
}

/// The vector turned by 90° counter-clockwise (in a y-up coordinate system).
#[inline(always)]
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// The geometric mean scale factor of the linear part of `affine`.
///
/// This is the factor by which lengths grow on average, and is used to turn device
/// pixel tolerances into shading-space distances.
pub fn mean_scale(affine: Affine) -> f64 {
    affine.determinant().abs().sqrt()
}

/// A monotonic stand-in for the angle of `(x, y)`, in `[0, 4)`.
///
/// The value is 0 along the positive x axis, 1 along positive y, 2 along negative x and 3
/// along negative y. It orders directions exactly like `atan2` does, but needs no
/// trigonometry.
pub fn pseudo_angle(x: f64, y: f64) -> f64 {
    if x == 0.0 && y == 0.0 {
        return 0.0;
    }
    if y >= 0.0 {
        if x >= 0.0 {
            y / (x + y)
        } else {
            1.0 - x / (y - x)
        }
    } else if x < 0.0 {
        2.0 - y / (-x - y)
    } else {
        3.0 + x / (x - y)
    }
}
