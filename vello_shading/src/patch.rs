// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tensor-product patches.

use crate::kurbo::{Affine, CubicBez, Point};
use crate::shading::DeviceColor;

/// A tensor-product patch: a bicubic surface defined by a 4×4 grid of control points, with
/// a color at each corner.
///
/// `points[i][j]` is the control point for the `i`th Bernstein polynomial in `u` and the `j`th
/// in `v`. The corners are `points[0][0]`, `points[3][0]`, `points[3][3]` and `points[0][3]`,
/// and `colors` holds their colors in that order.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorPatch {
    /// The control points.
    pub points: [[Point; 4]; 4],
    /// Corner colors at `(u, v) = (0, 0), (1, 0), (1, 1), (0, 1)`.
    pub colors: [DeviceColor; 4],
}

impl TensorPatch {
    /// Build a tensor patch from the four boundary curves of a Coons patch.
    ///
    /// `bottom` runs from `(0, 0)` to `(1, 0)`, `top` from `(0, 1)` to `(1, 1)`, `left` from
    /// `(0, 0)` to `(0, 1)` and `right` from `(1, 0)` to `(1, 1)`. The curves must share their
    /// end points. The interior control points are chosen so that the tensor patch describes
    /// the same surface as the Coons patch.
    pub fn from_coons(
        bottom: CubicBez,
        right: CubicBez,
        top: CubicBez,
        left: CubicBez,
        colors: [DeviceColor; 4],
    ) -> Self {
        let mut p = [[Point::ZERO; 4]; 4];
        for (i, pt) in [bottom.p0, bottom.p1, bottom.p2, bottom.p3].into_iter().enumerate() {
            p[i][0] = pt;
        }
        for (i, pt) in [top.p0, top.p1, top.p2, top.p3].into_iter().enumerate() {
            p[i][3] = pt;
        }
        p[0][1] = left.p1;
        p[0][2] = left.p2;
        p[3][1] = right.p1;
        p[3][2] = right.p2;

        let combine = |terms: &[(f64, Point)]| {
            let v = terms
                .iter()
                .fold(Point::ZERO.to_vec2(), |acc, (w, pt)| acc + *w * pt.to_vec2());
            (v / 9.0).to_point()
        };
        p[1][1] = combine(&[
            (-4.0, p[0][0]),
            (6.0, p[0][1]),
            (6.0, p[1][0]),
            (-2.0, p[0][3]),
            (-2.0, p[3][0]),
            (3.0, p[3][1]),
            (3.0, p[1][3]),
            (-1.0, p[3][3]),
        ]);
        p[1][2] = combine(&[
            (-4.0, p[0][3]),
            (6.0, p[0][2]),
            (6.0, p[1][3]),
            (-2.0, p[0][0]),
            (-2.0, p[3][3]),
            (3.0, p[3][2]),
            (3.0, p[1][0]),
            (-1.0, p[3][0]),
        ]);
        p[2][1] = combine(&[
            (-4.0, p[3][0]),
            (6.0, p[3][1]),
            (6.0, p[2][0]),
            (-2.0, p[3][3]),
            (-2.0, p[0][0]),
            (3.0, p[0][1]),
            (3.0, p[2][3]),
            (-1.0, p[0][3]),
        ]);
        p[2][2] = combine(&[
            (-4.0, p[3][3]),
            (6.0, p[3][2]),
            (6.0, p[2][3]),
            (-2.0, p[3][0]),
            (-2.0, p[0][3]),
            (3.0, p[0][2]),
            (3.0, p[2][0]),
            (-1.0, p[0][0]),
        ]);

        Self { points: p, colors }
    }

    /// Build a patch whose `u = 0` and `u = 1` sides are straight lines joining the ends of
    /// `bottom` and `top`.
    pub fn ruled(bottom: CubicBez, top: CubicBez, colors: [DeviceColor; 4]) -> Self {
        let left = line_as_cubic(bottom.p0, top.p0);
        let right = line_as_cubic(bottom.p3, top.p3);
        Self::from_coons(bottom, right, top, left, colors)
    }

    /// Apply an affine transform to every control point.
    pub fn transform(mut self, affine: Affine) -> Self {
        for row in &mut self.points {
            for pt in row {
                *pt = affine * *pt;
            }
        }
        self
    }

    /// Evaluate the surface at `(u, v)`.
    pub fn eval(&self, u: f64, v: f64) -> Point {
        let bu = bernstein(u);
        let bv = bernstein(v);
        let mut acc = Point::ZERO.to_vec2();
        for (i, row) in self.points.iter().enumerate() {
            for (j, pt) in row.iter().enumerate() {
                acc += bu[i] * bv[j] * pt.to_vec2();
            }
        }
        acc.to_point()
    }
}

fn line_as_cubic(p0: Point, p1: Point) -> CubicBez {
    CubicBez::new(p0, p0.lerp(p1, 1.0 / 3.0), p0.lerp(p1, 2.0 / 3.0), p1)
}

fn bernstein(t: f64) -> [f64; 4] {
    let mt = 1.0 - t;
    [mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t]
}
