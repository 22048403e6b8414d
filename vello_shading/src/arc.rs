// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cubic Bezier approximations of circular arcs, and the contours of radial blend
//! extensions.
//!
//! All constructions work from a [`BlendArc`], which holds the unit vectors describing the
//! cone between the two circles of a radial blend. Angles are never computed explicitly:
//! every direction is a combination of the axis and perpendicular vectors, weighted by the
//! sine and cosine of the tangency angle, which avoids trigonometric round trips.

use crate::kurbo::{BezPath, CubicBez, Point, Rect, Vec2};
use crate::math::{perp, pseudo_angle, FloatExt};
use crate::peniko::Fill;
use crate::{Error, Result};
use smallvec::SmallVec;

/// The factor by which radius vectors are scaled to get the control points of a cubic Bezier
/// approximating a quarter circle.
pub const CIRCLE_FACTOR: f64 = 4.0 * (core::f64::consts::SQRT_2 - 1.0) / 3.0;

/// How far past the clip the open side of an unbounded extension is placed.
const CLIP_MARGIN: f64 = 1.0;

/// Tangent line systems with a determinant below this are degenerate.
const DETERMINANT_EPSILON: f64 = 1.0e-12;

/// Sweeps (in pseudo-angle units, 1 per quarter turn) below this are empty.
const SWEEP_EPSILON: f64 = 1.0e-12;

/// The geometry of the cone between two circles, shared by every circle of a radial blend.
///
/// Circles along a radial blend are all tangent to the same two lines, so the directions
/// stored here are valid for any circle of the blend; only the center and radius change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendArc {
    /// Unit vector from the start center towards the end center.
    pub axis: Vec2,
    /// `axis` turned by 90° counter-clockwise.
    pub perp: Vec2,
    /// Sine of the tangency angle θ, the rate of radius change over center distance.
    pub sin: f64,
    /// Cosine of the tangency angle θ.
    pub cos: f64,
    /// Whether one circle contains the other, in which case there are no tangent lines.
    pub contained: bool,
    /// Directions of the tangent lines: `[t+, t-, -t+, -t-]`.
    pub tangents: [Vec2; 4],
    /// Unit offsets from a circle center to its tangent points: `[n+, n-, -n+, -n-]`.
    pub offsets: [Vec2; 4],
}

impl BlendArc {
    /// Classify the pair of circles and build the cone geometry.
    pub fn classify(c0: Point, r0: f64, c1: Point, r1: f64) -> Self {
        let delta = c1 - c0;
        let d = delta.hypot();
        let dr = r1 - r0;
        let epsilon = 1.0e-9 * d.max(r0).max(r1).max(1.0);
        let axis = if d.is_nearly_zero_within(epsilon) {
            Vec2::new(1.0, 0.0)
        } else {
            delta / d
        };
        if d <= dr.abs() + epsilon {
            let sin = if dr < 0.0 { -1.0 } else { 1.0 };
            Self::new(axis, sin, 0.0, true)
        } else {
            let sin = dr / d;
            let cos = (1.0 - sin * sin).max(0.0).sqrt();
            Self::new(axis, sin, cos, false)
        }
    }

    /// Build the cone geometry from a unit axis and the tangency angle.
    pub fn new(axis: Vec2, sin: f64, cos: f64, contained: bool) -> Self {
        let perp = perp(axis);
        // Rotating the axis by ±(90° + θ), written in the axis/perpendicular basis.
        let n_plus = -sin * axis + cos * perp;
        let n_minus = -sin * axis - cos * perp;
        let t_plus = cos * axis + sin * perp;
        let t_minus = cos * axis - sin * perp;
        Self {
            axis,
            perp,
            sin,
            cos,
            contained,
            tangents: [t_plus, t_minus, -t_plus, -t_minus],
            offsets: [n_plus, n_minus, -n_plus, -n_minus],
        }
    }

    /// The unit offset to the tangent point on the `+perp` side.
    pub fn n_plus(&self) -> Vec2 {
        self.offsets[0]
    }

    /// The unit offset to the tangent point on the `-perp` side.
    pub fn n_minus(&self) -> Vec2 {
        self.offsets[1]
    }

    /// The pseudo-angle of a unit vector relative to the axis, in `[0, 4)`.
    fn angle_of(&self, v: Vec2) -> f64 {
        pseudo_angle(v.dot(self.axis), v.dot(self.perp))
    }
}

/// One of the four quarter circles, counter-clockwise from the axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quadrant {
    /// From `+axis` to `+perp`.
    First,
    /// From `+perp` to `-axis`.
    Second,
    /// From `-axis` to `-perp`.
    Third,
    /// From `-perp` to `+axis`.
    Fourth,
}

impl Quadrant {
    /// All quadrants, in counter-clockwise order.
    pub const ALL: [Self; 4] = [Self::First, Self::Second, Self::Third, Self::Fourth];
}

/// A quarter circle. `axis_vec` and `perp_vec` are the axis and perpendicular vectors
/// already scaled by the radius.
pub fn quadrant(quadrant: Quadrant, center: Point, axis_vec: Vec2, perp_vec: Vec2) -> CubicBez {
    let (from, to) = match quadrant {
        Quadrant::First => (axis_vec, perp_vec),
        Quadrant::Second => (perp_vec, -axis_vec),
        Quadrant::Third => (-axis_vec, -perp_vec),
        Quadrant::Fourth => (-perp_vec, axis_vec),
    };
    CubicBez::new(
        center + from,
        center + from + CIRCLE_FACTOR * to,
        center + to + CIRCLE_FACTOR * from,
        center + to,
    )
}

/// A closed circle made of four quadrants, starting on the axis.
///
/// The circle runs counter-clockwise, or clockwise when `ccw` is false.
pub fn circle(center: Point, radius: f64, arc: &BlendArc, ccw: bool) -> BezPath {
    let axis_vec = radius * arc.axis;
    let perp_vec = if ccw { radius * arc.perp } else { -radius * arc.perp };
    let mut path = BezPath::new();
    path.move_to(center + axis_vec);
    for q in Quadrant::ALL {
        let c = quadrant(q, center, axis_vec, perp_vec);
        path.curve_to(c.p1, c.p2, c.p3);
    }
    path.close_path();
    path
}

/// A piece of a unit circle of at most a quarter turn, counter-clockwise from `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcSegment {
    /// Unit vector to the start of the segment.
    pub from: Vec2,
    /// Unit vector to the end of the segment.
    pub to: Vec2,
    /// Length of the control vectors relative to the radius.
    pub k: f64,
}

impl ArcSegment {
    fn new(from: Vec2, to: Vec2) -> Self {
        // k = 4/3·tan(α/4) = 4·sin(α/2) / (3 + 3·cos(α/2)), with the half-angle values
        // taken from cos α.
        let cos = from.dot(to).clamp(-1.0, 1.0);
        let half_sin = ((1.0 - cos) * 0.5).sqrt();
        let half_cos = ((1.0 + cos) * 0.5).sqrt();
        let k = 4.0 * half_sin / (3.0 + 3.0 * half_cos);
        Self { from, to, k }
    }

    /// Place the segment on a circle.
    pub fn to_cubic(&self, center: Point, radius: f64) -> CubicBez {
        CubicBez::new(
            center + radius * self.from,
            center + radius * (self.from + self.k * perp(self.from)),
            center + radius * (self.to - self.k * perp(self.to)),
            center + radius * self.to,
        )
    }
}

/// Split the counter-clockwise arc from unit vector `from` to unit vector `to` into segments
/// of at most 90°, breaking at the axis and perpendicular directions of `arc`.
///
/// An empty list is returned when `from` and `to` coincide.
pub fn arc_segments(arc: &BlendArc, from: Vec2, to: Vec2) -> SmallVec<[ArcSegment; 4]> {
    let start = arc.angle_of(from);
    let mut sweep = arc.angle_of(to) - start;
    if sweep < 0.0 {
        sweep += 4.0;
    }
    let mut segments = SmallVec::new();
    if sweep <= SWEEP_EPSILON {
        return segments;
    }

    let directions = [arc.axis, arc.perp, -arc.axis, -arc.perp];
    let mut breaks: SmallVec<[(f64, Vec2); 4]> = directions
        .iter()
        .enumerate()
        .map(|(i, v)| ((i as f64 - start).rem_euclid(4.0), *v))
        .filter(|(rel, _)| *rel > SWEEP_EPSILON && *rel < sweep - SWEEP_EPSILON)
        .collect();
    breaks.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut last = from;
    for (_, v) in breaks {
        segments.push(ArcSegment::new(last, v));
        last = v;
    }
    segments.push(ArcSegment::new(last, to));
    segments
}

/// How an arc is attached to the current path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Join {
    /// Start a new subpath at the start of the arc.
    MoveTo,
    /// Draw a line from the current point to the start of the arc.
    LineTo,
    /// The current point already is the start of the arc.
    Continue,
}

/// Append the counter-clockwise arc of the circle at `center` with `radius`, from the
/// direction `from` to the direction `to`.
pub fn append_arc(
    path: &mut BezPath,
    join: Join,
    center: Point,
    radius: f64,
    arc: &BlendArc,
    from: Vec2,
    to: Vec2,
) {
    let start = center + radius * from;
    match join {
        Join::MoveTo => path.move_to(start),
        Join::LineTo => path.line_to(start),
        Join::Continue => {}
    }
    if radius <= 0.0 {
        return;
    }
    for segment in arc_segments(arc, from, to) {
        let c = segment.to_cubic(center, radius);
        path.curve_to(c.p1, c.p2, c.p3);
    }
}

/// Which end of a radial blend an extension continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtendDirection {
    /// Before the start circle, towards `-axis`.
    Start,
    /// After the end circle, towards `+axis`.
    End,
}

impl ExtendDirection {
    fn sign(self) -> f64 {
        match self {
            Self::Start => -1.0,
            Self::End => 1.0,
        }
    }
}

/// The contour of the area covered by the circles of a radial blend beyond one of its ends.
///
/// `center` and `radius` describe the end circle, `clip` is the paintable area in the same
/// space. `bodge` is added to the radius (or taken from it when the inside of the circle is
/// knocked out), so that the extension overlaps the adjoining blend body, which is built
/// from different curves.
///
/// Returns `None` when the extension covers no area.
pub fn extension_contour(
    center: Point,
    radius: f64,
    arc: &BlendArc,
    direction: ExtendDirection,
    clip: Rect,
    bodge: f64,
) -> Result<Option<(BezPath, Fill)>> {
    let sigma = direction.sign();
    if arc.contained {
        if sigma * arc.sin > 0.0 {
            // The circles grow beyond this end: everything outside the circle.
            let mut path = BezPath::new();
            let outer = clip.inflate(CLIP_MARGIN, CLIP_MARGIN);
            path.move_to((outer.x0, outer.y0));
            path.line_to((outer.x1, outer.y0));
            path.line_to((outer.x1, outer.y1));
            path.line_to((outer.x0, outer.y1));
            path.close_path();
            let radius = (radius - bodge).max(0.0);
            if radius > 0.0 {
                path.extend(circle(center, radius, arc, true));
            }
            return Ok(Some((path, Fill::EvenOdd)));
        }
        // The circles shrink into this one: the disc itself.
        let radius = radius + bodge;
        if radius <= 0.0 {
            return Ok(None);
        }
        return Ok(Some((circle(center, radius, arc, true), Fill::NonZero)));
    }

    // Beyond a point the circles would need negative radii.
    let radius = radius + bodge;
    if radius <= 0.0 {
        return Ok(None);
    }
    let dir = sigma * arc.axis;
    let p_plus = center + radius * arc.n_plus();
    let p_minus = center + radius * arc.n_minus();
    let t_plus = sigma * arc.tangents[0];
    let t_minus = sigma * arc.tangents[1];

    // A line perpendicular to the axis, just past the clip and the tangent points.
    let corners = [
        Point::new(clip.x0, clip.y0),
        Point::new(clip.x1, clip.y0),
        Point::new(clip.x1, clip.y1),
        Point::new(clip.x0, clip.y1),
    ];
    let far = corners
        .iter()
        .chain([&p_plus, &p_minus])
        .map(|p| (*p - center).dot(dir))
        .fold(f64::NEG_INFINITY, f64::max)
        + CLIP_MARGIN;

    let converging = sigma * arc.sin < 0.0;
    let apex = if converging {
        let apex = tangent_intersection(p_plus, t_plus, p_minus, t_minus, direction)?;
        let along = (apex - center).dot(dir);
        (clip.contains(apex) || along <= far).then_some(apex)
    } else {
        None
    };

    let far_point = |p: Point, t: Vec2| {
        let lambda = (far - (p - center).dot(dir)) / t.dot(dir);
        p + lambda * t
    };

    let mut path = BezPath::new();
    let (first, first_t, second, second_t, from, to) = match direction {
        ExtendDirection::Start => (p_plus, t_plus, p_minus, t_minus, arc.n_minus(), arc.n_plus()),
        ExtendDirection::End => (p_minus, t_minus, p_plus, t_plus, arc.n_plus(), arc.n_minus()),
    };
    path.move_to(first);
    match apex {
        Some(apex) => path.line_to(apex),
        None => {
            path.line_to(far_point(first, first_t));
            path.line_to(far_point(second, second_t));
        }
    }
    path.line_to(second);
    append_arc(&mut path, Join::Continue, center, radius, arc, from, to);
    path.close_path();
    Ok(Some((path, Fill::NonZero)))
}

/// The point where the two tangent lines of a converging cone meet.
fn tangent_intersection(
    p_plus: Point,
    t_plus: Vec2,
    p_minus: Point,
    t_minus: Vec2,
    direction: ExtendDirection,
) -> Result<Point> {
    // Ordered so that the determinant is positive for a cone converging in `direction`.
    let (pa, ta, pb, tb) = match direction {
        ExtendDirection::Start => (p_plus, t_plus, p_minus, t_minus),
        ExtendDirection::End => (p_minus, t_minus, p_plus, t_plus),
    };
    let determinant = ta.cross(-tb);
    if determinant <= DETERMINANT_EPSILON {
        return Err(Error::InternalGeometryFailure { determinant });
    }
    let w = pb - pa;
    let lambda = w.cross(-tb) / determinant;
    Ok(pa + lambda * ta)
}
