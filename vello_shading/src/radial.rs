// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Radial blends between two circles.
//!
//! A radial blend paints the circles interpolated between a start and an end circle, in
//! order, so where circles overlap the one nearest the end wins. The circles either all
//! nest inside each other ("contained"), or they sweep out a cone whose two tangent lines
//! touch every circle.
//!
//! Geometry is built in shading space and mapped to device space as each primitive is
//! emitted; both Bezier paths and tensor patches are closed under affine maps.

use crate::arc::{
    append_arc, arc_segments, circle, extension_contour, BlendArc, ExtendDirection, Join,
};
use crate::decompose::decompose;
use crate::kurbo::{BezPath, Point, Rect, Vec2};
use crate::math::{lerp, lerp_f32, mean_scale, FloatExt};
use crate::options::RadialStrategy;
use crate::patch::TensorPatch;
use crate::peniko::Fill;
use crate::shading::{BlendSpan, DeviceColor, ExtendPolicy, ShadingContext};
use crate::steps::StepCalculator;
use crate::surface::SurfaceEmitter;
use crate::{report, Error, Result};

/// A radial blend between the circle `c0`, `r0` and the circle `c1`, `r1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialBlend {
    /// The start center, in shading space.
    pub c0: Point,
    /// The start radius.
    pub r0: f64,
    /// The end center, in shading space.
    pub c1: Point,
    /// The end radius.
    pub r1: f64,
    /// The color function parameters at the start and end.
    pub colors: [f64; 2],
    /// The opacities at the start and end.
    pub opacities: [f32; 2],
    /// Whether the blend is continued beyond its ends.
    pub extend: ExtendPolicy,
}

impl RadialBlend {
    /// A blend between two circles over the color parameters `[0, 1]`, opaque and without
    /// extension.
    pub fn new(c0: impl Into<Point>, r0: f64, c1: impl Into<Point>, r1: f64) -> Self {
        Self {
            c0: c0.into(),
            r0,
            c1: c1.into(),
            r1,
            colors: [0.0, 1.0],
            opacities: [1.0, 1.0],
            extend: ExtendPolicy::NONE,
        }
    }

    /// A blend from the coordinates `[x0, y0, r0, x1, y1, r1]`.
    pub fn from_coords(coords: [f64; 6]) -> Self {
        let [x0, y0, r0, x1, y1, r1] = coords;
        Self::new((x0, y0), r0, (x1, y1), r1)
    }

    /// Set the color function parameters at the start and end.
    pub fn with_colors(mut self, colors: [f64; 2]) -> Self {
        self.colors = colors;
        self
    }

    /// Set the opacities at the start and end.
    pub fn with_opacities(mut self, opacities: [f32; 2]) -> Self {
        self.opacities = opacities;
        self
    }

    /// Set the extend policy.
    pub fn with_extend(mut self, extend: ExtendPolicy) -> Self {
        self.extend = extend;
        self
    }

    /// The circle at geometric parameter `s`, 0 at the start and 1 at the end.
    pub fn circle_at(&self, s: f64) -> (Point, f64) {
        (self.c0.lerp(self.c1, s), lerp(self.r0, self.r1, s))
    }

    /// Classify the circle pair and build its cone geometry.
    pub fn arc(&self) -> BlendArc {
        BlendArc::classify(self.c0, self.r0, self.c1, self.r1)
    }

    /// Whether the patches on the entry side of each circle can be left out, because
    /// nothing they paint would stay visible.
    ///
    /// Those patches only show inside the end circle. That is empty when the blend tapers to
    /// a point, and painted over by the end extension of a cone.
    fn omit_back(&self, arc: &BlendArc) -> bool {
        self.r1 == 0.0 || (!arc.contained && self.extend.end)
    }

    /// The bounding box of the start and end circles, which contains every circle in
    /// between.
    pub fn bounds(&self) -> Rect {
        let start = Rect::from_center_size(self.c0, (2.0 * self.r0, 2.0 * self.r0));
        let end = Rect::from_center_size(self.c1, (2.0 * self.r1, 2.0 * self.r1));
        start.union(end)
    }

    /// The largest distance any point of the blend moves over the whole parameter range,
    /// in shading space.
    fn travel(&self) -> f64 {
        (self.c1 - self.c0).hypot() + (self.r1 - self.r0).abs()
    }
}

/// Decompose a radial blend into primitives.
///
/// Extensions are filled contours. The body of the blend becomes tensor patches, or filled
/// contours with [`RadialStrategy::Fills`].
///
/// Radii must not be negative. Nothing is painted when both radii are zero, or when the two
/// circles are the same.
pub fn render_radial(
    ctx: &ShadingContext<'_>,
    blend: &RadialBlend,
    surface: &mut dyn SurfaceEmitter,
) -> Result<()> {
    report("radial blend", render(ctx, blend, surface))
}

fn render(
    ctx: &ShadingContext<'_>,
    blend: &RadialBlend,
    surface: &mut dyn SurfaceEmitter,
) -> Result<()> {
    if blend.r0 < 0.0 || blend.r1 < 0.0 || blend.r0.is_nan() || blend.r1.is_nan() {
        return Err(Error::InvalidGeometry("radial blend with a negative radius"));
    }
    if blend.r0 == 0.0 && blend.r1 == 0.0 {
        log::debug!("radial blend between two points, nothing to paint");
        return Ok(());
    }
    let transform = ctx.transform;
    let determinant = transform.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        return Err(Error::InvalidGeometry("radial blend transform is not invertible"));
    }
    let arc = blend.arc();
    if arc.contained && (blend.r1 - blend.r0).is_nearly_zero() {
        log::debug!("radial blend between identical circles, nothing to paint");
        return Ok(());
    }
    let clip = transform.inverse().transform_rect_bbox(ctx.clip);
    let scale = mean_scale(transform) * ctx.info.resolution;
    let bodge = ctx.options.seam_overlap / scale;
    let forward = blend.colors[1] >= blend.colors[0];
    log::debug!(
        "radial blend, contained: {}, sin: {}, strategy: {:?}",
        arc.contained,
        arc.sin,
        ctx.options.radial_strategy
    );

    if blend.extend.start {
        let color = ctx
            .info
            .evaluate_clamped(blend.colors[0], blend.opacities[0], !forward)?;
        let (center, radius) = (blend.c0, blend.r0);
        let contour =
            extension_contour(center, radius, &arc, ExtendDirection::Start, clip, bodge)?;
        if let Some((path, rule)) = contour {
            surface.fill(&(transform * path), rule, &color)?;
        }
    }

    match ctx.options.radial_strategy {
        RadialStrategy::Patches => radial_as_patches(ctx, blend, &arc, surface)?,
        RadialStrategy::Fills => radial_as_fills(ctx, blend, &arc, surface)?,
    }

    if blend.extend.end {
        let color = ctx
            .info
            .evaluate_clamped(blend.colors[1], blend.opacities[1], forward)?;
        let (center, radius) = (blend.c1, blend.r1);
        let contour = extension_contour(center, radius, &arc, ExtendDirection::End, clip, bodge)?;
        if let Some((path, rule)) = contour {
            surface.fill(&(transform * path), rule, &color)?;
        }
    }
    Ok(())
}

fn radial_as_patches(
    ctx: &ShadingContext<'_>,
    blend: &RadialBlend,
    arc: &BlendArc,
    surface: &mut dyn SurfaceEmitter,
) -> Result<()> {
    let omit_back = blend.omit_back(arc);
    let device_travel = blend.travel() * mean_scale(ctx.transform) * ctx.info.resolution;
    let extent = |span: &BlendSpan| (span.s[1] - span.s[0]).abs() * device_travel;

    // The entry side of a circle faces the direction the circles move in.
    let (a, n_plus, n_minus) = (arc.axis, arc.n_plus(), arc.n_minus());
    let back = [(a, n_plus), (n_minus, a)];
    let front = [(n_plus, -a), (-a, n_minus)];

    let mut leaf = |span: &BlendSpan, c0: &DeviceColor, c1: &DeviceColor| {
        let (ca, ra) = blend.circle_at(span.s[0]);
        let (cb, rb) = blend.circle_at(span.s[1]);
        let arcs = if omit_back { &back[..0] } else { &back[..] };
        for &(from, to) in arcs.iter().chain(&front) {
            for segment in arc_segments(arc, from, to) {
                let colors = [c0.clone(), c0.clone(), c1.clone(), c1.clone()];
                let patch = TensorPatch::ruled(
                    segment.to_cubic(ca, ra),
                    segment.to_cubic(cb, rb),
                    colors,
                );
                surface.tensor_patch(&patch.transform(ctx.transform))?;
            }
        }
        Ok(())
    };
    decompose(
        ctx,
        BlendSpan::new(blend.colors, blend.opacities),
        &extent,
        &mut leaf,
    )
}

/// The shape of the area painted by one step of a radial blend drawn as fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContourKind {
    /// A disc: nested circles, the inner of which is a point.
    Disc,
    /// The ring between two nested circles.
    Torus,
    /// Two separate circles joined by their common tangents.
    DisjointPair,
    /// Two overlapping circles joined by their common tangents.
    Hull,
    /// Two overlapping circles joined by their common tangents, without the area covered
    /// by both circles.
    HullMinusLens,
}

/// The contour of the area swept by the circles from `a` to `b`, each given as center and
/// radius.
///
/// `subtract_lens` selects whether the area inside both circles of a cone is excluded;
/// none of the circles in between pass through it. Returns `None` when the area is empty.
pub fn step_contour(
    arc: &BlendArc,
    a: (Point, f64),
    b: (Point, f64),
    subtract_lens: bool,
) -> Option<(ContourKind, BezPath, Fill)> {
    let ((ca, ra), (cb, rb)) = (a, b);
    if arc.contained {
        let (outer, inner) = if ra >= rb { (a, b) } else { (b, a) };
        if outer.1 <= 0.0 {
            return None;
        }
        let mut path = circle(outer.0, outer.1, arc, true);
        if inner.1 <= 0.0 {
            return Some((ContourKind::Disc, path, Fill::NonZero));
        }
        path.extend(circle(inner.0, inner.1, arc, true));
        return Some((ContourKind::Torus, path, Fill::EvenOdd));
    }

    let (n_plus, n_minus) = (arc.n_plus(), arc.n_minus());
    let mut path = BezPath::new();
    path.move_to(ca + ra * n_minus);
    path.line_to(cb + rb * n_minus);
    append_arc(&mut path, Join::Continue, cb, rb, arc, n_minus, n_plus);
    path.line_to(ca + ra * n_plus);
    append_arc(&mut path, Join::Continue, ca, ra, arc, n_plus, n_minus);
    path.close_path();

    let d = (cb - ca).hypot();
    if d >= ra + rb {
        return Some((ContourKind::DisjointPair, path, Fill::NonZero));
    }
    if !subtract_lens {
        return Some((ContourKind::Hull, path, Fill::NonZero));
    }
    append_lens(&mut path, arc, a, b, d);
    Some((ContourKind::HullMinusLens, path, Fill::EvenOdd))
}

/// Append the boundary of the intersection of two overlapping circles at distance `d`
/// along the axis.
fn append_lens(path: &mut BezPath, arc: &BlendArc, a: (Point, f64), b: (Point, f64), d: f64) {
    let ((ca, ra), (cb, rb)) = (a, b);
    // Distance from `ca` to the chord through both intersections, and half the chord.
    let x = (d * d + ra * ra - rb * rb) / (2.0 * d);
    let h = (ra * ra - x * x).max(0.0).sqrt();
    let upper = ca + x * arc.axis + h * arc.perp;
    let lower = ca + x * arc.axis - h * arc.perp;
    let unit = |p: Point, c: Point, r: f64| -> Vec2 { (p - c) / r };
    append_arc(
        path,
        Join::MoveTo,
        ca,
        ra,
        arc,
        unit(lower, ca, ra),
        unit(upper, ca, ra),
    );
    append_arc(
        path,
        Join::Continue,
        cb,
        rb,
        arc,
        unit(upper, cb, rb),
        unit(lower, cb, rb),
    );
    path.close_path();
}

/// Paint the body of a radial blend as one filled contour per color step.
fn radial_as_fills(
    ctx: &ShadingContext<'_>,
    blend: &RadialBlend,
    arc: &BlendArc,
    surface: &mut dyn SurfaceEmitter,
) -> Result<()> {
    let info = ctx.info;
    let [t0, t1] = blend.colors;
    let device_travel = blend.travel() * mean_scale(ctx.transform) * info.resolution;
    let min_step = (t1 - t0).abs() / device_travel.max(1.0);
    let steps = StepCalculator::new(info, ctx.options).compute_steps(t0, t1, min_step)?;
    let n = f64::from(steps);

    // Lenses of steps whose outer circle misses the end circle are painted over by later
    // steps; the omission condition for patches covers every lens.
    let omit_back = blend.omit_back(arc);
    let first_lens = (0..steps)
        .find(|k| {
            let (center, radius) = blend.circle_at(f64::from(k + 1) / n);
            (center - blend.c1).hypot() < radius + blend.r1
        })
        .unwrap_or(steps);
    log::debug!("radial blend as {steps} fills, lenses from step {first_lens}");

    let forward = t1 >= t0;
    for k in 0..steps {
        info.check_interrupt()?;
        let (s0, s1) = (f64::from(k) / n, f64::from(k + 1) / n);
        let mid = (f64::from(k) + 0.5) / n;
        let opacity = lerp_f32(blend.opacities[0], blend.opacities[1], mid as f32);
        let color = info.colors.evaluate(lerp(t0, t1, mid), opacity, forward)?;
        let subtract_lens = !omit_back && k >= first_lens;
        let a = blend.circle_at(s0);
        let b = blend.circle_at(s1);
        if let Some((_, path, rule)) = step_contour(arc, a, b, subtract_lens) {
            surface.fill(&(ctx.transform * path), rule, &color)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{render_radial, step_contour, ContourKind, RadialBlend};
    use crate::arc::BlendArc;
    use crate::color::palette::css::{BLACK, WHITE};
    use crate::function::ramp;
    use crate::kurbo::{Affine, Point, Rect, Shape};
    use crate::options::{BlendOptions, RadialStrategy};
    use crate::peniko::Fill;
    use crate::shading::{ExtendPolicy, NeverInterrupt, ShadingContext, ShadingInfo};
    use crate::surface::Recording;
    use crate::Error;
    use core::f64::consts::PI;

    fn render(blend: &RadialBlend, options: &BlendOptions) -> Result<Recording, Error> {
        let f = ramp(&[(0.0, BLACK), (1.0, WHITE)]);
        let info = ShadingInfo::new(&f, &NeverInterrupt);
        let clip = Rect::new(-200.0, -200.0, 200.0, 200.0);
        let ctx = ShadingContext::new(&info, options, Affine::IDENTITY, clip);
        let mut recording = Recording::new();
        render_radial(&ctx, blend, &mut recording)?;
        Ok(recording)
    }

    #[test]
    fn negative_radius_is_invalid() {
        let blend = RadialBlend::from_coords([0.0, 0.0, -1.0, 10.0, 0.0, 5.0]);
        let result = render(&blend, &BlendOptions::default());
        assert!(matches!(result, Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn degenerate_blends_paint_nothing() {
        let points = RadialBlend::from_coords([0.0, 0.0, 0.0, 10.0, 0.0, 0.0])
            .with_extend(ExtendPolicy::BOTH);
        assert!(render(&points, &BlendOptions::default()).unwrap().is_empty());
        let same = RadialBlend::from_coords([3.0, 3.0, 7.0, 3.0, 3.0, 7.0])
            .with_extend(ExtendPolicy::BOTH);
        assert!(render(&same, &BlendOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn cone_leaf_has_front_and_back_patches() {
        let blend = RadialBlend::from_coords([0.0, 0.0, 10.0, 100.0, 0.0, 20.0]);
        let recording = render(&blend, &BlendOptions::default()).unwrap();
        // The entry side spans more than a quarter turn on each side of the axis.
        assert_eq!(recording.patches().count(), 6);
        let bounds = blend.bounds().inflate(1e-6, 1e-6);
        for patch in recording.patches() {
            for point in patch.points.iter().flatten() {
                assert!(bounds.contains(*point), "{point:?}");
            }
        }
    }

    #[test]
    fn end_extension_replaces_back_patches() {
        let blend = RadialBlend::from_coords([0.0, 0.0, 10.0, 100.0, 0.0, 20.0])
            .with_extend(ExtendPolicy::new(false, true));
        let recording = render(&blend, &BlendOptions::default()).unwrap();
        assert_eq!(recording.patches().count(), 2);
        assert_eq!(recording.fills().count(), 1);
    }

    #[test]
    fn contained_patches_cover_the_circle_once() {
        let blend = RadialBlend::from_coords([0.0, 0.0, 0.0, 0.0, 0.0, 10.0]);
        let recording = render(&blend, &BlendOptions::default()).unwrap();
        // Two half circles, each split into two quarters.
        assert_eq!(recording.patches().count(), 4);
    }

    fn kind(arc: &BlendArc, a: (Point, f64), b: (Point, f64), lens: bool) -> Option<ContourKind> {
        step_contour(arc, a, b, lens).map(|contour| contour.0)
    }

    #[test]
    fn contour_kinds() {
        let cone = BlendArc::classify(Point::ZERO, 10.0, Point::new(100.0, 0.0), 20.0);
        let start = (Point::ZERO, 10.0);
        let far = (Point::new(50.0, 0.0), 15.0);
        let near = (Point::new(5.0, 0.0), 10.5);
        assert_eq!(kind(&cone, start, far, true), Some(ContourKind::DisjointPair));
        assert_eq!(kind(&cone, start, near, false), Some(ContourKind::Hull));
        assert_eq!(kind(&cone, start, near, true), Some(ContourKind::HullMinusLens));

        let nested = BlendArc::classify(Point::ZERO, 0.0, Point::ZERO, 10.0);
        let disc = kind(&nested, (Point::ZERO, 0.0), (Point::ZERO, 2.0), true);
        assert_eq!(disc, Some(ContourKind::Disc));
        let torus = kind(&nested, (Point::ZERO, 2.0), (Point::ZERO, 4.0), true);
        assert_eq!(torus, Some(ContourKind::Torus));
        assert_eq!(kind(&nested, (Point::ZERO, 0.0), (Point::ZERO, 0.0), true), None);
    }

    #[test]
    fn torus_area() {
        let nested = BlendArc::classify(Point::ZERO, 0.0, Point::ZERO, 10.0);
        let (_, path, rule) =
            step_contour(&nested, (Point::ZERO, 3.0), (Point::ZERO, 5.0), false).unwrap();
        assert_eq!(rule, Fill::EvenOdd);
        // Both circles run the same way, so the signed area adds up.
        let expected = PI * (25.0 + 9.0);
        assert!((path.area() - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn hull_area_of_equal_circles() {
        let cone = BlendArc::classify(Point::ZERO, 5.0, Point::new(30.0, 0.0), 5.0);
        let (kind, path, _) =
            step_contour(&cone, (Point::ZERO, 5.0), (Point::new(30.0, 0.0), 5.0), true).unwrap();
        assert_eq!(kind, ContourKind::DisjointPair);
        // A stadium: a rectangle and a circle.
        let expected = 30.0 * 10.0 + PI * 25.0;
        assert!((path.area() - expected).abs() / expected < 1e-3, "{}", path.area());
    }

    #[test]
    fn fills_strategy_paints_every_step() {
        let options = BlendOptions::default().with_radial_strategy(RadialStrategy::Fills);
        let blend = RadialBlend::from_coords([0.0, 0.0, 10.0, 100.0, 0.0, 20.0]);
        let recording = render(&blend, &options).unwrap();
        let colors: Vec<f32> = recording.fills().map(|f| f.2.components[0]).collect();
        assert!(colors.len() > 1);
        assert!(colors.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn lenses_are_kept_only_where_they_show() {
        let options = BlendOptions::default().with_radial_strategy(RadialStrategy::Fills);
        let blend = RadialBlend::from_coords([0.0, 0.0, 10.0, 100.0, 0.0, 20.0]);
        let rules: Vec<Fill> = render(&blend, &options)
            .unwrap()
            .fills()
            .map(|f| f.1)
            .collect();
        // Step circles meet the end circle from s = 7/11 onwards.
        let first = rules.iter().position(|r| *r == Fill::EvenOdd).unwrap();
        let ratio = first as f64 / rules.len() as f64;
        assert!((0.55..0.75).contains(&ratio), "{first} of {}", rules.len());
        assert!(rules[..first].iter().all(|r| *r == Fill::NonZero));
        assert!(rules[first..].iter().all(|r| *r == Fill::EvenOdd));

        // The end extension covers every lens.
        let extended = blend.with_extend(ExtendPolicy::new(false, true));
        let recording = render(&extended, &options).unwrap();
        assert_eq!(recording.fills().count(), rules.len() + 1);
        assert!(recording.fills().all(|f| f.1 == Fill::NonZero));
    }

    #[test]
    fn zero_radius_ends_are_not_extended() {
        let options = BlendOptions::default();
        let from_point = RadialBlend::from_coords([0.0, 0.0, 0.0, 100.0, 0.0, 20.0])
            .with_extend(ExtendPolicy::new(true, false));
        let recording = render(&from_point, &options).unwrap();
        assert!(recording.patches().count() > 0);
        assert_eq!(recording.fills().count(), 0);

        let to_point = RadialBlend::from_coords([0.0, 0.0, 20.0, 100.0, 0.0, 0.0])
            .with_extend(ExtendPolicy::new(false, true));
        let recording = render(&to_point, &options).unwrap();
        assert!(recording.patches().count() > 0);
        assert_eq!(recording.fills().count(), 0);
    }
}
