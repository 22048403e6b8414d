// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axial (linear) blends.

use crate::decompose::decompose;
use crate::image::render_axial_image;
use crate::kurbo::{Affine, BezPath, Point, Vec2};
use crate::math::transform_vec;
use crate::options::AxialStrategy;
use crate::peniko::Fill;
use crate::shading::{BlendSpan, DeviceColor, ExtendPolicy, ShadingContext};
use crate::surface::{GouraudVertex, SurfaceEmitter};
use crate::{report, Error, Result};

/// An axial blend: colors vary along the line from `p0` to `p1` and are constant along
/// lines perpendicular to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxialBlend {
    /// The start point, in shading space.
    pub p0: Point,
    /// The end point, in shading space.
    pub p1: Point,
    /// The color function parameters at the start and end.
    pub colors: [f64; 2],
    /// The opacities at the start and end.
    pub opacities: [f32; 2],
    /// Whether the blend is continued beyond its ends.
    pub extend: ExtendPolicy,
}

impl AxialBlend {
    /// A blend from `p0` to `p1` over the color parameters `[0, 1]`, opaque and without
    /// extension.
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        Self {
            p0: p0.into(),
            p1: p1.into(),
            colors: [0.0, 1.0],
            opacities: [1.0, 1.0],
            extend: ExtendPolicy::NONE,
        }
    }

    /// A blend from the coordinates `[x0, y0, x1, y1]`.
    pub fn from_coords(coords: [f64; 4]) -> Self {
        let [x0, y0, x1, y1] = coords;
        Self::new((x0, y0), (x1, y1))
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

    /// The transform from blend space to shading space.
    ///
    /// In blend space the start point is the origin, the end point is `(1, 0)` and `(0, 1)`
    /// is the axis turned by 90°.
    pub fn basis(&self) -> Affine {
        let (p0, p1) = (self.p0, self.p1);
        Affine::new([p1.x - p0.x, p1.y - p0.y, p0.y - p1.y, p1.x - p0.x, p0.x, p0.y])
    }
}

/// Decompose an axial blend into primitives.
///
/// The area before the start and after the end is painted with a solid fill if the blend
/// extends there; the blend itself becomes Gouraud triangles or, with
/// [`AxialStrategy::Image`], a synthetic image.
pub fn render_axial(
    ctx: &ShadingContext<'_>,
    blend: &AxialBlend,
    surface: &mut dyn SurfaceEmitter,
) -> Result<()> {
    report("axial blend", render(ctx, blend, surface))
}

fn render(
    ctx: &ShadingContext<'_>,
    blend: &AxialBlend,
    surface: &mut dyn SurfaceEmitter,
) -> Result<()> {
    if (blend.p1 - blend.p0).hypot2() == 0.0 {
        log::debug!("axial blend with a zero length axis, nothing to paint");
        return Ok(());
    }
    let to_device = ctx.transform * blend.basis();
    let determinant = to_device.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        return Err(Error::InvalidGeometry("axial blend transform is not invertible"));
    }
    let bbox = to_device.inverse().transform_rect_bbox(ctx.clip);
    let (y0, y1) = (bbox.y0, bbox.y1);
    let info = ctx.info;
    let forward = blend.colors[1] >= blend.colors[0];

    if blend.extend.start && bbox.x0 < 0.0 {
        let color = info.evaluate_clamped(blend.colors[0], blend.opacities[0], !forward)?;
        let path = rectangle(to_device, [bbox.x0, bbox.x1.min(0.0)], [y0, y1]);
        surface.fill(&path, Fill::NonZero, &color)?;
    }

    if bbox.x1 > 0.0 && bbox.x0 < 1.0 {
        let visible = [bbox.x0.max(0.0), bbox.x1.min(1.0)];
        let opaque = blend.opacities == [1.0, 1.0];
        if ctx.options.axial_strategy == AxialStrategy::Image && opaque {
            log::debug!("axial blend as image over {visible:?}");
            render_axial_image(ctx, blend, to_device, visible, [y0, y1], surface)?;
        } else {
            log::debug!("axial blend as triangles over {visible:?}");
            let length = transform_vec(to_device, Vec2::new(1.0, 0.0)).hypot() * info.resolution;
            let extent = |span: &BlendSpan| (span.s[1] - span.s[0]).abs() * length;
            let mut leaf = |span: &BlendSpan, c0: &DeviceColor, c1: &DeviceColor| {
                if span.s[1] <= visible[0] || span.s[0] >= visible[1] {
                    return Ok(());
                }
                let vertex = |x: f64, y: f64, color: &DeviceColor| GouraudVertex {
                    point: to_device * Point::new(x, y),
                    color: color.clone(),
                };
                let a = vertex(span.s[0], y0, c0);
                let b = vertex(span.s[1], y0, c1);
                let c = vertex(span.s[1], y1, c1);
                let d = vertex(span.s[0], y1, c0);
                surface.triangle(&[a.clone(), b, c.clone()])?;
                surface.triangle(&[a, c, d])
            };
            let span = BlendSpan::new(blend.colors, blend.opacities);
            decompose(ctx, span, &extent, &mut leaf)?;
        }
    }

    if blend.extend.end && bbox.x1 > 1.0 {
        let color = info.evaluate_clamped(blend.colors[1], blend.opacities[1], forward)?;
        let path = rectangle(to_device, [bbox.x0.max(1.0), bbox.x1], [y0, y1]);
        surface.fill(&path, Fill::NonZero, &color)?;
    }
    Ok(())
}

/// A blend-space rectangle, as a device-space path.
fn rectangle(to_device: Affine, x: [f64; 2], y: [f64; 2]) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(to_device * Point::new(x[0], y[0]));
    path.line_to(to_device * Point::new(x[1], y[0]));
    path.line_to(to_device * Point::new(x[1], y[1]));
    path.line_to(to_device * Point::new(x[0], y[1]));
    path.close_path();
    path
}

#[cfg(test)]
mod tests {
    use super::{render_axial, AxialBlend};
    use crate::color::palette::css::{BLACK, WHITE};
    use crate::function::ramp;
    use crate::kurbo::{Affine, Point, Rect, Shape};
    use crate::options::BlendOptions;
    use crate::shading::{ExtendPolicy, NeverInterrupt, ShadingContext, ShadingInfo};
    use crate::surface::{Recording, RenderCommand};
    use crate::Error;

    fn render(blend: &AxialBlend, transform: Affine) -> Result<Recording, Error> {
        let f = ramp(&[(0.0, BLACK), (1.0, WHITE)]);
        let info = ShadingInfo::new(&f, &NeverInterrupt);
        let options = BlendOptions::default();
        let clip = Rect::new(0.0, 0.0, 200.0, 50.0);
        let ctx = ShadingContext::new(&info, &options, transform, clip);
        let mut recording = Recording::new();
        render_axial(&ctx, blend, &mut recording)?;
        Ok(recording)
    }

    #[test]
    fn basis_maps_end_points() {
        let blend = AxialBlend::from_coords([10.0, 20.0, 10.0, 30.0]);
        let basis = blend.basis();
        assert_eq!(basis * Point::new(0.0, 0.0), Point::new(10.0, 20.0));
        assert_eq!(basis * Point::new(1.0, 0.0), Point::new(10.0, 30.0));
        assert!(basis.determinant() > 0.0);
    }

    #[test]
    fn zero_length_axis_paints_nothing() {
        let blend = AxialBlend::from_coords([5.0, 5.0, 5.0, 5.0]).with_extend(ExtendPolicy::BOTH);
        assert!(render(&blend, Affine::IDENTITY).unwrap().is_empty());
    }

    #[test]
    fn singular_transform_is_invalid() {
        let blend = AxialBlend::from_coords([0.0, 0.0, 100.0, 0.0]);
        let result = render(&blend, Affine::scale_non_uniform(1.0, 0.0));
        assert!(matches!(result, Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn extensions_are_rectangles_outside_the_axis() {
        let blend =
            AxialBlend::from_coords([50.0, 0.0, 150.0, 0.0]).with_extend(ExtendPolicy::BOTH);
        let recording = render(&blend, Affine::IDENTITY).unwrap();
        let commands = &recording.commands;
        assert!(matches!(commands.first(), Some(RenderCommand::Fill { .. })));
        assert!(matches!(commands.last(), Some(RenderCommand::Fill { .. })));
        let fills: Vec<_> = recording.fills().collect();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].2.components[0], 0.0);
        assert_eq!(fills[1].2.components[0], 1.0);
        let start = fills[0].0.bounding_box();
        assert!((start.x1 - 50.0).abs() < 1e-9 && start.x0 < 1e-9);
        let end = fills[1].0.bounding_box();
        assert!((end.x0 - 150.0).abs() < 1e-9 && end.x1 > 200.0 - 1e-9);
    }

    #[test]
    fn reversed_colors_take_extension_colors_from_the_ends() {
        let blend = AxialBlend::from_coords([50.0, 0.0, 150.0, 0.0])
            .with_colors([1.0, 0.0])
            .with_extend(ExtendPolicy::BOTH);
        let recording = render(&blend, Affine::IDENTITY).unwrap();
        let fills: Vec<_> = recording.fills().collect();
        assert_eq!(fills[0].2.components[0], 1.0);
        assert_eq!(fills[1].2.components[0], 0.0);
        let first = recording.triangles().next().unwrap();
        assert_eq!(first[0].color.components[0], 1.0);
    }
}
