// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recursive subdivision of a blend into spans over which colors vary linearly.

use crate::shading::{BlendSpan, DeviceColor, ShadingContext, ShadingInfo};
use crate::steps::is_linear;
use crate::Result;

/// Split `span` at every discontinuity of the color functions, then bisect the pieces until
/// their colors are linear, calling `leaf` for each final span in order of increasing `s`.
///
/// `extent` gives the size of a span in device pixels; spans no larger than
/// `min_leaf_pixels` are not bisected further. `leaf` receives the colors at both ends of
/// the span, each evaluated from the inside.
pub(crate) fn decompose<E, L>(
    ctx: &ShadingContext<'_>,
    span: BlendSpan,
    extent: &E,
    leaf: &mut L,
) -> Result<()>
where
    E: Fn(&BlendSpan) -> f64,
    L: FnMut(&BlendSpan, &DeviceColor, &DeviceColor) -> Result<()>,
{
    decompose_at(ctx, span, extent, leaf, 0)
}

fn decompose_at<E, L>(
    ctx: &ShadingContext<'_>,
    span: BlendSpan,
    extent: &E,
    leaf: &mut L,
    depth: u32,
) -> Result<()>
where
    E: Fn(&BlendSpan) -> f64,
    L: FnMut(&BlendSpan, &DeviceColor, &DeviceColor) -> Result<()>,
{
    let info = ctx.info;
    info.check_interrupt()?;

    if span.t[0] != span.t[1] {
        if let Some(location) = nearest_discontinuity(info, &span)? {
            let (first, second) = span.split_at_parameter(location);
            decompose_at(ctx, first, extent, leaf, depth)?;
            return decompose_at(ctx, second, extent, leaf, depth);
        }
    }

    let forward = span.is_forward();
    let c0 = info.colors.evaluate(span.t[0], span.opacity[0], forward)?;
    let c1 = info.colors.evaluate(span.t[1], span.opacity[1], !forward)?;

    let options = ctx.options;
    if depth < options.max_depth
        && extent(&span) > options.min_leaf_pixels
        && !is_linear(
            info.colors,
            span.t,
            span.opacity,
            [&c0, &c1],
            options.linearity_fineness.max(1),
        )?
    {
        let (first, second) = span.bisect();
        decompose_at(ctx, first, extent, leaf, depth + 1)?;
        return decompose_at(ctx, second, extent, leaf, depth + 1);
    }

    log::trace!("leaf s = {:?}, t = {:?}", span.s, span.t);
    leaf(&span, &c0, &c1)
}

/// The discontinuity of any color function inside the span that is closest to its start.
fn nearest_discontinuity(info: &ShadingInfo<'_>, span: &BlendSpan) -> Result<Option<f64>> {
    let [lo, hi] = span.parameter_bounds();
    let forward = span.is_forward();
    let mut nearest: Option<f64> = None;
    for index in 0..info.functions.function_count() {
        info.check_interrupt()?;
        let mut bounds = [lo, hi];
        match nearest {
            Some(location) if forward => bounds[1] = location,
            Some(location) => bounds[0] = location,
            None => {}
        }
        // Finders report the lowest location, so walking backwards needs repeated queries.
        while let Some(found) = info.functions.find_discontinuity(index, bounds)? {
            let location = found.location;
            if location.is_nan() || location <= bounds[0] || location >= bounds[1] {
                break;
            }
            nearest = Some(location);
            if forward {
                break;
            }
            bounds[0] = location;
        }
    }
    Ok(nearest)
}
