// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering axial blends as synthetic images.
//!
//! Each row of the image holds one color step (or one part of a step, when dithering), so
//! the image is only as large as the blend has colors. Rows are generated on demand by
//! [`BlendRows`], which the surface pulls from.

use crate::axial::AxialBlend;
use crate::kurbo::{Affine, Vec2};
use crate::math::{lerp, transform_vec};
use crate::shading::ShadingContext;
use crate::steps::StepCalculator;
use crate::surface::{ImageSource, SurfaceEmitter};
use crate::{Error, Result};

/// Color samples are quantized to this many bits.
pub const BITS_PER_COMPONENT: u8 = 12;

const SAMPLE_MAX: f32 = ((1 << BITS_PER_COMPONENT) - 1) as f32;

/// The pseudo-random sequence used for dithering.
///
/// This is the classic ANSI C `rand` generator. It is cheap and deterministic, which is all
/// dithering needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Lcg {
    state: u32,
}

impl Lcg {
    pub(crate) fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// The next value, in `[0, 1)`.
    pub(crate) fn next_unit(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12345);
        ((self.state >> 16) & 0x7fff) as f32 / 32768.0
    }
}

/// Append 12-bit samples to `out`, two samples to three bytes, most significant bits first.
///
/// An odd trailing sample occupies two bytes, padded with zero bits.
pub fn pack_12bit(samples: &[u16], out: &mut Vec<u8>) {
    let mut pairs = samples.chunks_exact(2);
    for pair in &mut pairs {
        let (a, b) = (pair[0], pair[1]);
        out.push((a >> 4) as u8);
        out.push((((a & 0xf) << 4) | (b >> 8)) as u8);
        out.push((b & 0xff) as u8);
    }
    if let [a] = pairs.remainder() {
        out.push((a >> 4) as u8);
        out.push(((a & 0xf) << 4) as u8);
    }
}

/// The number of bytes of a packed row of 12-bit samples.
fn packed_len(samples: usize) -> usize {
    (samples * 3).div_ceil(2)
}

fn quantize(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * SAMPLE_MAX).round() as u16
}

/// Generates the rows of a synthetic blend image.
///
/// Rows run along the blend axis. Without dithering each row is one pixel wide and holds
/// the center color of one step. With dithering every step is spread over several rows,
/// and each pixel picks between the colors at the two ends of the step, with the chance of
/// picking the far end growing towards it.
#[derive(Debug)]
pub struct BlendRows {
    width: u32,
    height: u32,
    components: usize,
    /// Quantized colors, `components` samples each.
    colors: Vec<u16>,
    sub_rows: u32,
    dither: bool,
    rng: Lcg,
    row: u32,
    pixels: Vec<u16>,
    buffer: Vec<u8>,
}

impl BlendRows {
    fn new(
        colors: Vec<u16>,
        components: usize,
        steps: u32,
        sub_rows: u32,
        width: u32,
        dither: bool,
        seed: u32,
    ) -> Result<Self> {
        let samples = width as usize * components;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(samples)
            .map_err(|_| Error::OutOfMemory("image row samples"))?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(packed_len(samples))
            .map_err(|_| Error::OutOfMemory("image row buffer"))?;
        Ok(Self {
            width,
            height: steps * sub_rows,
            components,
            colors,
            sub_rows,
            dither,
            rng: Lcg::new(seed),
            row: 0,
            pixels,
            buffer,
        })
    }
}

impl ImageSource for BlendRows {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn components(&self) -> usize {
        self.components
    }

    fn bits_per_component(&self) -> u8 {
        BITS_PER_COMPONENT
    }

    fn next_row(&mut self) -> Option<&[u8]> {
        if self.row >= self.height {
            return None;
        }
        let step = (self.row / self.sub_rows) as usize;
        let sub_row = self.row % self.sub_rows;
        self.row += 1;

        self.pixels.clear();
        let threshold = (sub_row as f32 + 0.5) / self.sub_rows as f32;
        for _ in 0..self.width {
            let index = if self.dither && self.rng.next_unit() < threshold {
                step + 1
            } else {
                step
            };
            let start = index * self.components;
            self.pixels
                .extend_from_slice(&self.colors[start..start + self.components]);
        }

        self.buffer.clear();
        pack_12bit(&self.pixels, &mut self.buffer);
        Some(&self.buffer)
    }
}

/// Render the visible part `x_range` of an axial blend as an image, where `x_range` and
/// `y_range` are in blend space and `to_device` maps blend space to device space.
///
/// The caller guarantees both ends of the blend are opaque.
pub(crate) fn render_axial_image(
    ctx: &ShadingContext<'_>,
    blend: &AxialBlend,
    to_device: Affine,
    x_range: [f64; 2],
    y_range: [f64; 2],
    surface: &mut dyn SurfaceEmitter,
) -> Result<()> {
    let info = ctx.info;
    let options = ctx.options;
    let noise = &options.noise;
    let [xa, xb] = x_range;
    let [y0, y1] = y_range;
    let [c0, c1] = blend.colors;
    let (ta, tb) = (lerp(c0, c1, xa), lerp(c0, c1, xb));

    let along = transform_vec(to_device, Vec2::new(1.0, 0.0)).hypot();
    let across = transform_vec(to_device, Vec2::new(0.0, 1.0)).hypot();
    let length = (xb - xa) * along * info.resolution;
    let min_step = (tb - ta).abs() / length.max(1.0);
    let steps = StepCalculator::new(info, options).compute_steps(ta, tb, min_step)?;

    let dither =
        info.antialias && noise.enabled && length / f64::from(steps) >= noise.min_step_pixels;
    let (sub_rows, width) = if dither {
        let sub_rows = ((length / f64::from(steps)).floor() as u32)
            .clamp(1, noise.max_subdivisions.max(1));
        let width = (((y1 - y0) * across * info.resolution).ceil() as u32)
            .clamp(1, noise.max_width.max(1));
        (sub_rows, width)
    } else {
        (1, 1)
    };
    log::debug!("blend image: {steps} steps, {sub_rows} rows per step, {width} pixels wide");

    // Dithering mixes the colors at both ends of a step, otherwise each step has its center
    // color.
    let components = info.colors.components();
    let count = if dither { steps + 1 } else { steps };
    let mut colors = Vec::new();
    colors
        .try_reserve_exact(count as usize * components)
        .map_err(|_| Error::OutOfMemory("blend image colors"))?;
    let forward = tb >= ta;
    for k in 0..count {
        info.check_interrupt()?;
        let frac = if dither {
            f64::from(k) / f64::from(steps)
        } else {
            (f64::from(k) + 0.5) / f64::from(steps)
        };
        let color = info.colors.evaluate(lerp(ta, tb, frac), 1.0, forward)?;
        colors.extend(color.components.iter().map(|c| quantize(*c)));
    }

    let mut rows = BlendRows::new(
        colors,
        components,
        steps,
        sub_rows,
        width,
        dither,
        noise.seed,
    )?;
    let image_to_blend = Affine::new([
        0.0,
        (y1 - y0) / f64::from(rows.width),
        (xb - xa) / f64::from(rows.height),
        0.0,
        xa,
        y0,
    ]);
    surface.image(&mut rows, to_device * image_to_blend)
}
