// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A color function built from color stops.

use crate::math::lerp_f32;
use crate::peniko::ColorStop;
use crate::shading::{ColorEvaluator, DeviceColor, Discontinuity, DiscontinuityFinder};
use crate::{Error, Result};
use smallvec::SmallVec;

/// Slopes and jumps smaller than this are ignored when looking for discontinuities.
const SMOOTH_EPSILON: f32 = 1.0e-6;

/// The alpha channel is the last function of a [`StopFunction`].
const ALPHA: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Stop {
    offset: f64,
    values: [f32; 4],
}

/// A piecewise-linear color function through a list of color stops.
///
/// Each of the three color components and alpha is a separate one-dimensional function,
/// so discontinuities are reported per component: a component which happens to be linear
/// across a stop has no discontinuity there. Two stops at the same offset produce a jump.
///
/// Components are interpolated in the color space the stops are given in; no color
/// conversion takes place.
#[derive(Clone, Debug)]
pub struct StopFunction {
    stops: SmallVec<[Stop; 4]>,
    tolerance: f32,
}

impl StopFunction {
    /// Create a function from color stops, which must be sorted by offset.
    pub fn new(stops: &[ColorStop]) -> Result<Self> {
        if stops.is_empty() {
            return Err(Error::EvaluationFailure("a color function needs at least one stop".into()));
        }
        if stops.windows(2).any(|w| w[0].offset > w[1].offset) {
            return Err(Error::EvaluationFailure("color stops are not sorted by offset".into()));
        }
        Ok(Self {
            stops: stops
                .iter()
                .map(|stop| Stop {
                    offset: stop.offset as f64,
                    values: stop.color.components,
                })
                .collect(),
            tolerance: 1.0 / 256.0,
        })
    }

    /// Set the largest component difference for which two colors are considered the same.
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The offsets of the first and last stop.
    pub fn domain(&self) -> [f64; 2] {
        [self.stops[0].offset, self.stops[self.stops.len() - 1].offset]
    }

    fn value(&self, index: usize, t: f64, forward: bool) -> f32 {
        let count = if forward {
            self.stops.partition_point(|s| s.offset <= t)
        } else {
            self.stops.partition_point(|s| s.offset < t)
        };
        if count == 0 {
            return self.stops[0].values[index];
        }
        if count == self.stops.len() {
            return self.stops[count - 1].values[index];
        }
        let (a, b) = (&self.stops[count - 1], &self.stops[count]);
        let frac = ((t - a.offset) / (b.offset - a.offset)) as f32;
        lerp_f32(a.values[index], b.values[index], frac)
    }

    /// The slope of component `index` on the side of `offset` given by `forward`.
    fn slope(&self, index: usize, offset: f64, forward: bool) -> f32 {
        let neighbour = if forward {
            self.stops.iter().map(|s| s.offset).find(|o| *o > offset)
        } else {
            self.stops.iter().rev().map(|s| s.offset).find(|o| *o < offset)
        };
        let Some(neighbour) = neighbour else {
            // Outside of the stops the function is constant.
            return 0.0;
        };
        let here = self.value(index, offset, forward);
        let there = self.value(index, neighbour, !forward);
        (there - here) / (neighbour - offset) as f32
    }
}

impl DiscontinuityFinder for StopFunction {
    fn function_count(&self) -> usize {
        4
    }

    fn find_discontinuity(&self, index: usize, bounds: [f64; 2]) -> Result<Option<Discontinuity>> {
        if index >= 4 {
            return Err(Error::EvaluationFailure(format!("no color function {index}")));
        }
        let [lo, hi] = bounds;
        let mut last = None;
        for stop in &self.stops {
            let offset = stop.offset;
            if offset <= lo || offset >= hi || last == Some(offset) {
                continue;
            }
            last = Some(offset);

            let below = self.value(index, offset, false);
            let above = self.value(index, offset, true);
            if (above - below).abs() > SMOOTH_EPSILON {
                return Ok(Some(Discontinuity {
                    location: offset,
                    order: 0,
                }));
            }
            let left = self.slope(index, offset, false);
            let right = self.slope(index, offset, true);
            if (right - left).abs() > SMOOTH_EPSILON {
                return Ok(Some(Discontinuity {
                    location: offset,
                    order: 1,
                }));
            }
        }
        Ok(None)
    }
}

impl ColorEvaluator for StopFunction {
    fn components(&self) -> usize {
        3
    }

    fn evaluate(&self, t: f64, opacity: f32, forward: bool) -> Result<DeviceColor> {
        if !t.is_finite() {
            return Err(Error::EvaluationFailure(format!("cannot evaluate at {t}")));
        }
        Ok(DeviceColor::new(
            (0..3).map(|i| self.value(i, t, forward)),
            self.value(ALPHA, t, forward) * opacity,
        ))
    }

    fn close_enough(&self, a: &DeviceColor, b: &DeviceColor) -> bool {
        self.max_component_difference(a, b) <= self.tolerance
    }

    fn max_component_difference(&self, a: &DeviceColor, b: &DeviceColor) -> f32 {
        a.components
            .iter()
            .zip(&b.components)
            .map(|(x, y)| (x - y).abs())
            .fold((a.opacity - b.opacity).abs(), f32::max)
    }
}

/// A function through stops given as offset and color pairs.
#[cfg(test)]
pub(crate) fn ramp(
    stops: &[(f32, crate::color::AlphaColor<crate::color::Srgb>)],
) -> StopFunction {
    let stops: Vec<_> = stops
        .iter()
        .map(|(offset, color)| ColorStop {
            offset: *offset,
            color: crate::color::DynamicColor::from_alpha_color(*color),
        })
        .collect();
    StopFunction::new(&stops).unwrap()
}
