// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The contract between the blend renderers and the caller's color machinery.

use crate::kurbo::{Affine, Rect};
use crate::math::{lerp, lerp_f32};
use crate::options::BlendOptions;
use crate::{Error, Result};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};

/// A color in device space, as produced by a [`ColorEvaluator`].
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceColor {
    /// The color components, usually in the range `[0, 1]`.
    pub components: SmallVec<[f32; 4]>,
    /// The opacity of the color.
    pub opacity: f32,
}

impl DeviceColor {
    /// Create a new color from its components and opacity.
    pub fn new(components: impl IntoIterator<Item = f32>, opacity: f32) -> Self {
        Self {
            components: components.into_iter().collect(),
            opacity,
        }
    }

    /// Linearly interpolate between `self` and `other`.
    ///
    /// Both colors must have the same number of components.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        debug_assert_eq!(self.components.len(), other.components.len());
        Self {
            components: self
                .components
                .iter()
                .zip(&other.components)
                .map(|(a, b)| lerp_f32(*a, *b, t))
                .collect(),
            opacity: lerp_f32(self.opacity, other.opacity, t),
        }
    }
}

/// A point where a color function is not smooth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Discontinuity {
    /// The location of the discontinuity in the function's domain.
    pub location: f64,
    /// 0 if the function value jumps, 1 if only its derivative does.
    pub order: u8,
}

/// Locates discontinuities of the one-dimensional color functions of a shading.
pub trait DiscontinuityFinder {
    /// The number of functions that can be queried.
    fn function_count(&self) -> usize;

    /// Find a discontinuity of function `index` strictly inside `bounds`.
    ///
    /// `bounds` is ordered (`bounds[0] <= bounds[1]`). When there are several, the
    /// one with the smallest location should be returned.
    fn find_discontinuity(&self, index: usize, bounds: [f64; 2]) -> Result<Option<Discontinuity>>;
}

/// Evaluates the color of a shading at a parameter value.
pub trait ColorEvaluator {
    /// The number of color components of evaluated colors.
    fn components(&self) -> usize;

    /// Evaluate the color at parameter `t`.
    ///
    /// When `t` is at a discontinuity, `forward` selects the limit from above (`true`) or from
    /// below (`false`).
    fn evaluate(&self, t: f64, opacity: f32, forward: bool) -> Result<DeviceColor>;

    /// Whether two colors are close enough to be indistinguishable.
    fn close_enough(&self, a: &DeviceColor, b: &DeviceColor) -> bool;

    /// The largest per-component difference between two colors.
    fn max_component_difference(&self, a: &DeviceColor, b: &DeviceColor) -> f32;

    /// The range spanned by a single color component.
    fn color_range(&self) -> f32 {
        1.0
    }
}

/// A cooperative cancellation flag, owned by the caller.
pub trait Interrupt {
    /// Whether the current operation should be abandoned.
    fn is_interrupted(&self) -> bool;
}

impl Interrupt for AtomicBool {
    fn is_interrupted(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// An [`Interrupt`] that is never raised.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverInterrupt;

impl Interrupt for NeverInterrupt {
    fn is_interrupted(&self) -> bool {
        false
    }
}

/// Whether the area before the start and after the end of a blend is painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtendPolicy {
    /// Paint the area before the start with the start color.
    pub start: bool,
    /// Paint the area after the end with the end color.
    pub end: bool,
}

impl ExtendPolicy {
    /// Extend in neither direction.
    pub const NONE: Self = Self::new(false, false);
    /// Extend in both directions.
    pub const BOTH: Self = Self::new(true, true);

    /// Create a new extend policy.
    pub const fn new(start: bool, end: bool) -> Self {
        Self { start, end }
    }
}

/// Everything the caller knows about the shading being painted.
pub struct ShadingInfo<'a> {
    /// The domain of the color functions.
    pub domain: [f64; 2],
    /// Whether the device is antialiased, which enables dithering in synthetic images.
    pub antialias: bool,
    /// The largest acceptable color difference between adjacent steps, in `(0, 1]`.
    pub smoothness: f32,
    /// Device pixels per device-space unit.
    pub resolution: f64,
    /// Discontinuity finder for the color functions.
    pub functions: &'a dyn DiscontinuityFinder,
    /// Color evaluator for the shading.
    pub colors: &'a dyn ColorEvaluator,
    /// The caller's cancellation flag.
    pub interrupt: &'a dyn Interrupt,
}

impl<'a> ShadingInfo<'a> {
    /// Create shading info for a color function which is both evaluator and discontinuity
    /// finder, with default tolerances.
    pub fn new<F>(function: &'a F, interrupt: &'a dyn Interrupt) -> Self
    where
        F: ColorEvaluator + DiscontinuityFinder + 'a,
    {
        Self {
            domain: [0.0, 1.0],
            antialias: false,
            smoothness: 1.0 / 256.0,
            resolution: 1.0,
            functions: function,
            colors: function,
            interrupt,
        }
    }

    /// Set the domain of the color functions, which extension colors are clamped to.
    ///
    /// The bounds may be given in either order.
    pub fn with_domain(mut self, domain: [f64; 2]) -> Self {
        self.domain = domain;
        self
    }

    /// Fail with [`Error::Interrupted`] if the caller asked to stop.
    #[inline]
    pub fn check_interrupt(&self) -> Result<()> {
        if self.interrupt.is_interrupted() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Evaluate a color with the parameter clamped to the function domain.
    pub fn evaluate_clamped(&self, t: f64, opacity: f32, forward: bool) -> Result<DeviceColor> {
        let [lo, hi] = self.ordered_domain();
        self.colors.evaluate(t.clamp(lo, hi), opacity, forward)
    }

    fn ordered_domain(&self) -> [f64; 2] {
        let [a, b] = self.domain;
        if a <= b {
            [a, b]
        } else {
            [b, a]
        }
    }
}

impl core::fmt::Debug for ShadingInfo<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShadingInfo")
            .field("domain", &self.domain)
            .field("antialias", &self.antialias)
            .field("smoothness", &self.smoothness)
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}

/// The state shared by one shading operation.
#[derive(Debug)]
pub struct ShadingContext<'a> {
    /// The shading being painted.
    pub info: &'a ShadingInfo<'a>,
    /// How the shading should be decomposed.
    pub options: &'a BlendOptions,
    /// The transform from shading space to device space.
    pub transform: Affine,
    /// The device-space area that can be painted.
    pub clip: Rect,
}

impl<'a> ShadingContext<'a> {
    /// Create a new context.
    pub fn new(
        info: &'a ShadingInfo<'a>,
        options: &'a BlendOptions,
        transform: Affine,
        clip: Rect,
    ) -> Self {
        Self {
            info,
            options,
            transform,
            clip,
        }
    }
}

/// A piece of a blend: a range of the geometric parameter `s` together with the color
/// parameters and opacities at its ends.
///
/// Spans are values; recursion narrows a copy instead of mutating shared state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendSpan {
    /// The geometric parameter at the start and end, 0 and 1 for the whole blend.
    pub s: [f64; 2],
    /// The color function parameter at the start and end.
    pub t: [f64; 2],
    /// The opacity at the start and end.
    pub opacity: [f32; 2],
}

impl BlendSpan {
    /// The span covering a whole blend.
    pub fn new(t: [f64; 2], opacity: [f32; 2]) -> Self {
        Self {
            s: [0.0, 1.0],
            t,
            opacity,
        }
    }

    /// Split the span at the point where the color parameter equals `t`.
    pub fn split_at_parameter(&self, t: f64) -> (Self, Self) {
        let frac = (t - self.t[0]) / (self.t[1] - self.t[0]);
        self.split(frac, Some(t))
    }

    /// Split the span in two halves.
    pub fn bisect(&self) -> (Self, Self) {
        self.split(0.5, None)
    }

    fn split(&self, frac: f64, exact_t: Option<f64>) -> (Self, Self) {
        let s = lerp(self.s[0], self.s[1], frac);
        let t = exact_t.unwrap_or_else(|| lerp(self.t[0], self.t[1], frac));
        let opacity = lerp_f32(self.opacity[0], self.opacity[1], frac as f32);
        (
            Self {
                s: [self.s[0], s],
                t: [self.t[0], t],
                opacity: [self.opacity[0], opacity],
            },
            Self {
                s: [s, self.s[1]],
                t: [t, self.t[1]],
                opacity: [opacity, self.opacity[1]],
            },
        )
    }

    /// Whether the color parameter increases along the span.
    pub fn is_forward(&self) -> bool {
        self.t[1] >= self.t[0]
    }

    /// The color parameter range, ordered.
    pub fn parameter_bounds(&self) -> [f64; 2] {
        [self.t[0].min(self.t[1]), self.t[0].max(self.t[1])]
    }
}
