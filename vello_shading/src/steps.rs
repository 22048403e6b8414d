// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Computing the number of color steps a blend needs.

use crate::math::{gcd, lerp, lerp_f32};
use crate::options::BlendOptions;
use crate::shading::{ColorEvaluator, DeviceColor, ShadingInfo};
use crate::{Error, Result};

/// Upper bound on any step count, whatever the device resolution.
const STEP_LIMIT: u64 = 1 << 16;

/// Computes how many discrete color steps a blend over a parameter range needs.
///
/// The result satisfies three constraints at once:
/// - every discontinuity of the color functions falls on a step boundary,
/// - adjacent steps differ by no more than the shading's smoothness tolerance,
/// - there are never more steps than the device can resolve.
///
/// The last constraint always wins.
#[derive(Debug, Clone, Copy)]
pub struct StepCalculator<'a> {
    info: &'a ShadingInfo<'a>,
    options: &'a BlendOptions,
}

impl<'a> StepCalculator<'a> {
    /// Create a step calculator for a shading.
    pub fn new(info: &'a ShadingInfo<'a>, options: &'a BlendOptions) -> Self {
        Self { info, options }
    }

    /// The number of steps needed between `d0` and `d1`, where `min_step` is the parameter
    /// change corresponding to one device pixel.
    ///
    /// `d0` may be greater than `d1`. The result is at least 1, and is always a multiple
    /// of [`min_sections`](Self::min_sections) for the same range.
    pub fn compute_steps(&self, d0: f64, d1: f64, min_step: f64) -> Result<u32> {
        let (d0, d1) = if d0 <= d1 { (d0, d1) } else { (d1, d0) };
        let max_steps = self.max_steps(d0, d1, min_step)?;
        if max_steps == 0 {
            return Ok(1);
        }
        let min_sections = self.sections(d0, d1, max_steps)?;
        let growth = min_sections * u64::from(self.options.step_growth.max(1));
        let fineness = self.options.linearity_fineness.max(1);
        let smoothness = f64::from(self.info.smoothness.max(f32::EPSILON));
        let range = f64::from(self.info.colors.color_range().max(f32::EPSILON));

        let mut samples = min_sections;
        loop {
            if samples >= max_steps {
                break;
            }
            if let Some(difference) = self.max_pair_difference(d0, d1, samples, fineness)? {
                let factor = (f64::from(difference) / smoothness / range).ceil().max(1.0);
                let steps = samples.saturating_mul(factor as u64).min(max_steps);
                log::trace!("{steps} steps over [{d0}, {d1}], {samples} linear samples");
                return Ok(steps as u32);
            }
            samples += growth;
        }
        log::trace!("{max_steps} steps over [{d0}, {d1}], clamped to device resolution");
        Ok(max_steps as u32)
    }

    /// The smallest step count that puts a step boundary on every discontinuity between
    /// `d0` and `d1`.
    pub fn min_sections(&self, d0: f64, d1: f64, min_step: f64) -> Result<u32> {
        let (d0, d1) = if d0 <= d1 { (d0, d1) } else { (d1, d0) };
        let max_steps = self.max_steps(d0, d1, min_step)?;
        if max_steps == 0 {
            return Ok(1);
        }
        Ok(self.sections(d0, d1, max_steps)? as u32)
    }

    fn max_steps(&self, d0: f64, d1: f64, min_step: f64) -> Result<u64> {
        if d1 - d0 == 0.0 {
            return Ok(0);
        }
        if min_step.is_nan() || min_step <= 0.0 || !(d1 - d0).is_finite() {
            return Err(Error::InvalidGeometry("step size must be positive"));
        }
        Ok(((d1 - d0) / min_step).ceil().min(STEP_LIMIT as f64) as u64)
    }

    fn sections(&self, d0: f64, d1: f64, max_steps: u64) -> Result<u64> {
        // With `max_steps` equal steps, discontinuities are quantized to step indices.
        let step = (d1 - d0) / max_steps as f64;
        let mut divisor = max_steps;
        for index in 0..self.info.functions.function_count() {
            if divisor == 1 {
                break;
            }
            divisor = self.discontinuity_gcd(index, [d0, d1], d0, step, divisor)?;
        }
        Ok(max_steps / divisor)
    }

    /// Fold the step index of every discontinuity of function `index` inside `bounds` into
    /// the running divisor.
    fn discontinuity_gcd(
        &self,
        index: usize,
        bounds: [f64; 2],
        origin: f64,
        step: f64,
        divisor: u64,
    ) -> Result<u64> {
        self.info.check_interrupt()?;
        if divisor == 1 {
            return Ok(1);
        }
        let Some(found) = self.info.functions.find_discontinuity(index, bounds)? else {
            return Ok(divisor);
        };
        let location = found.location;
        if location.is_nan() || location <= bounds[0] || location >= bounds[1] {
            return Ok(divisor);
        }
        let k = ((location - origin) / step).round() as u64;
        let divisor = gcd(divisor, k);
        let divisor = self.discontinuity_gcd(index, [bounds[0], location], origin, step, divisor)?;
        self.discontinuity_gcd(index, [location, bounds[1]], origin, step, divisor)
    }

    /// The largest color difference between adjacent samples, or `None` if the colors
    /// between some pair of samples are not linear.
    fn max_pair_difference(
        &self,
        d0: f64,
        d1: f64,
        samples: u64,
        fineness: u32,
    ) -> Result<Option<f32>> {
        let colors = self.info.colors;
        let mut max_difference = 0.0_f32;
        for i in 0..samples {
            self.info.check_interrupt()?;
            let a = lerp(d0, d1, i as f64 / samples as f64);
            let b = if i + 1 == samples {
                d1
            } else {
                lerp(d0, d1, (i + 1) as f64 / samples as f64)
            };
            let ca = colors.evaluate(a, 1.0, true)?;
            let cb = colors.evaluate(b, 1.0, false)?;
            if !is_linear(colors, [a, b], [1.0, 1.0], [&ca, &cb], fineness)? {
                return Ok(None);
            }
            max_difference = max_difference.max(colors.max_component_difference(&ca, &cb));
        }
        Ok(Some(max_difference))
    }
}

/// Whether the colors between parameters `t[0]` and `t[1]` are close enough to the linear
/// interpolation of the end colors, checked at `fineness - 1` interior points.
pub(crate) fn is_linear(
    colors: &dyn ColorEvaluator,
    t: [f64; 2],
    opacity: [f32; 2],
    ends: [&DeviceColor; 2],
    fineness: u32,
) -> Result<bool> {
    let forward = t[1] >= t[0];
    for i in 1..fineness {
        let frac = f64::from(i) / f64::from(fineness);
        let actual = colors.evaluate(
            lerp(t[0], t[1], frac),
            lerp_f32(opacity[0], opacity[1], frac as f32),
            forward,
        )?;
        let expected = ends[0].lerp(ends[1], frac as f32);
        if !colors.close_enough(&actual, &expected) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::StepCalculator;
    use crate::color::palette::css::{BLACK, RED, WHITE};
    use crate::function::ramp as stops;
    use crate::options::BlendOptions;
    use crate::shading::{
        ColorEvaluator, DeviceColor, Discontinuity, DiscontinuityFinder, NeverInterrupt,
        ShadingInfo,
    };
    use crate::{Error, Result};
    use std::sync::atomic::AtomicBool;

    /// A gray ramp following `t²`, which is smooth but not linear.
    struct Quadratic;

    impl DiscontinuityFinder for Quadratic {
        fn function_count(&self) -> usize {
            1
        }

        fn find_discontinuity(&self, _: usize, _: [f64; 2]) -> Result<Option<Discontinuity>> {
            Ok(None)
        }
    }

    impl ColorEvaluator for Quadratic {
        fn components(&self) -> usize {
            1
        }

        fn evaluate(&self, t: f64, opacity: f32, _: bool) -> Result<DeviceColor> {
            Ok(DeviceColor::new([(t * t) as f32], opacity))
        }

        fn close_enough(&self, a: &DeviceColor, b: &DeviceColor) -> bool {
            self.max_component_difference(a, b) <= 1.0 / 256.0
        }

        fn max_component_difference(&self, a: &DeviceColor, b: &DeviceColor) -> f32 {
            (a.components[0] - b.components[0]).abs()
        }
    }

    #[test]
    fn linear_ramp_meets_smoothness() {
        let f = stops(&[(0.0, BLACK), (1.0, WHITE)]);
        let info = ShadingInfo::new(&f, &NeverInterrupt);
        let options = BlendOptions::default();
        let calc = StepCalculator::new(&info, &options);
        assert_eq!(calc.min_sections(0.0, 1.0, 1e-3).unwrap(), 1);
        assert_eq!(calc.compute_steps(0.0, 1.0, 1e-3).unwrap(), 256);
        // Reversed ranges are normalized.
        assert_eq!(calc.compute_steps(1.0, 0.0, 1e-3).unwrap(), 256);
    }

    #[test]
    fn device_resolution_wins() {
        let f = stops(&[(0.0, BLACK), (1.0, WHITE)]);
        let info = ShadingInfo::new(&f, &NeverInterrupt);
        let options = BlendOptions::default();
        let calc = StepCalculator::new(&info, &options);
        assert_eq!(calc.compute_steps(0.0, 1.0, 0.01).unwrap(), 100);
    }

    #[test]
    fn empty_range_has_one_step() {
        let f = stops(&[(0.0, BLACK), (1.0, WHITE)]);
        let info = ShadingInfo::new(&f, &NeverInterrupt);
        let options = BlendOptions::default();
        let calc = StepCalculator::new(&info, &options);
        assert_eq!(calc.compute_steps(0.5, 0.5, 0.01).unwrap(), 1);
        assert!(matches!(
            calc.compute_steps(0.0, 1.0, 0.0),
            Err(Error::InvalidGeometry(_))
        ));
    }

    #[test]
    fn steps_land_on_discontinuities() {
        let f = stops(&[(0.0, BLACK), (0.25, RED), (1.0, BLACK)]);
        let info = ShadingInfo::new(&f, &NeverInterrupt);
        let options = BlendOptions::default();
        let calc = StepCalculator::new(&info, &options);
        let min_sections = calc.min_sections(0.0, 1.0, 1e-4).unwrap();
        assert_eq!(min_sections, 4);
        let steps = calc.compute_steps(0.0, 1.0, 1e-4).unwrap();
        assert_eq!(steps % min_sections, 0);
        assert_eq!(steps, 1024);
    }

    #[test]
    fn step_count_is_multiple_of_sections() {
        let f = stops(&[(0.0, BLACK), (0.3, RED), (0.6, WHITE), (1.0, BLACK)]);
        let info = ShadingInfo::new(&f, &NeverInterrupt);
        let options = BlendOptions::default();
        let calc = StepCalculator::new(&info, &options);
        for min_step in [0.1, 0.013, 1e-3, 7e-4] {
            let sections = calc.min_sections(0.0, 1.0, min_step).unwrap();
            let steps = calc.compute_steps(0.0, 1.0, min_step).unwrap();
            assert!(steps >= 1);
            assert_eq!(steps % sections, 0, "{steps} steps, {sections} sections");
        }
    }

    #[test]
    fn non_linear_colors_grow_samples() {
        let f = Quadratic;
        let info = ShadingInfo::new(&f, &NeverInterrupt);
        let options = BlendOptions::default();
        let calc = StepCalculator::new(&info, &options);
        let steps = calc.compute_steps(0.0, 1.0, 1e-3).unwrap();
        assert!((400..=1000).contains(&steps), "{steps}");
        assert_eq!(calc.compute_steps(0.0, 1.0, 1e-3).unwrap(), steps);
    }

    #[test]
    fn interrupt_aborts() {
        let f = stops(&[(0.0, BLACK), (0.5, RED), (1.0, WHITE)]);
        let flag = AtomicBool::new(true);
        let info = ShadingInfo::new(&f, &flag);
        let options = BlendOptions::default();
        let calc = StepCalculator::new(&info, &options);
        assert_eq!(calc.compute_steps(0.0, 1.0, 1e-3), Err(Error::Interrupted));
    }
}
