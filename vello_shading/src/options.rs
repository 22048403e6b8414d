// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration of blend decomposition.

/// How the body of an axial blend is decomposed.
///
/// Can be configured by setting [`BlendOptions::axial_strategy`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum AxialStrategy {
    /// Recursively subdivide the blend into pairs of Gouraud triangles.
    ///
    /// This is the default and handles translucent blends.
    #[default]
    Triangles,
    /// Render the blend as a synthetic image of pre-evaluated color steps.
    ///
    /// This is a lower fidelity mode, only used when both ends of the blend are opaque;
    /// otherwise [`AxialStrategy::Triangles`] is used instead.
    Image,
}

/// How the body of a radial blend is decomposed.
///
/// Can be configured by setting [`BlendOptions::radial_strategy`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RadialStrategy {
    /// Recursively subdivide the blend into tensor-product patches.
    #[default]
    Patches,
    /// Fill one contour per color step, as computed by the
    /// [`StepCalculator`](crate::steps::StepCalculator).
    Fills,
}

/// Parameters of the dithering noise used by synthetic blend images.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NoiseOptions {
    /// Whether antialiased devices get dithered images.
    pub enabled: bool,
    /// The smallest step, in device pixels, which is subdivided into noisy rows.
    pub min_step_pixels: f64,
    /// The maximum number of rows a single color step is divided into.
    pub max_subdivisions: u32,
    /// The maximum width of a dithered image, in pixels.
    pub max_width: u32,
    /// The seed of the pseudo-random sequence.
    pub seed: u32,
}

impl Default for NoiseOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            min_step_pixels: 2.0,
            max_subdivisions: 16,
            max_width: 256,
            seed: 0x5EED_B1E0,
        }
    }
}

/// Options which control how blends are decomposed.
///
/// These are owned by the caller and are the only state which outlives a shading operation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlendOptions {
    /// The decomposition used for axial blends.
    pub axial_strategy: AxialStrategy,
    /// The decomposition used for radial blends.
    pub radial_strategy: RadialStrategy,
    /// The number of sub-intervals used when testing whether colors vary linearly.
    ///
    /// `N - 1` interior points are compared against linear interpolation.
    pub linearity_fineness: u32,
    /// How many multiples of the minimum section count are added each time the
    /// [`StepCalculator`](crate::steps::StepCalculator) finds its samples non-linear.
    pub step_growth: u32,
    /// Leaves smaller than this, in device pixels, are not subdivided further even when
    /// their colors are not linear.
    pub min_leaf_pixels: f64,
    /// The maximum recursion depth of color-linearity bisection.
    pub max_depth: u32,
    /// Extra radius, in device pixels, given to radial extension shapes so that they overlap
    /// the adjoining blend body. Zero disables the adjustment.
    pub seam_overlap: f64,
    /// Dithering of synthetic images.
    pub noise: NoiseOptions,
}

impl Default for BlendOptions {
    fn default() -> Self {
        Self {
            axial_strategy: AxialStrategy::default(),
            radial_strategy: RadialStrategy::default(),
            linearity_fineness: 4,
            step_growth: 1,
            min_leaf_pixels: 1.0,
            max_depth: 24,
            seam_overlap: 0.0,
            noise: NoiseOptions::default(),
        }
    }
}

impl BlendOptions {
    /// Use the given axial strategy.
    pub fn with_axial_strategy(mut self, strategy: AxialStrategy) -> Self {
        self.axial_strategy = strategy;
        self
    }

    /// Use the given radial strategy.
    pub fn with_radial_strategy(mut self, strategy: RadialStrategy) -> Self {
        self.radial_strategy = strategy;
        self
    }

    /// Set the overlap between radial extensions and the blend body.
    pub fn with_seam_overlap(mut self, pixels: f64) -> Self {
        self.seam_overlap = pixels;
        self
    }
}
