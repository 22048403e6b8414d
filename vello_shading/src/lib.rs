// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate decomposes axial (linear) and radial shading blends into primitives that a
//! rasterizer can paint directly: Gouraud triangles, tensor-product patches, filled contours
//! and synthetic images.
//!
//! # Usage
//!
//! A blend is described by its geometry ([`axial::AxialBlend`] or [`radial::RadialBlend`]),
//! and rendered against a [`ShadingContext`], which bundles the caller's
//! [`ShadingInfo`](shading::ShadingInfo), the [`BlendOptions`](options::BlendOptions), the
//! shading-to-device transform and the device clip. Every primitive is handed to a
//! [`SurfaceEmitter`](surface::SurfaceEmitter); [`Recording`](surface::Recording) is a simple
//! emitter which stores the commands.
//!
//! The color function itself is a black box: the engine only needs to evaluate colors
//! ([`ColorEvaluator`](shading::ColorEvaluator)) and to locate points where the function is
//! not smooth ([`DiscontinuityFinder`](shading::DiscontinuityFinder)).
//! [`StopFunction`](function::StopFunction) implements both for a list of color stops.
//!
//! # Contents
//!
//! - [`steps`]: how many color steps a blend needs, given color linearity and device resolution.
//! - [`arc`]: cubic Bezier approximations of circular arcs, and blend extension contours.
//! - [`axial`] and [`radial`]: the two blend renderers.
//! - [`image`]: the synthetic-image fallback for axial blends.
// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod arc;
pub mod axial;
pub(crate) mod decompose;
pub mod function;
pub mod image;
pub mod math;
pub mod options;
pub mod patch;
pub mod radial;
pub mod shading;
pub mod steps;
pub mod surface;

pub use peniko;
pub use peniko::color;
pub use peniko::kurbo;

pub use shading::ShadingContext;

use thiserror::Error;

/// Errors that can occur while decomposing a blend.
///
/// Every error is fatal to the shading operation that produced it. Primitives which were
/// emitted before the error was detected are not withdrawn.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A temporary buffer could not be allocated.
    #[error("Out of memory while allocating {0}")]
    OutOfMemory(&'static str),
    /// The blend geometry can't be rendered, e.g. a negative radius or a transform which
    /// can't be inverted.
    #[error("Invalid blend geometry: {0}")]
    InvalidGeometry(&'static str),
    /// The tangent lines of a radial extension didn't intersect where they must.
    #[error("Degenerate tangent construction (determinant {determinant})")]
    InternalGeometryFailure {
        /// The determinant of the tangent line system.
        determinant: f64,
    },
    /// The caller's interrupt flag was raised.
    #[error("Shading was interrupted")]
    Interrupted,
    /// The color evaluator or discontinuity finder reported a failure.
    #[error("Color evaluation failed: {0}")]
    EvaluationFailure(String),
}

/// The result type used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Report a failed shading operation through the log, then hand the result back.
pub(crate) fn report<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        log::warn!("{operation} failed: {err}");
    }
    result
}
