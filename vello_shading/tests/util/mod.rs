// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions shared across different tests.

#![allow(dead_code, reason = "not every test uses every helper")]

use std::sync::atomic::AtomicBool;
use vello_shading::axial::{render_axial, AxialBlend};
use vello_shading::color::palette::css::{BLACK, WHITE};
use vello_shading::color::{AlphaColor, DynamicColor, Srgb};
use vello_shading::function::StopFunction;
use vello_shading::kurbo::{Affine, PathEl, Point, Rect};
use vello_shading::options::BlendOptions;
use vello_shading::peniko::ColorStop;
use vello_shading::radial::{render_radial, RadialBlend};
use vello_shading::shading::ShadingInfo;
use vello_shading::surface::Recording;
use vello_shading::{Error, ShadingContext};

pub(crate) fn stops(stops: &[(f32, AlphaColor<Srgb>)]) -> StopFunction {
    let stops: Vec<_> = stops
        .iter()
        .map(|(offset, color)| ColorStop {
            offset: *offset,
            color: DynamicColor::from_alpha_color(*color),
        })
        .collect();
    StopFunction::new(&stops).unwrap()
}

pub(crate) fn black_white() -> StopFunction {
    stops(&[(0.0, BLACK), (1.0, WHITE)])
}

/// Everything needed to render a blend, apart from the blend itself.
pub(crate) struct Harness {
    pub(crate) function: StopFunction,
    pub(crate) options: BlendOptions,
    pub(crate) transform: Affine,
    pub(crate) clip: Rect,
    pub(crate) antialias: bool,
    pub(crate) interrupt: AtomicBool,
}

impl Harness {
    pub(crate) fn new(function: StopFunction) -> Self {
        Self {
            function,
            options: BlendOptions::default(),
            transform: Affine::IDENTITY,
            clip: Rect::new(0.0, 0.0, 100.0, 100.0),
            antialias: false,
            interrupt: AtomicBool::new(false),
        }
    }

    fn info(&self) -> ShadingInfo<'_> {
        let mut info =
            ShadingInfo::new(&self.function, &self.interrupt).with_domain(self.function.domain());
        info.antialias = self.antialias;
        info
    }

    pub(crate) fn axial(&self, blend: &AxialBlend) -> Result<Recording, Error> {
        let info = self.info();
        let ctx = ShadingContext::new(&info, &self.options, self.transform, self.clip);
        let mut recording = Recording::new();
        render_axial(&ctx, blend, &mut recording)?;
        Ok(recording)
    }

    pub(crate) fn radial(&self, blend: &RadialBlend) -> Result<Recording, Error> {
        let info = self.info();
        let ctx = ShadingContext::new(&info, &self.options, self.transform, self.clip);
        let mut recording = Recording::new();
        render_radial(&ctx, blend, &mut recording)?;
        Ok(recording)
    }
}

/// The end points of every curve in a path.
pub(crate) fn curve_ends(elements: &[PathEl]) -> Vec<Point> {
    elements
        .iter()
        .filter_map(|el| match el {
            PathEl::CurveTo(_, _, p) => Some(*p),
            _ => None,
        })
        .collect()
}

pub(crate) fn has_lines(elements: &[PathEl]) -> bool {
    elements.iter().any(|el| matches!(el, PathEl::LineTo(_)))
}
