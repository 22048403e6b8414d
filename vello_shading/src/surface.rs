// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The output side of blend decomposition.

use crate::kurbo::{Affine, BezPath, Point};
use crate::patch::TensorPatch;
use crate::peniko::Fill;
use crate::shading::DeviceColor;
use crate::Result;

/// A triangle vertex with the color at that vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct GouraudVertex {
    /// The device-space position.
    pub point: Point,
    /// The color, including opacity.
    pub color: DeviceColor,
}

/// A pull-based source of image rows.
pub trait ImageSource {
    /// The width of the image in pixels.
    fn width(&self) -> u32;
    /// The height of the image in pixels.
    fn height(&self) -> u32;
    /// The number of color components per pixel.
    fn components(&self) -> usize;
    /// The number of bits per component. Samples are packed big-endian without padding
    /// between pixels; each row starts on a byte boundary.
    fn bits_per_component(&self) -> u8;
    /// Produce the next row, from top to bottom, or `None` after the last row.
    fn next_row(&mut self) -> Option<&[u8]>;
}

/// Receives the primitives a blend is decomposed into.
///
/// All coordinates are in device space. Each method may fail, e.g. when the display list
/// runs out of memory, which aborts the shading operation.
pub trait SurfaceEmitter {
    /// Fill a path with a solid color.
    fn fill(&mut self, path: &BezPath, rule: Fill, color: &DeviceColor) -> Result<()>;
    /// Paint a Gouraud-shaded triangle.
    fn triangle(&mut self, vertices: &[GouraudVertex; 3]) -> Result<()>;
    /// Paint a tensor-product patch.
    fn tensor_patch(&mut self, patch: &TensorPatch) -> Result<()>;
    /// Paint an image; `transform` maps image space (one unit per pixel) to device space.
    fn image(&mut self, source: &mut dyn ImageSource, transform: Affine) -> Result<()>;
}

/// Individual primitives that can be recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Fill a path.
    Fill {
        /// The device-space path.
        path: BezPath,
        /// The fill rule.
        rule: Fill,
        /// The color.
        color: DeviceColor,
    },
    /// A Gouraud triangle.
    Triangle([GouraudVertex; 3]),
    /// A tensor-product patch.
    Patch(Box<TensorPatch>),
    /// An image, with all of its rows read eagerly.
    Image {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Components per pixel.
        components: usize,
        /// Bits per component.
        bits_per_component: u8,
        /// The packed rows.
        rows: Vec<Box<[u8]>>,
        /// The image to device transform.
        transform: Affine,
    },
}

/// A [`SurfaceEmitter`] which records every primitive.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Recording {
    /// Recorded commands.
    pub commands: Vec<RenderCommand>,
}

impl Recording {
    /// Create a new empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over the recorded fills.
    pub fn fills(&self) -> impl Iterator<Item = (&BezPath, Fill, &DeviceColor)> {
        self.commands.iter().filter_map(|cmd| match cmd {
            RenderCommand::Fill { path, rule, color } => Some((path, *rule, color)),
            _ => None,
        })
    }

    /// Iterate over the recorded triangles.
    pub fn triangles(&self) -> impl Iterator<Item = &[GouraudVertex; 3]> {
        self.commands.iter().filter_map(|cmd| match cmd {
            RenderCommand::Triangle(vertices) => Some(vertices),
            _ => None,
        })
    }

    /// Iterate over the recorded patches.
    pub fn patches(&self) -> impl Iterator<Item = &TensorPatch> {
        self.commands.iter().filter_map(|cmd| match cmd {
            RenderCommand::Patch(patch) => Some(&**patch),
            _ => None,
        })
    }
}

impl SurfaceEmitter for Recording {
    fn fill(&mut self, path: &BezPath, rule: Fill, color: &DeviceColor) -> Result<()> {
        self.commands.push(RenderCommand::Fill {
            path: path.clone(),
            rule,
            color: color.clone(),
        });
        Ok(())
    }

    fn triangle(&mut self, vertices: &[GouraudVertex; 3]) -> Result<()> {
        self.commands.push(RenderCommand::Triangle(vertices.clone()));
        Ok(())
    }

    fn tensor_patch(&mut self, patch: &TensorPatch) -> Result<()> {
        self.commands.push(RenderCommand::Patch(Box::new(patch.clone())));
        Ok(())
    }

    fn image(&mut self, source: &mut dyn ImageSource, transform: Affine) -> Result<()> {
        let mut rows = Vec::with_capacity(source.height() as usize);
        while let Some(row) = source.next_row() {
            rows.push(Box::from(row));
        }
        self.commands.push(RenderCommand::Image {
            width: source.width(),
            height: source.height(),
            components: source.components(),
            bits_per_component: source.bits_per_component(),
            rows,
            transform,
        });
        Ok(())
    }
}
