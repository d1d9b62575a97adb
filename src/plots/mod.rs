//! Chart types and the capability trait they share.

pub mod embedding;
pub mod export;
pub mod network;
pub mod radar;

use std::path::Path;

use image::{DynamicImage, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::ui::viewer;

pub use embedding::{Embedding3D, EmbeddingPoint, EmbeddingStyle, GifOptions};
pub use network::{CorrelationNetworkGraph, NetworkStyle};
pub use radar::{Radar, RadarRecord, RadarStyle};

/// Drawing surface handed to [`Plot::draw`], in pixel coordinates.
pub type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Raster export options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaveOptions {
    #[serde(default)]
    pub transparent_background: bool,
    #[serde(default = "SaveOptions::default_scale")]
    pub scale: f64,
}

impl SaveOptions {
    fn default_scale() -> f64 {
        2.0
    }

    pub fn transparent(mut self) -> Self {
        self.transparent_background = true;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            transparent_background: false,
            scale: Self::default_scale(),
        }
    }
}

/// Something that can be drawn, displayed and exported.
pub trait Plot {
    /// Window title used by [`show`](Plot::show).
    fn title(&self) -> &str;

    /// Size in pixels at scale 1.
    fn dimensions(&self) -> (u32, u32);

    fn background(&self) -> RGBAColor;

    /// Draw onto a canvas already filled with the background. Every length
    /// (strokes, markers, fonts) is multiplied by `scale`.
    fn draw(&self, canvas: &Canvas<'_>, scale: f64) -> Result<()>;

    fn render(&self, scale: f64) -> Result<RgbImage> {
        let size = export::scaled_dimensions(self.dimensions(), scale)?;
        export::rasterize(size, self.background(), |canvas| self.draw(canvas, scale))
    }

    /// Open a window with the rendered chart; blocks until it is closed.
    fn show(&self) -> Result<&Self>
    where
        Self: Sized,
    {
        let image = self.render(1.0)?;
        viewer::show_image(self.title(), &image)?;
        Ok(self)
    }

    /// Write a PNG. Only the `.png` extension is accepted.
    ///
    /// A transparent background drops the canvas fill only; marks drawn in the
    /// background color (such as node fills) stay opaque.
    fn save(&self, path: impl AsRef<Path>, options: SaveOptions) -> Result<()>
    where
        Self: Sized,
    {
        let path = path.as_ref();
        export::validate_png(path)?;

        let image = if options.transparent_background {
            let size = export::scaled_dimensions(self.dimensions(), options.scale)?;
            let on_black = export::rasterize(size, BLACK.to_rgba(), |canvas| {
                self.draw(canvas, options.scale)
            })?;
            let on_white = export::rasterize(size, WHITE.to_rgba(), |canvas| {
                self.draw(canvas, options.scale)
            })?;
            DynamicImage::ImageRgba8(export::difference_matte(&on_black, &on_white)?)
        } else {
            DynamicImage::ImageRgb8(self.render(options.scale)?)
        };
        export::write_png(path, &image)?;
        info!(
            path = %path.display(),
            transparent = options.transparent_background,
            scale = options.scale,
            "saved {}",
            self.title()
        );
        Ok(())
    }
}

/// Text style in pixels, `size` already scaled.
pub(crate) fn text_style(size: f64, color: RGBAColor, h: HPos, v: VPos) -> TextStyle<'static> {
    ("sans-serif", size)
        .into_font()
        .color(&color)
        .pos(Pos::new(h, v))
}

/// Scaled stroke width, never thinner than one pixel.
pub(crate) fn stroke(width: f64, scale: f64) -> u32 {
    (width * scale).round().max(1.0) as u32
}
