//! 3D scatter of an embedding, with a rotating GIF export.

use std::path::Path;

use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::colors::{AcneColors, Theme, parse_color, parse_palette};
use crate::core::geometry::{
    AXIS_EXPANSION_FACTOR, CameraEye, axis_range, orbit_frame_count, orbit_frames,
};
use crate::error::{Result, VizError};
use crate::plots::{Canvas, Plot, export, stroke, text_style};

/// Marker diameter (px) of the largest point when sizes are given.
pub const SIZE_MAX: f64 = 20.0;
/// Marker diameter (px) when no sizes are given.
pub const DEFAULT_MARKER_SIZE: f64 = 6.0;
/// Upper bound on frames per GIF; ten times a full turn at the defaults.
pub const MAX_GIF_FRAMES: usize = 3600;
const GRID_LINES: usize = 6;
const PROJECTION_SCALE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub id: Option<String>,
    pub size: Option<f64>,
}

impl EmbeddingPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            id: None,
            size: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingStyle {
    /// Legend font size; 0 hides the legend.
    #[serde(default = "EmbeddingStyle::default_label_size")]
    pub label_size: f64,
    #[serde(default = "AcneColors::discrete_palette")]
    pub color_palette: Vec<String>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub legend_title: Option<String>,
    #[serde(default = "EmbeddingStyle::default_width")]
    pub width: u32,
    #[serde(default = "EmbeddingStyle::default_height")]
    pub height: u32,
    #[serde(default = "EmbeddingStyle::default_grid_width")]
    pub grid_width: f64,
}

impl EmbeddingStyle {
    fn default_label_size() -> f64 {
        30.0
    }
    fn default_width() -> u32 {
        1600
    }
    fn default_height() -> u32 {
        1200
    }
    fn default_grid_width() -> f64 {
        3.0
    }
}

impl Default for EmbeddingStyle {
    fn default() -> Self {
        Self {
            label_size: Self::default_label_size(),
            color_palette: AcneColors::discrete_palette(),
            dark_mode: false,
            legend_title: None,
            width: Self::default_width(),
            height: Self::default_height(),
            grid_width: Self::default_grid_width(),
        }
    }
}

/// Rotating-GIF export options. `speed` is in degrees per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GifOptions {
    #[serde(default = "GifOptions::default_fps")]
    pub fps: u32,
    #[serde(default = "GifOptions::default_speed")]
    pub speed: f64,
    #[serde(default = "GifOptions::default_scale")]
    pub scale: f64,
    #[serde(default = "GifOptions::default_progress")]
    pub progress: bool,
}

impl GifOptions {
    fn default_fps() -> u32 {
        30
    }
    fn default_speed() -> f64 {
        30.0
    }
    fn default_scale() -> f64 {
        2.0
    }
    fn default_progress() -> bool {
        true
    }

    fn check(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(VizError::InvalidOption("fps must be positive".into()));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(VizError::InvalidOption(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        let frames = orbit_frame_count(self.fps, self.speed);
        if frames > MAX_GIF_FRAMES {
            return Err(VizError::InvalidOption(format!(
                "{} fps at {} deg/s yields {frames} frames (max {MAX_GIF_FRAMES})",
                self.fps, self.speed
            )));
        }
        Ok(())
    }
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            fps: Self::default_fps(),
            speed: Self::default_speed(),
            scale: Self::default_scale(),
            progress: Self::default_progress(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: (f64, f64, f64),
    pub diameter: f64,
}

/// Points sharing one color and legend entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: Option<String>,
    pub color: RGBAColor,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone)]
pub struct Embedding3D {
    style: EmbeddingStyle,
    background: RGBAColor,
    grid: RGBAColor,
    label: RGBAColor,
    traces: Vec<Trace>,
    ranges: [(f64, f64); 3],
    camera: CameraEye,
}

impl Embedding3D {
    pub fn new(points: &[EmbeddingPoint], style: EmbeddingStyle) -> Result<Self> {
        if points.is_empty() {
            return Err(VizError::EmptyData("embedding points"));
        }
        if style.width == 0 || style.height == 0 {
            return Err(VizError::InvalidOption("embedding size must be positive".into()));
        }
        for p in points {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                return Err(VizError::InvalidValue(format!(
                    "point ({}, {}, {}) is not finite",
                    p.x, p.y, p.z
                )));
            }
            if let Some(size) = p.size.filter(|s| !s.is_finite() || *s < 0.0) {
                return Err(VizError::InvalidValue(format!("marker size {size} is invalid")));
            }
        }

        let theme = Theme::from_dark_mode(style.dark_mode).colors();
        let background = parse_color(theme.background)?;
        let grid = parse_color(theme.grid)?;
        let label = parse_color(theme.text)?;
        let palette = parse_palette(&style.color_palette)?;

        let max_size = points.iter().filter_map(|p| p.size).fold(0.0, f64::max);
        let diameter = |p: &EmbeddingPoint| match p.size {
            Some(s) if max_size > 0.0 => (SIZE_MAX * s / max_size).max(1.0),
            _ => DEFAULT_MARKER_SIZE,
        };

        let mut traces: Vec<Trace> = Vec::new();
        for p in points {
            let slot = match traces.iter().position(|t| t.name == p.id) {
                Some(slot) => slot,
                None => {
                    traces.push(Trace {
                        name: p.id.clone(),
                        color: palette[traces.len() % palette.len()],
                        markers: Vec::new(),
                    });
                    traces.len() - 1
                }
            };
            traces[slot].markers.push(Marker {
                position: (p.x, p.y, p.z),
                diameter: diameter(p),
            });
        }

        let ranges = [
            axis_range(points.iter().map(|p| p.x), AXIS_EXPANSION_FACTOR),
            axis_range(points.iter().map(|p| p.y), AXIS_EXPANSION_FACTOR),
            axis_range(points.iter().map(|p| p.z), AXIS_EXPANSION_FACTOR),
        ];
        debug!(points = points.len(), traces = traces.len(), ?ranges, "prepared embedding");

        Ok(Self {
            style,
            background,
            grid,
            label,
            traces,
            ranges,
            camera: CameraEye::DEFAULT,
        })
    }

    /// Add the other plot's traces on top of this one; axis ranges are kept.
    pub fn overlay(mut self, other: &Embedding3D) -> Self {
        self.traces.extend(other.traces.iter().cloned());
        self
    }

    pub fn with_camera(mut self, eye: CameraEye) -> Self {
        self.camera = eye;
        self
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Axis ranges for x, y and z.
    pub fn ranges(&self) -> [(f64, f64); 3] {
        self.ranges
    }

    pub fn camera(&self) -> CameraEye {
        self.camera
    }

    pub fn style(&self) -> &EmbeddingStyle {
        &self.style
    }

    /// Render one frame as seen from `eye`.
    pub fn render_with_camera(&self, scale: f64, eye: CameraEye) -> Result<RgbImage> {
        let size = export::scaled_dimensions(self.dimensions(), scale)?;
        export::rasterize(size, self.background, |canvas| {
            self.draw_with_camera(canvas, scale, eye)
        })
    }

    /// Write a looping GIF of one full turn around the Z axis.
    ///
    /// Frames are rendered in parallel and encoded in camera order; the first
    /// frame that fails aborts the export.
    pub fn save_gif(&self, path: impl AsRef<Path>, options: GifOptions) -> Result<()> {
        let path = path.as_ref();
        export::validate_extension(path, "gif")?;
        options.check()?;
        export::scaled_dimensions(self.dimensions(), options.scale)?;

        let eyes = orbit_frames(CameraEye::ORBIT_START, options.fps, options.speed);
        info!(frames = eyes.len(), fps = options.fps, path = %path.display(), "rendering gif");

        let frames = render_frames(&eyes, options.progress, |eye| {
            self.render_with_camera(options.scale, eye)
        })?;
        export::write_gif(path, frames, options.fps)
    }

    fn has_legend(&self) -> bool {
        self.style.label_size > 0.0 && self.traces.iter().any(|t| t.name.is_some())
    }

    fn draw_with_camera(&self, canvas: &Canvas<'_>, scale: f64, eye: CameraEye) -> Result<()> {
        let (w, _) = canvas.dim_in_pixel();
        let (chart_area, legend_area) = if self.has_legend() {
            let (chart, legend) = canvas.split_horizontally((w as f64 * 0.8) as u32);
            (chart, Some(legend))
        } else {
            (canvas.clone(), None)
        };

        let [xr, yr, zr] = self.ranges;
        // plotters puts its second axis up; data z is the vertical axis.
        let mut chart = ChartBuilder::on(&chart_area)
            .margin((20.0 * scale) as u32)
            .build_cartesian_3d(xr.0..xr.1, zr.0..zr.1, yr.0..yr.1)
            .map_err(VizError::drawing)?;
        let (yaw, pitch) = eye.projection_angles();
        chart.with_projection(|mut pb| {
            pb.yaw = yaw;
            pb.pitch = pitch;
            pb.scale = PROJECTION_SCALE;
            pb.into_matrix()
        });

        let grid = ShapeStyle {
            color: self.grid,
            filled: false,
            stroke_width: stroke(self.style.grid_width, scale),
        };
        chart
            .draw_series(
                grid_segments(self.ranges, GRID_LINES)
                    .into_iter()
                    .map(|[a, b]| PathElement::new(vec![to_chart(a), to_chart(b)], grid)),
            )
            .map_err(VizError::drawing)?;

        for trace in &self.traces {
            let fill = trace.color.filled();
            chart
                .draw_series(trace.markers.iter().map(|m| {
                    let r = ((m.diameter * scale) / 2.0).round().max(1.0) as i32;
                    Circle::new(to_chart(m.position), r, fill)
                }))
                .map_err(VizError::drawing)?;
        }

        if let Some(area) = legend_area {
            self.draw_legend(&area, scale)?;
        }
        Ok(())
    }

    fn draw_legend(&self, area: &Canvas<'_>, scale: f64) -> Result<()> {
        let (_, h) = area.dim_in_pixel();
        let font_size = self.style.label_size * 0.9 * scale;
        let font = text_style(font_size, self.label, HPos::Left, VPos::Center);
        let row = font_size * 1.6;
        let named: Vec<&Trace> = self.traces.iter().filter(|t| t.name.is_some()).collect();
        let rows = named.len() + usize::from(self.style.legend_title.is_some());
        let x0 = 10.0 * scale;
        let mut y = h as f64 / 2.0 - row * rows as f64 / 2.0 + row / 2.0;

        if let Some(title) = &self.style.legend_title {
            area.draw(&Text::new(title.clone(), (x0 as i32, y as i32), font.clone()))
                .map_err(VizError::drawing)?;
            y += row;
        }
        let r = (font_size / 3.0).max(1.0) as i32;
        for trace in named {
            let center = ((x0 + font_size / 2.0) as i32, y as i32);
            area.draw(&Circle::new(center, r, trace.color.filled()))
                .map_err(VizError::drawing)?;
            let name = trace.name.clone().unwrap_or_default();
            area.draw(&Text::new(name, ((x0 + font_size * 1.5) as i32, y as i32), font.clone()))
                .map_err(VizError::drawing)?;
            y += row;
        }
        Ok(())
    }
}

impl Plot for Embedding3D {
    fn title(&self) -> &str {
        "Embedding 3D"
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.style.width, self.style.height)
    }

    fn background(&self) -> RGBAColor {
        self.background
    }

    fn draw(&self, canvas: &Canvas<'_>, scale: f64) -> Result<()> {
        self.draw_with_camera(canvas, scale, self.camera)
    }
}

/// Render one frame per eye on the rayon pool, keeping camera order. The
/// first failing frame is returned as the error and no frames are kept.
fn render_frames<F>(eyes: &[CameraEye], show_progress: bool, render: F) -> Result<Vec<RgbImage>>
where
    F: Fn(CameraEye) -> Result<RgbImage> + Sync,
{
    let progress = if show_progress {
        ProgressBar::new(eyes.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({eta})")?
            .progress_chars("#>-"),
    );

    let frames = eyes
        .par_iter()
        .map(|&eye| {
            let frame = render(eye);
            progress.inc(1);
            frame
        })
        .collect::<Result<Vec<_>>>();
    progress.finish_and_clear();
    frames
}

/// Data `(x, y, z)` to plotters `(x, up, depth)`.
fn to_chart((x, y, z): (f64, f64, f64)) -> (f64, f64, f64) {
    (x, z, y)
}

/// Grid lines on the three back planes (`x = min`, `y = min`, `z = min`),
/// `n` lines per axis, in data coordinates.
pub fn grid_segments(ranges: [(f64, f64); 3], n: usize) -> Vec<[(f64, f64, f64); 2]> {
    let ticks = |(lo, hi): (f64, f64)| -> Vec<f64> {
        if n < 2 {
            return vec![lo];
        }
        (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect()
    };
    let [(x0, x1), (y0, y1), (z0, z1)] = ranges;
    let (xs, ys, zs) = (ticks(ranges[0]), ticks(ranges[1]), ticks(ranges[2]));

    let mut segments = Vec::with_capacity(6 * n);
    // floor: z = z0
    segments.extend(xs.iter().map(|&x| [(x, y0, z0), (x, y1, z0)]));
    segments.extend(ys.iter().map(|&y| [(x0, y, z0), (x1, y, z0)]));
    // wall: x = x0
    segments.extend(ys.iter().map(|&y| [(x0, y, z0), (x0, y, z1)]));
    segments.extend(zs.iter().map(|&z| [(x0, y0, z), (x0, y1, z)]));
    // wall: y = y0
    segments.extend(xs.iter().map(|&x| [(x, y0, z0), (x, y0, z1)]));
    segments.extend(zs.iter().map(|&z| [(x0, y0, z), (x1, y0, z)]));
    segments
}
