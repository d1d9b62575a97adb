//! Radar (polar line) chart from long-format records.
//!
//! Variables become spokes, placed clockwise from 12 o'clock in order of first
//! appearance. Each distinct id becomes one closed line.

use std::f64::consts::{FRAC_PI_2, TAU};

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::colors::{AcneColors, Theme, parse_color, parse_palette};
use crate::error::{Result, VizError};
use crate::plots::{Canvas, Plot, stroke, text_style};

/// Headroom added above the maximum value.
pub const RANGE_HEADROOM: f64 = 1.01;
const MAX_GRID_LINES: usize = 1000;
const LINE_WIDTH: f64 = 2.0;

/// One row of long-format input: `(id?, variable, value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarRecord {
    pub id: Option<String>,
    pub variable: String,
    pub value: f64,
}

impl RadarRecord {
    pub fn new(variable: impl Into<String>, value: f64) -> Self {
        Self {
            id: None,
            variable: variable.into(),
            value,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarStyle {
    #[serde(default)]
    pub min_value: f64,
    /// Defaults to the largest value in the data.
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default = "RadarStyle::default_grid_interval")]
    pub grid_interval: f64,
    #[serde(default = "AcneColors::discrete_palette")]
    pub color_palette: Vec<String>,
    #[serde(default = "RadarStyle::default_background_color")]
    pub background_color: String,
    #[serde(default = "RadarStyle::default_grid_color")]
    pub grid_color: String,
    #[serde(default = "RadarStyle::default_label_color")]
    pub label_color: String,
    /// Variable label font size; 0 hides labels and the legend.
    #[serde(default = "RadarStyle::default_label_size")]
    pub label_size: f64,
    #[serde(default = "RadarStyle::default_tick_color")]
    pub tick_color: String,
    /// Tick label font size; 0 hides tick labels.
    #[serde(default = "RadarStyle::default_tick_size")]
    pub tick_size: f64,
    #[serde(default = "RadarStyle::default_height")]
    pub height: u32,
    /// Defaults to a 4:3 aspect ratio.
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub legend_title: Option<String>,
    /// When set, replaces background, grid, label and tick colors.
    #[serde(default)]
    pub theme: Option<Theme>,
}

impl RadarStyle {
    fn default_grid_interval() -> f64 {
        1.0
    }
    fn default_background_color() -> String {
        "white".to_string()
    }
    fn default_grid_color() -> String {
        "#ddd".to_string()
    }
    fn default_label_color() -> String {
        "black".to_string()
    }
    fn default_label_size() -> f64 {
        30.0
    }
    fn default_tick_color() -> String {
        "grey".to_string()
    }
    fn default_tick_size() -> f64 {
        24.0
    }
    fn default_height() -> u32 {
        1080
    }

    pub fn resolved_width(&self) -> u32 {
        self.width
            .unwrap_or_else(|| (self.height as f64 / 3.0 * 4.0).round() as u32)
    }
}

impl Default for RadarStyle {
    fn default() -> Self {
        Self {
            min_value: 0.0,
            max_value: None,
            grid_interval: Self::default_grid_interval(),
            color_palette: AcneColors::discrete_palette(),
            background_color: Self::default_background_color(),
            grid_color: Self::default_grid_color(),
            label_color: Self::default_label_color(),
            label_size: Self::default_label_size(),
            tick_color: Self::default_tick_color(),
            tick_size: Self::default_tick_size(),
            height: Self::default_height(),
            width: None,
            legend_title: None,
            theme: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarSeries {
    pub name: Option<String>,
    pub color: RGBAColor,
    /// One slot per variable; `None` where the group has no record.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialTick {
    pub value: f64,
    pub labelled: bool,
}

#[derive(Debug, Clone, Copy)]
struct RadarColors {
    background: RGBAColor,
    grid: RGBAColor,
    label: RGBAColor,
    tick: RGBAColor,
}

#[derive(Debug, Clone)]
pub struct Radar {
    style: RadarStyle,
    colors: RadarColors,
    variables: Vec<String>,
    series: Vec<RadarSeries>,
    range: (f64, f64),
    ticks: Vec<RadialTick>,
}

impl Radar {
    pub fn new(records: &[RadarRecord], style: RadarStyle) -> Result<Self> {
        if records.is_empty() {
            return Err(VizError::EmptyData("radar records"));
        }
        if let Some(bad) = records.iter().find(|r| !r.value.is_finite()) {
            return Err(VizError::InvalidValue(format!(
                "{} = {} is not finite",
                bad.variable, bad.value
            )));
        }

        let colors = match style.theme {
            Some(theme) => {
                let c = theme.colors();
                RadarColors {
                    background: parse_color(c.background)?,
                    grid: parse_color(c.grid)?,
                    label: parse_color(c.text)?,
                    tick: parse_color(c.annotation)?,
                }
            }
            None => RadarColors {
                background: parse_color(&style.background_color)?,
                grid: parse_color(&style.grid_color)?,
                label: parse_color(&style.label_color)?,
                tick: parse_color(&style.tick_color)?,
            },
        };
        let palette = parse_palette(&style.color_palette)?;

        let mut variables: Vec<String> = Vec::new();
        for record in records {
            if !variables.contains(&record.variable) {
                variables.push(record.variable.clone());
            }
        }

        let mut series: Vec<RadarSeries> = Vec::new();
        for record in records {
            let slot = match series.iter().position(|s| s.name == record.id) {
                Some(slot) => slot,
                None => {
                    series.push(RadarSeries {
                        name: record.id.clone(),
                        color: palette[series.len() % palette.len()],
                        values: vec![None; variables.len()],
                    });
                    series.len() - 1
                }
            };
            let var = variables
                .iter()
                .position(|v| *v == record.variable)
                .unwrap_or_default();
            series[slot].values[var] = Some(record.value);
        }

        let data_max = records.iter().map(|r| r.value).fold(f64::NEG_INFINITY, f64::max);
        let max_value = style.max_value.unwrap_or(data_max);
        let min_value = style.min_value;
        if !(max_value > min_value) {
            return Err(VizError::InvalidOption(format!(
                "max_value ({max_value}) must exceed min_value ({min_value})"
            )));
        }
        if !(style.grid_interval > 0.0) {
            return Err(VizError::InvalidOption(format!(
                "grid_interval must be positive, got {}",
                style.grid_interval
            )));
        }
        if style.height == 0 || style.resolved_width() == 0 {
            return Err(VizError::InvalidOption("radar size must be positive".into()));
        }

        let range = (min_value, max_value * RANGE_HEADROOM);
        let ticks = radial_ticks(range, style.grid_interval, max_value)?;

        debug!(
            variables = variables.len(),
            series = series.len(),
            ?range,
            "prepared radar"
        );

        Ok(Self {
            style,
            colors,
            variables,
            series,
            range,
            ticks,
        })
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn series(&self) -> &[RadarSeries] {
        &self.series
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn ticks(&self) -> &[RadialTick] {
        &self.ticks
    }

    pub fn style(&self) -> &RadarStyle {
        &self.style
    }

    /// Angle (radians, counter-clockwise from east) of the `k`-th spoke.
    pub fn spoke_angle(&self, k: usize) -> f64 {
        FRAC_PI_2 - TAU * k as f64 / self.variables.len() as f64
    }

    /// Fraction of the full radius at which `value` is drawn.
    pub fn radial_fraction(&self, value: f64) -> f64 {
        let (lo, hi) = self.range;
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    }

    /// Vertex of series `s` on spoke `k`, on the unit disk (y up).
    pub fn vertex(&self, s: usize, k: usize) -> Option<(f64, f64)> {
        let value = self.series.get(s)?.values.get(k).copied().flatten()?;
        let r = self.radial_fraction(value);
        let a = self.spoke_angle(k);
        Some((r * a.cos(), r * a.sin()))
    }

    fn has_legend(&self) -> bool {
        self.style.label_size > 0.0 && self.series.iter().any(|s| s.name.is_some())
    }
}

/// Grid values `min + k * interval` up to the top of `range`; every
/// `round(max_value)`-th one carries a label.
fn radial_ticks(range: (f64, f64), interval: f64, max_value: f64) -> Result<Vec<RadialTick>> {
    let (lo, hi) = range;
    let count = ((hi - lo) / interval + 1e-9).floor() as usize + 1;
    if count > MAX_GRID_LINES {
        return Err(VizError::InvalidOption(format!(
            "grid_interval {interval} yields {count} grid lines"
        )));
    }
    let label_step = (max_value.round() as usize).max(1);
    Ok((0..count)
        .map(|k| RadialTick {
            value: lo + k as f64 * interval,
            labelled: k % label_step == 0,
        })
        .collect())
}

impl Plot for Radar {
    fn title(&self) -> &str {
        "Radar"
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.style.resolved_width(), self.style.height)
    }

    fn background(&self) -> RGBAColor {
        self.colors.background
    }

    fn draw(&self, canvas: &Canvas<'_>, scale: f64) -> Result<()> {
        let (w, h) = canvas.dim_in_pixel();
        let (w, h) = (w as f64, h as f64);
        let plot_w = if self.has_legend() { w * 0.75 } else { w };
        let (cx, cy) = (plot_w / 2.0, h / 2.0);
        let side = plot_w.min(h);
        let label_margin = self.style.label_size * scale * 2.5 + 10.0 * scale;
        let radius = (side / 2.0 - label_margin).max(side * 0.1);
        let to_px = |(x, y): (f64, f64), r: f64| ((cx + x * r) as i32, (cy - y * r) as i32);

        let grid = ShapeStyle {
            color: self.colors.grid,
            filled: false,
            stroke_width: stroke(1.0, scale),
        };
        for tick in &self.ticks {
            let r = (self.radial_fraction(tick.value) * radius).round() as i32;
            if r > 0 {
                canvas
                    .draw(&Circle::new(to_px((0.0, 0.0), radius), r, grid))
                    .map_err(VizError::drawing)?;
            }
        }
        for k in 0..self.variables.len() {
            let a = self.spoke_angle(k);
            let outer = to_px((a.cos(), a.sin()), radius);
            canvas
                .draw(&PathElement::new(vec![to_px((0.0, 0.0), radius), outer], grid))
                .map_err(VizError::drawing)?;
        }

        for (s, series) in self.series.iter().enumerate() {
            let mut points: Vec<(i32, i32)> = (0..self.variables.len())
                .filter_map(|k| self.vertex(s, k))
                .map(|p| to_px(p, radius))
                .collect();
            let line = ShapeStyle {
                color: series.color,
                filled: false,
                stroke_width: stroke(LINE_WIDTH, scale),
            };
            match points.len() {
                0 => {}
                1 => {
                    let r = stroke(LINE_WIDTH * 2.0, scale) as i32;
                    canvas
                        .draw(&Circle::new(points[0], r, series.color.filled()))
                        .map_err(VizError::drawing)?;
                }
                _ => {
                    points.push(points[0]);
                    canvas
                        .draw(&PathElement::new(points, line))
                        .map_err(VizError::drawing)?;
                }
            }
        }

        if self.style.label_size > 0.0 {
            let font = text_style(
                self.style.label_size * scale,
                self.colors.label,
                HPos::Center,
                VPos::Center,
            );
            let offset = radius + self.style.label_size * scale * 1.2;
            for (k, name) in self.variables.iter().enumerate() {
                let a = self.spoke_angle(k);
                canvas
                    .draw(&Text::new(name.clone(), to_px((a.cos(), a.sin()), offset), font.clone()))
                    .map_err(VizError::drawing)?;
            }
        }

        if self.style.tick_size > 0.0 {
            let font = text_style(
                self.style.tick_size * scale,
                self.colors.tick,
                HPos::Left,
                VPos::Bottom,
            );
            for tick in self.ticks.iter().filter(|t| t.labelled) {
                let r = self.radial_fraction(tick.value) * radius;
                let pos = ((cx + 4.0 * scale) as i32, (cy - r) as i32);
                canvas
                    .draw(&Text::new(format!("{}", tick.value), pos, font.clone()))
                    .map_err(VizError::drawing)?;
            }
        }

        if self.has_legend() {
            self.draw_legend(canvas, scale, plot_w, h)?;
        }
        Ok(())
    }
}

impl Radar {
    fn draw_legend(&self, canvas: &Canvas<'_>, scale: f64, left: f64, h: f64) -> Result<()> {
        let font_size = self.style.label_size * 0.9 * scale;
        let row = font_size * 1.6;
        let rows = self.series.len() + usize::from(self.style.legend_title.is_some());
        let x0 = left + 10.0 * scale;
        let mut y = h / 2.0 - row * rows as f64 / 2.0 + row / 2.0;

        if let Some(title) = &self.style.legend_title {
            let font = text_style(font_size, self.colors.label, HPos::Left, VPos::Center);
            canvas
                .draw(&Text::new(title.clone(), (x0 as i32, y as i32), font))
                .map_err(VizError::drawing)?;
            y += row;
        }

        let font = text_style(font_size, self.colors.label, HPos::Left, VPos::Center);
        for series in &self.series {
            let swatch = ShapeStyle {
                color: series.color,
                filled: false,
                stroke_width: stroke(LINE_WIDTH, scale),
            };
            let (x, yy) = (x0 as i32, y as i32);
            canvas
                .draw(&PathElement::new(
                    vec![(x, yy), (x + (30.0 * scale) as i32, yy)],
                    swatch,
                ))
                .map_err(VizError::drawing)?;
            let name = series.name.clone().unwrap_or_default();
            canvas
                .draw(&Text::new(name, (x + (40.0 * scale) as i32, yy), font.clone()))
                .map_err(VizError::drawing)?;
            y += row;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn records() -> Vec<RadarRecord> {
        vec![
            RadarRecord::new("sleep", 4.0).with_id("a"),
            RadarRecord::new("stress", 6.0).with_id("a"),
            RadarRecord::new("diet", 2.0).with_id("a"),
            RadarRecord::new("sleep", 5.0).with_id("b"),
            RadarRecord::new("diet", 7.0).with_id("b"),
        ]
    }

    #[test]
    fn groups_and_variables_keep_first_appearance_order() {
        let radar = Radar::new(&records(), RadarStyle::default()).unwrap();
        assert_eq!(radar.variables(), ["sleep", "stress", "diet"]);
        let series = radar.series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name.as_deref(), Some("a"));
        assert_eq!(series[1].values, vec![Some(5.0), None, Some(7.0)]);
        assert_ne!(series[0].color, series[1].color);
    }

    #[test]
    fn range_defaults_to_data_max_with_headroom() {
        let radar = Radar::new(&records(), RadarStyle::default()).unwrap();
        let (lo, hi) = radar.range();
        assert_eq!(lo, 0.0);
        assert_abs_diff_eq!(hi, 7.07, epsilon = 1e-12);

        let ticks = radar.ticks();
        assert_eq!(ticks.len(), 8);
        let labelled: Vec<f64> = ticks.iter().filter(|t| t.labelled).map(|t| t.value).collect();
        assert_eq!(labelled, vec![0.0, 7.0]);
    }

    #[test]
    fn first_spoke_points_up_and_others_go_clockwise() {
        let radar = Radar::new(&records(), RadarStyle::default()).unwrap();
        let (x, y) = radar.vertex(1, 0).unwrap();
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 5.0 / 7.07, epsilon = 1e-12);

        let (x, _) = radar.vertex(0, 1).unwrap();
        assert!(x > 0.0, "second spoke should sit to the right");
        assert!(radar.vertex(1, 1).is_none());
    }

    #[test]
    fn bad_options_are_rejected() {
        assert!(matches!(
            Radar::new(&[], RadarStyle::default()),
            Err(VizError::EmptyData(_))
        ));
        let style = RadarStyle {
            grid_interval: 0.0,
            ..RadarStyle::default()
        };
        assert!(matches!(Radar::new(&records(), style), Err(VizError::InvalidOption(_))));
        let style = RadarStyle {
            min_value: 10.0,
            ..RadarStyle::default()
        };
        assert!(matches!(Radar::new(&records(), style), Err(VizError::InvalidOption(_))));
        let style = RadarStyle {
            grid_interval: 1e-6,
            ..RadarStyle::default()
        };
        assert!(Radar::new(&records(), style).is_err());
        let nan = [RadarRecord::new("x", f64::NAN)];
        assert!(matches!(
            Radar::new(&nan, RadarStyle::default()),
            Err(VizError::InvalidValue(_))
        ));
    }

    #[test]
    fn width_defaults_to_four_thirds_of_height() {
        let style = RadarStyle {
            height: 600,
            ..RadarStyle::default()
        };
        assert_eq!(style.resolved_width(), 800);
        let radar = Radar::new(&records(), style).unwrap();
        assert_eq!(radar.dimensions(), (800, 600));
    }
}
