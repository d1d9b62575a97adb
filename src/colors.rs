//! Named colors, the discrete palette and light/dark themes.
//!
//! Colors are carried around as CSS strings in styles and configs, then
//! parsed once into plotters colors when a plot is constructed.

use plotters::style::{RGBAColor, RGBColor};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VizError};

/// Brand colors (names from coolors.co).
pub struct AcneColors;

impl AcneColors {
    pub const PEARLY_PURPLE: &'static str = "#B2619E";
    pub const DARK_SEA_GREEN: &'static str = "#79C188";
    pub const MUSTARD: &'static str = "#FDD54D";
    pub const ROYAL_PURPLE: &'static str = "#6E589C";
    pub const SKY_BLUE: &'static str = "#61CAEB";
    pub const ROSE_MADDER: &'static str = "#EA142E";
    pub const SPANISH_BLUE: &'static str = "#0271B1";
    pub const ORCHID_PINK: &'static str = "#F6C6D5";

    /// Ordered palette assigned cyclically to categorical groups.
    pub const DISCRETE_PALETTE: [&'static str; 8] = [
        Self::DARK_SEA_GREEN,
        Self::PEARLY_PURPLE,
        Self::SKY_BLUE,
        Self::MUSTARD,
        Self::ROYAL_PURPLE,
        Self::ROSE_MADDER,
        Self::SPANISH_BLUE,
        Self::ORCHID_PINK,
    ];

    pub fn discrete_palette() -> Vec<String> {
        Self::DISCRETE_PALETTE.iter().map(|c| c.to_string()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Background, text, annotation and grid colors of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub background: &'static str,
    pub text: &'static str,
    pub annotation: &'static str,
    pub grid: &'static str,
}

impl Theme {
    const LIGHT: ThemeColors = ThemeColors {
        background: "#FFFFFF",
        text: "#000000",
        annotation: "#808080",
        grid: "#DDDDDD",
    };

    const DARK: ThemeColors = ThemeColors {
        background: "#111111",
        text: "#FFFFFF",
        annotation: "#AAAAAA",
        grid: "#444444",
    };

    pub fn from_dark_mode(dark_mode: bool) -> Self {
        if dark_mode { Self::Dark } else { Self::Light }
    }

    pub fn colors(self) -> ThemeColors {
        match self {
            Self::Light => Self::LIGHT,
            Self::Dark => Self::DARK,
        }
    }
}

/// Parse a CSS-like color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
/// `rgba(r, g, b, a)` or one of a handful of names.
pub fn parse_color(input: &str) -> Result<RGBAColor> {
    let s = input.trim().to_ascii_lowercase();
    let invalid = || VizError::InvalidColor(input.to_string());

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(invalid);
    }
    if let Some(body) = s.strip_prefix("rgba(").and_then(|b| b.strip_suffix(')')) {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(invalid());
        }
        let (r, g, b) = parse_channels(&parts[..3]).ok_or_else(invalid)?;
        let a: f64 = parts[3].parse().map_err(|_| invalid())?;
        if !(0.0..=1.0).contains(&a) {
            return Err(invalid());
        }
        return Ok(RGBAColor(r, g, b, a));
    }
    if let Some(body) = s.strip_prefix("rgb(").and_then(|b| b.strip_suffix(')')) {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        let (r, g, b) = parse_channels(&parts).ok_or_else(invalid)?;
        return Ok(RGBAColor(r, g, b, 1.0));
    }

    let named = match s.as_str() {
        "white" => RGBAColor(255, 255, 255, 1.0),
        "black" => RGBAColor(0, 0, 0, 1.0),
        "grey" | "gray" => RGBAColor(128, 128, 128, 1.0),
        "lightgrey" | "lightgray" => RGBAColor(211, 211, 211, 1.0),
        "darkgrey" | "darkgray" => RGBAColor(169, 169, 169, 1.0),
        "red" => RGBAColor(255, 0, 0, 1.0),
        "green" => RGBAColor(0, 128, 0, 1.0),
        "blue" => RGBAColor(0, 0, 255, 1.0),
        "yellow" => RGBAColor(255, 255, 0, 1.0),
        "orange" => RGBAColor(255, 165, 0, 1.0),
        "purple" => RGBAColor(128, 0, 128, 1.0),
        "transparent" => RGBAColor(0, 0, 0, 0.0),
        _ => return Err(invalid()),
    };
    Ok(named)
}

fn parse_hex(hex: &str) -> Option<RGBAColor> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let nib = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(RGBAColor(nib(0)?, nib(1)?, nib(2)?, 1.0))
        }
        6 => Some(RGBAColor(byte(0)?, byte(2)?, byte(4)?, 1.0)),
        8 => Some(RGBAColor(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)? as f64 / 255.0,
        )),
        _ => None,
    }
}

fn parse_channels(parts: &[&str]) -> Option<(u8, u8, u8)> {
    let channel = |s: &str| s.parse::<u8>().ok();
    Some((channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
}

/// Parse every entry of a palette; an empty palette is rejected.
pub fn parse_palette(palette: &[String]) -> Result<Vec<RGBAColor>> {
    if palette.is_empty() {
        return Err(VizError::InvalidOption("color palette is empty".into()));
    }
    palette.iter().map(|c| parse_color(c)).collect()
}

/// Drop the alpha channel; used for canvas fills, which must be opaque.
pub fn opaque(color: RGBAColor) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Same color with its alpha multiplied by `opacity`.
pub fn with_opacity(color: RGBAColor, opacity: f64) -> RGBAColor {
    RGBAColor(color.0, color.1, color.2, color.3 * opacity.clamp(0.0, 1.0))
}
