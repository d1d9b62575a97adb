//! Rasterisation into memory and PNG/GIF file output.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, Rgba, RgbImage, RgbaImage};
use plotters::prelude::*;
use tracing::debug;

use crate::colors::opaque;
use crate::core::geometry::frame_delay_ms;
use crate::error::{Result, VizError};
use crate::plots::Canvas;

/// Fail with `UnsupportedFormat` unless `path` ends in `.{expected}`.
pub fn validate_extension(path: &Path, expected: &'static str) -> Result<()> {
    let ok = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected));
    if ok {
        Ok(())
    } else {
        Err(VizError::UnsupportedFormat {
            path: path.display().to_string(),
            expected,
        })
    }
}

pub fn validate_png(path: &Path) -> Result<()> {
    validate_extension(path, "png")
}

/// Pixel size of a plot of `dimensions` at `scale`.
pub fn scaled_dimensions(dimensions: (u32, u32), scale: f64) -> Result<(u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(VizError::InvalidOption(format!("scale must be positive, got {scale}")));
    }
    let w = (dimensions.0 as f64 * scale).round() as u32;
    let h = (dimensions.1 as f64 * scale).round() as u32;
    if w == 0 || h == 0 {
        return Err(VizError::InvalidOption(format!(
            "image would be empty ({w}x{h} px)"
        )));
    }
    Ok((w, h))
}

/// Fill a `width x height` RGB buffer with `background`, run `draw` on it and
/// return the finished image.
pub fn rasterize<F>(size: (u32, u32), background: RGBAColor, draw: F) -> Result<RgbImage>
where
    F: FnOnce(&Canvas<'_>) -> Result<()>,
{
    let (width, height) = size;
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&opaque(background)).map_err(VizError::drawing)?;
        draw(&root)?;
        root.present().map_err(VizError::drawing)?;
    }
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| VizError::Draw("raster buffer does not match image size".into()))
}

/// Recover an RGBA image from the same drawing rasterised over a black and a
/// white canvas. Canvas pixels differ by 255 between the two and become fully
/// transparent; anything drawn opaquely is identical in both and stays opaque,
/// whatever its color. Partial coverage yields partial alpha.
pub fn difference_matte(on_black: &RgbImage, on_white: &RgbImage) -> Result<RgbaImage> {
    if on_black.dimensions() != on_white.dimensions() {
        return Err(VizError::Draw(format!(
            "matte passes differ in size: {:?} vs {:?}",
            on_black.dimensions(),
            on_white.dimensions()
        )));
    }
    Ok(RgbaImage::from_fn(on_black.width(), on_black.height(), |x, y| {
        let black = on_black.get_pixel(x, y).0;
        let white = on_white.get_pixel(x, y).0;
        let spread: u32 = black
            .iter()
            .zip(white)
            .map(|(&b, w)| u32::from(w.saturating_sub(b)))
            .sum();
        let alpha = 255 - (spread / 3).min(255);
        if alpha == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        // Over black the composite is `color * alpha`.
        let unpremultiply = |b: u8| (u32::from(b) * 255 / alpha).min(255) as u8;
        Rgba([
            unpremultiply(black[0]),
            unpremultiply(black[1]),
            unpremultiply(black[2]),
            alpha as u8,
        ])
    }))
}

pub fn write_png(path: &Path, image: &DynamicImage) -> Result<()> {
    image.save_with_format(path, image::ImageFormat::Png)?;
    debug!(path = %path.display(), "wrote png");
    Ok(())
}

/// Encode `frames` in order as an endlessly looping GIF.
pub fn write_gif(path: &Path, frames: Vec<RgbImage>, fps: u32) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = GifEncoder::new_with_speed(file, 10);
    encoder.set_repeat(Repeat::Infinite)?;

    let delay = Delay::from_numer_denom_ms(frame_delay_ms(fps), 1);
    let n_frames = frames.len();
    for frame in frames {
        let rgba = DynamicImage::ImageRgb8(frame).into_rgba8();
        encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
    }
    debug!(path = %path.display(), frames = n_frames, "wrote gif");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(validate_png(Path::new("out/chart.PNG")).is_ok());
        assert!(matches!(
            validate_png(Path::new("chart.jpg")),
            Err(VizError::UnsupportedFormat { expected: "png", .. })
        ));
        assert!(validate_png(Path::new("chart")).is_err());
        assert!(validate_extension(Path::new("spin.gif"), "gif").is_ok());
    }

    #[test]
    fn scaling_rejects_non_positive_factors() {
        assert_eq!(scaled_dimensions((100, 50), 2.0).unwrap(), (200, 100));
        assert_eq!(scaled_dimensions((100, 50), 0.5).unwrap(), (50, 25));
        assert!(scaled_dimensions((100, 50), 0.0).is_err());
        assert!(scaled_dimensions((100, 50), f64::NAN).is_err());
        assert!(scaled_dimensions((1, 1), 0.1).is_err());
    }

    #[test]
    fn rasterize_fills_background() {
        let bg = RGBAColor(10, 20, 30, 1.0);
        let img = rasterize((8, 6), bg, |canvas| {
            canvas
                .draw_pixel((1, 1), &RED)
                .map_err(VizError::drawing)
        })
        .unwrap();
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0]);
    }

    fn draw_marks(canvas: &Canvas<'_>) -> Result<()> {
        canvas.draw_pixel((1, 1), &WHITE).map_err(VizError::drawing)?;
        canvas.draw_pixel((2, 1), &BLACK).map_err(VizError::drawing)?;
        canvas
            .draw_pixel((3, 1), &RED.mix(0.5))
            .map_err(VizError::drawing)
    }

    #[test]
    fn matte_keeps_opaque_marks_of_any_color() {
        let on_black = rasterize((5, 3), BLACK.to_rgba(), draw_marks).unwrap();
        let on_white = rasterize((5, 3), WHITE.to_rgba(), draw_marks).unwrap();
        let matte = difference_matte(&on_black, &on_white).unwrap();

        assert_eq!(matte.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(matte.get_pixel(1, 1).0, [255, 255, 255, 255]);
        assert_eq!(matte.get_pixel(2, 1).0, [0, 0, 0, 255]);
        let half = matte.get_pixel(3, 1).0;
        assert!((120..=135).contains(&half[3]), "alpha {}", half[3]);
        assert!(half[0] > 240 && half[1] < 10, "color {half:?}");
    }

    #[test]
    fn matte_rejects_mismatched_passes() {
        let a = RgbImage::new(2, 2);
        let b = RgbImage::new(3, 2);
        assert!(difference_matte(&a, &b).is_err());
    }
}
