use egui::{CentralPanel, ColorImage, Image, TextureHandle, TextureOptions};
use image::RgbImage;
use tracing::info;

use crate::error::{Result, VizError};

/// Largest initial window edge; bigger charts are shrunk to fit.
const MAX_WINDOW_EDGE: f32 = 1200.0;

struct ChartViewer {
    image: ColorImage,
    texture: Option<TextureHandle>,
}

impl eframe::App for ChartViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let texture = self.texture.get_or_insert_with(|| {
            ctx.load_texture("chart", self.image.clone(), TextureOptions::LINEAR)
        });
        CentralPanel::default().show(ctx, |ui| {
            ui.add(Image::new((texture.id(), texture.size_vec2())).shrink_to_fit());
        });
    }
}

/// Block on a native window displaying `image` until the user closes it.
pub fn show_image(title: &str, image: &RgbImage) -> Result<()> {
    let (w, h) = (image.width() as f32, image.height() as f32);
    let fit = (MAX_WINDOW_EDGE / w.max(h)).min(1.0);
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size([w * fit, h * fit]),
        ..Default::default()
    };

    let pixels = ColorImage::from_rgb(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    );
    info!(title, width = image.width(), height = image.height(), "opening viewer");

    eframe::run_native(
        title,
        native_options,
        Box::new(|_cc| {
            Ok(Box::new(ChartViewer {
                image: pixels,
                texture: None,
            }))
        }),
    )
    .map_err(|err| VizError::Display(err.to_string()))
}
