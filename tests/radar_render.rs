use std::fs;
use std::path::PathBuf;

use acneviz::prelude::*;

fn unique_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "acneviz_radar_render_{}_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        name
    ));
    path
}

fn records() -> Vec<RadarRecord> {
    let rows = [
        ("a", "sleep", 3.0),
        ("a", "stress", 1.0),
        ("a", "diet", 2.5),
        ("a", "sun", 2.0),
        ("b", "sleep", 1.5),
        ("b", "stress", 3.0),
        ("b", "diet", 1.0),
        ("b", "sun", 2.5),
    ];
    rows.iter()
        .map(|&(id, var, v)| RadarRecord::new(var, v).with_id(id))
        .collect()
}

fn quiet_style() -> RadarStyle {
    RadarStyle {
        height: 150,
        label_size: 0.0,
        tick_size: 0.0,
        ..RadarStyle::default()
    }
}

#[test]
fn render_uses_four_thirds_canvas() {
    let radar = Radar::new(&records(), quiet_style()).unwrap();
    let img = radar.render(1.0).unwrap();
    assert_eq!(img.dimensions(), (200, 150));
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);

    let first = radar.series()[0].color;
    let drawn = img
        .pixels()
        .any(|p| p.0 == [first.0, first.1, first.2]);
    assert!(drawn, "first series should be drawn in the first palette color");
}

#[test]
fn records_without_id_form_one_series() {
    let plain: Vec<RadarRecord> = records()
        .into_iter()
        .map(|r| RadarRecord::new(r.variable, r.value))
        .collect();
    let radar = Radar::new(&plain, quiet_style()).unwrap();
    assert_eq!(radar.series().len(), 1);
    assert!(radar.series()[0].name.is_none());
    // Later records overwrite earlier ones for the same variable.
    assert_eq!(radar.series()[0].values[0], Some(1.5));
}

#[test]
fn explicit_range_overrides_data() {
    let style = RadarStyle {
        max_value: Some(6.0),
        grid_interval: 2.0,
        ..quiet_style()
    };
    let radar = Radar::new(&records(), style).unwrap();
    let (lo, hi) = radar.range();
    assert_eq!(lo, 0.0);
    assert!((hi - 6.06).abs() < 1e-12);
    let values: Vec<f64> = radar.ticks().iter().map(|t| t.value).collect();
    assert_eq!(values, vec![0.0, 2.0, 4.0, 6.0]);
}

#[test]
fn theme_colors_take_precedence() {
    let style = RadarStyle {
        theme: Some(Theme::Dark),
        background_color: "red".into(),
        ..quiet_style()
    };
    let radar = Radar::new(&records(), style).unwrap();
    assert_eq!(radar.background(), plotters::style::RGBAColor(0x11, 0x11, 0x11, 1.0));
}

#[test]
fn save_rejects_other_formats_and_writes_png() {
    let radar = Radar::new(&records(), quiet_style()).unwrap();
    assert!(matches!(
        radar.save(unique_path("radar.jpeg"), SaveOptions::default()),
        Err(VizError::UnsupportedFormat { expected: "png", .. })
    ));

    let path = unique_path("radar.png");
    radar
        .save(&path, SaveOptions::default().with_scale(1.0).transparent())
        .unwrap();
    let rgba = image::open(&path).unwrap().into_rgba8();
    assert_eq!(rgba.dimensions(), (200, 150));
    assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
    let _ = fs::remove_file(&path);
}

#[test]
fn bad_palette_entry_fails() {
    let style = RadarStyle {
        color_palette: vec!["#12".into()],
        ..quiet_style()
    };
    assert!(matches!(
        Radar::new(&records(), style),
        Err(VizError::InvalidColor(_))
    ));
}
