use std::fs;
use std::path::PathBuf;

use acneviz::prelude::*;

fn unique_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "acneviz_network_render_{}_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        name
    ));
    path
}

fn matrix() -> CorrelationMatrix {
    CorrelationMatrix::new(
        vec!["x", "y", "z", "w"],
        vec![
            vec![1.0, 0.5, f64::NAN, f64::NAN],
            vec![0.5, 1.0, 0.2, f64::NAN],
            vec![f64::NAN, 0.2, 1.0, f64::NAN],
            vec![f64::NAN, f64::NAN, f64::NAN, 1.0],
        ],
    )
}

fn small_style() -> NetworkStyle {
    NetworkStyle {
        size: 160,
        label_size: 0.0,
        node_size_factor: 0.1,
        ..NetworkStyle::default()
    }
}

#[test]
fn render_draws_on_white_background() {
    let plot = CorrelationNetworkGraph::new(&matrix(), small_style()).unwrap();
    let img = plot.render(1.0).unwrap();
    assert_eq!(img.dimensions(), (160, 160));
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
    assert!(
        img.pixels().any(|p| p.0 != [255, 255, 255]),
        "edges and nodes should leave marks"
    );
}

#[test]
fn isolated_node_uses_fixed_marker() {
    let plot = CorrelationNetworkGraph::new(&matrix(), small_style()).unwrap();
    let lonely = &plot.nodes()[3];
    assert_eq!(lonely.label, "w");
    assert!(lonely.isolated);
    assert_eq!(lonely.diameter, acneviz::plots::network::ISOLATED_NODE_SIZE);
    assert_eq!(plot.edges().len(), 2);
}

#[test]
fn save_scales_and_writes_png() {
    let plot = CorrelationNetworkGraph::new(&matrix(), small_style()).unwrap();
    let path = unique_path("scaled.png");
    plot.save(&path, SaveOptions::default()).unwrap();

    let written = image::open(&path).unwrap();
    assert_eq!((written.width(), written.height()), (320, 320));
    let _ = fs::remove_file(&path);
}

#[test]
fn transparent_save_clears_background_only() {
    let plot = CorrelationNetworkGraph::new(&matrix(), small_style()).unwrap();
    let path = unique_path("transparent.png");
    plot.save(&path, SaveOptions::default().transparent().with_scale(1.0))
        .unwrap();

    let rgba = image::open(&path).unwrap().into_rgba8();
    assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
    assert!(rgba.pixels().any(|p| p.0[3] == 255));
    let _ = fs::remove_file(&path);
}

#[test]
fn non_png_path_is_rejected_before_writing() {
    let plot = CorrelationNetworkGraph::new(&matrix(), small_style()).unwrap();
    let path = unique_path("chart.svg");
    assert!(matches!(
        plot.save(&path, SaveOptions::default()),
        Err(VizError::UnsupportedFormat { .. })
    ));
    assert!(!path.exists());
}

#[test]
fn dark_theme_changes_background() {
    let style = NetworkStyle {
        theme: Some(Theme::Dark),
        ..small_style()
    };
    let img = CorrelationNetworkGraph::new(&matrix(), style)
        .unwrap()
        .render(1.0)
        .unwrap();
    assert_eq!(img.get_pixel(0, 0).0, [0x11, 0x11, 0x11]);
}

#[test]
fn invalid_matrix_fails_construction() {
    let signed = CorrelationMatrix::new(
        vec!["a", "b"],
        vec![vec![1.0, -0.4], vec![-0.4, 1.0]],
    );
    assert!(matches!(
        CorrelationNetworkGraph::new(&signed, small_style()),
        Err(VizError::NegativeValue { .. })
    ));
}

#[test]
fn transparent_save_keeps_node_fill_opaque() {
    let pair = CorrelationMatrix::new(
        vec!["a", "b"],
        vec![vec![1.0, 0.6], vec![0.6, 1.0]],
    );
    let style = NetworkStyle {
        size: 400,
        label_size: 0.0,
        ..NetworkStyle::default()
    };
    let plot = CorrelationNetworkGraph::new(&pair, style).unwrap();
    let path = unique_path("filled.png");
    plot.save(&path, SaveOptions::default().transparent().with_scale(1.0))
        .unwrap();

    let rgba = image::open(&path).unwrap().into_rgba8();
    // Node "a" sits at angle 0, to the right of the centre.
    let r = plot.layout_radius(400.0, 1.0);
    let inside = rgba.get_pixel((200.0 + r) as u32, 200);
    assert_eq!(inside.0, [255, 255, 255, 255], "node interior must stay opaque");
    assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
    let _ = fs::remove_file(&path);
}

#[test]
fn prelude_glob_keeps_std_result() -> Result<(), Box<dyn std::error::Error>> {
    let plot = CorrelationNetworkGraph::new(&matrix(), small_style())?;
    assert_eq!(plot.render(0.5)?.dimensions(), (80, 80));
    Ok(())
}
