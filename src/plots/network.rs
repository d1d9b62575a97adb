//! Correlation network chart: variables on a circle, correlations as edges.
//!
//! Edge width and opacity follow the absolute correlation; node size follows
//! the mean absolute correlation of the node's edges.

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::colors::{AcneColors, Theme, parse_color, with_opacity};
use crate::core::geometry::{circular_layout, clamp};
use crate::core::graph::CorrelationGraph;
use crate::core::matrix::CorrelationMatrix;
use crate::error::{Result, VizError};
use crate::plots::{Canvas, Plot, stroke, text_style};

/// Marker diameter (px) of a node whose mean correlation is 1.
pub const MAX_NODE_SIZE: f64 = 500.0;
/// Stroke width (px) of an edge with correlation 1.
pub const MAX_EDGE_WIDTH: f64 = 100.0;
/// Marker diameter (px) for nodes without edges.
pub const ISOLATED_NODE_SIZE: f64 = 24.0;
pub const NODE_OUTLINE_WIDTH: f64 = 5.0;
/// Smallest layout circle radius as a share of the canvas side.
const MIN_LAYOUT_SHARE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStyle {
    /// Width and height in pixels.
    #[serde(default = "NetworkStyle::default_size")]
    pub size: u32,
    /// Edge and node outline color.
    #[serde(default = "NetworkStyle::default_color")]
    pub color: String,
    #[serde(default = "NetworkStyle::default_background_color")]
    pub background_color: String,
    #[serde(default = "NetworkStyle::default_label_color")]
    pub label_color: String,
    /// Label font size; 0 hides labels.
    #[serde(default = "NetworkStyle::default_label_size")]
    pub label_size: f64,
    #[serde(default = "NetworkStyle::default_factor")]
    pub node_size_factor: f64,
    #[serde(default = "NetworkStyle::default_factor")]
    pub edge_width_factor: f64,
    #[serde(default = "NetworkStyle::default_factor")]
    pub opacity_factor: f64,
    /// When set, replaces the background and label colors.
    #[serde(default)]
    pub theme: Option<Theme>,
}

impl NetworkStyle {
    fn default_size() -> u32 {
        1080
    }
    fn default_color() -> String {
        AcneColors::DARK_SEA_GREEN.to_string()
    }
    fn default_background_color() -> String {
        "white".to_string()
    }
    fn default_label_color() -> String {
        "black".to_string()
    }
    fn default_label_size() -> f64 {
        20.0
    }
    fn default_factor() -> f64 {
        1.0
    }

    fn check(&self) -> Result<()> {
        if self.size == 0 {
            return Err(VizError::InvalidOption("network size must be positive".into()));
        }
        let factors = [
            ("label_size", self.label_size),
            ("node_size_factor", self.node_size_factor),
            ("edge_width_factor", self.edge_width_factor),
            ("opacity_factor", self.opacity_factor),
        ];
        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(VizError::InvalidOption(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for NetworkStyle {
    fn default() -> Self {
        Self {
            size: Self::default_size(),
            color: Self::default_color(),
            background_color: Self::default_background_color(),
            label_color: Self::default_label_color(),
            label_size: Self::default_label_size(),
            node_size_factor: Self::default_factor(),
            edge_width_factor: Self::default_factor(),
            opacity_factor: Self::default_factor(),
            theme: None,
        }
    }
}

/// Edge in layout coordinates (unit circle) with its unscaled stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSegment {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub width: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeMarker {
    pub label: String,
    pub center: (f64, f64),
    pub diameter: f64,
    pub isolated: bool,
}

#[derive(Debug, Clone)]
pub struct CorrelationNetworkGraph {
    style: NetworkStyle,
    edge_color: RGBAColor,
    background: RGBAColor,
    label_color: RGBAColor,
    graph: CorrelationGraph,
    edges: Vec<EdgeSegment>,
    nodes: Vec<NodeMarker>,
}

impl CorrelationNetworkGraph {
    pub fn new(matrix: &CorrelationMatrix, style: NetworkStyle) -> Result<Self> {
        style.check()?;
        let (background, label_color) = match style.theme {
            Some(theme) => {
                let colors = theme.colors();
                (parse_color(colors.background)?, parse_color(colors.text)?)
            }
            None => (
                parse_color(&style.background_color)?,
                parse_color(&style.label_color)?,
            ),
        };
        let edge_color = parse_color(&style.color)?;

        let graph = CorrelationGraph::from_matrix(matrix)?;
        let positions = circular_layout(graph.node_count());

        let edges = graph
            .edges()
            .into_iter()
            .map(|(a, b, weight)| EdgeSegment {
                from: positions[a],
                to: positions[b],
                width: weight.abs() * MAX_EDGE_WIDTH * style.edge_width_factor,
                opacity: clamp(weight.abs() * style.opacity_factor, 0.0, 1.0),
            })
            .collect();

        let mut nodes = Vec::with_capacity(graph.node_count());
        for (i, label) in graph.node_labels().into_iter().enumerate() {
            let (diameter, isolated) = match graph.avg_edge_weight(i) {
                Ok(avg) => (avg * MAX_NODE_SIZE * style.node_size_factor, false),
                Err(VizError::NoIncidentEdges(_)) => (ISOLATED_NODE_SIZE, true),
                Err(err) => return Err(err),
            };
            nodes.push(NodeMarker {
                label: label.to_string(),
                center: positions[i],
                diameter,
                isolated,
            });
        }

        debug!(
            nodes = nodes.len(),
            isolated = nodes.iter().filter(|n| n.isolated).count(),
            "prepared correlation network"
        );

        Ok(Self {
            style,
            edge_color,
            background,
            label_color,
            graph,
            edges,
            nodes,
        })
    }

    pub fn graph(&self) -> &CorrelationGraph {
        &self.graph
    }

    pub fn edges(&self) -> &[EdgeSegment] {
        &self.edges
    }

    pub fn nodes(&self) -> &[NodeMarker] {
        &self.nodes
    }

    pub fn style(&self) -> &NetworkStyle {
        &self.style
    }

    /// Factor (at most 1) applied to every marker diameter so that the largest
    /// marker, centred on a layout circle of at least a tenth of `side`, still
    /// fits inside a `side`-pixel canvas.
    pub fn marker_fit(&self, side: f64, scale: f64) -> f64 {
        let largest = self.largest_marker() * scale;
        if largest <= 0.0 {
            return 1.0;
        }
        let room = side / 2.0 - side * MIN_LAYOUT_SHARE - NODE_OUTLINE_WIDTH * scale;
        (2.0 * room / largest).clamp(0.0, 1.0)
    }

    /// Radius (px) of the layout circle on a `side`-pixel canvas, leaving room
    /// for the largest marker after [`marker_fit`](Self::marker_fit).
    pub fn layout_radius(&self, side: f64, scale: f64) -> f64 {
        let largest = self.largest_marker() * self.marker_fit(side, scale);
        let pad = (largest / 2.0 + NODE_OUTLINE_WIDTH) * scale;
        (side / 2.0 - pad).max(side * MIN_LAYOUT_SHARE)
    }

    fn largest_marker(&self) -> f64 {
        self.nodes.iter().map(|n| n.diameter).fold(0.0, f64::max)
    }
}

impl Plot for CorrelationNetworkGraph {
    fn title(&self) -> &str {
        "Correlation network"
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.style.size, self.style.size)
    }

    fn background(&self) -> RGBAColor {
        self.background
    }

    fn draw(&self, canvas: &Canvas<'_>, scale: f64) -> Result<()> {
        let (w, h) = canvas.dim_in_pixel();
        let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
        let side = w.min(h) as f64;
        let radius = self.layout_radius(side, scale);
        let fit = self.marker_fit(side, scale);
        let to_px = |(x, y): (f64, f64)| ((cx + x * radius) as i32, (cy - y * radius) as i32);

        for edge in &self.edges {
            let style = ShapeStyle {
                color: with_opacity(self.edge_color, edge.opacity),
                filled: false,
                stroke_width: stroke(edge.width, scale),
            };
            canvas
                .draw(&PathElement::new(vec![to_px(edge.from), to_px(edge.to)], style))
                .map_err(VizError::drawing)?;
        }

        let outline = ShapeStyle {
            color: self.edge_color,
            filled: false,
            stroke_width: stroke(NODE_OUTLINE_WIDTH, scale),
        };
        for node in &self.nodes {
            let center = to_px(node.center);
            let r = (node.diameter * fit * scale / 2.0).round() as i32;
            canvas
                .draw(&Circle::new(center, r, self.background.filled()))
                .map_err(VizError::drawing)?;
            canvas
                .draw(&Circle::new(center, r, outline))
                .map_err(VizError::drawing)?;
        }

        if self.style.label_size > 0.0 {
            let font = text_style(
                self.style.label_size * scale,
                self.label_color,
                HPos::Center,
                VPos::Center,
            );
            for node in &self.nodes {
                canvas
                    .draw(&Text::new(node.label.clone(), to_px(node.center), font.clone()))
                    .map_err(VizError::drawing)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> CorrelationMatrix {
        CorrelationMatrix::new(
            vec!["x", "y", "z"],
            vec![
                vec![1.0, 0.5, f64::NAN],
                vec![0.5, 1.0, 0.2],
                vec![f64::NAN, 0.2, 1.0],
            ],
        )
    }

    #[test]
    fn scene_scales_with_correlation() {
        let plot = CorrelationNetworkGraph::new(&triangle(), NetworkStyle::default()).unwrap();
        let edges = plot.edges();
        assert_eq!(edges.len(), 2);
        assert!((edges[0].width - 50.0).abs() < 1e-9);
        assert!((edges[0].opacity - 0.5).abs() < 1e-9);

        let mid = &plot.nodes()[1];
        assert_eq!(mid.label, "y");
        assert!((mid.diameter - 0.35 * MAX_NODE_SIZE).abs() < 1e-9);
    }

    #[test]
    fn opacity_is_clamped_and_factors_apply() {
        let style = NetworkStyle {
            opacity_factor: 5.0,
            edge_width_factor: 0.5,
            node_size_factor: 2.0,
            ..NetworkStyle::default()
        };
        let plot = CorrelationNetworkGraph::new(&triangle(), style).unwrap();
        assert_eq!(plot.edges()[0].opacity, 1.0);
        assert!((plot.edges()[0].width - 25.0).abs() < 1e-9);
        assert!((plot.nodes()[0].diameter - 500.0).abs() < 1e-9);
    }

    #[test]
    fn theme_overrides_colors_and_bad_colors_fail() {
        let style = NetworkStyle {
            theme: Some(Theme::Dark),
            ..NetworkStyle::default()
        };
        let plot = CorrelationNetworkGraph::new(&triangle(), style).unwrap();
        assert_eq!(plot.background(), RGBAColor(0x11, 0x11, 0x11, 1.0));

        let style = NetworkStyle {
            color: "not-a-color".into(),
            ..NetworkStyle::default()
        };
        assert!(matches!(
            CorrelationNetworkGraph::new(&triangle(), style),
            Err(VizError::InvalidColor(_))
        ));
    }

    #[test]
    fn layout_radius_leaves_room_for_markers() {
        let plot = CorrelationNetworkGraph::new(&triangle(), NetworkStyle::default()).unwrap();
        let largest = 0.5 * MAX_NODE_SIZE;
        let r = plot.layout_radius(1080.0, 1.0);
        assert!((r - (540.0 - largest / 2.0 - NODE_OUTLINE_WIDTH)).abs() < 1e-9);
        assert!(plot.layout_radius(100.0, 1.0) >= 10.0);
    }

    #[test]
    fn markers_shrink_to_fit_small_canvas() {
        let plot = CorrelationNetworkGraph::new(&triangle(), NetworkStyle::default()).unwrap();
        let largest = 0.5 * MAX_NODE_SIZE;
        assert_eq!(plot.marker_fit(1080.0, 1.0), 1.0);

        for (side, scale) in [(160.0, 1.0), (160.0, 2.0), (400.0, 2.0)] {
            let fit = plot.marker_fit(side, scale);
            assert!(fit < 1.0, "{side}px at x{scale} should shrink markers");
            let r = plot.layout_radius(side, scale);
            let extent = r + (largest * fit / 2.0 + NODE_OUTLINE_WIDTH) * scale;
            assert!(extent <= side / 2.0 + 1e-9, "marker overflows: {extent} > {}", side / 2.0);
        }
    }
}
