//! Error type shared by matrix validation, graph building and rendering.

use std::fmt::Display;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VizError>;

#[derive(Debug, Error)]
pub enum VizError {
    #[error("correlation matrix must be square with identical row and column labels: {0}")]
    InvalidShape(String),

    #[error("correlation matrix must be symmetric: {row} / {col} differs from its mirror")]
    NotSymmetric { row: String, col: String },

    #[error("correlation matrix must have 1 on the diagonal: {label} has {value}")]
    BadDiagonal { label: String, value: f64 },

    #[error("correlation matrix must be non-negative: {row} / {col} is {value}")]
    NegativeValue { row: String, col: String, value: f64 },

    #[error("node {0} has no incident edges")]
    NoIncidentEdges(String),

    #[error("unsupported file format for {path}: expected .{expected}")]
    UnsupportedFormat { path: String, expected: &'static str },

    #[error("invalid color {0:?}")]
    InvalidColor(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no data to plot: {0}")]
    EmptyData(&'static str),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Progress(#[from] indicatif::style::TemplateError),

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("viewer window failed: {0}")]
    Display(String),
}

impl VizError {
    /// Wraps a plotters backend error, whose type is generic over the backend.
    pub(crate) fn drawing(err: impl Display) -> Self {
        Self::Draw(err.to_string())
    }
}
