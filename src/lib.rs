//! Themed charts for correlation networks, radar profiles and 3D embeddings.
//!
//! ```no_run
//! use acneviz::prelude::*;
//!
//! let matrix = CorrelationMatrix::new(
//!     vec!["sleep", "stress", "diet"],
//!     vec![
//!         vec![1.0, 0.6, f64::NAN],
//!         vec![0.6, 1.0, 0.3],
//!         vec![f64::NAN, 0.3, 1.0],
//!     ],
//! );
//! let plot = CorrelationNetworkGraph::new(&matrix, NetworkStyle::default())?;
//! plot.save("network.png", SaveOptions::default())?;
//! # Ok::<(), acneviz::VizError>(())
//! ```

pub mod colors;
pub mod config;
pub mod core;
pub mod error;
pub mod plots;
pub mod ui;

pub use error::{Result, VizError};

pub mod prelude {
    pub use crate::colors::{AcneColors, Theme};
    pub use crate::config::VizConfig;
    pub use crate::core::graph::CorrelationGraph;
    pub use crate::core::matrix::CorrelationMatrix;
    pub use crate::error::VizError;
    pub use crate::plots::{
        CorrelationNetworkGraph, Embedding3D, EmbeddingPoint, EmbeddingStyle, GifOptions,
        NetworkStyle, Plot, Radar, RadarRecord, RadarStyle, SaveOptions,
    };
}
