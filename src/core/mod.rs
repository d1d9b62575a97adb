pub mod geometry;
pub mod graph;
pub mod matrix;
