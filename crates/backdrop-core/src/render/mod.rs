//! Scene submission: projection helpers and the point-sprite renderer.

pub mod points;
pub mod transform;

pub use points::PointRenderer;
