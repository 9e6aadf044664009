//! Submit a scene to the surface as point-sprite batches.
//!
//! Packs every field into a reusable staging buffer, then issues
//! clear -> one draw per field -> present.

use backdrop_hal::{PointBatch, PointVertex, Surface};

use super::transform::to_cols;
use crate::error::SurfaceFault;
use crate::scene::Scene;

/// Point-sprite renderer. Owns only the staging buffer, so it survives
/// scene rebuilds.
#[derive(Default)]
pub struct PointRenderer {
    staging: Vec<PointVertex>,
}

impl PointRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one frame of `scene`.
    pub fn render<S: Surface>(&mut self, scene: &Scene, surface: &mut S) -> Result<(), SurfaceFault> {
        surface
            .clear(scene.background)
            .map_err(|e| SurfaceFault::new("clear", e))?;

        let view_projection = scene.camera.view_projection();
        for field in &scene.fields {
            field.write_vertices(&mut self.staging);
            let mvp = view_projection * field.model_matrix();
            let batch = PointBatch {
                vertices: &self.staging,
                model_view_projection: to_cols(&mvp),
                material: field.material,
            };
            surface
                .draw_points(&batch)
                .map_err(|e| SurfaceFault::new("draw_points", e))?;
        }

        surface.present().map_err(|e| SurfaceFault::new("present", e))
    }

    /// Drop the staging allocation.
    pub fn release(&mut self) {
        self.staging = Vec::new();
    }
}
