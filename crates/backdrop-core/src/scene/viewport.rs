//! Viewport adapter: keeps projection and drawing buffer in step with the surface size.

use backdrop_hal::Surface;

use super::Scene;
use crate::error::SurfaceFault;

/// Pixel-density ceiling that bounds fill cost on high-density displays.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Width over height. A zero dimension is treated as one pixel.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Pixel ratio to render at: the device ratio clamped to `max`, or 1.0 when
/// the scene does not opt into high-density rendering.
pub fn effective_pixel_ratio(device_pixel_ratio: f32, max: Option<f32>) -> f32 {
    match max {
        Some(max) if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 => {
            device_pixel_ratio.min(max)
        }
        _ => 1.0,
    }
}

/// Apply a new surface size: aspect, projection, then drawing buffer.
pub fn on_resize<S: Surface>(
    scene: &mut Scene,
    surface: &mut S,
    width: u32,
    height: u32,
    device_pixel_ratio: f32,
) -> Result<(), SurfaceFault> {
    scene.camera.aspect = aspect_ratio(width, height);
    scene.camera.update_projection();

    let ratio = effective_pixel_ratio(device_pixel_ratio, scene.max_pixel_ratio);
    surface
        .set_viewport(width, height, ratio)
        .map_err(|e| SurfaceFault::new("set_viewport", e))?;
    scene.viewport = (width, height, ratio);
    Ok(())
}
