//! Color helpers: hex unpacking and typing-driven hue cycling.

use glam::Vec3;

/// Unpack a 0xRRGGBB value into linear 0.0-1.0 channels.
pub fn rgb_from_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    )
}

/// Fully saturated color at 50% lightness for a hue in degrees.
///
/// Equivalent to `hsl(hue, 100%, 50%)`; hues outside 0..360 wrap.
pub fn hue_to_rgb(hue_deg: f32) -> Vec3 {
    let h = (hue_deg / 360.0).rem_euclid(1.0);
    let r = (h * 6.0 - 3.0).abs() - 1.0;
    let g = 2.0 - (h * 6.0 - 2.0).abs();
    let b = 2.0 - (h * 6.0 - 4.0).abs();
    Vec3::new(r, g, b).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Hue in degrees for a color phase: `360 * (0.5 * sin(phase) + 0.5)`.
pub fn phase_hue(phase: f32) -> f32 {
    (phase.sin() * 0.5 + 0.5) * 360.0
}

/// Background clear color as RGBA.
pub fn rgba_from_hex(hex: u32, alpha: f32) -> [f32; 4] {
    let c = rgb_from_hex(hex);
    [c.x, c.y, c.z, alpha]
}
