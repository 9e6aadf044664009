//! View/projection transforms and clip-to-screen mapping.

use glam::{Mat4, Vec3, Vec4};

/// A point after projection, in drawing-buffer pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Depth normalized to 0.0 (near) .. 1.0 (far).
    pub z: f32,
    /// Clip-space W, i.e. distance along the view axis. Used for size attenuation.
    pub w: f32,
}

/// Transform an object-space point by `mvp`, perform the perspective divide
/// and map it onto a `width` x `height` pixel buffer.
///
/// Returns `None` for points behind the camera or outside the clip volume.
pub fn project_point(position: Vec3, mvp: &Mat4, width: u32, height: u32) -> Option<ScreenPoint> {
    let clip = *mvp * Vec4::new(position.x, position.y, position.z, 1.0);

    let w = clip.w;
    if w <= 1e-6 {
        return None;
    }
    let inv_w = 1.0 / w;
    let ndc = Vec3::new(clip.x * inv_w, clip.y * inv_w, clip.z * inv_w);
    if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z.abs() > 1.0 {
        return None;
    }

    // NDC y points up; buffer rows grow downward.
    let sx = (ndc.x + 1.0) * 0.5 * (width.saturating_sub(1)) as f32;
    let sy = (1.0 - ndc.y) * 0.5 * (height.saturating_sub(1)) as f32;
    let sz = (ndc.z + 1.0) * 0.5;

    Some(ScreenPoint {
        x: sx,
        y: sy,
        z: sz.clamp(0.0, 1.0),
        w,
    })
}

/// Build a perspective projection matrix.
/// fov_y: vertical field of view in radians.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y, aspect, near, far)
}

/// Build a look-at view matrix (right-handed).
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, target, up)
}

/// Column-major array form for host batches.
pub fn to_cols(m: &Mat4) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}
