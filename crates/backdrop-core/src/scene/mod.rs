//! Scene: camera plus particle fields bound to one presentation surface.

pub mod viewport;

use backdrop_hal::{ContextDesc, StaticBackground, Surface, SurfaceMetrics};
use glam::{Mat4, Vec3};

use crate::error::{SceneError, SurfaceFault};
use crate::field::ParticleField;
use crate::math::color::rgba_from_hex;
use crate::render::transform::{look_at, perspective};

/// Projection defaults shared by both themes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl CameraSettings {
    pub const DEFAULT: Self = Self {
        fov_y_deg: 75.0,
        near: 0.1,
        far: 1000.0,
        position: [0.0, 0.0, 5.0],
    };
}

/// Everything a theme variant fixes about its scene besides the particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneSettings {
    /// 0xRRGGBB clear color.
    pub background: u32,
    pub background_alpha: f32,
    pub camera: CameraSettings,
    pub context: ContextDesc,
    /// Upper bound on device pixel ratio. `None` renders at ratio 1.0.
    pub max_pixel_ratio: Option<f32>,
    /// Shown in degraded mode.
    pub fallback: StaticBackground,
}

/// Perspective camera looking down -Z at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    pub position: Vec3,
    projection: Mat4,
}

impl Camera {
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        let mut camera = Self {
            fov_y_deg: settings.fov_y_deg,
            near: settings.near,
            far: settings.far,
            aspect,
            position: Vec3::from_array(settings.position),
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    /// Recompute the cached projection after changing fov, clip planes or aspect.
    pub fn update_projection(&mut self) {
        self.projection = perspective(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        look_at(self.position, self.position - Vec3::Z, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }
}

/// In-memory scene owned by exactly one lifecycle manager.
pub struct Scene {
    pub camera: Camera,
    pub fields: Vec<ParticleField>,
    pub background: [f32; 4],
    max_pixel_ratio: Option<f32>,
    /// CSS-pixel size and effective pixel ratio last applied to the surface.
    viewport: (u32, u32, f32),
}

impl Scene {
    /// Acquire a context on `surface` and size it. On error the context is
    /// released again before returning.
    pub fn build<S: Surface>(
        surface: &mut S,
        settings: &SceneSettings,
        fields: Vec<ParticleField>,
    ) -> Result<Self, SceneError> {
        let SurfaceMetrics {
            width,
            height,
            device_pixel_ratio,
        } = surface.metrics();

        if let Err(e) = surface.create_context(&settings.context) {
            surface.release_context();
            return Err(SurfaceFault::new("create_context", e).into());
        }

        let mut scene = Self {
            camera: Camera::new(&settings.camera, viewport::aspect_ratio(width, height)),
            fields,
            background: rgba_from_hex(settings.background, settings.background_alpha),
            max_pixel_ratio: settings.max_pixel_ratio,
            viewport: (0, 0, 1.0),
        };

        if let Err(e) = viewport::on_resize(&mut scene, surface, width, height, device_pixel_ratio) {
            surface.release_context();
            return Err(e.into());
        }
        Ok(scene)
    }

    /// Total particles across all fields.
    pub fn particle_count(&self) -> usize {
        self.fields.iter().map(ParticleField::len).sum()
    }

    /// Last applied `(width, height, pixel_ratio)`.
    pub fn viewport(&self) -> (u32, u32, f32) {
        self.viewport
    }

    pub fn max_pixel_ratio(&self) -> Option<f32> {
        self.max_pixel_ratio
    }
}
