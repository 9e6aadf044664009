//! Particle fields and the generator contract shared by both theme variants.

pub mod ambient;
pub mod starfield;

pub use ambient::{AmbientField, AmbientSettings};
pub use starfield::{StarfieldNebula, StarfieldSettings};

use backdrop_hal::{PointMaterial, PointVertex};
use glam::{EulerRot, Mat4, Vec3};
use rand::{Rng, RngCore};

use crate::error::FieldError;
use crate::math::color::{hue_to_rgb, phase_hue};
use crate::scene::SceneSettings;

/// Which layer of a scene a field represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-color drifting cloud (white theme).
    Ambient,
    /// Monochrome twinkling stars (dark theme).
    Stars,
    /// Palette-tinted wandering haze (dark theme).
    Nebula,
}

/// One particle record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub size: f32,
    pub color: Vec3,
}

/// A fixed-length set of particles plus the transform and material they are
/// drawn with.
///
/// The particle count is fixed at construction; only contents mutate.
#[derive(Clone, Debug)]
pub struct ParticleField {
    kind: FieldKind,
    particles: Vec<Particle>,
    /// Rest positions captured at construction, used by drift.
    anchors: Vec<Vec3>,
    /// Euler rotation (XYZ order) of the whole field, in radians.
    pub rotation: Vec3,
    pub material: PointMaterial,
}

impl ParticleField {
    pub fn new(kind: FieldKind, particles: Vec<Particle>, material: PointMaterial) -> Self {
        let anchors = particles.iter().map(|p| p.position).collect();
        Self {
            kind,
            particles,
            anchors,
            rotation: Vec3::ZERO,
            material,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable view of the particles. A slice, so the count cannot change.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn anchors(&self) -> &[Vec3] {
        &self.anchors
    }

    /// Split borrow for updates that read anchors while writing particles.
    pub fn particles_with_anchors(&mut self) -> (&mut [Particle], &[Vec3]) {
        (&mut self.particles, &self.anchors)
    }

    /// Object-to-world transform from the field rotation.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Pack particles for submission, reusing `out`'s allocation.
    pub fn write_vertices(&self, out: &mut Vec<PointVertex>) {
        out.clear();
        out.extend(self.particles.iter().map(|p| PointVertex {
            position: p.position.to_array(),
            size: p.size,
            color: p.color.to_array(),
        }));
    }

    pub(crate) fn ensure_populated(&self) -> Result<(), FieldError> {
        if self.particles.is_empty() {
            return Err(FieldError::EmptyField { kind: self.kind });
        }
        Ok(())
    }
}

/// Per-frame inputs handed to [`FieldGenerator::mutate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Elapsed-time accumulator, advanced by the generator's time step each frame.
    pub time: f32,
    /// Typing color phase. Zero whenever `typing` is false.
    pub color_phase: f32,
    pub typing: bool,
}

impl FrameContext {
    /// Hue-cycled color while typing, `base` otherwise.
    pub fn typing_color(&self, base: Vec3) -> Vec3 {
        if self.typing {
            hue_to_rgb(phase_hue(self.color_phase))
        } else {
            base
        }
    }
}

/// A particle field generator: one per theme variant.
pub trait FieldGenerator {
    /// Short variant name for logs.
    fn name(&self) -> &'static str;

    /// Background, camera, context and fallback for scenes using this generator.
    fn scene_settings(&self) -> &SceneSettings;

    /// Advance of the elapsed-time accumulator per frame.
    fn time_step(&self) -> f32;

    /// Advance of the color phase per frame while typing.
    fn hue_step(&self) -> f32;

    /// Build the frame-zero fields.
    fn initialize(&self, rng: &mut dyn RngCore) -> Result<Vec<ParticleField>, FieldError>;

    /// Apply one frame's rotation, shimmer, drift and typing color.
    fn mutate(&self, fields: &mut [ParticleField], frame: &FrameContext) -> Result<(), FieldError>;
}

/// Uniform sample inside the axis-aligned cube of half-width `half_extent`.
pub fn sample_cube(rng: &mut dyn RngCore, half_extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
    )
}

pub(crate) fn validate_layout(kind: FieldKind, count: usize, half_extent: f32) -> Result<(), FieldError> {
    if count == 0 {
        return Err(FieldError::ZeroCount { kind });
    }
    if !half_extent.is_finite() || half_extent <= 0.0 {
        return Err(FieldError::InvalidExtent { kind, half_extent });
    }
    Ok(())
}

pub(crate) fn expect_layers(fields: &[ParticleField], expected: usize) -> Result<(), FieldError> {
    if fields.len() != expected {
        return Err(FieldError::LayerMismatch {
            expected,
            found: fields.len(),
        });
    }
    fields.iter().try_for_each(ParticleField::ensure_populated)
}

/// Keep an accumulating angle within one turn.
pub(crate) fn wrap_angle(angle: f32) -> f32 {
    angle.rem_euclid(core::f32::consts::TAU)
}
