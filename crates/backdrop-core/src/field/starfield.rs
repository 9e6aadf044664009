//! Starfield + nebula: twinkling white stars over a slowly wandering tinted haze.

use backdrop_hal::{ContextDesc, PointMaterial, StaticBackground};
use glam::Vec3;
use rand::{Rng, RngCore};

use super::{
    expect_layers, sample_cube, validate_layout, FieldGenerator, FieldKind, FrameContext, Particle,
    ParticleField,
};
use crate::error::FieldError;
use crate::math::color::rgb_from_hex;
use crate::scene::{CameraSettings, SceneSettings};

/// Index of the star layer in the fields returned by `initialize`.
pub const STAR_LAYER: usize = 0;
/// Index of the nebula layer.
pub const NEBULA_LAYER: usize = 1;

/// Tunables for the starfield + nebula variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarfieldSettings {
    pub star_count: usize,
    pub star_half_extent: f32,
    pub star_size: f32,
    /// Initial per-star size is uniform in `[0, star_max_initial_size)`.
    pub star_max_initial_size: f32,
    pub star_color: u32,
    pub star_opacity: f32,
    /// Twinkle: `size_i = amplitude * sin(t + i) + base`.
    pub twinkle_amplitude: f32,
    pub twinkle_base: f32,
    /// Star yaw rate per unit of elapsed time.
    pub star_spin: f32,
    pub star_wobble_freq: f32,
    pub star_wobble_amp: f32,

    pub nebula_count: usize,
    pub nebula_half_extent: f32,
    pub nebula_size: f32,
    pub nebula_palette: [u32; 3],
    /// Brightness multiplier applied to palette colors.
    pub nebula_tint: f32,
    pub nebula_opacity: f32,
    pub nebula_typing_opacity: f32,
    pub nebula_spin: f32,
    pub nebula_wobble_freq: f32,
    pub nebula_wobble_amp: f32,
    /// Scale of the closed-orbit drift around each nebula anchor.
    pub drift_scale: f32,

    /// Elapsed-time advance per frame.
    pub time_step: f32,
    /// Color phase advance per frame while typing.
    pub hue_step: f32,
}

impl StarfieldSettings {
    /// Dark theme defaults.
    pub const DARK: Self = Self {
        star_count: 3000,
        star_half_extent: 7.5,
        star_size: 0.02,
        star_max_initial_size: 1.5,
        star_color: 0xffffff,
        star_opacity: 0.6,
        twinkle_amplitude: 0.3,
        twinkle_base: 1.2,
        star_spin: 0.05,
        star_wobble_freq: 0.1,
        star_wobble_amp: 0.05,

        nebula_count: 1000,
        nebula_half_extent: 6.0,
        nebula_size: 0.05,
        nebula_palette: [0x1a237e, 0x0d47a1, 0x01579b],
        nebula_tint: 0.7,
        nebula_opacity: 0.3,
        nebula_typing_opacity: 0.4,
        nebula_spin: 0.02,
        nebula_wobble_freq: 0.05,
        nebula_wobble_amp: 0.05,
        drift_scale: 1.0,

        time_step: 0.0005,
        hue_step: 0.03,
    };

    /// Smallest size the twinkle can produce.
    pub fn twinkle_min(&self) -> f32 {
        self.twinkle_base - self.twinkle_amplitude
    }

    /// Largest size the twinkle can produce.
    pub fn twinkle_max(&self) -> f32 {
        self.twinkle_base + self.twinkle_amplitude
    }
}

impl Default for StarfieldSettings {
    fn default() -> Self {
        Self::DARK
    }
}

/// Dark theme scene: black transparent-capable context, pixel ratio capped at 2.
pub const DARK_SCENE: SceneSettings = SceneSettings {
    background: 0x000000,
    background_alpha: 1.0,
    camera: CameraSettings::DEFAULT,
    context: ContextDesc {
        antialias: true,
        alpha: true,
        high_performance: true,
    },
    max_pixel_ratio: Some(crate::scene::viewport::MAX_PIXEL_RATIO),
    fallback: StaticBackground {
        angle_deg: 45.0,
        from: 0x000000,
        to: 0x1a1a2e,
    },
};

pub struct StarfieldNebula {
    settings: StarfieldSettings,
    scene: SceneSettings,
}

impl StarfieldNebula {
    pub fn new(settings: StarfieldSettings, scene: SceneSettings) -> Self {
        Self { settings, scene }
    }

    pub fn dark() -> Self {
        Self::new(StarfieldSettings::DARK, DARK_SCENE)
    }

    pub fn settings(&self) -> &StarfieldSettings {
        &self.settings
    }

    fn build_stars(&self, rng: &mut dyn RngCore) -> Result<ParticleField, FieldError> {
        let s = &self.settings;
        validate_layout(FieldKind::Stars, s.star_count, s.star_half_extent)?;

        let color = rgb_from_hex(s.star_color);
        let particles = (0..s.star_count)
            .map(|_| {
                let position = sample_cube(rng, s.star_half_extent);
                let size = if s.star_max_initial_size > 0.0 {
                    rng.gen_range(0.0..s.star_max_initial_size)
                } else {
                    0.0
                };
                Particle { position, size, color }
            })
            .collect();

        let material = PointMaterial {
            size: s.star_size,
            color: color.to_array(),
            opacity: s.star_opacity,
            additive: true,
            size_attenuation: true,
            vertex_colors: false,
        };
        Ok(ParticleField::new(FieldKind::Stars, particles, material))
    }

    fn build_nebula(&self, rng: &mut dyn RngCore) -> Result<ParticleField, FieldError> {
        let s = &self.settings;
        validate_layout(FieldKind::Nebula, s.nebula_count, s.nebula_half_extent)?;

        let palette = s.nebula_palette.map(|hex| rgb_from_hex(hex) * s.nebula_tint);
        let particles = (0..s.nebula_count)
            .map(|_| {
                let position = sample_cube(rng, s.nebula_half_extent);
                let color = palette[rng.gen_range(0..palette.len())];
                Particle {
                    position,
                    size: 1.0,
                    color,
                }
            })
            .collect();

        let material = PointMaterial {
            size: s.nebula_size,
            color: [1.0, 1.0, 1.0],
            opacity: s.nebula_opacity,
            additive: true,
            size_attenuation: true,
            vertex_colors: true,
        };
        Ok(ParticleField::new(FieldKind::Nebula, particles, material))
    }

    fn twinkle(&self, stars: &mut ParticleField, frame: &FrameContext) -> Result<(), FieldError> {
        let s = &self.settings;
        stars.rotation.y = frame.time * s.star_spin;
        stars.rotation.x = (frame.time * s.star_wobble_freq).sin() * s.star_wobble_amp;

        for (i, star) in stars.particles_mut().iter_mut().enumerate() {
            let size = (frame.time + i as f32).sin() * s.twinkle_amplitude + s.twinkle_base;
            if !size.is_finite() {
                return Err(FieldError::NonFinite {
                    kind: FieldKind::Stars,
                    index: i,
                });
            }
            star.size = size;
        }

        stars.material.color = frame.typing_color(rgb_from_hex(s.star_color)).to_array();
        Ok(())
    }

    fn drift(&self, nebula: &mut ParticleField, frame: &FrameContext) -> Result<(), FieldError> {
        let s = &self.settings;
        nebula.rotation.y = frame.time * s.nebula_spin;
        nebula.rotation.x = (frame.time * s.nebula_wobble_freq).sin() * s.nebula_wobble_amp;

        let (particles, anchors) = nebula.particles_with_anchors();
        for (i, (particle, anchor)) in particles.iter_mut().zip(anchors).enumerate() {
            // Closed orbit keyed by (t + i): zero at t = 0, bounded by 2 * drift_scale.
            let k = i as f32;
            let offset = Vec3::new(
                k.cos() - (frame.time + k).cos(),
                (frame.time + k).sin() - k.sin(),
                0.0,
            ) * s.drift_scale;
            let position = *anchor + offset;
            if !position.is_finite() {
                return Err(FieldError::NonFinite {
                    kind: FieldKind::Nebula,
                    index: i,
                });
            }
            particle.position = position;
        }

        nebula.material.opacity = if frame.typing {
            s.nebula_typing_opacity
        } else {
            s.nebula_opacity
        };
        Ok(())
    }
}

impl FieldGenerator for StarfieldNebula {
    fn name(&self) -> &'static str {
        "starfield-nebula"
    }

    fn scene_settings(&self) -> &SceneSettings {
        &self.scene
    }

    fn time_step(&self) -> f32 {
        self.settings.time_step
    }

    fn hue_step(&self) -> f32 {
        self.settings.hue_step
    }

    fn initialize(&self, rng: &mut dyn RngCore) -> Result<Vec<ParticleField>, FieldError> {
        let stars = self.build_stars(rng)?;
        let nebula = self.build_nebula(rng)?;
        Ok(vec![stars, nebula])
    }

    fn mutate(&self, fields: &mut [ParticleField], frame: &FrameContext) -> Result<(), FieldError> {
        expect_layers(fields, 2)?;
        let (stars, nebula) = fields.split_at_mut(NEBULA_LAYER);
        self.twinkle(&mut stars[STAR_LAYER], frame)?;
        self.drift(&mut nebula[0], frame)
    }
}
