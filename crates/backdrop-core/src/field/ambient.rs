//! Ambient field: one slowly tumbling cloud of same-size, same-color points.

use backdrop_hal::{ContextDesc, PointMaterial, StaticBackground};
use rand::RngCore;

use super::{
    expect_layers, sample_cube, validate_layout, wrap_angle, FieldGenerator, FieldKind, FrameContext,
    Particle, ParticleField,
};
use crate::error::FieldError;
use crate::math::color::rgb_from_hex;
use crate::scene::{CameraSettings, SceneSettings};

/// Tunables for the ambient variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientSettings {
    pub count: usize,
    /// Half-width of the sampling cube.
    pub half_extent: f32,
    pub size: f32,
    /// 0xRRGGBB base color.
    pub color: u32,
    /// Rotation increment on X and Y, radians per frame.
    pub spin: f32,
    /// Multiplier on `spin` while the assistant is typing.
    pub typing_spin_scale: f32,
    /// Color phase advance per frame while typing.
    pub hue_step: f32,
}

impl AmbientSettings {
    /// White theme defaults.
    pub const WHITE: Self = Self {
        count: 1000,
        half_extent: 2.5,
        size: 0.02,
        color: 0x007bff,
        spin: 0.0005,
        typing_spin_scale: 2.0,
        hue_step: 0.03,
    };
}

impl Default for AmbientSettings {
    fn default() -> Self {
        Self::WHITE
    }
}

/// White theme scene: light background, 1.0 pixel ratio, soft gray gradient fallback.
pub const WHITE_SCENE: SceneSettings = SceneSettings {
    background: 0xf0f2f5,
    background_alpha: 1.0,
    camera: CameraSettings::DEFAULT,
    context: ContextDesc {
        antialias: true,
        alpha: false,
        high_performance: false,
    },
    max_pixel_ratio: None,
    fallback: StaticBackground {
        angle_deg: 45.0,
        from: 0xf0f2f5,
        to: 0xe6e9f0,
    },
};

pub struct AmbientField {
    settings: AmbientSettings,
    scene: SceneSettings,
}

impl AmbientField {
    pub fn new(settings: AmbientSettings, scene: SceneSettings) -> Self {
        Self { settings, scene }
    }

    pub fn white() -> Self {
        Self::new(AmbientSettings::WHITE, WHITE_SCENE)
    }

    pub fn settings(&self) -> &AmbientSettings {
        &self.settings
    }
}

impl FieldGenerator for AmbientField {
    fn name(&self) -> &'static str {
        "ambient"
    }

    fn scene_settings(&self) -> &SceneSettings {
        &self.scene
    }

    fn time_step(&self) -> f32 {
        self.settings.spin
    }

    fn hue_step(&self) -> f32 {
        self.settings.hue_step
    }

    fn initialize(&self, rng: &mut dyn RngCore) -> Result<Vec<ParticleField>, FieldError> {
        let s = &self.settings;
        validate_layout(FieldKind::Ambient, s.count, s.half_extent)?;

        let color = rgb_from_hex(s.color);
        let particles = (0..s.count)
            .map(|_| Particle {
                position: sample_cube(rng, s.half_extent),
                size: 1.0,
                color,
            })
            .collect();

        let material = PointMaterial {
            size: s.size,
            color: color.to_array(),
            opacity: 1.0,
            additive: false,
            size_attenuation: true,
            vertex_colors: false,
        };
        Ok(vec![ParticleField::new(FieldKind::Ambient, particles, material)])
    }

    fn mutate(&self, fields: &mut [ParticleField], frame: &FrameContext) -> Result<(), FieldError> {
        expect_layers(fields, 1)?;
        let s = &self.settings;
        let field = &mut fields[0];

        let step = if frame.typing {
            s.spin * s.typing_spin_scale
        } else {
            s.spin
        };
        field.rotation.x = wrap_angle(field.rotation.x + step);
        field.rotation.y = wrap_angle(field.rotation.y + step);

        field.material.color = frame.typing_color(rgb_from_hex(s.color)).to_array();
        Ok(())
    }
}
