//! Generator tests: frame-zero layout, per-frame mutation rules, and the
//! fixed-length invariant.

use backdrop_core::error::FieldError;
use backdrop_core::field::starfield::{NEBULA_LAYER, STAR_LAYER};
use backdrop_core::field::{
    AmbientField, AmbientSettings, FieldGenerator, FieldKind, FrameContext, ParticleField, StarfieldNebula,
    StarfieldSettings,
};
use backdrop_core::math::color::{hue_to_rgb, phase_hue, rgb_from_hex};
use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg64;

fn rng() -> Pcg64 {
    Pcg64::seed_from_u64(7)
}

fn idle(time: f32) -> FrameContext {
    FrameContext {
        time,
        color_phase: 0.0,
        typing: false,
    }
}

fn inside_cube(p: Vec3, half: f32) -> bool {
    p.abs().max_element() <= half
}

fn approx(a: [f32; 3], b: Vec3) -> bool {
    (Vec3::from_array(a) - b).abs().max_element() < 1e-5
}

// ============================================================================
// Ambient field
// ============================================================================

mod ambient_tests {
    use super::*;

    #[test]
    fn initialize_places_particles_in_cube() {
        let generator = AmbientField::white();
        let fields = generator.initialize(&mut rng()).unwrap();

        assert_eq!(fields.len(), 1);
        let field = &fields[0];
        assert_eq!(field.kind(), FieldKind::Ambient);
        assert_eq!(field.len(), 1000);
        let base = rgb_from_hex(0x007bff);
        for p in field.particles() {
            assert!(inside_cube(p.position, 2.5), "{:?}", p.position);
            assert_eq!(p.size, 1.0);
            assert_eq!(p.color, base);
        }
        assert!(approx(field.material.color, base));
        assert_eq!(field.material.size, 0.02);
    }

    #[test]
    fn mutate_advances_rotation_on_x_and_y() {
        let generator = AmbientField::white();
        let mut fields = generator.initialize(&mut rng()).unwrap();

        generator.mutate(&mut fields, &idle(0.0)).unwrap();
        generator.mutate(&mut fields, &idle(0.0)).unwrap();

        let r = fields[0].rotation;
        assert!((r.x - 0.001).abs() < 1e-7, "x {}", r.x);
        assert!((r.y - 0.001).abs() < 1e-7, "y {}", r.y);
        assert_eq!(r.z, 0.0);
    }

    #[test]
    fn typing_scales_rotation_step() {
        let generator = AmbientField::white();
        let mut fields = generator.initialize(&mut rng()).unwrap();
        let frame = FrameContext {
            time: 0.0,
            color_phase: 0.03,
            typing: true,
        };

        generator.mutate(&mut fields, &frame).unwrap();

        let expected = AmbientSettings::WHITE.spin * AmbientSettings::WHITE.typing_spin_scale;
        assert!((fields[0].rotation.x - expected).abs() < 1e-7);
    }

    #[test]
    fn typing_overrides_color_with_hue() {
        let generator = AmbientField::white();
        let mut fields = generator.initialize(&mut rng()).unwrap();
        let frame = FrameContext {
            time: 0.0,
            color_phase: 1.2,
            typing: true,
        };

        generator.mutate(&mut fields, &frame).unwrap();
        assert!(approx(fields[0].material.color, hue_to_rgb(phase_hue(1.2))));

        generator.mutate(&mut fields, &idle(0.0)).unwrap();
        assert!(approx(fields[0].material.color, rgb_from_hex(0x007bff)));
    }

    #[test]
    fn zero_count_is_rejected() {
        let settings = AmbientSettings {
            count: 0,
            ..AmbientSettings::WHITE
        };
        let generator = AmbientField::new(settings, *AmbientField::white().scene_settings());
        let err = generator.initialize(&mut rng()).unwrap_err();
        assert_eq!(err, FieldError::ZeroCount { kind: FieldKind::Ambient });
    }

    #[test]
    fn non_positive_extent_is_rejected() {
        let settings = AmbientSettings {
            half_extent: 0.0,
            ..AmbientSettings::WHITE
        };
        let generator = AmbientField::new(settings, *AmbientField::white().scene_settings());
        assert!(matches!(
            generator.initialize(&mut rng()),
            Err(FieldError::InvalidExtent { .. })
        ));
    }

    #[test]
    fn empty_field_fails_mutate() {
        let generator = AmbientField::white();
        let material = generator.initialize(&mut rng()).unwrap()[0].material;
        let mut fields = vec![ParticleField::new(FieldKind::Ambient, Vec::new(), material)];

        let err = generator.mutate(&mut fields, &idle(0.0)).unwrap_err();
        assert_eq!(err, FieldError::EmptyField { kind: FieldKind::Ambient });
    }

    #[test]
    fn missing_layer_fails_mutate() {
        let generator = AmbientField::white();
        let err = generator.mutate(&mut [], &idle(0.0)).unwrap_err();
        assert_eq!(err, FieldError::LayerMismatch { expected: 1, found: 0 });
    }
}

// ============================================================================
// Starfield + nebula
// ============================================================================

mod starfield_tests {
    use super::*;

    #[test]
    fn initialize_builds_star_and_nebula_layers() {
        let generator = StarfieldNebula::dark();
        let fields = generator.initialize(&mut rng()).unwrap();

        assert_eq!(fields.len(), 2);
        let stars = &fields[STAR_LAYER];
        let nebula = &fields[NEBULA_LAYER];
        assert_eq!(stars.kind(), FieldKind::Stars);
        assert_eq!(nebula.kind(), FieldKind::Nebula);
        assert_eq!(stars.len(), 3000);
        assert_eq!(nebula.len(), 1000);

        for star in stars.particles() {
            assert!(inside_cube(star.position, 7.5));
            assert!((0.0..1.5).contains(&star.size), "size {}", star.size);
        }
        assert!(stars.material.additive);
        assert_eq!(stars.material.opacity, 0.6);
    }

    #[test]
    fn nebula_colors_come_from_tinted_palette() {
        let settings = StarfieldSettings::DARK;
        let generator = StarfieldNebula::dark();
        let fields = generator.initialize(&mut rng()).unwrap();

        let palette: Vec<Vec3> = settings
            .nebula_palette
            .iter()
            .map(|&hex| rgb_from_hex(hex) * settings.nebula_tint)
            .collect();
        let nebula = &fields[NEBULA_LAYER];
        for p in nebula.particles() {
            assert!(inside_cube(p.position, 6.0));
            assert!(palette.iter().any(|c| (*c - p.color).abs().max_element() < 1e-6));
        }
        assert!(nebula.material.vertex_colors);
        assert_eq!(nebula.material.opacity, 0.3);
    }

    #[test]
    fn same_seed_same_layout() {
        let generator = StarfieldNebula::dark();
        let a = generator.initialize(&mut rng()).unwrap();
        let b = generator.initialize(&mut rng()).unwrap();
        assert_eq!(a[STAR_LAYER].particles(), b[STAR_LAYER].particles());
        assert_eq!(a[NEBULA_LAYER].particles(), b[NEBULA_LAYER].particles());
    }

    #[test]
    fn one_step_keeps_every_star_in_twinkle_band() {
        let settings = StarfieldSettings::DARK;
        let generator = StarfieldNebula::dark();
        let mut fields = generator.initialize(&mut rng()).unwrap();
        assert_eq!(fields[STAR_LAYER].len(), 3000);

        generator.mutate(&mut fields, &idle(settings.time_step)).unwrap();

        let (lo, hi) = (settings.twinkle_min(), settings.twinkle_max());
        for (i, star) in fields[STAR_LAYER].particles().iter().enumerate() {
            assert!(
                star.size >= lo - 1e-6 && star.size <= hi + 1e-6,
                "star {i} size {} outside [{lo}, {hi}]",
                star.size
            );
        }
    }

    #[test]
    fn twinkle_follows_phase_shifted_sine() {
        let generator = StarfieldNebula::dark();
        let mut fields = generator.initialize(&mut rng()).unwrap();
        let t = 0.25;

        generator.mutate(&mut fields, &idle(t)).unwrap();

        for i in [0usize, 1, 17, 2999] {
            let expected = (t + i as f32).sin() * 0.3 + 1.2;
            let got = fields[STAR_LAYER].particles()[i].size;
            assert!((got - expected).abs() < 1e-5, "star {i}: {got} vs {expected}");
        }
    }

    #[test]
    fn rotation_follows_elapsed_time() {
        let generator = StarfieldNebula::dark();
        let mut fields = generator.initialize(&mut rng()).unwrap();
        let t = 2.0;

        generator.mutate(&mut fields, &idle(t)).unwrap();

        let stars = fields[STAR_LAYER].rotation;
        assert!((stars.y - t * 0.05).abs() < 1e-6);
        assert!((stars.x - (t * 0.1).sin() * 0.05).abs() < 1e-6);
        let nebula = fields[NEBULA_LAYER].rotation;
        assert!((nebula.y - t * 0.02).abs() < 1e-6);
        assert!((nebula.x - (t * 0.05).sin() * 0.05).abs() < 1e-6);
    }

    #[test]
    fn drift_is_zero_at_time_zero() {
        let generator = StarfieldNebula::dark();
        let mut fields = generator.initialize(&mut rng()).unwrap();

        generator.mutate(&mut fields, &idle(0.0)).unwrap();

        let nebula = &fields[NEBULA_LAYER];
        for (p, anchor) in nebula.particles().iter().zip(nebula.anchors()) {
            assert!((p.position - *anchor).length() < 1e-5);
        }
    }

    #[test]
    fn drift_stays_bounded_and_planar() {
        let settings = StarfieldSettings::DARK;
        let generator = StarfieldNebula::dark();
        let mut fields = generator.initialize(&mut rng()).unwrap();
        let bound = 2.0 * settings.drift_scale + 1e-4;

        for step in 0..400 {
            let t = step as f32 * 0.05;
            generator.mutate(&mut fields, &idle(t)).unwrap();
            let nebula = &fields[NEBULA_LAYER];
            for (p, anchor) in nebula.particles().iter().zip(nebula.anchors()) {
                let offset = p.position - *anchor;
                assert!(offset.x.abs() <= bound && offset.y.abs() <= bound, "{offset:?}");
                assert!(offset.z.abs() < 1e-6);
            }
        }
    }

    #[test]
    fn typing_tints_stars_and_raises_nebula_opacity() {
        let generator = StarfieldNebula::dark();
        let mut fields = generator.initialize(&mut rng()).unwrap();
        let typing = FrameContext {
            time: 0.1,
            color_phase: 0.6,
            typing: true,
        };

        generator.mutate(&mut fields, &typing).unwrap();
        assert!(approx(fields[STAR_LAYER].material.color, hue_to_rgb(phase_hue(0.6))));
        assert_eq!(fields[NEBULA_LAYER].material.opacity, 0.4);

        generator.mutate(&mut fields, &idle(0.1)).unwrap();
        assert!(approx(fields[STAR_LAYER].material.color, Vec3::ONE));
        assert_eq!(fields[NEBULA_LAYER].material.opacity, 0.3);
    }

    #[test]
    fn lengths_survive_ten_thousand_mutations() {
        let settings = StarfieldSettings::DARK;
        let generator = StarfieldNebula::dark();
        let mut fields = generator.initialize(&mut rng()).unwrap();

        for step in 0..10_000 {
            let frame = FrameContext {
                time: step as f32 * settings.time_step,
                color_phase: 0.0,
                typing: step % 2 == 0,
            };
            generator.mutate(&mut fields, &frame).unwrap();
        }

        assert_eq!(fields[STAR_LAYER].len(), 3000);
        assert_eq!(fields[NEBULA_LAYER].len(), 1000);
        assert_eq!(fields[NEBULA_LAYER].anchors().len(), 1000);
    }

    #[test]
    fn missing_nebula_layer_fails_mutate() {
        let generator = StarfieldNebula::dark();
        let mut fields = generator.initialize(&mut rng()).unwrap();
        fields.truncate(1);

        let err = generator.mutate(&mut fields, &idle(0.0)).unwrap_err();
        assert_eq!(err, FieldError::LayerMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn zero_star_count_is_rejected() {
        let settings = StarfieldSettings {
            star_count: 0,
            ..StarfieldSettings::DARK
        };
        let generator = StarfieldNebula::new(settings, *StarfieldNebula::dark().scene_settings());
        let err = generator.initialize(&mut rng()).unwrap_err();
        assert_eq!(err, FieldError::ZeroCount { kind: FieldKind::Stars });
    }
}
