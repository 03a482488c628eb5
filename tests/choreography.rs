//! Integration tests for the choreography components.
//!
//! These drive the public API the way a host would, checking the
//! behavioral guarantees each component makes.

use glam::{Vec2, Vec3};
use heartburst::config::{Config, ParticleConfig};
use heartburst::experience::{Experience, PointFrame, PointLayer, PointRenderer, Viewport};
use heartburst::fireworks::{Canvas2d, RasterCanvas, Stage};
use heartburst::heart::{generate_anchors, heart_curve, HeartMetrics};
use heartburst::particles::{ParticleField, ParticleMode, SENTINEL};
use heartburst::quality::{DeviceSignals, QualityGovernor, QualityTier, MAX_DOWNSHIFTS};
use heartburst::scatter::Scatter;
use heartburst::sequencer::SequencerState;
use heartburst::text::{BitmapFont, GlyphLayout, TextFrame, TextRasterizer};
use heartburst::textures::{Texture, TextureProvider};
use heartburst::TextureError;
use std::f32::consts::FRAC_PI_2;
use std::path::Path;
use std::sync::Arc;

fn field(max_count: usize, gravity: f32) -> ParticleField {
    let config = ParticleConfig {
        max_count,
        explode_gravity: gravity,
        ..ParticleConfig::default()
    };
    ParticleField::new(&config, Scatter::seeded(42))
}

fn cloud(n: usize) -> Vec<Vec3> {
    (0..n).map(|i| Vec3::new(i as f32 * 0.5, (i % 7) as f32, 0.0)).collect()
}

// ============================================================================
// Particle field
// ============================================================================

#[test]
fn test_set_targets_active_count_and_sentinel() {
    let mut f = field(300, 0.008);
    for count in [0usize, 1, 120, 300, 1000] {
        f.set_targets(&cloud(count), None);
        let buffer = f.buffer();
        assert_eq!(buffer.active_count(), count.min(300));
        for target in &buffer.targets()[buffer.active_count()..] {
            assert_eq!(*target, SENTINEL);
        }
    }
}

#[test]
fn test_explosion_velocity_decays_geometrically() {
    let mut f = field(64, 0.0);
    f.set_targets(&cloud(64), None);
    f.explode(10_000, 0.0);
    let initial: Vec<f32> = f.buffer().velocities().iter().map(|v| v.length()).collect();

    let drag = ParticleConfig::default().explode_drag;
    let steps = 30;
    let mut now = 0.0;
    for _ in 0..steps {
        now += 1000.0 / 60.0;
        f.update(1.0 / 60.0, now);
    }

    let decay = drag.powi(steps);
    for (v, v0) in f.buffer().velocities().iter().zip(&initial) {
        assert!((v.length() - v0 * decay).abs() < 1e-4 * v0.max(1.0));
    }
}

#[test]
fn test_explode_returns_to_idle_and_holds() {
    let mut f = field(200, 0.008);
    f.set_targets(&cloud(200), None);
    f.explode(900, 1000.0);
    assert_eq!(f.mode(), ParticleMode::Exploding);

    let mut now: f64 = 1000.0;
    while now < 1900.0 {
        now = (now + 1000.0 / 60.0).min(1900.0);
        f.update(1.0 / 60.0, now);
    }
    assert_eq!(f.mode(), ParticleMode::Idle);

    let before = f.buffer().positions().to_vec();
    f.update(1.0 / 60.0, now + 16.0);
    for (a, b) in before.iter().zip(f.buffer().positions()) {
        assert!(a.distance(*b) < 1e-6);
    }
}

// ============================================================================
// Heart geometry
// ============================================================================

#[test]
fn test_heart_curve_closed_form() {
    let top = heart_curve(0.0);
    assert!(top.abs_diff_eq(Vec2::new(0.0, 5.0), 1e-5));

    let side = heart_curve(FRAC_PI_2);
    assert!(side.abs_diff_eq(Vec2::new(16.0, 4.0), 1e-4));
}

#[test]
fn test_generate_anchors_always_exact() {
    let metrics = HeartMetrics::compute(220.0, 45.0, 0.6);
    for seed in 0..20 {
        let anchors = generate_anchors(&metrics, 18.0, 24, &mut Scatter::seeded(seed));
        assert_eq!(anchors.len(), 24);
    }
}

// ============================================================================
// Text rasterization
// ============================================================================

#[test]
fn test_rasterize_twice_is_identical() {
    let frame = TextFrame {
        size_hint: 720.0,
        visible_height: 182.25,
    };
    let mut a = TextRasterizer::new(BitmapFont, 3, 5600);
    let mut b = TextRasterizer::new(BitmapFont, 3, 5600);
    let layout = GlyphLayout::Centered;
    assert_eq!(
        a.rasterize("HAPPY NEW YEAR!", &layout, &frame).unwrap(),
        b.rasterize("HAPPY NEW YEAR!", &layout, &frame).unwrap()
    );
}

#[test]
fn test_rasterize_2026_is_centered() {
    let frame = TextFrame {
        size_hint: 720.0,
        visible_height: 182.25,
    };
    let mut rasterizer = TextRasterizer::new(BitmapFont, 3, usize::MAX);
    let points = rasterizer.rasterize("2026", &GlyphLayout::Centered, &frame).unwrap();
    assert!(!points.is_empty());

    let min_x = points.iter().map(|p| p.x).fold(f32::MAX, f32::min);
    let max_x = points.iter().map(|p| p.x).fold(f32::MIN, f32::max);
    let middle = (min_x + max_x) / 2.0;
    assert!(middle.abs() < (max_x - min_x) * 0.1, "middle {middle}");
}

// ============================================================================
// Quality governor
// ============================================================================

#[test]
fn test_governor_caps_downshifts() {
    let signals = DeviceSignals {
        cores: Some(8),
        coarse_pointer: false,
        pixel_ratio: 1.0,
    };
    let tier = QualityTier::from_score(signals.score());
    let mut governor = QualityGovernor::new(tier.profile(), 0.0);

    let mut shifts = 0;
    let mut now = 0.0;
    for _ in 0..2000 {
        now += 100.0;
        if governor.observe_frame(0.1, now).is_some() {
            shifts += 1;
        }
    }
    assert_eq!(shifts, MAX_DOWNSHIFTS);
    assert_eq!(governor.downshifts(), MAX_DOWNSHIFTS);
}

// ============================================================================
// Full run
// ============================================================================

struct SlowProvider;

impl TextureProvider for SlowProvider {
    fn load(&self, _path: &Path) -> Result<Texture, TextureError> {
        std::thread::sleep(std::time::Duration::from_millis(20));
        Ok(Texture::solid(8, 8, [200, 120, 160, 255]))
    }
}

#[derive(Default)]
struct Uploads {
    particle_frames: usize,
    star_frames: usize,
}

impl PointRenderer for Uploads {
    fn submit(&mut self, frame: &PointFrame<'_>) {
        match frame.layer {
            PointLayer::Particles => self.particle_frames += 1,
            PointLayer::Stars => self.star_frames += 1,
        }
    }
}

struct InstantProvider;

impl TextureProvider for InstantProvider {
    fn load(&self, _path: &Path) -> Result<Texture, TextureError> {
        Ok(Texture::solid(8, 8, [255, 255, 255, 255]))
    }
}

#[test]
fn test_slow_host_downshifts_through_frames() {
    let mut config = Config::default();
    config.text.lines = vec!["HI".into()];
    config.love_note.text = "OK".into();
    config.heart.photo_count = 2;
    config.stars.count = 50;

    // Starts long after time zero and never beats 20 fps.
    let start = 5_000.0;
    let mut show = Experience::builder(config)
        .with_viewport(Viewport::new(400.0, 300.0, 2.0))
        .with_device(DeviceSignals {
            cores: Some(8),
            coarse_pointer: false,
            pixel_ratio: 2.0,
        })
        .with_provider(Arc::new(InstantProvider))
        .with_seed(7)
        .build(BitmapFont, start)
        .unwrap();
    assert_eq!(show.pixel_ratio(), 2.0);
    assert_eq!(show.fireworks().burst_particles(), 44);

    let mut canvas = RasterCanvas::new(400.0, 300.0, 1.5);
    let mut uploads = Uploads::default();
    let mut now = start;
    while now < start + 40_000.0 {
        show.frame(now, &mut uploads, &mut canvas);
        now += 50.0;
    }

    assert_eq!(show.governor().downshifts(), MAX_DOWNSHIFTS);
    assert_eq!(*show.sequencer_state(), SequencerState::Finished);
    assert_eq!(show.stage(), Stage::Heart);
    // 44 -> 34 -> 26
    assert_eq!(show.fireworks().burst_particles(), 26);
    // 680 -> 802 -> 946, applied when the heart stage began
    assert_eq!(show.fireworks().interval_ms(), 946.0);
    // 2.0 * 0.88 * 0.88
    assert!((show.pixel_ratio() - 1.5488).abs() < 1e-4);

    show.resize(Viewport::new(800.0, 600.0, 2.0), &mut canvas).unwrap();
    assert!((show.pixel_ratio() - 1.5488).abs() < 1e-4);
    assert_eq!(show.governor().downshifts(), MAX_DOWNSHIFTS);
    assert_eq!(show.fireworks().interval_ms(), 946.0);
}

#[test]
fn test_show_runs_to_completion() {
    let mut config = Config::default();
    config.text.lines = vec!["2026".into(), "HI!".into()];
    config.love_note.text = "YES".into();
    config.heart.photo_count = 3;
    config.stars.count = 100;

    let mut show = Experience::builder(config)
        .with_viewport(Viewport::new(400.0, 300.0, 2.0))
        .with_device(DeviceSignals {
            cores: Some(4),
            coarse_pointer: false,
            pixel_ratio: 2.0,
        })
        .with_provider(Arc::new(SlowProvider))
        .with_seed(2026)
        .build(BitmapFont, 0.0)
        .unwrap();

    let mut canvas = RasterCanvas::new(400.0, 300.0, 1.5);
    let mut uploads = Uploads::default();
    let mut now = 0.0;
    let mut saw_fireworks = false;
    while now < 12_000.0 {
        show.frame(now, &mut uploads, &mut canvas);
        saw_fireworks |= !show.fireworks().particles().is_empty();
        now += 1000.0 / 60.0;
    }

    assert_eq!(*show.sequencer_state(), SequencerState::Finished);
    assert_eq!(show.stage(), Stage::Heart);
    assert_eq!(show.cards().len(), 3);
    assert_eq!(show.textures().len(), 3);
    assert_eq!(show.love_note_text(), "YES");
    assert_eq!(uploads.particle_frames, uploads.star_frames);
    assert!(saw_fireworks);
    assert_eq!(canvas.size(), Vec2::new(400.0, 300.0));
}
