//! Screen-space fireworks.
//!
//! [`FireworkShow`] owns a population of short-lived 2D particles. Every
//! frame it fades the canvas, launches new bursts when the spawn interval
//! has elapsed, integrates each particle, draws its trail and glow, and
//! drops the ones whose life ran out.
//!
//! Physics constants are tuned per 60 fps frame; `tick` scales them by
//! `dt * 60`. Positions are logical pixels with y pointing down.
//!
//! ```ignore
//! let mut show = FireworkShow::new(&config.fireworks, Scatter::seeded(1))?;
//! let mut canvas = RasterCanvas::new(1280.0, 720.0, 1.0);
//! show.tick(dt, now_ms, &mut canvas);
//! ```

pub mod burst;
pub mod canvas;

pub use burst::{burst_size, pick_colors, BurstKind, MIN_BURST_PARTICLES};
pub use canvas::{Canvas2d, GradientStop, RasterCanvas, MAX_CANVAS_PIXEL_RATIO};

use crate::config::FireworkConfig;
use crate::error::ConfigError;
use crate::quality::Downshift;
use crate::scatter::Scatter;
use glam::{Vec2, Vec3};
use std::collections::VecDeque;
use tracing::debug;

/// Trail samples kept per particle, current position included.
pub const TRAIL_LENGTH: usize = 6;

const TRAIL_ALPHA: f32 = 0.55;
const TRAIL_WIDTH: f32 = 1.05;
const GLOW_RADIUS: f32 = 5.2;
const GLOW_CLIP: f32 = 4.5;
const GLOW_CORE_ALPHA: f32 = 0.3;
const GLOW_COLOR_STOP: f32 = 0.24;

/// Launch area as fractions of the view size.
const SPAWN_X: (f32, f32) = (0.08, 0.92);
const SPAWN_Y: (f32, f32) = (0.08, 0.58);

/// One spark.
#[derive(Debug, Clone, PartialEq)]
pub struct FireworkParticle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Remaining life, in 60 fps frames.
    pub life: f32,
    pub max_life: f32,
    pub color: Vec3,
    pub size: f32,
    /// Overrides the show's gravity.
    pub gravity: Option<f32>,
    /// Overrides the show's drag.
    pub drag: Option<f32>,
    /// Recent positions, oldest first.
    pub trail: VecDeque<Vec2>,
}

impl FireworkParticle {
    pub fn new(position: Vec2, velocity: Vec2, color: Vec3, life: f32, size: f32) -> Self {
        let mut trail = VecDeque::with_capacity(TRAIL_LENGTH + 1);
        trail.push_back(position);
        Self {
            position,
            velocity,
            life,
            max_life: life,
            color,
            size,
            gravity: None,
            drag: None,
            trail,
        }
    }

    /// Use particle-specific gravity and drag.
    pub fn with_physics(mut self, gravity: f32, drag: f32) -> Self {
        self.gravity = Some(gravity);
        self.drag = Some(drag);
        self
    }

    /// Remaining life as a fraction, 0 once expired.
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).max(0.0)
    }

    /// Advance by `step` 60 fps frames.
    pub fn integrate(&mut self, step: f32, gravity: f32, drag: f32) {
        let gravity = self.gravity.unwrap_or(gravity);
        let drag = self.drag.unwrap_or(drag);

        self.life -= step;
        self.velocity.y += gravity * step;
        self.velocity *= drag;
        self.position += self.velocity * step;

        self.trail.push_back(self.position);
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }
}

/// Which part of the show is running; the heart stage launches more bursts
/// per volley on its own interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Intro,
    Heart,
}

/// The firework population and launch schedule.
#[derive(Debug, Clone)]
pub struct FireworkShow {
    particles: Vec<FireworkParticle>,
    palette: Vec<Vec3>,
    config: FireworkConfig,
    burst_particles: usize,
    interval_ms: f64,
    last_spawn_ms: f64,
    stage: Stage,
    rng: Scatter,
}

impl FireworkShow {
    /// Empty show in the intro stage. The first volley goes up one interval
    /// after time zero.
    pub fn new(config: &FireworkConfig, rng: Scatter) -> Result<Self, ConfigError> {
        Ok(Self {
            particles: Vec::new(),
            palette: config.palette()?,
            config: config.clone(),
            burst_particles: config.burst_particles,
            interval_ms: config.launch_interval_ms as f64,
            last_spawn_ms: 0.0,
            stage: Stage::Intro,
            rng,
        })
    }

    pub fn particles(&self) -> &[FireworkParticle] {
        &self.particles
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current spawn interval, after downshifts.
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Current base particles per burst, after downshifts.
    pub fn burst_particles(&self) -> usize {
        self.burst_particles
    }

    /// Switch stage and spawn interval.
    pub fn set_stage(&mut self, stage: Stage, interval_ms: f64) {
        self.stage = stage;
        self.interval_ms = interval_ms;
    }

    /// Fewer particles per burst and a longer interval.
    pub fn apply_downshift(&mut self, shift: &Downshift) {
        self.burst_particles = shift.burst_particles(self.burst_particles);
        self.interval_ms = shift.spawn_interval_ms(self.interval_ms);
        debug!(
            burst_particles = self.burst_particles,
            interval_ms = self.interval_ms,
            "fireworks downshifted"
        );
    }

    /// Launch a volley if more than one interval has passed since the last.
    /// Returns the number of bursts launched.
    pub fn maybe_spawn(&mut self, now_ms: f64, view: Vec2) -> usize {
        if now_ms - self.last_spawn_ms <= self.interval_ms {
            return 0;
        }
        self.last_spawn_ms = now_ms;
        self.spawn_volley(view)
    }

    /// Launch 2-3 (intro) or 3-4 (heart) bursts in the upper band of `view`.
    pub fn spawn_volley(&mut self, view: Vec2) -> usize {
        let base = match self.stage {
            Stage::Intro => self.config.simultaneous_bursts_intro,
            Stage::Heart => self.config.simultaneous_bursts_heart,
        };
        let bursts = self.rng.random_int(base, base + 1) as usize;

        for _ in 0..bursts {
            let center = Vec2::new(
                self.rng.random_range(view.x * SPAWN_X.0, view.x * SPAWN_X.1),
                self.rng.random_range(view.y * SPAWN_Y.0, view.y * SPAWN_Y.1),
            );
            let kind = BurstKind::pick(&mut self.rng);
            self.emit(kind, center);
        }
        debug!(bursts, live = self.particles.len(), "firework volley");
        bursts
    }

    /// Emit one burst of `kind` at `center`.
    pub fn emit(&mut self, kind: BurstKind, center: Vec2) {
        let count = burst_size(
            self.burst_particles,
            self.config.burst_multiplier_min,
            self.config.burst_multiplier_max,
            &mut self.rng,
        );
        let colors = pick_colors(&self.palette, &mut self.rng);
        kind.emit(
            center,
            count,
            colors,
            self.config.gravity,
            &mut self.rng,
            &mut self.particles,
        );
    }

    /// Advance and draw one frame.
    ///
    /// * `dt` - seconds since the previous frame
    /// * `now_ms` - current timestamp, for the spawn schedule
    pub fn tick<C: Canvas2d + ?Sized>(&mut self, dt: f32, now_ms: f64, canvas: &mut C) {
        canvas.fade(self.config.fade_alpha);
        self.maybe_spawn(now_ms, canvas.size());

        let step = dt * 60.0;
        let (gravity, drag) = (self.config.gravity, self.config.drag);
        let mut i = 0;
        while i < self.particles.len() {
            let p = &mut self.particles[i];
            p.integrate(step, gravity, drag);
            draw_particle(canvas, p);

            if p.life <= 0.0 {
                // Order is irrelevant; each particle keeps its own trail.
                self.particles.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }
}

fn draw_particle<C: Canvas2d + ?Sized>(canvas: &mut C, p: &mut FireworkParticle) {
    let alpha = p.alpha();
    if p.trail.len() > 1 {
        canvas.stroke_polyline(p.trail.make_contiguous(), p.color, alpha * TRAIL_ALPHA, p.size * TRAIL_WIDTH);
    }
    let stops = [
        GradientStop::new(0.0, Vec3::ONE, alpha * GLOW_CORE_ALPHA),
        GradientStop::new(GLOW_COLOR_STOP, p.color, alpha),
        GradientStop::new(1.0, p.color, 0.0),
    ];
    canvas.fill_radial(p.position, p.size * GLOW_RADIUS, p.size * GLOW_CLIP, &stops);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show() -> FireworkShow {
        FireworkShow::new(&FireworkConfig::default(), Scatter::seeded(21)).unwrap()
    }

    #[test]
    fn test_integrate_applies_gravity_then_drag() {
        let mut p = FireworkParticle::new(Vec2::ZERO, Vec2::new(1.0, 0.0), Vec3::ONE, 10.0, 1.0);
        p.integrate(1.0, 0.5, 0.5);
        assert_eq!(p.velocity, Vec2::new(0.5, 0.25));
        assert_eq!(p.position, Vec2::new(0.5, 0.25));
        assert_eq!(p.life, 9.0);
        assert_eq!(p.trail.len(), 2);
    }

    #[test]
    fn test_trail_capped() {
        let mut p = FireworkParticle::new(Vec2::ZERO, Vec2::X, Vec3::ONE, 100.0, 1.0);
        for _ in 0..20 {
            p.integrate(1.0, 0.0, 1.0);
        }
        assert_eq!(p.trail.len(), TRAIL_LENGTH);
        assert_eq!(p.trail.back(), Some(&p.position));
    }

    #[test]
    fn test_override_physics() {
        let mut p = FireworkParticle::new(Vec2::ZERO, Vec2::ZERO, Vec3::ONE, 10.0, 1.0).with_physics(0.0, 1.0);
        p.integrate(1.0, 5.0, 0.1);
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_spawn_respects_interval() {
        let mut s = show();
        let view = Vec2::new(800.0, 600.0);
        assert_eq!(s.maybe_spawn(520.0, view), 0);
        let bursts = s.maybe_spawn(521.0, view);
        assert!(bursts == 2 || bursts == 3);
        assert!(s.particles().len() >= bursts * MIN_BURST_PARTICLES);
        assert_eq!(s.maybe_spawn(900.0, view), 0);
    }

    #[test]
    fn test_spawn_in_upper_band() {
        let mut s = show();
        let view = Vec2::new(1000.0, 500.0);
        for _ in 0..10 {
            s.spawn_volley(view);
        }
        for p in s.particles() {
            assert!(p.position.x >= 80.0 - 1e-3 && p.position.x <= 920.0 + 1e-3);
            assert!(p.position.y >= 40.0 - 1e-3 && p.position.y <= 290.0 + 1e-3);
        }
    }

    #[test]
    fn test_heart_stage_launches_more() {
        let mut s = show();
        s.set_stage(Stage::Heart, 680.0);
        for _ in 0..20 {
            let n = s.spawn_volley(Vec2::new(400.0, 400.0));
            assert!(n == 3 || n == 4);
        }
        assert_eq!(s.interval_ms(), 680.0);
    }

    #[test]
    fn test_particles_expire_and_are_removed() {
        let mut s = show();
        let mut canvas = RasterCanvas::new(200.0, 200.0, 1.0);
        s.emit(BurstKind::Ring, Vec2::new(100.0, 60.0));
        assert!(!s.particles().is_empty());
        // Ring life is under 68 frames; no new volley before 520 ms.
        for frame in 0..70 {
            s.tick(1.0 / 60.0, frame as f64 * 5.0, &mut canvas);
        }
        assert!(s.particles().is_empty());
    }

    #[test]
    fn test_tick_draws_and_fades() {
        let mut s = show();
        let mut canvas = RasterCanvas::new(200.0, 200.0, 1.0);
        s.emit(BurstKind::Peony, Vec2::new(100.0, 60.0));
        s.tick(1.0 / 60.0, 1.0, &mut canvas);
        let drawn = canvas.total_alpha();
        assert!(drawn > 0.0);

        let mut empty = show();
        empty.tick(1.0 / 60.0, 2.0, &mut canvas);
        assert!(canvas.total_alpha() < drawn);
    }

    #[test]
    fn test_downshift_lowers_population_and_rate() {
        let mut s = show();
        let shift = Downshift {
            ordinal: 1,
            measured_fps: 24.0,
        };
        s.apply_downshift(&shift);
        assert_eq!(s.burst_particles(), 34);
        assert_eq!(s.interval_ms(), 613.0);
        s.apply_downshift(&shift);
        assert_eq!(s.burst_particles(), 26);
        assert_eq!(s.interval_ms(), 723.0);
    }
}
