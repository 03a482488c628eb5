//! The particle field: per-particle buffers and the mode state machine.
//!
//! [`ParticleField`] owns a fixed-capacity [`ParticleBuffer`] and moves it
//! once per frame according to its [`ParticleMode`]:
//!
//! | Mode | Motion |
//! |------|--------|
//! | `Idle` | Positions held |
//! | `Morphing` | Exponential ease toward targets |
//! | `Exploding` | Ballistic flight with gravity and drag, fading out |
//! | `HeartSteady` | Same ease as `Morphing`, heart-stage size and opacity |
//!
//! Modes are set from outside. The only transition the field makes on its
//! own is `Exploding` to `Idle` once the explosion deadline passes.
//!
//! # Buffers
//!
//! Slots at or past [`ParticleBuffer::active_count`] keep a far-away
//! [`SENTINEL`] target, so a renderer drawing the whole buffer still shows
//! nothing there. Capacity never changes after construction.

use crate::color::lerp;
use crate::config::ParticleConfig;
use crate::scatter::Scatter;
use glam::Vec3;

/// Target for unused slots, far outside any camera frustum.
pub const SENTINEL: Vec3 = Vec3::new(9999.0, 9999.0, -9999.0);

/// Color of a fresh buffer before any text is shown.
pub const INITIAL_COLOR: Vec3 = Vec3::new(1.0, 0.84, 0.65);

/// Fraction of the color gradient actually used, so the last point stops
/// short of the end color.
const GRADIENT_CEILING: f32 = 0.9;
const PULSE_SIZE_GAIN: f32 = 0.7;
const PULSE_DECAY_PER_SEC: f32 = 2.6;
const SIZE_EASE_PER_SEC: f32 = 8.0;
const OPACITY_EASE_PER_SEC: f32 = 4.0;
const EXPLODE_OPACITY_FLOOR: f32 = 0.15;
const EXPLODE_OPACITY_RANGE: f32 = 0.8;
const HEART_SIZE_GAIN: f32 = 1.08;
const HEART_OPACITY: f32 = 0.96;
const TEXT_OPACITY: f32 = 0.94;
const SHOWN_TEXT_OPACITY: f32 = 0.95;

/// Behavior of the whole field for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleMode {
    #[default]
    Idle,
    Morphing,
    Exploding,
    HeartSteady,
}

/// Point sprite size and opacity shared by every particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMaterial {
    pub size: f32,
    pub opacity: f32,
}

/// Two-color gradient applied along the point index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub start: Vec3,
    pub end: Vec3,
}

impl Tint {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Color of point `index` out of `count`.
    #[inline]
    pub fn color_at(&self, index: usize, count: usize) -> Vec3 {
        let denom = count.saturating_sub(1).max(1) as f32;
        lerp(self.start, self.end, index as f32 / denom * GRADIENT_CEILING)
    }
}

/// Parallel per-particle arrays with a live prefix.
#[derive(Debug, Clone)]
pub struct ParticleBuffer {
    positions: Vec<Vec3>,
    targets: Vec<Vec3>,
    velocities: Vec<Vec3>,
    colors: Vec<Vec3>,
    active_count: usize,
}

impl ParticleBuffer {
    /// `max_count` particles scattered in a sphere, none active.
    pub fn new(max_count: usize, spawn_radius: f32, rng: &mut Scatter) -> Self {
        Self {
            positions: (0..max_count).map(|_| rng.random_in_sphere(spawn_radius)).collect(),
            targets: vec![SENTINEL; max_count],
            velocities: vec![Vec3::ZERO; max_count],
            colors: vec![INITIAL_COLOR; max_count],
            active_count: 0,
        }
    }

    pub fn max_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of leading slots in use.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn targets(&self) -> &[Vec3] {
        &self.targets
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    /// Positions as a flat `[x, y, z, x, y, z, ...]` slice for upload.
    pub fn position_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors as a flat `[r, g, b, ...]` slice for upload.
    pub fn color_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// Particle buffers plus the mode machine that moves them.
#[derive(Debug, Clone)]
pub struct ParticleField {
    buffer: ParticleBuffer,
    mode: ParticleMode,
    material: PointMaterial,
    pulse: f32,
    explode_deadline_ms: Option<f64>,
    explode_duration_ms: f64,
    config: ParticleConfig,
    rng: Scatter,
}

impl ParticleField {
    /// A field of `config.max_count` particles in `Idle` mode.
    pub fn new(config: &ParticleConfig, mut rng: Scatter) -> Self {
        let buffer = ParticleBuffer::new(config.max_count, config.spawn_radius, &mut rng);
        Self {
            buffer,
            mode: ParticleMode::Idle,
            material: PointMaterial {
                size: config.point_size,
                opacity: TEXT_OPACITY,
            },
            pulse: 0.0,
            explode_deadline_ms: None,
            explode_duration_ms: 0.0,
            config: config.clone(),
            rng,
        }
    }

    pub fn buffer(&self) -> &ParticleBuffer {
        &self.buffer
    }

    pub fn mode(&self) -> ParticleMode {
        self.mode
    }

    pub fn material(&self) -> PointMaterial {
        self.material
    }

    pub fn pulse(&self) -> f32 {
        self.pulse
    }

    /// Active explosion deadline, if any.
    pub fn explode_deadline_ms(&self) -> Option<f64> {
        self.explode_deadline_ms
    }

    /// Switch mode. Leaving `Exploding` this way cancels its deadline.
    pub fn set_mode(&mut self, mode: ParticleMode) {
        if mode != ParticleMode::Exploding {
            self.explode_deadline_ms = None;
        }
        self.mode = mode;
    }

    /// Material applied when a new text shape is shown.
    pub fn text_material(&self) -> PointMaterial {
        PointMaterial {
            size: self.config.point_size,
            opacity: SHOWN_TEXT_OPACITY,
        }
    }

    /// Material applied when the heart forms.
    pub fn heart_material(&self) -> PointMaterial {
        PointMaterial {
            size: self.config.point_size * HEART_SIZE_GAIN,
            opacity: HEART_OPACITY,
        }
    }

    pub fn set_material(&mut self, material: PointMaterial) {
        self.material = material;
    }

    /// Inflate point size; decays over the following frames.
    pub fn set_pulse(&mut self, amount: f32) {
        self.pulse = amount.max(0.0);
    }

    /// Replace the target shape.
    ///
    /// The first `min(points.len(), max_count)` slots become active. Slots
    /// that were inactive before respawn near the origin instead of flying
    /// in from wherever they last were. With a `tint`, every active point is
    /// recolored along the gradient; otherwise colors are kept.
    pub fn set_targets(&mut self, points: &[Vec3], tint: Option<Tint>) {
        let count = points.len().min(self.buffer.max_count());
        let previous = self.buffer.active_count;
        let buf = &mut self.buffer;

        for (i, point) in points.iter().take(count).enumerate() {
            buf.targets[i] = *point;
            if i >= previous {
                let radius = self.config.spawn_radius + self.rng.random() * self.config.spawn_jitter;
                buf.positions[i] = self.rng.random_in_sphere(radius);
                buf.velocities[i] = Vec3::ZERO;
            }
            if let Some(tint) = tint {
                buf.colors[i] = tint.color_at(i, count);
            }
        }
        for target in &mut buf.targets[count..] {
            *target = SENTINEL;
        }
        buf.active_count = count;
    }

    /// Scale the first active targets from a base shape.
    ///
    /// Only `min(base.len(), active_count)` slots change.
    pub fn set_spread_targets(&mut self, base: &[Vec3], spread: f32) {
        let n = base.len().min(self.buffer.active_count);
        for (target, point) in self.buffer.targets[..n].iter_mut().zip(base) {
            *target = *point * spread;
        }
    }

    /// Blow every active particle outward and fall back to `Idle` at
    /// `now_ms + duration_ms`.
    pub fn explode(&mut self, duration_ms: u64, now_ms: f64) {
        let c = &self.config;
        for v in &mut self.buffer.velocities[..self.buffer.active_count] {
            let speed = c.explode_speed * self.rng.random_range(c.explode_speed_min, c.explode_speed_max);
            *v = self.rng.random_direction() * speed;
        }
        self.mode = ParticleMode::Exploding;
        self.explode_duration_ms = duration_ms as f64;
        self.explode_deadline_ms = Some(now_ms + duration_ms as f64);
    }

    /// Advance one frame.
    ///
    /// * `dt` - seconds since the previous frame
    /// * `now_ms` - current timestamp, checked against the explosion deadline
    pub fn update(&mut self, dt: f32, now_ms: f64) {
        let step = dt * 60.0;
        let active = self.buffer.active_count;

        match self.mode {
            ParticleMode::Exploding => {
                let gravity = self.config.explode_gravity;
                let drag = self.config.explode_drag;
                let buf = &mut self.buffer;
                for (p, v) in buf.positions[..active].iter_mut().zip(&mut buf.velocities[..active]) {
                    v.y -= gravity * step;
                    *v *= drag;
                    *p += *v * step;
                }

                let deadline = self.explode_deadline_ms.unwrap_or(now_ms);
                let remaining = if self.explode_duration_ms > 0.0 {
                    ((deadline - now_ms) / self.explode_duration_ms).clamp(0.0, 1.0) as f32
                } else {
                    0.0
                };
                self.material.opacity = EXPLODE_OPACITY_FLOOR + remaining * EXPLODE_OPACITY_RANGE;

                if now_ms >= deadline {
                    self.mode = ParticleMode::Idle;
                    self.explode_deadline_ms = None;
                }
            }
            ParticleMode::Morphing | ParticleMode::HeartSteady => {
                // Same convergence per second at any frame rate.
                let blend = 1.0 - (1.0 - self.config.morph_lerp).powf(step);
                let buf = &mut self.buffer;
                for (p, t) in buf.positions[..active].iter_mut().zip(&buf.targets[..active]) {
                    *p += (*t - *p) * blend;
                }
            }
            ParticleMode::Idle => {}
        }

        self.update_material(dt);
    }

    fn update_material(&mut self, dt: f32) {
        let heart = self.mode == ParticleMode::HeartSteady;
        if self.pulse > 0.0 {
            self.material.size = self.config.point_size * (1.0 + self.pulse * PULSE_SIZE_GAIN);
            self.pulse = (self.pulse - dt * PULSE_DECAY_PER_SEC).max(0.0);
            return;
        }

        let base_size = if heart {
            self.config.point_size * HEART_SIZE_GAIN
        } else {
            self.config.point_size
        };
        self.material.size += (base_size - self.material.size) * (dt * SIZE_EASE_PER_SEC).min(1.0);

        // The explosion drives opacity itself.
        if self.mode != ParticleMode::Exploding {
            let target = if heart { HEART_OPACITY } else { TEXT_OPACITY };
            self.material.opacity += (target - self.material.opacity) * (dt * OPACITY_EASE_PER_SEC).min(1.0);
        }
    }
}
