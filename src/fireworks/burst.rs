//! Burst archetypes.
//!
//! Each archetype is a recipe for turning a particle index into an initial
//! velocity, color, lifetime and size. Colors alternate between the burst's
//! two colors on a fixed index pattern, so bicolor bursts read as bands
//! rather than noise.
//!
//! | Kind | Weight | Velocity | Second color on |
//! |------|--------|----------|-----------------|
//! | Peony | 0.24 | random angle, `u^0.42` biased speed | every 3rd |
//! | Ring | 0.19 | evenly spaced angles, one speed band | odd indices |
//! | Chrysanthemum | 0.17 | evenly spaced angles, sine-banded speed | every 4th |
//! | Willow | 0.15 | random angle, pushed up, light gravity, heavy drag | odd indices |
//! | Heart | 0.13 | heart curve, flipped for screen space | every 3rd |
//! | Spiral | 0.12 | six turns, speed growing with index | second half |

use super::FireworkParticle;
use crate::heart::heart_curve;
use crate::scatter::Scatter;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Smallest number of particles in any burst.
pub const MIN_BURST_PARTICLES: usize = 20;

const WILLOW_GRAVITY_SCALE: f32 = 0.72;
const WILLOW_DRAG: f32 = 0.987;

/// The six burst shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    Peony,
    Ring,
    Chrysanthemum,
    Willow,
    Heart,
    Spiral,
}

impl BurstKind {
    pub const ALL: [BurstKind; 6] = [
        BurstKind::Peony,
        BurstKind::Ring,
        BurstKind::Chrysanthemum,
        BurstKind::Willow,
        BurstKind::Heart,
        BurstKind::Spiral,
    ];

    /// Map a uniform draw in `[0, 1)` onto a kind by cumulative weight.
    pub fn from_unit(r: f32) -> Self {
        if r < 0.24 {
            BurstKind::Peony
        } else if r < 0.43 {
            BurstKind::Ring
        } else if r < 0.6 {
            BurstKind::Chrysanthemum
        } else if r < 0.75 {
            BurstKind::Willow
        } else if r < 0.88 {
            BurstKind::Heart
        } else {
            BurstKind::Spiral
        }
    }

    /// Weighted random kind.
    pub fn pick(rng: &mut Scatter) -> Self {
        Self::from_unit(rng.random())
    }

    /// Emit `count` particles at `center` into `out`.
    ///
    /// * `colors` - primary and secondary burst color
    /// * `gravity` - base gravity, only needed by kinds that override it
    pub fn emit(
        self,
        center: Vec2,
        count: usize,
        colors: (Vec3, Vec3),
        gravity: f32,
        rng: &mut Scatter,
        out: &mut Vec<FireworkParticle>,
    ) {
        let (c1, c2) = colors;
        let n = count as f32;
        out.reserve(count);

        match self {
            BurstKind::Ring => {
                for i in 0..count {
                    let a = i as f32 / n * TAU + rng.random_range(-0.03, 0.03);
                    let v = polar(a, rng.random_range(3.2, 5.8));
                    let color = if i % 2 == 0 { c1 } else { c2 };
                    out.push(FireworkParticle::new(
                        center,
                        v,
                        color,
                        rng.random_range(42.0, 68.0),
                        rng.random_range(1.0, 1.9),
                    ));
                }
            }
            BurstKind::Heart => {
                let scale = rng.random_range(0.19, 0.26);
                for i in 0..count {
                    let t = i as f32 / n * TAU;
                    let curve = heart_curve(t);
                    // Screen y grows downward.
                    let v = Vec2::new(
                        curve.x * scale + rng.random_range(-0.22, 0.22),
                        -curve.y * scale + rng.random_range(-0.22, 0.22),
                    );
                    let color = if i % 3 == 0 { c2 } else { c1 };
                    out.push(FireworkParticle::new(
                        center,
                        v,
                        color,
                        rng.random_range(44.0, 74.0),
                        rng.random_range(0.95, 1.75),
                    ));
                }
            }
            BurstKind::Spiral => {
                for i in 0..count {
                    let t = i as f32 / n;
                    let a = t * PI * 12.0 + rng.random_range(-0.06, 0.06);
                    let speed = rng.random_range(1.2, 5.4) * (0.4 + t * 0.8);
                    let color = if t > 0.5 { c2 } else { c1 };
                    out.push(FireworkParticle::new(
                        center,
                        polar(a, speed),
                        color,
                        rng.random_range(36.0, 62.0),
                        rng.random_range(0.8, 1.6),
                    ));
                }
            }
            BurstKind::Willow => {
                for i in 0..count {
                    let a = rng.random() * TAU;
                    let mut v = polar(a, rng.random_range(2.4, 5.0));
                    v.y -= rng.random_range(0.8, 2.0);
                    let color = if i % 2 == 0 { c1 } else { c2 };
                    out.push(
                        FireworkParticle::new(
                            center,
                            v,
                            color,
                            rng.random_range(58.0, 92.0),
                            rng.random_range(0.95, 1.7),
                        )
                        .with_physics(gravity * WILLOW_GRAVITY_SCALE, WILLOW_DRAG),
                    );
                }
            }
            BurstKind::Chrysanthemum => {
                for i in 0..count {
                    let a = i as f32 / n * TAU + rng.random_range(-0.09, 0.09);
                    let band = 0.75 + (i as f32 * 0.33).sin() * 0.25 + rng.random() * 0.12;
                    let speed = rng.random_range(2.5, 5.6) * band;
                    let color = if i % 4 == 0 { c2 } else { c1 };
                    out.push(FireworkParticle::new(
                        center,
                        polar(a, speed),
                        color,
                        rng.random_range(40.0, 70.0),
                        rng.random_range(0.9, 1.8),
                    ));
                }
            }
            BurstKind::Peony => {
                for i in 0..count {
                    let a = rng.random() * TAU;
                    let speed = rng.random().powf(0.42) * rng.random_range(2.2, 6.2);
                    let color = if i % 3 == 0 { c2 } else { c1 };
                    out.push(FireworkParticle::new(
                        center,
                        polar(a, speed),
                        color,
                        rng.random_range(38.0, 66.0),
                        rng.random_range(0.9, 1.8),
                    ));
                }
            }
        }
    }
}

#[inline]
fn polar(angle: f32, speed: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin()) * speed
}

/// Particle count for one burst: `base` times a random multiplier, floored,
/// never below [`MIN_BURST_PARTICLES`].
pub fn burst_size(base: usize, multiplier_min: f32, multiplier_max: f32, rng: &mut Scatter) -> usize {
    let scaled = (base as f32 * rng.random_range(multiplier_min, multiplier_max)).floor() as usize;
    scaled.max(MIN_BURST_PARTICLES)
}

/// Two palette entries; the second never repeats the first when the palette
/// has more than one color.
pub fn pick_colors(palette: &[Vec3], rng: &mut Scatter) -> (Vec3, Vec3) {
    if palette.is_empty() {
        return (Vec3::ONE, Vec3::ONE);
    }
    let first = rng.random_index(palette.len());
    let mut second = rng.random_index(palette.len());
    if second == first {
        second = (second + 1) % palette.len();
    }
    (palette[first], palette[second])
}
