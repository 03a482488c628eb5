//! Parametric heart geometry.
//!
//! The outline is the classic closed-form curve
//!
//! ```text
//! x(t) = 16 sin³ t
//! y(t) = 13 cos t − 5 cos 2t − 2 cos 3t − cos 4t
//! ```
//!
//! which is about 30 units tall. [`HeartMetrics`] sizes it so it fills a
//! fraction of the visible frustum; [`build_points`] fills its interior with
//! particle targets and [`generate_anchors`] spreads photo-card anchors over
//! it without overlap where possible.

use crate::scatter::Scatter;
use glam::{Vec2, Vec3};
use rand::seq::SliceRandom;
use std::f32::consts::TAU;
use tracing::debug;

/// Height of the unit curve, used to normalize it.
pub const UNIT_HEART_HEIGHT: f32 = 30.0;
/// Oversampled candidate pool for anchor placement.
pub const ANCHOR_CANDIDATES: usize = 1500;

/// Starting anchor spacing, as a fraction of heart height.
const ANCHOR_START_SPACING: f32 = 0.12;
/// Spacing below which anchor placement gives up and pads.
const ANCHOR_MIN_SPACING: f32 = 0.045;
const ANCHOR_SHRINK: f32 = 0.9;
const ANCHOR_RADIUS_EXPONENT: f32 = 0.72;

/// Point on the heart curve at parameter `t`.
#[inline]
pub fn heart_curve(t: f32) -> Vec2 {
    Vec2::new(
        16.0 * t.sin().powi(3),
        13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos(),
    )
}

/// World-space height visible at `distance` for a vertical field of view.
#[inline]
pub fn visible_height(distance: f32, fov_degrees: f32) -> f32 {
    2.0 * (fov_degrees.to_radians() / 2.0).tan() * distance
}

/// On-screen size of the heart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartMetrics {
    /// Target height in world units.
    pub height: f32,
    /// Multiplier from curve units to world units.
    pub scale: f32,
}

impl HeartMetrics {
    /// Size the heart to fill `occupancy` of the visible height.
    pub fn compute(camera_distance: f32, fov_degrees: f32, occupancy: f32) -> Self {
        let height = visible_height(camera_distance, fov_degrees) * occupancy;
        Self {
            height,
            scale: height / UNIT_HEART_HEIGHT,
        }
    }
}

/// Fill the heart with `count` points.
///
/// Radii are `sqrt(u)` of the outline; depth is thickest at the center and
/// thins toward the rim.
pub fn build_points(metrics: &HeartMetrics, depth: f32, count: usize, rng: &mut Scatter) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let t = rng.random() * TAU;
            let r = rng.random().sqrt();
            let outline = heart_curve(t) * r * metrics.scale;
            let z = (rng.random() * 2.0 - 1.0) * depth * (0.35 + (1.0 - r));
            outline.extend(z)
        })
        .collect()
}

/// Placement and idle animation for one photo card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartAnchor {
    pub position: Vec3,
    /// Wobble phase, radians.
    pub phase: f32,
    /// Wobble height, world units.
    pub amplitude: f32,
    /// Wobble rate, radians per second.
    pub speed: f32,
    pub base_scale: f32,
}

/// Pick exactly `target_count` anchor positions inside the heart.
///
/// Candidates are shuffled, then scanned greedily keeping those at least
/// `min_dist` from every kept one. A short scan shrinks `min_dist` by 10%
/// and starts over, until it drops below 4.5% of the heart height; any
/// remaining shortfall is padded from the candidate list in order.
///
/// Every shrink rescans all candidates against all kept anchors, which is
/// fine for a few dozen anchors but grows quadratically.
pub fn generate_anchor_positions(
    metrics: &HeartMetrics,
    depth: f32,
    target_count: usize,
    rng: &mut Scatter,
) -> Vec<Vec3> {
    if target_count == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<Vec3> = (0..ANCHOR_CANDIDATES)
        .map(|_| {
            let t = rng.random() * TAU;
            let r = rng.random().powf(ANCHOR_RADIUS_EXPONENT);
            let outline = heart_curve(t) * r * metrics.scale;
            let z = (rng.random() * 2.0 - 1.0) * depth * (0.22 + (1.0 - r) * 0.9);
            outline.extend(z)
        })
        .collect();
    candidates.shuffle(rng);

    let mut selected: Vec<Vec3> = Vec::with_capacity(target_count);
    let mut min_dist = metrics.height * ANCHOR_START_SPACING;
    let floor = metrics.height * ANCHOR_MIN_SPACING;
    let mut passes = 0;

    while selected.len() < target_count && min_dist > floor {
        selected.clear();
        for c in &candidates {
            if selected.len() >= target_count {
                break;
            }
            if selected.iter().all(|s| c.distance(*s) >= min_dist) {
                selected.push(*c);
            }
        }
        min_dist *= ANCHOR_SHRINK;
        passes += 1;
    }

    let spaced = selected.len();
    while selected.len() < target_count {
        selected.push(candidates[selected.len() % candidates.len()]);
    }
    debug!(passes, spaced, padded = target_count - spaced, "placed heart anchors");
    selected
}

/// Anchor positions plus randomized animation parameters.
pub fn generate_anchors(
    metrics: &HeartMetrics,
    depth: f32,
    target_count: usize,
    rng: &mut Scatter,
) -> Vec<HeartAnchor> {
    generate_anchor_positions(metrics, depth, target_count, rng)
        .into_iter()
        .map(|position| HeartAnchor {
            position,
            phase: rng.random() * TAU,
            amplitude: rng.random_range(0.25, 0.62),
            speed: rng.random_range(0.4, 1.0),
            base_scale: rng.random_range(0.9, 1.12),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn metrics() -> HeartMetrics {
        HeartMetrics::compute(220.0, 45.0, 0.6)
    }

    #[test]
    fn test_curve_closed_form() {
        let top = heart_curve(0.0);
        assert!(top.x.abs() < 1e-6);
        assert!((top.y - 5.0).abs() < 1e-5);

        // cos(3π/2) = 0, so y = 5 − 1 = 4.
        let side = heart_curve(FRAC_PI_2);
        assert!((side.x - 16.0).abs() < 1e-4);
        assert!((side.y - 4.0).abs() < 1e-4);

        // Bottom tip: 13·(−1) − 5 − 2·(−1) − 1 = −17
        let tip = heart_curve(PI);
        assert!((tip.y + 17.0).abs() < 1e-4);
    }

    #[test]
    fn test_metrics_scale() {
        let m = metrics();
        let visible = 2.0 * (22.5f32.to_radians()).tan() * 220.0;
        assert!((m.height - visible * 0.6).abs() < 1e-3);
        assert!((m.scale - m.height / 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_points_inside_bounds() {
        let m = metrics();
        let mut rng = Scatter::seeded(5);
        let points = build_points(&m, 18.0, 2000, &mut rng);
        assert_eq!(points.len(), 2000);
        for p in &points {
            assert!(p.x.abs() <= 16.0 * m.scale + 1e-3);
            assert!(p.y <= 12.0 * m.scale && p.y >= -17.0 * m.scale - 1e-3);
            assert!(p.z.abs() <= 18.0 * 1.35 + 1e-3);
        }
    }

    #[test]
    fn test_anchor_count_exact() {
        let m = metrics();
        for seed in 0..5 {
            let mut rng = Scatter::seeded(seed);
            assert_eq!(generate_anchors(&m, 18.0, 24, &mut rng).len(), 24);
        }
    }

    #[test]
    fn test_anchor_spacing_respected_when_feasible() {
        let m = metrics();
        let mut rng = Scatter::seeded(11);
        let anchors = generate_anchor_positions(&m, 18.0, 6, &mut rng);
        // Six anchors easily fit at the starting spacing.
        for (i, a) in anchors.iter().enumerate() {
            for b in &anchors[i + 1..] {
                assert!(a.distance(*b) >= m.height * ANCHOR_START_SPACING);
            }
        }
    }

    #[test]
    fn test_anchors_pad_when_crowded() {
        let m = metrics();
        let mut rng = Scatter::seeded(3);
        let anchors = generate_anchors(&m, 18.0, 2000, &mut rng);
        assert_eq!(anchors.len(), 2000);
    }

    #[test]
    fn test_anchor_shrink_is_bounded() {
        // 0.12 * 0.9^n < 0.045 after ten shrinks.
        let mut spacing = ANCHOR_START_SPACING;
        let mut n = 0;
        while spacing > ANCHOR_MIN_SPACING {
            spacing *= ANCHOR_SHRINK;
            n += 1;
        }
        assert!(n <= 20);
    }

    #[test]
    fn test_anchor_parameters_in_range() {
        let mut rng = Scatter::seeded(8);
        for a in generate_anchors(&metrics(), 18.0, 24, &mut rng) {
            assert!((0.25..=0.62).contains(&a.amplitude));
            assert!((0.4..=1.0).contains(&a.speed));
            assert!((0.9..=1.12).contains(&a.base_scale));
        }
    }
}
