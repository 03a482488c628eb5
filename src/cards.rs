//! Photo cards hung on the heart, and the heart's idle motion.
//!
//! Once the heart has formed, each [`HeartAnchor`] gets a [`PhotoCard`].
//! [`HeartMotion`] then runs every frame: it eases a spread factor toward a
//! value chosen by the camera zoom (zoomed in pushes the heart apart, zoomed
//! out pulls it together), slowly spins the heart group and bobs each card
//! on its own phase.
//!
//! ```ignore
//! let cards = layout_cards(&anchors, &metrics, &config.heart, &mut rng);
//! let mut motion = HeartMotion::new(base_points);
//! motion.update(dt, camera.zoom_fraction(), &config.heart);
//! field.set_spread_targets(motion.base_targets(), motion.spread());
//! for card in &cards {
//!     let pose = motion.card_pose(card, elapsed_secs);
//! }
//! ```

use crate::config::HeartConfig;
use crate::heart::{HeartAnchor, HeartMetrics};
use crate::scatter::Scatter;
use glam::Vec3;

/// Frame border relative to the photo.
pub const FRAME_SCALE: f32 = 1.07;
/// Photo aspect ratio, width over height.
pub const CARD_ASPECT: f32 = 0.72;

const TILT_Z_RANGE: f32 = 0.35;
const TILT_Y_RANGE: f32 = 0.25;

/// A photo placed on the heart.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoCard {
    pub anchor: HeartAnchor,
    /// Index into the preloaded texture list.
    pub texture_index: usize,
    pub width: f32,
    pub height: f32,
    /// Frame size relative to the photo.
    pub frame_scale: f32,
    /// Fixed rotation around Y, radians.
    pub tilt_y: f32,
    /// Fixed rotation around Z, radians.
    pub tilt_z: f32,
}

/// One card per anchor, sized relative to the heart.
pub fn layout_cards(
    anchors: &[HeartAnchor],
    metrics: &HeartMetrics,
    config: &HeartConfig,
    rng: &mut Scatter,
) -> Vec<PhotoCard> {
    anchors
        .iter()
        .enumerate()
        .map(|(i, anchor)| {
            let height = metrics.height
                * config.photo_height_ratio
                * rng.random_range(config.photo_scale_min, config.photo_scale_max);
            PhotoCard {
                anchor: *anchor,
                texture_index: i,
                width: height * CARD_ASPECT,
                height,
                frame_scale: FRAME_SCALE,
                tilt_z: (rng.random() - 0.5) * TILT_Z_RANGE,
                tilt_y: (rng.random() - 0.5) * TILT_Y_RANGE,
            }
        })
        .collect()
}

/// Where a card is drawn this frame, in heart-group space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPose {
    pub position: Vec3,
    pub scale: f32,
}

/// Spread, spin and wobble of the formed heart.
#[derive(Debug, Clone)]
pub struct HeartMotion {
    base_targets: Vec<Vec3>,
    spread: f32,
    rotation_y: f32,
}

impl HeartMotion {
    /// Start at spread 1 with no rotation.
    pub fn new(base_targets: Vec<Vec3>) -> Self {
        Self {
            base_targets,
            spread: 1.0,
            rotation_y: 0.0,
        }
    }

    /// Heart points at spread 1.
    pub fn base_targets(&self) -> &[Vec3] {
        &self.base_targets
    }

    pub fn spread(&self) -> f32 {
        self.spread
    }

    /// Heart group rotation around Y, radians.
    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    /// Advance by `dt` seconds.
    ///
    /// `zoom_fraction` is 0 at the nearest camera distance and 1 at the
    /// farthest.
    pub fn update(&mut self, dt: f32, zoom_fraction: f32, config: &HeartConfig) {
        let t = zoom_fraction.clamp(0.0, 1.0);
        let target = config.zoom_spread_near + (config.zoom_spread_far - config.zoom_spread_near) * t;
        self.spread += (target - self.spread) * (dt * config.spread_lerp).min(1.0);
        self.rotation_y += config.rotation_speed * dt;
    }

    /// Replace the base shape, e.g. after a resize, and snap back to spread 1.
    pub fn rebuild(&mut self, base_targets: Vec<Vec3>) {
        self.base_targets = base_targets;
        self.spread = 1.0;
    }

    /// Card pose at `time_secs` since start.
    pub fn card_pose(&self, card: &PhotoCard, time_secs: f32) -> CardPose {
        let a = &card.anchor;
        let wobble = (time_secs * a.speed + a.phase).sin() * a.amplitude;
        CardPose {
            position: a.position * self.spread + Vec3::new(0.0, wobble, 0.0),
            scale: a.base_scale * (0.86 + (self.spread - 1.0) * 0.5).clamp(0.74, 1.2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heart::generate_anchors;

    fn metrics() -> HeartMetrics {
        HeartMetrics::compute(220.0, 45.0, 0.6)
    }

    #[test]
    fn test_layout_sizes() {
        let config = HeartConfig::default();
        let mut rng = Scatter::seeded(4);
        let anchors = generate_anchors(&metrics(), config.depth, 24, &mut rng);
        let cards = layout_cards(&anchors, &metrics(), &config, &mut rng);
        assert_eq!(cards.len(), 24);
        let base = metrics().height * config.photo_height_ratio;
        for (i, card) in cards.iter().enumerate() {
            assert_eq!(card.texture_index, i);
            assert!(card.height >= base * 0.75 - 1e-4 && card.height <= base * 1.15 + 1e-4);
            assert!((card.width - card.height * 0.72).abs() < 1e-5);
            assert!(card.tilt_z.abs() <= 0.175 && card.tilt_y.abs() <= 0.125);
        }
    }

    #[test]
    fn test_spread_converges_to_zoom_target() {
        let config = HeartConfig::default();
        let mut motion = HeartMotion::new(vec![Vec3::new(10.0, 0.0, 0.0)]);
        for _ in 0..600 {
            motion.update(1.0 / 60.0, 1.0, &config);
        }
        assert!((motion.spread() - 0.82).abs() < 1e-3);
        for _ in 0..600 {
            motion.update(1.0 / 60.0, 0.0, &config);
        }
        assert!((motion.spread() - 1.2).abs() < 1e-3);
        assert!((motion.rotation_y() - 0.24 * 20.0).abs() < 1e-2);
    }

    #[test]
    fn test_large_dt_does_not_overshoot() {
        let config = HeartConfig::default();
        let mut motion = HeartMotion::new(Vec::new());
        motion.update(5.0, 1.0, &config);
        assert!((motion.spread() - 0.82).abs() < 1e-6);
    }

    #[test]
    fn test_card_pose_scale_clamped() {
        let anchor = HeartAnchor {
            position: Vec3::new(2.0, 4.0, 0.0),
            phase: 0.0,
            amplitude: 0.5,
            speed: 1.0,
            base_scale: 1.0,
        };
        let card = PhotoCard {
            anchor,
            texture_index: 0,
            width: 7.2,
            height: 10.0,
            frame_scale: FRAME_SCALE,
            tilt_y: 0.0,
            tilt_z: 0.0,
        };
        let motion = HeartMotion::new(Vec::new());
        let pose = motion.card_pose(&card, 0.0);
        assert_eq!(pose.position, Vec3::new(2.0, 4.0, 0.0));
        assert!((pose.scale - 0.86).abs() < 1e-6);
    }

    #[test]
    fn test_rebuild_resets_spread() {
        let config = HeartConfig::default();
        let mut motion = HeartMotion::new(vec![Vec3::ONE]);
        motion.update(1.0, 0.0, &config);
        assert!(motion.spread() > 1.0);
        motion.rebuild(vec![Vec3::X, Vec3::Y]);
        assert_eq!(motion.spread(), 1.0);
        assert_eq!(motion.base_targets().len(), 2);
    }
}
