//! Background starfield.

use crate::color::{lerp, parse_hex};
use crate::config::StarConfig;
use crate::particles::PointMaterial;
use crate::scatter::Scatter;
use glam::{Vec2, Vec3};

/// Radius of the star ball.
pub const STAR_RADIUS: f32 = 680.0;
/// Vertical squash applied to star positions.
const Y_SQUASH: f32 = 0.8;
const STAR_OPACITY: f32 = 0.78;
/// Radians per second around Y and X.
const SPIN_Y: f32 = 0.012;
const SPIN_X: f32 = 0.004;

/// Static points drifting slowly around the scene.
#[derive(Debug, Clone)]
pub struct Starfield {
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
    material: PointMaterial,
    /// Accumulated rotation, x and y, radians.
    rotation: Vec2,
}

impl Starfield {
    /// Scatter `config.count` stars through a flattened ball.
    pub fn new(config: &StarConfig, rng: &mut Scatter) -> Self {
        let near = parse_hex("#f6f8ff").unwrap_or(Vec3::ONE);
        let far = parse_hex("#9db5ff").unwrap_or(Vec3::ONE);
        let mut positions = Vec::with_capacity(config.count);
        let mut colors = Vec::with_capacity(config.count);
        for _ in 0..config.count {
            let mut p = rng.random_in_sphere(STAR_RADIUS);
            p.y *= Y_SQUASH;
            positions.push(p);
            colors.push(lerp(near, far, rng.random()));
        }
        Self {
            positions,
            colors,
            material: PointMaterial {
                size: config.size,
                opacity: STAR_OPACITY,
            },
            rotation: Vec2::ZERO,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn color_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn material(&self) -> PointMaterial {
        self.material
    }

    /// Rotation around X and Y, radians.
    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn update(&mut self, dt: f32) {
        self.rotation.y += dt * SPIN_Y;
        self.rotation.x += dt * SPIN_X;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_count_and_bounds() {
        let config = StarConfig {
            count: 500,
            size: 1.15,
        };
        let stars = Starfield::new(&config, &mut Scatter::seeded(3));
        assert_eq!(stars.len(), 500);
        assert_eq!(stars.position_floats().len(), 1500);
        for p in stars.position_floats().chunks(3) {
            let v = Vec3::new(p[0], p[1], p[2]);
            assert!(v.length() <= STAR_RADIUS + 1e-2);
            assert!(p[1].abs() <= STAR_RADIUS * Y_SQUASH + 1e-2);
        }
    }

    #[test]
    fn test_rotation_advances() {
        let mut stars = Starfield::new(&StarConfig::default(), &mut Scatter::seeded(1));
        stars.update(10.0);
        assert!((stars.rotation().y - 0.12).abs() < 1e-6);
        assert!((stars.rotation().x - 0.04).abs() < 1e-6);
    }
}
