//! Random sampling helpers shared by the particle, heart and firework code.
//!
//! ```ignore
//! let mut scatter = Scatter::seeded(7);
//! let spawn = scatter.random_in_sphere(48.0);
//! let dir = scatter.random_direction();
//! let speed = scatter.random_range(0.6, 1.3);
//! ```

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use std::f32::consts::TAU;

/// Random source with helpers for common spawn patterns.
///
/// Implements [`RngCore`], so it can be handed to anything that takes
/// `&mut impl Rng`.
#[derive(Debug, Clone)]
pub struct Scatter {
    rng: SmallRng,
}

impl Scatter {
    /// Deterministic sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Different sequence every run.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Derive an independent child stream, for handing to another component.
    pub fn fork(&mut self) -> Self {
        Self::seeded(self.rng.next_u64())
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 between `min` and `max`. A collapsed range returns `min`.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.rng.gen::<f32>() * (max - min)
    }

    /// Random integer in `min..=max`.
    #[inline]
    pub fn random_int(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Random index below `len`. `len` must be non-zero.
    #[inline]
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    // ========== Position helpers ==========

    /// Random point inside a sphere of given radius, centered at origin.
    ///
    /// Distribution is uniform throughout the volume.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        let theta = TAU * self.random();
        let phi = (2.0 * self.random() - 1.0).clamp(-1.0, 1.0).acos();
        // Cube root for uniform volume distribution
        let r = radius * self.random().cbrt();

        Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.cos(),
            r * phi.sin() * theta.sin(),
        )
    }

    /// Random unit vector, uniformly distributed on the unit sphere.
    pub fn random_direction(&mut self) -> Vec3 {
        let theta = TAU * self.random();
        let z = 2.0 * self.random() - 1.0;
        let ring = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(ring * theta.cos(), ring * theta.sin(), z)
    }
}

impl RngCore for Scatter {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_points_inside_radius() {
        let mut s = Scatter::seeded(1);
        for _ in 0..1000 {
            assert!(s.random_in_sphere(48.0).length() <= 48.0 + 1e-3);
        }
    }

    #[test]
    fn test_directions_are_unit() {
        let mut s = Scatter::seeded(2);
        for _ in 0..1000 {
            assert!((s.random_direction().length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_ranges() {
        let mut s = Scatter::seeded(3);
        for _ in 0..1000 {
            let v = s.random_range(0.6, 1.3);
            assert!((0.6..=1.3).contains(&v));
            let n = s.random_int(2, 3);
            assert!(n == 2 || n == 3);
        }
        assert_eq!(s.random_range(5.0, 5.0), 5.0);
        assert_eq!(s.random_int(4, 4), 4);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = Scatter::seeded(99);
        let mut b = Scatter::seeded(99);
        assert_eq!(a.random_in_sphere(1.0), b.random_in_sphere(1.0));
    }
}
