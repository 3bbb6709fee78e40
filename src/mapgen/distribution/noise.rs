// src/mapgen/distribution/noise.rs
//! Perlin-thresholded sampling: attempts cluster where the noise field is high,
//! which reads as nebula-like debris clouds.

use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use rand::RngCore;

use crate::mapgen::core::{PlacementDistribution, PlacementField};

pub struct NoiseDistribution {
    perlin: Perlin,
    /// Noise cycles per sector.
    frequency: f64,
    /// Points whose noise value is not above this are rejected.
    threshold: f64,
    /// Rejections tolerated before falling back to a uniform point.
    retries: u32,
}

impl NoiseDistribution {
    pub fn new(seed: u32, frequency: f64, threshold: f64, retries: u32) -> Self {
        Self { perlin: Perlin::new(seed), frequency, threshold, retries }
    }

    /// Noise value at `point`, in sector units scaled by `frequency`.
    pub fn sample(&self, field: &PlacementField, point: IVec2) -> f64 {
        let local = (point - field.origin).as_dvec2() / field.sector_size.max(1) as f64;
        let p = local * self.frequency;
        self.perlin.get([p.x, p.y])
    }

    pub fn accepts(&self, field: &PlacementField, point: IVec2) -> bool {
        self.sample(field, point) > self.threshold
    }
}

impl PlacementDistribution for NoiseDistribution {
    fn generate(&self, field: &PlacementField, rng: &mut dyn RngCore) -> IVec2 {
        for _ in 0..self.retries {
            let p = field.random_point(rng);
            if self.accepts(field, p) {
                return p;
            }
        }
        field.random_point(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn field() -> PlacementField {
        PlacementField::new(IVec2::new(-500, -500), 1000, 100)
    }

    #[test]
    fn same_seed_same_points() {
        let a = NoiseDistribution::new(42, 0.35, 0.1, 16);
        let b = NoiseDistribution::new(42, 0.35, 0.1, 16);
        let mut ra = ChaCha8Rng::seed_from_u64(9);
        let mut rb = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..100 {
            assert_eq!(a.generate(&field(), &mut ra), b.generate(&field(), &mut rb));
        }
    }

    #[test]
    fn biases_towards_high_noise() {
        let dist = NoiseDistribution::new(7, 0.35, 0.0, 32);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let accepted = (0..500)
            .map(|_| dist.generate(&field(), &mut rng))
            .filter(|p| dist.accepts(&field(), *p))
            .count();
        // Roughly half the field is above zero; with 32 retries nearly every point should be.
        assert!(accepted > 450, "{accepted}");
    }

    #[test]
    fn unreachable_threshold_falls_back_to_uniform() {
        let dist = NoiseDistribution::new(1, 0.35, 10.0, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let bounds = field().bounds();
        for _ in 0..50 {
            assert!(bounds.contains_point(dist.generate(&field(), &mut rng)));
        }
    }
}
