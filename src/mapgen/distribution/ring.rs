// src/mapgen/distribution/ring.rs
//! Rare alternate distribution: attempts land on a ring around the field centre,
//! leaving the middle open.

use bevy::prelude::*;
use rand::{Rng, RngCore};
use std::f32::consts::TAU;

use crate::mapgen::core::{PlacementDistribution, PlacementField};

#[derive(Clone, Copy, Debug)]
pub struct RingDistribution {
    /// Inner edge of the ring as a fraction of the half-size.
    pub inner: f32,
    /// Outer edge of the ring as a fraction of the half-size.
    pub outer: f32,
}

impl Default for RingDistribution {
    fn default() -> Self {
        Self { inner: 0.6, outer: 0.95 }
    }
}

impl PlacementDistribution for RingDistribution {
    fn generate(&self, field: &PlacementField, rng: &mut dyn RngCore) -> IVec2 {
        if field.size <= 0 {
            return field.origin;
        }
        let half = field.size as f32 * 0.5;
        let (lo, hi) = (self.inner.min(self.outer), self.inner.max(self.outer));
        let radius = if hi > lo { rng.random_range(lo..hi) } else { lo } * half;
        let angle = rng.random_range(0.0..TAU);

        let centre = field.origin.as_vec2() + Vec2::splat(half);
        let p = (centre + Vec2::from_angle(angle) * radius).floor().as_ivec2();
        p.clamp(field.origin, field.origin + IVec2::splat(field.size - 1))
    }
}
