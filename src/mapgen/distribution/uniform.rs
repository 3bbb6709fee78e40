// src/mapgen/distribution/uniform.rs
//! Uniform sampling over the whole field (the default).

use bevy::prelude::*;
use rand::RngCore;

use crate::mapgen::core::{PlacementDistribution, PlacementField};

#[derive(Clone, Copy, Debug, Default)]
pub struct UniformDistribution;

impl PlacementDistribution for UniformDistribution {
    fn generate(&self, field: &PlacementField, rng: &mut dyn RngCore) -> IVec2 {
        field.random_point(rng)
    }
}
