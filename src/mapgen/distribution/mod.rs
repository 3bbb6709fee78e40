// src/mapgen/distribution/mod.rs
//! Placement distributions: where inside the field a batch tries to put things.

use rand::{Rng, RngCore};

use crate::mapgen::core::PlacementDistribution;
use crate::mapgen::registry::{DistributionDef, MapGenSettings};

mod noise;
mod ring;
mod uniform;

pub use self::noise::NoiseDistribution;
pub use ring::RingDistribution;
pub use uniform::UniformDistribution;

/// Factory: build a boxed distribution from its config form.
pub fn make_distribution(
    def: &DistributionDef,
    settings: &MapGenSettings,
) -> Box<dyn PlacementDistribution> {
    match def {
        DistributionDef::Uniform => Box::new(UniformDistribution),
        DistributionDef::Noise { seed, frequency, threshold } => Box::new(NoiseDistribution::new(
            *seed,
            *frequency,
            *threshold,
            settings.noise_retries,
        )),
    }
}

/// Distribution for one batch: occasionally the ring, otherwise whatever `def` says.
pub fn choose_distribution(
    def: &DistributionDef,
    settings: &MapGenSettings,
    rng: &mut dyn RngCore,
) -> Box<dyn PlacementDistribution> {
    let chance = if settings.alternate_chance.is_finite() {
        settings.alternate_chance.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if rng.random_bool(chance) {
        return Box::new(RingDistribution::default());
    }
    make_distribution(def, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::core::PlacementField;
    use bevy::prelude::IVec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn samples(dist: &dyn PlacementDistribution, seed: u64) -> Vec<IVec2> {
        let field = PlacementField::new(IVec2::new(-300, 40), 600, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..64).map(|_| dist.generate(&field, &mut rng)).collect()
    }

    #[test]
    fn factory_is_deterministic_for_every_kind() {
        let settings = MapGenSettings::default();
        for def in [
            DistributionDef::Uniform,
            DistributionDef::Noise { seed: 3, frequency: 0.5, threshold: 0.2 },
        ] {
            let a = make_distribution(&def, &settings);
            let b = make_distribution(&def, &settings);
            assert_eq!(samples(a.as_ref(), 77), samples(b.as_ref(), 77), "{def:?}");
        }
    }

    #[test]
    fn alternate_chance_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let field = PlacementField::new(IVec2::ZERO, 1000, 100);
        let centre = IVec2::splat(500);

        // Always the ring: samples never land near the centre.
        let always = MapGenSettings { alternate_chance: 1.0, ..MapGenSettings::default() };
        let dist = choose_distribution(&DistributionDef::Uniform, &always, &mut rng);
        for _ in 0..200 {
            let p = dist.generate(&field, &mut rng);
            assert!((p - centre).as_vec2().length() > 250.0, "{p:?}");
        }

        // Never the ring, even with a nonsense chance.
        let never = MapGenSettings { alternate_chance: f64::NAN, ..MapGenSettings::default() };
        let dist = choose_distribution(&DistributionDef::Uniform, &never, &mut rng);
        let near_centre = (0..500)
            .map(|_| dist.generate(&field, &mut rng))
            .filter(|p| (*p - centre).as_vec2().length() < 250.0)
            .count();
        assert!(near_centre > 0);
    }
}
