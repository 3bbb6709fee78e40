// src/mapgen/field.rs
//! Obstacle field sizing: how big the square is and how many obstacles go in it.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::registry::{GeneratorDef, StructureDef};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Obstacles requested before jitter.
    #[serde(default = "default_initial_amount")]
    pub initial_amount: usize,
    /// Obstacle count varies by up to this much either way.
    #[serde(default)]
    pub amount_amplitude: i32,
    /// Each obstacle type grows or shrinks by up to this much per field.
    #[serde(default)]
    pub size_amplitude: i32,
    /// Field side length grows with the number of players.
    #[serde(default = "default_meters_per_player")]
    pub meters_per_player: i32,
    /// Field size is rounded to a multiple of this.
    #[serde(default = "default_round_to")]
    pub round_to: i32,
    #[serde(default = "default_min_size")]
    pub min_size: i32,
    #[serde(default = "default_max_size")]
    pub max_size: i32,
}

impl Default for FieldDef {
    fn default() -> Self {
        Self {
            initial_amount: default_initial_amount(),
            amount_amplitude: 0,
            size_amplitude: 0,
            meters_per_player: default_meters_per_player(),
            round_to: default_round_to(),
            min_size: default_min_size(),
            max_size: default_max_size(),
        }
    }
}

fn default_initial_amount() -> usize { 60 }
fn default_meters_per_player() -> i32 { 150 }
fn default_round_to() -> i32 { 100 }
fn default_min_size() -> i32 { 1000 }
fn default_max_size() -> i32 { 5000 }

/// Side length of the field for `players` participants, rounded to
/// `round_to` and clamped to `[min_size, max_size]`.
pub fn field_size_for_players(players: u32, field: &FieldDef) -> i32 {
    let round_to = field.round_to.max(1) as f32;
    let raw = players as f32 * field.meters_per_player as f32 / round_to;
    let size = (raw.round() * round_to) as i32;
    size.max(field.min_size).min(field.max_size.max(field.min_size))
}

/// `initial_amount` jittered by `[-amount_amplitude, amount_amplitude)`, never below zero.
pub fn obstacle_count(field: &FieldDef, rng: &mut dyn RngCore) -> usize {
    let jitter = if field.amount_amplitude > 0 {
        rng.random_range(-field.amount_amplitude..field.amount_amplitude)
    } else {
        0
    };
    (field.initial_amount as i64 + jitter as i64).max(0) as usize
}

/// Per-field variants of the obstacle types.
///
/// Every structure draws one offset in `[-size_amplitude, size_amplitude)` and
/// adds it to its `Rect` sides (floored at 1) and its `min_distance` (floored
/// at 0). Templates keep their size; only their distance varies.
pub fn obstacle_structures(
    field: &FieldDef,
    structures: &[StructureDef],
    rng: &mut dyn RngCore,
) -> Vec<StructureDef> {
    let amplitude = field.size_amplitude;
    structures
        .iter()
        .map(|def| {
            let jitter = if amplitude > 0 { rng.random_range(-amplitude..amplitude) } else { 0 };
            let mut out = def.clone();
            out.min_distance = def.min_distance.saturating_add(jitter).max(0);
            if let GeneratorDef::Rect { width, height } = &mut out.generator {
                *width = width.saturating_add(jitter).max(1);
                *height = height.saturating_add(jitter).max(1);
            }
            out
        })
        .collect()
}
