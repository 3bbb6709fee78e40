// src/mapgen/picker.rs
//! Weighted random selection.

use rand::{Rng, RngCore};

/// Picks one item with probability proportional to `weight_of`.
///
/// Weights are relative. Negative and NaN weights count as zero; if no item
/// has a positive weight the choice is uniform over all items. Returns `None`
/// only for an empty slice.
pub fn pick_weighted<'a, T>(
    items: &'a [T],
    weight_of: impl Fn(&T) -> f32,
    rng: &mut dyn RngCore,
) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }

    let total: f32 = items.iter().map(|i| weight_of(i).max(0.0)).sum();
    if !(total > 0.0 && total.is_finite()) {
        return items.get(rng.random_range(0..items.len()));
    }

    let mut draw = rng.random_range(0.0..total);
    let mut last = None;
    for item in items {
        let w = weight_of(item).max(0.0);
        if w <= 0.0 {
            continue;
        }
        if w > draw {
            return Some(item);
        }
        draw -= w;
        last = Some(item);
    }

    // Float rounding can leave `draw` just past the final bucket.
    last
}
