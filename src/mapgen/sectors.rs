// src/mapgen/sectors.rs
//! Square-sector tiling of a placement field with per-sector free-space bookkeeping.
//! One grid lives for exactly one batch; it is never shared between batches.

use bevy::prelude::*;
use std::collections::HashMap;

use super::core::{BoundingBox, PlacementField, SectorKey};
use super::strips::{self, FreeStrip};

/// Free space of one sector.
#[derive(Clone, Debug)]
pub struct Sector {
    pub bounds: BoundingBox,
    strips: Vec<FreeStrip>,
    /// Cached `strip_set_area(strips)`, used to reject sectors cheaply.
    free_area: i64,
}

impl Sector {
    fn new(bounds: BoundingBox) -> Self {
        Self {
            bounds,
            strips: vec![FreeStrip::from_box(&bounds)],
            free_area: bounds.area(),
        }
    }

    pub fn strips(&self) -> &[FreeStrip] {
        &self.strips
    }

    pub fn free_area(&self) -> i64 {
        self.free_area
    }
}

/// Sector-keyed free-space index for one batch.
#[derive(Clone, Debug)]
pub struct SectorGrid {
    field: PlacementField,
    sectors: HashMap<SectorKey, Sector>,
}

impl SectorGrid {
    /// Tiles the field with fully free sectors. A degenerate field yields an empty grid.
    pub fn new(field: &PlacementField) -> Self {
        let per_side = field.sectors_per_side();
        let tiles = (per_side as usize).saturating_mul(per_side as usize);
        let mut sectors = HashMap::with_capacity(tiles.min(1 << 16));
        for y in 0..per_side {
            for x in 0..per_side {
                let key = SectorKey(IVec2::new(x, y));
                sectors.insert(key, Sector::new(field.sector_bounds(key)));
            }
        }
        Self { field: *field, sectors }
    }

    pub fn field(&self) -> &PlacementField {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn sector(&self, key: SectorKey) -> Option<&Sector> {
        self.sectors.get(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = SectorKey> + '_ {
        self.sectors.keys().copied()
    }

    /// Cached free area; unknown keys count as fully occupied.
    pub fn free_area_of(&self, key: SectorKey) -> i64 {
        self.sectors.get(&key).map_or(0, |s| s.free_area)
    }

    /// Free strips of `key`; empty for unknown keys.
    pub fn strips_of(&self, key: SectorKey) -> &[FreeStrip] {
        self.sectors.get(&key).map(|s| s.strips.as_slice()).unwrap_or(&[])
    }

    pub fn total_free_area(&self) -> i64 {
        self.sectors.values().map(|s| s.free_area).sum()
    }

    /// Marks `placed` as occupied inside sector `key`.
    ///
    /// The box must lie within the sector's free space. If it does not, the
    /// strips are still updated, the cached area is resynchronised from them
    /// and an error is returned.
    pub fn commit(&mut self, key: SectorKey, placed: &BoundingBox) -> Result<(), MapGenError> {
        let Some(sector) = self.sectors.get_mut(&key) else {
            error!("SectorGrid: commit into unknown sector {:?}", key);
            return Err(MapGenError::UnknownSector { key });
        };

        let before = strips::strip_set_area(&sector.strips);
        sector.strips = strips::subtract(&sector.strips, placed);
        let removed = before - strips::strip_set_area(&sector.strips);
        sector.free_area -= placed.area();

        if removed != placed.area() {
            sector.free_area = strips::strip_set_area(&sector.strips);
            error!(
                "SectorGrid: box {:?} was not fully free in sector {:?} (expected {}, removed {})",
                placed, key, placed.area(), removed
            );
            return Err(MapGenError::CommitOutsideFreeSpace {
                key,
                expected: placed.area(),
                removed,
            });
        }

        Ok(())
    }

    /// True when every cached area matches its strips.
    pub fn is_consistent(&self) -> bool {
        self.sectors
            .values()
            .all(|s| s.free_area >= 0 && s.free_area == strips::strip_set_area(&s.strips))
    }
}

/// Logic errors in grid bookkeeping. These indicate a bug, not a full map.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MapGenError {
    #[error("sector {key:?} is not part of the grid")]
    UnknownSector { key: SectorKey },
    #[error(
        "committed box was not free in sector {key:?} (expected to remove {expected}, removed {removed})"
    )]
    CommitOutsideFreeSpace { key: SectorKey, expected: i64, removed: i64 },
}
