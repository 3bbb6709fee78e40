// src/mapgen/core.rs
//! Core types/traits for sector-indexed structure placement.
//! Keep this file dependency-light; the grid, strip algebra and runner all build on it.

use bevy::math::I64Vec2;
use bevy::prelude::*; // IVec2
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::processors::{FlagUpdate, SplitMarker};
use super::registry::StructureDef;

// ---------- Regions, boxes, sectors ----------

/// Identifies the map (or any other isolated coordinate space) objects are placed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// Half-open axis-aligned box: `[left, left + width) x [bottom, bottom + height)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub bottom: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub const fn new(left: i32, bottom: i32, width: i32, height: i32) -> Self {
        Self { left, bottom, width, height }
    }

    /// Box spanning `min` (inclusive) to `max` (exclusive).
    pub fn from_corners(min: IVec2, max: IVec2) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    #[inline]
    pub fn right(&self) -> i32 { self.left + self.width }
    #[inline]
    pub fn top(&self) -> i32 { self.bottom + self.height }
    #[inline]
    pub fn min(&self) -> IVec2 { IVec2::new(self.left, self.bottom) }
    #[inline]
    pub fn max(&self) -> IVec2 { IVec2::new(self.right(), self.top()) }
    #[inline]
    pub fn size(&self) -> IVec2 { IVec2::new(self.width, self.height) }

    /// Area in square world units; zero for degenerate boxes.
    pub fn area(&self) -> i64 {
        if self.is_degenerate() { 0 } else { self.width as i64 * self.height as i64 }
    }

    /// True when the box has no interior (zero or negative extent on either axis).
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Grows the box by `amount` on every side.
    pub fn inflated(&self, amount: i32) -> Self {
        Self::new(
            self.left - amount,
            self.bottom - amount,
            self.width + 2 * amount,
            self.height + 2 * amount,
        )
    }

    pub fn translated(&self, offset: IVec2) -> Self {
        Self::new(self.left + offset.x, self.bottom + offset.y, self.width, self.height)
    }

    /// Same size, moved so its bottom-left corner sits at `min`.
    pub fn with_origin(&self, min: IVec2) -> Self {
        Self::new(min.x, min.y, self.width, self.height)
    }

    /// Interior overlap test; boxes that merely touch do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_degenerate()
            && !other.is_degenerate()
            && self.left < other.right()
            && other.left < self.right()
            && self.bottom < other.top()
            && other.bottom < self.top()
    }

    pub fn contains_box(&self, other: &Self) -> bool {
        other.left >= self.left
            && other.bottom >= self.bottom
            && other.right() <= self.right()
            && other.top() <= self.top()
    }

    pub fn contains_point(&self, p: IVec2) -> bool {
        p.x >= self.left && p.x < self.right() && p.y >= self.bottom && p.y < self.top()
    }
}

/// Integer grid coordinate of one square sector, counted from the field origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SectorKey(pub IVec2);

/// The square area a batch populates, and how it is tiled into sectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementField {
    /// Bottom-left corner of the square.
    pub origin: IVec2,
    /// Side length of the square.
    pub size: i32,
    /// Side length of one sector.
    pub sector_size: i32,
}

impl PlacementField {
    pub const fn new(origin: IVec2, size: i32, sector_size: i32) -> Self {
        Self { origin, size, sector_size }
    }

    /// A field with no area, a non-positive sector size, or a far corner past
    /// the `i32` range cannot hold anything.
    pub fn is_degenerate(&self) -> bool {
        self.size <= 0
            || self.sector_size <= 0
            || self.origin.x.checked_add(self.size).is_none()
            || self.origin.y.checked_add(self.size).is_none()
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.origin.x, self.origin.y, self.size, self.size)
    }

    /// Number of sectors along one side (the last row/column may be partial).
    pub fn sectors_per_side(&self) -> i32 {
        if self.is_degenerate() { 0 } else { (self.size - 1) / self.sector_size + 1 }
    }

    /// Sector containing `point`; may be a key outside the field.
    pub fn sector_of(&self, point: IVec2) -> SectorKey {
        let local = point - self.origin;
        SectorKey(IVec2::new(
            local.x.div_euclid(self.sector_size.max(1)),
            local.y.div_euclid(self.sector_size.max(1)),
        ))
    }

    /// World-space tile of `key`, clipped to the field.
    pub fn sector_bounds(&self, key: SectorKey) -> BoundingBox {
        let min = self.origin + key.0 * self.sector_size;
        let far = self.origin.as_i64vec2() + I64Vec2::splat(self.size as i64);
        let max = (min.as_i64vec2() + I64Vec2::splat(self.sector_size as i64)).min(far);
        BoundingBox::from_corners(min, max.as_ivec2())
    }

    /// Uniform sample over the whole square.
    pub fn random_point(&self, rng: &mut dyn RngCore) -> IVec2 {
        if self.size <= 0 {
            return self.origin;
        }
        IVec2::new(
            rng.random_range(self.origin.x..self.origin.x + self.size),
            rng.random_range(self.origin.y..self.origin.y + self.size),
        )
    }
}

// ---------- Traits: world, processors, distributions ----------

/// Everything the engine needs from the host simulation.
///
/// Objects that have been created but not yet positioned are invisible to
/// `objects_intersecting`.
pub trait MapGenWorld {
    type Handle: Copy + Eq + Debug;

    /// Whether `region` can currently receive objects.
    fn region_exists(&self, region: RegionId) -> bool;

    /// Instantiates `structure` without positioning it. Returns its local bounds.
    fn create_object(
        &mut self,
        region: RegionId,
        structure: &StructureDef,
    ) -> Option<(BoundingBox, Self::Handle)>;

    /// Moves the object's local origin to `position`.
    fn set_position(&mut self, handle: Self::Handle, position: IVec2);

    fn destroy_object(&mut self, handle: Self::Handle);

    /// Positioned objects in `region` whose world bounds intersect `area`.
    fn objects_intersecting(&self, region: RegionId, area: BoundingBox) -> Vec<Self::Handle>;

    fn find_overlapping(&self, region: RegionId, area: BoundingBox) -> bool {
        !self.objects_intersecting(region, area).is_empty()
    }

    /// IFF-style label/visibility flags. Hosts without such a concept ignore it.
    fn apply_flags(&mut self, _handle: Self::Handle, _update: &FlagUpdate) {}

    /// Tags the object so pieces split off it later inherit `marker`.
    fn mark_split(&mut self, _handle: Self::Handle, _marker: &SplitMarker) {}
}

/// Post-placement step run on a single object (`is_global == false`) or on
/// every object of a finished batch (`is_global == true`).
pub trait Processor<W: MapGenWorld> {
    fn process(&self, world: &mut W, region: RegionId, handle: W::Handle, is_global: bool);
}

impl<W: MapGenWorld, P: Processor<W> + ?Sized> Processor<W> for Box<P> {
    fn process(&self, world: &mut W, region: RegionId, handle: W::Handle, is_global: bool) {
        (**self).process(world, region, handle, is_global)
    }
}

/// Strategy biasing where inside the field placement attempts land.
/// Must be deterministic for identical RNG state.
pub trait PlacementDistribution: Send + Sync + 'static {
    fn generate(&self, field: &PlacementField, rng: &mut dyn RngCore) -> IVec2;
}
