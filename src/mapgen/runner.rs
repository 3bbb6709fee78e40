// src/mapgen/runner.rs
//! Batch and single-object placement against a `MapGenWorld`.

use bevy::math::I64Vec2;
use bevy::prelude::*;
use rand::{Rng, RngCore};

use super::core::{
    BoundingBox, MapGenWorld, PlacementDistribution, PlacementField, Processor, RegionId,
    SectorKey,
};
use super::picker::pick_weighted;
use super::registry::{MapGenSettings, ProcessorDef, StructureDef};
use super::sectors::SectorGrid;
use super::strips;

/// Input to one batch placement. Lives only for the call.
pub struct PlacementRequest<'a, P = ProcessorDef> {
    pub region: RegionId,
    /// Bottom-left corner of the square field.
    pub origin: IVec2,
    /// How many structures to attempt.
    pub count: usize,
    /// Side length of the square field.
    pub max_offset: i32,
    pub structures: &'a [StructureDef],
    /// Run on every placed object after the batch, in list order.
    pub global_processors: &'a [P],
    pub distribution: &'a dyn PlacementDistribution,
}

/// Outcome of a batch. `requested == placed + missed` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpawnReport {
    pub requested: usize,
    pub placed: usize,
    pub missed: usize,
}

impl SpawnReport {
    fn nothing_placed(requested: usize) -> Self {
        Self { requested, placed: 0, missed: requested }
    }
}

/// Places up to `request.count` structures; returns how many landed.
pub fn spawn_structures<W, P>(
    world: &mut W,
    request: &PlacementRequest<'_, P>,
    settings: &MapGenSettings,
    rng: &mut dyn RngCore,
) -> usize
where
    W: MapGenWorld,
    P: Processor<W>,
{
    spawn_structures_report(world, request, settings, rng).placed
}

/// Batch placement.
///
/// Each iteration picks a structure by weight, has the world build it, reserves
/// its box grown by `min_distance` on every side in a fresh `SectorGrid`, and
/// positions the object inside that reservation. Objects that find no room are
/// destroyed. Global processors run once the loop is over.
///
/// A missing region, a degenerate field or an empty structure list places
/// nothing and touches nothing.
pub fn spawn_structures_report<W, P>(
    world: &mut W,
    request: &PlacementRequest<'_, P>,
    settings: &MapGenSettings,
    rng: &mut dyn RngCore,
) -> SpawnReport
where
    W: MapGenWorld,
    P: Processor<W>,
{
    let region = request.region;
    if !world.region_exists(region) {
        warn!("spawn_structures: region {:?} does not exist", region);
        return SpawnReport::nothing_placed(request.count);
    }

    let field = PlacementField::new(request.origin, request.max_offset, settings.sector_size);
    if field.is_degenerate() {
        warn!(
            "spawn_structures: degenerate field (size {}, sector size {})",
            field.size, field.sector_size
        );
        return SpawnReport::nothing_placed(request.count);
    }

    if request.structures.is_empty() {
        debug!("spawn_structures: no structures to choose from");
        return SpawnReport::nothing_placed(request.count);
    }

    let mut grid = SectorGrid::new(&field);
    let mut report = SpawnReport { requested: request.count, ..default() };
    let mut placed: Vec<W::Handle> = Vec::with_capacity(request.count);

    for _ in 0..request.count {
        let Some(def) = pick_weighted(request.structures, |s| s.spawn_weight, rng) else {
            report.missed += 1;
            continue;
        };

        let Some((local, handle)) = world.create_object(region, def) else {
            warn!("spawn_structures: world could not create '{}'", def.id);
            report.missed += 1;
            continue;
        };

        if local.is_degenerate() {
            warn!("spawn_structures: '{}' has degenerate bounds {:?}", def.id, local);
            world.destroy_object(handle);
            report.missed += 1;
            continue;
        }

        let margin = def.min_distance.max(0);
        let Some(reserved) = reserved_size(&local, margin) else {
            warn!("spawn_structures: '{}' is too large with margin {}", def.id, margin);
            world.destroy_object(handle);
            report.missed += 1;
            continue;
        };

        let spot = find_spawn_position(
            &grid,
            request.distribution,
            reserved,
            settings.search_tries,
            rng,
        );
        let Some((key, fit, position)) =
            spot.and_then(|(key, fit)| Some((key, fit, object_position(fit, margin, &local)?)))
        else {
            debug!("spawn_structures: no room for '{}' ({}x{})", def.id, reserved.x, reserved.y);
            world.destroy_object(handle);
            report.missed += 1;
            continue;
        };

        world.set_position(handle, position);

        let committed = grid.commit(key, &BoundingBox::new(fit.x, fit.y, reserved.x, reserved.y));
        if let Err(err) = &committed {
            error!("spawn_structures: free-space bookkeeping broke: {err}");
        }
        debug_assert!(committed.is_ok(), "{committed:?}");

        placed.push(handle);
        report.placed += 1;

        for processor in &def.processors {
            processor.process(&mut *world, region, handle, false);
        }

        debug!("spawn_structures: '{}' -> {:?} in sector {:?}", def.id, position, key.0);
    }

    for processor in request.global_processors {
        for &handle in &placed {
            processor.process(&mut *world, region, handle, true);
        }
    }

    info!(
        "spawn_structures: placed {}/{} in region {:?} ({} sectors, {} free units left)",
        report.placed,
        report.requested,
        region,
        grid.len(),
        grid.total_free_area()
    );
    if report.missed > 0 {
        debug!(
            "spawn_structures: {} of {} structures found no room",
            report.missed, report.requested
        );
    }

    report
}

/// Size of the grid reservation for `local` with `margin` on every side.
fn reserved_size(local: &BoundingBox, margin: i32) -> Option<IVec2> {
    let pad = margin.checked_mul(2)?;
    Some(IVec2::new(local.width.checked_add(pad)?, local.height.checked_add(pad)?))
}

/// Where the object's origin goes when its reservation starts at `fit`.
fn object_position(fit: IVec2, margin: i32, local: &BoundingBox) -> Option<IVec2> {
    let p = fit.as_i64vec2() + I64Vec2::splat(margin as i64) - local.min().as_i64vec2();
    Some(IVec2::new(i32::try_from(p.x).ok()?, i32::try_from(p.y).ok()?))
}

/// Samples up to `tries` candidate sectors from `distribution` and returns the
/// first fit for a `size` box, as (sector, bottom-left corner).
pub fn find_spawn_position(
    grid: &SectorGrid,
    distribution: &dyn PlacementDistribution,
    size: IVec2,
    tries: u32,
    rng: &mut dyn RngCore,
) -> Option<(SectorKey, IVec2)> {
    let needed = size.x as i64 * size.y as i64;
    for _ in 0..tries {
        let candidate = distribution.generate(grid.field(), rng);
        let key = grid.field().sector_of(candidate);
        if grid.free_area_of(key) < needed {
            continue;
        }
        if let Some(fit) = strips::find_fit(grid.strips_of(key), size.x, size.y, rng) {
            return Some((key, fit));
        }
    }
    None
}

/// Input to `place_single`.
pub struct SinglePlacement<'a, P = ProcessorDef> {
    pub region: RegionId,
    /// Bottom-left corner of the square the object must land in.
    pub origin: IVec2,
    /// Side length of that square.
    pub max_offset: i32,
    pub max_tries: u32,
    pub structure: &'a StructureDef,
    /// Run on the object after the structure's own processors.
    pub extra_processors: &'a [P],
    /// Place at a random spot even when every try overlapped something.
    pub force_if_failed: bool,
}

/// Places one object by testing random spots against the world's own object
/// index. No sector grid is involved.
///
/// A spot is accepted when nothing intersects the square of half-size
/// `min_distance + max(width, height)` around it. With `force_if_failed` the
/// object is placed even if every try failed and may then overlap.
pub fn place_single<W, P>(
    world: &mut W,
    request: &SinglePlacement<'_, P>,
    rng: &mut dyn RngCore,
) -> Option<W::Handle>
where
    W: MapGenWorld,
    P: Processor<W>,
{
    let region = request.region;
    let def = request.structure;
    if !world.region_exists(region) || request.max_offset <= 0 {
        warn!("place_single: region {:?} cannot take '{}'", region, def.id);
        return None;
    }

    let Some((local, handle)) = world.create_object(region, def) else {
        warn!("place_single: world could not create '{}'", def.id);
        return None;
    };
    if local.is_degenerate() {
        warn!("place_single: '{}' has degenerate bounds {:?}", def.id, local);
        world.destroy_object(handle);
        return None;
    }

    let Some(spots) = SpotRange::new(request.origin, request.max_offset, &local, def.min_distance)
    else {
        warn!("place_single: '{}' does not fit the coordinate range", def.id);
        world.destroy_object(handle);
        return None;
    };

    let mut found = None;
    for _ in 0..request.max_tries {
        let candidate = spots.sample(rng);
        if !world.find_overlapping(region, spots.exclusion_box(candidate)) {
            found = Some(candidate);
            break;
        }
    }

    let position = match found {
        Some(p) => p,
        None if request.force_if_failed => {
            let p = spots.sample(rng);
            warn!(
                "place_single: forcing '{}' to {:?} after {} tries",
                def.id, p, request.max_tries
            );
            p
        }
        None => {
            debug!("place_single: no room for '{}' after {} tries", def.id, request.max_tries);
            world.destroy_object(handle);
            return None;
        }
    };

    world.set_position(handle, position);
    for processor in &def.processors {
        processor.process(&mut *world, region, handle, false);
    }
    for processor in request.extra_processors {
        processor.process(&mut *world, region, handle, false);
    }

    debug!("place_single: '{}' -> {:?}", def.id, position);
    Some(handle)
}

/// Candidate origins for `place_single` and the exclusion square around each.
struct SpotRange {
    lo: IVec2,
    hi: IVec2,
    /// Half-size of the square that must be empty: `min_distance + max(width, height)`.
    exclusion: i32,
}

impl SpotRange {
    /// Keeps the object's own box inside the square when it is large enough.
    /// `None` when a candidate, its box or its exclusion square could leave `i32`.
    fn new(origin: IVec2, max_offset: i32, local: &BoundingBox, min_distance: i32) -> Option<Self> {
        let origin = origin.as_i64vec2();
        let local_min = local.min().as_i64vec2();
        let lo = origin - local_min;
        let far = origin + I64Vec2::splat(max_offset as i64);
        let hi = (far - local.size().as_i64vec2() - local_min).max(lo);
        let exclusion = min_distance.max(0) as i64 + local.width.max(local.height) as i64;

        let in_range = |v: i64| i32::try_from(v).is_ok();
        let ok = in_range(2 * exclusion)
            && in_range(lo.x - exclusion)
            && in_range(lo.y - exclusion)
            && in_range(hi.x + exclusion)
            && in_range(hi.y + exclusion)
            && in_range(hi.x + local.right() as i64)
            && in_range(hi.y + local.top() as i64);
        ok.then(|| Self { lo: lo.as_ivec2(), hi: hi.as_ivec2(), exclusion: exclusion as i32 })
    }

    fn sample(&self, rng: &mut dyn RngCore) -> IVec2 {
        IVec2::new(
            rng.random_range(self.lo.x..=self.hi.x),
            rng.random_range(self.lo.y..=self.hi.y),
        )
    }

    fn exclusion_box(&self, candidate: IVec2) -> BoundingBox {
        BoundingBox::from_corners(
            candidate - IVec2::splat(self.exclusion),
            candidate + IVec2::splat(self.exclusion),
        )
    }
}

/// Destroys every positioned object in `region` that intersects `area`.
pub fn clear_area<W: MapGenWorld>(world: &mut W, region: RegionId, area: BoundingBox) -> usize {
    let doomed = world.objects_intersecting(region, area);
    for &handle in &doomed {
        world.destroy_object(handle);
    }
    if !doomed.is_empty() {
        debug!("clear_area: removed {} objects from {:?} in {:?}", doomed.len(), area, region);
    }
    doomed.len()
}
