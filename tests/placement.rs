//! Integration tests for batch and single placement against the in-memory world.
//!
//! Exercises: config structures -> spawn_structures -> SectorGrid bookkeeping
//! -> processors, plus place_single and clear_area.

use bevy::prelude::IVec2;
use debris_field::mapgen::distribution::{NoiseDistribution, UniformDistribution};
use debris_field::mapgen::runner::find_spawn_position;
use debris_field::mapgen::{
    clear_area, place_single, spawn_structures, spawn_structures_report, BoundingBox,
    FlagUpdate, GeneratorDef, IffFlags, MapGenSettings, MapGenWorld, MemoryWorld,
    PlacementDistribution, PlacementField, PlacementRequest, ProcessorDef, RegionId,
    SectorGrid, SinglePlacement, SpawnReport, SplitMarker, StructureDef,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ── Helpers ────────────────────────────────────────────────────────────

const REGION: RegionId = RegionId(7);

fn rect(id: &str, w: i32, h: i32, min_distance: i32, weight: f32) -> StructureDef {
    StructureDef {
        id: id.into(),
        spawn_weight: weight,
        min_distance,
        generator: GeneratorDef::Rect { width: w, height: h },
        processors: vec![],
    }
}

fn world() -> MemoryWorld {
    let mut w = MemoryWorld::new();
    w.add_region(REGION);
    w
}

fn batch<'a>(
    structures: &'a [StructureDef],
    count: usize,
    max_offset: i32,
    distribution: &'a dyn PlacementDistribution,
) -> PlacementRequest<'a> {
    PlacementRequest {
        region: REGION,
        origin: IVec2::ZERO,
        count,
        max_offset,
        structures,
        global_processors: &[],
        distribution,
    }
}

/// Every pair of placed objects, each grown by its own min distance, stays apart.
fn assert_separated(world: &MemoryWorld, structures: &[StructureDef]) {
    let grown: Vec<BoundingBox> = world
        .objects()
        .filter_map(|(_, o)| {
            let id = o.structure.as_deref()?;
            let d = structures.iter().find(|s| s.id == id)?.min_distance;
            Some(o.world_box()?.inflated(d))
        })
        .collect();
    for (i, a) in grown.iter().enumerate() {
        for b in &grown[i + 1..] {
            assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
        }
    }
}

// ── Batch placement ────────────────────────────────────────────────────

#[test]
fn end_to_end_places_every_requested_structure() {
    let structures = [rect("debris", 20, 20, 5, 1.0)];
    let mut w = world();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let request = batch(&structures, 20, 500, &UniformDistribution);

    let report = spawn_structures_report(&mut w, &request, &MapGenSettings::default(), &mut rng);
    assert_eq!(report, SpawnReport { requested: 20, placed: 20, missed: 0 });
    assert_eq!(w.len(), 20);
    assert_separated(&w, &structures);

    let field = BoundingBox::new(0, 0, 500, 500);
    for b in w.placed_boxes(REGION) {
        assert!(field.contains_box(&b.inflated(5)), "{b:?}");
    }
}

#[test]
fn mixed_sizes_never_overlap() {
    let structures = [
        rect("small", 8, 8, 2, 5.0),
        rect("wide", 45, 10, 4, 2.0),
        rect("big", 60, 60, 6, 1.0),
    ];
    let mut w = world();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let noise = NoiseDistribution::new(5, 0.35, 0.0, 16);
    let request = batch(&structures, 400, 800, &noise);

    let report = spawn_structures_report(&mut w, &request, &MapGenSettings::default(), &mut rng);
    assert_eq!(report.placed + report.missed, 400);
    assert!(report.placed > 0);
    assert_eq!(w.len(), report.placed);
    assert_eq!(w.destroyed_count(), report.missed);
    assert_separated(&w, &structures);
}

#[test]
fn crowded_field_terminates_with_few_placements() {
    let structures = [rect("block", 30, 30, 0, 1.0)];
    let mut w = world();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let request = batch(&structures, 50, 100, &UniformDistribution);

    let report = spawn_structures_report(&mut w, &request, &MapGenSettings::default(), &mut rng);
    assert!(report.placed <= 10, "{report:?}");
    assert!(report.placed >= 1);
    assert_eq!(report.missed, 50 - report.placed);
    assert_eq!(w.len(), report.placed);
}

#[test]
fn invalid_requests_touch_nothing() {
    let structures = [rect("rock", 10, 10, 0, 1.0)];
    let settings = MapGenSettings::default();
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let mut w = world();
    let missing_region = PlacementRequest {
        region: RegionId(99),
        ..batch(&structures, 5, 500, &UniformDistribution)
    };
    assert_eq!(spawn_structures(&mut w, &missing_region, &settings, &mut rng), 0);

    let empty = batch(&[], 5, 500, &UniformDistribution);
    assert_eq!(spawn_structures(&mut w, &empty, &settings, &mut rng), 0);

    let flat = batch(&structures, 5, 0, &UniformDistribution);
    assert_eq!(spawn_structures(&mut w, &flat, &settings, &mut rng), 0);

    let bad_sectors = MapGenSettings { sector_size: 0, ..MapGenSettings::default() };
    let ok = batch(&structures, 5, 500, &UniformDistribution);
    assert_eq!(spawn_structures(&mut w, &ok, &bad_sectors, &mut rng), 0);

    assert!(w.is_empty());
    assert_eq!(w.destroyed_count(), 0);
}

#[test]
fn same_seed_same_layout() {
    let structures = [rect("a", 12, 7, 3, 1.0), rect("b", 25, 25, 1, 2.0)];
    let run = || {
        let mut w = world();
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let noise = NoiseDistribution::new(11, 0.5, 0.1, 8);
        let request = batch(&structures, 60, 600, &noise);
        spawn_structures(&mut w, &request, &MapGenSettings::default(), &mut rng);
        w.placed_boxes(REGION)
    };
    assert_eq!(run(), run());
}

#[test]
fn processors_run_locally_then_globally() {
    let mut tagged = rect("beacon", 10, 10, 0, 1.0);
    tagged.processors = vec![ProcessorDef::Flags(FlagUpdate {
        flags: IffFlags::HIDE,
        name_override: Some("Beacon".into()),
        ..FlagUpdate::default()
    })];
    let structures = [tagged, rect("rock", 10, 10, 0, 1.0)];
    let globals = [
        ProcessorDef::Flags(FlagUpdate { flags: IffFlags::HIDE_LABEL, ..FlagUpdate::default() }),
        ProcessorDef::MarkSplit(SplitMarker { flags: IffFlags::HIDE_LABEL, replicate: true }),
        ProcessorDef::Noop,
    ];
    let mut w = world();
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let request = PlacementRequest {
        global_processors: &globals,
        ..batch(&structures, 30, 400, &UniformDistribution)
    };
    assert_eq!(spawn_structures(&mut w, &request, &MapGenSettings::default(), &mut rng), 30);

    for (_, o) in w.objects() {
        assert!(o.flags.contains(IffFlags::HIDE_LABEL));
        assert_eq!(o.split_marker.as_ref().map(|m| m.replicate), Some(true));
        let is_beacon = o.structure.as_deref() == Some("beacon");
        assert_eq!(o.flags.contains(IffFlags::HIDE), is_beacon);
        assert_eq!(o.name.is_some(), is_beacon);
    }
}

// ── Grid bookkeeping ───────────────────────────────────────────────────

#[test]
fn free_area_is_conserved_across_commits() {
    let field = PlacementField::new(IVec2::new(-250, 100), 330, 100);
    let mut grid = SectorGrid::new(&field);
    let initial = grid.total_free_area();
    assert_eq!(initial, 330 * 330);

    let mut rng = ChaCha8Rng::seed_from_u64(41);
    let mut committed = 0i64;
    let sizes = [IVec2::new(17, 9), IVec2::new(40, 40), IVec2::new(3, 70), IVec2::new(90, 12)];
    for i in 0..300 {
        let size = sizes[i % sizes.len()];
        let Some((key, fit)) =
            find_spawn_position(&grid, &UniformDistribution, size, 50, &mut rng)
        else {
            continue;
        };
        grid.commit(key, &BoundingBox::new(fit.x, fit.y, size.x, size.y)).unwrap();
        committed += size.x as i64 * size.y as i64;
        assert!(grid.is_consistent());
    }
    assert!(committed > 0);
    assert_eq!(grid.total_free_area(), initial - committed);
}

// ── Single placement and clearing ──────────────────────────────────────

#[test]
fn forced_placement_in_saturated_region_stays_in_bounds() {
    let mut w = world();
    for x in 0..10 {
        for y in 0..10 {
            w.insert_blocker(REGION, BoundingBox::new(x * 30, y * 30, 30, 30));
        }
    }
    let ship = rect("frigate", 30, 18, 50, 1.0);
    let hide = [ProcessorDef::Flags(FlagUpdate { flags: IffFlags::HIDE, ..FlagUpdate::default() })];
    let mut rng = ChaCha8Rng::seed_from_u64(6);

    for _ in 0..5 {
        let request = SinglePlacement {
            region: REGION,
            origin: IVec2::ZERO,
            max_offset: 300,
            max_tries: 20,
            structure: &ship,
            extra_processors: &hide,
            force_if_failed: true,
        };
        let id = place_single(&mut w, &request, &mut rng).expect("forced placement must succeed");
        let o = w.object(id).unwrap();
        assert!(BoundingBox::new(0, 0, 300, 300).contains_box(&o.world_box().unwrap()));
        assert!(o.flags.contains(IffFlags::HIDE));
    }
}

#[test]
fn clear_area_then_refill() {
    let structures = [rect("rock", 10, 10, 1, 1.0)];
    let mut w = world();
    let mut rng = ChaCha8Rng::seed_from_u64(15);
    let request = batch(&structures, 40, 300, &UniformDistribution);
    let placed = spawn_structures(&mut w, &request, &MapGenSettings::default(), &mut rng);
    assert_eq!(placed, 40);

    let everything = BoundingBox::new(-10, -10, 320, 320);
    assert_eq!(clear_area(&mut w, REGION, everything), 40);
    assert!(!w.find_overlapping(REGION, everything));
    assert_eq!(clear_area(&mut w, REGION, everything), 0);
}
