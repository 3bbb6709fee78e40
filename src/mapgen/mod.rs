// src/mapgen/mod.rs
//! Sector-indexed structure placement.
//!
//! A batch tiles a square field into sectors, keeps each sector's free space as
//! horizontal strips, and packs enlarged bounding boxes into them. The host
//! world is reached only through `MapGenWorld`.

pub mod core;
pub mod distribution;
pub mod field;
pub mod memory;
pub mod picker;
pub mod plugin;
pub mod processors;
pub mod registry;
pub mod runner;
pub mod sectors;
pub mod strips;

pub use self::core::{
    BoundingBox, MapGenWorld, PlacementDistribution, PlacementField, Processor, RegionId,
    SectorKey,
};
pub use distribution::{choose_distribution, make_distribution};
pub use field::{field_size_for_players, obstacle_count, obstacle_structures, FieldDef};
pub use memory::{MemoryWorld, ObjectId};
pub use plugin::{
    MapGenConfigHandle, MapGenDemoSettings, MapGenPlugin, MapGenStatus, ObstacleFieldOutcome,
};
pub use processors::{FlagUpdate, IffFlags, SplitMarker};
pub use registry::{
    DistributionDef, GeneratorDef, MapGenConfig, MapGenConfigAssetPlugin, MapGenConfigError,
    MapGenConfigLoader, MapGenSettings, ProcessorDef, StructureDef, MAX_EXTENT,
};
pub use runner::{
    clear_area, place_single, spawn_structures, spawn_structures_report, PlacementRequest,
    SinglePlacement, SpawnReport,
};
pub use sectors::{MapGenError, SectorGrid};
