// src/mapgen/plugin.rs
//! MapGen plugin wiring (glue).
//! - Config asset/loader
//! - Sizes an obstacle field from the player count and fills it in a `MemoryWorld`
//! - Places the configured ships one by one, forced if the field is full
//!
//! Needs `AssetPlugin` (and a task pool, e.g. `MinimalPlugins`) added first.

use bevy::asset::LoadState;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::core::RegionId;
use super::distribution::choose_distribution;
use super::field::{field_size_for_players, obstacle_count, obstacle_structures};
use super::memory::MemoryWorld;
use super::registry::{MapGenConfig, MapGenConfigAssetPlugin, MapGenSettings, ProcessorDef};
use super::runner::{
    place_single, spawn_structures_report, PlacementRequest, SinglePlacement, SpawnReport,
};

/// Where the config lives and what the startup run looks like.
#[derive(Resource, Clone, Debug)]
pub struct MapGenDemoSettings {
    /// Asset path, relative to the asset root.
    pub config_path: String,
    pub seed: u64,
    pub players: u32,
    pub region: RegionId,
}
impl Default for MapGenDemoSettings {
    fn default() -> Self {
        Self {
            config_path: "mapgen/obstacles.mapgen.ron".to_string(),
            seed: 1337,
            players: 12,
            region: RegionId(0),
        }
    }
}

/// Handle to the loaded config asset.
#[derive(Resource, Default)]
pub struct MapGenConfigHandle(pub Handle<MapGenConfig>);

/// Progress of the one-shot obstacle run.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapGenStatus {
    #[default]
    Loading,
    Done,
    /// The config failed to load; nothing was placed.
    Failed,
}

/// Result of the obstacle run.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObstacleFieldOutcome {
    pub field_size: i32,
    pub obstacles: SpawnReport,
    pub ships_placed: usize,
}

pub struct MapGenPlugin;
impl Plugin for MapGenPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MapGenConfigAssetPlugin)
            .init_resource::<MapGenDemoSettings>()
            .init_resource::<MapGenSettings>()
            .init_resource::<MemoryWorld>()
            .init_resource::<MapGenConfigHandle>()
            .init_resource::<MapGenStatus>()
            .add_systems(Startup, load_config)
            .add_systems(Update, run_when_config_ready);
    }
}

/// Startup: request loading the config, store handle.
fn load_config(
    mut handle_res: ResMut<MapGenConfigHandle>,
    demo: Res<MapGenDemoSettings>,
    assets: Res<AssetServer>,
) {
    handle_res.0 = assets.load(demo.config_path.clone());
    info!("MapGen: loading config from '{}', seed={}", demo.config_path, demo.seed);
}

/// Update: run the obstacle field once the config is available.
fn run_when_config_ready(
    mut commands: Commands,
    mut status: ResMut<MapGenStatus>,
    handle_res: Res<MapGenConfigHandle>,
    configs: Res<Assets<MapGenConfig>>,
    assets: Res<AssetServer>,
    demo: Res<MapGenDemoSettings>,
    mut world: ResMut<MemoryWorld>,
) {
    if *status != MapGenStatus::Loading {
        return;
    }

    let Some(config) = configs.get(&handle_res.0) else {
        if let LoadState::Failed(err) = assets.load_state(handle_res.0.id()) {
            error!("MapGen: failed to load '{}': {err}", demo.config_path);
            *status = MapGenStatus::Failed;
        }
        return;
    };

    info!(
        "MapGen: config ready ({} structures, {} ships)",
        config.structures.len(),
        config.ships.len()
    );
    let outcome = run_obstacle_field(&demo, config, &mut world);
    commands.insert_resource(config.settings.clone());
    commands.insert_resource(outcome);
    *status = MapGenStatus::Done;
}

/// Populate the obstacle field, then the ships.
fn run_obstacle_field(
    demo: &MapGenDemoSettings,
    config: &MapGenConfig,
    world: &mut MemoryWorld,
) -> ObstacleFieldOutcome {
    let settings = &config.settings;
    let mut rng = ChaCha8Rng::seed_from_u64(demo.seed);
    let region = demo.region;
    world.add_region(region);

    let size = field_size_for_players(demo.players, &config.field);
    let count = obstacle_count(&config.field, &mut rng);
    let structures = obstacle_structures(&config.field, &config.structures, &mut rng);
    let distribution = choose_distribution(&config.distribution, settings, &mut rng);
    let origin = IVec2::splat(-size / 2);

    let request = PlacementRequest {
        region,
        origin,
        count,
        max_offset: size,
        structures: structures.as_slice(),
        global_processors: config.global_processors.as_slice(),
        distribution: distribution.as_ref(),
    };
    let obstacles = spawn_structures_report(world, &request, settings, &mut rng);

    let mut ships_placed = 0;
    for ship in &config.ships {
        let single = SinglePlacement::<ProcessorDef> {
            region,
            origin,
            max_offset: size,
            max_tries: settings.search_tries,
            structure: ship,
            extra_processors: &[],
            force_if_failed: true,
        };
        if place_single(world, &single, &mut rng).is_some() {
            ships_placed += 1;
        }
    }

    info!(
        "MapGen: field {}x{} at {:?}: {}/{} obstacles, {}/{} ships",
        size,
        size,
        origin,
        obstacles.placed,
        obstacles.requested,
        ships_placed,
        config.ships.len()
    );
    ObstacleFieldOutcome { field_size: size, obstacles, ships_placed }
}
