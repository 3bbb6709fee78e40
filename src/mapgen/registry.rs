// src/mapgen/registry.rs
//! Data-driven structure definitions + `.mapgen.ron` loader.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::field::FieldDef;
use super::processors::{FlagUpdate, SplitMarker};

/// Largest accepted `min_distance` and `Rect` side. Keeps `size + 2 * min_distance`
/// and every derived coordinate well inside `i32`.
pub const MAX_EXTENT: i32 = 1 << 24;

// ---------- Public plugin to register asset+loader ----------

pub struct MapGenConfigAssetPlugin;

impl Plugin for MapGenConfigAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<MapGenConfig>()
            .register_asset_loader(MapGenConfigLoader);
    }
}

// ---------- Engine settings ----------

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapGenSettings {
    /// Side length of one sector (world units).
    #[serde(default = "default_sector_size")]
    pub sector_size: i32,
    /// Distribution samples tried per structure before giving up on it.
    #[serde(default = "default_search_tries")]
    pub search_tries: u32,
    /// Rejections a noise distribution tolerates before falling back to uniform.
    #[serde(default = "default_noise_retries")]
    pub noise_retries: u32,
    /// Chance that the ring distribution replaces the configured one for a batch.
    #[serde(default = "default_alternate_chance")]
    pub alternate_chance: f64,
}

impl Default for MapGenSettings {
    fn default() -> Self {
        Self {
            sector_size: default_sector_size(),
            search_tries: default_search_tries(),
            noise_retries: default_noise_retries(),
            alternate_chance: default_alternate_chance(),
        }
    }
}

fn default_sector_size() -> i32 {
    100
}
fn default_search_tries() -> u32 {
    50
}
fn default_noise_retries() -> u32 {
    16
}
fn default_alternate_chance() -> f64 {
    0.05
}

// ---------- Generators / processors / distributions (data form) ----------

/// How the world should instantiate a structure. Interpreted by `MapGenWorld::create_object`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeneratorDef {
    /// Pre-built template (saved sub-map, prefab) looked up by path.
    Template { path: String },
    /// Plain rectangular object with its local origin at the bottom-left corner.
    Rect { width: i32, height: i32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProcessorDef {
    Flags(FlagUpdate),
    MarkSplit(SplitMarker),
    Noop,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum DistributionDef {
    #[default]
    Uniform,
    Noise {
        seed: u32,
        #[serde(default = "default_noise_frequency")]
        frequency: f64,
        /// Noise values at or below this are rejected (noise range is roughly -1..1).
        #[serde(default)]
        threshold: f64,
    },
}

fn default_noise_frequency() -> f64 {
    0.35
}

// ---------- Structure definition ----------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureDef {
    /// Unique name (used for lookup and logging).
    pub id: String,
    /// Relative spawn weight.
    pub spawn_weight: f32,
    /// Minimal gap kept between this structure and any other placed one.
    #[serde(default)]
    pub min_distance: i32,
    pub generator: GeneratorDef,
    /// Run on each placed instance, in order.
    #[serde(default)]
    pub processors: Vec<ProcessorDef>,
}

// ---------- Whole config file ----------

#[derive(Asset, TypePath, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapGenConfig {
    #[serde(default)]
    pub settings: MapGenSettings,
    #[serde(default)]
    pub field: FieldDef,
    #[serde(default)]
    pub distribution: DistributionDef,
    /// Obstacles scattered by the batch placement.
    pub structures: Vec<StructureDef>,
    /// Run on every placed obstacle once the batch is done.
    #[serde(default)]
    pub global_processors: Vec<ProcessorDef>,
    /// Placed one at a time after the batch; placement is forced if no free spot is found.
    #[serde(default)]
    pub ships: Vec<StructureDef>,
}

impl MapGenConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, MapGenConfigError> {
        Self::from_ron_bytes(text.as_bytes())
    }

    /// Parse + validate. Shared by the asset loader and direct callers.
    pub fn from_ron_bytes(bytes: &[u8]) -> Result<Self, MapGenConfigError> {
        let config: MapGenConfig =
            ron::de::from_bytes(bytes).map_err(|e| MapGenConfigError::Ron(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn structure(&self, id: &str) -> Option<&StructureDef> {
        self.structures.iter().chain(self.ships.iter()).find(|s| s.id == id)
    }

    fn validate(&self) -> Result<(), MapGenConfigError> {
        if self.settings.sector_size <= 0 {
            return Err(MapGenConfigError::InvalidSectorSize(self.settings.sector_size));
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, def) in self.structures.iter().chain(self.ships.iter()).enumerate() {
            if let Some(prev) = seen.insert(def.id.as_str(), i) {
                return Err(MapGenConfigError::DuplicateId {
                    id: def.id.clone(),
                    first: prev,
                    second: i,
                });
            }
            if !def.spawn_weight.is_finite() || def.spawn_weight < 0.0 {
                return Err(MapGenConfigError::InvalidWeight {
                    id: def.id.clone(),
                    weight: def.spawn_weight,
                });
            }
            if !(0..=MAX_EXTENT).contains(&def.min_distance) {
                return Err(MapGenConfigError::InvalidDistance {
                    id: def.id.clone(),
                    distance: def.min_distance,
                });
            }
            if let GeneratorDef::Rect { width, height } = def.generator {
                if !(1..=MAX_EXTENT).contains(&width) || !(1..=MAX_EXTENT).contains(&height) {
                    return Err(MapGenConfigError::InvalidExtent {
                        id: def.id.clone(),
                        width,
                        height,
                    });
                }
            }
        }
        Ok(())
    }
}

// ---------- Asset loader for `.mapgen.ron` ----------

#[derive(Default)]
pub struct MapGenConfigLoader;

impl AssetLoader for MapGenConfigLoader {
    type Asset = MapGenConfig;
    type Settings = ();
    type Error = MapGenConfigError;

    fn extensions(&self) -> &[&str] {
        &["mapgen.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        MapGenConfig::from_ron_bytes(&bytes)
    }
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum MapGenConfigError {
    #[error("I/O while reading map generation config: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("Duplicate structure id '{id}' (first idx {first}, second idx {second})")]
    DuplicateId { id: String, first: usize, second: usize },
    #[error("Structure '{id}' has invalid spawn weight {weight}")]
    InvalidWeight { id: String, weight: f32 },
    #[error("Structure '{id}' has min distance {distance} outside 0..={max}", max = MAX_EXTENT)]
    InvalidDistance { id: String, distance: i32 },
    #[error("Structure '{id}' has rect size {width}x{height} outside 1..={max}", max = MAX_EXTENT)]
    InvalidExtent { id: String, width: i32, height: i32 },
    #[error("Sector size must be positive, got {0}")]
    InvalidSectorSize(i32),
}
