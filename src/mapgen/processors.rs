// src/mapgen/processors.rs
//! Built-in post-placement processors.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::core::{MapGenWorld, Processor, RegionId};
use super::registry::ProcessorDef;

/// Bitmask of IFF (identify-friend-or-foe) display flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IffFlags(pub u32);

impl IffFlags {
    pub const NONE: Self = Self(0);
    /// Hide the object's name on radar/IFF consoles.
    pub const HIDE_LABEL: Self = Self(1);
    /// Hide the object from radar entirely.
    pub const HIDE: Self = Self(1 << 1);

    pub fn contains(self, other: Self) -> bool { (self.0 & other.0) == other.0 }
    pub fn union(self, other: Self) -> Self { Self(self.0 | other.0) }
}

/// What a `Flags` processor asks the world to change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagUpdate {
    pub flags: IffFlags,
    /// Clear existing flags before adding `flags`.
    #[serde(default)]
    pub reset_old_flags: bool,
    #[serde(default)]
    pub name_override: Option<String>,
    /// Linear RGBA.
    #[serde(default)]
    pub color_override: Option<[f32; 4]>,
}

/// Flags inherited by pieces that later split off a marked object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitMarker {
    pub flags: IffFlags,
    /// Pieces of pieces inherit the marker too.
    #[serde(default)]
    pub replicate: bool,
}

impl<W: MapGenWorld> Processor<W> for ProcessorDef {
    fn process(&self, world: &mut W, _region: RegionId, handle: W::Handle, is_global: bool) {
        match self {
            ProcessorDef::Flags(update) => {
                debug!(
                    "Flags processor: {:?} on {:?} (global={})",
                    update.flags, handle, is_global
                );
                world.apply_flags(handle, update);
            }
            ProcessorDef::MarkSplit(marker) => {
                world.mark_split(handle, marker);
            }
            ProcessorDef::Noop => {}
        }
    }
}
