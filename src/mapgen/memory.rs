// src/mapgen/memory.rs
//! In-memory `MapGenWorld`: regions, positioned boxes and a template catalog.
//! Used by the demo app and by tests; real hosts implement the trait on their ECS.

use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::core::{BoundingBox, MapGenWorld, RegionId};
use super::processors::{FlagUpdate, IffFlags, SplitMarker};
use super::registry::{GeneratorDef, StructureDef};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryObject {
    /// Structure id, or `None` for blockers inserted directly.
    pub structure: Option<String>,
    /// Bounds relative to the object's own origin.
    pub local: BoundingBox,
    /// `None` until the engine positions it.
    pub position: Option<IVec2>,
    pub region: RegionId,
    pub flags: IffFlags,
    pub name: Option<String>,
    pub color: Option<[f32; 4]>,
    pub split_marker: Option<SplitMarker>,
}

impl MemoryObject {
    /// World-space bounds, once positioned.
    pub fn world_box(&self) -> Option<BoundingBox> {
        self.position.map(|p| self.local.translated(p))
    }
}

#[derive(Resource, Default, Debug)]
pub struct MemoryWorld {
    regions: HashSet<RegionId>,
    templates: HashMap<String, BoundingBox>,
    objects: BTreeMap<ObjectId, MemoryObject>,
    next_id: u64,
    destroyed: usize,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_region(&mut self, region: RegionId) {
        self.regions.insert(region);
    }

    /// Local bounds returned for `GeneratorDef::Template { path }`.
    pub fn register_template(&mut self, path: impl Into<String>, local: BoundingBox) {
        self.templates.insert(path.into(), local);
    }

    /// Pre-existing, already positioned object (station, asteroid, other map content).
    pub fn insert_blocker(&mut self, region: RegionId, bounds: BoundingBox) -> ObjectId {
        let local = BoundingBox::new(0, 0, bounds.width, bounds.height);
        self.insert(MemoryObject {
            structure: None,
            local,
            position: Some(bounds.min()),
            region,
            flags: IffFlags::NONE,
            name: None,
            color: None,
            split_marker: None,
        })
    }

    pub fn object(&self, id: ObjectId) -> Option<&MemoryObject> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &MemoryObject)> + '_ {
        self.objects.iter().map(|(id, o)| (*id, o))
    }

    /// World bounds of every positioned object in `region`.
    pub fn placed_boxes(&self, region: RegionId) -> Vec<BoundingBox> {
        self.objects
            .values()
            .filter(|o| o.region == region)
            .filter_map(MemoryObject::world_box)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects destroyed since creation of the world.
    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    fn insert(&mut self, object: MemoryObject) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, object);
        id
    }
}

impl MapGenWorld for MemoryWorld {
    type Handle = ObjectId;

    fn region_exists(&self, region: RegionId) -> bool {
        self.regions.contains(&region)
    }

    fn create_object(
        &mut self,
        region: RegionId,
        structure: &StructureDef,
    ) -> Option<(BoundingBox, ObjectId)> {
        if !self.region_exists(region) {
            return None;
        }
        let local = match &structure.generator {
            GeneratorDef::Rect { width, height } => BoundingBox::new(0, 0, *width, *height),
            GeneratorDef::Template { path } => match self.templates.get(path) {
                Some(b) => *b,
                None => {
                    warn!(
                        "MemoryWorld: unknown template '{}' for structure '{}'",
                        path, structure.id
                    );
                    return None;
                }
            },
        };
        let id = self.insert(MemoryObject {
            structure: Some(structure.id.clone()),
            local,
            position: None,
            region,
            flags: IffFlags::NONE,
            name: None,
            color: None,
            split_marker: None,
        });
        Some((local, id))
    }

    fn set_position(&mut self, handle: ObjectId, position: IVec2) {
        if let Some(o) = self.objects.get_mut(&handle) {
            o.position = Some(position);
        }
    }

    fn destroy_object(&mut self, handle: ObjectId) {
        if self.objects.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }

    fn objects_intersecting(&self, region: RegionId, area: BoundingBox) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, o)| o.region == region)
            .filter(|(_, o)| o.world_box().is_some_and(|b| b.intersects(&area)))
            .map(|(id, _)| *id)
            .collect()
    }

    fn apply_flags(&mut self, handle: ObjectId, update: &FlagUpdate) {
        let Some(o) = self.objects.get_mut(&handle) else { return };
        o.flags = if update.reset_old_flags { update.flags } else { o.flags.union(update.flags) };
        if let Some(name) = &update.name_override {
            o.name = Some(name.clone());
        }
        if let Some(color) = update.color_override {
            o.color = Some(color);
        }
    }

    fn mark_split(&mut self, handle: ObjectId, marker: &SplitMarker) {
        if let Some(o) = self.objects.get_mut(&handle) {
            o.split_marker = Some(marker.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: &str, w: i32, h: i32) -> StructureDef {
        StructureDef {
            id: id.into(),
            spawn_weight: 1.0,
            min_distance: 0,
            generator: GeneratorDef::Rect { width: w, height: h },
            processors: vec![],
        }
    }

    #[test]
    fn unpositioned_objects_are_invisible() {
        let region = RegionId(1);
        let mut world = MemoryWorld::new();
        world.add_region(region);
        let (_, id) = world.create_object(region, &rect("a", 10, 10)).unwrap();
        let everywhere = BoundingBox::new(-1000, -1000, 2000, 2000);
        assert!(!world.find_overlapping(region, everywhere));

        world.set_position(id, IVec2::new(5, 5));
        assert_eq!(world.objects_intersecting(region, everywhere), vec![id]);
        assert!(!world.find_overlapping(RegionId(2), everywhere));
        assert!(!world.find_overlapping(region, BoundingBox::new(15, 5, 10, 10)));
    }

    #[test]
    fn templates_and_missing_regions() {
        let region = RegionId(0);
        let mut world = MemoryWorld::new();
        assert!(world.create_object(region, &rect("a", 1, 1)).is_none());

        world.add_region(region);
        world.register_template("maps/wreck.yml", BoundingBox::new(-8, -4, 16, 8));
        let wreck = StructureDef {
            generator: GeneratorDef::Template { path: "maps/wreck.yml".into() },
            ..rect("wreck", 0, 0)
        };
        let (local, _) = world.create_object(region, &wreck).unwrap();
        assert_eq!(local, BoundingBox::new(-8, -4, 16, 8));

        let missing = StructureDef {
            generator: GeneratorDef::Template { path: "nope".into() },
            ..rect("missing", 0, 0)
        };
        assert!(world.create_object(region, &missing).is_none());
    }

    #[test]
    fn flag_updates_merge_or_reset() {
        let region = RegionId(0);
        let mut world = MemoryWorld::new();
        world.add_region(region);
        let id = world.insert_blocker(region, BoundingBox::new(0, 0, 4, 4));

        world.apply_flags(id, &FlagUpdate { flags: IffFlags::HIDE_LABEL, ..Default::default() });
        world.apply_flags(id, &FlagUpdate { flags: IffFlags::HIDE, ..Default::default() });
        assert_eq!(world.object(id).unwrap().flags, IffFlags(3));

        world.apply_flags(
            id,
            &FlagUpdate {
                flags: IffFlags::HIDE,
                reset_old_flags: true,
                name_override: Some("Derelict".into()),
                color_override: Some([1.0, 0.0, 0.0, 1.0]),
            },
        );
        let o = world.object(id).unwrap();
        assert_eq!(o.flags, IffFlags::HIDE);
        assert_eq!(o.name.as_deref(), Some("Derelict"));
        assert_eq!(o.color, Some([1.0, 0.0, 0.0, 1.0]));

        world.destroy_object(id);
        world.destroy_object(id);
        assert_eq!(world.destroyed_count(), 1);
        assert!(world.is_empty());
    }
}
