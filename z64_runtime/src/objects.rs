//! The resource-loading collaborator.
//!
//! The loader owns the segment table and the table of loaded object banks.
//! It is the only mutator of the segment table: banks are loaded between
//! frames, and the dispatcher asks it to bind an actor's object bank to the
//! `Object` segment ahead of that actor's constructor and draw calls. The
//! ordering guarantee the runtime leans on is simply "a bank's load completes
//! before any draw that resolves addresses into it".

use serde::{Deserialize, Serialize};

use z64_formats::segment::{RamAddr, Segment, SegmentError, SegmentTable};

/// Identity of an object resource file (the per-category `objectID`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub i16);

/// Index of a loaded bank in the loader's object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSlot(usize);

#[derive(Debug, Clone, Copy)]
struct ObjectEntry {
    id: ObjectId,
    base: RamAddr,
}

#[derive(Debug, Default)]
pub struct ResourceLoader {
    table: SegmentTable,
    objects: Vec<ObjectEntry>,
}

impl ResourceLoader {
    pub fn new() -> ResourceLoader {
        ResourceLoader::default()
    }

    /// Record an object bank as loaded at `base`. Reloading an id updates
    /// its base in place and keeps the slot stable.
    pub fn load_object(&mut self, id: ObjectId, base: RamAddr) -> ObjectSlot {
        if let Some(position) = self.objects.iter().position(|entry| entry.id == id) {
            self.objects[position].base = base;
            return ObjectSlot(position);
        }
        self.objects.push(ObjectEntry { id, base });
        ObjectSlot(self.objects.len() - 1)
    }

    pub fn slot_of(&self, id: ObjectId) -> Option<ObjectSlot> {
        self.objects
            .iter()
            .position(|entry| entry.id == id)
            .map(ObjectSlot)
    }

    pub fn is_loaded(&self, slot: ObjectSlot) -> bool {
        slot.0 < self.objects.len()
    }

    pub fn base_of(&self, slot: ObjectSlot) -> Option<RamAddr> {
        self.objects.get(slot.0).map(|entry| entry.base)
    }

    /// Assign a loaded bank's base to the `Object` segment so the actor
    /// about to run resolves `Object`-relative addresses into its own bank.
    pub fn bind_object_segment(&mut self, slot: ObjectSlot) -> bool {
        match self.base_of(slot) {
            Some(base) => self.table.set_base(Segment::Object, base).is_ok(),
            None => false,
        }
    }

    /// Assign a base for one of the scene/keep banks.
    pub fn set_base(&mut self, segment: Segment, base: RamAddr) -> Result<(), SegmentError> {
        self.table.set_base(segment, base)
    }

    pub fn table(&self) -> &SegmentTable {
        &self.table
    }

    /// Drop every object bank and clear the `Object` segment, as on a scene
    /// unload. Outstanding `ObjectSlot`s become unloaded.
    pub fn unload_all(&mut self) {
        self.objects.clear();
        self.table.clear_base(Segment::Object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_an_object_points_the_object_segment_at_its_bank() {
        let mut loader = ResourceLoader::new();
        let slot = loader.load_object(ObjectId(134), RamAddr(0x8050_0000));
        assert!(loader.bind_object_segment(slot));
        assert_eq!(
            loader.table().base(Segment::Object),
            Some(RamAddr(0x8050_0000))
        );
    }

    #[test]
    fn reloading_keeps_the_slot_stable() {
        let mut loader = ResourceLoader::new();
        let slot = loader.load_object(ObjectId(134), RamAddr(0x8050_0000));
        let again = loader.load_object(ObjectId(134), RamAddr(0x8060_0000));
        assert_eq!(slot, again);
        assert_eq!(loader.base_of(slot), Some(RamAddr(0x8060_0000)));
    }

    #[test]
    fn unload_all_invalidates_slots() {
        let mut loader = ResourceLoader::new();
        let slot = loader.load_object(ObjectId(1), RamAddr(0x8040_0000));
        loader.bind_object_segment(slot);
        loader.unload_all();
        assert!(!loader.is_loaded(slot));
        assert_eq!(loader.table().base(Segment::Object), None);
        assert_eq!(loader.slot_of(ObjectId(1)), None);
    }
}
