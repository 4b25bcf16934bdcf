//! The actor registry and frame dispatcher.
//!
//! Instances live in a generation-checked slot arena; each category keeps an
//! ordered list of handles. The host drives the loop by calling
//! [`Registry::update_all`] then [`Registry::draw_all`] once per frame.
//! Hooks never touch the registry directly while a pass is in flight:
//! spawn/despawn/disable requests go through [`FrameOps`] and are applied
//! after the traversal, so an actor despawning itself (or any other actor)
//! mid-pass can never corrupt the walk.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use z64_formats::compact_init::InitDecodeError;

use crate::actor::{
    ActorCategory, ActorFlags, ActorId, ActorInstance, CategoryDescriptor, CATEGORY_COUNT,
    ROOM_UNDEF,
};
use crate::anim::AnimationPlayer;
use crate::draw::{DrawBackend, DrawPass};
use crate::math::{Pose, Vec3f};
use crate::objects::ResourceLoader;
use crate::world::World;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("actor id {} is already registered", .0 .0)]
    Duplicate(ActorId),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// The owner's single child slot is taken; the original attachment is
    /// left unchanged.
    #[error("owner already has an attached child")]
    OwnerOccupied,
    #[error("owner handle is stale")]
    StaleOwner,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    #[error("actor id {} is not registered", .0 .0)]
    UnknownActor(ActorId),
    /// The instance arena is full; the spawn request is dropped whole.
    #[error("actor capacity exhausted")]
    CapacityExhausted,
    /// The category's compact-init script is malformed. A static-data
    /// authoring bug, not a runtime condition; the spawn is aborted before
    /// anything is linked.
    #[error("compact init script fault: {0}")]
    InitScript(#[from] InitDecodeError),
    #[error("attachment rejected: {0}")]
    Attach(#[from] AttachError),
}

/// Stable, generation-checked reference to a live instance. A handle goes
/// stale the moment its instance is despawned; stale handles are safely
/// ignored everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ActorHandle {
    index: u32,
    generation: u32,
}

/// A spawn requested from inside a pass, applied once the pass ends.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub id: ActorId,
    pub pose: Pose,
    pub variable: u16,
    pub attach_to: Option<ActorHandle>,
}

/// Mutation queue handed to construct/update hooks. Requests are deferred to
/// the end of the current pass; despawns apply first, then disables, then
/// spawns. A deferred spawn that fails is reported and dropped, since the
/// requesting hook has already returned.
#[derive(Debug, Default)]
pub struct FrameOps {
    spawns: Vec<SpawnRequest>,
    despawns: Vec<ActorHandle>,
    disables: Vec<ActorHandle>,
}

impl FrameOps {
    pub fn spawn(&mut self, id: ActorId, pose: Pose, variable: u16) {
        self.spawns.push(SpawnRequest {
            id,
            pose,
            variable,
            attach_to: None,
        });
    }

    pub fn spawn_attached(&mut self, owner: ActorHandle, id: ActorId, pose: Pose, variable: u16) {
        self.spawns.push(SpawnRequest {
            id,
            pose,
            variable,
            attach_to: Some(owner),
        });
    }

    pub fn despawn(&mut self, handle: ActorHandle) {
        self.despawns.push(handle);
    }

    pub fn disable(&mut self, handle: ActorHandle) {
        self.disables.push(handle);
    }

    fn is_empty(&self) -> bool {
        self.spawns.is_empty() && self.despawns.is_empty() && self.disables.is_empty()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<ActorInstance>,
}

/// Owner of every live actor instance and their per-category lists.
#[derive(Debug, Default)]
pub struct Registry {
    descriptors: BTreeMap<ActorId, CategoryDescriptor>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    lists: [Vec<ActorHandle>; CATEGORY_COUNT],
    capacity: usize,
    live: usize,
}

/// Default instance cap, standing in for the console's bounded actor heap.
pub const DEFAULT_CAPACITY: usize = 128;

impl Registry {
    pub fn new() -> Registry {
        Registry::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Registry {
        Registry {
            descriptors: BTreeMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            lists: std::array::from_fn(|_| Vec::new()),
            capacity,
            live: 0,
        }
    }

    /// Add a category descriptor to the static table. Descriptors are
    /// immutable once registered.
    pub fn register(&mut self, descriptor: CategoryDescriptor) -> Result<(), RegisterError> {
        if self.descriptors.contains_key(&descriptor.id) {
            return Err(RegisterError::Duplicate(descriptor.id));
        }
        self.descriptors.insert(descriptor.id, descriptor);
        Ok(())
    }

    pub fn descriptor(&self, id: ActorId) -> Option<&CategoryDescriptor> {
        self.descriptors.get(&id)
    }

    /// Total live instances.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live instances in `category`.
    pub fn count(&self, category: ActorCategory) -> usize {
        self.lists[category.index()].len()
    }

    /// The longest-lived instance of `category`, if any. Spawn order within
    /// a category is otherwise not a behavioral contract.
    pub fn first(&self, category: ActorCategory) -> Option<ActorHandle> {
        self.lists[category.index()].first().copied()
    }

    pub fn get(&self, handle: ActorHandle) -> Option<&ActorInstance> {
        self.live_index(handle)
            .and_then(|index| self.slots[index].entry.as_ref())
    }

    pub fn get_mut(&mut self, handle: ActorHandle) -> Option<&mut ActorInstance> {
        self.live_index(handle)
            .and_then(|index| self.slots[index].entry.as_mut())
    }

    pub fn is_attached(&self, handle: ActorHandle) -> bool {
        self.get(handle).is_some_and(ActorInstance::is_attached)
    }

    /// Spawn an instance of `id`. On any failure nothing is allocated or
    /// linked; a partial spawn never becomes observable.
    pub fn spawn(
        &mut self,
        world: &mut World,
        loader: &mut ResourceLoader,
        id: ActorId,
        pose: Pose,
        variable: u16,
    ) -> Result<ActorHandle, SpawnError> {
        let mut ops = FrameOps::default();
        let handle = self.spawn_inner(world, loader, id, pose, variable, None, &mut ops)?;
        self.apply_ops(world, loader, ops);
        Ok(handle)
    }

    /// Spawn and attach the new instance as `owner`'s child. Rejected
    /// without side effects if the owner is stale or its child slot is
    /// already taken.
    pub fn spawn_attached(
        &mut self,
        world: &mut World,
        loader: &mut ResourceLoader,
        owner: ActorHandle,
        id: ActorId,
        pose: Pose,
        variable: u16,
    ) -> Result<ActorHandle, SpawnError> {
        let mut ops = FrameOps::default();
        let handle = self.spawn_inner(world, loader, id, pose, variable, Some(owner), &mut ops)?;
        self.apply_ops(world, loader, ops);
        Ok(handle)
    }

    /// Run the update pass: bump the frame counter, refresh player
    /// distances, then call every eligible instance's update hook in
    /// category order, list order within a category. Mutation requests from
    /// hooks are queued and applied after the traversal.
    pub fn update_all(&mut self, world: &mut World, loader: &mut ResourceLoader) {
        world.frame = world.frame.wrapping_add(1);
        for slot in &mut self.slots {
            if let Some(instance) = slot.entry.as_mut() {
                instance.distance_from_player =
                    instance.pose.position.distance(world.player_position);
            }
        }

        let mut ops = FrameOps::default();
        for category in ActorCategory::ALL {
            let handles = self.lists[category.index()].clone();
            for handle in handles {
                let Some(index) = self.live_index(handle) else {
                    continue;
                };
                let Some(mut instance) = self.slots[index].entry.take() else {
                    continue;
                };
                let hook = self.descriptors.get(&instance.id).and_then(|d| d.update);
                let eligible = instance.update_enabled
                    && (instance.flags.contains(ActorFlags::FORCE_UPDATE)
                        || instance.distance_from_player <= world.update_range);
                if let (Some(hook), true) = (hook, eligible) {
                    hook(&mut instance, world, &mut ops);
                }
                self.slots[index].entry = Some(instance);
            }
        }
        self.apply_ops(world, loader, ops);
    }

    /// Run the draw pass. Draw hooks see the world read-only; gameplay state
    /// may not change during drawing. An instance whose object bank is not
    /// resident skips its draw this frame without fault, and each drawn
    /// instance gets its own bank bound to the `Object` segment first.
    pub fn draw_all(
        &mut self,
        world: &World,
        loader: &mut ResourceLoader,
        backend: &mut dyn DrawBackend,
    ) {
        for category in ActorCategory::ALL {
            let handles = self.lists[category.index()].clone();
            for handle in handles {
                let Some(index) = self.live_index(handle) else {
                    continue;
                };
                let Some(mut instance) = self.slots[index].entry.take() else {
                    continue;
                };
                let descriptor = self.descriptors.get(&instance.id);
                let hook = descriptor.and_then(|d| d.draw);
                let object = descriptor.map(|d| d.object);
                let eligible = instance.draw_enabled
                    && (instance.flags.contains(ActorFlags::FORCE_DRAW)
                        || instance.distance_from_player <= world.draw_range);
                if let (Some(hook), true) = (hook, eligible) {
                    if instance.object_slot.is_none() {
                        // Bank arrived after spawn; record it now.
                        instance.object_slot = object.and_then(|id| loader.slot_of(id));
                    }
                    match instance.object_slot {
                        Some(slot) if loader.is_loaded(slot) => {
                            loader.bind_object_segment(slot);
                            let mut pass = DrawPass::new(loader.table(), &mut *backend);
                            hook(&mut instance, world, &mut pass);
                        }
                        _ => {}
                    }
                }
                self.slots[index].entry = Some(instance);
            }
        }
    }

    /// Clear an instance's update/draw eligibility without freeing it. The
    /// instance stays allocated and linked, inert until despawned.
    pub fn disable(&mut self, handle: ActorHandle) {
        if let Some(instance) = self.get_mut(handle) {
            instance.update_enabled = false;
            instance.draw_enabled = false;
        }
    }

    /// Destroy an instance: destructor hook, unlink from its category list,
    /// detach from parent and child (clearing their references to it), free
    /// the slot. Despawning an owner detaches its child rather than
    /// destroying it; attachment is informational, not ownership. Stale
    /// handles are ignored.
    pub fn despawn(&mut self, world: &mut World, handle: ActorHandle) {
        let Some(index) = self.live_index(handle) else {
            return;
        };
        let Some(mut instance) = self.slots[index].entry.take() else {
            return;
        };
        if let Some(destruct) = self.descriptors.get(&instance.id).and_then(|d| d.destruct) {
            destruct(&mut instance, world);
        }

        let list = &mut self.lists[instance.category.index()];
        if let Some(position) = list.iter().position(|&entry| entry == handle) {
            list.remove(position);
        }

        if let Some(parent) = instance.parent {
            if let Some(owner) = self.get_mut(parent) {
                if owner.child == Some(handle) {
                    owner.child = None;
                }
            }
        }
        if let Some(child) = instance.child {
            if let Some(orphan) = self.get_mut(child) {
                if orphan.parent == Some(handle) {
                    orphan.parent = None;
                }
            }
        }

        self.slots[index].generation = self.slots[index].generation.wrapping_add(1);
        self.free.push(index as u32);
        self.live -= 1;
    }

    /// Destroy every remaining instance, category order, as on scene unload.
    /// Afterward the registry holds no instances.
    pub fn teardown_all(&mut self, world: &mut World) {
        for category in ActorCategory::ALL {
            let handles = self.lists[category.index()].clone();
            for handle in handles {
                self.despawn(world, handle);
            }
        }
    }

    fn live_index(&self, handle: ActorHandle) -> Option<usize> {
        let index = handle.index as usize;
        let slot = self.slots.get(index)?;
        if slot.generation != handle.generation || slot.entry.is_none() {
            return None;
        }
        Some(index)
    }

    fn spawn_inner(
        &mut self,
        world: &mut World,
        loader: &mut ResourceLoader,
        id: ActorId,
        pose: Pose,
        variable: u16,
        attach_to: Option<ActorHandle>,
        ops: &mut FrameOps,
    ) -> Result<ActorHandle, SpawnError> {
        let descriptor = self
            .descriptors
            .get(&id)
            .cloned()
            .ok_or(SpawnError::UnknownActor(id))?;
        if self.live >= self.capacity {
            return Err(SpawnError::CapacityExhausted);
        }
        if let Some(owner) = attach_to {
            let owner_instance = self
                .get(owner)
                .ok_or(SpawnError::Attach(AttachError::StaleOwner))?;
            if owner_instance.child.is_some() {
                return Err(SpawnError::Attach(AttachError::OwnerOccupied));
            }
        }

        let mut data = vec![0u8; descriptor.instance_size];
        if let Some(script) = descriptor.init_script.as_ref() {
            if let Err(fault) = script.apply(&mut data) {
                eprintln!(
                    "[z64_runtime] compact init fault for actor {}: {fault}",
                    id.0
                );
                return Err(SpawnError::InitScript(fault));
            }
        }

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let generation = self.slots[index as usize].generation;
        let handle = ActorHandle { index, generation };

        let object_slot = loader.slot_of(descriptor.object);
        let instance = ActorInstance {
            id,
            category: descriptor.category,
            handle,
            flags: descriptor.flags,
            room: ROOM_UNDEF,
            variable,
            object_slot,
            pose,
            home: pose,
            velocity: Vec3f::ZERO,
            distance_from_player: pose.position.distance(world.player_position),
            update_enabled: true,
            draw_enabled: true,
            parent: attach_to,
            child: None,
            anim: AnimationPlayer::new(),
            data,
        };
        self.slots[index as usize].entry = Some(instance);
        self.lists[descriptor.category.index()].push(handle);
        self.live += 1;

        if let Some(owner) = attach_to {
            if let Some(owner_instance) = self.get_mut(owner) {
                owner_instance.child = Some(handle);
            }
        }

        // Bind the bank so the constructor can resolve its own resources.
        if let Some(slot) = object_slot {
            loader.bind_object_segment(slot);
        }
        if let Some(mut instance) = self.slots[index as usize].entry.take() {
            (descriptor.construct)(&mut instance, world, ops);
            self.slots[index as usize].entry = Some(instance);
        }

        Ok(handle)
    }

    fn apply_ops(&mut self, world: &mut World, loader: &mut ResourceLoader, mut ops: FrameOps) {
        while !ops.is_empty() {
            let mut next = FrameOps::default();
            for handle in ops.despawns.drain(..) {
                self.despawn(world, handle);
            }
            for handle in ops.disables.drain(..) {
                self.disable(handle);
            }
            for request in ops.spawns.drain(..) {
                if let Err(error) = self.spawn_inner(
                    world,
                    loader,
                    request.id,
                    request.pose,
                    request.variable,
                    request.attach_to,
                    &mut next,
                ) {
                    eprintln!(
                        "[z64_runtime] deferred spawn of actor {} failed: {error}",
                        request.id.0
                    );
                }
            }
            ops = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorCategory;
    use crate::objects::ObjectId;

    fn noop_construct(_: &mut ActorInstance, _: &mut World, _: &mut FrameOps) {}

    fn descriptor(id: u16, category: ActorCategory) -> CategoryDescriptor {
        CategoryDescriptor {
            id: ActorId(id),
            category,
            flags: ActorFlags::NONE,
            object: ObjectId(1),
            instance_size: 8,
            init_script: None,
            construct: noop_construct,
            destruct: None,
            update: None,
            draw: None,
        }
    }

    fn fixture() -> (Registry, World, ResourceLoader) {
        let mut registry = Registry::with_capacity(4);
        registry.register(descriptor(10, ActorCategory::Npc)).unwrap();
        registry
            .register(descriptor(11, ActorCategory::Misc))
            .unwrap();
        (registry, World::new(), ResourceLoader::new())
    }

    #[test]
    fn spawn_links_into_its_category_list() {
        let (mut registry, mut world, mut loader) = fixture();
        let handle = registry
            .spawn(&mut world, &mut loader, ActorId(10), Pose::default(), 0)
            .unwrap();
        assert_eq!(registry.count(ActorCategory::Npc), 1);
        assert_eq!(registry.count(ActorCategory::Misc), 0);
        assert_eq!(registry.first(ActorCategory::Npc), Some(handle));
        assert_eq!(registry.get(handle).map(|i| i.variable), Some(0));
    }

    #[test]
    fn spawn_despawn_round_trips_the_count() {
        let (mut registry, mut world, mut loader) = fixture();
        let before = registry.count(ActorCategory::Npc);
        let handle = registry
            .spawn(&mut world, &mut loader, ActorId(10), Pose::default(), 7)
            .unwrap();
        registry.despawn(&mut world, handle);
        assert_eq!(registry.count(ActorCategory::Npc), before);
        assert!(registry.get(handle).is_none());
    }

    #[test]
    fn unknown_actor_fails_the_spawn() {
        let (mut registry, mut world, mut loader) = fixture();
        let result = registry.spawn(&mut world, &mut loader, ActorId(99), Pose::default(), 0);
        assert_eq!(result.unwrap_err(), SpawnError::UnknownActor(ActorId(99)));
        assert!(registry.is_empty());
    }

    #[test]
    fn capacity_exhaustion_fails_without_partial_state() {
        let (mut registry, mut world, mut loader) = fixture();
        for _ in 0..4 {
            registry
                .spawn(&mut world, &mut loader, ActorId(10), Pose::default(), 0)
                .unwrap();
        }
        let result = registry.spawn(&mut world, &mut loader, ActorId(10), Pose::default(), 0);
        assert_eq!(result.unwrap_err(), SpawnError::CapacityExhausted);
        assert_eq!(registry.count(ActorCategory::Npc), 4);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (mut registry, _, _) = fixture();
        assert_eq!(
            registry.register(descriptor(10, ActorCategory::Boss)),
            Err(RegisterError::Duplicate(ActorId(10)))
        );
    }

    #[test]
    fn stale_handles_are_ignored() {
        let (mut registry, mut world, mut loader) = fixture();
        let handle = registry
            .spawn(&mut world, &mut loader, ActorId(10), Pose::default(), 0)
            .unwrap();
        registry.despawn(&mut world, handle);
        // Second despawn and lookups through the dead handle are no-ops.
        registry.despawn(&mut world, handle);
        assert!(registry.get(handle).is_none());
        assert!(!registry.is_attached(handle));
        assert!(registry.is_empty());
    }

    #[test]
    fn slot_reuse_bumps_the_generation() {
        let (mut registry, mut world, mut loader) = fixture();
        let first = registry
            .spawn(&mut world, &mut loader, ActorId(10), Pose::default(), 0)
            .unwrap();
        registry.despawn(&mut world, first);
        let second = registry
            .spawn(&mut world, &mut loader, ActorId(10), Pose::default(), 0)
            .unwrap();
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
        assert!(registry.get(second).is_some());
    }

    #[test]
    fn disable_leaves_the_instance_linked_but_inert() {
        let (mut registry, mut world, mut loader) = fixture();
        let handle = registry
            .spawn(&mut world, &mut loader, ActorId(10), Pose::default(), 0)
            .unwrap();
        registry.disable(handle);
        assert_eq!(registry.count(ActorCategory::Npc), 1);
        let instance = registry.get(handle).unwrap();
        assert!(!instance.update_enabled);
        assert!(!instance.draw_enabled);
    }

    #[test]
    fn teardown_empties_every_category() {
        let (mut registry, mut world, mut loader) = fixture();
        registry
            .spawn(&mut world, &mut loader, ActorId(10), Pose::default(), 0)
            .unwrap();
        registry
            .spawn(&mut world, &mut loader, ActorId(11), Pose::default(), 0)
            .unwrap();
        registry.teardown_all(&mut world);
        assert!(registry.is_empty());
        for category in ActorCategory::ALL {
            assert_eq!(registry.count(category), 0);
        }
    }
}
