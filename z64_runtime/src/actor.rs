//! Actor categories, flags, static descriptors, and live instances.

use serde::{Deserialize, Serialize};

use z64_formats::compact_init::InitScript;

use crate::anim::AnimationPlayer;
use crate::draw::DrawPass;
use crate::math::{Pose, Vec3f};
use crate::objects::{ObjectId, ObjectSlot};
use crate::registry::{ActorHandle, FrameOps};
use crate::world::World;

/// Room index meaning "not bound to a room; stays loaded across rooms".
pub const ROOM_UNDEF: i8 = -1;

/// Number of actor categories.
pub const CATEGORY_COUNT: usize = 12;

/// The fixed set of spawnable kinds, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorCategory {
    /// Switches and puzzle actors (buttons, torches, crystals).
    Switch,
    /// Large set pieces.
    Prop1,
    /// Playable characters.
    Player,
    /// Bombs and thrown explosives.
    Bomb,
    /// Interactive NPCs.
    Npc,
    /// Enemies and minibosses.
    Enemy,
    /// Simple set pieces.
    Prop2,
    /// Items, collectibles, projectiles.
    Item,
    /// Miscellaneous.
    Misc,
    /// Bosses and their support actors.
    Boss,
    /// Transition actors (doors, loading planes).
    Door,
    /// Chests.
    Chest,
}

impl ActorCategory {
    /// Every category, in update/draw dispatch order.
    pub const ALL: [ActorCategory; CATEGORY_COUNT] = [
        ActorCategory::Switch,
        ActorCategory::Prop1,
        ActorCategory::Player,
        ActorCategory::Bomb,
        ActorCategory::Npc,
        ActorCategory::Enemy,
        ActorCategory::Prop2,
        ActorCategory::Item,
        ActorCategory::Misc,
        ActorCategory::Boss,
        ActorCategory::Door,
        ActorCategory::Chest,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Behavioral flag bits applied to instances at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorFlags(pub u32);

impl ActorFlags {
    pub const NONE: ActorFlags = ActorFlags(0);
    /// Instance can be reticle-targeted.
    pub const TARGETABLE: ActorFlags = ActorFlags(0x0000_0001);
    /// Play threat music when the player is near (requires `TARGETABLE`).
    pub const APPROACH_MUSIC: ActorFlags = ActorFlags(0x0000_0004);
    /// Update regardless of proximity to the player.
    pub const FORCE_UPDATE: ActorFlags = ActorFlags(0x0000_0010);
    /// Draw regardless of proximity to the player.
    pub const FORCE_DRAW: ActorFlags = ActorFlags(0x0000_0020);

    pub fn contains(self, other: ActorFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ActorFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: ActorFlags) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for ActorFlags {
    type Output = ActorFlags;

    fn bitor(self, rhs: ActorFlags) -> ActorFlags {
        ActorFlags(self.0 | rhs.0)
    }
}

/// Identity of a category in the registry's descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u16);

pub type ConstructHook = fn(&mut ActorInstance, &mut World, &mut FrameOps);
pub type DestructHook = fn(&mut ActorInstance, &mut World);
pub type UpdateHook = fn(&mut ActorInstance, &mut World, &mut FrameOps);
pub type DrawHook = fn(&mut ActorInstance, &World, &mut DrawPass);

/// Static, per-kind table entry: immutable after registration, one per
/// distinct spawnable kind for the life of the process. Lifecycle hooks are
/// plain `fn` pointers in a closed dispatch table; update, draw, and the
/// destructor may be absent.
#[derive(Clone)]
pub struct CategoryDescriptor {
    pub id: ActorId,
    pub category: ActorCategory,
    /// Default flags stamped onto new instances.
    pub flags: ActorFlags,
    /// The resource bank this kind draws from.
    pub object: ObjectId,
    /// Bytes of category-specific instance state.
    pub instance_size: usize,
    /// Optional compact-initializer defaults applied to the zero-filled
    /// instance image at spawn.
    pub init_script: Option<InitScript>,
    pub construct: ConstructHook,
    pub destruct: Option<DestructHook>,
    pub update: Option<UpdateHook>,
    pub draw: Option<DrawHook>,
}

impl std::fmt::Debug for CategoryDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryDescriptor")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("flags", &self.flags)
            .field("object", &self.object)
            .field("instance_size", &self.instance_size)
            .field("has_init_script", &self.init_script.is_some())
            .field("has_destruct", &self.destruct.is_some())
            .field("has_update", &self.update.is_some())
            .field("has_draw", &self.draw.is_some())
            .finish()
    }
}

/// One live actor.
///
/// Category-specific state lives in `data`, a zero-filled big-endian byte
/// image of `instance_size` bytes with compact-initializer defaults applied;
/// hooks access their fields through `z64_formats::compact_init`'s image
/// accessors. Attachment is a non-owning relation with exactly one child
/// slot per actor: despawning an owner detaches its child, never destroys it.
#[derive(Debug)]
pub struct ActorInstance {
    pub id: ActorId,
    pub category: ActorCategory,
    /// This instance's own handle, valid while it is alive.
    pub handle: ActorHandle,
    pub flags: ActorFlags,
    pub room: i8,
    /// The opaque 16-bit spawn variable; only the category's own hooks
    /// interpret it.
    pub variable: u16,
    /// Slot of the category's object bank, recorded when resolvable.
    pub object_slot: Option<ObjectSlot>,
    pub pose: Pose,
    /// The spawn-time pose, kept for homing/reset behavior.
    pub home: Pose,
    pub velocity: Vec3f,
    /// Refreshed by the dispatcher before each update pass.
    pub distance_from_player: f32,
    /// Cleared by [`crate::Registry::disable`]; an ineligible instance stays
    /// allocated and linked but runs no hooks.
    pub update_enabled: bool,
    pub draw_enabled: bool,
    pub parent: Option<ActorHandle>,
    pub child: Option<ActorHandle>,
    pub anim: AnimationPlayer,
    pub data: Vec<u8>,
}

impl ActorInstance {
    /// Whether this instance is attached as a child of another actor.
    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }

    /// Set a uniform model scale. Typical values are around 0.01.
    pub fn set_uniform_scale(&mut self, factor: f32) {
        self.pose.scale = Vec3f::new(factor, factor, factor);
    }
}
