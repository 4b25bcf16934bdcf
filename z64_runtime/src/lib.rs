//! A lightweight entity runtime in the style of a fourth-generation console
//! game: actors are registered per category, spawned from static descriptors,
//! default-initialized by a compact script, and driven through a uniform
//! constructor/update/draw/destructor lifecycle once per frame.
//!
//! The host owns the loop: call [`Registry::update_all`] then
//! [`Registry::draw_all`] each frame, single-threaded. Resource banks are
//! loaded by a [`objects::ResourceLoader`] between frames; segment addresses
//! resolve against its table only during the draw pass.

pub mod actor;
pub mod anim;
pub mod draw;
pub mod math;
pub mod objects;
pub mod registry;
pub mod world;

pub use actor::{ActorCategory, ActorFlags, ActorId, ActorInstance, CategoryDescriptor};
pub use anim::{Advance, AnimationPlayer};
pub use draw::{DrawBackend, DrawCommand, DrawPass, RecordingBackend};
pub use math::{Pose, Vec3f, Vec3s};
pub use objects::{ObjectId, ObjectSlot, ResourceLoader};
pub use registry::{
    ActorHandle, AttachError, FrameOps, RegisterError, Registry, SpawnError, SpawnRequest,
};
pub use world::World;
