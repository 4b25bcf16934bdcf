//! Data formats shared by the z64 actor runtime.
//!
//! Everything in this crate is pure data plus decoding: segment-relative
//! addressing, the compact actor-initializer script, and animation clip
//! descriptors. Live runtime state (the registry, the frame loop) lives in
//! `z64_runtime`; this crate keeps the bit layouts in one place so tools and
//! the runtime stay interoperable.

pub mod anim;
pub mod compact_init;
pub mod segment;

pub use anim::{AnimationClip, AnimationSet, ClipDef, ClipMode};
pub use compact_init::{InitDecodeError, InitEntry, InitScript, InitType, MAX_SCRIPT_ENTRIES};
pub use segment::{RamAddr, Segment, SegmentAddr, SegmentError, SegmentTable, SEGMENT_TABLE_LEN};
