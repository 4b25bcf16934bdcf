//! Animation clip descriptors.
//!
//! A clip is a segment-addressed animation resource plus the frame count as
//! authored. The original reads the frame count out of the resource header at
//! runtime; here it travels with the descriptor so playback never needs to
//! dereference resource memory. `AnimationSet` is the later-revision indexed
//! clip table that lets actors switch animations by index instead of carrying
//! loose clip constants.

use serde::{Deserialize, Serialize};

use crate::segment::SegmentAddr;

/// Steady-state playback behavior of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipMode {
    /// Wrap back to frame 0 at the end of the clip.
    Loop,
    /// Hold the final frame and report completion.
    Segment,
}

/// One animation resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub data: SegmentAddr,
    pub frame_count: f32,
}

impl AnimationClip {
    pub fn new(data: SegmentAddr, frame_count: f32) -> AnimationClip {
        AnimationClip { data, frame_count }
    }
}

/// Full playback parameters for one entry in an [`AnimationSet`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipDef {
    pub clip: AnimationClip,
    pub speed: f32,
    pub start_frame: f32,
    pub mode: ClipMode,
    /// Frames of blend toward this clip when switching to it. Zero pops.
    pub blend_frames: f32,
}

/// An indexed table of clip definitions owned by a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationSet {
    defs: Vec<ClipDef>,
}

impl AnimationSet {
    pub fn new(defs: Vec<ClipDef>) -> AnimationSet {
        AnimationSet { defs }
    }

    pub fn get(&self, index: usize) -> Option<&ClipDef> {
        self.defs.get(index)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
