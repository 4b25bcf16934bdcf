//! The opaque drawing backend boundary.
//!
//! The runtime never encodes display lists; draw hooks describe what to
//! render as [`DrawCommand`]s and the host's backend turns them into whatever
//! the renderer wants. [`RecordingBackend`] captures the stream for tests and
//! headless runs.

use serde::{Deserialize, Serialize};

use z64_formats::segment::{RamAddr, SegmentAddr, SegmentTable};

use crate::math::Pose;

/// One drawable submitted by a draw hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// An animated skeleton: resolved skeleton and animation resources plus
    /// the playback sample to pose it with.
    Skeleton {
        skeleton: RamAddr,
        animation: RamAddr,
        frame: f32,
        blend_weight: f32,
        pose: Pose,
    },
    /// An untextured marker, used by set-dressing and debug actors.
    Marker { pose: Pose },
}

pub trait DrawBackend {
    fn submit(&mut self, command: DrawCommand);
}

/// Backend that records every submitted command.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<DrawCommand>,
}

impl RecordingBackend {
    pub fn new() -> RecordingBackend {
        RecordingBackend::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DrawBackend for RecordingBackend {
    fn submit(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

/// Per-actor draw context: segment resolution against the loader's table
/// (with the actor's object bank already bound) plus command submission.
pub struct DrawPass<'a> {
    table: &'a SegmentTable,
    backend: &'a mut dyn DrawBackend,
}

impl<'a> DrawPass<'a> {
    pub fn new(table: &'a SegmentTable, backend: &'a mut dyn DrawBackend) -> DrawPass<'a> {
        DrawPass { table, backend }
    }

    /// Resolve a segment address. `None` means the owning bank is not
    /// loaded; a draw hook should skip the dependent drawable this frame.
    pub fn resolve(&self, addr: SegmentAddr) -> Option<RamAddr> {
        self.table.resolve(addr)
    }

    pub fn submit(&mut self, command: DrawCommand) {
        self.backend.submit(command);
    }
}
