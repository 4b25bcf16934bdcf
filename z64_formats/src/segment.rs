//! Segment-relative resource addressing.
//!
//! Resources are addressed as (segment, offset) pairs rather than absolute
//! locations, so a bank can be relocated by rewriting a single table entry.
//! The raw wire layout is a `u32` with the segment index in the high byte and
//! a 24-bit offset in the low bytes. Entry 0 of the table is reserved: a
//! `Direct` address bypasses the table and is already absolute.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of entries in a [`SegmentTable`].
pub const SEGMENT_TABLE_LEN: usize = 16;

/// Largest representable segment offset (exclusive bound).
pub const MAX_SEGMENT_OFFSET: u32 = 1 << 24;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    #[error("segment offset {0:#x} does not fit in 24 bits")]
    OffsetOutOfRange(u32),
    #[error("segment index {0} is not a valid segment")]
    UnknownSegment(u8),
    #[error("segment 0 is reserved and cannot hold a base address")]
    ReservedSegment,
}

/// The sixteen addressable resource regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Segment {
    /// Raw absolute address; never resolved through the table.
    Direct = 0,
    /// Boot-screen resources.
    Logo = 1,
    /// The currently loaded scene file.
    Scene = 2,
    /// The currently loaded room file.
    Room = 3,
    /// Common resources, always loaded.
    GlobalKeep = 4,
    /// Mode-specific resources (field or dungeon, per scene).
    SelectedKeep = 5,
    /// The resource bank of the actor currently being drawn.
    Object = 6,
    /// The player actor's resource bank.
    Player = 7,
    Context1 = 8,
    Context2 = 9,
    Context3 = 10,
    Context4 = 11,
    Context5 = 12,
    Context6 = 13,
    ZBuffer = 14,
    FrameBuffer = 15,
}

impl Segment {
    pub fn from_index(index: u8) -> Option<Segment> {
        match index {
            0 => Some(Segment::Direct),
            1 => Some(Segment::Logo),
            2 => Some(Segment::Scene),
            3 => Some(Segment::Room),
            4 => Some(Segment::GlobalKeep),
            5 => Some(Segment::SelectedKeep),
            6 => Some(Segment::Object),
            7 => Some(Segment::Player),
            8 => Some(Segment::Context1),
            9 => Some(Segment::Context2),
            10 => Some(Segment::Context3),
            11 => Some(Segment::Context4),
            12 => Some(Segment::Context5),
            13 => Some(Segment::Context6),
            14 => Some(Segment::ZBuffer),
            15 => Some(Segment::FrameBuffer),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// A resolved absolute address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RamAddr(pub u32);

/// A segment-relative address: segment index plus a 24-bit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentAddr {
    segment: Segment,
    offset: u32,
}

impl SegmentAddr {
    pub fn new(segment: Segment, offset: u32) -> Result<SegmentAddr, SegmentError> {
        if offset >= MAX_SEGMENT_OFFSET {
            return Err(SegmentError::OffsetOutOfRange(offset));
        }
        Ok(SegmentAddr { segment, offset })
    }

    /// Decode the packed `u32` wire layout.
    pub fn from_raw(raw: u32) -> Result<SegmentAddr, SegmentError> {
        let index = (raw >> 24) as u8;
        let segment = Segment::from_index(index).ok_or(SegmentError::UnknownSegment(index))?;
        SegmentAddr::new(segment, raw & (MAX_SEGMENT_OFFSET - 1))
    }

    /// Encode the packed `u32` wire layout.
    pub fn to_raw(self) -> u32 {
        (u32::from(self.segment.index()) << 24) | self.offset
    }

    pub fn segment(self) -> Segment {
        self.segment
    }

    pub fn offset(self) -> u32 {
        self.offset
    }
}

/// Per-segment base addresses, owned and mutated by the resource loader.
///
/// The table is rewritten only between frame phases (bank loads, or binding
/// an actor's object bank ahead of its draw call); resolution itself is pure.
/// An address resolved while its owning bank is not loaded fails closed with
/// `None` rather than producing a wild pointer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentTable {
    bases: [Option<RamAddr>; SEGMENT_TABLE_LEN],
}

impl SegmentTable {
    pub fn new() -> SegmentTable {
        SegmentTable::default()
    }

    /// Assign a base address to a segment. Segment 0 is reserved.
    pub fn set_base(&mut self, segment: Segment, base: RamAddr) -> Result<(), SegmentError> {
        if segment == Segment::Direct {
            return Err(SegmentError::ReservedSegment);
        }
        self.bases[segment.index() as usize] = Some(base);
        Ok(())
    }

    pub fn clear_base(&mut self, segment: Segment) {
        if segment != Segment::Direct {
            self.bases[segment.index() as usize] = None;
        }
    }

    pub fn base(&self, segment: Segment) -> Option<RamAddr> {
        self.bases[segment.index() as usize]
    }

    /// Resolve a segment address against the current bases.
    ///
    /// `Direct` addresses return the offset reinterpreted as an absolute
    /// address. Any other segment resolves to `base + offset`, or `None`
    /// when the segment has no base assigned.
    pub fn resolve(&self, addr: SegmentAddr) -> Option<RamAddr> {
        match addr.segment() {
            Segment::Direct => Some(RamAddr(addr.offset())),
            segment => self
                .base(segment)
                .map(|base| RamAddr(base.0.wrapping_add(addr.offset()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_base_plus_offset() {
        let mut table = SegmentTable::new();
        table
            .set_base(Segment::GlobalKeep, RamAddr(0x8011_0000))
            .unwrap();
        let addr = SegmentAddr::new(Segment::GlobalKeep, 0x12345).unwrap();
        assert_eq!(table.resolve(addr), Some(RamAddr(0x8012_2345)));
    }

    #[test]
    fn direct_addresses_bypass_the_table() {
        let table = SegmentTable::new();
        let addr = SegmentAddr::new(Segment::Direct, 0x00AB_CDEF).unwrap();
        assert_eq!(table.resolve(addr), Some(RamAddr(0x00AB_CDEF)));
    }

    #[test]
    fn unset_base_fails_closed() {
        let table = SegmentTable::new();
        let addr = SegmentAddr::new(Segment::Object, 0xE68).unwrap();
        assert_eq!(table.resolve(addr), None);
    }

    #[test]
    fn reserved_segment_rejects_a_base() {
        let mut table = SegmentTable::new();
        assert_eq!(
            table.set_base(Segment::Direct, RamAddr(0x8000_0000)),
            Err(SegmentError::ReservedSegment)
        );
    }

    #[test]
    fn offsets_are_bounded_to_24_bits() {
        assert_eq!(
            SegmentAddr::new(Segment::Scene, MAX_SEGMENT_OFFSET),
            Err(SegmentError::OffsetOutOfRange(MAX_SEGMENT_OFFSET))
        );
    }

    #[test]
    fn raw_layout_round_trips() {
        let addr = SegmentAddr::new(Segment::Object, 0x58).unwrap();
        assert_eq!(addr.to_raw(), 0x0600_0058);
        let back = SegmentAddr::from_raw(0x0600_0058).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut table = SegmentTable::new();
        table.set_base(Segment::Room, RamAddr(0x8030_0000)).unwrap();
        let addr = SegmentAddr::new(Segment::Room, 0x40).unwrap();
        assert_eq!(table.resolve(addr), table.resolve(addr));
    }
}
