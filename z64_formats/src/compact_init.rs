//! The compact actor-initializer script.
//!
//! Categories can ship a short bit-packed script that writes typed default
//! values into a freshly zero-filled instance image, instead of carrying a
//! full static initializer per field. Each entry packs a 4-bit type tag and
//! a 12-bit byte offset into one big-endian `u16`, followed by a big-endian
//! `i16` literal. The final entry must use a `*Stop` tag; its value is still
//! written before decoding stops.
//!
//! Values are 16-bit on the wire, so integral defaults larger than `0xFFFF`
//! cannot be expressed. Unsigned targets zero-extend the literal's bits,
//! signed targets sign-extend, and the two float tags write `value` (or
//! `value / 1000` for the fixed-point variant) as an `f32`.

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on entries walked before a missing terminator is a fault.
pub const MAX_SCRIPT_ENTRIES: usize = 64;

/// Largest representable entry offset (exclusive bound).
pub const MAX_ENTRY_OFFSET: u16 = 1 << 12;

/// Size in bytes of one encoded entry.
pub const ENTRY_SIZE: usize = 4;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InitDecodeError {
    #[error("unknown init type tag {0}")]
    UnknownType(u8),
    #[error("entry offset {0:#x} does not fit in 12 bits")]
    OffsetOutOfRange(u16),
    #[error("script truncated mid-entry at byte {0}")]
    Truncated(usize),
    #[error("no terminator entry within {MAX_SCRIPT_ENTRIES} entries")]
    MissingTerminator,
    #[error("{width}-byte write at offset {offset:#x} exceeds instance size {size:#x}")]
    OutOfBounds {
        offset: usize,
        width: usize,
        size: usize,
    },
}

/// Type tag of one script entry. Tags 0..=7 are the terminator variants of
/// tags 8..=15; decoding stops after a terminator entry is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InitType {
    S8Stop = 0,
    U8Stop = 1,
    S16Stop = 2,
    U16Stop = 3,
    S32Stop = 4,
    U32Stop = 5,
    F32Stop = 6,
    F32MilliStop = 7,
    S8 = 8,
    U8 = 9,
    S16 = 10,
    U16 = 11,
    S32 = 12,
    U32 = 13,
    F32 = 14,
    /// Fixed-point float default; the literal is divided by 1000.
    F32Milli = 15,
}

impl InitType {
    /// Authoring alias: a float vector default is three consecutive `S8`-
    /// tagged scalar entries at `offset`, `offset + 4`, `offset + 8`. The
    /// decoder never special-cases vectors; the aliases only exist so static
    /// tables read naturally.
    pub const VEC3F: InitType = InitType::S8;
    /// Authoring alias for a fixed-point float vector (see [`Self::VEC3F`]).
    pub const VEC3F_MILLI: InitType = InitType::U8;
    /// Authoring alias for a short vector (see [`Self::VEC3F`]).
    pub const VEC3S: InitType = InitType::S16;

    pub fn from_tag(tag: u8) -> Option<InitType> {
        match tag {
            0 => Some(InitType::S8Stop),
            1 => Some(InitType::U8Stop),
            2 => Some(InitType::S16Stop),
            3 => Some(InitType::U16Stop),
            4 => Some(InitType::S32Stop),
            5 => Some(InitType::U32Stop),
            6 => Some(InitType::F32Stop),
            7 => Some(InitType::F32MilliStop),
            8 => Some(InitType::S8),
            9 => Some(InitType::U8),
            10 => Some(InitType::S16),
            11 => Some(InitType::U16),
            12 => Some(InitType::S32),
            13 => Some(InitType::U32),
            14 => Some(InitType::F32),
            15 => Some(InitType::F32Milli),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn is_stop(self) -> bool {
        self.tag() < 8
    }

    /// Width in bytes of the write this entry performs.
    pub fn width(self) -> usize {
        match self {
            InitType::S8Stop | InitType::U8Stop | InitType::S8 | InitType::U8 => 1,
            InitType::S16Stop | InitType::U16Stop | InitType::S16 | InitType::U16 => 2,
            InitType::S32Stop
            | InitType::U32Stop
            | InitType::F32Stop
            | InitType::F32MilliStop
            | InitType::S32
            | InitType::U32
            | InitType::F32
            | InitType::F32Milli => 4,
        }
    }
}

/// One decoded script entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitEntry {
    pub ty: InitType,
    pub offset: u16,
    pub value: i16,
}

impl InitEntry {
    pub fn new(ty: InitType, offset: u16, value: i16) -> Result<InitEntry, InitDecodeError> {
        if offset >= MAX_ENTRY_OFFSET {
            return Err(InitDecodeError::OffsetOutOfRange(offset));
        }
        Ok(InitEntry { ty, offset, value })
    }
}

/// A validated script: a run of entries whose last element is a terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitScript {
    entries: Vec<InitEntry>,
}

impl InitScript {
    /// Build a script from already-decoded entries, enforcing the terminator
    /// contract (exactly one, in last position).
    pub fn from_entries(entries: Vec<InitEntry>) -> Result<InitScript, InitDecodeError> {
        match entries.last() {
            Some(last) if last.ty.is_stop() => {}
            _ => return Err(InitDecodeError::MissingTerminator),
        }
        if entries.len() > MAX_SCRIPT_ENTRIES {
            return Err(InitDecodeError::MissingTerminator);
        }
        if entries[..entries.len() - 1].iter().any(|e| e.ty.is_stop()) {
            // A stop tag before the end would make trailing entries dead.
            return Err(InitDecodeError::MissingTerminator);
        }
        Ok(InitScript { entries })
    }

    /// Decode a script from its wire encoding. Iteration is bounded: a blob
    /// with no terminator within [`MAX_SCRIPT_ENTRIES`] entries is a fault,
    /// not an endless scan.
    pub fn parse(bytes: &[u8]) -> Result<InitScript, InitDecodeError> {
        let mut entries = Vec::new();
        let mut cursor = 0usize;
        while entries.len() < MAX_SCRIPT_ENTRIES {
            if cursor + ENTRY_SIZE > bytes.len() {
                return if cursor == bytes.len() {
                    Err(InitDecodeError::MissingTerminator)
                } else {
                    Err(InitDecodeError::Truncated(cursor))
                };
            }
            let packed = BigEndian::read_u16(&bytes[cursor..cursor + 2]);
            let value = BigEndian::read_i16(&bytes[cursor + 2..cursor + 4]);
            cursor += ENTRY_SIZE;

            let tag = (packed >> 12) as u8;
            let ty = InitType::from_tag(tag).ok_or(InitDecodeError::UnknownType(tag))?;
            let offset = packed & (MAX_ENTRY_OFFSET - 1);
            entries.push(InitEntry { ty, offset, value });
            if ty.is_stop() {
                return Ok(InitScript { entries });
            }
        }
        Err(InitDecodeError::MissingTerminator)
    }

    /// Encode back to the wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * ENTRY_SIZE);
        for entry in &self.entries {
            let packed = (u16::from(entry.ty.tag()) << 12) | entry.offset;
            out.extend_from_slice(&packed.to_be_bytes());
            out.extend_from_slice(&entry.value.to_be_bytes());
        }
        out
    }

    pub fn entries(&self) -> &[InitEntry] {
        &self.entries
    }

    /// Apply the script to an instance image, writing each literal at its
    /// offset sized by its tag. Every write is bounds-checked against the
    /// image before it mutates anything; the script never allocates and
    /// never writes past the image.
    pub fn apply(&self, image: &mut [u8]) -> Result<(), InitDecodeError> {
        for entry in self.entries.iter().take(MAX_SCRIPT_ENTRIES) {
            let offset = usize::from(entry.offset);
            let width = entry.ty.width();
            if offset + width > image.len() {
                return Err(InitDecodeError::OutOfBounds {
                    offset,
                    width,
                    size: image.len(),
                });
            }
            let target = &mut image[offset..offset + width];
            match entry.ty {
                InitType::S8Stop | InitType::S8 => target[0] = entry.value as i8 as u8,
                InitType::U8Stop | InitType::U8 => target[0] = (entry.value as u16) as u8,
                InitType::S16Stop | InitType::S16 => BigEndian::write_i16(target, entry.value),
                InitType::U16Stop | InitType::U16 => {
                    BigEndian::write_u16(target, entry.value as u16)
                }
                InitType::S32Stop | InitType::S32 => {
                    BigEndian::write_i32(target, i32::from(entry.value))
                }
                InitType::U32Stop | InitType::U32 => {
                    BigEndian::write_u32(target, u32::from(entry.value as u16))
                }
                InitType::F32Stop | InitType::F32 => {
                    BigEndian::write_f32(target, f32::from(entry.value))
                }
                InitType::F32MilliStop | InitType::F32Milli => {
                    BigEndian::write_f32(target, f32::from(entry.value) / 1000.0)
                }
            }
            if entry.ty.is_stop() {
                return Ok(());
            }
        }
        Err(InitDecodeError::MissingTerminator)
    }
}

/// Big-endian field accessors for instance images, matching the layout the
/// initializer writes. Reads return `None` rather than faulting when a field
/// would cross the end of the image.
pub fn read_i8(image: &[u8], offset: usize) -> Option<i8> {
    image.get(offset).map(|&b| b as i8)
}

pub fn read_u8(image: &[u8], offset: usize) -> Option<u8> {
    image.get(offset).copied()
}

pub fn read_i16(image: &[u8], offset: usize) -> Option<i16> {
    image
        .get(offset..offset + 2)
        .map(|bytes| BigEndian::read_i16(bytes))
}

pub fn read_u16(image: &[u8], offset: usize) -> Option<u16> {
    image
        .get(offset..offset + 2)
        .map(|bytes| BigEndian::read_u16(bytes))
}

pub fn read_i32(image: &[u8], offset: usize) -> Option<i32> {
    image
        .get(offset..offset + 4)
        .map(|bytes| BigEndian::read_i32(bytes))
}

pub fn read_u32(image: &[u8], offset: usize) -> Option<u32> {
    image
        .get(offset..offset + 4)
        .map(|bytes| BigEndian::read_u32(bytes))
}

pub fn read_f32(image: &[u8], offset: usize) -> Option<f32> {
    image
        .get(offset..offset + 4)
        .map(|bytes| BigEndian::read_f32(bytes))
}

pub fn write_i8(image: &mut [u8], offset: usize, value: i8) -> Option<()> {
    image.get_mut(offset).map(|b| *b = value as u8)
}

pub fn write_u8(image: &mut [u8], offset: usize, value: u8) -> Option<()> {
    image.get_mut(offset).map(|b| *b = value)
}

pub fn write_i16(image: &mut [u8], offset: usize, value: i16) -> Option<()> {
    image
        .get_mut(offset..offset + 2)
        .map(|bytes| BigEndian::write_i16(bytes, value))
}

pub fn write_u16(image: &mut [u8], offset: usize, value: u16) -> Option<()> {
    image
        .get_mut(offset..offset + 2)
        .map(|bytes| BigEndian::write_u16(bytes, value))
}

pub fn write_i32(image: &mut [u8], offset: usize, value: i32) -> Option<()> {
    image
        .get_mut(offset..offset + 4)
        .map(|bytes| BigEndian::write_i32(bytes, value))
}

pub fn write_u32(image: &mut [u8], offset: usize, value: u32) -> Option<()> {
    image
        .get_mut(offset..offset + 4)
        .map(|bytes| BigEndian::write_u32(bytes, value))
}

pub fn write_f32(image: &mut [u8], offset: usize, value: f32) -> Option<()> {
    image
        .get_mut(offset..offset + 4)
        .map(|bytes| BigEndian::write_f32(bytes, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ty: InitType, offset: u16, value: i16) -> InitEntry {
        InitEntry::new(ty, offset, value).unwrap()
    }

    #[test]
    fn writes_a_u16_default_and_nothing_else() {
        let script = InitScript::from_entries(vec![
            entry(InitType::U16, 4, 7),
            entry(InitType::U8Stop, 0, 0),
        ])
        .unwrap();
        let mut image = [0u8; 8];
        script.apply(&mut image).unwrap();
        assert_eq!(read_u16(&image, 4), Some(7));
        assert_eq!(image, [0, 0, 0, 0, 0, 7, 0, 0]);
    }

    #[test]
    fn terminator_value_is_still_written() {
        let script = InitScript::from_entries(vec![entry(InitType::S16Stop, 2, -2)]).unwrap();
        let mut image = [0u8; 4];
        script.apply(&mut image).unwrap();
        assert_eq!(read_i16(&image, 2), Some(-2));
    }

    #[test]
    fn fixed_point_literal_scales_by_a_thousandth() {
        let script = InitScript::from_entries(vec![entry(InitType::F32MilliStop, 0, 10)]).unwrap();
        let mut image = [0u8; 4];
        script.apply(&mut image).unwrap();
        assert_eq!(read_f32(&image, 0), Some(0.01));
    }

    #[test]
    fn unsigned_targets_zero_extend() {
        let script = InitScript::from_entries(vec![entry(InitType::U32Stop, 0, -1)]).unwrap();
        let mut image = [0u8; 4];
        script.apply(&mut image).unwrap();
        assert_eq!(read_u32(&image, 0), Some(0xFFFF));
    }

    #[test]
    fn signed_targets_sign_extend() {
        let script = InitScript::from_entries(vec![entry(InitType::S32Stop, 0, -1)]).unwrap();
        let mut image = [0u8; 4];
        script.apply(&mut image).unwrap();
        assert_eq!(read_i32(&image, 0), Some(-1));
    }

    #[test]
    fn out_of_bounds_write_is_rejected_before_mutation() {
        let script = InitScript::from_entries(vec![entry(InitType::U32Stop, 6, 1)]).unwrap();
        let mut image = [0u8; 8];
        assert_eq!(
            script.apply(&mut image),
            Err(InitDecodeError::OutOfBounds {
                offset: 6,
                width: 4,
                size: 8
            })
        );
        assert_eq!(image, [0u8; 8]);
    }

    #[test]
    fn missing_terminator_is_a_fault() {
        assert_eq!(
            InitScript::from_entries(vec![entry(InitType::U16, 0, 1)]),
            Err(InitDecodeError::MissingTerminator)
        );
    }

    #[test]
    fn wire_layout_round_trips() {
        let script = InitScript::from_entries(vec![
            entry(InitType::S16, 0x020, 100),
            entry(InitType::F32Milli, 0x050, 10),
            entry(InitType::U8Stop, 0x006, 11),
        ])
        .unwrap();
        let bytes = script.encode();
        // tag 10 (S16) << 12 | 0x020, then the literal.
        assert_eq!(&bytes[..4], &[0xA0, 0x20, 0x00, 0x64]);
        let parsed = InitScript::parse(&bytes).unwrap();
        assert_eq!(parsed, script);
    }

    #[test]
    fn parse_stops_at_the_terminator() {
        let mut bytes = InitScript::from_entries(vec![entry(InitType::U8Stop, 0, 1)])
            .unwrap()
            .encode();
        // Trailing garbage after the terminator is never examined.
        bytes.extend_from_slice(&[0xFF; 8]);
        let parsed = InitScript::parse(&bytes).unwrap();
        assert_eq!(parsed.entries().len(), 1);
    }

    #[test]
    fn parse_bounds_a_terminatorless_blob() {
        // A long run of valid non-stop entries with no terminator.
        let blob: Vec<u8> = std::iter::repeat([0xA0, 0x00, 0x00, 0x01])
            .take(MAX_SCRIPT_ENTRIES + 4)
            .flatten()
            .collect();
        assert_eq!(
            InitScript::parse(&blob),
            Err(InitDecodeError::MissingTerminator)
        );
    }

    #[test]
    fn truncated_entry_is_reported() {
        let bytes = [0xA0, 0x00, 0x00];
        assert_eq!(
            InitScript::parse(&bytes),
            Err(InitDecodeError::Truncated(0))
        );
    }
}
