//! Wire-level constants and the stream header.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::SceneIoError;

pub const FOURCC_SCENE_STREAM: u32 = u32::from_le_bytes(*b"SGIO");
pub const FOURCC_SCENE_END: u32 = u32::from_le_bytes(*b"SEND");

/// Bumped whenever the record layout changes shape.
pub const STREAM_VERSION: u16 = 1;

/// A record opens with one marker byte: either a full inline definition or
/// a back-reference naming an already-minted identity.
pub(crate) const MARKER_INLINE: u8 = 0;
pub(crate) const MARKER_BACK_REFERENCE: u8 = 1;

/// Raw identity `0` is reserved; a back-reference carrying it decodes to a
/// null reference and never touches the symbol table.
pub(crate) const NULL_IDENTITY: u32 = 0;

pub(crate) const META_HAS_NAME: u8 = 1 << 0;
pub(crate) const META_HAS_USER_DATA: u8 = 1 << 1;

#[derive(Debug, Clone, Copy)]
pub struct StreamHeader {
    pub version: u16,
    pub flags: u16,
}

impl StreamHeader {
    pub(crate) fn current() -> Self {
        StreamHeader {
            version: STREAM_VERSION,
            flags: 0,
        }
    }

    pub(crate) fn write<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError> {
        wtr.write_u32::<LittleEndian>(FOURCC_SCENE_STREAM)?;
        wtr.write_u16::<LittleEndian>(self.version)?;
        wtr.write_u16::<LittleEndian>(self.flags)?;
        Ok(())
    }

    pub(crate) fn read<R: Read + ?Sized>(rdr: &mut R) -> Result<StreamHeader, SceneIoError> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        if magic != FOURCC_SCENE_STREAM {
            return Err(SceneIoError::InvalidMagicValue { magic });
        }
        let version = rdr.read_u16::<LittleEndian>()?;
        if version > STREAM_VERSION {
            return Err(SceneIoError::UnsupportedVersion { version });
        }
        let flags = rdr.read_u16::<LittleEndian>()?;
        if flags != 0 {
            return Err(SceneIoError::FormatError {
                reason: "reserved header flags must be zero",
            });
        }
        Ok(StreamHeader { version, flags })
    }
}
