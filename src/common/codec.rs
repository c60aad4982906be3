use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::SceneIoError;
use crate::common::types::BoundingVolume;

/// Symmetric wire trait for everything the stream is built from. All
/// multi-byte values are little-endian and fixed-width. The reader/writer
/// parameters are `?Sized` so implementations compose with the
/// `&mut dyn Read`/`&mut dyn Write` handles the adapter contract passes
/// around.
pub trait Streamable: Sized {
    fn encode<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError>;
    fn decode<R: Read + ?Sized>(rdr: &mut R) -> Result<Self, SceneIoError>;
}

impl Streamable for u8 {
    fn encode<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError> {
        Ok(wtr.write_u8(*self)?)
    }

    fn decode<R: Read + ?Sized>(rdr: &mut R) -> Result<u8, SceneIoError> {
        Ok(rdr.read_u8()?)
    }
}

impl Streamable for u16 {
    fn encode<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError> {
        Ok(wtr.write_u16::<LittleEndian>(*self)?)
    }

    fn decode<R: Read + ?Sized>(rdr: &mut R) -> Result<u16, SceneIoError> {
        Ok(rdr.read_u16::<LittleEndian>()?)
    }
}

impl Streamable for u32 {
    fn encode<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError> {
        Ok(wtr.write_u32::<LittleEndian>(*self)?)
    }

    fn decode<R: Read + ?Sized>(rdr: &mut R) -> Result<u32, SceneIoError> {
        Ok(rdr.read_u32::<LittleEndian>()?)
    }
}

impl Streamable for f32 {
    fn encode<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError> {
        Ok(wtr.write_f32::<LittleEndian>(*self)?)
    }

    fn decode<R: Read + ?Sized>(rdr: &mut R) -> Result<f32, SceneIoError> {
        Ok(rdr.read_f32::<LittleEndian>()?)
    }
}

impl<T: Streamable, const N: usize> Streamable for [T; N] {
    fn encode<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError> {
        for element in self {
            element.encode(wtr)?;
        }
        Ok(())
    }

    fn decode<R: Read + ?Sized>(rdr: &mut R) -> Result<[T; N], SceneIoError> {
        let mut list = Vec::with_capacity(N);
        for _ in 0..N {
            list.push(T::decode(rdr)?);
        }
        list.try_into()
            .map_err(|_| SceneIoError::FormatError {
                reason: "array length mismatch",
            })
    }
}

/// Collections carry a u32 element count prefix.
impl<T: Streamable> Streamable for Vec<T> {
    fn encode<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError> {
        let len = u32::try_from(self.len()).map_err(|_| SceneIoError::FormatError {
            reason: "collection exceeds the 32-bit length prefix",
        })?;
        wtr.write_u32::<LittleEndian>(len)?;
        for element in self {
            element.encode(wtr)?;
        }
        Ok(())
    }

    fn decode<R: Read + ?Sized>(rdr: &mut R) -> Result<Vec<T>, SceneIoError> {
        let len = rdr.read_u32::<LittleEndian>()? as usize;
        let mut list = Vec::with_capacity(len.min(0x10000));
        for _ in 0..len {
            list.push(T::decode(rdr)?);
        }
        Ok(list)
    }
}

/// Strings carry a u16 byte-length prefix followed by UTF-8 bytes. Names and
/// type names may contain arbitrary UTF-8 (including NUL), which rules out
/// the C-string framing other formats use.
impl Streamable for String {
    fn encode<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError> {
        let len = u16::try_from(self.len()).map_err(|_| SceneIoError::FormatError {
            reason: "string exceeds the 16-bit length prefix",
        })?;
        wtr.write_u16::<LittleEndian>(len)?;
        wtr.write_all(self.as_bytes())?;
        Ok(())
    }

    fn decode<R: Read + ?Sized>(rdr: &mut R) -> Result<String, SceneIoError> {
        let len = rdr.read_u16::<LittleEndian>()? as usize;
        let mut buf = vec![0; len];
        rdr.read_exact(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl Streamable for BoundingVolume {
    fn encode<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<(), SceneIoError> {
        match self {
            BoundingVolume::Sphere { center, radius } => {
                wtr.write_u8(0)?;
                center.encode(wtr)?;
                radius.encode(wtr)?;
            }
            BoundingVolume::Aabb { min, max } => {
                wtr.write_u8(1)?;
                min.encode(wtr)?;
                max.encode(wtr)?;
            }
        }
        Ok(())
    }

    fn decode<R: Read + ?Sized>(rdr: &mut R) -> Result<BoundingVolume, SceneIoError> {
        match rdr.read_u8()? {
            0 => Ok(BoundingVolume::Sphere {
                center: Streamable::decode(rdr)?,
                radius: Streamable::decode(rdr)?,
            }),
            1 => Ok(BoundingVolume::Aabb {
                min: Streamable::decode(rdr)?,
                max: Streamable::decode(rdr)?,
            }),
            _ => Err(SceneIoError::FormatError {
                reason: "unrecognized bounding volume discriminant",
            }),
        }
    }
}

/// Opaque sections (custom subtype payloads, user data) carry a u32 byte
/// length so readers that do not understand the content can still skip it.
pub fn write_blob<W: Write + ?Sized>(wtr: &mut W, bytes: &[u8]) -> Result<(), SceneIoError> {
    let len = u32::try_from(bytes.len()).map_err(|_| SceneIoError::FormatError {
        reason: "blob exceeds the 32-bit length prefix",
    })?;
    wtr.write_u32::<LittleEndian>(len)?;
    wtr.write_all(bytes)?;
    Ok(())
}

pub fn read_blob<R: Read + ?Sized>(rdr: &mut R) -> Result<Vec<u8>, SceneIoError> {
    let len = rdr.read_u32::<LittleEndian>()?;
    let mut buf = vec![0; len as usize];
    rdr.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn skip_blob<R: Read + ?Sized>(rdr: &mut R) -> Result<u64, SceneIoError> {
    let len = u64::from(rdr.read_u32::<LittleEndian>()?);
    let skipped = std::io::copy(&mut (&mut *rdr).take(len), &mut std::io::sink())?;
    if skipped != len {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    Ok(skipped)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::common::types::Vector3;

    #[test]
    fn string_round_trip() -> Result<(), anyhow::Error> {
        let mut buf = Vec::new();
        "ambient occlusion\0probe".to_string().encode(&mut buf)?;
        let decoded = String::decode(&mut Cursor::new(&buf))?;
        assert_eq!(decoded, "ambient occlusion\0probe");
        Ok(())
    }

    #[test]
    fn blob_round_trip_and_skip() -> Result<(), anyhow::Error> {
        let mut buf = Vec::new();
        write_blob(&mut buf, &[7u8; 300])?;
        write_blob(&mut buf, b"tail")?;

        let mut rdr = Cursor::new(&buf);
        assert_eq!(skip_blob(&mut rdr)?, 300);
        assert_eq!(read_blob(&mut rdr)?, b"tail");
        Ok(())
    }

    #[test]
    fn truncated_blob_is_an_io_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&100u32.to_le_bytes());
        buf.extend_from_slice(&[1, 2, 3]);

        let result = read_blob(&mut Cursor::new(&buf));
        assert!(matches!(result, Err(SceneIoError::IOError(_))));
    }

    #[test]
    fn bounding_volume_round_trip() -> Result<(), anyhow::Error> {
        let volume = BoundingVolume::Aabb {
            min: Vector3 { x: -1.0, y: -2.0, z: -3.0 },
            max: Vector3 { x: 1.0, y: 2.0, z: 3.0 },
        };

        let mut buf = Vec::new();
        volume.encode(&mut buf)?;
        let decoded = BoundingVolume::decode(&mut Cursor::new(&buf))?;
        assert_eq!(decoded, volume);
        Ok(())
    }

    #[test]
    fn bad_volume_discriminant_is_a_format_error() {
        let result = BoundingVolume::decode(&mut Cursor::new(&[9u8]));
        assert!(matches!(result, Err(SceneIoError::FormatError { .. })));
    }
}
