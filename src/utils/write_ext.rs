use std::io::{Seek, Write};

use byteorder::{BigEndian, WriteBytesExt};
use encoding::{EncoderTrap, Encoding, EncodingRef};

use crate::err::{SerializationError, SerializationResult};
use crate::utils::SeekGuard;

/// Big-endian writes, signatures, alignment and backpatching over a seekable sink.
pub(crate) trait WriteExt: Write + Seek + Sized {
    #[inline]
    fn write_position(&mut self) -> SerializationResult<u64> {
        Ok(self.stream_position()?)
    }

    /// Current position as an on-disk `u32` offset.
    fn position_u32(&mut self, what: &'static str) -> SerializationResult<u32> {
        let position = self.write_position()?;
        u32::try_from(position).map_err(|_| SerializationError::OffsetOverflow { what, position })
    }

    #[inline]
    fn put_u16(&mut self, value: u16) -> SerializationResult<()> {
        Ok(self.write_u16::<BigEndian>(value)?)
    }

    #[inline]
    fn put_u32(&mut self, value: u32) -> SerializationResult<()> {
        Ok(self.write_u32::<BigEndian>(value)?)
    }

    #[inline]
    fn put_i32(&mut self, value: i32) -> SerializationResult<()> {
        Ok(self.write_i32::<BigEndian>(value)?)
    }

    #[inline]
    fn put_f32(&mut self, value: f32) -> SerializationResult<()> {
        Ok(self.write_f32::<BigEndian>(value)?)
    }

    fn put_u16_array(&mut self, values: &[u16]) -> SerializationResult<()> {
        values.iter().try_for_each(|&v| self.put_u16(v))
    }

    fn put_i32_array(&mut self, values: &[i32]) -> SerializationResult<()> {
        values.iter().try_for_each(|&v| self.put_i32(v))
    }

    fn put_f32_array(&mut self, values: &[f32]) -> SerializationResult<()> {
        values.iter().try_for_each(|&v| self.put_f32(v))
    }

    fn write_signature(&mut self, signature: &[u8; 4]) -> SerializationResult<()> {
        Ok(self.write_all(signature)?)
    }

    /// Encodes `value` with `codec` and writes it followed by a NUL terminator.
    fn write_zero_terminated_string(
        &mut self,
        value: &str,
        codec: EncodingRef,
    ) -> SerializationResult<()> {
        if value.contains('\0') {
            return Err(SerializationError::InteriorNul(value.to_owned()));
        }

        let bytes = codec.encode(value, EncoderTrap::Strict).map_err(|m| {
            SerializationError::UnencodableString {
                value: value.to_owned(),
                encoding: codec.name(),
                message: m.into_owned(),
            }
        })?;

        self.write_all(&bytes)?;
        self.write_u8(0)?;
        Ok(())
    }

    /// Pads the stream with `fill` up to the next multiple of `alignment`.
    /// Returns the number of bytes written.
    fn align_to(&mut self, alignment: u64, fill: u8) -> SerializationResult<u64> {
        let position = self.write_position()?;
        let padding = (alignment - position % alignment) % alignment;

        for _ in 0..padding {
            self.write_u8(fill)?;
        }

        Ok(padding)
    }

    /// Overwrites the `u32` at `position`, leaving the stream where it was.
    fn patch_u32(&mut self, position: u64, value: u32) -> SerializationResult<()> {
        let mut guard = SeekGuard::new(self, position)?;
        guard.put_u32(value)
    }
}

impl<T: Write + Seek> WriteExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding::all::WINDOWS_31J;
    use std::io::Cursor;

    #[test]
    fn test_align_to_pads_with_fill_byte() {
        let mut cursor = Cursor::new(Vec::new());
        cursor.put_u32(1).unwrap();
        cursor.put_u16(2).unwrap();

        assert_eq!(cursor.align_to(16, 0xFF).unwrap(), 10);
        assert_eq!(cursor.align_to(16, 0xFF).unwrap(), 0);

        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), 16);
        assert!(bytes[6..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_patch_keeps_position() {
        let mut cursor = Cursor::new(Vec::new());
        cursor.put_u32(u32::MAX).unwrap();
        cursor.put_u32(7).unwrap();

        cursor.patch_u32(0, 0x0102_0304).unwrap();

        assert_eq!(cursor.position(), 8);
        assert_eq!(cursor.into_inner(), vec![1, 2, 3, 4, 0, 0, 0, 7]);
    }

    #[test]
    fn test_writes_shift_jis_string() {
        let mut cursor = Cursor::new(Vec::new());
        cursor
            .write_zero_terminated_string("エフェクト", WINDOWS_31J)
            .unwrap();

        assert_eq!(
            cursor.into_inner(),
            vec![0x83, 0x47, 0x83, 0x74, 0x83, 0x46, 0x83, 0x4e, 0x83, 0x67, 0x00]
        );
    }

    #[test]
    fn test_rejects_unencodable_string() {
        let mut cursor = Cursor::new(Vec::new());

        assert!(matches!(
            cursor.write_zero_terminated_string("🎆", WINDOWS_31J),
            Err(SerializationError::UnencodableString { .. })
        ));
    }
}
