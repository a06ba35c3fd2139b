use std::io::SeekFrom;

use byteorder::{BigEndian, ReadBytesExt};
use encoding::{DecoderTrap, Encoding, EncodingRef};
use log::trace;

use crate::ReadSeek;
use crate::err::{DeserializationError, DeserializationResult, WrappedIoError};
use crate::utils::SeekGuard;

/// Typed, big-endian reads which attach the field name and a hexdump of the surrounding bytes to
/// every failure.
pub(crate) trait ReadExt: ReadSeek + Sized {
    #[inline]
    fn try_seek_abs_named(
        &mut self,
        offset: u64,
        name: &'static str,
    ) -> DeserializationResult<u64> {
        match self.seek(SeekFrom::Start(offset)) {
            Ok(v) => Ok(v),
            Err(e) => Err(DeserializationError::FailedToSeek {
                what: name,
                offset,
                source: WrappedIoError::capture_hexdump(e, self),
            }),
        }
    }

    /// Relocates the stream to `offset` until the returned guard is dropped.
    #[inline]
    fn temporary_seek(
        &mut self,
        offset: u64,
        name: &'static str,
    ) -> DeserializationResult<SeekGuard<'_, Self>> {
        SeekGuard::new(self, offset).map_err(|e| DeserializationError::FailedToSeek {
            what: name,
            offset,
            source: WrappedIoError::at_offset(e, offset),
        })
    }

    #[inline]
    fn try_u16_named(&mut self, name: &'static str) -> DeserializationResult<u16> {
        self.read_u16::<BigEndian>()
            .map_err(|e| DeserializationError::FailedToReadToken {
                t: "u16",
                token_name: name,
                source: WrappedIoError::capture_hexdump(e, self),
            })
    }

    #[inline]
    fn try_i32_named(&mut self, name: &'static str) -> DeserializationResult<i32> {
        self.read_i32::<BigEndian>()
            .map_err(|e| DeserializationError::FailedToReadToken {
                t: "i32",
                token_name: name,
                source: WrappedIoError::capture_hexdump(e, self),
            })
    }

    #[inline]
    fn try_u32_named(&mut self, name: &'static str) -> DeserializationResult<u32> {
        self.read_u32::<BigEndian>()
            .map_err(|e| DeserializationError::FailedToReadToken {
                t: "u32",
                token_name: name,
                source: WrappedIoError::capture_hexdump(e, self),
            })
    }

    #[inline]
    fn try_f32_named(&mut self, name: &'static str) -> DeserializationResult<f32> {
        self.read_f32::<BigEndian>()
            .map_err(|e| DeserializationError::FailedToReadToken {
                t: "f32",
                token_name: name,
                source: WrappedIoError::capture_hexdump(e, self),
            })
    }

    fn try_u16_array_named<const N: usize>(
        &mut self,
        name: &'static str,
    ) -> DeserializationResult<[u16; N]> {
        let mut out = [0_u16; N];
        for v in out.iter_mut() {
            *v = self.try_u16_named(name)?;
        }
        Ok(out)
    }

    fn try_i32_array_named<const N: usize>(
        &mut self,
        name: &'static str,
    ) -> DeserializationResult<[i32; N]> {
        let mut out = [0_i32; N];
        for v in out.iter_mut() {
            *v = self.try_i32_named(name)?;
        }
        Ok(out)
    }

    fn try_f32_array_named<const N: usize>(
        &mut self,
        name: &'static str,
    ) -> DeserializationResult<[f32; N]> {
        let mut out = [0_f32; N];
        for v in out.iter_mut() {
            *v = self.try_f32_named(name)?;
        }
        Ok(out)
    }

    /// Reads 4 bytes and checks them against `expected`.
    fn try_signature(&mut self, expected: &[u8; 4]) -> DeserializationResult<()> {
        let offset = self.tell()?;
        let mut found = [0_u8; 4];
        self.read_exact(&mut found)
            .map_err(|e| DeserializationError::FailedToReadToken {
                t: "[u8; 4]",
                token_name: "signature",
                source: WrappedIoError::capture_hexdump(e, self),
            })?;

        if &found != expected {
            return Err(DeserializationError::InvalidSignature {
                offset,
                expected: *expected,
                found,
            });
        }

        Ok(())
    }

    /// Reads bytes up to (and consuming) a NUL terminator, and decodes them with `codec`.
    fn read_zero_terminated_string(&mut self, codec: EncodingRef) -> DeserializationResult<String> {
        let offset = self.tell()?;
        let mut bytes = Vec::new();

        loop {
            match self.read_u8() {
                Ok(0) => break,
                Ok(b) => bytes.push(b),
                Err(_) => {
                    return Err(DeserializationError::UnterminatedString {
                        encoding: codec.name(),
                        offset,
                    });
                }
            }
        }

        trace!(
            "Offset `0x{offset:08x} ({offset})` reading a null terminated string of {len} bytes",
            offset = offset,
            len = bytes.len()
        );

        codec
            .decode(&bytes, DecoderTrap::Strict)
            .map_err(|m| DeserializationError::FailedToDecodeString {
                encoding: codec.name(),
                message: m.into_owned(),
                offset,
            })
    }
}

impl<T: ReadSeek> ReadExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding::all::{UTF_8, WINDOWS_31J};
    use std::io::Cursor;

    #[test]
    fn test_reads_big_endian_fields() {
        let mut cursor = Cursor::new(vec![
            0x00, 0x00, 0x00, 0x09, 0xff, 0xff, 0xff, 0xfe, 0x3f, 0x80, 0x00, 0x00, 0x00, 0x02,
        ]);

        assert_eq!(cursor.try_u32_named("tag").unwrap(), 9);
        assert_eq!(cursor.try_i32_named("callback").unwrap(), -2);
        assert_eq!(cursor.try_f32_named("scale").unwrap(), 1.0);
        assert_eq!(cursor.try_u16_named("start").unwrap(), 2);
    }

    #[test]
    fn test_truncated_read_reports_field() {
        let mut cursor = Cursor::new(vec![0x00, 0x01]);

        match cursor.try_u32_named("header count") {
            Err(DeserializationError::FailedToReadToken { token_name, t, .. }) => {
                assert_eq!(token_name, "header count");
                assert_eq!(t, "u32");
            }
            other => panic!("expected a read failure, got {:?}", other),
        }
    }

    #[test]
    fn test_signature_mismatch() {
        let mut cursor = Cursor::new(b"EFLK".to_vec());

        match cursor.try_signature(b"eflk") {
            Err(DeserializationError::InvalidSignature { offset, found, .. }) => {
                assert_eq!(offset, 0);
                assert_eq!(&found, b"EFLK");
            }
            other => panic!("expected a signature error, got {:?}", other),
        }
    }

    #[test]
    fn test_reads_shift_jis_string() {
        // "エフェクト" followed by a second string
        let mut bytes = vec![0x83, 0x47, 0x83, 0x74, 0x83, 0x46, 0x83, 0x4e, 0x83, 0x67, 0x00];
        bytes.extend_from_slice(b"bone\x00");
        let mut cursor = Cursor::new(bytes);

        assert_eq!(
            cursor.read_zero_terminated_string(WINDOWS_31J).unwrap(),
            "エフェクト"
        );
        assert_eq!(cursor.read_zero_terminated_string(UTF_8).unwrap(), "bone");
    }

    #[test]
    fn test_unterminated_string() {
        let mut cursor = Cursor::new(b"abc".to_vec());

        assert!(matches!(
            cursor.read_zero_terminated_string(WINDOWS_31J),
            Err(DeserializationError::UnterminatedString { offset: 0, .. })
        ));
    }
}
