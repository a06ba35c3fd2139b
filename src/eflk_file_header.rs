use std::io::{Seek, Write};

use crate::ReadSeek;
use crate::err::{DeserializationResult, SerializationResult};
use crate::string_table::{NameSlot, PLACEHOLDER_OFFSET, StringTableWriter};
use crate::utils::{ReadExt, WriteExt};

pub const EFLK_SIGNATURE: &[u8; 4] = b"eflk";
/// Signature, version, header count and string table offset.
pub const FILE_HEADER_FIXED_SIZE: u64 = 16;
pub const DIRECTORY_ENTRY_SIZE: u64 = 8;

/// The fixed part of a container and its header directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EflkFileHeader {
    pub version: u32,
    /// Absolute offset of the table holding header names.
    pub string_table_offset: u32,
    pub entries: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Absolute offset of the header body.
    pub data_offset: u32,
    /// Relative to the outer string table.
    pub name_offset: u32,
}

impl EflkFileHeader {
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<EflkFileHeader> {
        stream.try_signature(EFLK_SIGNATURE)?;

        let version = stream.try_u32_named("container.version")?;
        let header_count = stream.try_u32_named("container.header_count")?;
        let string_table_offset = stream.try_u32_named("container.string_table_offset")?;

        let mut entries = Vec::new();
        for _ in 0..header_count {
            entries.push(DirectoryEntry {
                data_offset: stream.try_u32_named("directory.data_offset")?,
                name_offset: stream.try_u32_named("directory.name_offset")?,
            });
        }

        Ok(EflkFileHeader {
            version,
            string_table_offset,
            entries,
        })
    }
}

/// Positions left to fill in once the header bodies and names have been written.
#[derive(Debug)]
pub(crate) struct DirectorySlots {
    pub string_table_offset: u64,
    pub data_offsets: Vec<u64>,
    pub names: Vec<NameSlot>,
}

/// Writes the fixed part and a directory of placeholders for `names`.
/// Name offsets are registered with `strings` and resolve when it is flushed.
pub(crate) fn write_directory<'a, W: Write + Seek>(
    stream: &mut W,
    version: u32,
    names: impl ExactSizeIterator<Item = &'a str>,
    strings: &mut StringTableWriter,
) -> SerializationResult<DirectorySlots> {
    stream.write_signature(EFLK_SIGNATURE)?;
    stream.put_u32(version)?;
    stream.put_u32(u32::try_from(names.len()).unwrap_or(u32::MAX))?;

    let string_table_offset = stream.write_position()?;
    stream.put_u32(PLACEHOLDER_OFFSET)?;

    let mut data_offsets = Vec::with_capacity(names.len());
    let mut name_slots = Vec::with_capacity(names.len());

    for name in names {
        data_offsets.push(stream.write_position()?);
        stream.put_u32(PLACEHOLDER_OFFSET)?;
        name_slots.push(strings.reserve(stream, name)?);
    }

    Ok(DirectorySlots {
        string_table_offset,
        data_offsets,
        names: name_slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::DeserializationError;
    use std::io::Cursor;

    #[test]
    fn test_parses_directory() {
        let mut data = Vec::new();
        data.extend_from_slice(b"eflk");
        data.extend_from_slice(&7_u32.to_be_bytes());
        data.extend_from_slice(&2_u32.to_be_bytes());
        data.extend_from_slice(&0x60_u32.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 0x20, 0, 0, 0, 0]);
        data.extend_from_slice(&[0, 0, 0, 0x40, 0, 0, 0, 6]);

        let header = EflkFileHeader::from_stream(&mut Cursor::new(data)).unwrap();

        assert_eq!(
            header,
            EflkFileHeader {
                version: 7,
                string_table_offset: 0x60,
                entries: vec![
                    DirectoryEntry {
                        data_offset: 0x20,
                        name_offset: 0,
                    },
                    DirectoryEntry {
                        data_offset: 0x40,
                        name_offset: 6,
                    },
                ],
            }
        );
    }

    #[test]
    fn test_rejects_bad_signature() {
        let mut cursor =
            Cursor::new(b"EFLK\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x00\x10".to_vec());

        assert!(matches!(
            EflkFileHeader::from_stream(&mut cursor),
            Err(DeserializationError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_directory_placeholders() {
        let mut cursor = Cursor::new(Vec::new());
        let mut strings = StringTableWriter::new();
        let slots = write_directory(&mut cursor, 1, ["a", "b"].into_iter(), &mut strings).unwrap();

        assert_eq!(cursor.position(), FILE_HEADER_FIXED_SIZE + 2 * DIRECTORY_ENTRY_SIZE);
        assert_eq!(slots.string_table_offset, 12);
        assert_eq!(slots.data_offsets, vec![16, 24]);
        assert_eq!(strings.len(), 2);
    }
}
