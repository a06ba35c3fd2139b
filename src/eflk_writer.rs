use crate::eflk_file_header::write_directory;
use crate::eflk_header::{HEADER_ALIGNMENT, PADDING_BYTE, write_header};
use crate::err::{Result, SerializationResult};
use crate::model::Container;
use crate::string_table::StringTableWriter;
use crate::utils::WriteExt;

use encoding::all::WINDOWS_31J;
use encoding::{Encoding, EncodingRef};
use log::{debug, trace};

use std::fmt::{self, Debug};
use std::io::{Cursor, Seek, Write};

#[derive(Clone)]
pub struct WriterSettings {
    /// Codec used to encode every string table in the container.
    ansi_codec: EncodingRef,
    /// Write each record's stored `index` instead of its position in the flat array.
    preserve_record_indices: bool,
}

impl Debug for WriterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSettings")
            .field("ansi_codec", &self.ansi_codec.name())
            .field("preserve_record_indices", &self.preserve_record_indices)
            .finish()
    }
}

impl PartialEq for WriterSettings {
    fn eq(&self, other: &WriterSettings) -> bool {
        self.ansi_codec.name() == other.ansi_codec.name()
            && self.preserve_record_indices == other.preserve_record_indices
    }
}

impl Default for WriterSettings {
    fn default() -> Self {
        WriterSettings {
            ansi_codec: WINDOWS_31J,
            preserve_record_indices: false,
        }
    }
}

impl WriterSettings {
    pub fn new() -> Self {
        WriterSettings::default()
    }

    pub fn ansi_codec(mut self, ansi_codec: EncodingRef) -> Self {
        self.ansi_codec = ansi_codec;
        self
    }

    pub fn preserve_record_indices(mut self, preserve: bool) -> Self {
        self.preserve_record_indices = preserve;
        self
    }

    pub fn get_ansi_codec(&self) -> EncodingRef {
        self.ansi_codec
    }

    pub fn should_preserve_record_indices(&self) -> bool {
        self.preserve_record_indices
    }
}

#[derive(Debug, Default)]
pub struct EflkWriter {
    config: WriterSettings,
}

impl EflkWriter {
    pub fn new(configuration: WriterSettings) -> Self {
        EflkWriter {
            config: configuration,
        }
    }

    /// Encodes `container` into a fresh buffer.
    pub fn to_bytes(&self, container: &Container) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(container, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Encodes `container` starting at the current position of `stream`.
    ///
    /// Offsets in the output are absolute, so the stream should be positioned at 0. On failure the
    /// stream contents are unspecified.
    pub fn write_to<W: Write + Seek>(&self, container: &Container, stream: &mut W) -> Result<()> {
        write_container(stream, container, &self.config)?;
        Ok(())
    }
}

fn write_container<W: Write + Seek>(
    stream: &mut W,
    container: &Container,
    settings: &WriterSettings,
) -> SerializationResult<()> {
    let mut names = StringTableWriter::new();
    let slots = write_directory(
        stream,
        container.version,
        container.headers().keys(),
        &mut names,
    )?;
    stream.align_to(HEADER_ALIGNMENT, PADDING_BYTE)?;

    for ((name, header), &slot) in container.headers().iter().zip(&slots.data_offsets) {
        let data_offset = stream.position_u32("header body")?;
        let written = write_header(stream, header, settings)?;
        stream.patch_u32(slot, data_offset)?;

        trace!("Header `{}` at 0x{:08x} ({} bytes)", name, data_offset, written);
    }

    let table_offset = stream.position_u32("container string table")?;
    let table = names.flush(stream, settings.get_ansi_codec())?;
    stream.patch_u32(slots.string_table_offset, table_offset)?;

    for (name, &slot) in container.headers().keys().zip(&slots.names) {
        if let Some(relative) = table.offset_of(slot) {
            trace!("Header name `{}` at table + {}", name, relative);
        }
    }

    debug!(
        "Wrote container version {} with {} headers",
        container.version,
        container.headers().len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Header;
    use encoding::all::UTF_8;

    #[test]
    fn test_empty_container_layout() {
        let container = Container::new(3);
        let bytes = EflkWriter::default().to_bytes(&container).unwrap();

        // Fixed part is already aligned, and the outer table is empty.
        assert_eq!(
            bytes,
            vec![b'e', b'f', b'l', b'k', 0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 16]
        );
    }

    #[test]
    fn test_header_bodies_start_aligned() {
        let mut container = Container::new(1);
        container.insert_header(Header::new("a"));

        let bytes = EflkWriter::default().to_bytes(&container).unwrap();

        // 16 byte fixed part, one 8 byte directory entry, then 0xFF up to 32.
        assert_eq!(&bytes[24..32], &[0xFF; 8]);
        assert_eq!(&bytes[16..20], &32_u32.to_be_bytes());
    }

    #[test]
    fn test_settings_builder() {
        let settings = WriterSettings::new()
            .ansi_codec(UTF_8)
            .preserve_record_indices(true);

        assert_eq!(settings.get_ansi_codec().name(), "utf-8");
        assert!(settings.should_preserve_record_indices());
        assert_ne!(settings, WriterSettings::default());
    }
}
