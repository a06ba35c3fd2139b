//! Codec for one header body: prologue, record arrays, groups and the header's own string table.

use std::io::{Seek, Write};

use encoding::EncodingRef;
use log::{debug, trace, warn};

use crate::ReadSeek;
use crate::eflk_parser::Diagnostics;
use crate::eflk_writer::WriterSettings;
use crate::err::{
    DeserializationError, DeserializationResult, RangeError, RecordFamily, SerializationError,
    SerializationResult, Warning,
};
use crate::model::group::RawGroupEntry;
use crate::model::{
    ActionGroup, CallbackTable, Header, ParameterRecord, RecordGroup, RecordRange, ResourceGroup,
    TriggerRecord,
};
use crate::ordered_map::OrderedMap;
use crate::string_table::{PLACEHOLDER_OFFSET, StringTable, StringTableWriter};
use crate::utils::{ReadExt, WriteExt};

pub const HEADER_PROLOGUE_SIZE: u64 = 28;
pub const FORMAT_TAG: u32 = 9;
pub const TRAILING_TAG: u32 = 4;
/// Header bodies are padded to this boundary with [`PADDING_BYTE`].
pub const HEADER_ALIGNMENT: u64 = 16;
pub const PADDING_BYTE: u8 = 0xFF;
/// Group ranges are `u16` indices, so an arena can address at most this many records.
pub const MAX_RECORDS_PER_FAMILY: usize = u16::MAX as usize + 1;

/// Offset of `string_table_offset` within the prologue.
const STRING_TABLE_OFFSET_FIELD: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderPrologue {
    pub format_tag: u32,
    pub parameter_count: u32,
    pub trigger_count: u32,
    pub resource_group_count: u32,
    pub action_group_count: u32,
    /// Relative to the start of the header.
    pub string_table_offset: u32,
    pub trailing_tag: u32,
}

impl HeaderPrologue {
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<HeaderPrologue> {
        Ok(HeaderPrologue {
            format_tag: stream.try_u32_named("prologue.format_tag")?,
            parameter_count: stream.try_u32_named("prologue.parameter_count")?,
            trigger_count: stream.try_u32_named("prologue.trigger_count")?,
            resource_group_count: stream.try_u32_named("prologue.resource_group_count")?,
            action_group_count: stream.try_u32_named("prologue.action_group_count")?,
            string_table_offset: stream.try_u32_named("prologue.string_table_offset")?,
            trailing_tag: stream.try_u32_named("prologue.trailing_tag")?,
        })
    }

    pub fn write_to<W: Write + Seek>(&self, stream: &mut W) -> SerializationResult<()> {
        stream.put_u32(self.format_tag)?;
        stream.put_u32(self.parameter_count)?;
        stream.put_u32(self.trigger_count)?;
        stream.put_u32(self.resource_group_count)?;
        stream.put_u32(self.action_group_count)?;
        stream.put_u32(self.string_table_offset)?;
        stream.put_u32(self.trailing_tag)?;
        Ok(())
    }

    /// Tags that differ from the values every known file carries.
    pub fn unexpected_values(&self, header: &str) -> Vec<Warning> {
        [
            ("format_tag", FORMAT_TAG, self.format_tag),
            ("trailing_tag", TRAILING_TAG, self.trailing_tag),
        ]
        .into_iter()
        .filter(|(_, expected, found)| expected != found)
        .map(|(field, expected, found)| Warning::UnexpectedPrologueValue {
            header: header.to_owned(),
            field,
            expected,
            found,
        })
        .collect()
    }
}

/// Decodes the header body starting at the current position.
pub(crate) fn read_header<T: ReadSeek>(
    stream: &mut T,
    name: String,
    codec: EncodingRef,
    diagnostics: &mut Diagnostics,
) -> DeserializationResult<Header> {
    let start = stream.tell()?;
    let prologue = HeaderPrologue::from_stream(stream)?;
    debug!("Header `{}` at 0x{:08x}: {:?}", name, start, prologue);

    for warning in prologue.unexpected_values(&name) {
        diagnostics.report(warning)?;
    }

    let table_base = start
        .checked_add(u64::from(prologue.string_table_offset))
        .ok_or(DeserializationError::OffsetOverflow {
            what: "header string table",
            base: start,
            relative: prologue.string_table_offset,
        })?;
    let strings = StringTable::new(table_base, codec);

    let mut parameters = Vec::new();
    for _ in 0..prologue.parameter_count {
        parameters.push(ParameterRecord::from_stream(stream, &strings)?);
    }
    for parameter in parameters.iter_mut() {
        parameter.callbacks = CallbackTable::from_stream(stream)?;
    }

    let raw_resource_groups = read_group_entries::<ResourceGroup, _>(
        stream,
        &strings,
        prologue.resource_group_count,
    )?;

    let mut triggers = Vec::new();
    for _ in 0..prologue.trigger_count {
        triggers.push(TriggerRecord::from_stream(stream, &strings)?);
    }

    let raw_action_groups =
        read_group_entries::<ActionGroup, _>(stream, &strings, prologue.action_group_count)?;

    let resource_groups =
        resolve_groups::<ResourceGroup>(&name, raw_resource_groups, parameters.len(), diagnostics)?;
    let action_groups =
        resolve_groups::<ActionGroup>(&name, raw_action_groups, triggers.len(), diagnostics)?;

    let header = Header::from_arenas(name, parameters, triggers, resource_groups, action_groups);

    // Records outside of every group are dropped on re-encode.
    for warning in header.validate() {
        diagnostics.report(warning)?;
    }

    Ok(header)
}

fn read_group_entries<G: RecordGroup, T: ReadSeek>(
    stream: &mut T,
    strings: &StringTable,
    count: u32,
) -> DeserializationResult<Vec<RawGroupEntry>> {
    let mut entries = Vec::new();
    for _ in 0..count {
        entries.push(RawGroupEntry::from_stream::<G, T>(stream, strings)?);
    }
    Ok(entries)
}

/// Applies each stored inclusive range to its arena. A range that does not fit is reported and
/// the group is kept with no records.
fn resolve_groups<G: RecordGroup>(
    header: &str,
    entries: Vec<RawGroupEntry>,
    available: usize,
    diagnostics: &mut Diagnostics,
) -> DeserializationResult<OrderedMap<G>> {
    let mut groups = OrderedMap::new();

    for (i, entry) in entries.into_iter().enumerate() {
        let key = G::synthesized_key(i);
        let range = match RecordRange::from_inclusive(entry.start, entry.end, available) {
            Some(range) => range,
            None => {
                diagnostics.report(RangeError {
                    header: header.to_owned(),
                    family: G::FAMILY,
                    group: key.clone(),
                    start: entry.start,
                    end: entry.end,
                    available,
                })?;
                RecordRange::EMPTY
            }
        };

        trace!("{} `{}` -> {:?}", key, entry.name, range);
        groups.insert(key, G::from_parts(entry.name, range));
    }

    Ok(groups)
}

/// Encodes `header` at the current position, which must already be aligned.
/// Returns the number of bytes written, padding included.
pub(crate) fn write_header<W: Write + Seek>(
    stream: &mut W,
    header: &Header,
    settings: &WriterSettings,
) -> SerializationResult<u64> {
    let start = stream.write_position()?;

    for warning in header.validate() {
        warn!("{}, only records owned by a group are written, in group order", warning);
    }

    let parameters = header.flattened_parameters();
    let triggers = header.flattened_triggers();
    check_record_count(header, RecordFamily::Parameter, parameters.records.len())?;
    check_record_count(header, RecordFamily::Trigger, triggers.records.len())?;

    let prologue = HeaderPrologue {
        format_tag: FORMAT_TAG,
        parameter_count: count_u32(parameters.records.len()),
        trigger_count: count_u32(triggers.records.len()),
        resource_group_count: count_u32(header.resource_groups().len()),
        action_group_count: count_u32(header.action_groups().len()),
        string_table_offset: PLACEHOLDER_OFFSET,
        trailing_tag: TRAILING_TAG,
    };
    prologue.write_to(stream)?;

    let mut strings = StringTableWriter::new();

    for (position, parameter) in parameters.records.iter().enumerate() {
        let index = record_index(header, position, parameter.index, settings);
        parameter.write_to(stream, &mut strings, index)?;
    }
    for parameter in &parameters.records {
        parameter.callbacks.write_to(stream)?;
    }

    write_group_entries(
        stream,
        &mut strings,
        header,
        header.resource_groups(),
        &parameters.ranges,
    )?;

    for (position, trigger) in triggers.records.iter().enumerate() {
        let index = record_index(header, position, trigger.index, settings);
        trigger.write_to(stream, &mut strings, index)?;
    }

    write_group_entries(
        stream,
        &mut strings,
        header,
        header.action_groups(),
        &triggers.ranges,
    )?;

    let table = strings.flush(stream, settings.get_ansi_codec())?;
    let relative = u32::try_from(table.base - start).map_err(|_| {
        SerializationError::OffsetOverflow {
            what: "header string table",
            position: table.base,
        }
    })?;
    stream.patch_u32(start + STRING_TABLE_OFFSET_FIELD, relative)?;

    stream.align_to(HEADER_ALIGNMENT, PADDING_BYTE)?;
    let end = stream.write_position()?;

    debug!(
        "Wrote header `{}`: {} parameters, {} triggers, {} distinct strings, {} bytes",
        header.name(),
        parameters.records.len(),
        triggers.records.len(),
        table.distinct,
        end - start
    );

    Ok(end - start)
}

fn write_group_entries<G: RecordGroup, W: Write + Seek>(
    stream: &mut W,
    strings: &mut StringTableWriter,
    header: &Header,
    groups: &OrderedMap<G>,
    ranges: &[RecordRange],
) -> SerializationResult<()> {
    for (group, range) in groups.values().zip(ranges) {
        let (start, end) = range
            .to_inclusive()
            .ok_or_else(|| SerializationError::TooManyRecords {
                header: header.name().to_owned(),
                family: G::FAMILY,
                count: range.end(),
                max: MAX_RECORDS_PER_FAMILY,
            })?;

        let entry = RawGroupEntry {
            name: group.name().to_owned(),
            start,
            end,
        };
        entry.write_to::<G, W>(stream, strings)?;
    }

    Ok(())
}

fn check_record_count(
    header: &Header,
    family: RecordFamily,
    count: usize,
) -> SerializationResult<()> {
    if count > MAX_RECORDS_PER_FAMILY {
        return Err(SerializationError::TooManyRecords {
            header: header.name().to_owned(),
            family,
            count,
            max: MAX_RECORDS_PER_FAMILY,
        });
    }
    Ok(())
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn record_index(header: &Header, position: usize, stored: u32, settings: &WriterSettings) -> u32 {
    let recomputed = position as u32;
    if stored != recomputed {
        debug!(
            "Header `{}`: record at position {} carries stored index {}",
            header.name(),
            position,
            stored
        );
    }

    if settings.should_preserve_record_indices() {
        stored
    } else {
        recomputed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupContents;
    use crate::model::parameter::{CALLBACK_TABLE_SIZE, PARAMETER_RECORD_SIZE};
    use encoding::all::WINDOWS_31J;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn sample_header() -> Header {
        let parameter = |index: u32, name: &str| ParameterRecord {
            index,
            name: name.to_owned(),
            bone_name: "Root".to_owned(),
            ..ParameterRecord::default()
        };
        let trigger = |index: u32, resource: &str, delay: u32| TriggerRecord {
            index,
            resource_name: resource.to_owned(),
            bone_name: "Root".to_owned(),
            delay,
            ..TriggerRecord::default()
        };

        let (header, _) = Header::from_groups(
            "slash",
            vec![
                GroupContents {
                    key: "Resource0".to_owned(),
                    name: "trail".to_owned(),
                    records: vec![parameter(0, "trail_a"), parameter(1, "trail_b")],
                },
                GroupContents {
                    key: "Resource1".to_owned(),
                    name: "spark".to_owned(),
                    records: vec![parameter(2, "spark")],
                },
            ],
            vec![GroupContents {
                key: "Action0".to_owned(),
                name: "swing".to_owned(),
                records: vec![trigger(0, "trail", 0), trigger(1, "spark", 6)],
            }],
        );
        header
    }

    #[test]
    fn test_header_body_is_aligned_and_padded() {
        let mut cursor = Cursor::new(Vec::new());
        let written =
            write_header(&mut cursor, &sample_header(), &WriterSettings::default()).unwrap();
        let bytes = cursor.into_inner();

        assert_eq!(written, bytes.len() as u64);
        assert_eq!(bytes.len() % 16, 0);

        let table_offset =
            u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]) as usize;
        let records_end = HEADER_PROLOGUE_SIZE
            + 3 * (PARAMETER_RECORD_SIZE + CALLBACK_TABLE_SIZE)
            + 2 * ResourceGroup::entry_size()
            + 2 * crate::model::trigger::TRIGGER_RECORD_SIZE
            + ActionGroup::entry_size();
        assert_eq!(table_offset as u64, records_end);

        // The table ends on a NUL, anything after it is padding.
        let last_nul = bytes.iter().rposition(|&b| b == 0).unwrap();
        assert!(bytes[last_nul + 1..].iter().all(|&b| b == PADDING_BYTE));
    }

    #[test]
    fn test_header_reads_back() {
        let header = sample_header();
        let mut cursor = Cursor::new(Vec::new());
        write_header(&mut cursor, &header, &WriterSettings::default()).unwrap();
        cursor.set_position(0);

        let mut diagnostics = Diagnostics::new(false);
        let read =
            read_header(&mut cursor, "slash".to_owned(), WINDOWS_31J, &mut diagnostics).unwrap();

        assert!(diagnostics.into_warnings().is_empty());
        assert_eq!(read, header);
    }

    #[test]
    fn test_unexpected_prologue_tags_are_reported() {
        let prologue = HeaderPrologue {
            format_tag: 8,
            parameter_count: 0,
            trigger_count: 0,
            resource_group_count: 0,
            action_group_count: 0,
            string_table_offset: 28,
            trailing_tag: TRAILING_TAG,
        };

        assert_eq!(
            prologue.unexpected_values("fx"),
            vec![Warning::UnexpectedPrologueValue {
                header: "fx".to_owned(),
                field: "format_tag",
                expected: FORMAT_TAG,
                found: 8,
            }]
        );
    }

    #[test]
    fn test_preserved_indices_are_written_verbatim() {
        let mut header = Header::new("fx");
        header.insert_resource_group(
            "Resource0",
            "only",
            vec![ParameterRecord {
                index: 41,
                ..ParameterRecord::default()
            }],
        );

        let mut recomputed = Cursor::new(Vec::new());
        write_header(&mut recomputed, &header, &WriterSettings::default()).unwrap();
        let mut preserved = Cursor::new(Vec::new());
        write_header(
            &mut preserved,
            &header,
            &WriterSettings::default().preserve_record_indices(true),
        )
        .unwrap();

        let index_at =
            |bytes: &[u8]| u32::from_be_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);
        assert_eq!(index_at(recomputed.get_ref()), 0);
        assert_eq!(index_at(preserved.get_ref()), 41);
    }
}
