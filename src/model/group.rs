//! Named groupings over a header's flat record arrays.
//!
//! Groups do not own records. On disk a group stores an inclusive `[start, end]` pair of `u16`
//! indices into the flat array of its family, and in memory it holds the equivalent
//! [`RecordRange`] into the header's arena.

use std::io::{Seek, Write};
use std::ops::Range;

use crate::ReadSeek;
use crate::err::{DeserializationResult, RecordFamily, SerializationResult};
use crate::string_table::{StringTable, StringTableWriter};
use crate::utils::{ReadExt, WriteExt};

/// Inclusive on-disk pair written for a group that owns nothing. `start > end` reads back empty.
pub const EMPTY_RANGE_ON_DISK: (u16, u16) = (1, 0);

/// Half-open range into a header's record arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordRange {
    start: usize,
    len: usize,
}

impl RecordRange {
    pub const EMPTY: RecordRange = RecordRange { start: 0, len: 0 };

    pub fn new(start: usize, len: usize) -> Self {
        RecordRange { start, len }
    }

    /// Applies an on-disk inclusive pair to an arena of `available` records.
    /// Returns `None` when the pair is reversed or runs past the arena.
    pub fn from_inclusive(start: u16, end: u16, available: usize) -> Option<Self> {
        let (start, end) = (usize::from(start), usize::from(end));

        if start > end || end >= available {
            return None;
        }

        Some(RecordRange::new(start, end - start + 1))
    }

    /// The on-disk inclusive pair, or `None` if the range cannot be expressed in `u16`.
    pub fn to_inclusive(self) -> Option<(u16, u16)> {
        if self.is_empty() {
            return Some(EMPTY_RANGE_ON_DISK);
        }

        let start = u16::try_from(self.start).ok()?;
        let end = u16::try_from(self.end() - 1).ok()?;
        Some((start, end))
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Behaviour shared by resource groups and action groups.
pub trait RecordGroup: Sized {
    /// Which arena the group indexes.
    const FAMILY: RecordFamily;
    /// Number of reserved words between the name and the range on disk.
    const RESERVED_WORDS: usize;
    /// Prefix of the synthesized keys a decoded header uses for these groups.
    const KEY_PREFIX: &'static str;

    fn from_parts(name: String, range: RecordRange) -> Self;
    fn name(&self) -> &str;
    fn range(&self) -> RecordRange;

    /// Key a decoded header stores the `i`th group under.
    fn synthesized_key(i: usize) -> String {
        format!("{}{}", Self::KEY_PREFIX, i)
    }

    /// On-disk size of one entry.
    fn entry_size() -> u64 {
        4 + 4 * Self::RESERVED_WORDS as u64 + 4
    }
}

/// Owns a contiguous run of the header's parameter records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    pub name: String,
    pub range: RecordRange,
}

/// Owns a contiguous run of the header's trigger records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGroup {
    pub name: String,
    pub range: RecordRange,
}

impl RecordGroup for ResourceGroup {
    const FAMILY: RecordFamily = RecordFamily::Parameter;
    const RESERVED_WORDS: usize = 3;
    const KEY_PREFIX: &'static str = "Resource";

    fn from_parts(name: String, range: RecordRange) -> Self {
        ResourceGroup { name, range }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn range(&self) -> RecordRange {
        self.range
    }
}

impl RecordGroup for ActionGroup {
    const FAMILY: RecordFamily = RecordFamily::Trigger;
    const RESERVED_WORDS: usize = 1;
    const KEY_PREFIX: &'static str = "Action";

    fn from_parts(name: String, range: RecordRange) -> Self {
        ActionGroup { name, range }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn range(&self) -> RecordRange {
        self.range
    }
}

/// A group entry as stored, before its range has been checked against the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawGroupEntry {
    pub name: String,
    pub start: u16,
    pub end: u16,
}

impl RawGroupEntry {
    pub(crate) fn from_stream<G: RecordGroup, T: ReadSeek>(
        stream: &mut T,
        strings: &StringTable,
    ) -> DeserializationResult<Self> {
        let name = strings.read_name(stream, "group.name")?;
        for _ in 0..G::RESERVED_WORDS {
            stream.try_u32_named("group.reserved")?;
        }
        let start = stream.try_u16_named("group.start")?;
        let end = stream.try_u16_named("group.end")?;

        Ok(RawGroupEntry { name, start, end })
    }

    pub(crate) fn write_to<G: RecordGroup, W: Write + Seek>(
        &self,
        stream: &mut W,
        strings: &mut StringTableWriter,
    ) -> SerializationResult<()> {
        strings.reserve(stream, &self.name)?;
        for _ in 0..G::RESERVED_WORDS {
            stream.put_u32(0)?;
        }
        stream.put_u16(self.start)?;
        stream.put_u16(self.end)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding::all::WINDOWS_31J;
    use std::io::Cursor;

    #[test]
    fn test_inclusive_ranges() {
        assert_eq!(
            RecordRange::from_inclusive(2, 4, 5),
            Some(RecordRange::new(2, 3))
        );
        assert_eq!(
            RecordRange::from_inclusive(3, 3, 5),
            Some(RecordRange::new(3, 1))
        );
        assert_eq!(RecordRange::from_inclusive(4, 2, 5), None);
        assert_eq!(RecordRange::from_inclusive(2, 5, 5), None);
        assert_eq!(RecordRange::from_inclusive(0, 0, 0), None);
    }

    #[test]
    fn test_to_inclusive() {
        assert_eq!(RecordRange::new(2, 3).to_inclusive(), Some((2, 4)));
        assert_eq!(RecordRange::new(7, 1).to_inclusive(), Some((7, 7)));
        assert_eq!(RecordRange::EMPTY.to_inclusive(), Some(EMPTY_RANGE_ON_DISK));
        assert_eq!(RecordRange::new(65535, 2).to_inclusive(), None);
    }

    #[test]
    fn test_entry_sizes() {
        assert_eq!(ResourceGroup::entry_size(), 20);
        assert_eq!(ActionGroup::entry_size(), 12);
        assert_eq!(ResourceGroup::synthesized_key(3), "Resource3");
        assert_eq!(ActionGroup::synthesized_key(0), "Action0");
    }

    #[test]
    fn test_action_entry_reads_back() {
        let entry = RawGroupEntry {
            name: "attack".to_owned(),
            start: 4,
            end: 9,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut strings = StringTableWriter::new();
        entry
            .write_to::<ActionGroup, _>(&mut cursor, &mut strings)
            .unwrap();
        assert_eq!(cursor.position(), ActionGroup::entry_size());

        let flushed = strings.flush(&mut cursor, WINDOWS_31J).unwrap();
        cursor.set_position(0);

        let table = StringTable::new(flushed.base, WINDOWS_31J);
        let read = RawGroupEntry::from_stream::<ActionGroup, _>(&mut cursor, &table).unwrap();

        assert_eq!(read, entry);
    }
}
