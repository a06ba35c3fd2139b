//! The offset-addressed string tables of a container.
//!
//! Names are never stored inline. A record field holds a `u32` offset relative to the base of the
//! table which owns it (the outer table for header names, a per-header table for everything
//! else), and the table itself is a run of NUL-terminated strings.
//!
//! Writing is split in two phases. While records are serialized every name field gets a
//! placeholder and a [`NameSlot`]. Once the scope is complete [`StringTableWriter::flush`] writes
//! each distinct string once and backpatches every slot with the offset of its first occurrence.

use std::io::{Seek, Write};

use encoding::{Encoding, EncodingRef};
use hashbrown::HashMap;
use log::trace;

use crate::ReadSeek;
use crate::err::{
    DeserializationError, DeserializationResult, SerializationError, SerializationResult,
};
use crate::utils::{ReadExt, WriteExt};

/// Written in place of a name offset until the table is flushed.
pub const PLACEHOLDER_OFFSET: u32 = 0xFFFF_FFFF;

/// A read-side view of a string table rooted at an absolute `base` offset.
#[derive(Clone, Copy)]
pub struct StringTable {
    base: u64,
    codec: EncodingRef,
}

impl std::fmt::Debug for StringTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringTable")
            .field("base", &self.base)
            .field("codec", &self.codec.name())
            .finish()
    }
}

impl StringTable {
    pub fn new(base: u64, codec: EncodingRef) -> Self {
        StringTable { base, codec }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// Resolves a relative offset to its string. The stream position is left untouched.
    pub fn resolve<T: ReadSeek>(
        &self,
        stream: &mut T,
        relative: u32,
        what: &'static str,
    ) -> DeserializationResult<String> {
        let absolute = self.base.checked_add(u64::from(relative)).ok_or(
            DeserializationError::OffsetOverflow {
                what,
                base: self.base,
                relative,
            },
        )?;

        let mut guard = stream.temporary_seek(absolute, what)?;
        guard.read_zero_terminated_string(self.codec)
    }

    /// Reads a `u32` offset field at the current position and resolves it.
    pub fn read_name<T: ReadSeek>(
        &self,
        stream: &mut T,
        what: &'static str,
    ) -> DeserializationResult<String> {
        let relative = stream.try_u32_named(what)?;
        self.resolve(stream, relative, what)
    }
}

/// Handle for a name field that has been reserved but not yet resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSlot(usize);

#[derive(Debug)]
struct PendingName {
    position: u64,
    value: String,
}

/// Collects name fields for one scope, and writes the deduplicated table at the end of it.
#[derive(Debug, Default)]
pub struct StringTableWriter {
    pending: Vec<PendingName>,
}

impl StringTableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a placeholder offset at the current position and remembers `value` for it.
    pub fn reserve<W: Write + Seek>(
        &mut self,
        stream: &mut W,
        value: &str,
    ) -> SerializationResult<NameSlot> {
        let position = stream.write_position()?;
        stream.put_u32(PLACEHOLDER_OFFSET)?;

        self.pending.push(PendingName {
            position,
            value: value.to_owned(),
        });

        Ok(NameSlot(self.pending.len() - 1))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Writes the table at the current position and backpatches every reserved slot.
    ///
    /// Returns the absolute position of the table base and the relative offset each slot
    /// resolved to, indexed by [`NameSlot`].
    pub fn flush<W: Write + Seek>(
        self,
        stream: &mut W,
        codec: EncodingRef,
    ) -> SerializationResult<FlushedTable> {
        let base = stream.write_position()?;
        let mut written: HashMap<&str, u32> = HashMap::with_capacity(self.pending.len());
        let mut offsets = Vec::with_capacity(self.pending.len());

        for pending in &self.pending {
            let relative = match written.get(pending.value.as_str()) {
                Some(&relative) => relative,
                None => {
                    let position = stream.write_position()?;
                    let relative = u32::try_from(position - base).map_err(|_| {
                        SerializationError::OffsetOverflow {
                            what: "string table entry",
                            position,
                        }
                    })?;

                    stream.write_zero_terminated_string(&pending.value, codec)?;
                    written.insert(pending.value.as_str(), relative);

                    trace!("Wrote string `{}` at base + {}", pending.value, relative);
                    relative
                }
            };

            stream.patch_u32(pending.position, relative)?;
            offsets.push(relative);
        }

        Ok(FlushedTable {
            base,
            distinct: written.len(),
            offsets,
        })
    }
}

/// Result of flushing a [`StringTableWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushedTable {
    pub base: u64,
    pub distinct: usize,
    offsets: Vec<u32>,
}

impl FlushedTable {
    /// Relative offset the slot was patched with.
    pub fn offset_of(&self, slot: NameSlot) -> Option<u32> {
        self.offsets.get(slot.0).copied()
    }
}
