use std::io::{Seek, Write};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::ReadSeek;
use crate::err::{DeserializationResult, SerializationResult};
use crate::model::float::{lossless_f32, lossless_f32_array};
use crate::string_table::{StringTable, StringTableWriter};
use crate::utils::{ReadExt, WriteExt};

pub const TRIGGER_RECORD_SIZE: u64 = 60;

/// A timed invocation of a named resource.
///
/// `resource_name` refers to a resource group by its `name` and is resolved by the engine, not
/// by this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub index: u32,
    pub resource_name: String,
    pub bone_name: String,
    /// Frames to wait before firing.
    pub delay: u32,
    #[serde(with = "lossless_f32")]
    pub emission_rate: f32,
    #[serde(with = "lossless_f32_array")]
    pub offset: [f32; 3],
    #[serde(default)]
    pub reserved: [u32; 2],
    #[serde(default)]
    pub reserved_i32: i32,
    #[serde(default)]
    pub reserved_pair: [u16; 2],
    #[serde(default, with = "lossless_f32_array")]
    pub reserved_vector: [f32; 3],
}

impl TriggerRecord {
    pub(crate) fn from_stream<T: ReadSeek>(
        stream: &mut T,
        strings: &StringTable,
    ) -> DeserializationResult<TriggerRecord> {
        trace!("Offset `0x{:08x}` - TriggerRecord", stream.tell().unwrap_or(0));

        let index = stream.try_u32_named("trigger.index")?;
        let reserved_0 = stream.try_u32_named("trigger.reserved")?;
        let resource_name = strings.read_name(stream, "trigger.resource_name")?;
        let reserved_1 = stream.try_u32_named("trigger.reserved")?;
        let delay = stream.try_u32_named("trigger.delay")?;
        let reserved_i32 = stream.try_i32_named("trigger.reserved_i32")?;
        let reserved_pair = stream.try_u16_array_named("trigger.reserved_pair")?;
        let bone_name = strings.read_name(stream, "trigger.bone_name")?;
        let emission_rate = stream.try_f32_named("trigger.emission_rate")?;
        let offset = stream.try_f32_array_named("trigger.offset")?;
        let reserved_vector = stream.try_f32_array_named("trigger.reserved_vector")?;

        Ok(TriggerRecord {
            index,
            resource_name,
            bone_name,
            delay,
            emission_rate,
            offset,
            reserved: [reserved_0, reserved_1],
            reserved_i32,
            reserved_pair,
            reserved_vector,
        })
    }

    pub(crate) fn write_to<W: Write + Seek>(
        &self,
        stream: &mut W,
        strings: &mut StringTableWriter,
        index: u32,
    ) -> SerializationResult<()> {
        stream.put_u32(index)?;
        stream.put_u32(self.reserved[0])?;
        strings.reserve(stream, &self.resource_name)?;
        stream.put_u32(self.reserved[1])?;
        stream.put_u32(self.delay)?;
        stream.put_i32(self.reserved_i32)?;
        stream.put_u16_array(&self.reserved_pair)?;
        strings.reserve(stream, &self.bone_name)?;
        stream.put_f32(self.emission_rate)?;
        stream.put_f32_array(&self.offset)?;
        stream.put_f32_array(&self.reserved_vector)?;

        Ok(())
    }
}
