use std::io::{Seek, Write};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::ReadSeek;
use crate::err::{DeserializationResult, SerializationResult};
use crate::model::float::{lossless_f32, lossless_f32_array};
use crate::string_table::{StringTable, StringTableWriter};
use crate::utils::{ReadExt, WriteExt};

/// On-disk size of a parameter record, callback table excluded.
pub const PARAMETER_RECORD_SIZE: u64 = 104;
/// On-disk size of a callback table.
pub const CALLBACK_TABLE_SIZE: u64 = 16;

/// Four engine-defined callback indices attached to a parameter record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackTable(pub [i32; 4]);

/// Placement and appearance of one effect instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub index: u32,
    pub name: String,
    pub collision_attribute: String,
    pub collision_state: String,
    pub map_name: String,
    pub bone_name: String,
    pub camera_param_name: String,
    #[serde(with = "lossless_f32")]
    pub scale: f32,
    #[serde(with = "lossless_f32_array")]
    pub position: [f32; 3],
    #[serde(with = "lossless_f32_array")]
    pub rotation: [f32; 3],
    #[serde(with = "lossless_f32_array")]
    pub color: [f32; 4],
    pub callbacks: CallbackTable,
    #[serde(default)]
    pub reserved: [u32; 7],
    #[serde(default, with = "lossless_f32")]
    pub reserved_f32: f32,
}

impl Default for ParameterRecord {
    fn default() -> Self {
        ParameterRecord {
            index: 0,
            name: String::new(),
            collision_attribute: String::new(),
            collision_state: String::new(),
            map_name: String::new(),
            bone_name: String::new(),
            camera_param_name: String::new(),
            scale: 1.0,
            position: [0.0; 3],
            rotation: [0.0; 3],
            color: [1.0; 4],
            callbacks: CallbackTable::default(),
            reserved: [0; 7],
            reserved_f32: 0.0,
        }
    }
}

impl ParameterRecord {
    /// Reads the fixed part of a record. Callback tables are stored after all records, so
    /// `callbacks` is left empty here and filled in by a second pass.
    pub(crate) fn from_stream<T: ReadSeek>(
        stream: &mut T,
        strings: &StringTable,
    ) -> DeserializationResult<ParameterRecord> {
        trace!("Offset `0x{:08x}` - ParameterRecord", stream.tell().unwrap_or(0));

        let mut reserved = [0_u32; 7];

        let index = stream.try_u32_named("parameter.index")?;
        reserved[0] = stream.try_u32_named("parameter.reserved")?;
        let name = strings.read_name(stream, "parameter.name")?;
        reserved[1] = stream.try_u32_named("parameter.reserved")?;
        let collision_attribute = strings.read_name(stream, "parameter.collision_attribute")?;
        reserved[2] = stream.try_u32_named("parameter.reserved")?;
        let collision_state = strings.read_name(stream, "parameter.collision_state")?;
        reserved[3] = stream.try_u32_named("parameter.reserved")?;
        let map_name = strings.read_name(stream, "parameter.map_name")?;
        reserved[4] = stream.try_u32_named("parameter.reserved")?;
        let bone_name = strings.read_name(stream, "parameter.bone_name")?;
        let camera_param_name = strings.read_name(stream, "parameter.camera_param_name")?;
        reserved[5] = stream.try_u32_named("parameter.reserved")?;
        reserved[6] = stream.try_u32_named("parameter.reserved")?;
        let reserved_f32 = stream.try_f32_named("parameter.reserved_f32")?;
        let scale = stream.try_f32_named("parameter.scale")?;
        let position = stream.try_f32_array_named("parameter.position")?;
        let rotation = stream.try_f32_array_named("parameter.rotation")?;
        let color = stream.try_f32_array_named("parameter.color")?;

        Ok(ParameterRecord {
            index,
            name,
            collision_attribute,
            collision_state,
            map_name,
            bone_name,
            camera_param_name,
            scale,
            position,
            rotation,
            color,
            callbacks: CallbackTable::default(),
            reserved,
            reserved_f32,
        })
    }

    /// Writes the fixed part of the record with `index` in place of the stored one.
    /// Every name goes through `strings` and is resolved when the table is flushed.
    pub(crate) fn write_to<W: Write + Seek>(
        &self,
        stream: &mut W,
        strings: &mut StringTableWriter,
        index: u32,
    ) -> SerializationResult<()> {
        stream.put_u32(index)?;
        stream.put_u32(self.reserved[0])?;
        strings.reserve(stream, &self.name)?;
        stream.put_u32(self.reserved[1])?;
        strings.reserve(stream, &self.collision_attribute)?;
        stream.put_u32(self.reserved[2])?;
        strings.reserve(stream, &self.collision_state)?;
        stream.put_u32(self.reserved[3])?;
        strings.reserve(stream, &self.map_name)?;
        stream.put_u32(self.reserved[4])?;
        strings.reserve(stream, &self.bone_name)?;
        strings.reserve(stream, &self.camera_param_name)?;
        stream.put_u32(self.reserved[5])?;
        stream.put_u32(self.reserved[6])?;
        stream.put_f32(self.reserved_f32)?;
        stream.put_f32(self.scale)?;
        stream.put_f32_array(&self.position)?;
        stream.put_f32_array(&self.rotation)?;
        stream.put_f32_array(&self.color)?;

        Ok(())
    }
}

impl CallbackTable {
    pub(crate) fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<Self> {
        Ok(CallbackTable(stream.try_i32_array_named("callback table")?))
    }

    pub(crate) fn write_to<W: Write + Seek>(&self, stream: &mut W) -> SerializationResult<()> {
        stream.put_i32_array(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding::all::WINDOWS_31J;
    use std::io::Cursor;

    fn sample() -> ParameterRecord {
        ParameterRecord {
            index: 3,
            name: "hit_spark".to_owned(),
            collision_attribute: "metal".to_owned(),
            collision_state: "hit".to_owned(),
            map_name: "stage01".to_owned(),
            bone_name: "R_hand".to_owned(),
            camera_param_name: "hit_spark".to_owned(),
            scale: 1.5,
            position: [0.0, 1.0, -2.5],
            rotation: [0.0, 90.0, 0.0],
            color: [1.0, 0.5, 0.25, 1.0],
            callbacks: CallbackTable([-1, 0, 2, 7]),
            reserved: [1, 2, 3, 4, 5, 6, 7],
            reserved_f32: 0.125,
        }
    }

    #[test]
    fn test_record_has_fixed_size() {
        let mut cursor = Cursor::new(Vec::new());
        let mut strings = StringTableWriter::new();

        sample().write_to(&mut cursor, &mut strings, 0).unwrap();

        assert_eq!(cursor.position(), PARAMETER_RECORD_SIZE);
        assert_eq!(strings.len(), 6);
    }

    #[test]
    fn test_record_reads_back() {
        let mut cursor = Cursor::new(Vec::new());
        let mut strings = StringTableWriter::new();

        let record = sample();
        record.write_to(&mut cursor, &mut strings, 3).unwrap();
        record.callbacks.write_to(&mut cursor).unwrap();
        let flushed = strings.flush(&mut cursor, WINDOWS_31J).unwrap();

        // `hit_spark` is used twice but stored once.
        assert_eq!(flushed.distinct, 5);

        cursor.set_position(0);
        let table = StringTable::new(flushed.base, WINDOWS_31J);
        let mut read = ParameterRecord::from_stream(&mut cursor, &table).unwrap();
        read.callbacks = CallbackTable::from_stream(&mut cursor).unwrap();

        assert_eq!(cursor.position(), PARAMETER_RECORD_SIZE + CALLBACK_TABLE_SIZE);
        assert_eq!(read, record);
    }

    #[test]
    fn test_written_index_overrides_stored_index() {
        let mut cursor = Cursor::new(Vec::new());
        let mut strings = StringTableWriter::new();

        sample().write_to(&mut cursor, &mut strings, 42).unwrap();

        assert_eq!(&cursor.get_ref()[..4], &[0, 0, 0, 42]);
    }
}
