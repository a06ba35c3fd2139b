#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]

pub use eflk_parser::{EflkParser, ParseOutput, ParserSettings, ReadSeek};
pub use eflk_writer::{EflkWriter, WriterSettings};
pub use err::{
    DeserializationError, EflkError, NameCollisionError, RangeError, RecordFamily, Result,
    SerializationError, Warning,
};
pub use model::{
    ActionGroup, CallbackTable, Container, GroupContents, Header, ParameterRecord, RecordGroup,
    RecordRange, ResourceGroup, TriggerRecord,
};
pub use ordered_map::OrderedMap;

pub mod eflk_file_header;
pub mod eflk_header;
pub mod eflk_parser;
pub mod eflk_writer;
pub mod err;
pub mod interchange;
pub mod model;
pub mod ordered_map;
pub mod string_table;

mod utils;

pub use utils::SeekGuard;
