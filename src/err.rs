use crate::utils::hexdump::dump_stream;
use crate::ReadSeek;

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EflkError>;
pub(crate) type DeserializationResult<T> = std::result::Result<T, DeserializationError>;
pub(crate) type SerializationResult<T> = std::result::Result<T, SerializationError>;

/// An IO error which captures additional information about it's context (hexdump).
#[derive(Debug, Error)]
#[error("{source}\nOffset: `0x{offset:08x} ({offset})`\nHexdump:\n{hexdump}")]
pub struct WrappedIoError {
    offset: u64,
    hexdump: String,
    #[source]
    source: io::Error,
}

impl WrappedIoError {
    pub fn capture_hexdump<T: ReadSeek>(error: io::Error, stream: &mut T) -> WrappedIoError {
        let offset = stream.tell().unwrap_or(0);
        // Rewind a little so the failing field is visible in context.
        let hexdump = dump_stream(stream, offset.saturating_sub(16), 64).unwrap_or_default();

        WrappedIoError {
            offset,
            hexdump,
            source: error,
        }
    }

    /// Used when the stream cannot be borrowed again to capture context.
    pub fn at_offset(error: io::Error, offset: u64) -> WrappedIoError {
        WrappedIoError {
            offset,
            hexdump: String::new(),
            source: error,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("Failed to read `{token_name}` ({t})")]
    FailedToReadToken {
        t: &'static str,
        token_name: &'static str,
        #[source]
        source: WrappedIoError,
    },

    #[error("Invalid signature at offset {offset}, expected `{expected:?}`, found `{found:?}`")]
    InvalidSignature {
        offset: u64,
        expected: [u8; 4],
        found: [u8; 4],
    },

    #[error("Offset {offset}: string (used encoding scheme {encoding}) is not terminated before EOF")]
    UnterminatedString {
        encoding: &'static str,
        offset: u64,
    },

    #[error(
        "Offset {offset}: Failed to decode string (used encoding scheme {encoding}), caused by: {message}"
    )]
    FailedToDecodeString {
        encoding: &'static str,
        message: String,
        offset: u64,
    },

    #[error("Offset {base} + {relative} for {what} does not fit in the stream address space")]
    OffsetOverflow {
        what: &'static str,
        base: u64,
        relative: u32,
    },

    #[error("Failed to seek to {what} at offset {offset}")]
    FailedToSeek {
        what: &'static str,
        offset: u64,
        #[source]
        source: WrappedIoError,
    },

    #[error("Refusing to continue in strict mode: {0}")]
    Strict(Warning),

    #[error("An I/O error has occurred")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Failed to encode `{value}` with encoding scheme {encoding}: {message}")]
    UnencodableString {
        value: String,
        encoding: &'static str,
        message: String,
    },

    #[error("String `{0}` contains an interior NUL and cannot be zero-terminated")]
    InteriorNul(String),

    #[error("Header `{header}` holds {count} {family} records, at most {max} fit a u16 range")]
    TooManyRecords {
        header: String,
        family: RecordFamily,
        count: usize,
        max: usize,
    },

    #[error("Stream position {position} of {what} does not fit in a u32 offset")]
    OffsetOverflow { what: &'static str, position: u64 },

    #[error("An I/O error has occurred")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum EflkError {
    #[error("Failed to deserialize container")]
    Deserialization(#[from] DeserializationError),

    #[error("Failed to serialize container")]
    Serialization(#[from] SerializationError),

    #[error("Failed to convert container to or from JSON")]
    Json(#[from] serde_json::Error),

    #[error("An I/O error has occurred")]
    Io(#[from] io::Error),
}

/// Which of the two flat record arrays of a header something refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFamily {
    Parameter,
    Trigger,
}

impl std::fmt::Display for RecordFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordFamily::Parameter => write!(f, "parameter"),
            RecordFamily::Trigger => write!(f, "trigger"),
        }
    }
}

/// A group range that could not be applied to its flat array. The group is read as empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Header `{header}`: {family} group `{group}` has range [{start}, {end}] but only {available} records exist"
)]
pub struct RangeError {
    pub header: String,
    pub family: RecordFamily,
    pub group: String,
    pub start: u16,
    pub end: u16,
    pub available: usize,
}

/// Two entries shared a key within one scope. The later one replaced the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Duplicate name `{name}` in {scope}, the last definition wins")]
pub struct NameCollisionError {
    pub scope: String,
    pub name: String,
}

/// Recoverable problems. These never abort a decode or an encode on their own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    NameCollision(#[from] NameCollisionError),

    #[error("Header `{header}`: prologue field `{field}` expected {expected}, found {found}")]
    UnexpectedPrologueValue {
        header: String,
        field: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("Header `{header}`: {family} groups do not tile the record array ({detail})")]
    GroupLayout {
        header: String,
        family: RecordFamily,
        detail: String,
    },
}
