use crate::eflk_file_header::EflkFileHeader;
use crate::eflk_header::read_header;
use crate::err::{DeserializationError, DeserializationResult, NameCollisionError, Result, Warning};
use crate::model::{Container, Header};
use crate::ordered_map::OrderedMap;
use crate::string_table::StringTable;
use crate::utils::ReadExt;

use encoding::all::WINDOWS_31J;
use encoding::{Encoding, EncodingRef};
use log::{debug, warn};

use std::fmt::{self, Debug};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

// Inspired by https://github.com/mitsuhiko/unbox/src/formats/cab.rs
pub trait ReadSeek: Read + Seek {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

impl<T: Read + Seek> ReadSeek for T {}

#[derive(Clone)]
pub struct ParserSettings {
    /// Codec used to decode every string table in the container.
    ansi_codec: EncodingRef,
    /// Abort on the first recoverable problem instead of collecting it.
    strict: bool,
}

impl Debug for ParserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserSettings")
            .field("ansi_codec", &self.ansi_codec.name())
            .field("strict", &self.strict)
            .finish()
    }
}

impl PartialEq for ParserSettings {
    fn eq(&self, other: &ParserSettings) -> bool {
        self.ansi_codec.name() == other.ansi_codec.name() && self.strict == other.strict
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            ansi_codec: WINDOWS_31J,
            strict: false,
        }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    pub fn ansi_codec(mut self, ansi_codec: EncodingRef) -> Self {
        self.ansi_codec = ansi_codec;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn get_ansi_codec(&self) -> EncodingRef {
        self.ansi_codec
    }

    pub fn should_fail_on_warnings(&self) -> bool {
        self.strict
    }
}

/// Everything a successful decode produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub container: Container,
    /// Recoverable problems, in the order they were found.
    pub warnings: Vec<Warning>,
}

/// Collects warnings during a decode, or turns the first one into an error in strict mode.
#[derive(Debug)]
pub(crate) struct Diagnostics {
    strict: bool,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub(crate) fn new(strict: bool) -> Self {
        Diagnostics {
            strict,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn report(&mut self, warning: impl Into<Warning>) -> DeserializationResult<()> {
        let warning = warning.into();
        warn!("{}", warning);

        if self.strict {
            return Err(DeserializationError::Strict(warning));
        }

        self.warnings.push(warning);
        Ok(())
    }

    pub(crate) fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

pub struct EflkParser<T: ReadSeek> {
    data: T,
    config: ParserSettings,
}

impl EflkParser<File> {
    /// Attempts to load a container from a given path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        Self::from_read_seek(f)
    }
}

impl EflkParser<Cursor<Vec<u8>>> {
    /// Attempts to load a container from an owned buffer.
    pub fn from_buffer(buffer: Vec<u8>) -> Self {
        EflkParser {
            data: Cursor::new(buffer),
            config: ParserSettings::default(),
        }
    }
}

impl<T: ReadSeek> EflkParser<T> {
    pub fn from_read_seek(mut read_seek: T) -> Result<Self> {
        read_seek.seek(SeekFrom::Start(0))?;

        Ok(EflkParser {
            data: read_seek,
            config: ParserSettings::default(),
        })
    }

    pub fn with_configuration(mut self, configuration: ParserSettings) -> Self {
        self.config = configuration;
        self
    }

    /// Decodes the whole container. A fatal format error hands back no partial result.
    pub fn parse(&mut self) -> Result<ParseOutput> {
        let mut diagnostics = Diagnostics::new(self.config.should_fail_on_warnings());
        let container = parse_container(&mut self.data, &self.config, &mut diagnostics)?;

        Ok(ParseOutput {
            container,
            warnings: diagnostics.into_warnings(),
        })
    }
}

fn parse_container<T: ReadSeek>(
    stream: &mut T,
    settings: &ParserSettings,
    diagnostics: &mut Diagnostics,
) -> DeserializationResult<Container> {
    stream.try_seek_abs_named(0, "container start")?;

    let file_header = EflkFileHeader::from_stream(stream)?;
    debug!("Container header: {:?}", file_header);

    let codec = settings.get_ansi_codec();
    let names = StringTable::new(u64::from(file_header.string_table_offset), codec);
    let mut headers: OrderedMap<Header> = OrderedMap::new();

    for entry in &file_header.entries {
        let name = names.resolve(stream, entry.name_offset, "header.name")?;

        let header = {
            let mut body = stream.temporary_seek(u64::from(entry.data_offset), "header body")?;
            read_header(&mut *body, name.clone(), codec, diagnostics)?
        };

        if headers.insert(name.clone(), header).is_some() {
            diagnostics.report(NameCollisionError {
                scope: "container".to_owned(),
                name,
            })?;
        }
    }

    Ok(Container::from_parts(file_header.version, headers))
}
