use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indoc::indoc;
use log::info;
use tempfile::NamedTempFile;

use eflk::interchange::from_json_str;
use eflk::{EflkWriter, WriterSettings};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn command() -> Command {
    Command::new("pack")
        .about("Build a container from its JSON form")
        .long_about(indoc!(
            r#"
            Build a container from its JSON form (as produced by `unpack`).

            The flat record arrays and group ranges are laid out again from the group nesting.
            The output is written to a temporary file first and only moved into place once
            encoding succeeded.
        "#
        ))
        .arg(
            Arg::new("INPUT")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to a JSON document."),
        )
        .arg(crate::output_arg().required(true))
        .arg(crate::no_confirm_overwrite_arg())
        .arg(
            Arg::new("preserve-indices")
                .long("preserve-indices")
                .action(ArgAction::SetTrue)
                .help("Write each record's stored `index` instead of its position in the flat array."),
        )
}

pub fn run(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<PathBuf>("INPUT")
        .context("Missing input path")?;
    let output = PathBuf::from(
        matches
            .get_one::<String>("output-target")
            .context("Missing output path")?,
    );

    let json = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let (container, warnings) = from_json_str(&json)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    if !warnings.is_empty() {
        info!("{} warnings while loading {}", warnings.len(), input.display());
    }

    let settings = WriterSettings::new()
        .ansi_codec(crate::ansi_codec(matches)?)
        .preserve_record_indices(matches.get_flag("preserve-indices"));
    let bytes = EflkWriter::new(settings)
        .to_bytes(&container)
        .context("Failed to encode container")?;

    crate::prepare_output_path(&output, !matches.get_flag("no-confirm-overwrite"))?;
    persist(&output, &bytes)?;

    info!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .with_context(|| format!("Failed to persist {}", path.display()))?;

    Ok(())
}
