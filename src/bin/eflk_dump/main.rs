use anyhow::{Context, Result, bail, format_err};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use encoding::EncodingRef;
use encoding::label::encoding_from_whatwg_label;
use indoc::indoc;
use log::LevelFilter;
use simplelog::{Config, WriteLogger};

use eflk::ParserSettings;

use std::fs;
use std::io;
use std::path::Path;

mod info;
mod pack;
mod unpack;

fn cli() -> Command {
    Command::new("eflk_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to inspect and convert eflk effect-link containers")
        .long_about(indoc!(
            r#"
            Utility to inspect and convert eflk effect-link containers.

            `unpack` renders a container as JSON, with every parameter and trigger record
            nested under the group that owns it. `pack` turns such a document back into a
            container. Edit the JSON in between to add, remove or move records.
        "#
        ))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help(indoc!(
                    r#"
                    Sets debug prompts level (logs are written to stderr).
                    Warnings are always shown.
                    -v - info, -vv - debug, -vvv - trace
                "#
                )),
        )
        .arg(
            Arg::new("ansi-codec")
                .long("ansi-codec")
                .global(true)
                .value_name("CODEC")
                .default_value("windows-31j")
                .help("Encoding of the strings stored in the container, as a WHATWG label (e.g. windows-31j, utf-8)."),
        )
        .subcommand(unpack::command())
        .subcommand(pack::command())
        .subcommand(info::command())
}

fn init_logging(matches: &ArgMatches) -> Result<()> {
    let level = match matches.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    WriteLogger::init(level, Config::default(), io::stderr())
        .context("Failed to initialize logging")
}

pub(crate) fn ansi_codec(matches: &ArgMatches) -> Result<EncodingRef> {
    let label = matches
        .get_one::<String>("ansi-codec")
        .map(String::as_str)
        .unwrap_or("windows-31j");

    encoding_from_whatwg_label(label).ok_or_else(|| format_err!("Unknown encoding `{}`", label))
}

pub(crate) fn parser_settings(matches: &ArgMatches) -> Result<ParserSettings> {
    Ok(ParserSettings::new()
        .ansi_codec(ansi_codec(matches)?)
        .strict(matches.get_flag("strict")))
}

pub(crate) fn output_arg() -> Arg {
    Arg::new("output-target")
        .long("output")
        .short('f')
        .value_name("OUTPUT")
        .help("Writes output to the file specified instead of stdout.")
}

pub(crate) fn no_confirm_overwrite_arg() -> Arg {
    Arg::new("no-confirm-overwrite")
        .long("no-confirm-overwrite")
        .action(ArgAction::SetTrue)
        .help("When set, will not ask for confirmation before overwriting files, useful for automation")
}

pub(crate) fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Fail on the first range error, name collision or unexpected prologue value instead of reporting it.")
}

/// Makes sure `path` can be written to. If `prompt` is set, asks before replacing an existing file.
pub(crate) fn prepare_output_path(path: &Path, prompt: bool) -> Result<()> {
    if path.is_dir() {
        bail!(
            "There is a directory at {}, refusing to overwrite",
            path.display()
        );
    }

    if path.exists() {
        if prompt {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Are you sure you want to override output file at {}",
                    path.display()
                ))
                .default(false)
                .interact()
                .context("Failed to write confirmation prompt to term")?;

            if !confirmed {
                bail!("Cancelled");
            }
        }
        return Ok(());
    }

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))
        }
        Some(_) => Ok(()),
        None => bail!("Output file cannot be root."),
    }
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let (name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| format_err!("A subcommand is required"))?;
    init_logging(sub_matches)?;

    match name {
        "unpack" => unpack::run(sub_matches),
        "pack" => pack::run(sub_matches),
        "info" => info::run(sub_matches),
        other => bail!("Unknown subcommand `{}`", other),
    }
}
