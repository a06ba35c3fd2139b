use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

use eflk::{EflkParser, Header, RecordGroup};

use std::io::{self, Write};
use std::path::PathBuf;

pub fn command() -> Command {
    Command::new("info")
        .about("Print headers, groups and warnings of a container")
        .arg(
            Arg::new("INPUT")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to an eflk container."),
        )
        .arg(crate::strict_arg())
}

pub fn run(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<PathBuf>("INPUT")
        .context("Missing input path")?;

    let output = EflkParser::from_path(input)
        .with_context(|| format!("Failed to open {}", input.display()))?
        .with_configuration(crate::parser_settings(matches)?)
        .parse()
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "version: {}", output.container.version)?;
    writeln!(out, "headers: {}", output.container.headers().len())?;

    for header in output.container.headers().values() {
        print_header(&mut out, header)?;
    }

    writeln!(out, "warnings: {}", output.warnings.len())?;
    for warning in &output.warnings {
        writeln!(out, "  {}", warning)?;
    }

    Ok(())
}

fn print_header(out: &mut impl Write, header: &Header) -> Result<()> {
    writeln!(
        out,
        "header `{}`: {} parameters, {} triggers",
        header.name(),
        header.parameters().len(),
        header.triggers().len()
    )?;

    for (key, group) in header.resource_groups().iter() {
        print_group(out, key, group)?;
    }
    for (key, group) in header.action_groups().iter() {
        print_group(out, key, group)?;
    }

    Ok(())
}

fn print_group(out: &mut impl Write, key: &str, group: &impl RecordGroup) -> Result<()> {
    let range = group.range();
    match range.to_inclusive() {
        Some((start, end)) if !range.is_empty() => writeln!(
            out,
            "  {} `{}`: [{}, {}] ({} records)",
            key,
            group.name(),
            start,
            end,
            range.len()
        )?,
        _ => writeln!(out, "  {} `{}`: empty", key, group.name())?,
    }

    Ok(())
}
