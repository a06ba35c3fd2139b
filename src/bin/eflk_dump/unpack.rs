use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indoc::indoc;

use eflk::EflkParser;
use eflk::interchange::to_json_string;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

pub fn command() -> Command {
    Command::new("unpack")
        .about("Render a container as JSON")
        .long_about(indoc!(
            r#"
            Render a container as JSON.

            Records are nested under the resource or action group that owns them.
            Reserved fields are kept so that `pack` reproduces them.
        "#
        ))
        .arg(
            Arg::new("INPUT")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to an eflk container."),
        )
        .arg(crate::output_arg())
        .arg(crate::no_confirm_overwrite_arg())
        .arg(crate::strict_arg())
        .arg(
            Arg::new("no-indent")
                .long("no-indent")
                .action(ArgAction::SetTrue)
                .help("When set, output will not be indented."),
        )
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

    let json = to_json_string(&output.container, !matches.get_flag("no-indent"))?;

    match matches.get_one::<String>("output-target") {
        Some(path) => {
            let path = PathBuf::from(path);
            crate::prepare_output_path(&path, !matches.get_flag("no-confirm-overwrite"))?;

            let mut f = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            writeln!(f, "{}", json)?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            writeln!(lock, "{}", json)?;
        }
    }

    Ok(())
}
