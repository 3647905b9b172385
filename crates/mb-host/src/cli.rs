use std::path::PathBuf;

use color_eyre::eyre::{bail, eyre};

pub const USAGE: &str = "\
usage: mb-host [--root DIR] [--debug] <command>

commands:
  reconcile                         run one reconciliation cycle
  watch [--interval SECS]           reconcile on startup and then periodically
  status [--json]                   show the container's sub-projects
  mark-template <name> <true|false> set or clear a project's template flag
  purge                             delete orphaned branch projects";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reconcile,
    Watch { interval_secs: Option<u64> },
    Status { json: bool },
    MarkTemplate { name: String, is_template: bool },
    Purge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub root: Option<PathBuf>,
    pub debug: bool,
    pub command: Command,
}

/// Parse the arguments after the program name.
pub fn parse(args: &[String]) -> color_eyre::Result<Cli> {
    let mut root = None;
    let mut debug = false;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" => debug = true,
            "--root" => {
                let dir = iter.next().ok_or_else(|| eyre!("--root needs a directory"))?;
                root = Some(PathBuf::from(dir));
            }
            _ => rest.push(arg.as_str()),
        }
    }

    let command = match rest.as_slice() {
        ["reconcile"] => Command::Reconcile,
        ["watch"] => Command::Watch {
            interval_secs: None,
        },
        ["watch", "--interval", secs] => Command::Watch {
            interval_secs: Some(parse_interval(secs)?),
        },
        ["status"] => Command::Status { json: false },
        ["status", "--json"] => Command::Status { json: true },
        ["mark-template", name, flag] => Command::MarkTemplate {
            name: (*name).to_string(),
            is_template: parse_flag(flag)?,
        },
        ["purge"] => Command::Purge,
        [] => bail!("missing command\n\n{USAGE}"),
        other => bail!("unrecognized arguments: {}\n\n{USAGE}", other.join(" ")),
    };

    Ok(Cli {
        root,
        debug,
        command,
    })
}

fn parse_interval(value: &str) -> color_eyre::Result<u64> {
    match value.parse::<u64>() {
        Ok(0) | Err(_) => bail!("--interval must be a positive number of seconds, got '{value}'"),
        Ok(secs) => Ok(secs),
    }
}

fn parse_flag(value: &str) -> color_eyre::Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => bail!("expected true or false, got '{other}'"),
    }
}
