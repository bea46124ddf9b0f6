// File: ./src/cli.rs
//! Command-line parsing and help text for the `moodjournal` binary.
use crate::config::DEFAULT_BACKEND_URL;
use crate::error::{JournalError, Result};
use crate::model::{EventFilter, EventPatch, EventStatus, PrimaryType};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List {
        filter: EventFilter,
        page: usize,
        page_size: Option<usize>,
    },
    Show(String),
    SetStatus(String, EventStatus),
    Edit(String, EventPatch),
    Delete(String),
    /// `None` reads the dialog text from stdin.
    Extract(Option<String>),
    Types,
    InitConfig,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub root: Option<PathBuf>,
    pub backend_url: Option<String>,
    pub session_id: Option<String>,
    pub command: Command,
}

fn bad(msg: impl Into<String>) -> JournalError {
    JournalError::config(msg)
}

/// Pops the value following a flag.
fn value<'a>(flag: &str, it: &mut impl Iterator<Item = &'a String>) -> Result<String> {
    it.next()
        .cloned()
        .ok_or_else(|| bad(format!("Missing value for {}", flag)))
}

fn number(flag: &str, raw: &str) -> Result<usize> {
    raw.parse()
        .map_err(|_| bad(format!("{} expects a number, got '{}'", flag, raw)))
}

fn single_id(cmd: &str, rest: &[String]) -> Result<String> {
    match rest {
        [id] => Ok(id.clone()),
        _ => Err(bad(format!("Usage: {} <id>", cmd))),
    }
}

/// Parses the arguments after the binary name.
pub fn parse_args(args: &[String]) -> Result<Cli> {
    let mut root = None;
    let mut backend_url = None;
    let mut session_id = None;
    let mut positional: Vec<String> = Vec::new();

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-r" | "--root" => root = Some(PathBuf::from(value(arg, &mut it)?)),
            "--backend" => backend_url = Some(value(arg, &mut it)?),
            "--session" => session_id = Some(value(arg, &mut it)?),
            "-h" | "--help" | "help" if positional.is_empty() => {
                return Ok(Cli {
                    root,
                    backend_url,
                    session_id,
                    command: Command::Help,
                });
            }
            _ => {
                positional.push(arg.clone());
                positional.extend(it.by_ref().cloned());
            }
        }
    }

    let command = match positional.split_first() {
        None => Command::List {
            filter: EventFilter::default(),
            page: 1,
            page_size: None,
        },
        Some((cmd, rest)) => parse_command(cmd, rest)?,
    };

    Ok(Cli {
        root,
        backend_url,
        session_id,
        command,
    })
}

fn parse_command(cmd: &str, rest: &[String]) -> Result<Command> {
    match cmd {
        "list" | "ls" => {
            let mut filter = EventFilter::default();
            let mut page = 1;
            let mut page_size = None;
            let mut it = rest.iter();
            while let Some(flag) = it.next() {
                match flag.as_str() {
                    "--status" => filter.status = Some(value(flag, &mut it)?.parse().map_err(bad)?),
                    "--type" => {
                        filter.primary_type = Some(value(flag, &mut it)?.parse().map_err(bad)?)
                    }
                    "--page" => page = number(flag, &value(flag, &mut it)?)?,
                    "--page-size" => page_size = Some(number(flag, &value(flag, &mut it)?)?),
                    other => return Err(bad(format!("Unknown option for list: {}", other))),
                }
            }
            Ok(Command::List {
                filter,
                page,
                page_size,
            })
        }
        "show" => Ok(Command::Show(single_id(cmd, rest)?)),
        "confirm" => Ok(Command::SetStatus(single_id(cmd, rest)?, EventStatus::Confirmed)),
        "reject" => Ok(Command::SetStatus(single_id(cmd, rest)?, EventStatus::Rejected)),
        "status" => match rest {
            [id, status] => Ok(Command::SetStatus(id.clone(), status.parse().map_err(bad)?)),
            _ => Err(bad("Usage: status <id> <pending|confirmed|rejected>")),
        },
        "edit" => {
            let (id, flags) = rest
                .split_first()
                .ok_or_else(|| bad("Usage: edit <id> [--title T] [--content C] [--type T] [--subtype S] [--color C]"))?;
            let mut patch = EventPatch::default();
            let mut it = flags.iter();
            while let Some(flag) = it.next() {
                match flag.as_str() {
                    "--title" => patch.title = Some(value(flag, &mut it)?),
                    "--content" => patch.content = Some(value(flag, &mut it)?),
                    "--type" => patch.primary_type = Some(value(flag, &mut it)?.parse().map_err(bad)?),
                    "--subtype" => patch.sub_type = Some(value(flag, &mut it)?),
                    "--color" => patch.tag_color = Some(value(flag, &mut it)?),
                    other => return Err(bad(format!("Unknown option for edit: {}", other))),
                }
            }
            if patch.is_empty() {
                return Err(bad("edit needs at least one field to change"));
            }
            Ok(Command::Edit(id.clone(), patch))
        }
        "delete" | "rm" => Ok(Command::Delete(single_id(cmd, rest)?)),
        "extract" => match rest {
            [] => Err(bad("Usage: extract <text...> (or '-' to read stdin)")),
            [dash] if dash == "-" => Ok(Command::Extract(None)),
            words => Ok(Command::Extract(Some(words.join(" ")))),
        },
        "types" => Ok(Command::Types),
        "init-config" => Ok(Command::InitConfig),
        other => Err(bad(format!(
            "Unknown command '{}'. Run with --help for usage.",
            other
        ))),
    }
}

pub fn print_help(binary_name: &str) {
    println!(
        "moodjournal v{} - Mood and behavior event journal",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [OPTIONS] [COMMAND]", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    --backend <url>       Backend API base URL (overrides config).");
    println!(
        "                          The development backend listens on {}.",
        DEFAULT_BACKEND_URL
    );
    println!("    --session <id>        Conversation session for remote events.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("COMMANDS:");
    println!("    list [--status S] [--type T] [--page N] [--page-size N]");
    println!("                          List events (default command).");
    println!("    show <id>             Show one event in full.");
    println!("    confirm <id>          Mark an event as confirmed.");
    println!("    reject <id>           Mark an event as rejected.");
    println!("    status <id> <status>  Set status: pending, confirmed or rejected.");
    println!("    edit <id> [--title T] [--content C] [--type T] [--subtype S] [--color C]");
    println!("                          Change fields of an event.");
    println!("    delete <id>           Delete an event.");
    println!("    extract <text...>     Create a pending event from dialog text ('-' reads stdin).");
    println!("    types                 List event types.");
    println!("    init-config           Write a default config file.");
    println!();
    println!("EXAMPLES:");
    println!("    {} list --status pending --type emotional", binary_name);
    println!("    {} confirm 3", binary_name);
    println!("    {} edit 3 --title \"Argument at home\"", binary_name);
    println!("    echo \"I could not sleep again\" | {} extract -", binary_name);
    println!(
        "    {} --backend {} --session abc list",
        binary_name, DEFAULT_BACKEND_URL
    );
}
