// Settings, help and other commands that do not touch torrents.

use std::path::Path;

use super::leaf;
use crate::command::args::Invocation;
use crate::command::dispatch::Dispatcher;
use crate::command::outcome::{CommandOutcome, Help};
use crate::command::registry::flag_lines;
use crate::command::spec::{ArgType, Arity, Category, CommandSpec, PositionalSpec, handler};
use crate::error::CoreError;
use crate::field;
use crate::model::EntityKind;
use crate::script;
use crate::session::Session;

pub(super) fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            name: "set",
            aliases: &[],
            category: Category::Configuration,
            description: "Change a setting",
            usage: &["set NAME VALUE..."],
            examples: &["set poll.interval 2", "set tlist.columns name, size, ratio"],
            node: leaf(
                Vec::new(),
                vec![
                    PositionalSpec::new("name", ArgType::Text, Arity::One, "Setting name"),
                    PositionalSpec::new(
                        "value",
                        ArgType::Text,
                        Arity::OneOrMore,
                        "New value; several words are joined with spaces",
                    ),
                ],
                handler!(set),
            ),
        },
        CommandSpec {
            name: "reset",
            aliases: &[],
            category: Category::Configuration,
            description: "Restore settings to their defaults",
            usage: &["reset NAME..."],
            examples: &["reset tlist.sort tlist.columns"],
            node: leaf(
                Vec::new(),
                vec![PositionalSpec::new(
                    "name",
                    ArgType::Text,
                    Arity::OneOrMore,
                    "Setting names",
                )],
                handler!(reset),
            ),
        },
        CommandSpec {
            name: "settings",
            aliases: &["config"],
            category: Category::Configuration,
            description: "Show settings, optionally only those whose name contains a word",
            usage: &["settings [WORD...]"],
            examples: &["settings", "settings poll"],
            node: leaf(
                Vec::new(),
                vec![PositionalSpec::new(
                    "word",
                    ArgType::Text,
                    Arity::Many,
                    "Name fragments",
                )],
                handler!(settings),
            ),
        },
        CommandSpec {
            name: "fields",
            aliases: &[],
            category: Category::Miscellaneous,
            description: "List filter fields and flags of torrents, peers, files or trackers",
            usage: &["fields KIND"],
            examples: &["fields torrent", "fields tracker"],
            node: leaf(
                Vec::new(),
                vec![PositionalSpec::new(
                    "kind",
                    ArgType::Kind,
                    Arity::One,
                    "torrent, peer, file or tracker",
                )],
                handler!(fields),
            ),
        },
        CommandSpec {
            name: "help",
            aliases: &["h", "man"],
            category: Category::Miscellaneous,
            description: "Show commands, or details about one command or topic",
            usage: &["help [COMMAND...]"],
            examples: &["help", "help tracker add", "help filter"],
            node: leaf(
                Vec::new(),
                vec![PositionalSpec::new(
                    "topic",
                    ArgType::Text,
                    Arity::Many,
                    "Command path, 'filter' or 'sort'",
                )],
                handler!(help),
            ),
        },
        CommandSpec {
            name: "version",
            aliases: &[],
            category: Category::Miscellaneous,
            description: "Show client and daemon versions",
            usage: &["version"],
            examples: &["version"],
            node: leaf(Vec::new(), Vec::new(), handler!(version)),
        },
        CommandSpec {
            name: "rc",
            aliases: &["source"],
            category: Category::Configuration,
            description: "Run commands from a file",
            usage: &["rc FILE"],
            examples: &["rc ~/.config/seedctl/rc"],
            node: leaf(
                Vec::new(),
                vec![PositionalSpec::new("file", ArgType::Path, Arity::One, "Script path")],
                handler!(rc),
            ),
        },
    ]
}

// ── Handlers ─────────────────────────────────────────────────────────

#[allow(clippy::unused_async)]
async fn set(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let name = inv.text("name").unwrap_or_default();
    let value = session.settings().set(name, &inv.texts("value").join(" "))?;
    Ok(CommandOutcome::Message(format!("{name} = {value}")))
}

#[allow(clippy::unused_async)]
async fn reset(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let mut lines = Vec::new();
    for name in inv.texts("name") {
        let value = session.settings().reset(name)?;
        lines.push(format!("{name} = {value}"));
    }
    Ok(CommandOutcome::Message(lines.join("\n")))
}

#[allow(clippy::unused_async)]
async fn settings(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let words = inv.texts("word");
    let entries = session
        .settings()
        .list()
        .into_iter()
        .filter(|e| words.is_empty() || words.iter().any(|w| e.name.contains(w)))
        .collect();
    Ok(CommandOutcome::Settings(entries))
}

#[allow(clippy::unused_async)]
async fn fields(_session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let kind = inv.kind("kind").unwrap_or(EntityKind::Torrent);
    Ok(CommandOutcome::Fields {
        kind,
        fields: field::list(kind),
    })
}

#[allow(clippy::unused_async)]
async fn help(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let topic = inv.texts("topic");
    let help = match topic.as_slice() {
        [] => overview(session),
        ["filter" | "filters"] => Help {
            title: "Filters".into(),
            lines: FILTER_HELP.lines().map(str::to_owned).collect(),
        },
        ["sort" | "sorting"] => Help {
            title: "Sorting".into(),
            lines: SORT_HELP.lines().map(str::to_owned).collect(),
        },
        [first, rest @ ..] => {
            let not_found = || CoreError::UnknownCommand {
                name: topic.join(" "),
            };
            let mut spec = session.commands().resolve(first).ok_or_else(not_found)?;
            for word in rest {
                spec = spec.subcommand(word).ok_or_else(not_found)?;
            }
            command_help(spec)
        }
    };
    Ok(CommandOutcome::Help(help))
}

async fn version(session: &Session, _inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let remote = match session.describe_remote().await {
        Ok(daemon) => daemon,
        Err(e) => format!("daemon unavailable: {e}"),
    };
    Ok(CommandOutcome::Message(format!(
        "seedctl {}\n{remote}",
        env!("CARGO_PKG_VERSION")
    )))
}

async fn rc(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let path = Path::new(inv.text("file").unwrap_or_default());
    let dispatcher = Dispatcher::new(session.clone());
    Ok(script::run_file(&dispatcher, path, false)
        .await?
        .map_or(CommandOutcome::Nothing, CommandOutcome::Script))
}

// ── Help text ────────────────────────────────────────────────────────

fn overview(session: &Session) -> Help {
    let mut commands: Vec<_> = session.commands().commands().iter().collect();
    commands.sort_by_key(|c| (c.category, c.name));

    let mut lines = Vec::new();
    let mut category = None;
    for spec in commands {
        if category != Some(spec.category) {
            if category.is_some() {
                lines.push(String::new());
            }
            category = Some(spec.category);
            lines.push(format!("{}:", capitalize(&spec.category.to_string())));
        }
        lines.push(format!("  {:<14} {}", spec.name, spec.description));
    }
    lines.push(String::new());
    lines.push("Chain commands with ';', '&' (on success) or '|' (on failure).".into());
    lines.push("'help COMMAND' describes one command; 'help filter' the filter syntax.".into());
    Help {
        title: "Commands".into(),
        lines,
    }
}

fn command_help(spec: &CommandSpec) -> Help {
    let mut lines = vec![spec.description.to_owned(), String::new(), "Usage:".into()];
    lines.extend(spec.usage.iter().map(|u| format!("  {u}")));
    if !spec.aliases.is_empty() {
        lines.push(String::new());
        lines.push(format!("Aliases: {}", spec.aliases.join(", ")));
    }
    if let Some(leaf) = spec.leaf() {
        if !leaf.flags.is_empty() {
            lines.push(String::new());
            lines.push("Options:".into());
            lines.extend(flag_lines(&leaf.flags));
        }
        if !leaf.positionals.is_empty() {
            lines.push(String::new());
            lines.push("Arguments:".into());
            lines.extend(
                leaf.positionals
                    .iter()
                    .map(|p| format!("  {:<24} {}", p.synopsis(), p.description)),
            );
        }
    }
    if !spec.examples.is_empty() {
        lines.push(String::new());
        lines.push("Examples:".into());
        lines.extend(spec.examples.iter().map(|e| format!("  {e}")));
    }
    Help {
        title: spec.name.to_owned(),
        lines,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |c| {
        c.to_uppercase().chain(chars).collect()
    })
}

const FILTER_HELP: &str = "\
A filter selects items by their fields: FIELD OPERATOR VALUE.

Operators:
  =   equal                     !=  not equal
  <   less than                 <=  less than or equal
  >   greater than              >=  greater than or equal
  ~   contains (text)           =~  matches regular expression

A bare word is a flag (seeding, stopped, ...) or, failing that, matches
the default field: 'ubuntu' is the same as 'name~ubuntu'.

Combine with & (and), | (or) and ! (not); & binds tighter than |.
Parentheses group: (seeding | stopped) & ratio>2

Values take units where the field has them: size>1.5G, rate-down>500k,
eta<2h, added<1w (relative times count back from now).
Quote values that contain spaces or operators: 'name=my file'.

'fields torrent' lists every field and flag.";

const SORT_HELP: &str = "\
A sort order is a comma-separated list of fields: ratio,name.
A leading ! reverses a field: !seeds,name.
Ties fall through to the next field and finally to the id.";
