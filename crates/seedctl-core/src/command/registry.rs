// ── Command registry ──
//
// Resolves command words to a leaf descriptor and binds flags and
// positionals into an `Invocation`. Every parse, type and filter error
// surfaces here, before a handler (and thus any remote call) runs.

use std::str::FromStr;

use super::args::{ArgValue, Invocation};
use super::builtin;
use super::lexer::Word;
use super::spec::{ArgType, Arity, CommandNode, CommandSpec, FlagArity, FlagSpec, Leaf};
use crate::error::CoreError;
use crate::field::{self, units};
use crate::filter::{Filter, SortOrder};
use crate::model::EntityKind;

/// A resolved command ready for its handler.
pub struct Bound<'r> {
    pub spec: &'r CommandSpec,
    pub leaf: &'r Leaf,
    pub invocation: Invocation,
}

/// All commands of a session. Built once, then shared read-only.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in command.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for spec in builtin::all() {
            registry.register(spec);
        }
        registry
    }

    /// Add a command, replacing any earlier one with the same name.
    pub fn register(&mut self, spec: CommandSpec) {
        debug_assert!(
            spec.aliases
                .iter()
                .all(|a| self.commands.iter().all(|c| !c.matches(a))),
            "alias of {} already registered",
            spec.name
        );
        self.commands.retain(|c| c.name != spec.name);
        self.commands.push(spec);
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Look up a top-level command by name or alias.
    pub fn resolve(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.matches(name))
    }

    /// Resolve `words[0]`, descend into sub-commands and bind arguments.
    pub fn bind(&self, words: &[Word]) -> Result<Bound<'_>, CoreError> {
        let Some(first) = words.first() else {
            return Err(CoreError::Syntax {
                message: "empty command".into(),
                offset: 0,
            });
        };
        let mut spec = self
            .resolve(&first.text)
            .ok_or_else(|| CoreError::UnknownCommand {
                name: first.text.clone(),
            })?;
        let mut path = vec![spec.name];
        let mut index = 1;

        let leaf = loop {
            match &spec.node {
                CommandNode::Leaf(leaf) => break leaf,
                CommandNode::Branch(_) => {
                    let Some(word) = words.get(index) else {
                        return Err(CoreError::MissingArgument {
                            command: path.join(" "),
                            name: "SUBCOMMAND".into(),
                        });
                    };
                    spec = spec
                        .subcommand(&word.text)
                        .ok_or_else(|| CoreError::UnknownCommand {
                            name: format!("{} {}", path.join(" "), word.text),
                        })?;
                    path.push(spec.name);
                    index += 1;
                }
            }
        };

        let mut invocation = Invocation::new(path);
        let rest: Vec<(usize, &Word)> = words.iter().enumerate().skip(index).collect();
        let positionals = bind_flags(leaf, &mut invocation, &rest)?;
        bind_positionals(leaf, &mut invocation, &positionals)?;
        Ok(Bound {
            spec,
            leaf,
            invocation,
        })
    }
}

// ── Flags ────────────────────────────────────────────────────────────

/// Consume flags into `invocation`, returning the positional words.
fn bind_flags<'w>(
    leaf: &Leaf,
    invocation: &mut Invocation,
    words: &[(usize, &'w Word)],
) -> Result<Vec<(usize, &'w Word)>, CoreError> {
    let command = invocation.command();
    let mut positionals = Vec::new();
    let mut iter = words.iter().copied();
    let mut flags_done = false;

    while let Some((index, word)) = iter.next() {
        let text = word.text.as_str();
        if flags_done || word.quoted || !text.starts_with('-') || text == "-" || is_number(text)
        {
            positionals.push((index, word));
            continue;
        }
        if text == "--" {
            flags_done = true;
            continue;
        }

        let (flag, inline) = if let Some(long) = text.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            (leaf.flags.iter().find(|f| f.long == name), inline)
        } else {
            let mut shorts = text[1..].chars();
            let first = shorts.next();
            let rest = shorts.as_str();
            let flag = leaf.flags.iter().find(|f| f.short.is_some() && f.short == first);
            match flag {
                // `-sf`: a cluster of switches.
                Some(f) if f.arity == FlagArity::Switch && !rest.is_empty() => {
                    for c in text[1..].chars() {
                        let switch = leaf
                            .flags
                            .iter()
                            .find(|f| f.short == Some(c) && f.arity == FlagArity::Switch)
                            .ok_or_else(|| CoreError::UnknownFlag {
                                command: command.clone(),
                                flag: format!("-{c}"),
                                index,
                            })?;
                        invocation.flags.insert(switch.long, ArgValue::Bool(true));
                    }
                    continue;
                }
                // `-l10`
                Some(f) if !rest.is_empty() => (Some(f), Some(rest)),
                other => (other, None),
            }
        };

        let flag = flag.ok_or_else(|| CoreError::UnknownFlag {
            command: command.clone(),
            flag: text.to_owned(),
            index,
        })?;
        let value = match (flag.arity, inline) {
            (FlagArity::Switch, None) => ArgValue::Bool(true),
            (FlagArity::Switch, Some(raw)) => {
                let on = units::parse_bool(raw).map_err(|_| CoreError::ArgumentType {
                    command: command.clone(),
                    name: format!("--{}", flag.long),
                    value: raw.to_owned(),
                    expected: "a boolean".into(),
                    index,
                })?;
                ArgValue::Bool(on)
            }
            (FlagArity::Value, Some(raw)) => convert(&command, flag.long, flag.ty, raw, index)?,
            (FlagArity::Value, None) => {
                let (value_index, value) =
                    iter.next().ok_or_else(|| CoreError::MissingArgument {
                        command: command.clone(),
                        name: format!("--{}", flag.long),
                    })?;
                let raw = match flag.ty {
                    ArgType::Filter(_) => value.filter_text(),
                    _ => value.text.as_str(),
                };
                convert(&command, flag.long, flag.ty, raw, value_index)?
            }
        };
        invocation.flags.insert(flag.long, value);
    }

    for flag in &leaf.flags {
        if let (Some(default), false) = (flag.default, invocation.flags.contains_key(flag.long)) {
            let value = match flag.arity {
                FlagArity::Switch => ArgValue::Bool(units::parse_bool(default).unwrap_or(false)),
                FlagArity::Value => convert(&command, flag.long, flag.ty, default, 0)?,
            };
            invocation.flags.insert(flag.long, value);
        }
    }
    Ok(positionals)
}

fn is_number(text: &str) -> bool {
    text.len() > 1 && text[1..].chars().all(|c| c.is_ascii_digit() || c == '.')
}

// ── Positionals ──────────────────────────────────────────────────────

/// Distribute words over positional specs left to right, leaving enough
/// words for every later required positional.
fn bind_positionals(
    leaf: &Leaf,
    invocation: &mut Invocation,
    words: &[(usize, &Word)],
) -> Result<(), CoreError> {
    let command = invocation.command();

    // Too few words: name the first positional left short when each one
    // takes only what it needs, left to right.
    let mut left = words.len();
    for spec in &leaf.positionals {
        let Some(rest) = left.checked_sub(spec.arity.min()) else {
            return Err(CoreError::MissingArgument {
                command,
                name: spec.name.to_ascii_uppercase(),
            });
        };
        left = rest;
    }

    let mut cursor = 0;
    for (i, spec) in leaf.positionals.iter().enumerate() {
        let reserved: usize = leaf.positionals[i + 1..]
            .iter()
            .map(|p| p.arity.min())
            .sum();
        let available = words.len().saturating_sub(cursor).saturating_sub(reserved);
        let take = match spec.arity {
            Arity::One | Arity::Optional => 1.min(available),
            Arity::Many | Arity::OneOrMore => available,
        };
        if take < spec.arity.min() {
            return Err(CoreError::MissingArgument {
                command,
                name: spec.name.to_ascii_uppercase(),
            });
        }
        let taken = &words[cursor..cursor + take];
        cursor += take;
        if taken.is_empty() {
            continue;
        }

        let value = match spec.ty {
            ArgType::Filter(kind) => {
                let mut combined: Option<Filter> = None;
                for (index, word) in taken {
                    let filter = Filter::parse_for(kind, word.filter_text()).map_err(|source| {
                        CoreError::FilterSyntax {
                            command: command.clone(),
                            index: *index,
                            input: word.filter_text().to_owned(),
                            source,
                        }
                    })?;
                    combined = Some(match combined {
                        Some(prev) => prev.or(filter),
                        None => filter,
                    });
                }
                combined.map(ArgValue::Filter)
            }
            _ if matches!(spec.arity, Arity::Many | Arity::OneOrMore) => {
                let values = taken
                    .iter()
                    .map(|(index, word)| convert(&command, spec.name, spec.ty, &word.text, *index))
                    .collect::<Result<Vec<_>, _>>()?;
                Some(ArgValue::List(values))
            }
            _ => {
                let (index, word) = taken[0];
                Some(convert(&command, spec.name, spec.ty, &word.text, index)?)
            }
        };
        if let Some(value) = value {
            invocation.positionals.insert(spec.name, value);
        }
    }

    if let Some((index, word)) = words.get(cursor) {
        return Err(CoreError::UnexpectedArgument {
            command,
            value: word.text.clone(),
            index: *index,
        });
    }
    Ok(())
}

// ── Conversion ───────────────────────────────────────────────────────

fn convert(
    command: &str,
    name: &str,
    ty: ArgType,
    raw: &str,
    index: usize,
) -> Result<ArgValue, CoreError> {
    let type_error = || CoreError::ArgumentType {
        command: command.to_owned(),
        name: name.to_owned(),
        value: raw.to_owned(),
        expected: ty.expected(),
        index,
    };
    let filter_error = |source| CoreError::FilterSyntax {
        command: command.to_owned(),
        index,
        input: raw.to_owned(),
        source,
    };

    Ok(match ty {
        ArgType::Text | ArgType::Path => ArgValue::Text(raw.to_owned()),
        ArgType::Integer => ArgValue::Integer(units::parse_int(raw).map_err(|_| type_error())?),
        ArgType::Filter(kind) => ArgValue::Filter(Filter::parse_for(kind, raw).map_err(filter_error)?),
        ArgType::Sort(kind) => ArgValue::Sort(SortOrder::parse_for(kind, raw).map_err(filter_error)?),
        ArgType::Columns(kind) => {
            let mut cols = Vec::new();
            for word in raw.split([',', ' ']).filter(|w| !w.is_empty()) {
                cols.push(field::canonical_field(kind, word).ok_or_else(type_error)?);
            }
            if cols.is_empty() {
                return Err(type_error());
            }
            ArgValue::Columns(cols)
        }
        ArgType::Choice(choices) => {
            let choice = choices
                .iter()
                .find(|c| c.eq_ignore_ascii_case(raw))
                .ok_or_else(type_error)?;
            ArgValue::Text((*choice).to_owned())
        }
        ArgType::RateLimit => {
            let bytes = units::parse_bytes(raw, true).map_err(|_| type_error())?;
            ArgValue::RateLimit((bytes != field::UNLIMITED).then_some(bytes))
        }
        ArgType::Ratio => {
            let ratio = units::parse_float(raw, false).map_err(|_| type_error())?;
            if ratio < 0.0 {
                return Err(type_error());
            }
            ArgValue::Number(ratio)
        }
        ArgType::Kind => ArgValue::Kind(EntityKind::from_str(raw).map_err(|_| type_error())?),
    })
}

/// Flag lines for help output.
pub(crate) fn flag_lines(flags: &[FlagSpec]) -> Vec<String> {
    flags
        .iter()
        .map(|f| format!("  {:<24} {}", f.synopsis(), f.description))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::command::lexer::tokenize;

    fn bind(line: &str) -> Result<Invocation, CoreError> {
        let registry = CommandRegistry::builtin();
        let words = tokenize(line)?;
        registry.bind(&words).map(|b| b.invocation)
    }

    #[test]
    fn resolves_aliases_and_subcommands() {
        assert_eq!(bind("ls").unwrap().path, vec!["list"]);
        assert_eq!(bind("tracker rm http://t/a all").unwrap().path, vec!["tracker", "remove"]);
        assert_eq!(bind("trk add http://t/a all").unwrap().path, vec!["tracker", "add"]);
        assert_eq!(bind("man").unwrap().path, vec!["help"]);
        assert_eq!(bind("uri all").unwrap().path, vec!["magnet"]);
        assert_eq!(bind("info id=1").unwrap().path, vec!["details"]);
        assert!(matches!(bind("frobnicate"), Err(CoreError::UnknownCommand { .. })));
        assert!(matches!(
            bind("tracker"),
            Err(CoreError::MissingArgument { .. })
        ));
    }

    #[test]
    fn long_short_and_inline_flags() {
        let inv = bind("ls --sort=!ratio -c name,size -l 5 seeding").unwrap();
        assert_eq!(inv.sort("sort").unwrap().to_string(), "!ratio");
        assert_eq!(inv.columns("columns").unwrap(), ["name", "size"]);
        assert_eq!(inv.integer("limit"), Some(5));
        assert_eq!(inv.filter("filter").unwrap().to_string(), "seeding");

        let inv = bind("rm -df foo").unwrap();
        assert!(inv.switch("delete-files"));
        assert!(inv.switch("force"));
    }

    #[test]
    fn double_dash_ends_flags() {
        let inv = bind("ls -- -weird").unwrap();
        assert_eq!(inv.filter("filter").unwrap().to_string(), "name~-weird");
    }

    #[test]
    fn multiple_filter_words_are_or_combined() {
        let inv = bind("stop foo bar").unwrap();
        assert_eq!(inv.filter("filter").unwrap().to_string(), "name~foo | name~bar");
    }

    #[test]
    fn positionals_reserve_words_for_required_ones() {
        assert!(matches!(
            bind("move /data"),
            Err(CoreError::MissingArgument { .. })
        ));

        let inv = bind("move ubuntu /data").unwrap();
        assert_eq!(inv.filter("filter").unwrap().to_string(), "name~ubuntu");

        let inv = bind("ratelimit up 1M seeding").unwrap();
        assert_eq!(inv.text("direction"), Some("up"));
        assert_eq!(inv.rate_limit("limit"), Some(Some(1_000_000)));

        let inv = bind("rl down none all").unwrap();
        assert_eq!(inv.rate_limit("limit"), Some(None));

        let inv = bind("setseedratiolimit ubuntu debian 1.5").unwrap();
        assert_eq!(inv.filter("filter").unwrap().to_string(), "name~ubuntu | name~debian");
        assert_eq!(inv.number("limit"), Some(1.5));
    }

    #[test]
    fn commands_that_change_torrents_need_a_filter() {
        for line in [
            "start",
            "start --toggle",
            "stop",
            "verify",
            "announce",
            "rm -fd",
            "rename new-name",
            "rl up 1M",
            "setseedratiolimit 2",
            "tracker add http://t/a",
            "tracker rm t",
            "prio high",
            "details",
            "magnet",
        ] {
            assert!(
                matches!(bind(line), Err(CoreError::MissingArgument { .. })),
                "{line}"
            );
        }
        for (line, missing) in [("rl up 1M", "FILTER"), ("prio high", "TORRENT"), ("stop", "FILTER")] {
            match bind(line).unwrap_err() {
                CoreError::MissingArgument { name, .. } => assert_eq!(name, missing),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(bind("ls").unwrap().positionals.is_empty());
        assert!(bind("fls").unwrap().positionals.is_empty());
    }

    #[test]
    fn binding_errors_carry_command_and_index() {
        match bind("ls --bogus").unwrap_err() {
            CoreError::UnknownFlag { command, flag, index } => {
                assert_eq!((command.as_str(), flag.as_str(), index), ("list", "--bogus", 1));
            }
            other => panic!("unexpected {other:?}"),
        }
        match bind("ls name=~(").unwrap_err() {
            CoreError::FilterSyntax { command, index, .. } => {
                assert_eq!((command.as_str(), index), ("list", 1));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            bind("ls -l many"),
            Err(CoreError::ArgumentType { index: 2, .. })
        ));
        assert!(matches!(bind("ls -s"), Err(CoreError::MissingArgument { .. })));
        assert!(matches!(
            bind("ratelimit sideways 1k all"),
            Err(CoreError::ArgumentType { .. })
        ));
        assert!(matches!(
            bind("setseedratiolimit all -1"),
            Err(CoreError::ArgumentType { .. })
        ));
        assert!(matches!(
            bind("version extra"),
            Err(CoreError::UnexpectedArgument { .. })
        ));
        assert!(matches!(bind("set"), Err(CoreError::MissingArgument { .. })));
    }

    #[test]
    fn negative_numbers_are_positionals() {
        let inv = bind("set poll.interval -1").unwrap();
        assert_eq!(inv.texts("value"), vec!["-1"]);
    }
}
