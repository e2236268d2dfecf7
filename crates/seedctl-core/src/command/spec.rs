// Command descriptors: the static shape of every command the registry knows.

use futures_util::future::BoxFuture;

use super::args::Invocation;
use super::outcome::CommandOutcome;
use crate::error::CoreError;
use crate::model::EntityKind;
use crate::session::Session;

/// Async command body. Receives the session and the bound arguments.
pub type Handler =
    for<'a> fn(&'a Session, &'a Invocation) -> BoxFuture<'a, Result<CommandOutcome, CoreError>>;

/// Turn an `async fn(&Session, &Invocation) -> Result<CommandOutcome, CoreError>`
/// into a [`Handler`].
macro_rules! handler {
    ($f:path) => {{
        fn boxed<'a>(
            session: &'a $crate::session::Session,
            invocation: &'a $crate::command::Invocation,
        ) -> ::futures_util::future::BoxFuture<
            'a,
            Result<$crate::command::CommandOutcome, $crate::error::CoreError>,
        > {
            Box::pin($f(session, invocation))
        }
        boxed as $crate::command::Handler
    }};
}
pub(crate) use handler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Torrent,
    File,
    Peer,
    Tracker,
    Configuration,
    Miscellaneous,
}

/// A registered command.
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub category: Category,
    pub description: &'static str,
    pub usage: &'static [&'static str],
    pub examples: &'static [&'static str],
    pub node: CommandNode,
}

pub enum CommandNode {
    Leaf(Leaf),
    /// Sub-commands, resolved by name or alias.
    Branch(Vec<CommandSpec>),
}

pub struct Leaf {
    pub flags: Vec<FlagSpec>,
    pub positionals: Vec<PositionalSpec>,
    pub handler: Handler,
    /// Whether the command changes daemon state.
    pub mutating: bool,
}

impl CommandSpec {
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }

    pub fn leaf(&self) -> Option<&Leaf> {
        match &self.node {
            CommandNode::Leaf(leaf) => Some(leaf),
            CommandNode::Branch(_) => None,
        }
    }

    pub fn subcommand(&self, name: &str) -> Option<&CommandSpec> {
        match &self.node {
            CommandNode::Leaf(_) => None,
            CommandNode::Branch(subs) => subs.iter().find(|s| s.matches(name)),
        }
    }
}

// ── Arguments ────────────────────────────────────────────────────────

/// How argument text is checked and converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Text,
    Path,
    Integer,
    Filter(EntityKind),
    Sort(EntityKind),
    Columns(EntityKind),
    Choice(&'static [&'static str]),
    /// Bytes per second, or `none`/`unlimited`.
    RateLimit,
    /// Non-negative ratio such as `1.5`.
    Ratio,
    Kind,
}

impl ArgType {
    /// Human description for error messages.
    pub fn expected(self) -> String {
        match self {
            Self::Text => "text".into(),
            Self::Path => "a path".into(),
            Self::Integer => "an integer".into(),
            Self::Filter(kind) => format!("a {kind} filter"),
            Self::Sort(kind) => format!("a {kind} sort order"),
            Self::Columns(kind) => format!("{kind} field names"),
            Self::Choice(choices) => format!("one of {}", choices.join(", ")),
            Self::RateLimit => "a rate such as 500k or 'none'".into(),
            Self::Ratio => "a non-negative number".into(),
            Self::Kind => "one of torrent, peer, file, tracker".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagArity {
    Switch,
    Value,
}

#[derive(Debug, Clone)]
pub struct FlagSpec {
    pub long: &'static str,
    pub short: Option<char>,
    pub arity: FlagArity,
    pub ty: ArgType,
    pub default: Option<&'static str>,
    pub description: &'static str,
}

impl FlagSpec {
    pub fn switch(long: &'static str, short: Option<char>, description: &'static str) -> Self {
        Self {
            long,
            short,
            arity: FlagArity::Switch,
            ty: ArgType::Text,
            default: None,
            description,
        }
    }

    pub fn value(
        long: &'static str,
        short: Option<char>,
        ty: ArgType,
        description: &'static str,
    ) -> Self {
        Self {
            long,
            short,
            arity: FlagArity::Value,
            ty,
            default: None,
            description,
        }
    }

    pub fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    /// `--long/-s VALUE` as shown in help.
    pub fn synopsis(&self) -> String {
        let mut out = format!("--{}", self.long);
        if let Some(short) = self.short {
            out.push_str(&format!("/-{short}"));
        }
        if self.arity == FlagArity::Value {
            out.push_str(" VALUE");
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    One,
    Optional,
    /// Zero or more.
    Many,
    OneOrMore,
}

impl Arity {
    pub(crate) fn min(self) -> usize {
        match self {
            Self::One | Self::OneOrMore => 1,
            Self::Optional | Self::Many => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionalSpec {
    pub name: &'static str,
    pub ty: ArgType,
    pub arity: Arity,
    pub description: &'static str,
}

impl PositionalSpec {
    pub fn new(name: &'static str, ty: ArgType, arity: Arity, description: &'static str) -> Self {
        Self {
            name,
            ty,
            arity,
            description,
        }
    }

    /// `NAME`, `[NAME]`, `[NAME...]` or `NAME...`.
    pub fn synopsis(&self) -> String {
        let upper = self.name.to_ascii_uppercase();
        match self.arity {
            Arity::One => upper,
            Arity::Optional => format!("[{upper}]"),
            Arity::Many => format!("[{upper}...]"),
            Arity::OneOrMore => format!("{upper}..."),
        }
    }
}
