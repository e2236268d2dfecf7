// Bound command arguments.

use std::collections::BTreeMap;

use crate::filter::{Filter, SortOrder};
use crate::model::EntityKind;

/// A converted flag or positional value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Bool(bool),
    Text(String),
    Integer(i64),
    Filter(Filter),
    Sort(SortOrder),
    Columns(Vec<&'static str>),
    /// Bytes per second; `None` is unlimited.
    RateLimit(Option<u64>),
    Number(f64),
    Kind(EntityKind),
    /// Values of a repeated positional, filters excluded (those are
    /// OR-combined into one `Filter`).
    List(Vec<ArgValue>),
}

impl ArgValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A command ready to run: its resolved path plus converted arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Canonical names from the top-level command down to the leaf.
    pub path: Vec<&'static str>,
    pub flags: BTreeMap<&'static str, ArgValue>,
    pub positionals: BTreeMap<&'static str, ArgValue>,
}

impl Invocation {
    pub fn new(path: Vec<&'static str>) -> Self {
        Self {
            path,
            flags: BTreeMap::new(),
            positionals: BTreeMap::new(),
        }
    }

    /// "tracker add"
    pub fn command(&self) -> String {
        self.path.join(" ")
    }

    fn get(&self, name: &str) -> Option<&ArgValue> {
        self.flags.get(name).or_else(|| self.positionals.get(name))
    }

    /// Switch state; absent switches are off.
    pub fn switch(&self, name: &str) -> bool {
        matches!(self.get(name), Some(ArgValue::Bool(true)))
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_text)
    }

    /// Every text value of a repeated positional, or the single value.
    pub fn texts(&self, name: &str) -> Vec<&str> {
        match self.get(name) {
            Some(ArgValue::List(items)) => items.iter().filter_map(ArgValue::as_text).collect(),
            Some(ArgValue::Text(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ArgValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        match self.get(name) {
            Some(ArgValue::Filter(f)) => Some(f),
            _ => None,
        }
    }

    /// The filter argument, or match-everything when omitted.
    pub fn filter_or_all(&self, name: &str, kind: EntityKind) -> Filter {
        self.filter(name)
            .cloned()
            .unwrap_or_else(|| Filter::all(kind))
    }

    pub fn sort(&self, name: &str) -> Option<&SortOrder> {
        match self.get(name) {
            Some(ArgValue::Sort(s)) => Some(s),
            _ => None,
        }
    }

    pub fn columns(&self, name: &str) -> Option<&[&'static str]> {
        match self.get(name) {
            Some(ArgValue::Columns(c)) => Some(c),
            _ => None,
        }
    }

    pub fn rate_limit(&self, name: &str) -> Option<Option<u64>> {
        match self.get(name) {
            Some(ArgValue::RateLimit(limit)) => Some(*limit),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn kind(&self, name: &str) -> Option<EntityKind> {
        match self.get(name) {
            Some(ArgValue::Kind(kind)) => Some(*kind),
            _ => None,
        }
    }
}
