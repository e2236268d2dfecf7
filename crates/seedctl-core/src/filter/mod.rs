// ── Filter language ──
//
// Parses filter expressions like `seeds>50 & !private | name~ubuntu` into
// predicate trees evaluated against cached entities, and sort key lists
// like `!ratio,name`.

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod render;
mod sort;

use std::fmt;

use chrono::Utc;

pub use ast::{CmpOp, Comparison, Operand, Pattern, Predicate};
pub use error::FilterError;
pub use sort::{SortField, SortKey, SortOrder};

pub(crate) use render::quote;

use crate::model::{Entity, EntityKind, Peer, Torrent, TorrentFile, Tracker};

/// A parsed filter for one entity kind. An absent root matches everything.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    kind: EntityKind,
    root: Option<Predicate>,
}

impl Filter {
    /// The filter that matches every entity of `kind`.
    pub fn all(kind: EntityKind) -> Self {
        Self { kind, root: None }
    }

    /// Parse `text` for entities of type `E`, resolving relative
    /// timestamps against the current time.
    pub fn parse<E: Entity>(text: &str) -> Result<Self, FilterError> {
        Self::parse_at::<E>(text, Utc::now().timestamp())
    }

    /// Parse with an explicit "now" (unix seconds).
    pub fn parse_at<E: Entity>(text: &str, now: i64) -> Result<Self, FilterError> {
        Ok(Self {
            kind: E::KIND,
            root: parser::parse(E::registry(), text, now)?,
        })
    }

    /// Kind-erased [`Filter::parse`].
    pub fn parse_for(kind: EntityKind, text: &str) -> Result<Self, FilterError> {
        match kind {
            EntityKind::Torrent => Self::parse::<Torrent>(text),
            EntityKind::Peer => Self::parse::<Peer>(text),
            EntityKind::File => Self::parse::<TorrentFile>(text),
            EntityKind::Tracker => Self::parse::<Tracker>(text),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn root(&self) -> Option<&Predicate> {
        self.root.as_ref()
    }

    pub fn is_all(&self) -> bool {
        self.root.is_none()
    }

    /// Whether `entity` satisfies the filter. Entities of another kind
    /// never match.
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        if E::KIND != self.kind {
            return false;
        }
        self.root
            .as_ref()
            .is_none_or(|p| eval::eval(E::registry(), p, entity))
    }

    /// Disjunction; matching everything absorbs the other side.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        let root = match (self.root, other.root) {
            (Some(a), Some(b)) => Some(a.or(b)),
            _ => None,
        };
        Self {
            kind: self.kind,
            root,
        }
    }

    /// Conjunction; matching everything is the identity.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let root = match (self.root, other.root) {
            (Some(a), Some(b)) => Some(a.and(b)),
            (a, b) => a.or(b),
        };
        Self {
            kind: self.kind,
            root,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(p) => p.fmt(f),
            None => Ok(()),
        }
    }
}
