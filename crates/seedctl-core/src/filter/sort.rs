// ── Sort orders ──

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::error::FilterError;
use crate::field::{Collation, Value, natural_cmp};
use crate::model::{Entity, EntityId, EntityKind, Peer, Torrent, TorrentFile, Tracker};

/// One sort key: a canonical field name and whether its natural
/// direction is reversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: &'static str,
    pub inverted: bool,
}

/// Ordered list of sort keys for one entity kind. Ties after the last key
/// resolve by `EntityId` ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    kind: EntityKind,
    keys: Vec<SortField>,
}

impl SortOrder {
    /// Sort by id only.
    pub fn by_id(kind: EntityKind) -> Self {
        Self {
            kind,
            keys: Vec::new(),
        }
    }

    /// Parse `name,!ratio .size` style key lists for `E`.
    pub fn parse<E: Entity>(text: &str) -> Result<Self, FilterError> {
        let registry = E::registry();
        let mut keys: Vec<SortField> = Vec::new();

        for (offset, token) in split_keys(text) {
            let (inverted, name) = match token.strip_prefix(['!', '.']) {
                Some(rest) => (true, rest),
                None => (false, token),
            };
            let Some(spec) = registry.field(name) else {
                return Err(FilterError::UnknownField {
                    kind: E::KIND,
                    name: name.to_owned(),
                    offset,
                });
            };
            if keys.iter().any(|k| k.field == spec.name) {
                continue;
            }
            keys.push(SortField {
                field: spec.name,
                inverted,
            });
        }
        Ok(Self { kind: E::KIND, keys })
    }

    /// Kind-erased [`SortOrder::parse`].
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

    pub fn keys(&self) -> &[SortField] {
        &self.keys
    }

    /// Key tuple for `entity`; comparing keys orders entities.
    pub fn sort_key<'a, E: Entity>(&self, entity: &'a E) -> SortKey<'a> {
        let registry = E::registry();
        let parts = self
            .keys
            .iter()
            .filter_map(|k| {
                let spec = registry.field(k.field)?;
                Some(KeyPart {
                    value: spec.value(entity),
                    collation: spec.collation,
                    descending: spec.descending != k.inverted,
                })
            })
            .collect();
        SortKey {
            parts,
            id: entity.id(),
        }
    }

    pub fn compare<E: Entity>(&self, a: &E, b: &E) -> Ordering {
        self.sort_key(a).cmp(&self.sort_key(b))
    }

    /// Sort `items` in place. The result does not depend on input order.
    pub fn apply<E: Entity>(&self, items: &mut [Arc<E>]) {
        items.sort_by(|a, b| self.compare(a.as_ref(), b.as_ref()));
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, k) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if k.inverted {
                f.write_str("!")?;
            }
            f.write_str(k.field)?;
        }
        Ok(())
    }
}

/// Split on commas and whitespace, keeping byte offsets.
fn split_keys(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut start = None;
    let mut out = Vec::new();
    for (i, c) in text.char_indices() {
        if c == ',' || c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, &text[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, &text[s..]));
    }
    out.into_iter()
}

#[derive(Debug)]
struct KeyPart<'a> {
    value: Value<'a>,
    collation: Collation,
    descending: bool,
}

/// Comparable key produced by [`SortOrder::sort_key`].
#[derive(Debug)]
pub struct SortKey<'a> {
    parts: Vec<KeyPart<'a>>,
    id: EntityId,
}

impl Ord for SortKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.parts.iter().zip(&other.parts) {
            let ord = match (a.collation, &a.value, &b.value) {
                (Collation::Natural, Value::Text(x), Value::Text(y)) => natural_cmp(x, y),
                _ => a.value.compare(&b.value),
            };
            let ord = if a.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.id.cmp(&other.id)
    }
}

impl PartialOrd for SortKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey<'_> {}
