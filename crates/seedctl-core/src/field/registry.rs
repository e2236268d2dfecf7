// ── Field registries ──
//
// One registry per entity kind maps field and flag names (and aliases)
// to typed accessors. Registries are built once into `LazyLock` statics.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::natural::natural_cmp;
use super::value::{Value, ValueType};
use crate::model::EntityKind;

/// Reads one field from an entity. Accessors are total.
pub type Getter<E> = for<'a> fn(&'a E) -> Value<'a>;

/// Tests one boolean flag on an entity.
pub type FlagTest<E> = fn(&E) -> bool;

/// How text values of a field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collation {
    Plain,
    Natural,
}

/// A typed, named attribute of entities of kind `E`.
pub struct FieldSpec<E> {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub ty: ValueType,
    pub description: &'static str,
    pub header: &'static str,
    pub width: u16,
    pub collation: Collation,
    /// Natural sort direction is most-significant-first.
    pub descending: bool,
    /// Relative timestamp literals resolve into the future.
    pub future: bool,
    /// Allowed names for status-typed fields, in rank order.
    pub choices: &'static [&'static str],
    get: Getter<E>,
}

impl<E> FieldSpec<E> {
    pub fn new(
        name: &'static str,
        ty: ValueType,
        description: &'static str,
        get: Getter<E>,
    ) -> Self {
        Self {
            name,
            aliases: &[],
            ty,
            description,
            header: name,
            width: 8,
            collation: Collation::Plain,
            descending: false,
            future: false,
            choices: &[],
            get,
        }
    }

    pub fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn header(mut self, header: &'static str, width: u16) -> Self {
        self.header = header;
        self.width = width;
        self
    }

    pub fn natural(mut self) -> Self {
        self.collation = Collation::Natural;
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn future(mut self) -> Self {
        self.future = true;
        self
    }

    pub fn choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }

    pub fn value<'a>(&self, entity: &'a E) -> Value<'a> {
        (self.get)(entity)
    }

    /// Compare two values of this field in ascending order.
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        match (self.collation, a, b) {
            (Collation::Natural, Value::Text(x), Value::Text(y)) => natural_cmp(x, y),
            _ => a.compare(b),
        }
    }

    pub fn info(&self) -> FieldInfo {
        FieldInfo {
            name: self.name,
            aliases: self.aliases.to_vec(),
            ty: Some(self.ty),
            description: self.description,
            is_flag: false,
        }
    }
}

/// A named boolean test on entities of kind `E`.
pub struct FlagSpec<E> {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    test: FlagTest<E>,
}

impl<E> FlagSpec<E> {
    pub fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        description: &'static str,
        test: FlagTest<E>,
    ) -> Self {
        Self {
            name,
            aliases,
            description,
            test,
        }
    }

    pub fn test(&self, entity: &E) -> bool {
        (self.test)(entity)
    }

    pub fn info(&self) -> FieldInfo {
        FieldInfo {
            name: self.name,
            aliases: self.aliases.to_vec(),
            ty: None,
            description: self.description,
            is_flag: true,
        }
    }
}

/// Kind-erased description of a field or flag, for help output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    pub aliases: Vec<&'static str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<ValueType>,
    pub description: &'static str,
    pub is_flag: bool,
}

/// Result of looking a name up in a registry.
pub enum Resolved<'r, E> {
    Field(&'r FieldSpec<E>),
    Flag(&'r FlagSpec<E>),
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Field(usize),
    Flag(usize),
}

pub struct FieldRegistry<E> {
    kind: EntityKind,
    fields: Vec<FieldSpec<E>>,
    flags: Vec<FlagSpec<E>>,
    index: HashMap<&'static str, Slot>,
    default_field: usize,
}

impl<E> FieldRegistry<E> {
    /// Build a registry. `default_field` names the field bare words match.
    pub fn new(
        kind: EntityKind,
        default_field: &'static str,
        fields: Vec<FieldSpec<E>>,
        flags: Vec<FlagSpec<E>>,
    ) -> Self {
        let mut index = HashMap::new();
        for (i, f) in fields.iter().enumerate() {
            for name in std::iter::once(&f.name).chain(f.aliases) {
                let prev = index.insert(*name, Slot::Field(i));
                debug_assert!(prev.is_none(), "duplicate {kind} name {name}");
            }
        }
        for (i, f) in flags.iter().enumerate() {
            for name in std::iter::once(&f.name).chain(f.aliases) {
                let prev = index.insert(*name, Slot::Flag(i));
                debug_assert!(prev.is_none(), "duplicate {kind} name {name}");
            }
        }
        let default_field = fields
            .iter()
            .position(|f| f.name == default_field)
            .unwrap_or_default();
        Self {
            kind,
            fields,
            flags,
            index,
            default_field,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Look up a field or flag by canonical name or alias.
    pub fn resolve(&self, name: &str) -> Option<Resolved<'_, E>> {
        let slot = match self.index.get(name) {
            Some(slot) => *slot,
            None => *self.index.get(name.to_ascii_lowercase().as_str())?,
        };
        match slot {
            Slot::Field(i) => self.fields.get(i).map(Resolved::Field),
            Slot::Flag(i) => self.flags.get(i).map(Resolved::Flag),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec<E>> {
        match self.resolve(name)? {
            Resolved::Field(f) => Some(f),
            Resolved::Flag(_) => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<&FlagSpec<E>> {
        match self.resolve(name)? {
            Resolved::Flag(f) => Some(f),
            Resolved::Field(_) => None,
        }
    }

    pub fn fields(&self) -> &[FieldSpec<E>] {
        &self.fields
    }

    pub fn flags(&self) -> &[FlagSpec<E>] {
        &self.flags
    }

    /// Field that bare words and field-less operators target.
    pub fn default_field(&self) -> Option<&FieldSpec<E>> {
        self.fields.get(self.default_field)
    }

    pub fn info(&self) -> Vec<FieldInfo> {
        self.fields
            .iter()
            .map(FieldSpec::info)
            .chain(self.flags.iter().map(FlagSpec::info))
            .collect()
    }
}
