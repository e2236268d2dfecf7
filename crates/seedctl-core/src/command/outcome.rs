// What a command produced, for front-ends to render.

use serde::Serialize;

use crate::field::FieldInfo;
use crate::model::{EntityId, EntityKind};
use crate::remote::AddOutcome;
use crate::script::ScriptReport;
use crate::settings::SettingEntry;
use crate::view::ViewSpec;

#[derive(Debug, Clone)]
pub enum CommandOutcome {
    /// A read-only listing to display (once or live).
    View(ViewSpec),
    Mutation(MutationReport),
    Added(Vec<AddEntry>),
    /// Every field of one torrent.
    Details(Details),
    Magnets(Vec<MagnetLink>),
    Settings(Vec<SettingEntry>),
    Fields {
        kind: EntityKind,
        fields: Vec<FieldInfo>,
    },
    Message(String),
    Help(Help),
    Script(ScriptReport),
    Nothing,
}

impl CommandOutcome {
    /// Partial failures count as failure for chaining.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Mutation(report) => report.is_success(),
            Self::Added(entries) => entries.iter().all(|e| e.result.is_ok()),
            Self::Script(report) => report.is_success(),
            _ => true,
        }
    }
}

// ── Mutations ────────────────────────────────────────────────────────

/// Per-entity result of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "lowercase")]
pub enum EntryOutcome {
    Ok,
    /// The daemon refused this entity.
    Rejected(String),
    /// The call for this entity never got an answer.
    Connectivity(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationEntry {
    pub id: EntityId,
    pub name: String,
    #[serde(flatten)]
    pub outcome: EntryOutcome,
}

impl MutationEntry {
    pub fn is_ok(&self) -> bool {
        self.outcome == EntryOutcome::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    /// Past-tense verb ("stopped").
    pub action: &'static str,
    pub kind: EntityKind,
    pub entries: Vec<MutationEntry>,
}

impl MutationReport {
    pub fn is_success(&self) -> bool {
        self.entries.iter().all(MutationEntry::is_ok)
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &MutationEntry> {
        self.entries.iter().filter(|e| !e.is_ok())
    }

    /// Some entities succeeded and some did not.
    pub fn is_partial(&self) -> bool {
        let ok = self.succeeded();
        ok > 0 && ok < self.entries.len()
    }

    /// Whether every failure was a connectivity failure.
    pub fn is_connectivity_failure(&self) -> bool {
        !self.is_success()
            && self
                .failed()
                .all(|e| matches!(e.outcome, EntryOutcome::Connectivity(_)))
    }
}

// ── Other outcomes ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddEntry {
    pub source: String,
    pub result: Result<AddOutcome, String>,
}

/// One torrent's fields, formatted for display in registry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Details {
    pub id: u64,
    pub name: String,
    pub rows: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MagnetLink {
    pub id: u64,
    pub name: String,
    pub uri: String,
}

/// Preformatted help text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Help {
    pub title: String,
    pub lines: Vec<String>,
}
