// ── Field registry ──
//
// Typed field and flag definitions per entity kind, plus the value,
// unit and ordering helpers the filter language and formatters share.

pub mod file;
pub mod natural;
pub mod peer;
pub mod registry;
pub mod torrent;
pub mod tracker;
pub mod units;
pub mod value;

pub use natural::natural_cmp;
pub use registry::{Collation, FieldInfo, FieldRegistry, FieldSpec, FlagSpec, Resolved};
pub use units::{FormatOptions, Prefix, Unit, UnitStyle, format_value};
pub use value::{UNKNOWN_DURATION, UNLIMITED, Value, ValueType};

use crate::model::{Entity, EntityKind, Peer, Torrent, TorrentFile, Tracker};

/// Every field and flag of `kind`, fields first.
pub fn list(kind: EntityKind) -> Vec<FieldInfo> {
    match kind {
        EntityKind::Torrent => Torrent::registry().info(),
        EntityKind::Peer => Peer::registry().info(),
        EntityKind::File => TorrentFile::registry().info(),
        EntityKind::Tracker => Tracker::registry().info(),
    }
}

/// Look up a field or flag of `kind` by name or alias.
pub fn describe(kind: EntityKind, name: &str) -> Option<FieldInfo> {
    fn lookup<E: Entity>(name: &str) -> Option<FieldInfo> {
        match E::registry().resolve(name)? {
            Resolved::Field(f) => Some(f.info()),
            Resolved::Flag(f) => Some(f.info()),
        }
    }
    match kind {
        EntityKind::Torrent => lookup::<Torrent>(name),
        EntityKind::Peer => lookup::<Peer>(name),
        EntityKind::File => lookup::<TorrentFile>(name),
        EntityKind::Tracker => lookup::<Tracker>(name),
    }
}

/// Canonical field name for `name` (not flags), used to validate columns.
pub fn canonical_field(kind: EntityKind, name: &str) -> Option<&'static str> {
    fn lookup<E: Entity>(name: &str) -> Option<&'static str> {
        E::registry().field(name).map(|f| f.name)
    }
    match kind {
        EntityKind::Torrent => lookup::<Torrent>(name),
        EntityKind::Peer => lookup::<Peer>(name),
        EntityKind::File => lookup::<TorrentFile>(name),
        EntityKind::Tracker => lookup::<Tracker>(name),
    }
}
