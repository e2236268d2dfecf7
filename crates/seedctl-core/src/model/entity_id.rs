// ── Core identity types ──
//
// Every entity the daemon reports is addressed by an `EntityId`. Torrents
// carry the daemon's numeric id; peers, files and trackers only exist
// inside a torrent and are keyed by (torrent id, sub key).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ── EntityKind ──────────────────────────────────────────────────────

/// The four kinds of records tracked by the cache.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EntityKind {
    Torrent,
    Peer,
    File,
    Tracker,
}

impl EntityKind {
    /// Plural noun for messages ("3 torrents").
    pub fn plural(self) -> &'static str {
        match self {
            Self::Torrent => "torrents",
            Self::Peer => "peers",
            Self::File => "files",
            Self::Tracker => "trackers",
        }
    }
}

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical, totally ordered identifier for any entity.
///
/// Ordering puts torrents first, then files, trackers and peers, each
/// ordered by torrent id and then by their sub key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Torrent(u64),
    File { torrent: u64, index: u64 },
    Tracker { torrent: u64, tracker: u64 },
    Peer { torrent: u64, address: String },
}

impl EntityId {
    /// The torrent this entity belongs to (itself, for torrents).
    pub fn torrent_id(&self) -> u64 {
        match self {
            Self::Torrent(id) => *id,
            Self::File { torrent, .. }
            | Self::Tracker { torrent, .. }
            | Self::Peer { torrent, .. } => *torrent,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Torrent(_) => EntityKind::Torrent,
            Self::File { .. } => EntityKind::File,
            Self::Tracker { .. } => EntityKind::Tracker,
            Self::Peer { .. } => EntityKind::Peer,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Torrent(id) => write!(f, "{id}"),
            Self::File { torrent, index } => write!(f, "{torrent}/{index}"),
            Self::Tracker { torrent, tracker } => write!(f, "{torrent}#{tracker}"),
            Self::Peer { torrent, address } => write!(f, "{torrent}@{address}"),
        }
    }
}

/// Error returned when an id string does not match any id form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity id: {0:?}")]
pub struct ParseEntityIdError(String);

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEntityIdError(s.to_owned());
        let num = |v: &str| v.parse::<u64>().map_err(|_| err());

        if let Some((t, i)) = s.split_once('/') {
            return Ok(Self::File {
                torrent: num(t)?,
                index: num(i)?,
            });
        }
        if let Some((t, k)) = s.split_once('#') {
            return Ok(Self::Tracker {
                torrent: num(t)?,
                tracker: num(k)?,
            });
        }
        if let Some((t, a)) = s.split_once('@') {
            if a.is_empty() {
                return Err(err());
            }
            return Ok(Self::Peer {
                torrent: num(t)?,
                address: a.to_owned(),
            });
        }
        num(s).map(Self::Torrent)
    }
}
