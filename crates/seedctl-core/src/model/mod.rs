// ── Domain model ──
//
// Typed records for everything the daemon reports, plus the `Entity`
// trait that ties each record type to its kind, id and field registry.

pub mod entity_id;
pub mod file;
pub mod peer;
pub mod torrent;
pub mod tracker;

use std::fmt;

use serde::Serialize;

pub use entity_id::{EntityId, EntityKind, ParseEntityIdError};
pub use file::{FilePriority, TorrentFile};
pub use peer::Peer;
pub use torrent::{StatusInputs, StatusSet, Torrent, TorrentStatus};
pub use tracker::{Tracker, TrackerStatus, tracker_domain};

use crate::field::FieldRegistry;

/// Common behaviour of every cached record type.
pub trait Entity: Clone + PartialEq + fmt::Debug + Serialize + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    /// The torrent this record belongs to (its own id for torrents).
    fn torrent_id(&self) -> u64;

    /// Short human label for reports ("ubuntu.iso", "10.0.0.1:51413").
    fn label(&self) -> String;

    /// Field and flag definitions for this kind.
    fn registry() -> &'static FieldRegistry<Self>;

    /// Extract records of this kind from a kind-erased list.
    fn from_items(items: EntityItems) -> Option<Vec<Self>>;
}

/// Kind-erased list of records, as returned by a remote listing.
#[derive(Debug, Clone)]
pub enum EntityItems {
    Torrents(Vec<Torrent>),
    Peers(Vec<Peer>),
    Files(Vec<TorrentFile>),
    Trackers(Vec<Tracker>),
}

impl EntityItems {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Torrents(_) => EntityKind::Torrent,
            Self::Peers(_) => EntityKind::Peer,
            Self::Files(_) => EntityKind::File,
            Self::Trackers(_) => EntityKind::Tracker,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Torrents(v) => v.len(),
            Self::Peers(v) => v.len(),
            Self::Files(v) => v.len(),
            Self::Trackers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Torrent => Self::Torrents(Vec::new()),
            EntityKind::Peer => Self::Peers(Vec::new()),
            EntityKind::File => Self::Files(Vec::new()),
            EntityKind::Tracker => Self::Trackers(Vec::new()),
        }
    }
}

impl Entity for Torrent {
    const KIND: EntityKind = EntityKind::Torrent;

    fn id(&self) -> EntityId {
        EntityId::Torrent(self.id)
    }

    fn torrent_id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn registry() -> &'static FieldRegistry<Self> {
        &crate::field::torrent::TORRENT_FIELDS
    }

    fn from_items(items: EntityItems) -> Option<Vec<Self>> {
        match items {
            EntityItems::Torrents(v) => Some(v),
            _ => None,
        }
    }
}

impl Entity for Peer {
    const KIND: EntityKind = EntityKind::Peer;

    fn id(&self) -> EntityId {
        EntityId::Peer {
            torrent: self.torrent_id,
            address: self.address(),
        }
    }

    fn torrent_id(&self) -> u64 {
        self.torrent_id
    }

    fn label(&self) -> String {
        self.address()
    }

    fn registry() -> &'static FieldRegistry<Self> {
        &crate::field::peer::PEER_FIELDS
    }

    fn from_items(items: EntityItems) -> Option<Vec<Self>> {
        match items {
            EntityItems::Peers(v) => Some(v),
            _ => None,
        }
    }
}

impl Entity for TorrentFile {
    const KIND: EntityKind = EntityKind::File;

    fn id(&self) -> EntityId {
        EntityId::File {
            torrent: self.torrent_id,
            index: self.index,
        }
    }

    fn torrent_id(&self) -> u64 {
        self.torrent_id
    }

    fn label(&self) -> String {
        if self.path.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.path, self.name)
        }
    }

    fn registry() -> &'static FieldRegistry<Self> {
        &crate::field::file::FILE_FIELDS
    }

    fn from_items(items: EntityItems) -> Option<Vec<Self>> {
        match items {
            EntityItems::Files(v) => Some(v),
            _ => None,
        }
    }
}

impl Entity for Tracker {
    const KIND: EntityKind = EntityKind::Tracker;

    fn id(&self) -> EntityId {
        EntityId::Tracker {
            torrent: self.torrent_id,
            tracker: self.tracker_id,
        }
    }

    fn torrent_id(&self) -> u64 {
        self.torrent_id
    }

    fn label(&self) -> String {
        self.url_announce.clone()
    }

    fn registry() -> &'static FieldRegistry<Self> {
        &crate::field::tracker::TRACKER_FIELDS
    }

    fn from_items(items: EntityItems) -> Option<Vec<Self>> {
        match items {
            EntityItems::Trackers(v) => Some(v),
            _ => None,
        }
    }
}
