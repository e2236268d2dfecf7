// ── Torrent file domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Download priority of a single file. `Off` means the file is unwanted.
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
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FilePriority {
    Off,
    Low,
    Normal,
    High,
}

impl FilePriority {
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    pub fn names() -> &'static [&'static str] {
        &["off", "low", "normal", "high"]
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Map the daemon's (wanted, priority) pair.
    pub fn from_wire(wanted: bool, priority: i64) -> Self {
        match (wanted, priority) {
            (false, _) => Self::Off,
            (true, p) if p < 0 => Self::Low,
            (true, 0) => Self::Normal,
            (true, _) => Self::High,
        }
    }
}

/// One file inside a torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentFile {
    pub torrent_id: u64,
    pub torrent_name: String,
    /// Index within the torrent's file list.
    pub index: u64,
    /// Base name.
    pub name: String,
    /// Directory part of the path inside the torrent, `/`-separated.
    pub path: String,
    pub size: u64,
    pub downloaded: u64,
    pub priority: FilePriority,
}

impl TorrentFile {
    pub fn is_wanted(&self) -> bool {
        self.priority != FilePriority::Off
    }

    pub fn is_complete(&self) -> bool {
        self.downloaded >= self.size
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn percent_downloaded(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.downloaded as f64 / self.size as f64 * 100.0
        }
    }
}
