// ── Torrent domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Activity states a torrent can be in at the same time.
///
/// Variant order is the display and sort precedence: the first status in
/// a torrent's set is its primary status.
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
pub enum TorrentStatus {
    Verifying,
    Downloading,
    Uploading,
    Discovering,
    Connected,
    Isolated,
    Queued,
    Idle,
    Stopped,
    Seeding,
}

impl TorrentStatus {
    /// Position in the precedence order.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Verifying => "verifying",
            Self::Downloading => "downloading",
            Self::Uploading => "uploading",
            Self::Discovering => "discovering",
            Self::Connected => "connected",
            Self::Isolated => "isolated",
            Self::Queued => "queued",
            Self::Idle => "idle",
            Self::Stopped => "stopped",
            Self::Seeding => "seeding",
        }
    }

    /// All status names in precedence order.
    pub fn names() -> &'static [&'static str] {
        &[
            "verifying",
            "downloading",
            "uploading",
            "discovering",
            "connected",
            "isolated",
            "queued",
            "idle",
            "stopped",
            "seeding",
        ]
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

/// Sorted, deduplicated set of statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusSet(Vec<TorrentStatus>);

impl StatusSet {
    pub fn new(mut statuses: Vec<TorrentStatus>) -> Self {
        statuses.sort_unstable();
        statuses.dedup();
        Self(statuses)
    }

    pub fn contains(&self, status: TorrentStatus) -> bool {
        self.0.binary_search(&status).is_ok()
    }

    /// Highest-precedence status; torrents with no status read as idle.
    pub fn primary(&self) -> TorrentStatus {
        self.0.first().copied().unwrap_or(TorrentStatus::Idle)
    }

    pub fn iter(&self) -> impl Iterator<Item = TorrentStatus> + '_ {
        self.0.iter().copied()
    }
}

/// Inputs to status computation, taken verbatim from the daemon.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusInputs {
    /// Daemon activity code: 0 stopped, 1/2 verify, 3/4 download, 5/6 seed.
    pub code: i64,
    pub metadata_percent: f64,
    pub percent_done: f64,
    pub peers_connected: u64,
    pub peers_sending: u64,
    pub peers_getting: u64,
    pub rate_down: u64,
    pub rate_up: u64,
    pub isolated: bool,
}

impl StatusInputs {
    /// Derive the status set from raw daemon state.
    pub fn compute(&self) -> StatusSet {
        let mut out = Vec::new();
        match self.code {
            0 => out.push(TorrentStatus::Stopped),
            1 | 2 => out.push(TorrentStatus::Verifying),
            _ => {}
        }
        if matches!(self.code, 1 | 3 | 5) {
            out.push(TorrentStatus::Queued);
        }
        if self.isolated {
            out.push(TorrentStatus::Isolated);
        }
        if self.metadata_percent < 1.0 {
            out.push(TorrentStatus::Discovering);
        } else if self.peers_sending > 0 && self.rate_down > 0 {
            out.push(TorrentStatus::Downloading);
        }
        if self.peers_getting > 0 && self.rate_up > 0 {
            out.push(TorrentStatus::Uploading);
        }
        if self.peers_connected > 0 {
            out.push(TorrentStatus::Connected);
        }
        if self.percent_done >= 1.0 {
            out.push(TorrentStatus::Seeding);
        }
        if !out.iter().any(|s| {
            matches!(
                s,
                TorrentStatus::Uploading | TorrentStatus::Downloading | TorrentStatus::Verifying
            )
        }) {
            out.push(TorrentStatus::Idle);
        }
        StatusSet::new(out)
    }
}

/// A torrent as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Torrent {
    pub id: u64,
    pub hash: String,
    pub name: String,
    /// Download directory.
    pub path: String,
    pub comment: String,
    pub error: String,
    pub status: StatusSet,
    pub private: bool,

    // Sizes (bytes)
    /// Bytes wanted.
    pub size: u64,
    /// Bytes of wanted data already verified locally.
    pub have: u64,
    /// Bytes downloaded over the torrent's lifetime.
    pub downloaded: u64,
    pub uploaded: u64,

    /// Upload ratio; `f64::INFINITY` when nothing was downloaded.
    pub ratio: f64,
    pub rate_up: u64,
    pub rate_down: u64,
    pub limit_rate_up: Option<u64>,
    pub limit_rate_down: Option<u64>,
    /// Per-torrent seed ratio limit; `None` follows the daemon's global
    /// limit, infinity seeds regardless of ratio.
    pub limit_ratio: Option<f64>,

    pub peers: u64,
    /// Largest seeder count any tracker reported.
    pub seeds: Option<u64>,
    /// Seconds until complete; `None` when unknown.
    pub eta: Option<i64>,

    pub tracker: String,
    pub magnet: String,
    pub created: Option<DateTime<Utc>>,
    pub added: Option<DateTime<Utc>>,
    pub started: Option<DateTime<Utc>>,
    pub activity: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
}

impl Torrent {
    pub fn is_complete(&self) -> bool {
        self.size > 0 && self.have >= self.size
    }

    /// Percent of wanted bytes present; 0 when nothing is wanted.
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_downloaded(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.have as f64 / self.size as f64 * 100.0
        }
    }
}
