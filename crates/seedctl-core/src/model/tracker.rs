// ── Tracker domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Announce state of a tracker. Scrape-only states report as `Scraping`.
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
pub enum TrackerStatus {
    Stopped,
    Idle,
    Queued,
    Announcing,
    Scraping,
}

impl TrackerStatus {
    pub fn name(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Announcing => "announcing",
            Self::Scraping => "scraping",
        }
    }

    pub fn names() -> &'static [&'static str] {
        &["stopped", "idle", "queued", "announcing", "scraping"]
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Combine the daemon's announce and scrape state codes.
    pub fn from_wire(announce_state: i64, scrape_state: i64) -> Self {
        match (announce_state, scrape_state) {
            (3, _) => Self::Announcing,
            (_, 3) => Self::Scraping,
            (2, _) => Self::Queued,
            (1, _) => Self::Idle,
            _ => Self::Stopped,
        }
    }
}

/// A tracker attached to a torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub torrent_id: u64,
    pub torrent_name: String,
    /// Daemon-assigned tracker id, unique within the torrent.
    pub tracker_id: u64,
    pub tier: u64,
    pub url_announce: String,
    pub url_scrape: String,
    pub domain: String,
    pub status: TrackerStatus,
    /// Last announce or scrape error message; empty when healthy.
    pub error: String,
    pub downloads: Option<u64>,
    pub leeches: Option<u64>,
    pub seeds: Option<u64>,
    pub last_announce: Option<DateTime<Utc>>,
    pub next_announce: Option<DateTime<Utc>>,
    pub last_scrape: Option<DateTime<Utc>>,
    pub next_scrape: Option<DateTime<Utc>>,
}

impl Tracker {
    pub fn is_alive(&self) -> bool {
        self.error.is_empty() && self.status != TrackerStatus::Stopped
    }
}

/// Registered host of a tracker URL, or the raw string when it does not parse.
pub fn tracker_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
