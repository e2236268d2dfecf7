// Wire types for the Transmission RPC protocol.
//
// Field names follow the daemon's camelCase JSON. Every field defaults so
// a `torrent-get` that requested a subset of fields still deserializes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Envelope ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a> {
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
    pub tag: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub arguments: Option<Value>,
    pub result: String,
}

// ── Torrent selection ────────────────────────────────────────────────

/// The `ids` argument accepted by torrent methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ids {
    /// Omit `ids`: every torrent.
    All,
    /// Explicit numeric ids.
    List(Vec<i64>),
    /// `"recently-active"`: torrents changed since the last such query,
    /// with deletions reported in `removed`.
    RecentlyActive,
}

impl Ids {
    pub(crate) fn to_value(&self) -> Option<Value> {
        match self {
            Self::All => None,
            Self::List(ids) => Some(Value::from(ids.clone())),
            Self::RecentlyActive => Some(Value::from("recently-active")),
        }
    }
}

// ── torrent-get ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TorrentGetResponse {
    #[serde(default)]
    pub torrents: Vec<TorrentWire>,
    /// Ids removed since the last `recently-active` query.
    #[serde(default)]
    pub removed: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TorrentWire {
    pub id: i64,
    pub hash_string: String,
    pub name: String,
    pub status: i64,
    pub percent_done: f64,
    pub metadata_percent_complete: f64,
    pub rate_download: i64,
    pub rate_upload: i64,
    pub eta: i64,
    pub upload_ratio: f64,
    pub size_when_done: i64,
    pub total_size: i64,
    pub left_until_done: i64,
    pub downloaded_ever: i64,
    pub uploaded_ever: i64,
    pub download_dir: String,
    pub comment: String,
    pub is_private: bool,
    pub error: i64,
    pub error_string: String,
    pub peers_connected: i64,
    pub peers_sending_to_us: i64,
    pub peers_getting_from_us: i64,
    pub date_created: i64,
    pub added_date: i64,
    pub start_date: i64,
    pub activity_date: i64,
    pub done_date: i64,
    pub download_limited: bool,
    /// KB/s
    pub download_limit: i64,
    pub upload_limited: bool,
    /// KB/s
    pub upload_limit: i64,
    pub magnet_link: String,
    pub seed_ratio_limit: f64,
    /// 0 follows the session limit, 1 uses `seed_ratio_limit`, 2 seeds forever.
    pub seed_ratio_mode: i64,
    pub tracker_stats: Vec<TrackerStatWire>,
    pub peers: Vec<PeerWire>,
    pub files: Vec<FileWire>,
    pub file_stats: Vec<FileStatWire>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeerWire {
    pub address: String,
    pub port: u16,
    pub client_name: String,
    pub progress: f64,
    /// Bytes/s the peer sends to us.
    pub rate_to_client: i64,
    /// Bytes/s we send to the peer.
    pub rate_to_peer: i64,
    pub is_downloading_from: bool,
    pub is_uploading_to: bool,
    pub flag_str: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileWire {
    pub name: String,
    pub length: i64,
    pub bytes_completed: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileStatWire {
    pub bytes_completed: i64,
    pub wanted: bool,
    /// -1 low, 0 normal, 1 high
    pub priority: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerStatWire {
    pub id: i64,
    pub tier: i64,
    pub announce: String,
    pub scrape: String,
    pub host: String,
    pub announce_state: i64,
    pub scrape_state: i64,
    pub has_announced: bool,
    pub last_announce_succeeded: bool,
    pub last_announce_result: String,
    pub last_announce_time: i64,
    pub next_announce_time: i64,
    pub has_scraped: bool,
    pub last_scrape_succeeded: bool,
    pub last_scrape_result: String,
    pub last_scrape_time: i64,
    pub next_scrape_time: i64,
    pub download_count: i64,
    pub leecher_count: i64,
    pub seeder_count: i64,
}

// ── torrent-set ──────────────────────────────────────────────────────

/// Optional mutations accepted by `torrent-set`. Unset fields are omitted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TorrentSetArgs {
    #[serde(rename = "files-wanted", skip_serializing_if = "Option::is_none")]
    pub files_wanted: Option<Vec<i64>>,
    #[serde(rename = "files-unwanted", skip_serializing_if = "Option::is_none")]
    pub files_unwanted: Option<Vec<i64>>,
    #[serde(rename = "priority-high", skip_serializing_if = "Option::is_none")]
    pub priority_high: Option<Vec<i64>>,
    #[serde(rename = "priority-normal", skip_serializing_if = "Option::is_none")]
    pub priority_normal: Option<Vec<i64>>,
    #[serde(rename = "priority-low", skip_serializing_if = "Option::is_none")]
    pub priority_low: Option<Vec<i64>>,
    #[serde(rename = "trackerAdd", skip_serializing_if = "Option::is_none")]
    pub tracker_add: Option<Vec<String>>,
    #[serde(rename = "trackerRemove", skip_serializing_if = "Option::is_none")]
    pub tracker_remove: Option<Vec<i64>>,
    #[serde(rename = "uploadLimited", skip_serializing_if = "Option::is_none")]
    pub upload_limited: Option<bool>,
    #[serde(rename = "uploadLimit", skip_serializing_if = "Option::is_none")]
    pub upload_limit: Option<i64>,
    #[serde(rename = "downloadLimited", skip_serializing_if = "Option::is_none")]
    pub download_limited: Option<bool>,
    #[serde(rename = "downloadLimit", skip_serializing_if = "Option::is_none")]
    pub download_limit: Option<i64>,
    #[serde(rename = "seedRatioLimit", skip_serializing_if = "Option::is_none")]
    pub seed_ratio_limit: Option<f64>,
    #[serde(rename = "seedRatioMode", skip_serializing_if = "Option::is_none")]
    pub seed_ratio_mode: Option<i64>,
}

// ── torrent-add ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TorrentAddResponse {
    #[serde(rename = "torrent-added", alias = "torrentAdded")]
    pub torrent_added: Option<TorrentRef>,
    #[serde(rename = "torrent-duplicate", alias = "torrentDuplicate")]
    pub torrent_duplicate: Option<TorrentRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentRef {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hash_string: String,
}

// ── session-get ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SessionInfo {
    pub version: String,
    pub rpc_version: i64,
    pub download_dir: String,
}
