// ── Peer domain types ──

use serde::{Deserialize, Serialize};

/// A peer connected to one of our torrents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub torrent_id: u64,
    pub torrent_name: String,
    /// Address as reported by the daemon (IPv4 or IPv6 literal).
    pub host: String,
    pub port: u16,
    pub client: String,
    /// Peer's completion, 0-100.
    pub progress: f64,
    /// Bytes the peer has, estimated from its progress.
    pub downloaded: u64,
    /// Rate we upload to the peer.
    pub rate_up: u64,
    /// Rate we download from the peer.
    pub rate_down: u64,
    pub is_uploading_to: bool,
    pub is_downloading_from: bool,
}

impl Peer {
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn is_seed(&self) -> bool {
        self.progress >= 100.0
    }
}
