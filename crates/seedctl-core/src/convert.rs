// ── Wire-to-domain conversions ──
//
// Bridges raw `seedctl_api` torrent listings into the typed model. The
// daemon reports sentinels (-1, 0) for unknown values; these become
// `None` here so accessors can apply their own ordering sentinels.

use chrono::{DateTime, Utc};

use seedctl_api::{TorrentWire, TrackerStatWire};

use crate::model::{
    FilePriority, Peer, StatusInputs, Torrent, TorrentFile, Tracker, TrackerStatus,
    tracker_domain,
};

// ── Helpers ────────────────────────────────────────────────────────

fn epoch(secs: i64) -> Option<DateTime<Utc>> {
    (secs > 0).then(|| DateTime::from_timestamp(secs, 0)).flatten()
}

fn unsigned(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

fn known(n: i64) -> Option<u64> {
    u64::try_from(n).ok()
}

/// Transmission speed limits are in kB/s.
fn limit(enabled: bool, kilobytes: i64) -> Option<u64> {
    enabled.then(|| unsigned(kilobytes).saturating_mul(1000))
}

/// Seed ratio mode 1 is a per-torrent limit, 2 is unlimited and anything
/// else defers to the session.
fn ratio_limit(mode: i64, limit: f64) -> Option<f64> {
    match mode {
        1 => Some(limit.max(0.0)),
        2 => Some(f64::INFINITY),
        _ => None,
    }
}

/// -1 means not available, -2 means infinite.
fn ratio(raw: f64) -> f64 {
    if (raw + 2.0).abs() < f64::EPSILON {
        f64::INFINITY
    } else if raw < 0.0 {
        0.0
    } else {
        raw
    }
}

/// Private torrent whose trackers have been asked and none answered.
fn is_isolated(w: &TorrentWire) -> bool {
    if !w.is_private {
        return false;
    }
    if w.tracker_stats.is_empty() {
        return true;
    }
    w.tracker_stats.iter().any(|t| t.has_announced)
        && !w.tracker_stats.iter().any(|t| t.last_announce_succeeded)
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn fraction_of(total: u64, fraction: f64) -> u64 {
    (total as f64 * fraction.clamp(0.0, 1.0)).round() as u64
}

// ── Torrent ────────────────────────────────────────────────────────

impl From<&TorrentWire> for Torrent {
    fn from(w: &TorrentWire) -> Self {
        let size = unsigned(w.size_when_done);
        let have = size.saturating_sub(unsigned(w.left_until_done));
        let status = StatusInputs {
            code: w.status,
            metadata_percent: w.metadata_percent_complete,
            percent_done: w.percent_done,
            peers_connected: unsigned(w.peers_connected),
            peers_sending: unsigned(w.peers_sending_to_us),
            peers_getting: unsigned(w.peers_getting_from_us),
            rate_down: unsigned(w.rate_download),
            rate_up: unsigned(w.rate_upload),
            isolated: is_isolated(w),
        }
        .compute();

        let first_tracker = w.tracker_stats.iter().min_by_key(|t| (t.tier, t.id));

        Self {
            id: unsigned(w.id),
            hash: w.hash_string.clone(),
            name: w.name.clone(),
            path: w.download_dir.clone(),
            comment: w.comment.clone(),
            error: w.error_string.clone(),
            status,
            private: w.is_private,
            size,
            have,
            downloaded: unsigned(w.downloaded_ever),
            uploaded: unsigned(w.uploaded_ever),
            ratio: ratio(w.upload_ratio),
            rate_up: unsigned(w.rate_upload),
            rate_down: unsigned(w.rate_download),
            limit_rate_up: limit(w.upload_limited, w.upload_limit),
            limit_rate_down: limit(w.download_limited, w.download_limit),
            limit_ratio: ratio_limit(w.seed_ratio_mode, w.seed_ratio_limit),
            peers: unsigned(w.peers_connected),
            seeds: w.tracker_stats.iter().filter_map(|t| known(t.seeder_count)).max(),
            eta: (w.eta >= 0).then_some(w.eta),
            tracker: first_tracker.map(|t| tracker_domain(&t.announce)).unwrap_or_default(),
            magnet: w.magnet_link.clone(),
            created: epoch(w.date_created),
            added: epoch(w.added_date),
            started: epoch(w.start_date),
            activity: epoch(w.activity_date),
            completed: epoch(w.done_date),
        }
    }
}

// ── Sub-entities ───────────────────────────────────────────────────

pub(crate) fn peers(w: &TorrentWire) -> Vec<Peer> {
    let total = unsigned(w.total_size);
    w.peers
        .iter()
        .map(|p| Peer {
            torrent_id: unsigned(w.id),
            torrent_name: w.name.clone(),
            host: p.address.clone(),
            port: p.port,
            client: p.client_name.clone(),
            progress: p.progress * 100.0,
            downloaded: fraction_of(total, p.progress),
            rate_up: unsigned(p.rate_to_peer),
            rate_down: unsigned(p.rate_to_client),
            is_uploading_to: p.is_uploading_to,
            is_downloading_from: p.is_downloading_from,
        })
        .collect()
}

pub(crate) fn files(w: &TorrentWire) -> Vec<TorrentFile> {
    w.files
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let stat = w.file_stats.get(i);
            let (dir, name) = match f.name.rsplit_once('/') {
                Some((dir, name)) => (dir.to_owned(), name.to_owned()),
                None => (String::new(), f.name.clone()),
            };
            TorrentFile {
                torrent_id: unsigned(w.id),
                torrent_name: w.name.clone(),
                index: u64::try_from(i).unwrap_or(u64::MAX),
                name,
                path: dir,
                size: unsigned(f.length),
                downloaded: unsigned(stat.map_or(f.bytes_completed, |s| s.bytes_completed)),
                priority: stat.map_or(FilePriority::Normal, |s| {
                    FilePriority::from_wire(s.wanted, s.priority)
                }),
            }
        })
        .collect()
}

fn tracker_error(t: &TrackerStatWire) -> String {
    if t.has_announced && !t.last_announce_succeeded {
        t.last_announce_result.clone()
    } else if t.has_scraped && !t.last_scrape_succeeded {
        t.last_scrape_result.clone()
    } else {
        String::new()
    }
}

pub(crate) fn trackers(w: &TorrentWire) -> Vec<Tracker> {
    w.tracker_stats
        .iter()
        .map(|t| Tracker {
            torrent_id: unsigned(w.id),
            torrent_name: w.name.clone(),
            tracker_id: unsigned(t.id),
            tier: unsigned(t.tier),
            url_announce: t.announce.clone(),
            url_scrape: t.scrape.clone(),
            domain: tracker_domain(&t.announce),
            status: TrackerStatus::from_wire(t.announce_state, t.scrape_state),
            error: tracker_error(t),
            downloads: known(t.download_count),
            leeches: known(t.leecher_count),
            seeds: known(t.seeder_count),
            last_announce: epoch(t.last_announce_time),
            next_announce: epoch(t.next_announce_time),
            last_scrape: epoch(t.last_scrape_time),
            next_scrape: epoch(t.next_scrape_time),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use seedctl_api::{FileStatWire, FileWire, PeerWire};

    use super::*;
    use crate::model::TorrentStatus;

    fn wire() -> TorrentWire {
        TorrentWire {
            id: 7,
            name: "debian.iso".into(),
            status: 6,
            percent_done: 1.0,
            metadata_percent_complete: 1.0,
            size_when_done: 1000,
            left_until_done: 0,
            total_size: 1000,
            upload_ratio: -2.0,
            eta: -1,
            upload_limited: true,
            upload_limit: 50,
            is_private: true,
            tracker_stats: vec![
                TrackerStatWire {
                    id: 1,
                    tier: 1,
                    announce: "https://b.example/announce".into(),
                    seeder_count: 12,
                    has_announced: true,
                    ..TrackerStatWire::default()
                },
                TrackerStatWire {
                    id: 0,
                    tier: 0,
                    announce: "https://a.example:443/announce".into(),
                    seeder_count: -1,
                    has_announced: true,
                    last_announce_result: "Connection failed".into(),
                    ..TrackerStatWire::default()
                },
            ],
            ..TorrentWire::default()
        }
    }

    #[test]
    fn torrent_sentinels_and_derived_values() {
        let t = Torrent::from(&wire());
        assert_eq!(t.id, 7);
        assert!(t.ratio.is_infinite());
        assert_eq!(t.eta, None);
        assert_eq!(t.limit_rate_up, Some(50_000));
        assert_eq!(t.limit_rate_down, None);
        assert_eq!(t.seeds, Some(12));
        assert_eq!(t.tracker, "a.example");
        assert!(t.is_complete());
        assert!(t.status.contains(TorrentStatus::Isolated));
        assert!(t.status.contains(TorrentStatus::Seeding));
        assert_eq!(t.added, None);
        assert_eq!(t.limit_ratio, None);
    }

    #[test]
    fn seed_ratio_mode_selects_the_limit() {
        let mut w = wire();
        w.seed_ratio_limit = 1.5;
        w.seed_ratio_mode = 1;
        assert_eq!(Torrent::from(&w).limit_ratio, Some(1.5));
        w.seed_ratio_mode = 2;
        assert_eq!(Torrent::from(&w).limit_ratio, Some(f64::INFINITY));
        w.seed_ratio_mode = 0;
        assert_eq!(Torrent::from(&w).limit_ratio, None);
    }

    #[test]
    fn trackers_carry_last_error() {
        let list = trackers(&wire());
        assert_eq!(list.len(), 2);
        let failing = list.iter().find(|t| t.tracker_id == 0).expect("tracker 0");
        assert_eq!(failing.error, "Connection failed");
        assert_eq!(failing.seeds, None);
        assert_eq!(failing.domain, "a.example");
    }

    #[test]
    fn files_split_directory_and_map_priority() {
        let mut w = wire();
        w.files = vec![
            FileWire {
                name: "debian/disk/a.iso".into(),
                length: 10,
                bytes_completed: 5,
            },
            FileWire {
                name: "b.txt".into(),
                length: 4,
                bytes_completed: 4,
            },
        ];
        w.file_stats = vec![
            FileStatWire {
                bytes_completed: 5,
                wanted: false,
                priority: 0,
            },
            FileStatWire {
                bytes_completed: 4,
                wanted: true,
                priority: 1,
            },
        ];
        let list = files(&w);
        assert_eq!(list[0].name, "a.iso");
        assert_eq!(list[0].path, "debian/disk");
        assert_eq!(list[0].priority, FilePriority::Off);
        assert_eq!(list[1].path, "");
        assert_eq!(list[1].priority, FilePriority::High);
        assert!(list[1].is_complete());
    }

    #[test]
    fn peers_estimate_bytes_from_progress() {
        let mut w = wire();
        w.peers = vec![PeerWire {
            address: "10.0.0.2".into(),
            port: 51413,
            progress: 0.25,
            rate_to_client: 300,
            rate_to_peer: 100,
            ..PeerWire::default()
        }];
        let list = peers(&w);
        assert_eq!(list[0].downloaded, 250);
        assert!((list[0].progress - 25.0).abs() < f64::EPSILON);
        assert_eq!(list[0].rate_down, 300);
        assert_eq!(list[0].rate_up, 100);
    }
}
