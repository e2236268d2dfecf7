// ── Torrent fields and flags ──

use std::sync::LazyLock;

use chrono::{DateTime, Utc};

use super::registry::{FieldRegistry, FieldSpec, FlagSpec, FlagTest, Getter};
use super::value::{UNKNOWN_DURATION, UNLIMITED, Value, ValueType};
use crate::model::{EntityKind, Torrent, TorrentStatus};

fn ts(dt: Option<&DateTime<Utc>>) -> Value<'static> {
    Value::Timestamp(dt.map_or(0, DateTime::timestamp))
}

fn int(n: u64) -> Value<'static> {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn field(
    name: &'static str,
    ty: ValueType,
    description: &'static str,
    get: Getter<Torrent>,
) -> FieldSpec<Torrent> {
    FieldSpec::new(name, ty, description, get)
}

fn flag(
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    test: FlagTest<Torrent>,
) -> FlagSpec<Torrent> {
    FlagSpec::new(name, aliases, description, test)
}

fn has(t: &Torrent, status: TorrentStatus) -> bool {
    t.status.contains(status)
}

pub static TORRENT_FIELDS: LazyLock<FieldRegistry<Torrent>> = LazyLock::new(|| {
    use ValueType as T;

    let fields = vec![
        field("id", T::Integer, "Torrent id", |t| int(t.id))
            .header("ID", 5),
        field("name", T::Text, "Torrent name", |t| Value::text(&t.name))
            .aliases(&["n"])
            .header("Name", 40)
            .natural(),
        field("comment", T::Text, "Comment from the creator", |t| {
            Value::text(&t.comment)
        })
        .aliases(&["cmnt"])
        .header("Comment", 30),
        field("path", T::Path, "Download directory", |t| {
            Value::text(&t.path)
        })
        .aliases(&["dir"])
        .header("Path", 30)
        .natural(),
        field("error", T::Text, "Error message from daemon or tracker", |t| {
            Value::text(&t.error)
        })
        .aliases(&["err"])
        .header("Error", 30),
        field("uploaded", T::Bytes, "Bytes uploaded over the torrent's lifetime", |t| {
            Value::Bytes(t.uploaded)
        })
        .aliases(&["up"])
        .header("Up", 9),
        field("downloaded", T::Bytes, "Bytes downloaded over the torrent's lifetime", |t| {
            Value::Bytes(t.downloaded)
        })
        .aliases(&["dn"])
        .header("Dn", 9),
        field("%downloaded", T::Percent, "Share of wanted bytes present", |t| {
            Value::Float(t.percent_downloaded())
        })
        .aliases(&["%dn"])
        .header("%", 5),
        field("size", T::Bytes, "Size of wanted files", |t| Value::Bytes(t.size))
            .aliases(&["sz"])
            .header("Size", 9),
        field("peers", T::Integer, "Number of connected peers", |t| int(t.peers))
            .aliases(&["prs"])
            .header("Peers", 5),
        field("seeds", T::Integer, "Largest seed count reported by a tracker", |t| {
            int(t.seeds.unwrap_or(0))
        })
        .aliases(&["sds"])
        .header("Seeds", 5),
        field("ratio", T::Ratio, "Uploaded divided by downloaded", |t| {
            Value::Float(t.ratio)
        })
        .aliases(&["rto"])
        .header("Ratio", 5),
        field("rate-up", T::Rate, "Upload rate", |t| Value::Bytes(t.rate_up))
            .aliases(&["rup"])
            .header("Up/s", 10),
        field("rate-down", T::Rate, "Download rate", |t| Value::Bytes(t.rate_down))
            .aliases(&["rdn"])
            .header("Dn/s", 10),
        field("rate", T::Rate, "Combined upload and download rate", |t| {
            Value::Bytes(t.rate_up.saturating_add(t.rate_down))
        })
        .header("Rate", 10),
        field("limit-rate-up", T::Rate, "Upload rate limit", |t| {
            Value::Bytes(t.limit_rate_up.unwrap_or(UNLIMITED))
        })
        .aliases(&["lrup"])
        .header("LimUp", 10),
        field("limit-rate-down", T::Rate, "Download rate limit", |t| {
            Value::Bytes(t.limit_rate_down.unwrap_or(UNLIMITED))
        })
        .aliases(&["lrdn"])
        .header("LimDn", 10),
        field("limit-ratio", T::Ratio, "Seed ratio limit; 0 when the global limit applies", |t| {
            Value::Float(t.limit_ratio.unwrap_or(0.0))
        })
        .aliases(&["lrto"])
        .header("LimRto", 6),
        field("tracker", T::Text, "Domain of the first tracker", |t| {
            Value::text(&t.tracker)
        })
        .aliases(&["trk"])
        .header("Tracker", 20)
        .natural(),
        field("status", T::Status, "Most significant activity status", |t| {
            let s = t.status.primary();
            Value::Status {
                rank: s.rank(),
                name: s.name(),
            }
        })
        .aliases(&["st"])
        .header("Status", 11)
        .choices(TorrentStatus::names()),
        field("eta", T::Duration, "Estimated time until complete", |t| {
            Value::Duration(t.eta.unwrap_or(UNKNOWN_DURATION))
        })
        .header("ETA", 8),
        field("created", T::Timestamp, "When the torrent was created", |t| {
            ts(t.created.as_ref())
        })
        .aliases(&["tcrt"])
        .header("Created", 16),
        field("added", T::Timestamp, "When the torrent was added", |t| {
            ts(t.added.as_ref())
        })
        .aliases(&["tadd"])
        .header("Added", 16),
        field("started", T::Timestamp, "When the torrent was last started", |t| {
            ts(t.started.as_ref())
        })
        .aliases(&["tsta"])
        .header("Started", 16),
        field("activity", T::Timestamp, "When the torrent last transferred data", |t| {
            ts(t.activity.as_ref())
        })
        .aliases(&["tact"])
        .header("Activity", 16)
        .descending(),
        field("completed", T::Timestamp, "When all wanted files were finished", |t| {
            ts(t.completed.as_ref())
        })
        .aliases(&["tcmp"])
        .header("Completed", 16),
        field("magnet", T::Text, "Magnet link", |t| Value::text(&t.magnet))
            .aliases(&["uri"])
            .header("Magnet", 60),
    ];

    let flags = vec![
        flag("all", &["*"], "Every torrent", |_| true),
        flag("complete", &["cmp"], "All wanted files finished", Torrent::is_complete),
        flag("incomplete", &["inc"], "Wanted files still missing", |t| {
            !t.is_complete()
        }),
        flag("stopped", &["stp"], "Not running", |t| {
            has(t, TorrentStatus::Stopped)
        }),
        flag("active", &["act"], "Connected, transferring or verifying", |t| {
            has(t, TorrentStatus::Connected)
                || has(t, TorrentStatus::Downloading)
                || has(t, TorrentStatus::Uploading)
                || has(t, TorrentStatus::Verifying)
        }),
        flag("uploading", &["upg"], "Sending data", |t| {
            has(t, TorrentStatus::Uploading)
        }),
        flag("downloading", &["dng"], "Receiving data", |t| {
            has(t, TorrentStatus::Downloading)
        }),
        flag("verifying", &["vfg"], "Checking local data", |t| {
            has(t, TorrentStatus::Verifying)
        }),
        flag("leeching", &["lcg"], "Incomplete and running", |t| {
            !t.is_complete() && !has(t, TorrentStatus::Stopped)
        }),
        flag("seeding", &["sdg"], "Complete and running", |t| {
            t.is_complete() && !has(t, TorrentStatus::Stopped)
        }),
        flag("idle", &[], "Running but not transferring", |t| {
            has(t, TorrentStatus::Idle)
        }),
        flag("isolated", &["isl"], "Private torrent no tracker answers for", |t| {
            has(t, TorrentStatus::Isolated)
        }),
        flag("private", &["prv"], "Peer exchange and DHT disabled", |t| t.private),
        flag("public", &["pbl"], "Not private", |t| !t.private),
    ];

    FieldRegistry::new(EntityKind::Torrent, "name", fields, flags)
});
