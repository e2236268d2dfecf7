// ── Tracker fields and flags ──

use std::sync::LazyLock;

use chrono::{DateTime, Utc};

use super::registry::{FieldRegistry, FieldSpec, FlagSpec, FlagTest, Getter};
use super::value::{Value, ValueType};
use crate::model::{EntityKind, Tracker, TrackerStatus};

fn ts(dt: Option<&DateTime<Utc>>) -> Value<'static> {
    Value::Timestamp(dt.map_or(0, DateTime::timestamp))
}

fn count(n: Option<u64>) -> Value<'static> {
    Value::Int(n.map_or(0, |n| i64::try_from(n).unwrap_or(i64::MAX)))
}

fn field(
    name: &'static str,
    ty: ValueType,
    description: &'static str,
    get: Getter<Tracker>,
) -> FieldSpec<Tracker> {
    FieldSpec::new(name, ty, description, get)
}

fn flag(
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    test: FlagTest<Tracker>,
) -> FlagSpec<Tracker> {
    FlagSpec::new(name, aliases, description, test)
}

pub static TRACKER_FIELDS: LazyLock<FieldRegistry<Tracker>> = LazyLock::new(|| {
    use ValueType as T;

    let fields = vec![
        field("domain", T::Text, "Host of the announce URL", |t| {
            Value::text(&t.domain)
        })
        .aliases(&["dom"])
        .header("Domain", 25)
        .natural(),
        field("url-announce", T::Text, "Announce URL", |t| {
            Value::text(&t.url_announce)
        })
        .aliases(&["an"])
        .header("Announce URL", 40),
        field("url-scrape", T::Text, "Scrape URL", |t| Value::text(&t.url_scrape))
            .aliases(&["sc"])
            .header("Scrape URL", 40),
        field("torrent", T::Text, "Name of the torrent", |t| {
            Value::text(&t.torrent_name)
        })
        .aliases(&["tn"])
        .header("Torrent", 30)
        .natural(),
        field("torrent-id", T::Integer, "Id of the torrent", |t| {
            Value::Int(i64::try_from(t.torrent_id).unwrap_or(i64::MAX))
        })
        .header("TID", 5),
        field("tier", T::Integer, "Announce tier", |t| {
            Value::Int(i64::try_from(t.tier).unwrap_or(i64::MAX))
        })
        .header("Tier", 4),
        field("status", T::Status, "Announce state", |t| Value::Status {
            rank: t.status.rank(),
            name: t.status.name(),
        })
        .aliases(&["st"])
        .header("Status", 10)
        .choices(TrackerStatus::names()),
        field("error", T::Text, "Last announce or scrape error", |t| {
            Value::text(&t.error)
        })
        .aliases(&["err"])
        .header("Error", 30),
        field("downloads", T::Integer, "Completed downloads reported by the tracker", |t| {
            count(t.downloads)
        })
        .aliases(&["dns"])
        .header("Dnlds", 6),
        field("leeches", T::Integer, "Leechers reported by the tracker", |t| {
            count(t.leeches)
        })
        .aliases(&["lcs"])
        .header("Leeches", 7),
        field("seeds", T::Integer, "Seeders reported by the tracker", |t| {
            count(t.seeds)
        })
        .aliases(&["sds"])
        .header("Seeds", 6),
        field("last-announce", T::Timestamp, "Time of the last announce", |t| {
            ts(t.last_announce.as_ref())
        })
        .aliases(&["lan"])
        .header("Last Announce", 16),
        field("next-announce", T::Timestamp, "Time of the next announce", |t| {
            ts(t.next_announce.as_ref())
        })
        .aliases(&["nan"])
        .header("Next Announce", 16)
        .future(),
        field("last-scrape", T::Timestamp, "Time of the last scrape", |t| {
            ts(t.last_scrape.as_ref())
        })
        .aliases(&["lsc"])
        .header("Last Scrape", 16),
        field("next-scrape", T::Timestamp, "Time of the next scrape", |t| {
            ts(t.next_scrape.as_ref())
        })
        .aliases(&["nsc"])
        .header("Next Scrape", 16)
        .future(),
    ];

    let flags = vec![flag("alive", &[], "Tracker is running without errors", Tracker::is_alive)];

    FieldRegistry::new(EntityKind::Tracker, "domain", fields, flags)
});
