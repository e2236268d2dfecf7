// ── File fields and flags ──

use std::sync::LazyLock;

use super::registry::{FieldRegistry, FieldSpec, FlagSpec, FlagTest, Getter};
use super::value::{Value, ValueType};
use crate::model::{EntityKind, FilePriority, TorrentFile};

fn field(
    name: &'static str,
    ty: ValueType,
    description: &'static str,
    get: Getter<TorrentFile>,
) -> FieldSpec<TorrentFile> {
    FieldSpec::new(name, ty, description, get)
}

fn flag(
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    test: FlagTest<TorrentFile>,
) -> FlagSpec<TorrentFile> {
    FlagSpec::new(name, aliases, description, test)
}

pub static FILE_FIELDS: LazyLock<FieldRegistry<TorrentFile>> = LazyLock::new(|| {
    use ValueType as T;

    let fields = vec![
        field("name", T::Text, "File name", |f| Value::text(&f.name))
            .aliases(&["n"])
            .header("Name", 40)
            .natural(),
        field("path", T::Path, "Directory inside the torrent", |f| {
            Value::text(&f.path)
        })
        .header("Path", 30)
        .natural(),
        field("torrent", T::Text, "Name of the torrent", |f| {
            Value::text(&f.torrent_name)
        })
        .aliases(&["tn"])
        .header("Torrent", 30)
        .natural(),
        field("torrent-id", T::Integer, "Id of the torrent", |f| {
            Value::Int(i64::try_from(f.torrent_id).unwrap_or(i64::MAX))
        })
        .header("TID", 5),
        field("size", T::Bytes, "File size", |f| Value::Bytes(f.size))
            .aliases(&["sz"])
            .header("Size", 9),
        field("downloaded", T::Bytes, "Bytes downloaded", |f| {
            Value::Bytes(f.downloaded)
        })
        .aliases(&["dn"])
        .header("Dn", 9),
        field("%downloaded", T::Percent, "Share downloaded", |f| {
            Value::Float(f.percent_downloaded())
        })
        .aliases(&["%dn"])
        .header("%", 5),
        field("priority", T::Status, "Download priority (off means unwanted)", |f| {
            Value::Status {
                rank: f.priority.rank(),
                name: f.priority.name(),
            }
        })
        .aliases(&["prio"])
        .header("Priority", 8)
        .choices(FilePriority::names()),
    ];

    let flags = vec![
        flag("wanted", &[], "File will be downloaded", TorrentFile::is_wanted),
        flag("complete", &["cmp"], "File is fully downloaded", TorrentFile::is_complete),
    ];

    FieldRegistry::new(EntityKind::File, "name", fields, flags)
});
