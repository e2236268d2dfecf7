// ── Peer fields and flags ──

use std::sync::LazyLock;

use super::registry::{FieldRegistry, FieldSpec, FlagSpec, FlagTest, Getter};
use super::value::{Value, ValueType};
use crate::model::{EntityKind, Peer};

fn field(
    name: &'static str,
    ty: ValueType,
    description: &'static str,
    get: Getter<Peer>,
) -> FieldSpec<Peer> {
    FieldSpec::new(name, ty, description, get)
}

fn flag(
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    test: FlagTest<Peer>,
) -> FlagSpec<Peer> {
    FlagSpec::new(name, aliases, description, test)
}

pub static PEER_FIELDS: LazyLock<FieldRegistry<Peer>> = LazyLock::new(|| {
    use ValueType as T;

    let fields = vec![
        field("host", T::Text, "IP address of the peer", |p| Value::text(&p.host))
            .header("Host", 39),
        field("port", T::Integer, "Port of the peer", |p| {
            Value::Int(i64::from(p.port))
        })
        .header("Port", 5),
        field("client", T::Text, "Client software the peer reports", |p| {
            Value::text(&p.client)
        })
        .aliases(&["cl"])
        .header("Client", 20)
        .natural(),
        field("torrent", T::Text, "Name of the torrent", |p| {
            Value::text(&p.torrent_name)
        })
        .aliases(&["tn"])
        .header("Torrent", 30)
        .natural(),
        field("torrent-id", T::Integer, "Id of the torrent", |p| {
            Value::Int(i64::try_from(p.torrent_id).unwrap_or(i64::MAX))
        })
        .header("TID", 5),
        field("downloaded", T::Bytes, "Bytes the peer has of the torrent", |p| {
            Value::Bytes(p.downloaded)
        })
        .header("Have", 9),
        field("%downloaded", T::Percent, "Peer's completion", |p| {
            Value::Float(p.progress)
        })
        .aliases(&["%dn"])
        .header("%", 5),
        field("rate-up", T::Rate, "Rate we send to the peer", |p| {
            Value::Bytes(p.rate_up)
        })
        .aliases(&["rup"])
        .header("Up/s", 10),
        field("rate-down", T::Rate, "Rate we receive from the peer", |p| {
            Value::Bytes(p.rate_down)
        })
        .aliases(&["rdn"])
        .header("Dn/s", 10),
        field("rate", T::Rate, "Combined rate", |p| {
            Value::Bytes(p.rate_up.saturating_add(p.rate_down))
        })
        .header("Rate", 10),
    ];

    let flags = vec![
        flag("uploading", &[], "We are sending data to the peer", |p| {
            p.rate_up > 0
        }),
        flag("downloading", &[], "We are receiving data from the peer", |p| {
            p.rate_down > 0
        }),
        flag("seeding", &[], "Peer has the whole torrent", Peer::is_seed),
    ];

    FieldRegistry::new(EntityKind::Peer, "host", fields, flags)
});
