// ── Built-in commands ──
//
// Descriptors plus handlers for every command a session ships with.
// Handlers only run after binding succeeded, so every argument they read
// has already been validated.

mod meta;
mod sub;
mod torrent;

use std::collections::BTreeSet;
use std::sync::Arc;

use super::args::Invocation;
use super::outcome::{CommandOutcome, MutationReport};
use super::spec::{ArgType, Arity, CommandNode, CommandSpec, FlagSpec, Handler, Leaf, PositionalSpec};
use crate::error::CoreError;
use crate::filter::Filter;
use crate::model::{Entity, EntityId, EntityKind, Torrent, TorrentStatus};
use crate::remote::Mutation;
use crate::session::{Cached, Session};
use crate::view::ViewSpec;

/// Every built-in command.
pub(crate) fn all() -> Vec<CommandSpec> {
    let mut commands = torrent::commands();
    commands.extend(sub::commands());
    commands.extend(meta::commands());
    commands
}

// ── Descriptor helpers ───────────────────────────────────────────────

fn leaf(flags: Vec<FlagSpec>, positionals: Vec<PositionalSpec>, handler: Handler) -> CommandNode {
    CommandNode::Leaf(Leaf {
        flags,
        positionals,
        handler,
        mutating: false,
    })
}

fn mutating(
    flags: Vec<FlagSpec>,
    positionals: Vec<PositionalSpec>,
    handler: Handler,
) -> CommandNode {
    CommandNode::Leaf(Leaf {
        flags,
        positionals,
        handler,
        mutating: true,
    })
}

/// Torrent filter positional. Listings may omit it; commands that change
/// torrents bind it with a required arity.
fn torrent_filter(arity: Arity) -> PositionalSpec {
    let description = if arity.min() == 0 {
        "Torrents to list (default: all)"
    } else {
        "Torrents to act on"
    };
    PositionalSpec::new("filter", ArgType::Filter(EntityKind::Torrent), arity, description)
}

fn sort_flag(kind: EntityKind) -> FlagSpec {
    FlagSpec::value("sort", Some('s'), ArgType::Sort(kind), "Sort order")
}

fn columns_flag(kind: EntityKind) -> FlagSpec {
    FlagSpec::value(
        "columns",
        Some('c'),
        ArgType::Columns(kind),
        "Comma-separated list of columns",
    )
}

// ── Handler helpers ──────────────────────────────────────────────────

/// `ViewSpec` for `kind` with `--sort`/`--columns` or the settings defaults.
fn list_spec(session: &Session, inv: &Invocation, kind: EntityKind) -> ViewSpec {
    let settings = session.settings();
    ViewSpec::new(kind)
        .with_sort(inv.sort("sort").cloned().unwrap_or_else(|| settings.sort(kind)))
        .with_columns(
            inv.columns("columns")
                .map_or_else(|| settings.columns(kind), <[_]>::to_vec),
        )
}

/// Entities matching `filter`, or a `NoMatch` error.
async fn select_some<E: Cached>(
    session: &Session,
    filter: &Filter,
    scope: Option<&BTreeSet<u64>>,
) -> Result<Vec<Arc<E>>, CoreError> {
    let hits = session.select::<E>(filter, scope).await?;
    if hits.is_empty() {
        return Err(CoreError::NoMatch {
            what: if filter.is_all() {
                E::KIND.plural().to_owned()
            } else {
                format!("{}: {filter}", E::KIND.plural())
            },
        });
    }
    Ok(hits)
}

/// The filter a mutating command was given. Mutations never fall back to
/// every torrent.
fn required_filter<'a>(inv: &'a Invocation, name: &str) -> Result<&'a Filter, CoreError> {
    inv.filter(name).ok_or_else(|| CoreError::MissingArgument {
        command: inv.command(),
        name: name.to_ascii_uppercase(),
    })
}

/// Ids of torrents matching `filter`.
async fn torrent_scope(session: &Session, filter: &Filter) -> Result<BTreeSet<u64>, CoreError> {
    let torrents = select_some::<Torrent>(session, filter, None).await?;
    Ok(torrents.iter().map(|t| t.id).collect())
}

fn targets<E: Entity>(entities: &[Arc<E>]) -> Vec<(EntityId, String)> {
    entities.iter().map(|e| (e.id(), e.label())).collect()
}

/// Apply `mutation` to the torrents matching the `filter` positional.
async fn mutate_torrents(
    session: &Session,
    inv: &Invocation,
    mutation: Mutation,
) -> Result<CommandOutcome, CoreError> {
    let filter = required_filter(inv, "filter")?;
    let torrents = select_some::<Torrent>(session, filter, None).await?;
    let report = session
        .mutate(EntityKind::Torrent, targets(&torrents), mutation)
        .await;
    Ok(CommandOutcome::Mutation(report))
}

/// Start the stopped torrents matching the `filter` positional and stop
/// the rest.
async fn toggle_torrents(
    session: &Session,
    inv: &Invocation,
    force: bool,
) -> Result<CommandOutcome, CoreError> {
    let filter = required_filter(inv, "filter")?;
    let torrents = select_some::<Torrent>(session, filter, None).await?;
    let (stopped, running): (Vec<_>, Vec<_>) = torrents
        .into_iter()
        .partition(|t| t.status.contains(TorrentStatus::Stopped));

    let mut entries = Vec::with_capacity(stopped.len() + running.len());
    if !stopped.is_empty() {
        let report = session
            .mutate(EntityKind::Torrent, targets(&stopped), Mutation::Start { force })
            .await;
        entries.extend(report.entries);
    }
    if !running.is_empty() {
        let report = session
            .mutate(EntityKind::Torrent, targets(&running), Mutation::Stop)
            .await;
        entries.extend(report.entries);
    }
    Ok(CommandOutcome::Mutation(MutationReport {
        action: "toggled",
        kind: EntityKind::Torrent,
        entries,
    }))
}
