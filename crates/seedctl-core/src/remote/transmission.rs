// ── Transmission adapter ──
//
// Implements `RemoteClient` over `seedctl_api::RpcClient`. Torrent-level
// actions go out as one RPC for all ids; file and tracker mutations are
// grouped per torrent into `torrent-set` calls.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use seedctl_api::{Ids, RpcClient, TORRENT_FIELDS, TorrentAction, TorrentSetArgs, TorrentWire};

use super::{
    AddOptions, AddOutcome, ClientError, EntityBatch, Mutation, MutationResults, RateDirection,
    Rejection, RemoteClient,
};
use crate::convert;
use crate::model::{EntityId, EntityItems, EntityKind, FilePriority, Torrent};

const PEER_FIELDS: &[&str] = &["id", "name", "totalSize", "peers"];
const FILE_FIELDS: &[&str] = &["id", "name", "files", "fileStats"];
const TRACKER_FIELDS: &[&str] = &["id", "name", "trackerStats"];

fn wire_id(id: u64) -> i64 {
    i64::try_from(id).unwrap_or(i64::MAX)
}

/// Resolve one RPC outcome into per-id results. Daemon refusals become
/// per-id rejections; anything else fails the whole call.
fn settle(
    ids: impl IntoIterator<Item = EntityId>,
    outcome: Result<(), seedctl_api::Error>,
) -> Result<MutationResults, ClientError> {
    match outcome {
        Ok(()) => Ok(ids.into_iter().map(|id| (id, Ok(()))).collect()),
        Err(e) => match e.rpc_result() {
            Some(reason) => Ok(ids
                .into_iter()
                .map(|id| (id, Err(Rejection::new(reason))))
                .collect()),
            None => Err(e.into()),
        },
    }
}

/// The daemon takes kB/s. Limits round up so a nonzero limit never
/// becomes a zero one.
fn rate_limit_args(direction: RateDirection, limit: Option<u64>) -> TorrentSetArgs {
    let kilobytes = limit.map(|bytes| wire_id(bytes.div_ceil(1000)));
    let limited = Some(limit.is_some());
    match direction {
        RateDirection::Up => TorrentSetArgs {
            upload_limited: limited,
            upload_limit: kilobytes,
            ..TorrentSetArgs::default()
        },
        RateDirection::Down => TorrentSetArgs {
            download_limited: limited,
            download_limit: kilobytes,
            ..TorrentSetArgs::default()
        },
    }
}

fn priority_args(priority: FilePriority, indices: Vec<i64>) -> TorrentSetArgs {
    match priority {
        FilePriority::Off => TorrentSetArgs {
            files_unwanted: Some(indices),
            ..TorrentSetArgs::default()
        },
        FilePriority::Low => TorrentSetArgs {
            files_wanted: Some(indices.clone()),
            priority_low: Some(indices),
            ..TorrentSetArgs::default()
        },
        FilePriority::Normal => TorrentSetArgs {
            files_wanted: Some(indices.clone()),
            priority_normal: Some(indices),
            ..TorrentSetArgs::default()
        },
        FilePriority::High => TorrentSetArgs {
            files_wanted: Some(indices.clone()),
            priority_high: Some(indices),
            ..TorrentSetArgs::default()
        },
    }
}

/// `RemoteClient` backed by a Transmission daemon.
pub struct TransmissionRemote {
    rpc: RpcClient,
}

impl TransmissionRemote {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    async fn all_torrents(&self, fields: &[&str]) -> Result<Vec<TorrentWire>, ClientError> {
        Ok(self.rpc.torrent_get(fields, &Ids::All).await?.torrents)
    }

    async fn list_torrents(&self, since: Option<u64>) -> Result<EntityBatch, ClientError> {
        let ids = if since.is_some() {
            Ids::RecentlyActive
        } else {
            Ids::All
        };
        let response = self.rpc.torrent_get(TORRENT_FIELDS, &ids).await?;
        let removed = response
            .removed
            .iter()
            .filter_map(|id| u64::try_from(*id).ok())
            .map(EntityId::Torrent)
            .collect();
        Ok(EntityBatch {
            items: EntityItems::Torrents(response.torrents.iter().map(Torrent::from).collect()),
            removed,
            complete: since.is_none(),
        })
    }

    async fn mutate_torrents(
        &self,
        ids: &[EntityId],
        mutation: &Mutation,
    ) -> Result<MutationResults, ClientError> {
        let numeric: Vec<i64> = ids.iter().map(|id| wire_id(id.torrent_id())).collect();
        let outcome = match mutation {
            Mutation::Start { force } => {
                let action = if *force {
                    TorrentAction::StartNow
                } else {
                    TorrentAction::Start
                };
                self.rpc.torrent_action(action, &numeric).await
            }
            Mutation::Stop => self.rpc.torrent_action(TorrentAction::Stop, &numeric).await,
            Mutation::Verify => self.rpc.torrent_action(TorrentAction::Verify, &numeric).await,
            Mutation::Announce => {
                self.rpc
                    .torrent_action(TorrentAction::Reannounce, &numeric)
                    .await
            }
            Mutation::Remove { delete_files } => {
                self.rpc.torrent_remove(&numeric, *delete_files).await
            }
            Mutation::Move { path } => self.rpc.torrent_set_location(&numeric, path).await,
            Mutation::Rename { from, to } => {
                let mut results = Vec::with_capacity(ids.len());
                for id in ids {
                    let outcome = self
                        .rpc
                        .torrent_rename_path(wire_id(id.torrent_id()), from, to)
                        .await;
                    results.extend(settle([id.clone()], outcome)?);
                }
                return Ok(results);
            }
            Mutation::SetRateLimit { direction, limit } => {
                self.rpc
                    .torrent_set(&numeric, &rate_limit_args(*direction, *limit))
                    .await
            }
            Mutation::SetSeedRatioLimit(ratio) => {
                let args = TorrentSetArgs {
                    seed_ratio_limit: Some(*ratio),
                    seed_ratio_mode: Some(1),
                    ..TorrentSetArgs::default()
                };
                self.rpc.torrent_set(&numeric, &args).await
            }
            Mutation::AddTracker { url } => {
                let args = TorrentSetArgs {
                    tracker_add: Some(vec![url.clone()]),
                    ..TorrentSetArgs::default()
                };
                self.rpc.torrent_set(&numeric, &args).await
            }
            Mutation::RemoveTracker | Mutation::SetPriority(_) => {
                return Err(unsupported(EntityKind::Torrent, mutation));
            }
        };
        settle(ids.iter().cloned(), outcome)
    }

    /// Run one `torrent-set` per torrent for sub-entity ids.
    async fn mutate_grouped(
        &self,
        ids: &[EntityId],
        args_for: impl Fn(Vec<i64>) -> TorrentSetArgs,
        sub_key: impl Fn(&EntityId) -> Option<u64>,
    ) -> Result<MutationResults, ClientError> {
        let mut groups: BTreeMap<u64, Vec<&EntityId>> = BTreeMap::new();
        for id in ids {
            groups.entry(id.torrent_id()).or_default().push(id);
        }

        let mut results = Vec::with_capacity(ids.len());
        for (torrent, members) in groups {
            let keys: Vec<i64> = members
                .iter()
                .filter_map(|id| sub_key(id))
                .map(wire_id)
                .collect();
            debug!(torrent, count = keys.len(), "torrent-set on sub-entities");
            let outcome = self.rpc.torrent_set(&[wire_id(torrent)], &args_for(keys)).await;
            results.extend(settle(members.into_iter().cloned(), outcome)?);
        }
        Ok(results)
    }
}

fn unsupported(kind: EntityKind, mutation: &Mutation) -> ClientError {
    ClientError::rejected(format!(
        "{} cannot be {}",
        kind.plural(),
        mutation.action()
    ))
}

#[async_trait]
impl RemoteClient for TransmissionRemote {
    async fn list_entities(
        &self,
        kind: EntityKind,
        since: Option<u64>,
    ) -> Result<EntityBatch, ClientError> {
        let items = match kind {
            EntityKind::Torrent => return self.list_torrents(since).await,
            EntityKind::Peer => EntityItems::Peers(
                self.all_torrents(PEER_FIELDS)
                    .await?
                    .iter()
                    .flat_map(convert::peers)
                    .collect(),
            ),
            EntityKind::File => EntityItems::Files(
                self.all_torrents(FILE_FIELDS)
                    .await?
                    .iter()
                    .flat_map(convert::files)
                    .collect(),
            ),
            EntityKind::Tracker => EntityItems::Trackers(
                self.all_torrents(TRACKER_FIELDS)
                    .await?
                    .iter()
                    .flat_map(convert::trackers)
                    .collect(),
            ),
        };
        Ok(EntityBatch::complete(items))
    }

    async fn mutate(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
        mutation: &Mutation,
    ) -> Result<MutationResults, ClientError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        match (kind, mutation) {
            (EntityKind::Torrent, _) => self.mutate_torrents(ids, mutation).await,
            (EntityKind::File, Mutation::SetPriority(priority)) => {
                let priority = *priority;
                self.mutate_grouped(
                    ids,
                    |indices| priority_args(priority, indices),
                    |id| match id {
                        EntityId::File { index, .. } => Some(*index),
                        _ => None,
                    },
                )
                .await
            }
            (EntityKind::Tracker, Mutation::RemoveTracker) => {
                self.mutate_grouped(
                    ids,
                    |trackers| TorrentSetArgs {
                        tracker_remove: Some(trackers),
                        ..TorrentSetArgs::default()
                    },
                    |id| match id {
                        EntityId::Tracker { tracker, .. } => Some(*tracker),
                        _ => None,
                    },
                )
                .await
            }
            (kind, mutation) => Err(unsupported(kind, mutation)),
        }
    }

    async fn add_entity(
        &self,
        source: &str,
        options: &AddOptions,
    ) -> Result<AddOutcome, ClientError> {
        let response = self
            .rpc
            .torrent_add(source, options.path.as_deref(), options.paused)
            .await?;
        match (response.torrent_added, response.torrent_duplicate) {
            (Some(t), _) => Ok(AddOutcome::Added {
                id: u64::try_from(t.id).unwrap_or(0),
                name: t.name,
            }),
            (None, Some(t)) => Ok(AddOutcome::Duplicate {
                id: u64::try_from(t.id).unwrap_or(0),
                name: t.name,
            }),
            (None, None) => Err(ClientError::rejected(format!(
                "daemon did not add {source}"
            ))),
        }
    }

    async fn describe(&self) -> Result<String, ClientError> {
        let info = self.rpc.session_get().await?;
        Ok(format!(
            "Transmission {} (RPC version {})",
            info.version, info.rpc_version
        ))
    }
}
