// ── Test fixtures ──

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::model::{
    EntityId, EntityItems, EntityKind, FilePriority, Peer, StatusSet, Torrent, TorrentFile,
    TorrentStatus, Tracker, TrackerStatus, tracker_domain,
};
use crate::remote::{
    AddOptions, AddOutcome, ClientError, EntityBatch, Mutation, MutationResults, Rejection,
    RemoteClient,
};

pub(crate) fn torrent(id: u64, name: &str) -> Torrent {
    Torrent {
        id,
        hash: format!("{id:040x}"),
        name: name.to_owned(),
        path: "/downloads".to_owned(),
        comment: String::new(),
        error: String::new(),
        status: StatusSet::new(vec![TorrentStatus::Idle]),
        private: false,
        size: 0,
        have: 0,
        downloaded: 0,
        uploaded: 0,
        ratio: 0.0,
        rate_up: 0,
        rate_down: 0,
        limit_rate_up: None,
        limit_rate_down: None,
        limit_ratio: None,
        peers: 0,
        seeds: None,
        eta: None,
        tracker: String::new(),
        magnet: format!("magnet:?xt=urn:btih:{id:040x}"),
        created: None,
        added: None,
        started: None,
        activity: None,
        completed: None,
    }
}

pub(crate) fn peer(torrent_id: u64, host: &str, port: u16) -> Peer {
    Peer {
        torrent_id,
        torrent_name: format!("t{torrent_id}"),
        host: host.to_owned(),
        port,
        client: "Transmission 4.0".to_owned(),
        progress: 0.0,
        downloaded: 0,
        rate_up: 0,
        rate_down: 0,
        is_uploading_to: false,
        is_downloading_from: false,
    }
}

pub(crate) fn file(torrent_id: u64, index: u64, name: &str) -> TorrentFile {
    TorrentFile {
        torrent_id,
        torrent_name: format!("t{torrent_id}"),
        index,
        name: name.to_owned(),
        path: String::new(),
        size: 100,
        downloaded: 0,
        priority: FilePriority::Normal,
    }
}

pub(crate) fn tracker(torrent_id: u64, tracker_id: u64, url: &str) -> Tracker {
    Tracker {
        torrent_id,
        torrent_name: format!("t{torrent_id}"),
        tracker_id,
        tier: 0,
        url_announce: url.to_owned(),
        url_scrape: String::new(),
        domain: tracker_domain(url),
        status: TrackerStatus::Idle,
        error: String::new(),
        downloads: None,
        leeches: None,
        seeds: None,
        last_announce: None,
        next_announce: None,
        last_scrape: None,
        next_scrape: None,
    }
}

// ── In-memory remote ─────────────────────────────────────────────────

/// Scripted listing outcome.
pub(crate) enum Listing {
    Fail(ClientError),
    /// Never answers; exercised through timeouts.
    Hang,
}

/// `RemoteClient` over in-memory lists with scripted failures.
#[derive(Default)]
pub(crate) struct FakeRemote {
    pub torrents: Mutex<Vec<Torrent>>,
    pub peers: Mutex<Vec<Peer>>,
    pub files: Mutex<Vec<TorrentFile>>,
    pub trackers: Mutex<Vec<Tracker>>,
    /// Consumed front to back before answering listings normally.
    pub script: Mutex<VecDeque<Listing>>,
    pub reject: Mutex<HashMap<EntityId, String>>,
    /// Mutations touching these ids never answer.
    pub hang: Mutex<HashSet<EntityId>>,
    pub mutations: Mutex<Vec<(EntityKind, Vec<EntityId>, Mutation)>>,
    pub listings: AtomicUsize,
}

#[allow(clippy::unwrap_used)]
impl FakeRemote {
    pub(crate) fn with_torrents(torrents: Vec<Torrent>) -> Self {
        let fake = Self::default();
        *fake.torrents.lock().unwrap() = torrents;
        fake
    }

    pub(crate) fn push(&self, listing: Listing) {
        self.script.lock().unwrap().push_back(listing);
    }

    pub(crate) fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl RemoteClient for FakeRemote {
    async fn list_entities(
        &self,
        kind: EntityKind,
        _since: Option<u64>,
    ) -> Result<EntityBatch, ClientError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(Listing::Fail(e)) => return Err(e),
            Some(Listing::Hang) => std::future::pending::<()>().await,
            None => {}
        }
        let items = match kind {
            EntityKind::Torrent => EntityItems::Torrents(self.torrents.lock().unwrap().clone()),
            EntityKind::Peer => EntityItems::Peers(self.peers.lock().unwrap().clone()),
            EntityKind::File => EntityItems::Files(self.files.lock().unwrap().clone()),
            EntityKind::Tracker => EntityItems::Trackers(self.trackers.lock().unwrap().clone()),
        };
        Ok(EntityBatch::complete(items))
    }

    async fn mutate(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
        mutation: &Mutation,
    ) -> Result<MutationResults, ClientError> {
        self.mutations
            .lock()
            .unwrap()
            .push((kind, ids.to_vec(), mutation.clone()));
        let hangs = {
            let hang = self.hang.lock().unwrap();
            ids.iter().any(|id| hang.contains(id))
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        let reject = self.reject.lock().unwrap();
        Ok(ids
            .iter()
            .map(|id| {
                let outcome = match reject.get(id) {
                    Some(reason) => Err(Rejection::new(reason.clone())),
                    None => Ok(()),
                };
                (id.clone(), outcome)
            })
            .collect())
    }

    async fn add_entity(
        &self,
        source: &str,
        _options: &AddOptions,
    ) -> Result<AddOutcome, ClientError> {
        let mut torrents = self.torrents.lock().unwrap();
        if let Some(t) = torrents.iter().find(|t| t.name == source) {
            return Ok(AddOutcome::Duplicate {
                id: t.id,
                name: t.name.clone(),
            });
        }
        let id = torrents.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        torrents.push(torrent(id, source));
        Ok(AddOutcome::Added {
            id,
            name: source.to_owned(),
        })
    }

    async fn describe(&self) -> Result<String, ClientError> {
        Ok("Fake daemon 1.0".into())
    }
}
