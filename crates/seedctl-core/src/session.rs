// ── Session ──
//
// One connection to a daemon: the remote client, live settings, the
// command registry, and one cache plus poller per entity kind. Cheap to
// clone; every clone shares the same state.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::command::{CommandRegistry, EntryOutcome, MutationEntry, MutationReport};
use crate::error::CoreError;
use crate::filter::Filter;
use crate::model::{Entity, EntityId, EntityKind, Peer, Torrent, TorrentFile, Tracker};
use crate::poller::{Poller, SyncStatus};
use crate::remote::{AddOptions, AddOutcome, ClientError, Mutation, RemoteClient};
use crate::settings::Settings;
use crate::store::{Diff, EntityCache, Snapshot};
use crate::view::{View, ViewSpec};

/// Nesting limit for `rc` scripts sourcing each other.
pub const MAX_SCRIPT_DEPTH: usize = 8;

/// One poller per entity kind.
pub struct Pollers {
    torrents: Arc<Poller<Torrent>>,
    peers: Arc<Poller<Peer>>,
    files: Arc<Poller<TorrentFile>>,
    trackers: Arc<Poller<Tracker>>,
}

/// Entity types that a session caches and polls.
pub trait Cached: Entity {
    fn poller(pollers: &Pollers) -> &Arc<Poller<Self>>;
}

impl Cached for Torrent {
    fn poller(pollers: &Pollers) -> &Arc<Poller<Self>> {
        &pollers.torrents
    }
}

impl Cached for Peer {
    fn poller(pollers: &Pollers) -> &Arc<Poller<Self>> {
        &pollers.peers
    }
}

impl Cached for TorrentFile {
    fn poller(pollers: &Pollers) -> &Arc<Poller<Self>> {
        &pollers.files
    }
}

impl Cached for Tracker {
    fn poller(pollers: &Pollers) -> &Arc<Poller<Self>> {
        &pollers.trackers
    }
}

struct SessionInner {
    client: Arc<dyn RemoteClient>,
    settings: Arc<Settings>,
    commands: Arc<CommandRegistry>,
    pollers: Pollers,
    tasks: DashMap<EntityKind, JoinHandle<()>>,
    cancel: CancellationToken,
    script_depth: AtomicUsize,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Session with the built-in command set.
    pub fn new(client: Arc<dyn RemoteClient>, settings: Arc<Settings>) -> Self {
        Self::with_registry(client, settings, CommandRegistry::builtin())
    }

    pub fn with_registry(
        client: Arc<dyn RemoteClient>,
        settings: Arc<Settings>,
        commands: CommandRegistry,
    ) -> Self {
        fn poller<E: Entity>(
            client: &Arc<dyn RemoteClient>,
            settings: &Arc<Settings>,
        ) -> Arc<Poller<E>> {
            Arc::new(Poller::new(
                Arc::clone(client),
                Arc::new(EntityCache::new()),
                Arc::clone(settings),
            ))
        }

        let pollers = Pollers {
            torrents: poller(&client, &settings),
            peers: poller(&client, &settings),
            files: poller(&client, &settings),
            trackers: poller(&client, &settings),
        };
        Self {
            inner: Arc::new(SessionInner {
                client,
                settings,
                commands: Arc::new(commands),
                pollers,
                tasks: DashMap::new(),
                cancel: CancellationToken::new(),
                script_depth: AtomicUsize::new(0),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn client(&self) -> &Arc<dyn RemoteClient> {
        &self.inner.client
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.inner.settings
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.inner.commands
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub fn poller<E: Cached>(&self) -> &Arc<Poller<E>> {
        E::poller(&self.inner.pollers)
    }

    pub fn cache<E: Cached>(&self) -> &Arc<EntityCache<E>> {
        self.poller::<E>().cache()
    }

    pub fn snapshot<E: Cached>(&self) -> Arc<Snapshot<E>> {
        self.cache::<E>().snapshot()
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// List `E` now, outside the polling schedule.
    pub async fn refresh<E: Cached>(&self) -> Result<Diff, CoreError> {
        Ok(self.poller::<E>().run_cycle().await?)
    }

    /// Fetch `E` once unless the cache already holds a listing.
    pub async fn ensure_loaded<E: Cached>(&self) -> Result<(), CoreError> {
        if !self.cache::<E>().is_loaded() {
            self.refresh::<E>().await?;
        }
        Ok(())
    }

    /// Fresh listing of `E` narrowed to `filter` and, for sub-entities,
    /// to the torrents in `scope`. Ordered by id.
    pub async fn select<E: Cached>(
        &self,
        filter: &Filter,
        scope: Option<&BTreeSet<u64>>,
    ) -> Result<Vec<Arc<E>>, CoreError> {
        self.refresh::<E>().await?;
        Ok(self
            .snapshot::<E>()
            .iter()
            .filter(|e| scope.is_none_or(|s| s.contains(&e.torrent_id())))
            .filter(|e| filter.matches(e.as_ref()))
            .cloned()
            .collect())
    }

    /// A live view over the `E` cache.
    pub fn view<E: Cached>(&self, spec: ViewSpec) -> View<E> {
        View::new(spec, self.cache::<E>())
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Start the background poller for `E` unless it runs already.
    pub fn start_polling<E: Cached>(&self) {
        self.inner.tasks.entry(E::KIND).or_insert_with(|| {
            debug!(kind = %E::KIND, "starting poller");
            self.poller::<E>().spawn(self.inner.cancel.child_token())
        });
    }

    pub fn start_polling_all(&self) {
        self.start_polling::<Torrent>();
        self.start_polling::<Peer>();
        self.start_polling::<TorrentFile>();
        self.start_polling::<Tracker>();
    }

    pub fn trigger<E: Cached>(&self) {
        self.poller::<E>().trigger();
    }

    pub fn trigger_all(&self) {
        self.trigger::<Torrent>();
        self.trigger::<Peer>();
        self.trigger::<TorrentFile>();
        self.trigger::<Tracker>();
    }

    fn trigger_kind(&self, kind: EntityKind) {
        match kind {
            EntityKind::Torrent => self.trigger::<Torrent>(),
            EntityKind::Peer => self.trigger::<Peer>(),
            EntityKind::File => self.trigger::<TorrentFile>(),
            EntityKind::Tracker => self.trigger::<Tracker>(),
        }
    }

    /// Connection health, as seen by the torrent poller.
    pub fn sync_status(&self) -> SyncStatus {
        self.poller::<Torrent>().sync_status()
    }

    pub fn status_receiver(&self) -> watch::Receiver<SyncStatus> {
        self.poller::<Torrent>().status()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Apply `mutation` to every target concurrently, one call per entity.
    /// A slow or failing entity never holds up or fails the others.
    pub async fn mutate(
        &self,
        kind: EntityKind,
        targets: Vec<(EntityId, String)>,
        mutation: Mutation,
    ) -> MutationReport {
        let timeout = self.settings().duration("connect.timeout");
        let calls = targets.into_iter().map(|(id, name)| {
            let mutation = &mutation;
            async move {
                let call = self
                    .client()
                    .mutate(kind, std::slice::from_ref(&id), mutation);
                let result = if timeout.is_zero() {
                    call.await
                } else {
                    tokio::time::timeout(timeout, call)
                        .await
                        .unwrap_or_else(|_| Err(ClientError::timeout(timeout)))
                };
                let outcome = match result {
                    Ok(results) => match results.into_iter().find(|(r, _)| *r == id) {
                        Some((_, Ok(()))) => EntryOutcome::Ok,
                        Some((_, Err(rejection))) => EntryOutcome::Rejected(rejection.reason),
                        None => EntryOutcome::Rejected("no result from daemon".into()),
                    },
                    Err(ClientError::Rejected { reason }) => EntryOutcome::Rejected(reason),
                    Err(err @ ClientError::Connectivity { .. }) => {
                        EntryOutcome::Connectivity(err.to_string())
                    }
                };
                MutationEntry { id, name, outcome }
            }
        });
        let entries = join_all(calls).await;

        let report = MutationReport {
            action: mutation.action(),
            kind,
            entries,
        };
        info!(
            action = report.action,
            %kind,
            succeeded = report.succeeded(),
            failed = report.entries.len() - report.succeeded(),
            "mutation applied"
        );
        self.trigger_kind(kind);
        if kind != EntityKind::Torrent {
            self.trigger::<Torrent>();
        }
        report
    }

    /// Add one torrent.
    pub async fn add(&self, source: &str, options: &AddOptions) -> Result<AddOutcome, CoreError> {
        let outcome = self.client().add_entity(source, options).await?;
        info!(source, ?outcome, "torrent added");
        self.trigger::<Torrent>();
        Ok(outcome)
    }

    pub async fn describe_remote(&self) -> Result<String, CoreError> {
        Ok(self.client().describe().await?)
    }

    // ── Scripts ──────────────────────────────────────────────────────

    /// Enter one level of script nesting; the guard leaves it on drop.
    pub fn enter_script(&self) -> Result<ScriptGuard, CoreError> {
        let depth = self.inner.script_depth.fetch_add(1, Ordering::SeqCst);
        let guard = ScriptGuard {
            session: self.clone(),
        };
        if depth >= MAX_SCRIPT_DEPTH {
            return Err(CoreError::refused(format!(
                "scripts nested deeper than {MAX_SCRIPT_DEPTH} levels"
            )));
        }
        Ok(guard)
    }

    // ── Shutdown ─────────────────────────────────────────────────────

    /// Stop every poller and wait for them to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let kinds: Vec<EntityKind> = self.inner.tasks.iter().map(|e| *e.key()).collect();
        for kind in kinds {
            if let Some((_, handle)) = self.inner.tasks.remove(&kind) {
                let _ = handle.await;
            }
        }
        debug!("session shut down");
    }
}

/// Holds one level of script nesting.
pub struct ScriptGuard {
    session: Session,
}

impl Drop for ScriptGuard {
    fn drop(&mut self) {
        self.session
            .inner
            .script_depth
            .fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::poller::SyncState;
    use crate::test_support::{FakeRemote, file, torrent};

    fn session(fake: &Arc<FakeRemote>) -> Session {
        let client: Arc<dyn RemoteClient> = Arc::clone(fake) as Arc<dyn RemoteClient>;
        Session::new(client, Arc::new(Settings::new()))
    }

    fn targets(ids: &[u64]) -> Vec<(EntityId, String)> {
        ids.iter()
            .map(|id| (EntityId::Torrent(*id), format!("t{id}")))
            .collect()
    }

    #[tokio::test]
    async fn one_rejection_does_not_fail_the_others() {
        let fake = Arc::new(FakeRemote::default());
        fake.reject
            .lock()
            .unwrap()
            .insert(EntityId::Torrent(2), "no such torrent".into());
        let report = session(&fake)
            .mutate(EntityKind::Torrent, targets(&[1, 2, 3]), Mutation::Stop)
            .await;

        assert_eq!(report.succeeded(), 2);
        assert!(report.is_partial());
        assert_eq!(
            report.entries[1].outcome,
            EntryOutcome::Rejected("no such torrent".into())
        );
        assert_eq!(fake.mutations.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn a_hanging_entity_times_out_alone() {
        let fake = Arc::new(FakeRemote::default());
        fake.hang.lock().unwrap().insert(EntityId::Torrent(3));
        let session = session(&fake);
        session.settings().set("connect.timeout", "2").unwrap();

        let report = session
            .mutate(EntityKind::Torrent, targets(&[1, 3]), Mutation::Verify)
            .await;
        assert_eq!(report.entries[0].outcome, EntryOutcome::Ok);
        assert!(matches!(
            report.entries[1].outcome,
            EntryOutcome::Connectivity(_)
        ));
        assert!(!report.is_connectivity_failure());
    }

    #[tokio::test]
    async fn select_filters_a_fresh_listing() {
        let fake = Arc::new(FakeRemote::with_torrents(vec![
            torrent(1, "ubuntu"),
            torrent(2, "debian"),
        ]));
        let session = session(&fake);
        let filter = Filter::parse::<Torrent>("ubuntu").unwrap();
        let hits = session.select::<Torrent>(&filter, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(fake.listings(), 1);

        fake.torrents.lock().unwrap().push(torrent(3, "ubuntu-server"));
        let hits = session.select::<Torrent>(&filter, None).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn select_honours_scope() {
        let fake = Arc::new(FakeRemote::default());
        *fake.files.lock().unwrap() = vec![file(1, 0, "a.iso"), file(2, 0, "b.iso")];
        let session = session(&fake);
        let scope = BTreeSet::from([2]);
        let hits = session
            .select::<TorrentFile>(&Filter::all(EntityKind::File), Some(&scope))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].torrent_id, 2);
    }

    #[tokio::test]
    async fn script_depth_is_bounded_and_released() {
        let session = session(&Arc::new(FakeRemote::default()));
        let guards: Vec<_> = (0..MAX_SCRIPT_DEPTH)
            .map(|_| session.enter_script().unwrap())
            .collect();
        assert!(matches!(session.enter_script(), Err(CoreError::Refused { .. })));
        drop(guards);
        assert!(session.enter_script().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_fills_the_cache_and_stops_on_shutdown() {
        let fake = Arc::new(FakeRemote::with_torrents(vec![torrent(1, "a")]));
        let session = session(&fake);
        let mut status = session.status_receiver();
        session.start_polling::<Torrent>();
        session.start_polling::<Torrent>();

        status
            .wait_for(|s| s.state == SyncState::Ready)
            .await
            .unwrap();
        assert_eq!(session.snapshot::<Torrent>().len(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        session.shutdown().await;
        let after = fake.listings();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fake.listings(), after);
    }
}
