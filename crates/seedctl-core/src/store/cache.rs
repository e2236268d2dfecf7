// ── Versioned entity cache ──
//
// Holds the latest immutable snapshot of one entity kind behind a
// `watch` channel. Reconciliation builds a new map that reuses the `Arc`
// of every unchanged entity and only publishes when something changed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

use crate::model::{Entity, EntityId};

/// Immutable view of the cache at one version.
#[derive(Debug)]
pub struct Snapshot<E> {
    version: u64,
    loaded: bool,
    entities: BTreeMap<EntityId, Arc<E>>,
}

impl<E> Snapshot<E> {
    fn empty() -> Self {
        Self {
            version: 0,
            loaded: false,
            entities: BTreeMap::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether at least one listing has been applied.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&Arc<E>> {
        self.entities.get(id)
    }

    /// Entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<E>> {
        self.entities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }
}

/// One listing from the daemon.
#[derive(Debug, Clone)]
pub struct Batch<E> {
    pub items: Vec<E>,
    /// Ids the daemon reported as removed (incremental batches only).
    pub removed: Vec<EntityId>,
    /// A complete batch replaces the cache contents; an incremental one
    /// only upserts `items` and drops `removed`.
    pub complete: bool,
}

impl<E> Batch<E> {
    pub fn complete(items: Vec<E>) -> Self {
        Self {
            items,
            removed: Vec::new(),
            complete: true,
        }
    }

    pub fn incremental(items: Vec<E>, removed: Vec<EntityId>) -> Self {
        Self {
            items,
            removed,
            complete: false,
        }
    }
}

/// What a reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub added: Vec<EntityId>,
    pub changed: Vec<EntityId>,
    pub removed: Vec<EntityId>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Single-writer cache for one entity kind.
pub struct EntityCache<E> {
    snapshot: watch::Sender<Arc<Snapshot<E>>>,
}

impl<E: Entity> Default for EntityCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityCache<E> {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::empty()));
        Self { snapshot }
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Snapshot<E>> {
        Arc::clone(&self.snapshot.borrow())
    }

    pub fn version(&self) -> u64 {
        self.snapshot.borrow().version
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.borrow().loaded
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot<E>>> {
        self.snapshot.subscribe()
    }

    /// Apply a listing. Commits are serialized by the watch sender, so the
    /// batch is always diffed against the latest committed snapshot. An
    /// empty diff publishes nothing and keeps the version.
    pub fn reconcile(&self, batch: Batch<E>) -> Diff {
        let mut diff = Diff::default();
        self.snapshot.send_if_modified(|current| {
            let (next, d) = apply(current, batch);
            diff = d;
            match next {
                Some(next) => {
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        });
        if !diff.is_empty() {
            trace!(
                kind = %E::KIND,
                added = diff.added.len(),
                changed = diff.changed.len(),
                removed = diff.removed.len(),
                "cache commit"
            );
        }
        diff
    }
}

fn apply<E: Entity>(current: &Snapshot<E>, batch: Batch<E>) -> (Option<Snapshot<E>>, Diff) {
    let mut incoming: BTreeMap<EntityId, E> = BTreeMap::new();
    for item in batch.items {
        incoming.insert(item.id(), item);
    }

    let mut diff = Diff::default();
    for (id, item) in &incoming {
        match current.entities.get(id) {
            None => diff.added.push(id.clone()),
            Some(old) if **old != *item => diff.changed.push(id.clone()),
            Some(_) => {}
        }
    }
    if batch.complete {
        diff.removed = current
            .entities
            .keys()
            .filter(|id| !incoming.contains_key(*id))
            .cloned()
            .collect();
    } else {
        let removed: BTreeSet<EntityId> = batch.removed.into_iter().collect();
        diff.removed = removed
            .into_iter()
            .filter(|id| current.entities.contains_key(id) && !incoming.contains_key(id))
            .collect();
    }

    if diff.is_empty() && current.loaded {
        return (None, diff);
    }

    let mut entities = current.entities.clone();
    for id in &diff.removed {
        entities.remove(id);
    }
    for id in diff.added.iter().chain(&diff.changed) {
        if let Some(item) = incoming.remove(id) {
            entities.insert(id.clone(), Arc::new(item));
        }
    }
    let next = Snapshot {
        version: current.version + 1,
        loaded: true,
        entities,
    };
    (Some(next), diff)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Torrent;
    use crate::test_support::torrent;

    fn ids(v: &[EntityId]) -> Vec<String> {
        v.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn first_listing_loads_even_when_empty() {
        let cache = EntityCache::<Torrent>::new();
        assert!(!cache.is_loaded());
        let diff = cache.reconcile(Batch::complete(Vec::new()));
        assert!(diff.is_empty());
        assert!(cache.is_loaded());
        assert_eq!(cache.version(), 1);
    }

    #[test]
    fn unchanged_batch_keeps_version_and_wakes_nobody() {
        let cache = EntityCache::new();
        cache.reconcile(Batch::complete(vec![torrent(1, "a"), torrent(2, "b")]));
        let mut rx = cache.subscribe();
        rx.borrow_and_update();
        let v = cache.version();

        let diff = cache.reconcile(Batch::complete(vec![torrent(2, "b"), torrent(1, "a")]));
        assert!(diff.is_empty());
        assert_eq!(cache.version(), v);
        assert!(!rx.has_changed().unwrap_or(true));
    }

    #[test]
    fn complete_batch_upserts_and_prunes() {
        let cache = EntityCache::new();
        cache.reconcile(Batch::complete(vec![torrent(1, "a"), torrent(2, "b")]));
        let before = cache.snapshot();

        let diff = cache.reconcile(Batch::complete(vec![torrent(2, "b"), torrent(3, "c")]));
        assert_eq!(ids(&diff.added), ["3"]);
        assert_eq!(ids(&diff.removed), ["1"]);
        assert!(diff.changed.is_empty());

        let after = cache.snapshot();
        assert_eq!(after.version(), before.version() + 1);
        let id = EntityId::Torrent(2);
        assert!(Arc::ptr_eq(
            before.get(&id).expect("before"),
            after.get(&id).expect("after")
        ));
        assert_eq!(before.len(), 2, "old snapshot is untouched");
    }

    #[test]
    fn incremental_batch_only_touches_listed_ids() {
        let cache = EntityCache::new();
        cache.reconcile(Batch::complete(vec![torrent(1, "a"), torrent(2, "b"), torrent(3, "c")]));

        let mut renamed = torrent(1, "a2");
        renamed.ratio = 1.0;
        let diff = cache.reconcile(Batch::incremental(
            vec![renamed],
            vec![EntityId::Torrent(3), EntityId::Torrent(99)],
        ));
        assert_eq!(ids(&diff.changed), ["1"]);
        assert_eq!(ids(&diff.removed), ["3"]);

        let snap = cache.snapshot();
        let names: Vec<_> = snap.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a2", "b"]);
    }
}
