// ── Live filtered views ──
//
// A `View` is a filter, sort order and column set applied to one cache
// subscription. Items are evaluated lazily and memoized per snapshot
// version, so many renders of an unchanged cache cost nothing.

use std::collections::BTreeSet;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures_core::Stream;
use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::field::{FormatOptions, format_value};
use crate::filter::{Filter, SortOrder};
use crate::model::{Entity, EntityKind};
use crate::store::{EntityCache, Snapshot};

// ── ViewSpec ─────────────────────────────────────────────────────────

/// What a list command asks to see.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    pub kind: EntityKind,
    pub filter: Filter,
    pub sort: SortOrder,
    /// Canonical field names, in display order.
    pub columns: Vec<&'static str>,
    /// Restricts sub-entity views to these torrent ids.
    pub scope: Option<BTreeSet<u64>>,
    pub limit: Option<usize>,
    /// Short label for tabs and headings ("torrents", "files of 3").
    pub title: String,
}

impl ViewSpec {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            filter: Filter::all(kind),
            sort: SortOrder::by_id(kind),
            columns: Vec::new(),
            scope: None,
            limit: None,
            title: kind.plural().to_owned(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_columns(mut self, columns: Vec<&'static str>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_scope(mut self, scope: BTreeSet<u64>) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Filter, sort and truncate one snapshot.
    pub fn evaluate<E: Entity>(&self, snapshot: &Snapshot<E>) -> Vec<Arc<E>> {
        if E::KIND != self.kind {
            return Vec::new();
        }
        let mut items: Vec<Arc<E>> = snapshot
            .iter()
            .filter(|e| {
                self.scope
                    .as_ref()
                    .is_none_or(|scope| scope.contains(&e.torrent_id()))
            })
            .filter(|e| self.filter.matches(e.as_ref()))
            .cloned()
            .collect();
        self.sort.apply(&mut items);
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
        items
    }
}

// ── Rendering ────────────────────────────────────────────────────────

/// Headers and formatted cells of evaluated items, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub headers: Vec<&'static str>,
    /// Preferred column widths, in characters.
    #[serde(skip)]
    pub widths: Vec<u16>,
    pub rows: Vec<Vec<String>>,
}

impl ViewSpec {
    /// Format `items` for display. Unknown columns are skipped.
    pub fn render<E: Entity>(&self, items: &[Arc<E>], opts: &FormatOptions) -> Rendered {
        let registry = E::registry();
        let fields: Vec<_> = self
            .columns
            .iter()
            .filter_map(|name| registry.field(name))
            .collect();
        Rendered {
            headers: fields.iter().map(|f| f.header).collect(),
            widths: fields.iter().map(|f| f.width).collect(),
            rows: items
                .iter()
                .map(|item| {
                    fields
                        .iter()
                        .map(|f| format_value(&f.value(item), f.ty, opts))
                        .collect()
                })
                .collect(),
        }
    }
}

// ── View ─────────────────────────────────────────────────────────────

pub type Items<E> = Arc<Vec<Arc<E>>>;
type Callback<E> = Box<dyn Fn(&Items<E>) + Send + Sync>;

/// A `ViewSpec` bound to a live cache.
pub struct View<E: Entity> {
    spec: ViewSpec,
    receiver: watch::Receiver<Arc<Snapshot<E>>>,
    memo: Mutex<Option<(u64, Items<E>)>>,
    callbacks: Vec<Callback<E>>,
}

impl<E: Entity> fmt::Debug for View<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("spec", &self.spec)
            .field("version", &self.version())
            .field("callbacks", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl<E: Entity> View<E> {
    pub fn new(spec: ViewSpec, cache: &EntityCache<E>) -> Self {
        let mut receiver = cache.subscribe();
        receiver.borrow_and_update();
        Self {
            spec,
            receiver,
            memo: Mutex::new(None),
            callbacks: Vec::new(),
        }
    }

    pub fn spec(&self) -> &ViewSpec {
        &self.spec
    }

    /// Version of the snapshot the view currently sees.
    pub fn version(&self) -> u64 {
        self.receiver.borrow().version()
    }

    /// Whether the cache has received its first listing.
    pub fn is_loaded(&self) -> bool {
        self.receiver.borrow().is_loaded()
    }

    /// Items of the latest snapshot, memoized by version.
    pub fn current_items(&self) -> Items<E> {
        let snapshot = Arc::clone(&self.receiver.borrow());
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, items)) = memo.as_ref().filter(|(v, _)| *v == snapshot.version()) {
            return Arc::clone(items);
        }
        let items = Arc::new(self.spec.evaluate(&snapshot));
        *memo = Some((snapshot.version(), Arc::clone(&items)));
        items
    }

    /// Register a callback fired by [`refresh`](Self::refresh) and
    /// [`changed`](Self::changed) when a newer version is seen.
    pub fn on_change(&mut self, callback: impl Fn(&Items<E>) + Send + Sync + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Non-blocking check for a newer snapshot. Fires callbacks and
    /// returns `true` when one arrived.
    pub fn refresh(&mut self) -> bool {
        if !self.receiver.has_changed().unwrap_or(false) {
            return false;
        }
        self.receiver.borrow_and_update();
        self.notify();
        true
    }

    /// Wait for the next snapshot and return its items. `None` once the
    /// cache is gone.
    pub async fn changed(&mut self) -> Option<Items<E>> {
        self.receiver.changed().await.ok()?;
        self.receiver.borrow_and_update();
        Some(self.notify())
    }

    fn notify(&self) -> Items<E> {
        let items = self.current_items();
        for callback in &self.callbacks {
            callback(&items);
        }
        items
    }

    /// Convert into a `Stream` of evaluated items, starting with the
    /// current snapshot.
    pub fn into_stream(self) -> ViewStream<E> {
        ViewStream {
            spec: self.spec,
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding freshly evaluated items per cache version.
pub struct ViewStream<E: Entity> {
    spec: ViewSpec,
    inner: WatchStream<Arc<Snapshot<E>>>,
}

impl<E: Entity> Stream for ViewStream<E> {
    type Item = Items<E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        Pin::new(&mut this.inner)
            .poll_next(cx)
            .map(|snapshot| snapshot.map(|s| Arc::new(this.spec.evaluate(&s))))
    }
}
