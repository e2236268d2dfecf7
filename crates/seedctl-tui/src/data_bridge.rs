//! Data bridge: connects live views and sync status to TUI actions.
//!
//! Each tab owns one bridge task. The task watches its view and sends a
//! freshly rendered [`TabContent`] whenever the underlying cache commits
//! a new snapshot. A separate task forwards poller health changes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use seedctl_core::view::Items;
use seedctl_core::{
    Cached, Entity, EntityKind, Peer, Session, Settings, Torrent, TorrentFile, Tracker, ViewSpec,
};

use crate::action::{Action, TabContent, TabId};

/// Start polling the view's entity kind and stream its contents to `tab`.
pub fn spawn_view_bridge(
    session: &Session,
    tab: TabId,
    spec: ViewSpec,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let session = session.clone();
    match spec.kind {
        EntityKind::Torrent => {
            tokio::spawn(bridge_view::<Torrent>(session, tab, spec, action_tx, cancel))
        }
        EntityKind::Peer => tokio::spawn(bridge_view::<Peer>(session, tab, spec, action_tx, cancel)),
        EntityKind::File => {
            tokio::spawn(bridge_view::<TorrentFile>(session, tab, spec, action_tx, cancel))
        }
        EntityKind::Tracker => {
            tokio::spawn(bridge_view::<Tracker>(session, tab, spec, action_tx, cancel))
        }
    }
}

async fn bridge_view<E: Cached>(
    session: Session,
    tab: TabId,
    spec: ViewSpec,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    session.start_polling::<E>();
    session.trigger::<E>();

    let mut view = session.view::<E>(spec);
    let settings = Arc::clone(session.settings());

    let initial = view.current_items();
    let _ = action_tx.send(Action::TabUpdated(
        tab,
        content(view.spec(), &initial, view.is_loaded(), &settings),
    ));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            items = view.changed() => {
                let Some(items) = items else { break };
                let update = content(view.spec(), &items, view.is_loaded(), &settings);
                if action_tx.send(Action::TabUpdated(tab, update)).is_err() {
                    break;
                }
            }
        }
    }
    debug!(tab, kind = %E::KIND, "view bridge shut down");
}

/// Format evaluated items for a tab.
pub fn content<E: Entity>(
    spec: &ViewSpec,
    items: &Items<E>,
    loaded: bool,
    settings: &Settings,
) -> TabContent {
    TabContent {
        rendered: spec.render(items, &settings.format_options()),
        ids: items.iter().map(|e| e.id()).collect(),
        loaded,
    }
}

/// Forward every sync-status transition of the torrent poller.
pub async fn bridge_status(
    session: Session,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut status = session.status_receiver();
    let _ = action_tx.send(Action::SyncChanged(status.borrow_and_update().clone()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                debug!(state = %current.state, "sync status changed");
                if action_tx.send(Action::SyncChanged(current)).is_err() {
                    break;
                }
            }
        }
    }
}
