//! All possible UI actions. Actions are the sole mechanism for state mutation.

use seedctl_core::{EntityId, Rendered, SyncStatus, ViewSpec};

/// Identifies a tab across reorderings; indices shift when tabs close.
pub type TabId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// One evaluation of a tab's view, formatted off the UI task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabContent {
    pub rendered: Rendered,
    /// Row ids, parallel to `rendered.rows`.
    pub ids: Vec<EntityId>,
    /// The cache has seen its first listing.
    pub loaded: bool,
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Tabs ───────────────────────────────────────────────────────
    OpenView(ViewSpec),
    SwitchTab(usize),
    NextTab,
    PrevTab,
    CloseTab,
    TabUpdated(TabId, TabContent),

    // ── Command prompt ────────────────────────────────────────────
    OpenPrompt(String),
    ClosePrompt,
    RunCommand(String),

    // ── Feedback ──────────────────────────────────────────────────
    Notify(Notification),
    ShowText { title: String, lines: Vec<String> },
    ClosePopup,
    ToggleHelp,

    // ── Daemon ────────────────────────────────────────────────────
    SyncChanged(SyncStatus),
    Refresh,
}
