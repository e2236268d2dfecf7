// seedctl-core: Filter language, command dispatch and reactive entity cache
// between seedctl-api and the front-ends (CLI/TUI).

pub mod command;
pub mod convert;
pub mod error;
pub mod field;
pub mod filter;
pub mod model;
pub mod poller;
pub mod remote;
pub mod script;
pub mod session;
pub mod settings;
pub mod store;
pub mod view;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{
    ChainOp, ChainReport, CommandOutcome, CommandRegistry, CommandRun, Dispatcher, EntryOutcome,
    MutationReport,
};
pub use error::CoreError;
pub use filter::{Filter, FilterError, SortOrder};
pub use poller::{SyncState, SyncStatus};
pub use remote::{ClientError, RemoteClient, TransmissionRemote};
pub use script::ScriptReport;
pub use session::{Cached, Session};
pub use settings::Settings;
pub use store::{EntityCache, Snapshot};
pub use view::{Rendered, View, ViewSpec};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Entity, EntityId, EntityKind, FilePriority, Peer, Torrent, TorrentFile, TorrentStatus, Tracker,
    TrackerStatus,
};
